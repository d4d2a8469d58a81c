use std::fmt;
use std::net::Ipv4Addr;
use std::thread;
use std::time::Duration;

use log::{debug, info};

use crate::error::{Error, Result};
use crate::ping::{ProbeResult, Prober};
use crate::util;

pub const DEFAULT_PROBE_COUNT: u32 = 4;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);
pub const DEFAULT_PACING: Duration = Duration::from_secs(1);

/// Starting value of `min_rtt`. Still present after a session where nothing came back.
pub const MIN_RTT_SENTINEL: f64 = 99_999_999.0;
/// Starting value of `max_rtt`.
pub const MAX_RTT_SENTINEL: f64 = 0.0;

#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Number of echo transactions to run.
    pub probe_count: u32,
    /// How long each probe waits for its reply.
    pub timeout: Duration,
    /// Sleep after every probe, the last one included.
    pub pacing: Duration,
    /// Overrides the pid-derived echo identifier.
    pub identifier: Option<u16>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            probe_count: DEFAULT_PROBE_COUNT,
            timeout: DEFAULT_TIMEOUT,
            pacing: DEFAULT_PACING,
            identifier: None,
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<()> {
        if self.probe_count == 0 {
            return Err(Error::Config("probe count must be at least 1".into()));
        }
        if self.timeout == Duration::from_secs(0) {
            return Err(Error::Config("timeout must be greater than zero".into()));
        }
        Ok(())
    }

    pub fn identifier(&self) -> u16 {
        self.identifier.unwrap_or_else(util::default_identifier)
    }
}

/// Running totals, updated once per probe. RTTs are milliseconds rounded to 2 decimals.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStats {
    pub sent: u32,
    pub received: u32,
    pub lost: u32,
    pub min_rtt: f64,
    pub max_rtt: f64,
    pub sum_rtt: f64,
}

impl Default for SessionStats {
    fn default() -> Self {
        SessionStats {
            sent: 0,
            received: 0,
            lost: 0,
            min_rtt: MIN_RTT_SENTINEL,
            max_rtt: MAX_RTT_SENTINEL,
            sum_rtt: 0.0,
        }
    }
}

impl SessionStats {
    pub fn record(&mut self, result: &ProbeResult) {
        self.sent += 1;
        match result.rtt_millis() {
            Some(rtt) => {
                let rtt = round2(rtt);
                self.received += 1;
                self.min_rtt = self.min_rtt.min(rtt);
                self.max_rtt = self.max_rtt.max(rtt);
                self.sum_rtt += rtt;
            }
            None => self.lost += 1,
        }
    }

    /// Note that the average divides by every probe sent, so each loss pulls it towards zero.
    pub fn finish(&self) -> SessionReport {
        let (loss_percent, avg_rtt) = if self.sent == 0 {
            (0.0, 0.0)
        } else {
            let sent = f64::from(self.sent);
            (
                round2(f64::from(self.lost) / sent * 100.0),
                round2(self.sum_rtt / sent),
            )
        };

        SessionReport {
            sent: self.sent,
            received: self.received,
            lost: self.lost,
            loss_percent,
            min_rtt: self.min_rtt,
            max_rtt: self.max_rtt,
            avg_rtt,
        }
    }
}

/// Final statistics of a session.
///
/// `min_rtt` and `max_rtt` are sentinels unless `received > 0`; check `has_rtt` first.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionReport {
    pub sent: u32,
    pub received: u32,
    pub lost: u32,
    pub loss_percent: f64,
    pub min_rtt: f64,
    pub max_rtt: f64,
    pub avg_rtt: f64,
}

impl SessionReport {
    pub fn has_rtt(&self) -> bool {
        self.received > 0
    }
}

impl fmt::Display for SessionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Sent = {}, Received = {}, Lost = {} ({:?}% lost)",
            self.sent, self.received, self.lost, self.loss_percent
        )?;
        write!(
            f,
            "Minimum = {:?} ms, Maximum = {:?} ms, Average = {:?} ms",
            self.min_rtt, self.max_rtt, self.avg_rtt
        )
    }
}

/// Sequential echo probes against one destination.
pub struct ProbeSession<P> {
    prober: P,
    destination: Ipv4Addr,
    config: SessionConfig,
}

impl<P: Prober> ProbeSession<P> {
    pub fn new(prober: P, destination: Ipv4Addr, config: SessionConfig) -> Result<Self> {
        config.validate()?;
        Ok(ProbeSession {
            prober,
            destination,
            config,
        })
    }

    /// Run every configured probe, calling `on_probe` with the 1-based probe number
    /// and its outcome as each one finishes.
    ///
    /// Fatal errors (such as a raw socket we may not open) abort the run. Timeouts don't.
    pub fn run<F>(&mut self, mut on_probe: F) -> Result<SessionReport>
    where
        F: FnMut(u32, &ProbeResult),
    {
        let identifier = self.config.identifier();
        let mut stats = SessionStats::default();
        info!(
            "pinging {} with id={:#06x}, {} probes",
            self.destination, identifier, self.config.probe_count
        );

        for seq in 1..=self.config.probe_count {
            let result = self
                .prober
                .probe(self.destination, identifier, self.config.timeout)?;
            debug!("probe {}: {:?}", seq, result);

            stats.record(&result);
            on_probe(seq, &result);

            thread::sleep(self.config.pacing);
        }

        Ok(stats.finish())
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
