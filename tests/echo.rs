//! Live echo transactions. These need a raw ICMP socket and return early
//! when the process is not allowed to open one.

use std::net::Ipv4Addr;
use std::time::{Duration, Instant};

use pinger::{EchoTransaction, Error, ProbeResult, ProbeSession, RawSocketProber, SessionConfig};

// TEST-NET-1, never routed
const BLACKHOLE: Ipv4Addr = Ipv4Addr::new(192, 0, 2, 1);

// Scheduling slop allowed past the deadline
const SLOP: Duration = Duration::from_millis(250);

macro_rules! or_skip {
    ($e:expr) => {
        match $e {
            Ok(v) => v,
            Err(e @ Error::Socket(_)) | Err(e @ Error::Io(_)) => {
                eprintln!("skipping: {}", e);
                return;
            }
            Err(e) => panic!("unexpected error: {}", e),
        }
    };
}

#[test]
fn unanswered_probe_times_out_on_budget() {
    let timeout = Duration::from_millis(500);

    let transaction = or_skip!(EchoTransaction::open(BLACKHOLE, 0xD00D, timeout));
    let start = Instant::now();
    let pending = or_skip!(transaction.send());
    let result = or_skip!(pending.wait_reply());
    let elapsed = start.elapsed();

    if let ProbeResult::Success { .. } = result {
        eprintln!("skipping: {} answered", BLACKHOLE);
        return;
    }
    assert!(elapsed >= timeout, "returned after {:?}", elapsed);
    assert!(elapsed <= timeout + SLOP, "returned after {:?}", elapsed);
}

#[test]
fn unreachable_session_loses_everything() {
    let config = SessionConfig {
        probe_count: 4,
        timeout: Duration::from_millis(200),
        pacing: Duration::from_millis(10),
        identifier: Some(0xD00E),
    };
    let mut session = ProbeSession::new(RawSocketProber, BLACKHOLE, config).unwrap();

    let mut timeouts = 0;
    let report = or_skip!(session.run(|_, result| {
        if *result == ProbeResult::Timeout {
            timeouts += 1;
        }
    }));

    if report.has_rtt() {
        eprintln!("skipping: {} answered", BLACKHOLE);
        return;
    }
    assert_eq!(timeouts, 4);
    assert_eq!(report.sent, 4);
    assert_eq!(report.received, 0);
    assert_eq!(report.lost, 4);
    assert_eq!(report.loss_percent, 100.0);
    assert!(!report.has_rtt());
    assert_eq!(report.min_rtt, pinger::session::MIN_RTT_SENTINEL);
    assert_eq!(report.max_rtt, pinger::session::MAX_RTT_SENTINEL);
}

#[test]
fn loopback_replies_are_matched() {
    let mut session = ProbeSession::new(
        RawSocketProber,
        Ipv4Addr::LOCALHOST,
        SessionConfig {
            probe_count: 2,
            timeout: Duration::from_secs(1),
            pacing: Duration::from_millis(0),
            identifier: Some(0xD00F),
        },
    )
    .unwrap();

    let report = or_skip!(session.run(|_, _| {}));

    // Some sandboxes drop ICMP even on loopback
    if report.has_rtt() {
        assert!(report.min_rtt >= 0.0);
        assert!(report.min_rtt <= report.max_rtt);
    }
    assert_eq!(report.sent, 2);
    assert_eq!(report.received + report.lost, 2);
}
