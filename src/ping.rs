use std::io::{self, ErrorKind};
use std::net::{Ipv4Addr, SocketAddrV4};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use log::{debug, trace};
use socket2::{Domain, Protocol, SockAddr, Socket, Type};

use crate::error::{Error, Result};
use crate::packet::{self, ECHO_SEQUENCE};

// Raw sockets ignore the port, but the address still needs one
const PLACEHOLDER_PORT: u16 = 1;
const RECV_BUFFER_LEN: usize = 1024;

/// Outcome of one echo transaction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProbeResult {
    /// A matching reply arrived. `rtt` is in seconds.
    Success { rtt: f64 },
    Timeout,
}

impl ProbeResult {
    pub fn rtt_millis(&self) -> Option<f64> {
        match *self {
            ProbeResult::Success { rtt } => Some(rtt * 1000.0),
            ProbeResult::Timeout => None,
        }
    }
}

/// Runs a single echo round trip. `ProbeSession` drives one of these per probe.
pub trait Prober {
    fn probe(&mut self, destination: Ipv4Addr, identifier: u16, timeout: Duration) -> Result<ProbeResult>;
}

/// Opens a fresh raw ICMP socket for every probe.
#[derive(Debug, Default, Clone, Copy)]
pub struct RawSocketProber;

impl Prober for RawSocketProber {
    fn probe(&mut self, destination: Ipv4Addr, identifier: u16, timeout: Duration) -> Result<ProbeResult> {
        EchoTransaction::open(destination, identifier, timeout)?
            .send()?
            .wait_reply()
    }
}

/// An opened socket that has not sent its request yet.
pub struct EchoTransaction {
    socket: Socket,
    destination: SockAddr,
    identifier: u16,
    timeout: Duration,
}

/// A request is on the wire; the socket is closed when this is consumed or dropped.
pub struct PendingEcho {
    socket: Socket,
    identifier: u16,
    deadline: Instant,
}

impl EchoTransaction {
    pub fn open(destination: Ipv4Addr, identifier: u16, timeout: Duration) -> Result<Self> {
        let socket = Socket::new(Domain::ipv4(), Type::raw(), Some(Protocol::icmpv4()))
            .map_err(Error::Socket)?;
        debug!("opened raw ICMP socket for {}", destination);

        Ok(EchoTransaction {
            socket,
            destination: SockAddr::from(SocketAddrV4::new(destination, PLACEHOLDER_PORT)),
            identifier,
            timeout,
        })
    }

    /// Send the echo request. The reply budget starts counting here.
    pub fn send(self) -> Result<PendingEcho> {
        let deadline = Instant::now() + self.timeout;
        let request = packet::encode_echo_request(self.identifier, ECHO_SEQUENCE, now_secs())?;
        self.socket.send_to(&request, &self.destination)?;
        trace!("sent echo request id={:#06x} ({} bytes)", self.identifier, request.len());

        Ok(PendingEcho {
            socket: self.socket,
            identifier: self.identifier,
            deadline,
        })
    }
}

impl PendingEcho {
    /// Read datagrams until our reply shows up or the deadline passes.
    ///
    /// Foreign ICMP traffic is discarded without extending the deadline.
    pub fn wait_reply(self) -> Result<ProbeResult> {
        let mut buf = [0u8; RECV_BUFFER_LEN];

        loop {
            let len = match recv_before(&self.socket, &mut buf, self.deadline)? {
                Some(len) => len,
                None => {
                    debug!("no reply for id={:#06x} before deadline", self.identifier);
                    return Ok(ProbeResult::Timeout);
                }
            };
            let received_at = now_secs();

            match packet::decode_echo_reply(&buf[..len], self.identifier) {
                Some(sent_at) => return Ok(ProbeResult::Success { rtt: received_at - sent_at }),
                None => trace!("discarding {} byte datagram, not our reply", len),
            }
        }
    }
}

/// Blocking read that gives up at `deadline`. `Ok(None)` means the deadline passed.
fn recv_before(socket: &Socket, buf: &mut [u8], deadline: Instant) -> io::Result<Option<usize>> {
    loop {
        let now = Instant::now();
        if now >= deadline {
            return Ok(None);
        }
        socket.set_read_timeout(Some(deadline - now))?;

        match socket.recv(buf) {
            Ok(len) => return Ok(Some(len)),
            Err(e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut => {
                return Ok(None)
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

/// Seconds since the Unix epoch. Both ends of an RTT measurement use this clock.
pub fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}
