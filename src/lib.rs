//! ICMP echo ("ping") client over raw IPv4 sockets.
//!
//! A [`ProbeSession`] runs a fixed number of sequential echo transactions
//! against one destination and folds their outcomes into a [`SessionReport`].
//! Opening raw ICMP sockets usually requires root.

pub mod error;
pub mod packet;
pub mod ping;
pub mod session;
pub mod util;

pub use error::{Error, Result};
pub use ping::{EchoTransaction, PendingEcho, ProbeResult, Prober, RawSocketProber};
pub use session::{ProbeSession, SessionConfig, SessionReport, SessionStats};
