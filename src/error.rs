use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Fatal errors. A probe that times out is not an error, see `ProbeResult`.
#[derive(Debug, Error)]
pub enum Error {
    #[error("unable to resolve {host}: {source}")]
    Resolve {
        host: String,
        #[source]
        source: io::Error,
    },

    #[error("{}", socket_message(.0))]
    Socket(#[source] io::Error),

    #[error("socket I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("unable to encode ICMP header: {0}")]
    Encode(#[from] bincode::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

fn socket_message(e: &io::Error) -> String {
    if e.kind() == io::ErrorKind::PermissionDenied {
        format!("unable to open raw ICMP socket (try running as root): {}", e)
    } else {
        format!("unable to open raw ICMP socket: {}", e)
    }
}
