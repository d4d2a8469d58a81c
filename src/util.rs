use std::io::{Error as IoError, ErrorKind};
use std::net::{IpAddr, Ipv4Addr};

use dns_lookup::lookup_host;
use log::debug;

use crate::error::{Error, Result};

/// Resolve `dest` to the first IPv4 address it maps to. Literal addresses skip the lookup.
pub fn resolve_dest(dest: &str) -> Result<Ipv4Addr> {
    if let Ok(addr) = dest.parse::<Ipv4Addr>() {
        return Ok(addr);
    }

    let addrs = lookup_host(dest).map_err(|source| Error::Resolve {
        host: dest.to_string(),
        source,
    })?;
    debug!("{} resolved to {:?}", dest, addrs);

    addrs
        .into_iter()
        .find_map(|addr| match addr {
            IpAddr::V4(v4) => Some(v4),
            IpAddr::V6(_) => None,
        })
        .ok_or_else(|| Error::Resolve {
            host: dest.to_string(),
            source: IoError::new(ErrorKind::NotFound, "no IPv4 address"),
        })
}

/// Echo identifier for this process: the low 16 bits of the pid.
pub fn default_identifier() -> u16 {
    (std::process::id() & 0xFFFF) as u16
}

/// Internet checksum of `data`, returned in network order.
///
/// Words are assembled low byte first, so the folded complement comes out
/// byte-swapped relative to the wire. The final swap puts it back: writing
/// the result with `to_be_bytes` yields the RFC 1071 checksum bytes on any host.
pub fn checksum(data: &[u8]) -> u16 {
    let mut sum = sum_le_words(data);
    sum = (sum >> 16) + (sum & 0xFFFF);
    sum += sum >> 16;

    let answer = !sum & 0xFFFF;
    ((answer >> 8) | ((answer << 8) & 0xFF00)) as u16
}

/// Sum all words (16 bit chunks) in the given data, each treated as little
/// endian. A trailing odd byte is added on its own.
fn sum_le_words(data: &[u8]) -> u32 {
    data.chunks(2)
        .map(|word| match *word {
            [w] => w as u32,
            [wl, wh] => u16::from_le_bytes([wl, wh]) as u32,
            _ => unreachable!(),
        })
        .fold(0, u32::wrapping_add)
}
