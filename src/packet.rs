use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::util;

pub const ECHO_REQUEST_V4: u8 = 8;
pub const ECHO_REPLY_V4: u8 = 0;

/// Every request carries this sequence number; replies are told apart by identifier only.
pub const ECHO_SEQUENCE: u16 = 1;

/// Raw IPv4 sockets hand us the IP header too. Options are not expected.
pub const IPV4_HEADER_LEN: usize = 20;
pub const ICMP_HEADER_LEN: usize = 8;
pub const TIMESTAMP_LEN: usize = 8;

const ICMP_HEADER_END: usize = IPV4_HEADER_LEN + ICMP_HEADER_LEN;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct ICMPEchoPacket {
    pub message_type: u8,
    pub message_code: u8,
    pub checksum: u16,
    pub identifier: u16,
    pub sequence_num: u16,
}

impl ICMPEchoPacket {
    pub fn request(identifier: u16, sequence_num: u16) -> Self {
        ICMPEchoPacket {
            message_type: ECHO_REQUEST_V4,
            message_code: 0,
            checksum: 0,
            identifier,
            sequence_num,
        }
    }

    /// Unpack the first 8 bytes of `icmp` as an echo header.
    pub fn parse(icmp: &[u8]) -> Option<Self> {
        let header = icmp.get(..ICMP_HEADER_LEN)?;
        coder().deserialize(header).ok()
    }

    pub fn is_reply_to(&self, identifier: u16) -> bool {
        self.message_type == ECHO_REPLY_V4 && self.message_code == 0 && self.identifier == identifier
    }
}

// ICMP header fields are big endian on the wire
#[allow(deprecated)]
fn coder() -> bincode::Config {
    let mut coder = bincode::config();
    coder.big_endian();
    coder
}

/// Build an echo request carrying `timestamp` (seconds, host byte order) as its payload.
///
/// `util::checksum` already yields network order, so serializing the header
/// big endian is the only byte order step. The host's own order never leaks
/// into the header.
pub fn encode_echo_request(identifier: u16, sequence_num: u16, timestamp: f64) -> Result<Vec<u8>> {
    let payload = timestamp.to_ne_bytes();
    let mut header = ICMPEchoPacket::request(identifier, sequence_num);

    let mut provisional = coder().serialize(&header)?;
    provisional.extend_from_slice(&payload);
    header.checksum = util::checksum(&provisional);

    let mut packet = coder().serialize(&header)?;
    packet.extend_from_slice(&payload);
    Ok(packet)
}

/// Extract the send timestamp from `datagram` if it is an echo reply addressed to `identifier`.
///
/// Anything else seen on the raw socket, including truncated datagrams, yields `None`.
pub fn decode_echo_reply(datagram: &[u8], identifier: u16) -> Option<f64> {
    let header = ICMPEchoPacket::parse(datagram.get(IPV4_HEADER_LEN..)?)?;
    if !header.is_reply_to(identifier) {
        return None;
    }

    let payload = datagram.get(ICMP_HEADER_END..ICMP_HEADER_END + TIMESTAMP_LEN)?;
    let mut timestamp = [0u8; TIMESTAMP_LEN];
    timestamp.copy_from_slice(payload);
    Some(f64::from_ne_bytes(timestamp))
}
