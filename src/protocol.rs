//! SOCKS5 wire constants ([RFC 1928](https://datatracker.ietf.org/doc/html/rfc1928))
//!
//! Only the subset this server speaks is modelled: anonymous auth,
//! CONNECT, and IPv4/domain targets. IPv6 is recognised so it can be
//! rejected explicitly.

// RSV: Fields marked RESERVED (RSV) must be set to X'00'.
pub const RSV: u8 = 0x00;

/// SUCCESS_REPLY is the fixed reply sent after a successful dial.
/// BND.ADDR and BND.PORT are always zero; the real dial-side
/// endpoint is never reported.
// +----+-----+-------+------+----------+----------+
// |VER | REP |  RSV  | ATYP | BND.ADDR | BND.PORT |
// +----+-----+-------+------+----------+----------+
// | 05 | 00  |  00   |  01  | 00000000 |   0000   |
// +----+-----+-------+------+----------+----------+
pub const SUCCESS_REPLY: [u8; 10] = [
    Version::SOCKS5 as u8,
    ReplyCode::Succeeded as u8,
    RSV,
    AddressType::IPv4 as u8,
    0,
    0,
    0,
    0,
    0,
    0,
];

/// Version represents available SOCKS proxy versions
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Version {
    SOCKS5 = 0x05,
}

/// AuthMethod represents the SOCKS5 authentication methods
/// this server can select
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AuthMethod {
    NoAuth = 0x00,
    // Gssapi = 0x01, not supported
    // UserPass = 0x02, not supported
}

/// Command represents SOCKS5 protocol commands
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Connect = 0x01,
    // Bind = 0x02, not supported
    // UdpAssociate = 0x03, not supported
}

impl Command {
    /// from_byte converts a byte to a supported SOCKS5 command
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(Command::Connect),
            _ => None,
        }
    }
}

/// AddressType represents the SOCKS5 address types:
/// IPv4, Domain Name, IPv6
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AddressType {
    IPv4 = 0x01,
    DomainName = 0x03,
    IPv6 = 0x04,
}

impl AddressType {
    /// from_byte converts a byte to its related network address type
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(AddressType::IPv4),
            0x03 => Some(AddressType::DomainName),
            0x04 => Some(AddressType::IPv6),
            _ => None,
        }
    }
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReplyCode {
    Succeeded = 0x00,
    // Failure codes are never sent: a failed request closes the connection.
}
