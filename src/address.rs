use crate::error::RequestError;
use crate::protocol::AddressType;
use std::fmt;
use std::net::Ipv4Addr;
use tokio::io::{AsyncRead, AsyncReadExt};

/// TargetAddr is the destination a client asked the proxy to connect to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetAddr {
    IPv4(Ipv4Addr, u16),
    DomainName(String, u16),
}

impl TargetAddr {
    /// host renders the address part: dotted-decimal or the literal domain
    pub fn host(&self) -> String {
        match self {
            TargetAddr::IPv4(ip, _) => ip.to_string(),
            TargetAddr::DomainName(domain, _) => domain.clone(),
        }
    }

    pub fn port(&self) -> u16 {
        match self {
            TargetAddr::IPv4(_, port) | TargetAddr::DomainName(_, port) => *port,
        }
    }
}

impl fmt::Display for TargetAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetAddr::IPv4(ip, port) => write!(f, "{ip}:{port}"),
            TargetAddr::DomainName(domain, port) => write!(f, "{domain}:{port}"),
        }
    }
}

/// parse_target_address reads DST.ADDR and DST.PORT for an already-read
/// ATYP byte.
///
/// IPv6 and unknown address types are rejected before any address bytes
/// are consumed.
pub async fn parse_target_address<R>(stream: &mut R, atyp: u8) -> Result<TargetAddr, RequestError>
where
    R: AsyncRead + Unpin,
{
    match AddressType::from_byte(atyp) {
        Some(AddressType::IPv4) => {
            let mut addr = [0u8; 4];
            stream
                .read_exact(&mut addr)
                .await
                .map_err(RequestError::Protocol)?;
            let port = read_port(stream).await?;

            Ok(TargetAddr::IPv4(Ipv4Addr::from(addr), port))
        }
        Some(AddressType::DomainName) => {
            // First octet in DomainName contains the number of
            // octets to follow
            let mut len = [0u8; 1];
            stream
                .read_exact(&mut len)
                .await
                .map_err(RequestError::Protocol)?;

            let mut domain = vec![0u8; len[0] as usize];
            stream
                .read_exact(&mut domain)
                .await
                .map_err(RequestError::Protocol)?;
            let port = read_port(stream).await?;

            // Taken literally; the dial decides whether it resolves
            let domain = String::from_utf8_lossy(&domain).into_owned();

            Ok(TargetAddr::DomainName(domain, port))
        }
        Some(AddressType::IPv6) | None => Err(RequestError::UnsupportedAddressType(atyp)),
    }
}

/// read_port reads a big-endian (network order) DST.PORT
async fn read_port<R>(stream: &mut R) -> Result<u16, RequestError>
where
    R: AsyncRead + Unpin,
{
    let mut port_buf = [0u8; 2];
    stream
        .read_exact(&mut port_buf)
        .await
        .map_err(RequestError::Protocol)?;

    Ok(u16::from_be_bytes(port_buf))
}
