use crate::address::parse_target_address;
use crate::dial::Dialer;
use crate::error::RequestError;
use crate::protocol::{Command, SUCCESS_REPLY, Version};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

/// resolve_request reads the client's connection request, dials the
/// destination and acknowledges it.
///
/// The outbound stream is only returned once the success reply has been
/// written; if that write fails the outbound stream is shut down first.
pub async fn resolve_request<S, D>(stream: &mut S, dialer: &D) -> Result<D::Stream, RequestError>
where
    S: AsyncRead + AsyncWrite + Unpin,
    D: Dialer,
{
    // SOCKS5 request format
    // +----+-----+-------+------+----------+----------+
    // |VER | CMD |  RSV  | ATYP | DST.ADDR | DST.PORT |
    // +----+-----+-------+------+----------+----------+
    // | 1  |  1  | X'00' |  1   | Variable |    2     |
    // +----+-----+-------+------+----------+----------+

    // Instantiate a request buffer & read
    let mut reqbuf = [0u8; 4];
    stream
        .read_exact(&mut reqbuf)
        .await
        .map_err(RequestError::Protocol)?;

    // RSV is not checked
    let [version, command, _, atyp] = reqbuf;

    // Ensure version is 0x05 -> SOCKS5
    if version != Version::SOCKS5 as u8 {
        return Err(RequestError::VersionMismatch(version));
    }

    match Command::from_byte(command) {
        Some(Command::Connect) => (),
        None => return Err(RequestError::UnsupportedCommand(command)),
    }

    let target = parse_target_address(stream, atyp).await?;
    info!(%target, "connecting to target");

    let mut outbound = dialer
        .dial(&target.host(), target.port())
        .await
        .map_err(|source| RequestError::Dial {
            target: target.to_string(),
            source,
        })?;

    if let Err(e) = stream.write_all(&SUCCESS_REPLY).await {
        // Don't leak the destination connection
        if let Err(close_err) = outbound.shutdown().await {
            debug!(%target, "outbound shutdown failed: {close_err}");
        }
        return Err(RequestError::Write(e));
    }

    Ok(outbound)
}
