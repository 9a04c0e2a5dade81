use crate::error::AuthError;
use crate::protocol::{AuthMethod, Version};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

/// negotiate_auth handles authentication negotiation between the SOCKS server and client.
///
/// The offered methods are consumed but never inspected: the server always
/// selects "no authentication", even when the client did not offer it.
pub async fn negotiate_auth<S>(stream: &mut S) -> Result<(), AuthError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    // ClientHello format
    // +----+----------+----------+
    // |VER | NMETHODS | METHODS  |
    // +----+----------+----------+
    // | 1  |    1     | 0 to 255 |
    // +----+----------+----------+

    // Instantiate handshake buffer & read
    let mut buf = [0u8; 2];
    stream
        .read_exact(&mut buf)
        .await
        .map_err(AuthError::Protocol)?;

    // Parse version and client methods from handshake
    let version = buf[0];
    let n_methods = buf[1];

    // Ensure version is 0x05 -> SOCKS5
    if version != Version::SOCKS5 as u8 {
        return Err(AuthError::VersionMismatch(version));
    }

    // Drain the method list
    let mut methods = vec![0u8; n_methods as usize];
    stream
        .read_exact(&mut methods)
        .await
        .map_err(AuthError::Protocol)?;

    debug!(offered = ?methods, "client greeting");

    // ServerChoice method selection reply format
    // +----+--------+
    // |VER | METHOD |
    // +----+--------+
    // | 1  |   1    |
    // +----+--------+
    stream
        .write_all(&[Version::SOCKS5 as u8, AuthMethod::NoAuth as u8])
        .await
        .map_err(AuthError::Write)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::duplex;

    async fn run_greeting(greeting: &[u8]) -> (Result<(), AuthError>, Vec<u8>) {
        let (mut client, mut server) = duplex(1024);
        client.write_all(greeting).await.unwrap();
        client.shutdown().await.unwrap();

        let result = negotiate_auth(&mut server).await;
        drop(server);

        let mut written = Vec::new();
        client.read_to_end(&mut written).await.unwrap();
        (result, written)
    }

    #[tokio::test]
    async fn selects_no_auth_when_offered() {
        let (result, written) = run_greeting(&[0x05, 0x01, 0x00]).await;
        assert!(result.is_ok());
        assert_eq!(written, vec![0x05, 0x00]);
    }

    #[tokio::test]
    async fn selects_no_auth_even_when_not_offered() {
        // Only username/password and GSSAPI on offer
        let (result, written) = run_greeting(&[0x05, 0x02, 0x02, 0x01]).await;
        assert!(result.is_ok());
        assert_eq!(written, vec![0x05, 0x00]);
    }

    #[tokio::test]
    async fn accepts_empty_method_list() {
        let (result, written) = run_greeting(&[0x05, 0x00]).await;
        assert!(result.is_ok());
        assert_eq!(written, vec![0x05, 0x00]);
    }

    #[tokio::test]
    async fn accepts_full_method_list() {
        let mut greeting = vec![0x05, 0xFF];
        greeting.extend((0..=254u8).collect::<Vec<_>>());
        let (result, written) = run_greeting(&greeting).await;
        assert!(result.is_ok());
        assert_eq!(written, vec![0x05, 0x00]);
    }

    #[tokio::test]
    async fn consumes_exactly_the_greeting() {
        let (mut client, mut server) = duplex(1024);
        client
            .write_all(&[0x05, 0x02, 0x00, 0x02, 0xAA, 0xBB])
            .await
            .unwrap();

        negotiate_auth(&mut server).await.unwrap();

        let mut rest = [0u8; 2];
        server.read_exact(&mut rest).await.unwrap();
        assert_eq!(rest, [0xAA, 0xBB]);
    }

    #[tokio::test]
    async fn rejects_wrong_version_without_reply() {
        let (result, written) = run_greeting(&[0x04, 0x01, 0x00]).await;
        assert!(matches!(result, Err(AuthError::VersionMismatch(0x04))));
        assert!(written.is_empty());
    }

    #[tokio::test]
    async fn truncated_header_is_protocol_error() {
        let (result, written) = run_greeting(&[0x05]).await;
        assert!(matches!(result, Err(AuthError::Protocol(_))));
        assert!(written.is_empty());
    }

    #[tokio::test]
    async fn truncated_method_list_is_protocol_error() {
        let (result, written) = run_greeting(&[0x05, 0x03, 0x00]).await;
        assert!(matches!(result, Err(AuthError::Protocol(_))));
        assert!(written.is_empty());
    }
}
