use crate::{
    auth, commands,
    dial::{Dialer, TcpDialer},
    error::ConnectionError,
    relay,
};
use anyhow::{Result, bail};
use std::{net::SocketAddr, sync::Arc};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tracing::{Instrument, error, info, info_span, warn};

/// Socks5Server represents a SOCKS5 server and houses related
/// configuration data
pub struct Socks5Server<D = TcpDialer> {
    pub listen_addr: String,
    dialer: Arc<D>,
    listener: Option<TcpListener>,
}

impl Socks5Server {
    /// new is a constructor for the Socks5Server type, dialing targets over TCP
    pub fn new(listen_addr: impl Into<String>) -> Self {
        Self {
            listen_addr: listen_addr.into(),
            dialer: Arc::new(TcpDialer),
            listener: None,
        }
    }
}

impl<D: Dialer> Socks5Server<D> {
    /// with_dialer swaps the capability used to reach destinations
    pub fn with_dialer<T: Dialer>(self, dialer: T) -> Socks5Server<T> {
        Socks5Server {
            listen_addr: self.listen_addr,
            dialer: Arc::new(dialer),
            listener: self.listener,
        }
    }

    /// bind to the listen address and return the bound address.
    /// Fails when called twice.
    pub async fn bind(&mut self) -> Result<SocketAddr> {
        if self.listener.is_some() {
            bail!("listener already bound");
        }

        // Instantiate tokio listener
        let listener = TcpListener::bind(&self.listen_addr).await?;
        let addr = listener.local_addr()?;

        info!("SOCKS5 proxy listening on {addr}");

        self.listener = Some(listener);
        Ok(addr)
    }

    /// run handles server spinup and listens for incoming connections.
    /// It only returns if binding fails.
    pub async fn run(&mut self) -> Result<()> {
        if self.listener.is_none() {
            self.bind().await?;
        }
        let Some(listener) = self.listener.take() else {
            bail!("listener missing after bind");
        };

        loop {
            // Accept incoming connection
            let (inbound, peer_addr) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    error!("accept failed: {e}");
                    continue;
                }
            };

            let dialer = Arc::clone(&self.dialer);

            tokio::spawn(
                async move {
                    info!("new client");

                    if let Err(e) = handle_connection(inbound, dialer.as_ref()).await {
                        warn!("closing connection: {e}");
                    }
                }
                .instrument(info_span!("conn", peer = %peer_addr)),
            );
        }
    }
}

/// handle_connection runs the full SOCKS5 flow for one client:
/// negotiation, request resolution, then relay.
///
/// On error the client stream is dropped, closing it. On success both
/// streams are handed to the relay, which closes them when done.
pub async fn handle_connection<S, D>(mut stream: S, dialer: &D) -> Result<(), ConnectionError>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    D: Dialer,
{
    // Negotiate authentication with client
    auth::negotiate_auth(&mut stream).await?;

    // Handle connection request from client
    let outbound = commands::resolve_request(&mut stream, dialer).await?;

    relay::relay(stream, outbound);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dial::mock::MockDialer;
    use crate::error::{AuthError, RequestError};
    use crate::protocol::SUCCESS_REPLY;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt, duplex};
    use tokio::time::timeout;

    const WAIT: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn full_flow_relays_after_reply() {
        let dialer = MockDialer::default();
        let (mut client, inbound) = duplex(1024);

        client
            .write_all(&[0x05, 0x01, 0x00, 0x05, 0x01, 0x00, 0x01, 10, 0, 0, 7, 0x00, 0x16])
            .await
            .unwrap();
        // Early data queued behind the request
        client.write_all(b"hello").await.unwrap();

        handle_connection(inbound, &dialer).await.unwrap();
        assert_eq!(dialer.dialed(), vec![("10.0.0.7".to_string(), 22)]);

        let mut handshake = [0u8; 12];
        client.read_exact(&mut handshake).await.unwrap();
        assert_eq!(handshake[..2], [0x05, 0x00]);
        assert_eq!(handshake[2..], SUCCESS_REPLY);

        let mut target = dialer.take_remote();
        let mut buf = [0u8; 5];
        timeout(WAIT, target.read_exact(&mut buf)).await.unwrap().unwrap();
        assert_eq!(&buf, b"hello");

        target.write_all(b"world").await.unwrap();
        timeout(WAIT, client.read_exact(&mut buf)).await.unwrap().unwrap();
        assert_eq!(&buf, b"world");
    }

    #[tokio::test]
    async fn negotiation_failure_closes_client() {
        let dialer = MockDialer::default();
        let (mut client, inbound) = duplex(1024);
        client.write_all(&[0x04, 0x01, 0x00]).await.unwrap();

        let err = handle_connection(inbound, &dialer).await.unwrap_err();
        assert!(matches!(err, ConnectionError::Auth(AuthError::VersionMismatch(4))));

        let mut rest = Vec::new();
        client.read_to_end(&mut rest).await.unwrap();
        assert!(rest.is_empty());
        assert!(dialer.dialed().is_empty());
    }

    #[tokio::test]
    async fn request_failure_closes_client_after_method_reply() {
        let dialer = MockDialer::refusing();
        let (mut client, inbound) = duplex(1024);
        client
            .write_all(&[0x05, 0x01, 0x00, 0x05, 0x01, 0x00, 0x01, 127, 0, 0, 1, 0x00, 0x50])
            .await
            .unwrap();

        let err = handle_connection(inbound, &dialer).await.unwrap_err();
        assert!(matches!(err, ConnectionError::Request(RequestError::Dial { .. })));

        let mut rest = Vec::new();
        client.read_to_end(&mut rest).await.unwrap();
        assert_eq!(rest, vec![0x05, 0x00]);
    }

    #[tokio::test]
    async fn bind_twice_fails() {
        let mut server = Socks5Server::new("127.0.0.1:0");
        let addr = server.bind().await.unwrap();
        assert_ne!(addr.port(), 0);
        assert!(server.bind().await.is_err());
    }
}
