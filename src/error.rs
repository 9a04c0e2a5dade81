use std::io;

/// AuthError covers failures while negotiating the authentication method
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The greeting was truncated or the stream failed mid-read.
    #[error("malformed method negotiation: {0}")]
    Protocol(#[source] io::Error),

    #[error("unsupported SOCKS version: {0:#04x}")]
    VersionMismatch(u8),

    #[error("failed to write method selection: {0}")]
    Write(#[source] io::Error),
}

/// RequestError covers failures while resolving a client's connection request
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    /// The request was truncated or the stream failed mid-read.
    #[error("malformed connection request: {0}")]
    Protocol(#[source] io::Error),

    #[error("unsupported SOCKS version: {0:#04x}")]
    VersionMismatch(u8),

    #[error("unsupported command: {0:#04x}")]
    UnsupportedCommand(u8),

    #[error("unsupported address type: {0:#04x}")]
    UnsupportedAddressType(u8),

    #[error("failed to connect to {target}: {source}")]
    Dial {
        target: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to write reply: {0}")]
    Write(#[source] io::Error),
}

/// ConnectionError is the terminal error of a single proxied connection
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("negotiation failed: {0}")]
    Auth(#[from] AuthError),

    #[error("request failed: {0}")]
    Request(#[from] RequestError),
}
