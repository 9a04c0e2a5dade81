//! A minimal SOCKS5 proxy library
//!
//! ## SOCKS5 Implementation
//!
//! - Features:
//!     - CONNECT
//!     - IPv4 and domain name targets
//!     - No Authentication (always selected, whatever the client offers)
//!     - Async using tokio, one task per connection and one per relay direction
//! - Not supported: BIND, UDP ASSOCIATE, IPv6 targets, authenticated methods
//! - [SOCKS5 (RFC 1928)](https://datatracker.ietf.org/doc/html/rfc1928)
//!
//! # Example
//! ```no_run
//! use minisocks::Socks5Server;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut server = Socks5Server::new("127.0.0.1:8888");
//!     server.run().await
//! }
//! ```

pub mod address;
pub mod auth;
pub mod commands;
pub mod dial;
pub mod error;
pub mod protocol;
pub mod relay;
pub mod server;

// Re-export main types at crate root for convenience
pub use address::TargetAddr;
pub use auth::negotiate_auth;
pub use commands::resolve_request;
pub use dial::{Dialer, TcpDialer};
pub use error::{AuthError, ConnectionError, RequestError};
pub use relay::relay;
pub use server::{Socks5Server, handle_connection};
