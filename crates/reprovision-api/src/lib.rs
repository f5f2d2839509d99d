// reprovision-api: Async Rust client for the App Store Connect provisioning API

pub mod auth;
pub mod client;
pub mod connection;
pub mod error;
pub mod transport;
pub mod types;

pub use auth::{ApiKey, TokenSigner};
pub use client::AppStoreConnectClient;
pub use connection::{ConnectionClient, PortalConnection};
pub use error::{ApiErrorMessage, Error};
pub use transport::{TlsMode, TransportConfig};
