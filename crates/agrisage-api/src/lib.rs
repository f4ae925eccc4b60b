// agrisage-api: Async Rust client for the agricultural advisory API

pub mod client;
pub mod error;
pub mod models;
pub mod session;
pub mod transport;

mod advice;
mod auth;
mod crops;
mod disease;
mod farms;
mod weather;

pub use client::ApiClient;
pub use disease::ImageUpload;
pub use error::Error;
pub use session::{MemoryTokenStore, Session, SessionState, TokenStore, TokenStoreError};
pub use transport::{TlsMode, TransportConfig};
