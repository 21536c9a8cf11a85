//! Backend implementations of the [`SentinelApi`](crate::core::SentinelApi) contract.
//!
//! ## Available Backends
//!
//! - [`mock`] - A scripted in-memory backend for testing
//! - [`http`] - The real REST backend (requires the `http` feature)
//!
//! ## Implementing a Custom Backend
//!
//! To target another transport, implement the `SentinelApi` trait:
//!
//! ```rust,ignore
//! use sentinel_client::core::{
//!     ApiError, AuthToken, Credentials, ScanStarted, SentinelApi, TaskStatus, Website,
//!     WebsiteId,
//! };
//! use async_trait::async_trait;
//!
//! #[derive(Debug)]
//! pub struct MyBackend {
//!     // Your transport's state
//! }
//!
//! #[async_trait]
//! impl SentinelApi for MyBackend {
//!     async fn login(&self, credentials: &Credentials) -> Result<AuthToken, ApiError> {
//!         todo!()
//!     }
//!     // ...remaining operations
//! }
//! ```

pub mod mock;

#[cfg(feature = "http")]
pub mod http;

// Re-exports
pub use mock::{MockApi, MockTick};

#[cfg(feature = "http")]
pub use http::{HttpApi, HttpConfig};
