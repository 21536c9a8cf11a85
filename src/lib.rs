//! # Sentinel Client
//!
//! A client-side coordination library for website security monitoring:
//! it starts backend scans, tracks their asynchronous tasks to
//! completion, and keeps a local mirror of each website's state in sync.
//!
//! ## Overview
//!
//! Sentinel Client sits between an application frontend and a scan
//! backend, allowing you to:
//!
//! - Authenticate and mirror the account's monitored websites
//! - Kick off security scans without blocking on their completion
//! - Poll each scan task in the background, one live poll per website
//! - Merge finished results into the mirror exactly once
//! - Surface progress and outcomes as transient notifications
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sentinel_client::{Credentials, ScanCoordinator};
//! use sentinel_client::backends::HttpApi;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Create a coordinator against a live backend
//!     let coordinator = std::sync::Arc::new(
//!         ScanCoordinator::builder()
//!             .with_api(HttpApi::new(Default::default())?)
//!             .build()?,
//!     );
//!
//!     // Authenticate and mirror the website list
//!     coordinator
//!         .login(&Credentials::new("user@example.com", "secret"))
//!         .await?;
//!
//!     // Start a scan; results arrive via the background poller
//!     for site in coordinator.websites() {
//!         coordinator.start_scan(&site.id).await?;
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `default` - Includes the HTTP backend
//! - `http` - REST backend support via reqwest
//!
//! ## Architecture
//!
//! The library is organized into several layers:
//!
//! - **Core**: Fundamental types, traits, the website store, and errors
//! - **Backends**: API implementations (HTTP, mock)
//! - **Coordinator**: Scan initiation, the poll registry, and the
//!   per-task pollers
//! - **Notify**: Transient user-facing notifications

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod backends;
pub mod coordinator;
pub mod core;
pub mod notify;

// Re-export commonly used types at the crate root
pub use crate::core::{
    ApiError, ApiResult, AuthToken, CheckResult, CheckStatus, Credentials, NotificationSink,
    ScanStarted, ScanTask, SentinelApi, TaskState, TaskStatus, Website, WebsiteId, WebsiteStatus,
    WebsiteStore,
};

pub use crate::coordinator::{
    CoordinatorConfig, PollHandle, PollOutcome, PollState, ScanCoordinator,
    ScanCoordinatorBuilder, ScanRegistry,
};
pub use crate::notify::{Notification, Severity, TransientSink};

/// Prelude module for convenient imports.
///
/// ```rust
/// use sentinel_client::prelude::*;
/// ```
pub mod prelude {
    pub use crate::core::{
        ApiError, ApiResult, AuthToken, CheckResult, CheckStatus, Credentials, NotificationSink,
        ScanStarted, ScanTask, SentinelApi, TaskState, TaskStatus, Website, WebsiteId,
        WebsiteStatus,
    };
    pub use crate::coordinator::{
        CoordinatorConfig, PollHandle, PollOutcome, PollState, ScanCoordinator,
        ScanCoordinatorBuilder, ScanRegistry,
    };
    pub use crate::notify::{Notification, Severity, TransientSink};
}
