//! Core types and traits for the sentinel-client library.
//!
//! This module provides the fundamental building blocks used throughout
//! the library:
//!
//! - [`types`] - The data model: `Website`, `CheckResult`, `ScanTask`, auth material
//! - [`error`] - Structured error types
//! - [`store`] - The client-side website mirror and its merge operations
//! - [`traits`] - The `SentinelApi` collaborator seam and notification sink

pub mod error;
pub mod store;
pub mod traits;
pub mod types;

// Re-export commonly used types at the core level
pub use error::{ApiError, ApiResult};
pub use store::WebsiteStore;
pub use traits::{ArcApi, ArcSink, NotificationSink, PollObserver, SentinelApi};
pub use types::{
    AuthToken, CheckResult, CheckStatus, Credentials, ScanStarted, ScanTask, TaskState,
    TaskStatus, Website, WebsiteId, WebsiteStatus,
};
