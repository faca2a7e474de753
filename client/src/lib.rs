//! Outbound HTTP for the watchdog.
//!
//! Design:
//! - [`HttpTransport`] is the only seam to the network; `ReqwestTransport` in
//!   production, a scripted nullable in tests.
//! - [`RateLimitedRetryingClient`] wraps a transport with process-wide call
//!   spacing and bounded retries. One instance is shared by every API.
//! - [`ForumApi`] and [`ExplorerApi`] turn raw responses into typed records.

pub mod client;
pub mod error;
pub mod explorer;
pub mod forum;
pub mod retry;
pub mod transport;

pub use client::{FetchOutcome, RateLimitedRetryingClient, DEFAULT_SPACING};
pub use error::{ClientError, ExplorerError, ForumError, TransportError};
pub use explorer::{ExplorerApi, ExplorerConfig, LiveCell, PageFetch, DEFAULT_PAGE_SIZE};
pub use forum::{ForumApi, ForumConfig};
pub use retry::{Attempt, RetryPolicy, RetryState};
pub use transport::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
