//! Nullable infrastructure for deterministic testing.
//!
//! The only external dependency of the watchdog is HTTP, abstracted behind
//! [`watchdog_client::HttpTransport`]. This crate provides a test-friendly
//! implementation that:
//! - Answers from a script keyed on URL and form fields
//! - Records every request for assertions
//! - Never touches the network
//!
//! Usage: build a `RateLimitedRetryingClient` over a [`NullTransport`] and
//! drive the real forum/explorer parsing and retry logic against it.

pub mod fixtures;
pub mod transport;

pub use transport::NullTransport;
