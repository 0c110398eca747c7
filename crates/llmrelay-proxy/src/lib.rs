//! Gateway passthrough server.
//!
//! Forwards chat completion and OCR requests to the upstream gateway over
//! the shared mutual-TLS client, either as a single round-trip
//! ([`upstream`]) or as a line-by-line event-stream relay ([`relay`]).
//! [`server`] exposes both behind the REST surface.

pub mod error;
pub mod models;
pub mod relay;
pub mod server;
pub mod upstream;

pub use error::UpstreamError;
pub use relay::{RelayHandle, RelayOutcome, RelayReport, StreamingRelay};
pub use server::{AppState, router, serve};
pub use upstream::GatewayClient;
