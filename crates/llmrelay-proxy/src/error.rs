//! Upstream failure taxonomy for the non-streaming path.
//!
//! Streaming faults never surface as errors; the relay converts them to a
//! single terminal event instead (see [`crate::relay`]).

use thiserror::Error;

/// Why a forwarded request produced no usable gateway response.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The gateway answered with a non-success status. The response body
    /// is captured verbatim so the original diagnostic text is never lost.
    #[error("gateway request failed with status {status}: {body}")]
    Status {
        /// HTTP status returned by the gateway.
        status: u16,
        /// Raw response body, byte-for-byte.
        body: String,
    },

    /// No HTTP response was obtained at all (DNS, connect, TLS handshake
    /// or timeout failure).
    #[error("gateway unreachable: {0}")]
    Unreachable(#[from] reqwest::Error),
}

impl UpstreamError {
    /// Status code to report to the caller. Transport failures never
    /// carried a status, so they default to 500.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Status { status, .. } => *status,
            Self::Unreachable(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_preserves_body() {
        let err = UpstreamError::Status {
            status: 429,
            body: "slow down".to_string(),
        };
        assert_eq!(err.status_code(), 429);
        assert!(err.to_string().contains("slow down"));
    }
}
