//! Error types for TLS material loading and client construction.
//!
//! Every variant here is fatal at startup: a client with partially loaded
//! security material is never constructed.

use thiserror::Error;

/// Result type alias for TLS operations.
pub type TlsResult<T> = Result<T, TlsError>;

/// Errors raised while loading credentials or building the client.
#[derive(Debug, Error)]
pub enum TlsError {
    /// A key or certificate file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path that failed to read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The private key did not decode under any supported algorithm.
    #[error("failed to decode private key from {path}: {message}")]
    KeyDecode {
        /// Path of the key file.
        path: String,
        /// What went wrong.
        message: String,
    },

    /// Certificate material did not decode.
    #[error("failed to decode certificate from {path}: {message}")]
    CertificateDecode {
        /// Path of the certificate file.
        path: String,
        /// What went wrong.
        message: String,
    },

    /// A parsed CA certificate was rejected by the trust store.
    #[error("rejected trust anchor {alias} from {path}: {source}")]
    TrustAnchor {
        /// Synthetic alias of the rejected certificate.
        alias: String,
        /// Path of the CA bundle.
        path: String,
        /// rustls rejection reason.
        #[source]
        source: rustls::Error,
    },

    /// rustls refused the assembled identity or configuration.
    #[error("TLS configuration error: {0}")]
    Config(#[from] rustls::Error),

    /// The HTTP client itself failed to build.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[from] reqwest::Error),
}
