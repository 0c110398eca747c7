//! Relay settings and their defaults.
//!
//! These are pure configuration types with no infrastructure dependencies.
//! The CLI crate populates them from flags, environment variables and an
//! optional `.env` file; everything downstream treats them as read-only.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default port the relay listens on.
pub const DEFAULT_LISTEN_PORT: u16 = 8080;

/// Default connect timeout for upstream requests, in seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default total request timeout for non-streaming upstream requests, in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default cap on idle pooled connections per upstream host.
pub const DEFAULT_MAX_IDLE_PER_HOST: usize = 20;

/// Default bound on concurrent streaming relay sessions.
pub const DEFAULT_MAX_STREAMING_SESSIONS: usize = 64;

/// Default wall-clock ceiling for one streaming session, in seconds.
pub const DEFAULT_SESSION_TIMEOUT_SECS: u64 = 300;

/// Full relay configuration, assembled once at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelaySettings {
    /// Port for the inbound HTTP listener.
    pub listen_port: u16,

    /// Gateway endpoints and credentials.
    pub gateway: GatewaySettings,

    /// Outbound TLS configuration.
    pub tls: TlsSettings,

    /// Connection pool and timeout tuning.
    pub http: HttpPoolSettings,

    /// Maximum number of concurrent streaming relay sessions.
    pub max_streaming_sessions: usize,

    /// Wall-clock ceiling for a single streaming session, in seconds.
    pub session_timeout_secs: u64,
}

/// Upstream gateway endpoints and the identifying headers sent with every request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewaySettings {
    /// Base URL for chat completion requests.
    pub chat_url: String,

    /// Base URL for OCR requests.
    pub ocr_url: String,

    /// Value of the `x-client-id` header attached to every upstream request.
    pub client_id: String,

    /// Value of the `x-client-secret` header attached to every upstream request.
    pub client_secret: String,
}

/// How the outbound client sources its TLS material.
///
/// The three concerns (identity, trust, pooling) are resolved independently
/// by the client factory; this enum only captures the outer on/off switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TlsMode {
    /// Plain HTTP client, no credential or trust loading at all.
    Disabled,
    /// HTTPS client assembled from the paths in [`TlsSettings`].
    Enabled,
}

/// Outbound TLS material paths.
///
/// PEM paths win over the legacy store paths when both are set; when
/// neither identity source is set the client presents no certificate, and
/// when neither trust source is set the platform trust anchors apply.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TlsSettings {
    /// Whether outbound TLS material is loaded at all.
    pub enabled: bool,

    /// PEM private key for the client identity (PKCS#8, RSA or EC).
    pub tls_key_path: Option<PathBuf>,

    /// PEM certificate chain for the client identity, leaf first.
    pub tls_cert_path: Option<PathBuf>,

    /// PEM bundle of CA certificates used as the sole trust source.
    pub ca_cert_path: Option<PathBuf>,

    /// Legacy combined keystore (private key + chain in one PEM bundle).
    pub keystore_path: Option<PathBuf>,

    /// Legacy keystore unlock phrase. Accepted for config compatibility;
    /// PEM bundles are unencrypted, so a set value only produces a warning.
    pub keystore_password: Option<String>,

    /// Legacy truststore (exported PEM CA bundle).
    pub truststore_path: Option<PathBuf>,

    /// Legacy truststore unlock phrase, same status as `keystore_password`.
    pub truststore_password: Option<String>,
}

impl TlsSettings {
    /// The effective on/off switch for the client factory.
    #[must_use]
    pub const fn mode(&self) -> TlsMode {
        if self.enabled {
            TlsMode::Enabled
        } else {
            TlsMode::Disabled
        }
    }

    /// Whether a full PEM identity (key + chain) is configured.
    #[must_use]
    pub const fn has_pem_identity(&self) -> bool {
        self.tls_key_path.is_some() && self.tls_cert_path.is_some()
    }
}

/// Connection pool limits and timeouts for the shared upstream client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpPoolSettings {
    /// Connect timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Total request timeout in seconds (non-streaming requests only;
    /// streaming sessions are bounded by the session ceiling instead).
    pub request_timeout_secs: u64,

    /// Idle connection cap per upstream host.
    pub max_idle_per_host: usize,
}

impl Default for HttpPoolSettings {
    fn default() -> Self {
        Self {
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            max_idle_per_host: DEFAULT_MAX_IDLE_PER_HOST,
        }
    }
}

impl RelaySettings {
    /// Session ceiling as a `Duration`.
    #[must_use]
    pub const fn session_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.session_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tls_mode_follows_enabled_flag() {
        let mut tls = TlsSettings::default();
        assert_eq!(tls.mode(), TlsMode::Disabled);
        tls.enabled = true;
        assert_eq!(tls.mode(), TlsMode::Enabled);
    }

    #[test]
    fn pem_identity_requires_both_paths() {
        let mut tls = TlsSettings {
            tls_key_path: Some(PathBuf::from("/certs/tls.key")),
            ..TlsSettings::default()
        };
        assert!(!tls.has_pem_identity());
        tls.tls_cert_path = Some(PathBuf::from("/certs/tls.crt"));
        assert!(tls.has_pem_identity());
    }

    #[test]
    fn pool_defaults_match_constants() {
        let pool = HttpPoolSettings::default();
        assert_eq!(pool.connect_timeout_secs, DEFAULT_CONNECT_TIMEOUT_SECS);
        assert_eq!(pool.max_idle_per_host, DEFAULT_MAX_IDLE_PER_HOST);
    }
}
