//! CLI entry point - the composition root.
//!
//! This is the only place where infrastructure is wired together: settings
//! are assembled from flags, environment variables and an optional `.env`
//! file, the mTLS client is built fail-fast, and the server runs until a
//! shutdown signal arrives.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use llmrelay_core::{
    DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_LISTEN_PORT, DEFAULT_MAX_IDLE_PER_HOST,
    DEFAULT_MAX_STREAMING_SESSIONS, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SESSION_TIMEOUT_SECS,
    GatewaySettings, HttpPoolSettings, RelaySettings, TlsSettings,
};
use llmrelay_proxy::{AppState, GatewayClient, StreamingRelay, serve};

#[derive(Parser, Debug)]
#[command(
    name = "llmrelay",
    version,
    about = "HTTP relay in front of the LLM gateway"
)]
struct Cli {
    /// Port for the inbound HTTP listener.
    #[arg(long, env = "LLMRELAY_PORT", default_value_t = DEFAULT_LISTEN_PORT)]
    port: u16,

    /// Gateway chat completions endpoint.
    #[arg(long, env = "GATEWAY_CHAT_URL")]
    chat_url: String,

    /// Gateway OCR endpoint.
    #[arg(long, env = "GATEWAY_OCR_URL")]
    ocr_url: String,

    /// Client identifier sent as `x-client-id` on every upstream request.
    #[arg(long, env = "GATEWAY_CLIENT_ID")]
    client_id: String,

    /// Client secret sent as `x-client-secret` on every upstream request.
    #[arg(long, env = "GATEWAY_CLIENT_SECRET", hide_env_values = true)]
    client_secret: String,

    /// Enable outbound TLS material loading.
    #[arg(long, env = "TLS_ENABLED", default_value_t = false)]
    tls: bool,

    /// PEM private key for the client identity (PKCS#8, RSA or EC).
    #[arg(long, env = "TLS_KEY_PATH")]
    tls_key_path: Option<PathBuf>,

    /// PEM certificate chain for the client identity, leaf first.
    #[arg(long, env = "TLS_CERT_PATH")]
    tls_cert_path: Option<PathBuf>,

    /// PEM bundle of CA certificates used as the sole trust source.
    #[arg(long, env = "CA_CERT_PATH")]
    ca_cert_path: Option<PathBuf>,

    /// Legacy combined keystore (key + chain in one PEM bundle).
    #[arg(long, env = "KEYSTORE_PATH")]
    keystore_path: Option<PathBuf>,

    /// Legacy keystore password. Accepted for config compatibility only.
    #[arg(long, env = "KEYSTORE_PASSWORD", hide_env_values = true)]
    keystore_password: Option<String>,

    /// Legacy truststore (exported PEM CA bundle).
    #[arg(long, env = "TRUSTSTORE_PATH")]
    truststore_path: Option<PathBuf>,

    /// Legacy truststore password. Accepted for config compatibility only.
    #[arg(long, env = "TRUSTSTORE_PASSWORD", hide_env_values = true)]
    truststore_password: Option<String>,

    /// Connect timeout for upstream requests, in seconds.
    #[arg(long, env = "LLMRELAY_CONNECT_TIMEOUT_SECS", default_value_t = DEFAULT_CONNECT_TIMEOUT_SECS)]
    connect_timeout_secs: u64,

    /// Total timeout for non-streaming upstream requests, in seconds.
    #[arg(long, env = "LLMRELAY_REQUEST_TIMEOUT_SECS", default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS)]
    request_timeout_secs: u64,

    /// Idle connection cap per upstream host.
    #[arg(long, env = "LLMRELAY_MAX_IDLE_PER_HOST", default_value_t = DEFAULT_MAX_IDLE_PER_HOST)]
    max_idle_per_host: usize,

    /// Maximum concurrent streaming relay sessions.
    #[arg(long, env = "LLMRELAY_MAX_STREAMING_SESSIONS", default_value_t = DEFAULT_MAX_STREAMING_SESSIONS)]
    max_streaming_sessions: usize,

    /// Wall-clock ceiling for one streaming session, in seconds.
    #[arg(long, env = "LLMRELAY_SESSION_TIMEOUT_SECS", default_value_t = DEFAULT_SESSION_TIMEOUT_SECS)]
    session_timeout_secs: u64,
}

impl Cli {
    fn into_settings(self) -> RelaySettings {
        RelaySettings {
            listen_port: self.port,
            gateway: GatewaySettings {
                chat_url: self.chat_url,
                ocr_url: self.ocr_url,
                client_id: self.client_id,
                client_secret: self.client_secret,
            },
            tls: TlsSettings {
                enabled: self.tls,
                tls_key_path: self.tls_key_path,
                tls_cert_path: self.tls_cert_path,
                ca_cert_path: self.ca_cert_path,
                keystore_path: self.keystore_path,
                keystore_password: self.keystore_password,
                truststore_path: self.truststore_path,
                truststore_password: self.truststore_password,
            },
            http: HttpPoolSettings {
                connect_timeout_secs: self.connect_timeout_secs,
                request_timeout_secs: self.request_timeout_secs,
                max_idle_per_host: self.max_idle_per_host,
            },
            max_streaming_sessions: self.max_streaming_sessions,
            session_timeout_secs: self.session_timeout_secs,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables before clap reads them.
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = Cli::parse().into_settings();

    info!(
        port = settings.listen_port,
        tls = settings.tls.enabled,
        max_sessions = settings.max_streaming_sessions,
        "Starting relay"
    );

    // Broken TLS material must abort startup, not surface per-request.
    let client = llmrelay_tls::build_client(&settings.tls, &settings.http)?;

    let state = AppState {
        gateway: Arc::new(GatewayClient::new(
            client.clone(),
            settings.gateway.clone(),
            Duration::from_secs(settings.http.request_timeout_secs),
        )),
        relay: Arc::new(StreamingRelay::new(
            client,
            settings.gateway.clone(),
            settings.max_streaming_sessions,
            settings.session_timeout(),
        )),
    };

    let listener = TcpListener::bind(("0.0.0.0", settings.listen_port)).await?;

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown signal received");
                signal_cancel.cancel();
            }
            Err(e) => error!("Failed to listen for shutdown signal: {e}"),
        }
    });

    serve(listener, state, cancel).await
}
