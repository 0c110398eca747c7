//! Shared HTTPS client construction.
//!
//! Builds the one pooled `reqwest::Client` the process uses for all
//! gateway traffic. Identity material, trust material and pool limits are
//! three independent concerns; within each, the first configured source
//! wins. Any decode failure here aborts startup; a client is never built
//! from partially loaded security material.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use reqwest::Client;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::{ClientConfig, RootCertStore};
use tracing::{info, warn};

use llmrelay_core::{HttpPoolSettings, TlsMode, TlsSettings};

use crate::error::{TlsError, TlsResult};
use crate::pem::load_credential_bundle;
use crate::trust::build_trust_anchors;

/// Install the ring crypto provider if no process default exists yet.
///
/// `ClientConfig::builder()` resolves the process-default provider, so this
/// must run before the first config is built.
fn ensure_crypto_provider() {
    if rustls::crypto::CryptoProvider::get_default().is_none() {
        let _ = rustls::crypto::ring::default_provider().install_default();
    }
}

/// Build the shared pooled client from the TLS and pool settings.
///
/// The returned client carries no overall request timeout: the forwarder
/// applies the request timeout per call and the streaming relay applies
/// the session ceiling instead, so a long-lived stream is not cut off by
/// a client-wide deadline.
///
/// # Errors
///
/// Fails if any configured key, certificate or CA bundle cannot be
/// decoded, or if the client itself fails to build.
pub fn build_client(tls: &TlsSettings, pool: &HttpPoolSettings) -> TlsResult<Client> {
    let mut builder = Client::builder()
        .connect_timeout(Duration::from_secs(pool.connect_timeout_secs))
        .pool_max_idle_per_host(pool.max_idle_per_host);

    match tls.mode() {
        TlsMode::Disabled => {
            info!("TLS is disabled, using plain HTTP client");
        }
        TlsMode::Enabled => {
            ensure_crypto_provider();
            let config = build_tls_config(tls)?;
            builder = builder.use_preconfigured_tls(config);
        }
    }

    Ok(builder.build()?)
}

/// Assemble the rustls client configuration from the settings.
fn build_tls_config(tls: &TlsSettings) -> TlsResult<ClientConfig> {
    let roots = load_trust_material(tls)?;
    let builder = ClientConfig::builder().with_root_certificates(roots);

    let config = match load_identity_material(tls)? {
        Some((chain, key)) => builder.with_client_auth_cert(chain, key)?,
        None => builder.with_no_client_auth(),
    };

    Ok(config)
}

/// Resolve the client identity: PEM pair, then legacy bundle, then none.
#[allow(clippy::type_complexity)]
fn load_identity_material(
    tls: &TlsSettings,
) -> TlsResult<Option<(Vec<CertificateDer<'static>>, PrivateKeyDer<'static>)>> {
    if let (Some(key_path), Some(cert_path)) = (&tls.tls_key_path, &tls.tls_cert_path) {
        info!("Loading client certificate from PEM files");
        let bundle = load_credential_bundle(key_path, cert_path)?;
        return Ok(Some(bundle.into_parts()));
    }

    if let Some(keystore_path) = &tls.keystore_path {
        info!(path = %keystore_path.display(), "Loading legacy keystore bundle");
        if tls.keystore_password.is_some() {
            warn!("keystore password is set but PEM bundles are unencrypted; ignoring it");
        }
        return load_legacy_bundle(keystore_path).map(Some);
    }

    Ok(None)
}

/// Resolve trust: CA bundle, then legacy truststore, then platform roots.
fn load_trust_material(tls: &TlsSettings) -> TlsResult<RootCertStore> {
    if let Some(ca_path) = &tls.ca_cert_path {
        info!(path = %ca_path.display(), "Loading CA certificates as sole trust source");
        return Ok(build_trust_anchors(ca_path)?.into_roots());
    }

    if let Some(truststore_path) = &tls.truststore_path {
        info!(path = %truststore_path.display(), "Loading legacy truststore bundle");
        if tls.truststore_password.is_some() {
            warn!("truststore password is set but PEM bundles are unencrypted; ignoring it");
        }
        return Ok(build_trust_anchors(truststore_path)?.into_roots());
    }

    info!("No CA bundle configured, using platform trust anchors");
    Ok(platform_roots())
}

/// Platform trust anchors: system certificates with the bundled Mozilla
/// roots as a baseline for minimal containers.
fn platform_roots() -> RootCertStore {
    let mut roots = RootCertStore::empty();

    let native = rustls_native_certs::load_native_certs();
    if let Some(err) = native.errors.first() {
        warn!(%err, "Some system certificates failed to load, bundled roots fill the gaps");
    }
    let (added, failed) = roots.add_parsable_certificates(native.certs);
    tracing::debug!(added, failed, "Loaded system CA certificates");

    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    roots
}

/// Read a combined PEM bundle (private key and chain in one file).
///
/// This is the fallback for deployments still mounting a single keystore
/// file rather than the split key/cert pair.
fn load_legacy_bundle(
    path: &Path,
) -> TlsResult<(Vec<CertificateDer<'static>>, PrivateKeyDer<'static>)> {
    let open = |path: &Path| {
        File::open(path).map_err(|source| TlsError::Io {
            path: path.display().to_string(),
            source,
        })
    };

    let mut key_reader = BufReader::new(open(path)?);
    let key = rustls_pemfile::private_key(&mut key_reader)
        .map_err(|e| TlsError::KeyDecode {
            path: path.display().to_string(),
            message: e.to_string(),
        })?
        .ok_or_else(|| TlsError::KeyDecode {
            path: path.display().to_string(),
            message: "bundle contains no private key".to_string(),
        })?;

    let mut cert_reader = BufReader::new(open(path)?);
    let chain: Vec<CertificateDer<'static>> = rustls_pemfile::certs(&mut cert_reader)
        .collect::<Result<_, _>>()
        .map_err(|e| TlsError::CertificateDecode {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

    if chain.is_empty() {
        return Err(TlsError::CertificateDecode {
            path: path.display().to_string(),
            message: "bundle contains no certificates".to_string(),
        });
    }

    Ok((chain, key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::TempDir;

    const RSA_KEY: &str = include_str!("../tests/fixtures/rsa_key.pem");
    const RSA_CERT: &str = include_str!("../tests/fixtures/rsa_cert.pem");
    const CA_BUNDLE: &str = include_str!("../tests/fixtures/ca_bundle.pem");
    const LEGACY_BUNDLE: &str = include_str!("../tests/fixtures/legacy_keystore.pem");

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn disabled_mode_builds_plain_client() {
        let tls = TlsSettings::default();
        assert!(build_client(&tls, &HttpPoolSettings::default()).is_ok());
    }

    #[test]
    fn pem_identity_with_ca_bundle_builds() {
        let dir = TempDir::new().unwrap();
        let tls = TlsSettings {
            enabled: true,
            tls_key_path: Some(write(&dir, "tls.key", RSA_KEY)),
            tls_cert_path: Some(write(&dir, "tls.crt", RSA_CERT)),
            ca_cert_path: Some(write(&dir, "ca.crt", CA_BUNDLE)),
            ..TlsSettings::default()
        };
        assert!(build_client(&tls, &HttpPoolSettings::default()).is_ok());
    }

    #[test]
    fn legacy_bundle_fallback_builds() {
        let dir = TempDir::new().unwrap();
        let tls = TlsSettings {
            enabled: true,
            keystore_path: Some(write(&dir, "keystore.pem", LEGACY_BUNDLE)),
            keystore_password: Some("changeit".to_string()),
            ..TlsSettings::default()
        };
        assert!(build_client(&tls, &HttpPoolSettings::default()).is_ok());
    }

    #[test]
    fn no_identity_no_ca_uses_platform_trust() {
        let tls = TlsSettings {
            enabled: true,
            ..TlsSettings::default()
        };
        assert!(build_client(&tls, &HttpPoolSettings::default()).is_ok());
    }

    #[test]
    fn broken_key_aborts_construction() {
        let dir = TempDir::new().unwrap();
        let tls = TlsSettings {
            enabled: true,
            tls_key_path: Some(write(&dir, "tls.key", "garbage")),
            tls_cert_path: Some(write(&dir, "tls.crt", RSA_CERT)),
            ..TlsSettings::default()
        };
        let err = build_client(&tls, &HttpPoolSettings::default()).unwrap_err();
        assert!(matches!(err, TlsError::KeyDecode { .. }));
    }
}
