//! Trust anchor construction from a CA bundle.

use std::path::Path;

use rustls::RootCertStore;
use tracing::{debug, info};

use crate::error::{TlsError, TlsResult};
use crate::pem::parse_certificate_chain;

/// CA certificates imported as trust anchors.
///
/// Each anchor gets a synthetic `ca-cert-<i>` alias in parse order. The
/// alias exists only to make anchors addressable in logs and tests;
/// trust evaluation ignores it.
#[derive(Debug)]
pub struct TrustAnchorSet {
    roots: RootCertStore,
    aliases: Vec<String>,
}

impl TrustAnchorSet {
    /// Number of imported anchors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    /// Aliases in insertion order.
    #[must_use]
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Consume the set into the underlying root store.
    #[must_use]
    pub fn into_roots(self) -> RootCertStore {
        self.roots
    }
}

/// Build a trust anchor set from a PEM CA bundle.
///
/// One file may hold several concatenated CA certificates (a full chain);
/// all of them are imported.
///
/// # Errors
///
/// Fails if the bundle is unreadable, contains no decodable certificate,
/// or any certificate is rejected by the trust store.
pub fn build_trust_anchors(ca_cert_path: &Path) -> TlsResult<TrustAnchorSet> {
    info!(path = %ca_cert_path.display(), "Loading CA certificates");

    let certificates = parse_certificate_chain(ca_cert_path)?;

    let mut roots = RootCertStore::empty();
    let mut aliases = Vec::with_capacity(certificates.len());
    for (index, certificate) in certificates.into_iter().enumerate() {
        let alias = format!("ca-cert-{index}");
        roots.add(certificate).map_err(|source| TlsError::TrustAnchor {
            alias: alias.clone(),
            path: ca_cert_path.display().to_string(),
            source,
        })?;
        aliases.push(alias);
    }

    debug!(anchors = aliases.len(), "Trust anchors imported");
    Ok(TrustAnchorSet { roots, aliases })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const CA_BUNDLE: &str = include_str!("../tests/fixtures/ca_bundle.pem");

    fn write_bundle(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn three_certificate_bundle_yields_three_aliases() {
        let file = write_bundle(CA_BUNDLE);
        let anchors = build_trust_anchors(file.path()).unwrap();
        assert_eq!(anchors.len(), 3);
        assert_eq!(anchors.aliases(), ["ca-cert-0", "ca-cert-1", "ca-cert-2"]);
        assert_eq!(anchors.into_roots().len(), 3);
    }

    #[test]
    fn empty_bundle_is_rejected() {
        let file = write_bundle("");
        let err = build_trust_anchors(file.path()).unwrap_err();
        assert!(matches!(err, TlsError::CertificateDecode { .. }));
    }

    #[test]
    fn missing_bundle_is_an_io_error() {
        let err = build_trust_anchors(Path::new("/nonexistent/ca.pem")).unwrap_err();
        assert!(matches!(err, TlsError::Io { .. }));
    }
}
