//! Outbound TLS material handling for the relay.
//!
//! Three pieces, assembled in order: [`pem`] turns PEM text into a private
//! key and certificate chain, [`trust`] builds the CA trust anchor set, and
//! [`client`] combines both into the single pooled `reqwest::Client` the
//! whole process shares.

pub mod client;
pub mod error;
pub mod pem;
pub mod trust;

pub use client::build_client;
pub use error::{TlsError, TlsResult};
pub use pem::{CredentialBundle, KeyAlgorithm, load_credential_bundle, parse_certificate_chain};
pub use trust::{TrustAnchorSet, build_trust_anchors};
