//! # certpool
//!
//! Rebuilds the issuer forest of a PEM certificate bundle.
//!
//! A bundle is loaded into a [`Pool`], which indexes every accepted
//! certificate by subject key identifier and by raw subject name. A
//! [`ForestBuilder`] then resolves each certificate's issuers among the
//! other certificates of the pool, verifies signatures and links every
//! certificate below one tree parent. Certificates without a verified issuer
//! become roots; when that is not because they are self-signed, the reason is
//! recorded on the certificate.
//!
//! ```no_run
//! use certpool::{ForestBuilder, bundle, report};
//!
//! let pool = bundle::load_file("bundle.pem")?;
//! let forest = ForestBuilder::default().build(pool);
//! print!("{}", report::render_tree(&forest, chrono::Utc::now()));
//! # Ok::<(), certpool::error::Error>(())
//! ```

pub mod bundle;
pub mod certificate;
pub mod error;
pub mod export;
pub mod forest;
pub mod pool;
pub mod report;
pub mod resolver;
pub mod verify;

#[cfg(test)]
mod testing;

pub use certificate::{Certificate, CertificateKind, Validity};
pub use error::{Error, Invalid, Result};
pub use forest::{Forest, ForestBuilder};
pub use pool::{AddOutcome, CertId, Pool};
pub use verify::{SignatureVerifier, X509Verifier};
