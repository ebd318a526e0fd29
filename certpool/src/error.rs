use std::path::PathBuf;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors returned by pool, loader and exporter operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("certificate parse error: {0}")]
    Parse(String),
    #[error("certificate has {0} trailing bytes after the DER encoding")]
    TrailingData(usize),
    #[error("invalid validity timestamp: {0}")]
    InvalidValidity(i64),
    #[error("unexpected PEM label: {0}")]
    UnexpectedLabel(pem::Label),
    #[error("PEM block carries encapsulated headers")]
    UnexpectedHeaders,
    #[error("PEM error: {0}")]
    Pem(#[from] pem::error::Error),
    #[error("signature verification failed: {0}")]
    Signature(String),
    #[error("directory does not exist: {}", .0.display())]
    MissingDirectory(PathBuf),
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

/// Why a certificate is reported as invalid.
///
/// Chain problems are recorded on the certificate during forest construction.
/// Validity-window problems are computed whenever the certificate is checked.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Invalid {
    #[error("no issuer certificate found for \"{issuer}\"")]
    IssuerNotFound { issuer: String },
    #[error("signature not verified by \"{candidate}\": {reason}")]
    SignatureMismatch { candidate: String, reason: String },
    #[error("certificate has expired. Not After: {not_after}")]
    Expired { not_after: DateTime<Utc> },
    #[error("certificate is not yet valid. Not Before: {not_before}")]
    NotYetValid { not_before: DateTime<Utc> },
}

impl Invalid {
    /// True for errors recorded by forest construction.
    pub fn is_chain_error(&self) -> bool {
        matches!(
            self,
            Invalid::IssuerNotFound { .. } | Invalid::SignatureMismatch { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
