//! Signature verification seam.

use x509_parser::certificate::X509Certificate;
use x509_parser::prelude::FromDer;

use crate::certificate::Certificate;
use crate::error::{Error, Result};

/// Checks that `child` was signed by the key certified in `parent`.
///
/// Implementations must be callable from several threads at once; the
/// forest builder may resolve certificates in parallel.
pub trait SignatureVerifier: Send + Sync {
    fn verify(&self, child: &Certificate, parent: &Certificate) -> Result<()>;
}

/// Verifies with the signature algorithms supported by `x509-parser`.
#[derive(Debug, Default, Clone, Copy)]
pub struct X509Verifier;

impl SignatureVerifier for X509Verifier {
    fn verify(&self, child: &Certificate, parent: &Certificate) -> Result<()> {
        let (_, child) =
            X509Certificate::from_der(child.raw()).map_err(|e| Error::Parse(e.to_string()))?;
        let (_, parent) =
            X509Certificate::from_der(parent.raw()).map_err(|e| Error::Parse(e.to_string()))?;

        child
            .verify_signature(Some(parent.public_key()))
            .map_err(|e| Error::Signature(e.to_string()))
    }
}

impl<F> SignatureVerifier for F
where
    F: Fn(&Certificate, &Certificate) -> Result<()> + Send + Sync,
{
    fn verify(&self, child: &Certificate, parent: &Certificate) -> Result<()> {
        self(child, parent)
    }
}
