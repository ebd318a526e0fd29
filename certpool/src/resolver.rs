//! Parent Resolver
//!
//! Finds every certificate in a pool whose key verifies the signature of a
//! given certificate. Resolution only reads the pool, so any number of
//! certificates may be resolved concurrently.

use tracing::debug;

use crate::error::Error;
use crate::pool::{CertId, Pool};
use crate::verify::SignatureVerifier;

/// Outcome of resolving one certificate against a pool.
#[derive(Debug, Default)]
pub struct Resolution {
    /// Candidates whose key verified the signature, in pool order.
    pub verified: Vec<CertId>,
    /// Subject equals issuer and the certificate's own key verifies it.
    pub self_signed: bool,
    /// Most recent candidate that failed verification.
    pub last_failed: Option<CertId>,
    pub last_error: Option<Error>,
}

impl Resolution {
    pub fn has_issuer(&self) -> bool {
        self.self_signed || !self.verified.is_empty()
    }
}

/// Resolve the issuers of `id` among the certificates of `pool`.
///
/// Candidates are taken from [`Pool::candidate_issuers`], which never returns
/// `id` itself. A self-issued certificate is instead checked against its own
/// key and reported through [`Resolution::self_signed`].
pub fn resolve<V>(pool: &Pool, id: CertId, verifier: &V) -> Resolution
where
    V: SignatureVerifier + ?Sized,
{
    let cert = &pool[id];
    let mut resolution = Resolution::default();

    if cert.is_self_issued() {
        match verifier.verify(cert, cert) {
            Ok(()) => resolution.self_signed = true,
            Err(e) => {
                debug!(name = cert.display_name(), error = %e, "self-issued certificate does not verify itself");
                resolution.last_failed = Some(id);
                resolution.last_error = Some(e);
            }
        }
    }

    for candidate in pool.candidate_issuers(id) {
        match verifier.verify(cert, &pool[candidate]) {
            Ok(()) => resolution.verified.push(candidate),
            Err(e) => {
                debug!(
                    name = cert.display_name(),
                    candidate = pool[candidate].display_name(),
                    error = %e,
                    "candidate issuer rejected"
                );
                resolution.last_failed = Some(candidate);
                resolution.last_error = Some(e);
            }
        }
    }

    resolution
}
