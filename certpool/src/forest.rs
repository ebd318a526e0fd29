//! Forest Builder
//!
//! Turns a fully loaded [`Pool`] into a forest of issuer trees.
//!
//! Construction happens in two phases:
//! 1. every certificate is resolved against the complete pool. This phase
//!    only reads the pool and may run on the rayon thread pool.
//! 2. the resolutions are applied in pool order: parents are recorded, chain
//!    errors are set and each linked certificate is attached below one tree
//!    parent.
//!
//! Since phase 1 sees every certificate, an issuer is found no matter where
//! it appears in the bundle.

use rayon::prelude::*;
use tracing::{debug, info};

use crate::certificate::Certificate;
use crate::error::Invalid;
use crate::pool::{CertId, Pool};
use crate::resolver::{Resolution, resolve};
use crate::verify::{SignatureVerifier, X509Verifier};

#[derive(Debug, Clone)]
pub struct ForestBuilder<V> {
    verifier: V,
    parallel: bool,
}

impl Default for ForestBuilder<X509Verifier> {
    fn default() -> Self {
        Self::new(X509Verifier)
    }
}

impl<V: SignatureVerifier> ForestBuilder<V> {
    pub fn new(verifier: V) -> Self {
        Self {
            verifier,
            parallel: false,
        }
    }

    /// Resolve certificates on the rayon thread pool.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Build the forest. The pool is consumed, so it is resolved exactly once.
    pub fn build(&self, mut pool: Pool) -> Forest {
        let ids = pool.ids().collect::<Vec<_>>();

        let resolutions = if self.parallel {
            ids.par_iter()
                .map(|id| resolve(&pool, *id, &self.verifier))
                .collect::<Vec<_>>()
        } else {
            ids.iter()
                .map(|id| resolve(&pool, *id, &self.verifier))
                .collect::<Vec<_>>()
        };

        for (id, resolution) in ids.into_iter().zip(resolutions) {
            link(&mut pool, id, resolution);
        }

        let roots = pool
            .iter()
            .filter(|(_, cert)| cert.tree_parent().is_none())
            .map(|(id, _)| id)
            .collect::<Vec<_>>();

        info!(
            certificates = pool.len(),
            roots = roots.len(),
            parallel = self.parallel,
            "forest built"
        );

        Forest { pool, roots }
    }
}

fn link(pool: &mut Pool, id: CertId, resolution: Resolution) {
    let Resolution {
        verified,
        self_signed,
        last_failed,
        last_error,
    } = resolution;

    if let Some(cert) = pool.get_mut(id) {
        for parent in &verified {
            cert.add_parent(*parent);
        }
    }

    if self_signed {
        debug!(name = pool[id].display_name(), "self-signed root");
        return;
    }

    if verified.is_empty() {
        let error = match last_failed {
            Some(candidate) => Invalid::SignatureMismatch {
                candidate: pool[candidate].display_name().to_string(),
                reason: last_error.map(|e| e.to_string()).unwrap_or_default(),
            },
            None => Invalid::IssuerNotFound {
                issuer: pool[id].issuer_name().to_string(),
            },
        };
        debug!(name = pool[id].display_name(), %error, "no verified issuer");
        if let Some(cert) = pool.get_mut(id) {
            cert.set_error(error);
        }
        return;
    }

    let Some(parent) = verified
        .iter()
        .copied()
        .find(|parent| !closes_cycle(pool, id, *parent))
    else {
        debug!(
            name = pool[id].display_name(),
            "every verified issuer is below this certificate, kept as root"
        );
        return;
    };

    if !pool.attach(parent, id) {
        debug!(name = pool[id].display_name(), "refused to attach to itself");
    }
}

/// True when `child` is `parent` or one of its tree ancestors.
fn closes_cycle(pool: &Pool, child: CertId, parent: CertId) -> bool {
    let mut next = Some(parent);
    while let Some(current) = next {
        if current == child {
            return true;
        }
        next = pool[current].tree_parent();
    }
    false
}

/// Certificates of one bundle arranged as issuer trees.
///
/// Every certificate of the pool is reachable from exactly one root by
/// following [`Certificate::children`].
#[derive(Debug)]
pub struct Forest {
    pool: Pool,
    roots: Vec<CertId>,
}

impl Forest {
    /// Certificates without a tree parent, in pool order.
    pub fn roots(&self) -> &[CertId] {
        &self.roots
    }

    pub fn is_root(&self, id: CertId) -> bool {
        self.pool
            .get(id)
            .is_some_and(|cert| cert.tree_parent().is_none())
    }

    pub fn get(&self, id: CertId) -> Option<&Certificate> {
        self.pool.get(id)
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    /// Number of certificates in the forest, roots included.
    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    /// Depth-first pre-order traversal yielding `(depth, id)`. Roots have
    /// depth 0 and children are visited in attachment order.
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            forest: self,
            stack: self.roots.iter().rev().map(|id| (0, *id)).collect(),
        }
    }
}

pub struct Walk<'a> {
    forest: &'a Forest,
    stack: Vec<(usize, CertId)>,
}

impl Iterator for Walk<'_> {
    type Item = (usize, CertId);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, id) = self.stack.pop()?;
        if let Some(cert) = self.forest.get(id) {
            self.stack
                .extend(cert.children().iter().rev().map(|child| (depth + 1, *child)));
        }
        Some((depth, id))
    }
}
