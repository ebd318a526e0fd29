//! Certificate Pool
//!
//! An append-only arena of certificates with two lookup indices:
//! - subject key identifier → handles
//! - raw (DER) subject name → handles
//!
//! Handles ([`CertId`]) are positions in insertion order. Nothing is ever
//! removed, so a handle stays valid for the lifetime of the pool.

use std::collections::HashMap;
use std::ops::Index;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::certificate::Certificate;
use crate::error::Result;

/// Opaque handle to a certificate stored in a [`Pool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CertId(usize);

impl CertId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Position in bundle (insertion) order.
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Result of [`Pool::add_cert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added(CertId),
    /// Rejected; the byte-identical certificate already present.
    Duplicate(CertId),
}

#[derive(Debug, Default)]
pub struct Pool {
    certs: Vec<Certificate>,
    by_subject_key_id: HashMap<Vec<u8>, Vec<CertId>>,
    by_name: HashMap<Vec<u8>, Vec<CertId>>,
    total: usize,
    duplicates: usize,
    parse_errors: usize,
}

impl Pool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `cert` unless a byte-identical certificate with the same
    /// subject is already present.
    pub fn add_cert(&mut self, cert: Certificate) -> AddOutcome {
        self.total += 1;

        if let Some(existing) = self.find_identical(&cert) {
            self.duplicates += 1;
            debug!(name = cert.display_name(), "duplicate certificate rejected");
            return AddOutcome::Duplicate(existing);
        }

        let id = CertId::new(self.certs.len());
        if let Some(key_id) = cert.subject_key_id() {
            self.by_subject_key_id
                .entry(key_id.to_vec())
                .or_default()
                .push(id);
        }
        self.by_name
            .entry(cert.raw_subject().to_vec())
            .or_default()
            .push(id);
        self.certs.push(cert);

        AddOutcome::Added(id)
    }

    /// Parse `der` and insert it. A parse failure still counts towards
    /// [`total`](Self::total).
    pub fn add_der(&mut self, der: &[u8]) -> Result<AddOutcome> {
        match Certificate::from_der(der) {
            Ok(cert) => Ok(self.add_cert(cert)),
            Err(e) => {
                self.record_parse_error();
                Err(e)
            }
        }
    }

    pub(crate) fn record_parse_error(&mut self) {
        self.total += 1;
        self.parse_errors += 1;
    }

    fn find_identical(&self, cert: &Certificate) -> Option<CertId> {
        self.by_name
            .get(cert.raw_subject())?
            .iter()
            .copied()
            .find(|id| self[*id].raw() == cert.raw())
    }

    /// Candidate issuers of `id`, in pool order.
    ///
    /// Certificates whose subject key identifier equals the authority key
    /// identifier of `id` are preferred. Only when there is no authority key
    /// identifier, or nothing matches it, are certificates whose raw subject
    /// equals the raw issuer of `id` used instead.
    pub fn candidate_issuers(&self, id: CertId) -> Vec<CertId> {
        let cert = &self[id];
        let others = |ids: &Vec<CertId>| -> Vec<CertId> {
            ids.iter().copied().filter(|c| *c != id).collect()
        };

        let by_key = cert
            .authority_key_id()
            .and_then(|key_id| self.by_subject_key_id.get(key_id))
            .map(others)
            .unwrap_or_default();
        if !by_key.is_empty() {
            return by_key;
        }

        self.by_name
            .get(cert.raw_issuer())
            .map(others)
            .unwrap_or_default()
    }

    pub fn get(&self, id: CertId) -> Option<&Certificate> {
        self.certs.get(id.0)
    }

    pub(crate) fn get_mut(&mut self, id: CertId) -> Option<&mut Certificate> {
        self.certs.get_mut(id.0)
    }

    /// Attach `child` under `parent` for display. Refuses self-loops.
    pub(crate) fn attach(&mut self, parent: CertId, child: CertId) -> bool {
        let Ok([p, c]) = self.certs.get_disjoint_mut([parent.0, child.0]) else {
            return false;
        };
        if !p.add_child(child, c) {
            return false;
        }
        c.set_tree_parent(parent);
        true
    }

    pub fn ids(&self) -> impl Iterator<Item = CertId> + use<> {
        (0..self.certs.len()).map(CertId::new)
    }

    pub fn iter(&self) -> impl Iterator<Item = (CertId, &Certificate)> {
        self.certs
            .iter()
            .enumerate()
            .map(|(i, c)| (CertId::new(i), c))
    }

    /// Number of accepted certificates.
    pub fn len(&self) -> usize {
        self.certs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.certs.is_empty()
    }

    /// Every certificate record seen, including rejected duplicates and
    /// records that failed to parse.
    pub fn total(&self) -> usize {
        self.total
    }

    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    pub fn parse_errors(&self) -> usize {
        self.parse_errors
    }

    pub fn count_expired(&self, now: DateTime<Utc>) -> usize {
        self.certs.iter().filter(|c| c.expired_at(now)).count()
    }

    /// Certificates with a chain error or outside their validity window.
    pub fn count_invalid(&self, now: DateTime<Utc>) -> usize {
        self.certs
            .iter()
            .filter(|c| c.is_valid_at(now).is_err())
            .count()
    }
}

impl Index<CertId> for Pool {
    type Output = Certificate;

    fn index(&self, id: CertId) -> &Self::Output {
        &self.certs[id.0]
    }
}
