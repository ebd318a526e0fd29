//! Shared fixtures for unit tests: a small ECDSA P-256 test PKI.
//!
//! ```text
//! root_a (self-signed) ── inter_a ── leaf_a
//!    ├── noaki, org_only, ou_only, country_only, expired
//! root_b (self-signed) ── orphan, root_a_cross (root_a's name and key)
//! root_b_cross: root_b's name and key, issued by root_a
//! forged: claims root_a as issuer, signed by another key
//! root_a_rekeyed: root_a's name under a fresh key (self-signed)
//! keyless_ca (self-signed, no key identifiers) ── stale_aki
//! stale_aki: authority key identifier that matches no certificate
//! self_aki: issued by root_a, authority key identifier equals its own
//! ```

use chrono::{DateTime, TimeZone, Utc};

use crate::Certificate;

pub(crate) const ROOT_A: &str = include_str!("../../testdata/certs/root_a.pem");
pub(crate) const ROOT_B: &str = include_str!("../../testdata/certs/root_b.pem");
pub(crate) const ROOT_A_CROSS: &str = include_str!("../../testdata/certs/root_a_cross.pem");
pub(crate) const ROOT_B_CROSS: &str = include_str!("../../testdata/certs/root_b_cross.pem");
pub(crate) const INTER_A: &str = include_str!("../../testdata/certs/inter_a.pem");
pub(crate) const LEAF_A: &str = include_str!("../../testdata/certs/leaf_a.pem");
pub(crate) const ORPHAN: &str = include_str!("../../testdata/certs/orphan.pem");
pub(crate) const FORGED: &str = include_str!("../../testdata/certs/forged.pem");
pub(crate) const NOAKI: &str = include_str!("../../testdata/certs/noaki.pem");
pub(crate) const ORG_ONLY: &str = include_str!("../../testdata/certs/org_only.pem");
pub(crate) const OU_ONLY: &str = include_str!("../../testdata/certs/ou_only.pem");
pub(crate) const COUNTRY_ONLY: &str = include_str!("../../testdata/certs/country_only.pem");
pub(crate) const EXPIRED: &str = include_str!("../../testdata/certs/expired.pem");
pub(crate) const ROOT_A_REKEYED: &str = include_str!("../../testdata/certs/root_a_rekeyed.pem");
pub(crate) const KEYLESS_CA: &str = include_str!("../../testdata/certs/keyless_ca.pem");
pub(crate) const STALE_AKI: &str = include_str!("../../testdata/certs/stale_aki.pem");
pub(crate) const SELF_AKI: &str = include_str!("../../testdata/certs/self_aki.pem");
pub(crate) const GARBAGE: &str = include_str!("../../testdata/certs/garbage.pem");

pub(crate) fn cert(pem: &str) -> Certificate {
    pem.parse().unwrap()
}

pub(crate) fn der(pem: &str) -> Vec<u8> {
    cert(pem).raw().to_vec()
}

pub(crate) fn bundle(pems: &[&str]) -> String {
    pems.concat()
}

/// An instant inside the validity window of every non-expired fixture.
pub(crate) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap()
}
