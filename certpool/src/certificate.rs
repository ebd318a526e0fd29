//! A parsed certificate and its place in the issuer forest.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use pem::{FromPem, Label, Pem, ToPem};
use serde::Serialize;
use x509_parser::certificate::X509Certificate;
use x509_parser::extensions::ParsedExtension;
use x509_parser::prelude::FromDer;
use x509_parser::time::ASN1Time;
use x509_parser::x509::{AttributeTypeAndValue, X509Name};

use crate::error::{Error, Invalid, Result};
use crate::pool::CertId;

/// Classification computed once at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CertificateKind {
    /// CA flag set and subject encoding equal to issuer encoding
    #[serde(rename = "root_ca")]
    RootCA,
    /// CA flag set, issued by someone else
    #[serde(rename = "intermediate_ca")]
    IntermediateCA,
    /// CA flag unset
    Regular,
}

impl CertificateKind {
    fn classify(is_ca: bool, self_issued: bool) -> Self {
        match (is_ca, self_issued) {
            (true, true) => CertificateKind::RootCA,
            (true, false) => CertificateKind::IntermediateCA,
            (false, _) => CertificateKind::Regular,
        }
    }
}

/// The half-open window `[not_before, not_after)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Validity {
    not_before: DateTime<Utc>,
    not_after: DateTime<Utc>,
}

impl Validity {
    pub fn new(not_before: DateTime<Utc>, not_after: DateTime<Utc>) -> Self {
        Self {
            not_before,
            not_after,
        }
    }

    pub fn not_before(&self) -> DateTime<Utc> {
        self.not_before
    }

    pub fn not_after(&self) -> DateTime<Utc> {
        self.not_after
    }

    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        self.not_before <= now && now < self.not_after
    }
}

/// One certificate of a bundle.
///
/// Identity fields are fixed at construction. The relationship fields
/// (`parents`, `children`, `tree_parent`) and the chain error are written
/// only by the forest builder, once.
#[derive(Debug, Clone)]
pub struct Certificate {
    raw: Vec<u8>,
    raw_subject: Vec<u8>,
    raw_issuer: Vec<u8>,
    subject: String,
    issuer: String,
    issuer_name: String,
    countries: Vec<String>,
    serial: String,
    subject_key_id: Option<Vec<u8>>,
    authority_key_id: Option<Vec<u8>>,
    display_name: String,
    kind: CertificateKind,
    validity: Validity,
    parents: Vec<CertId>,
    children: Vec<CertId>,
    tree_parent: Option<CertId>,
    error: Option<Invalid>,
}

impl Certificate {
    /// Parse a single DER encoded certificate.
    ///
    /// Bytes following the certificate are rejected rather than ignored.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let (rest, x509) =
            X509Certificate::from_der(der).map_err(|e| Error::Parse(e.to_string()))?;
        if !rest.is_empty() {
            return Err(Error::TrailingData(rest.len()));
        }

        let raw_subject = x509.subject().as_raw().to_vec();
        let raw_issuer = x509.issuer().as_raw().to_vec();
        let (subject_key_id, authority_key_id) = key_identifiers(&x509);
        let validity = Validity::new(
            to_utc(&x509.validity().not_before)?,
            to_utc(&x509.validity().not_after)?,
        );
        let kind = CertificateKind::classify(x509.is_ca(), raw_subject == raw_issuer);

        Ok(Self {
            raw: der.to_vec(),
            subject: x509.subject().to_string(),
            issuer: x509.issuer().to_string(),
            issuer_name: display_name(x509.issuer()),
            countries: attribute_strings(x509.subject().iter_country()),
            serial: x509.raw_serial_as_string(),
            display_name: display_name(x509.subject()),
            raw_subject,
            raw_issuer,
            subject_key_id,
            authority_key_id,
            kind,
            validity,
            parents: Vec::new(),
            children: Vec::new(),
            tree_parent: None,
            error: None,
        })
    }

    /// The DER encoding this certificate was parsed from.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    pub fn raw_subject(&self) -> &[u8] {
        &self.raw_subject
    }

    pub fn raw_issuer(&self) -> &[u8] {
        &self.raw_issuer
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Issuer name reduced with the same fallback rule as [`display_name`](Self::display_name).
    pub fn issuer_name(&self) -> &str {
        &self.issuer_name
    }

    pub fn countries(&self) -> &[String] {
        &self.countries
    }

    pub fn serial(&self) -> &str {
        &self.serial
    }

    pub fn subject_key_id(&self) -> Option<&[u8]> {
        self.subject_key_id.as_deref()
    }

    pub fn authority_key_id(&self) -> Option<&[u8]> {
        self.authority_key_id.as_deref()
    }

    /// First non-empty of: common name, organizations, organizational units,
    /// full subject string.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn kind(&self) -> CertificateKind {
        self.kind
    }

    pub fn validity(&self) -> Validity {
        self.validity
    }

    pub fn is_self_issued(&self) -> bool {
        self.raw_subject == self.raw_issuer
    }

    pub fn expired(&self) -> bool {
        self.expired_at(Utc::now())
    }

    /// True when `now` falls outside `[not_before, not_after)`.
    pub fn expired_at(&self, now: DateTime<Utc>) -> bool {
        !self.validity.contains(now)
    }

    pub fn is_valid(&self) -> std::result::Result<(), Invalid> {
        self.is_valid_at(Utc::now())
    }

    /// A recorded chain error takes precedence over the validity window.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> std::result::Result<(), Invalid> {
        if let Some(e) = &self.error {
            return Err(e.clone());
        }
        if now < self.validity.not_before {
            return Err(Invalid::NotYetValid {
                not_before: self.validity.not_before,
            });
        }
        if now >= self.validity.not_after {
            return Err(Invalid::Expired {
                not_after: self.validity.not_after,
            });
        }
        Ok(())
    }

    /// Every verified issuer, in pool order.
    pub fn parents(&self) -> &[CertId] {
        &self.parents
    }

    /// Certificates displayed below this one, in the order they were attached.
    pub fn children(&self) -> &[CertId] {
        &self.children
    }

    /// The issuer this certificate hangs under in the displayed tree.
    pub fn tree_parent(&self) -> Option<CertId> {
        self.tree_parent
    }

    pub fn error(&self) -> Option<&Invalid> {
        self.error.as_ref()
    }

    pub(crate) fn add_parent(&mut self, parent: CertId) {
        self.parents.push(parent);
    }

    /// Attach `child` below this certificate. A certificate is never its own child.
    pub(crate) fn add_child(&mut self, id: CertId, child: &Certificate) -> bool {
        if child.raw == self.raw {
            return false;
        }
        self.children.push(id);
        true
    }

    pub(crate) fn set_tree_parent(&mut self, parent: CertId) {
        self.tree_parent = Some(parent);
    }

    pub(crate) fn set_error(&mut self, e: Invalid) {
        self.error = Some(e);
    }
}

impl fmt::Display for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.display_name, self.countries.join(" "))
    }
}

impl ToPem for Certificate {
    type Error = Error;

    fn pem_label(&self) -> Label {
        Label::Certificate
    }

    fn to_pem(&self) -> Result<Pem> {
        Ok(Pem::from_bytes(self.pem_label(), &self.raw))
    }
}

impl FromPem for Certificate {
    type Error = Error;

    fn expected_label() -> Label {
        Label::Certificate
    }

    fn from_pem(pem: &Pem) -> Result<Self> {
        if pem.label() != Self::expected_label() {
            return Err(Error::UnexpectedLabel(pem.label()));
        }
        if pem.has_headers() {
            return Err(Error::UnexpectedHeaders);
        }
        Self::from_der(&pem.contents()?)
    }
}

impl FromStr for Certificate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let pem = Pem::from_str(s)?;
        Self::from_pem(&pem)
    }
}

fn display_name(name: &X509Name<'_>) -> String {
    if let Some(cn) = attribute_strings(name.iter_common_name())
        .into_iter()
        .find(|cn| !cn.is_empty())
    {
        return cn;
    }
    let organizations = attribute_strings(name.iter_organization()).join(", ");
    if !organizations.is_empty() {
        return organizations;
    }
    let units = attribute_strings(name.iter_organizational_unit()).join(", ");
    if !units.is_empty() {
        return units;
    }
    name.to_string()
}

fn attribute_strings<'a, 'b: 'a>(
    attributes: impl Iterator<Item = &'a AttributeTypeAndValue<'b>>,
) -> Vec<String> {
    attributes
        .filter_map(|attr| attr.as_str().ok())
        .map(str::to_string)
        .collect()
}

fn key_identifiers(x509: &X509Certificate<'_>) -> (Option<Vec<u8>>, Option<Vec<u8>>) {
    let mut subject_key_id = None;
    let mut authority_key_id = None;

    for ext in x509.extensions() {
        match ext.parsed_extension() {
            ParsedExtension::SubjectKeyIdentifier(id) => {
                subject_key_id = non_empty(id.0);
            }
            ParsedExtension::AuthorityKeyIdentifier(aki) => {
                authority_key_id = aki.key_identifier.as_ref().and_then(|id| non_empty(id.0));
            }
            _ => {}
        }
    }

    (subject_key_id, authority_key_id)
}

fn non_empty(bytes: &[u8]) -> Option<Vec<u8>> {
    (!bytes.is_empty()).then(|| bytes.to_vec())
}

fn to_utc(time: &ASN1Time) -> Result<DateTime<Utc>> {
    let secs = time.timestamp();
    DateTime::from_timestamp(secs, 0).ok_or(Error::InvalidValidity(secs))
}
