//! # pem
//!
//! RFC 7468 textual encoding of PKIX structures.
//!
//! A bundle is scanned with [`blocks`], which yields every encapsulated block in
//! source order and keeps going after a malformed one. A single block can be
//! parsed strictly with [`Pem::from_str`] and written back with `Display`.
//!
//! ```
//! use pem::{Label, blocks};
//!
//! let bundle = "junk\n-----BEGIN CERTIFICATE-----\nAAA=\n-----END CERTIFICATE-----\n";
//! let pems = blocks(bundle).collect::<Result<Vec<_>, _>>().unwrap();
//! assert_eq!(pems.len(), 1);
//! assert_eq!(pems[0].label(), Label::Certificate);
//! ```

pub mod error;

use std::{
    fmt::{Display, Formatter},
    str::FromStr,
    sync::LazyLock,
};

use base64::{Engine, engine::general_purpose::STANDARD};
use error::Error;
use regex::Regex;

static BOUNDARY: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^-----(BEGIN|END) ([A-Z0-9 ]+)-----\s*$"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    /// PKCS#8 private key
    PrivateKey,
    /// PKCS#8 encrypted private key
    EncryptedPrivateKey,
    /// PKCS#1 RSA private key
    RSAPrivateKey,
    /// SEC1 EC private key
    ECPrivateKey,
    /// SubjectPublicKeyInfo
    PublicKey,
    Certificate,
    /// OpenSSL certificate with trust settings appended
    TrustedCertificate,
    X509Crl,
    /// Any other well-formed label
    Unknown,
}

const LABELS: [(Label, &str); 8] = [
    (Label::PrivateKey, "PRIVATE KEY"),
    (Label::EncryptedPrivateKey, "ENCRYPTED PRIVATE KEY"),
    (Label::RSAPrivateKey, "RSA PRIVATE KEY"),
    (Label::ECPrivateKey, "EC PRIVATE KEY"),
    (Label::PublicKey, "PUBLIC KEY"),
    (Label::Certificate, "CERTIFICATE"),
    (Label::TrustedCertificate, "TRUSTED CERTIFICATE"),
    (Label::X509Crl, "X509 CRL"),
];

impl Label {
    pub fn as_str(&self) -> &'static str {
        LABELS
            .iter()
            .find(|(label, _)| label == self)
            .map_or("UNKNOWN", |(_, name)| *name)
    }
}

impl Display for Label {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Label {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || s.trim() != s {
            return Err(Error::InvalidLabel);
        }
        Ok(LABELS
            .iter()
            .find(|(_, name)| *name == s)
            .map_or(Label::Unknown, |(label, _)| *label))
    }
}

/// One encapsulation boundary line, carrying the raw label text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Boundary<'a> {
    Begin(&'a str),
    End(&'a str),
}

impl<'a> Boundary<'a> {
    fn parse(line: &'a str) -> Result<Boundary<'a>, Error> {
        let re = BOUNDARY
            .as_ref()
            .map_err(|_| Error::InvalidEncapsulationBoundary)?;
        let captured = re
            .captures(line)
            .ok_or(Error::InvalidEncapsulationBoundary)?;
        let (Some(kind), Some(name)) = (captured.get(1), captured.get(2)) else {
            return Err(Error::InvalidEncapsulationBoundary);
        };
        match kind.as_str() {
            "BEGIN" => Ok(Boundary::Begin(name.as_str())),
            _ => Ok(Boundary::End(name.as_str())),
        }
    }

    fn name(&self) -> &'a str {
        match self {
            Boundary::Begin(name) | Boundary::End(name) => name,
        }
    }
}

/*
ref: https://www.rfc-editor.org/rfc/rfc7468.html#section-3
     https://www.rfc-editor.org/rfc/rfc1421.html#section-4.4 (encapsulated headers)
*/

/// One decoded encapsulation block. The payload is kept as base64 text.
#[derive(Debug, Clone)]
pub struct Pem {
    label: Label,
    headers: Vec<(String, String)>,
    base64_data: String,
}

impl Pem {
    /// Wrap unwrapped base64 text. Anything outside the base64 alphabet is
    /// rejected with [`Error::InvalidBase64Line`].
    pub fn new(label: Label, base64_data: &str) -> Result<Self, Error> {
        Ok(Pem {
            label,
            headers: Vec::new(),
            base64_data: base64_text(&[base64_data])?,
        })
    }

    pub fn from_bytes(label: Label, data: &[u8]) -> Self {
        Pem {
            label,
            headers: Vec::new(),
            base64_data: STANDARD.encode(data),
        }
    }

    pub fn label(&self) -> Label {
        self.label
    }

    /// Encapsulated headers (`Proc-Type`, `DEK-Info`, ...) in source order.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn has_headers(&self) -> bool {
        !self.headers.is_empty()
    }

    pub fn data(&self) -> &str {
        &self.base64_data
    }

    /// Decodes the base64 payload. Label and headers are discarded.
    pub fn contents(&self) -> Result<Vec<u8>, Error> {
        STANDARD
            .decode(self.data())
            .map_err(Error::Base64Decode)
    }
}

impl Display for Pem {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "-----BEGIN {}-----", self.label)?;
        for (name, value) in &self.headers {
            writeln!(f, "{name}: {value}")?;
        }
        if self.has_headers() {
            writeln!(f)?;
        }
        // base64 text is wrapped at 64 columns
        let mut rest = self.base64_data.as_str();
        while !rest.is_empty() {
            let (line, tail) = rest.split_at(rest.len().min(64));
            writeln!(f, "{line}")?;
            rest = tail;
        }
        write!(f, "-----END {}-----", self.label)
    }
}

/// Types with a PEM representation.
pub trait ToPem {
    type Error;

    fn pem_label(&self) -> Label;

    fn to_pem(&self) -> Result<Pem, Self::Error>;
}

/// Types that can be read back from a [`Pem`] block.
pub trait FromPem: Sized {
    type Error;

    fn expected_label() -> Label;

    fn from_pem(pem: &Pem) -> Result<Self, Self::Error>;
}

/// Scan `s` for PEM blocks.
///
/// Text outside of blocks is skipped. A malformed block produces one `Err`
/// item and scanning continues with the rest of the input, so callers can
/// log and move on.
pub fn blocks(s: &str) -> Blocks {
    // Some bundles glue an END and the next BEGIN together on one line.
    Blocks {
        text: s.replace("----------", "-----\n-----"),
        pos: 0,
    }
}

/// Iterator returned by [`blocks`].
#[derive(Debug)]
pub struct Blocks {
    text: String,
    pos: usize,
}

impl Iterator for Blocks {
    type Item = Result<Pem, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut open: Option<(usize, &str)> = None;

        while self.pos < self.text.len() {
            let start = self.pos;
            let end = self.text[start..]
                .find('\n')
                .map_or(self.text.len(), |i| start + i + 1);
            self.pos = end;
            let line = self.text[start..end].trim_end_matches(['\r', '\n']);

            match Boundary::parse(line) {
                Ok(Boundary::Begin(name)) => {
                    if open.is_some() {
                        // rescan this BEGIN on the next call
                        self.pos = start;
                        return Some(Err(Error::MissingPostEncapsulationBoundary));
                    }
                    open = Some((start, name));
                }
                Ok(Boundary::End(name)) => match open.take() {
                    Some((_, begin)) if begin != name => {
                        return Some(Err(Error::LabelMissMatch));
                    }
                    Some((block_start, _)) => {
                        return Some(Pem::from_str(&self.text[block_start..end]));
                    }
                    // a stray END line is just more explanatory text
                    None => {}
                },
                Err(_) => {}
            }
        }

        open.map(|_| Err(Error::MissingPostEncapsulationBoundary))
    }
}

impl FromStr for Pem {
    type Err = Error;

    /// Parse the first block of `s`. Text before the BEGIN line is ignored,
    /// anything after the END line is not looked at.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut lines = s.lines().map(|l| l.trim_end_matches('\r'));

        let begin = loop {
            let line = lines.next().ok_or(Error::MissingPreEncapsulationBoundary)?;
            if let Ok(boundary @ Boundary::Begin(_)) = Boundary::parse(line) {
                break boundary;
            }
        };
        let label = Label::from_str(begin.name())?;

        let mut body = Vec::new();
        loop {
            let line = lines.next().ok_or(Error::MissingPostEncapsulationBoundary)?;
            match Boundary::parse(line) {
                Ok(Boundary::End(name)) if name == begin.name() => break,
                Ok(Boundary::End(_)) => return Err(Error::LabelMissMatch),
                Ok(Boundary::Begin(_)) => return Err(Error::MissingPostEncapsulationBoundary),
                Err(_) => body.push(line),
            }
        }

        let (headers, base64_lines) = split_headers(&body)?;
        Ok(Pem {
            label,
            headers,
            base64_data: base64_text(base64_lines)?,
        })
    }
}

type Headers = Vec<(String, String)>;

/// Separate RFC 1421 headers from the base64 text. Headers are only
/// recognised at the top of the block and must end with a blank line.
fn split_headers<'a, 'b>(body: &'a [&'b str]) -> Result<(Headers, &'a [&'b str]), Error> {
    if !body.first().is_some_and(|line| is_header(line)) {
        return Ok((Vec::new(), body));
    }

    let mut headers: Headers = Vec::new();
    for (i, line) in body.iter().enumerate() {
        if line.trim().is_empty() {
            return Ok((headers, &body[i + 1..]));
        }
        if line.starts_with([' ', '\t']) {
            // folded continuation of the previous header
            let (_, value) = headers.last_mut().ok_or(Error::InvalidHeader)?;
            value.push_str(line.trim());
        } else {
            headers.push(parse_header(line)?);
        }
    }
    Err(Error::InvalidHeader)
}

fn base64_text(lines: &[&str]) -> Result<String, Error> {
    if lines.iter().all(|line| line.trim().is_empty()) {
        return Err(Error::MissingData);
    }

    let mut data = String::new();
    let mut padded = false;
    for line in lines.iter().map(|line| line.trim()) {
        let valid = !line.is_empty()
            && line
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/' | b'='))
            && (!padded || line.bytes().all(|b| b == b'='));
        if !valid {
            return Err(Error::InvalidBase64Line);
        }
        padded |= line.contains('=');
        data.push_str(line);
    }
    Ok(data)
}

// ':' never appears in base64 text
fn is_header(line: &str) -> bool {
    line.contains(':')
}

fn parse_header(line: &str) -> Result<(String, String), Error> {
    let (name, value) = line.split_once(':').ok_or(Error::InvalidHeader)?;
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::InvalidHeader);
    }
    Ok((name.to_string(), value.trim().to_string()))
}
