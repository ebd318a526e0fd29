use base64::DecodeError;
use thiserror::Error;

/// Why a PEM block could not be read.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// No `-----BEGIN <label>-----` line in the input
    #[error("missing a pre encapsulation boundary")]
    MissingPreEncapsulationBoundary,

    /// The block is not closed before the input or the next block starts
    #[error("missing a post encapsulation boundary")]
    MissingPostEncapsulationBoundary,

    #[error("missing PEM data")]
    MissingData,

    /// Empty label, or a label with surrounding whitespace
    #[error("invalid label")]
    InvalidLabel,

    /// BEGIN and END lines name different labels
    #[error("label doesn't match")]
    LabelMissMatch,

    #[error("invalid encapsulation boundary")]
    InvalidEncapsulationBoundary,

    /// Malformed or unterminated RFC 1421 header section
    #[error("invalid encapsulated header")]
    InvalidHeader,

    /// Blank line, non-base64 character or data after padding
    #[error("invalid base64 line")]
    InvalidBase64Line,

    #[error("base64 decode: {0}")]
    Base64Decode(DecodeError),
}
