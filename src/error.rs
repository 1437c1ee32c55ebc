//! Error types for pdfseal.
//!
//! Each component has its own failure enum so callers can match on exactly
//! what went wrong; [`Error`] wraps them for the file-level API and the CLI.
//! A negative signature verification is *not* an error: it is reported
//! through [`crate::signing::verifier::VerificationResult`].

use thiserror::Error;

/// The input could not be understood as a PDF document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("input is not a PDF document (missing %PDF- header)")]
    NotAPdf,

    #[error("PDF structure is corrupt: {0}")]
    Corrupt(String),
}

/// The annotation could not be applied.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnnotationError {
    #[error("no valid pages selected for annotation")]
    NoValidPages,

    #[error("invalid color: {0}")]
    InvalidColor(String),

    #[error("invalid position: {0}")]
    InvalidPosition(String),

    #[error("invalid annotation options: {0}")]
    InvalidSpec(String),
}

/// Key material or a signature record could not be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("malformed key material: {0}")]
    Malformed(String),

    #[error("malformed signature record: {0}")]
    MalformedRecord(String),

    #[error("unsupported signature algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("fingerprint mismatch: expected {expected}, computed {actual}")]
    FingerprintMismatch { expected: String, actual: String },

    #[error("key generation failed: {0}")]
    Generation(String),
}

/// The private key could not be used to produce a signature.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignError {
    #[error("invalid private key: {0}")]
    InvalidKey(String),

    #[error("signing operation failed: {0}")]
    Crypto(String),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Annotation(#[from] AnnotationError),

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error(transparent)]
    Sign(#[from] SignError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Initialization error: {0}")]
    InitializationError(String),

    #[error("Hex decode error: {0}")]
    HexDecode(#[from] hex::FromHexError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
