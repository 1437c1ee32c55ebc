//! Produces [`SignatureRecord`]s.
//!
//! The signature covers the hash of the content as it was handed in. A
//! visible mark, when requested, is drawn on a copy afterwards and is not
//! covered; verifiers therefore check the *unmarked* bytes.

use super::signable::Signable;
use super::{SignatureAlgorithm, SigningKey};
use crate::annotation::{AnnotationSpec, apply_annotation};
use crate::document::Document;
use crate::error::{KeyError, Result};
use crate::hash::{DIGEST_HEX_LEN, decode_digest};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;

/// Visible text used by the file-level API when the caller gives none.
pub const DEFAULT_VISIBLE_TEXT: &str = "DIGITALLY SIGNED";

/// What was signed, by whom and when.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureRecord {
    /// Hex SHA-256 of the content before any visible mark.
    #[serde(alias = "hash")]
    pub document_hash: String,
    /// RFC 3339 UTC.
    pub timestamp: String,
    pub algorithm: String,
    #[serde_as(as = "serde_with::base64::Base64")]
    pub signature: Vec<u8>,
    /// The visible mark's text plus its presentation suffix. Not signed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signer_fingerprint: Option<String>,
}

/// The blob persisted after signing a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedDocument {
    pub original_file: String,
    pub signed_file: String,
    pub signature_info: SignatureRecord,
}

/// Accepts either a bare record or a [`SignedDocument`].
#[derive(Deserialize)]
#[serde(untagged)]
enum RecordBlob {
    Wrapped { signature_info: SignatureRecord },
    Bare(SignatureRecord),
}

impl SignatureRecord {
    /// Parse a record from JSON, unwrapping a [`SignedDocument`] if needed.
    pub fn from_json(blob: &str) -> std::result::Result<Self, KeyError> {
        let record = match serde_json::from_str::<RecordBlob>(blob.trim()) {
            Ok(RecordBlob::Wrapped { signature_info }) => signature_info,
            Ok(RecordBlob::Bare(record)) => record,
            Err(e) => {
                return Err(KeyError::MalformedRecord(format!(
                    "not a signature record: {e}"
                )));
            }
        };
        record.validate()?;
        Ok(record)
    }

    /// Check the fields a verifier depends on.
    pub fn validate(&self) -> std::result::Result<(), KeyError> {
        if self.document_hash.len() != DIGEST_HEX_LEN
            || !self.document_hash.bytes().all(|b| b.is_ascii_hexdigit())
        {
            return Err(KeyError::MalformedRecord(format!(
                "document_hash must be {DIGEST_HEX_LEN} hex characters"
            )));
        }
        if self.signature.is_empty() {
            return Err(KeyError::MalformedRecord("signature is empty".to_string()));
        }
        Ok(())
    }

    pub fn signature_algorithm(&self) -> std::result::Result<SignatureAlgorithm, KeyError> {
        self.algorithm.parse()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Controls the visible mark.
#[derive(Debug, Clone, Default)]
pub struct SignOptions {
    /// Text of the visible mark; `None` leaves the content unmarked.
    pub visible_text: Option<String>,
    /// Placement and styling of the mark. The text field is ignored.
    pub appearance: Option<AnnotationSpec>,
}

impl SignOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_visible_text(mut self, text: impl Into<String>) -> Self {
        self.visible_text = Some(text.into());
        self
    }

    pub fn with_appearance(mut self, appearance: AnnotationSpec) -> Self {
        self.appearance = Some(appearance);
        self
    }
}

/// Result of [`sign`].
#[derive(Debug, Clone)]
pub struct SignedOutput {
    pub record: SignatureRecord,
    /// The marked copy, present when a visible mark was requested.
    pub document: Option<Document>,
}

/// Sign `content` with `key`.
///
/// The record's hash and signature always refer to `content` exactly as
/// given. With `options.visible_text` set, the mark is drawn with the
/// compositor on a copy returned in [`SignedOutput::document`].
pub fn sign<S: Signable + ?Sized>(
    content: &S,
    key: &SigningKey,
    options: &SignOptions,
) -> Result<SignedOutput> {
    let document_hash = content.content_hash();
    let digest = decode_digest(&document_hash)?;
    let signature = key.sign_digest(&digest)?;

    let signer_fingerprint = match key.verifying_key().map(|k| k.fingerprint()) {
        Ok(Ok(fp)) => Some(fp),
        _ => {
            log::warn!("could not derive signer fingerprint");
            None
        }
    };

    let (document, visible_text) = match &options.visible_text {
        Some(text) => {
            let spec = options
                .appearance
                .clone()
                .unwrap_or_default()
                .with_text(text.clone());
            let view = content.document()?;
            let marked = apply_annotation(&view, &spec)?;
            log::debug!("drew visible mark {text:?}");
            (Some(marked), Some(format!("{text} {}", spec.metadata_suffix())))
        }
        None => (None, None),
    };

    let record = SignatureRecord {
        document_hash,
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        algorithm: key.algorithm().to_string(),
        signature,
        visible_text,
        signer_fingerprint,
    };
    log::info!(
        "signed content {} with {}",
        &record.document_hash[..16],
        record.algorithm
    );

    Ok(SignedOutput { record, document })
}
