//! Checks content against a [`SignatureRecord`].
//!
//! A negative outcome (modified content, bad signature, wrong key) is a
//! normal [`VerificationResult`] with `is_valid == false`. Only inputs that
//! cannot be interpreted at all, such as an unknown algorithm or a record
//! without a usable hash, are errors.

use super::VerifyingKey;
use super::signable::Signable;
use super::signer::SignatureRecord;
use crate::error::Result;
use crate::hash::{checksum, decode_digest, digests_match};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

pub const MSG_VALID: &str = "Signature is valid and document is authentic";
pub const MSG_HASH_MISMATCH: &str =
    "content hash mismatch: document has been modified since signing";
pub const MSG_BAD_SIGNATURE: &str =
    "invalid signature: document may be tampered or signed with a different key";

/// Outcome of a verification. Never persisted by this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub is_valid: bool,
    pub message: String,
    /// RFC 3339 UTC.
    pub verified_at: String,
    pub signature_info: SignatureRecord,
}

impl VerificationResult {
    fn new(is_valid: bool, message: &str, record: &SignatureRecord) -> Self {
        Self {
            is_valid,
            message: message.to_string(),
            verified_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            signature_info: record.clone(),
        }
    }
}

/// Verify `bytes` against `record` using `key`.
///
/// The hash is checked first; the signature is only examined when the
/// content is unchanged.
pub fn verify(
    bytes: &[u8],
    record: &SignatureRecord,
    key: &VerifyingKey,
) -> Result<VerificationResult> {
    record.validate()?;
    let algorithm = record.signature_algorithm()?;

    let actual = checksum(bytes);
    if !digests_match(&actual, &record.document_hash) {
        log::info!(
            "hash mismatch: recorded {}, computed {}",
            record.document_hash,
            actual
        );
        return Ok(VerificationResult::new(false, MSG_HASH_MISMATCH, record));
    }

    let digest = decode_digest(&record.document_hash)?;
    if key.verify_digest(algorithm, &digest, &record.signature) {
        log::info!("valid {algorithm} signature over {}", &actual[..16]);
        Ok(VerificationResult::new(true, MSG_VALID, record))
    } else {
        log::info!("{algorithm} signature rejected");
        Ok(VerificationResult::new(false, MSG_BAD_SIGNATURE, record))
    }
}

/// [`verify`] for any [`Signable`].
pub fn verify_document<S: Signable + ?Sized>(
    content: &S,
    record: &SignatureRecord,
    key: &VerifyingKey,
) -> Result<VerificationResult> {
    verify(content.content(), record, key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::error::{Error, KeyError};
    use crate::signing::signer::{SignOptions, sign};
    use crate::signing::test_utils::generate_test_key;
    use crate::signing::SignatureAlgorithm;
    use crate::tests::common::sample_pdf;

    #[test]
    fn test_round_trip_both_algorithms() -> Result<()> {
        for alg in [SignatureAlgorithm::EcdsaP256Sha256, SignatureAlgorithm::Ed25519] {
            let (key, verifying) = generate_test_key(alg)?;
            let doc = Document::load(sample_pdf(2))?;
            let record = sign(&doc, &key, &SignOptions::new())?.record;

            let result = verify_document(&doc, &record, &verifying)?;
            assert!(result.is_valid, "{alg}");
            assert_eq!(result.message, MSG_VALID);
            assert_eq!(result.signature_info, record);
        }
        Ok(())
    }

    #[test]
    fn test_single_byte_change_is_hash_mismatch() -> Result<()> {
        let (key, verifying) = generate_test_key(SignatureAlgorithm::EcdsaP256Sha256)?;
        let bytes = sample_pdf(1);
        let record = sign(&bytes, &key, &SignOptions::new())?.record;

        for index in [0, bytes.len() / 2, bytes.len() - 1] {
            let mut tampered = bytes.clone();
            tampered[index] ^= 0x01;
            let result = verify(&tampered, &record, &verifying)?;
            assert!(!result.is_valid);
            assert!(result.message.starts_with("content hash mismatch"));
        }
        Ok(())
    }

    #[test]
    fn test_wrong_key_is_invalid() -> Result<()> {
        let (key, _) = generate_test_key(SignatureAlgorithm::EcdsaP256Sha256)?;
        let (_, stranger) = generate_test_key(SignatureAlgorithm::EcdsaP256Sha256)?;
        let bytes = sample_pdf(1);
        let record = sign(&bytes, &key, &SignOptions::new())?.record;

        let result = verify(&bytes, &record, &stranger)?;
        assert!(!result.is_valid);
        assert_eq!(result.message, MSG_BAD_SIGNATURE);
        Ok(())
    }

    #[test]
    fn test_key_of_other_algorithm_is_invalid() -> Result<()> {
        let (key, _) = generate_test_key(SignatureAlgorithm::EcdsaP256Sha256)?;
        let (_, ed_key) = generate_test_key(SignatureAlgorithm::Ed25519)?;
        let bytes = sample_pdf(1);
        let record = sign(&bytes, &key, &SignOptions::new())?.record;

        assert!(!verify(&bytes, &record, &ed_key)?.is_valid);
        Ok(())
    }

    #[test]
    fn test_forged_signature_is_invalid() -> Result<()> {
        let (key, verifying) = generate_test_key(SignatureAlgorithm::EcdsaP256Sha256)?;
        let bytes = sample_pdf(1);
        let mut record = sign(&bytes, &key, &SignOptions::new())?.record;
        record.signature = vec![0x30, 0x06, 0x02, 0x01, 0x01, 0x02, 0x01, 0x01];

        assert!(!verify(&bytes, &record, &verifying)?.is_valid);
        Ok(())
    }

    #[test]
    fn test_unknown_algorithm_is_error() -> Result<()> {
        let (key, verifying) = generate_test_key(SignatureAlgorithm::EcdsaP256Sha256)?;
        let bytes = sample_pdf(1);
        let mut record = sign(&bytes, &key, &SignOptions::new())?.record;
        record.algorithm = "RSA_PKCS1_SHA1".to_string();

        assert!(matches!(
            verify(&bytes, &record, &verifying),
            Err(Error::Key(KeyError::UnsupportedAlgorithm(_)))
        ));
        Ok(())
    }

    #[test]
    fn test_malformed_record_is_error() -> Result<()> {
        let (key, verifying) = generate_test_key(SignatureAlgorithm::EcdsaP256Sha256)?;
        let bytes = sample_pdf(1);
        let mut record = sign(&bytes, &key, &SignOptions::new())?.record;
        record.document_hash = "not hex".to_string();

        assert!(matches!(
            verify(&bytes, &record, &verifying),
            Err(Error::Key(KeyError::MalformedRecord(_)))
        ));
        Ok(())
    }

    #[test]
    fn test_unparseable_content_still_verifies() -> Result<()> {
        let (key, verifying) = generate_test_key(SignatureAlgorithm::Ed25519)?;
        let record = sign(b"%PDF-1.7 truncated".as_slice(), &key, &SignOptions::new())?.record;
        assert!(verify(b"%PDF-1.7 truncated", &record, &verifying)?.is_valid);
        assert!(!verify(b"%PDF-1.7 truncate", &record, &verifying)?.is_valid);
        Ok(())
    }

    #[test]
    fn test_uppercase_hash_accepted() -> Result<()> {
        let (key, verifying) = generate_test_key(SignatureAlgorithm::EcdsaP256Sha256)?;
        let bytes = sample_pdf(1);
        let mut record = sign(&bytes, &key, &SignOptions::new())?.record;
        record.document_hash = record.document_hash.to_ascii_uppercase();
        assert!(verify(&bytes, &record, &verifying)?.is_valid);
        Ok(())
    }
}
