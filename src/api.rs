//! # File-level API
//!
//! Path-based entry points used by the CLI and by embedding applications.
//! Each function reads its inputs from disk, calls into the core and writes
//! any output file. Structured results are returned as JSON strings in the
//! same shape that gets persisted.
//!
//! ## Examples
//!
//! ```no_run
//! use pdfseal::api;
//!
//! let key_pair = api::generate_key_pair_json()?;
//! let signed = api::sign_file("contract.pdf", "contract-signed.pdf", &key_pair, None, None)?;
//! let result = api::verify_file("contract.pdf", &signed, &key_pair)?;
//! println!("{result}");
//! # Ok::<(), pdfseal::error::Error>(())
//! ```

use crate::annotation::{AnnotationSpec, apply_annotation, describe_pages};
use crate::document::{Document, DocumentInfo};
use crate::error::Result;
use crate::hash::calculate_file_hash;
use crate::signing::signer::DEFAULT_VISIBLE_TEXT;
use crate::signing::{
    KeyInfo, SignOptions, SignatureRecord, SignedDocument, SigningKey, VerifyingKey,
    generate_key_pair, parse_key_info, sign, verify,
};
use crate::utils::{read_file, write_file};
use std::path::Path;

fn load_document(path: &Path) -> Result<Document> {
    let bytes = read_file(path)?;
    log::debug!("read {} bytes from {}", bytes.len(), path.display());
    Ok(Document::load(bytes)?)
}

/// Number of pages in the PDF at `path`.
pub fn get_page_count(path: impl AsRef<Path>) -> Result<u32> {
    Ok(load_document(path.as_ref())?.page_count())
}

/// Page count of the unmodified input, reported before a signing run.
pub fn get_pdf_info_before_signing(path: impl AsRef<Path>) -> Result<u32> {
    get_page_count(path)
}

pub fn get_pdf_info(path: impl AsRef<Path>) -> Result<DocumentInfo> {
    Ok(load_document(path.as_ref())?.info())
}

/// Draw `spec` onto the PDF at `input` and write the result to `output`.
pub fn apply_annotation_to_file(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    spec: &AnnotationSpec,
) -> Result<()> {
    let (input, output) = (input.as_ref(), output.as_ref());
    let doc = load_document(input)?;
    let annotated = apply_annotation(&doc, spec)?;
    write_file(output, annotated.bytes())?;

    log::info!(
        "annotated {} of {} ({}) -> {}",
        describe_pages(&spec.pages.resolve(doc.page_count())),
        input.display(),
        spec.pages,
        output.display()
    );
    Ok(())
}

/// Full hex SHA-256 of the file at `path`.
pub fn get_checksum(path: impl AsRef<Path>) -> Result<String> {
    calculate_file_hash(path)
}

/// Generate a key pair with the default algorithm, as JSON.
pub fn generate_key_pair_json() -> Result<String> {
    generate_key_pair()?.to_json()
}

pub fn parse_key_info_json(blob: &str) -> Result<KeyInfo> {
    Ok(parse_key_info(blob)?)
}

/// Sign the PDF at `input` and write the marked copy to `output`.
///
/// The signature covers `input` as read. The copy at `output` carries the
/// visible mark (`visible_text`, or "DIGITALLY SIGNED" when `None`) styled
/// by `appearance`. Returns a [`SignedDocument`] as JSON.
pub fn sign_file(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    private_key: &str,
    visible_text: Option<&str>,
    appearance: Option<&AnnotationSpec>,
) -> Result<String> {
    let (input, output) = (input.as_ref(), output.as_ref());
    let key = SigningKey::parse(private_key)?;
    let doc = load_document(input)?;

    let mut options =
        SignOptions::new().with_visible_text(visible_text.unwrap_or(DEFAULT_VISIBLE_TEXT));
    if let Some(appearance) = appearance {
        options = options.with_appearance(appearance.clone());
    }

    let signed = sign(&doc, &key, &options)?;
    let marked = signed.document.as_ref().unwrap_or(&doc);
    write_file(output, marked.bytes())?;

    let result = SignedDocument {
        original_file: input.display().to_string(),
        signed_file: output.display().to_string(),
        signature_info: signed.record,
    };
    log::info!("signed {} -> {}", input.display(), output.display());
    Ok(serde_json::to_string_pretty(&result)?)
}

/// Verify the file at `path` against a record blob (bare or wrapped).
///
/// Returns a [`VerificationResult`](crate::signing::VerificationResult) as
/// JSON. A negative outcome is `Ok`.
pub fn verify_file(path: impl AsRef<Path>, record_blob: &str, public_key: &str) -> Result<String> {
    let path = path.as_ref();
    let record = SignatureRecord::from_json(record_blob)?;
    let key = VerifyingKey::parse(public_key)?;
    let bytes = read_file(path)?;

    let result = verify(&bytes, &record, &key)?;
    log::info!(
        "verified {}: {}",
        path.display(),
        if result.is_valid { "valid" } else { "invalid" }
    );
    Ok(serde_json::to_string_pretty(&result)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{PageSelection, Position};
    use crate::error::{AnnotationError, Error, KeyError, ParseError, SignError};
    use crate::hash::checksum;
    use crate::signing::VerificationResult;
    use crate::tests::common::{sample_pdf, watermarked_pages};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_page_count_matches_info() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("five.pdf");
        fs::write(&path, sample_pdf(5))?;

        assert_eq!(get_page_count(&path)?, 5);
        assert_eq!(get_pdf_info_before_signing(&path)?, 5);
        let info = get_pdf_info(&path)?;
        assert_eq!(info.page_count, 5);
        assert_eq!(info.byte_length as u64, fs::metadata(&path)?.len());
        Ok(())
    }

    #[test]
    fn test_missing_and_invalid_input() -> Result<()> {
        let dir = tempdir()?;
        assert!(matches!(
            get_page_count(dir.path().join("absent.pdf")),
            Err(Error::Io(_))
        ));

        let text = dir.path().join("notes.txt");
        fs::write(&text, "hello")?;
        assert!(matches!(
            get_page_count(&text),
            Err(Error::Parse(ParseError::NotAPdf))
        ));
        Ok(())
    }

    #[test]
    fn test_checksum_of_file() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("doc.pdf");
        let bytes = sample_pdf(1);
        fs::write(&path, &bytes)?;
        assert_eq!(get_checksum(&path)?, checksum(&bytes));
        Ok(())
    }

    #[test]
    fn test_annotation_to_file() -> Result<()> {
        let dir = tempdir()?;
        let input = dir.path().join("in.pdf");
        let output = dir.path().join("nested").join("out.pdf");
        fs::write(&input, sample_pdf(3))?;

        let spec = AnnotationSpec::new("CONFIDENTIAL")
            .with_position(Position::Center)
            .with_pages(PageSelection::Odd);
        apply_annotation_to_file(&input, &output, &spec)?;

        assert_eq!(get_page_count(&output)?, 3);
        assert_eq!(watermarked_pages(&fs::read(&output)?), vec![1, 3]);

        let none = AnnotationSpec::new("X").with_pages("7,8".parse().unwrap());
        assert!(matches!(
            apply_annotation_to_file(&input, dir.path().join("never.pdf"), &none),
            Err(Error::Annotation(AnnotationError::NoValidPages))
        ));
        assert!(!dir.path().join("never.pdf").exists());
        Ok(())
    }

    #[test]
    fn test_key_pair_json_and_info() -> Result<()> {
        let blob = generate_key_pair_json()?;
        let value: serde_json::Value = serde_json::from_str(&blob)?;
        for field in ["public_key", "private_key", "fingerprint", "algorithm"] {
            assert!(value[field].is_string(), "{field}");
        }

        let info = parse_key_info_json(&blob)?;
        assert_eq!(Some(info.fingerprint.as_str()), value["fingerprint"].as_str());
        assert_eq!(info.algorithm, "ECDSA_P256_SHA256");

        assert!(matches!(
            parse_key_info_json("garbage"),
            Err(Error::Key(KeyError::Malformed(_)))
        ));
        Ok(())
    }

    #[test]
    fn test_sign_and_verify_files() -> Result<()> {
        let dir = tempdir()?;
        let input = dir.path().join("in.pdf");
        let output = dir.path().join("signed.pdf");
        fs::write(&input, sample_pdf(2))?;
        let keys = generate_key_pair_json()?;

        let signed_json = sign_file(&input, &output, &keys, Some("Approved"), None)?;
        let signed: SignedDocument = serde_json::from_str(&signed_json)?;
        assert_eq!(signed.signed_file, output.display().to_string());
        assert_eq!(signed.signature_info.document_hash, get_checksum(&input)?);
        assert_eq!(watermarked_pages(&fs::read(&output)?), vec![1, 2]);

        let result: VerificationResult =
            serde_json::from_str(&verify_file(&input, &signed_json, &keys)?)?;
        assert!(result.is_valid);

        // The marked copy differs from what was signed
        let marked: VerificationResult =
            serde_json::from_str(&verify_file(&output, &signed_json, &keys)?)?;
        assert!(!marked.is_valid);
        assert!(marked.message.starts_with("content hash mismatch"));
        Ok(())
    }

    #[test]
    fn test_sign_file_default_text_and_appearance() -> Result<()> {
        let dir = tempdir()?;
        let input = dir.path().join("in.pdf");
        let output = dir.path().join("out.pdf");
        fs::write(&input, sample_pdf(4))?;
        let keys = generate_key_pair_json()?;

        let appearance = AnnotationSpec::default()
            .with_pages(PageSelection::Even)
            .with_rotation(15.0);
        let signed: SignedDocument = serde_json::from_str(&sign_file(
            &input,
            &output,
            &keys,
            None,
            Some(&appearance),
        )?)?;

        let text = signed.signature_info.visible_text.unwrap_or_default();
        assert!(text.starts_with("DIGITALLY SIGNED ["));
        assert!(text.contains("rot:15"));
        assert_eq!(watermarked_pages(&fs::read(&output)?), vec![2, 4]);
        Ok(())
    }

    #[test]
    fn test_verify_accepts_bare_record() -> Result<()> {
        let dir = tempdir()?;
        let input = dir.path().join("in.pdf");
        fs::write(&input, sample_pdf(1))?;
        let keys = generate_key_pair_json()?;

        let signed: SignedDocument = serde_json::from_str(&sign_file(
            &input,
            dir.path().join("out.pdf"),
            &keys,
            None,
            None,
        )?)?;
        let bare = signed.signature_info.to_json()?;
        let result: VerificationResult = serde_json::from_str(&verify_file(&input, &bare, &keys)?)?;
        assert!(result.is_valid);
        Ok(())
    }

    #[test]
    fn test_sign_with_bad_key() -> Result<()> {
        let dir = tempdir()?;
        let input = dir.path().join("in.pdf");
        fs::write(&input, sample_pdf(1))?;

        let result = sign_file(&input, dir.path().join("out.pdf"), "bm90IGEga2V5", None, None);
        assert!(matches!(result, Err(Error::Sign(SignError::InvalidKey(_)))));
        Ok(())
    }

    #[test]
    fn test_verify_with_malformed_inputs() -> Result<()> {
        let dir = tempdir()?;
        let input = dir.path().join("in.pdf");
        fs::write(&input, sample_pdf(1))?;
        let keys = generate_key_pair_json()?;
        let signed = sign_file(&input, dir.path().join("out.pdf"), &keys, None, None)?;

        assert!(matches!(
            verify_file(&input, "{}", &keys),
            Err(Error::Key(KeyError::MalformedRecord(_)))
        ));
        assert!(matches!(
            verify_file(&input, &signed, "not a key"),
            Err(Error::Key(KeyError::Malformed(_)))
        ));
        Ok(())
    }
}
