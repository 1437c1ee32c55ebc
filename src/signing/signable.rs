//! # Signable Trait
//!
//! This module defines the `Signable` trait, the common interface for content
//! the [`signer`](super::signer) can sign. A signature always covers the
//! SHA-256 of the exact bytes returned by [`Signable::content`]; when a
//! visible mark is requested the signer also needs a parsed
//! [`Document`] to draw on, which [`Signable::document`] provides.
//!
//! Implementations exist for [`Document`] and for raw byte buffers. Raw
//! bytes are only parsed when a visible mark is actually requested, so
//! signing without a mark works on any byte stream.
//!
//! ## Examples
//!
//! ### Hashing a byte buffer
//!
//! ```
//! use pdfseal::signing::Signable;
//!
//! let bytes = b"%PDF-1.7 not really a document".to_vec();
//! assert_eq!(bytes.content_hash(), pdfseal::hash::checksum(&bytes));
//! ```
//!
//! ### Implementing Signable for a custom type
//!
//! ```
//! use pdfseal::document::Document;
//! use pdfseal::error::ParseError;
//! use pdfseal::signing::Signable;
//! use std::borrow::Cow;
//!
//! struct Upload {
//!     data: Vec<u8>,
//! }
//!
//! impl Signable for Upload {
//!     fn content(&self) -> &[u8] {
//!         &self.data
//!     }
//!
//!     fn document(&self) -> Result<Cow<'_, Document>, ParseError> {
//!         Document::load(self.data.clone()).map(Cow::Owned)
//!     }
//! }
//! ```

use crate::document::Document;
use crate::error::ParseError;
use crate::hash::checksum;
use std::borrow::Cow;

/// Content that can be signed.
///
/// ## Implementation Recommendations
///
/// `content` must return the bytes exactly as they will be stored or
/// transmitted. Any normalisation would make the recorded hash
/// unreproducible by a verifier that only sees the file.
pub trait Signable {
    /// The bytes the signature covers.
    fn content(&self) -> &[u8];

    /// A parsed view of the content, used to draw a visible mark.
    fn document(&self) -> Result<Cow<'_, Document>, ParseError>;

    /// Hex SHA-256 of [`content`](Self::content).
    fn content_hash(&self) -> String {
        checksum(self.content())
    }
}

impl Signable for Document {
    fn content(&self) -> &[u8] {
        self.bytes()
    }

    fn document(&self) -> Result<Cow<'_, Document>, ParseError> {
        Ok(Cow::Borrowed(self))
    }
}

impl Signable for [u8] {
    fn content(&self) -> &[u8] {
        self
    }

    fn document(&self) -> Result<Cow<'_, Document>, ParseError> {
        Document::load(self.to_vec()).map(Cow::Owned)
    }
}

impl Signable for Vec<u8> {
    fn content(&self) -> &[u8] {
        self
    }

    fn document(&self) -> Result<Cow<'_, Document>, ParseError> {
        self.as_slice().document()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::common::sample_pdf;

    #[test]
    fn test_document_and_bytes_hash_identically() -> Result<(), ParseError> {
        let bytes = sample_pdf(2);
        let doc = Document::load(bytes.clone())?;
        assert_eq!(doc.content_hash(), bytes.content_hash());
        assert_eq!(doc.content_hash(), bytes.as_slice().content_hash());
        Ok(())
    }

    #[test]
    fn test_document_view_is_borrowed_for_documents() -> Result<(), ParseError> {
        let doc = Document::load(sample_pdf(1))?;
        assert!(matches!(doc.document()?, Cow::Borrowed(_)));
        Ok(())
    }

    #[test]
    fn test_bytes_parse_on_demand() {
        let bytes = sample_pdf(3);
        let view = bytes.document().expect("valid PDF parses");
        assert_eq!(view.page_count(), 3);

        let junk = b"plain text".to_vec();
        assert_eq!(junk.content_hash().len(), 64);
        assert_eq!(junk.document().unwrap_err(), ParseError::NotAPdf);
    }
}
