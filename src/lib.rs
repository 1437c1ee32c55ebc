//! # pdfseal
//!
//! PDF integrity and signing engine.
//!
//! Inspect a PDF's page structure, compute content checksums, overlay
//! positioned text marks, generate key pairs, sign a document's content hash
//! and verify such signatures while detecting tampering.
//!
//! ## Quick Start
//!
//! ```bash
//! pdfseal key generate --output signer.json
//! pdfseal sign contract.pdf --key signer.json
//! pdfseal verify contract.pdf --record contract-signed.pdf.sig.json --key signer.json
//! ```
//!
//! The signature covers the input file exactly as it was read. The visible
//! "DIGITALLY SIGNED" mark goes on a separate copy and is not covered, so
//! verification is run against the original file.
//!
//! ## Library use
//!
//! ```
//! use pdfseal::document::Document;
//! use pdfseal::signing::{SignOptions, generate_key_pair, sign, verify};
//! # fn pdf() -> Vec<u8> {
//! #     use lopdf::{dictionary, Object, Stream};
//! #     let mut doc = lopdf::Document::with_version("1.7");
//! #     let pages_id = doc.new_object_id();
//! #     let content_id = doc.add_object(Stream::new(dictionary! {}, b"BT ET".to_vec()));
//! #     let page_id = doc.add_object(dictionary! {
//! #         "Type" => "Page",
//! #         "Parent" => pages_id,
//! #         "Contents" => content_id,
//! #     });
//! #     doc.objects.insert(pages_id, Object::Dictionary(dictionary! {
//! #         "Type" => "Pages",
//! #         "Kids" => vec![Object::Reference(page_id)],
//! #         "Count" => 1_i64,
//! #     }));
//! #     let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
//! #     doc.trailer.set("Root", catalog_id);
//! #     let mut out = Vec::new();
//! #     doc.save_to(&mut out).unwrap();
//! #     out
//! # }
//!
//! let doc = Document::load(pdf())?;
//! let keys = generate_key_pair()?;
//!
//! let signed = sign(&doc, &keys.signing_key()?, &SignOptions::new())?;
//! let result = verify(doc.bytes(), &signed.record, &keys.verifying_key()?)?;
//! assert!(result.is_valid);
//! # Ok::<(), pdfseal::error::Error>(())
//! ```

pub mod annotation;
pub mod api;
pub mod cli;
pub mod document;
pub mod error;
pub mod hash;
pub mod signing;
#[cfg(test)]
mod tests;
pub mod utils;

use std::path::PathBuf;

// Re-export error types
pub use error::{Error, Result};

pub const ENV_KEY: &str = "PDFSEAL_KEY";
pub const ENV_NO_PROGRESS: &str = "PDFSEAL_NO_PROGRESS";
pub const ENV_VISIBLE_TEXT: &str = "PDFSEAL_VISIBLE_TEXT";

/// CLI configuration options
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the key file used by `sign` and `verify`
    pub key_path: Option<PathBuf>,
    /// Whether to show progress spinners
    pub show_progress: bool,
    /// Visible text for `sign` when `--text` is not given
    pub visible_text: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            key_path: None,
            show_progress: true,
            visible_text: None,
        }
    }
}

impl Config {
    /// Read `PDFSEAL_KEY`, `PDFSEAL_NO_PROGRESS` and `PDFSEAL_VISIBLE_TEXT`.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let set = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let no_progress = set(ENV_NO_PROGRESS)
            .map(|v| !matches!(v.trim().to_ascii_lowercase().as_str(), "0" | "false" | "no"))
            .unwrap_or(false);

        Self {
            key_path: set(ENV_KEY).map(PathBuf::from),
            show_progress: !no_progress,
            visible_text: set(ENV_VISIBLE_TEXT),
        }
    }
}

/// Initialize logging for the CLI
///
/// # Examples
///
/// ```
/// use pdfseal::init_logging;
///
/// // Initialize with default settings
/// let result = init_logging();
/// // Note: This might fail if already initialized
/// assert!(result.is_ok() || result.is_err());
/// ```
pub fn init_logging() -> Result<()> {
    env_logger::try_init().map_err(|e| Error::InitializationError(e.to_string()))
}

// Re-export commonly used types
pub use annotation::{AnnotationSpec, PageSelection, Position};
pub use document::{Document, DocumentInfo};
pub use signing::{KeyPair, SignatureRecord, VerificationResult};
