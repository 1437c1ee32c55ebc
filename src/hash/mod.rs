//! # Hash Module
//!
//! Content-addressed checksums for PDF documents. Every digest produced here is
//! a lowercase hexadecimal SHA-256 string (64 characters). The same value is
//! shown to users by the `checksum` command and signed by the
//! [`signer`](crate::signing::signer).
//!
//! ## Examples
//!
//! ```
//! use pdfseal::hash::checksum;
//!
//! let digest = checksum(b"%PDF-1.7 ...");
//! assert_eq!(digest.len(), 64);
//! assert_eq!(digest, checksum(b"%PDF-1.7 ..."));
//! assert_ne!(digest, checksum(b"%PDF-1.7 ...."));
//! ```

use crate::error::{Error, Result};
use crate::utils::safe_open_file;
use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::Path;
use subtle::ConstantTimeEq;

/// Length of a hex-encoded SHA-256 digest.
pub const DIGEST_HEX_LEN: usize = 64;

/// Number of hex characters shown by [`short_checksum`].
pub const SHORT_CHECKSUM_LEN: usize = 16;

/// Calculate the SHA-256 checksum of the given bytes.
///
/// # Examples
///
/// ```
/// use pdfseal::hash::checksum;
///
/// assert_eq!(
///     checksum(b""),
///     "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
/// );
/// ```
pub fn checksum(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// The first 16 hex characters of [`checksum`], for human comparison.
///
/// This is a display aid only; integrity checks always use the full digest.
pub fn short_checksum(data: &[u8]) -> String {
    let mut digest = checksum(data);
    digest.truncate(SHORT_CHECKSUM_LEN);
    digest
}

/// Calculate the SHA-256 checksum of a file without loading it into memory.
///
/// # Examples
///
/// ```no_run
/// use pdfseal::hash::calculate_file_hash;
///
/// let digest = calculate_file_hash("contract.pdf")?;
/// assert_eq!(digest.len(), 64);
/// # Ok::<(), pdfseal::error::Error>(())
/// ```
pub fn calculate_file_hash(path: impl AsRef<Path>) -> Result<String> {
    let file = safe_open_file(path.as_ref(), false)?;
    hash_reader::<Sha256, _>(file)
}

/// Check that `data` hashes to `expected_hash`.
///
/// The comparison is constant-time. A malformed `expected_hash` simply fails
/// to match.
///
/// ```
/// use pdfseal::hash::{checksum, verify_hash};
///
/// let hash = checksum(b"page data");
/// assert!(verify_hash(b"page data", &hash));
/// assert!(!verify_hash(b"page datA", &hash));
/// assert!(!verify_hash(b"page data", "not-a-digest"));
/// ```
pub fn verify_hash(data: &[u8], expected_hash: &str) -> bool {
    let expected = match decode_digest(expected_hash) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };
    let actual = Sha256::digest(data);
    actual.as_slice().ct_eq(&expected).into()
}

/// Compare two hex digests in constant time, ignoring ASCII case.
pub fn digests_match(left: &str, right: &str) -> bool {
    let left = left.to_ascii_lowercase();
    let right = right.to_ascii_lowercase();
    if left.len() != right.len() {
        return false;
    }
    left.as_bytes().ct_eq(right.as_bytes()).into()
}

/// Decode a hex SHA-256 digest into its 32 raw bytes.
pub fn decode_digest(hash: &str) -> Result<Vec<u8>> {
    if hash.len() != DIGEST_HEX_LEN {
        return Err(Error::Validation(format!(
            "expected a {DIGEST_HEX_LEN}-character SHA-256 digest, got {} characters",
            hash.len()
        )));
    }
    Ok(hex::decode(hash)?)
}

fn hash_reader<D: Digest, R: Read>(mut reader: R) -> Result<String> {
    let mut hasher = D::new();
    let mut buffer = [0; 8192];

    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}
