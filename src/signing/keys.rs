//! Key pair generation, persistence and fingerprints.
//!
//! A key pair is persisted as a pretty-printed JSON blob:
//!
//! ```json
//! {
//!   "private_key": "<base64 PKCS#8 DER>",
//!   "public_key": "<base64 SubjectPublicKeyInfo DER>",
//!   "fingerprint": "3f:a2:...",
//!   "algorithm": "ECDSA_P256_SHA256",
//!   "created_at": "2026-01-01T00:00:00Z"
//! }
//! ```

use super::{SignatureAlgorithm, SigningKey, VerifyingKey};
use crate::error::{Error, KeyError, Result};
use crate::utils::{read_file_to_string, safe_create_file};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{SecondsFormat, Utc};
use openssl::ec::{EcGroup, EcKey};
use openssl::nid::Nid;
use openssl::pkey::PKey;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::io::Write;
use std::path::Path;
use zeroize::ZeroizeOnDrop;

/// Number of digest bytes shown in a fingerprint.
const FINGERPRINT_BYTES: usize = 16;

/// A generated or loaded key pair. Private material is wiped on drop.
#[derive(Clone, Serialize, Deserialize, ZeroizeOnDrop)]
pub struct KeyPair {
    private_key: String,
    #[zeroize(skip)]
    public_key: String,
    #[zeroize(skip)]
    #[serde(default)]
    fingerprint: String,
    #[zeroize(skip)]
    algorithm: String,
    #[zeroize(skip)]
    #[serde(default)]
    created_at: String,
}

/// The public description of a key pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyInfo {
    pub fingerprint: String,
    pub algorithm: String,
    pub public_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Fields read by [`parse_key_info`]; the private key is never needed.
#[derive(Deserialize)]
struct PublicBlob {
    public_key: String,
    fingerprint: Option<String>,
    algorithm: Option<String>,
    created_at: Option<String>,
}

impl KeyPair {
    fn from_signing_key(
        key: &SigningKey,
        created_at: String,
    ) -> std::result::Result<Self, KeyError> {
        let verifying = key
            .verifying_key()
            .map_err(|e| KeyError::Malformed(e.to_string()))?;
        Ok(Self {
            private_key: BASE64.encode(key.to_der().as_slice()),
            public_key: verifying.to_base64()?,
            fingerprint: verifying.fingerprint()?,
            algorithm: key.algorithm().to_string(),
            created_at,
        })
    }

    /// Rebuild a key pair from private key material alone.
    ///
    /// Accepts base64 PKCS#8 DER, PEM or an existing key-pair JSON blob; the
    /// public key and fingerprint are derived.
    pub fn from_private_key(material: &str) -> std::result::Result<Self, KeyError> {
        let key = SigningKey::parse(material).map_err(|e| KeyError::Malformed(e.to_string()))?;
        Self::from_signing_key(&key, now())
    }

    /// Parse a key-pair JSON blob and check it is internally consistent.
    pub fn from_json(json: &str) -> std::result::Result<Self, KeyError> {
        let mut pair: KeyPair = serde_json::from_str(json)
            .map_err(|e| KeyError::Malformed(format!("invalid key-pair JSON: {e}")))?;

        let algorithm: SignatureAlgorithm = pair.algorithm.parse()?;
        let key = pair.signing_key()?;
        if key.algorithm() != algorithm {
            return Err(KeyError::Malformed(format!(
                "key pair declares {algorithm} but holds a {} key",
                key.algorithm()
            )));
        }

        let derived = key
            .verifying_key()
            .map_err(|e| KeyError::Malformed(e.to_string()))?;
        if derived.to_der()? != pair.verifying_key()?.to_der()? {
            return Err(KeyError::Malformed(
                "public key does not belong to the private key".to_string(),
            ));
        }

        let actual = derived.fingerprint()?;
        if pair.fingerprint.is_empty() {
            pair.fingerprint = actual;
        } else if !pair.fingerprint.eq_ignore_ascii_case(&actual) {
            return Err(KeyError::FingerprintMismatch {
                expected: pair.fingerprint.clone(),
                actual,
            });
        }
        Ok(pair)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn private_key(&self) -> &str {
        &self.private_key
    }

    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    pub fn created_at(&self) -> &str {
        &self.created_at
    }

    pub fn signing_key(&self) -> std::result::Result<SigningKey, KeyError> {
        SigningKey::parse(&self.private_key).map_err(|e| KeyError::Malformed(e.to_string()))
    }

    pub fn verifying_key(&self) -> std::result::Result<VerifyingKey, KeyError> {
        VerifyingKey::parse(&self.public_key)
    }

    pub fn info(&self) -> KeyInfo {
        KeyInfo {
            fingerprint: self.fingerprint.clone(),
            algorithm: self.algorithm.clone(),
            public_key: self.public_key.clone(),
            created_at: (!self.created_at.is_empty()).then(|| self.created_at.clone()),
        }
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("private_key", &"[REDACTED]")
            .field("public_key", &self.public_key)
            .field("fingerprint", &self.fingerprint)
            .field("algorithm", &self.algorithm)
            .field("created_at", &self.created_at)
            .finish()
    }
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Generate a key pair with the default algorithm.
pub fn generate_key_pair() -> std::result::Result<KeyPair, KeyError> {
    generate_key_pair_with_algorithm(SignatureAlgorithm::default())
}

/// Generate a key pair using openssl's CSPRNG.
pub fn generate_key_pair_with_algorithm(
    algorithm: SignatureAlgorithm,
) -> std::result::Result<KeyPair, KeyError> {
    let generation = |e: openssl::error::ErrorStack| KeyError::Generation(e.to_string());
    let pkey = match algorithm {
        SignatureAlgorithm::EcdsaP256Sha256 => {
            let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).map_err(generation)?;
            let ec = EcKey::generate(&group).map_err(generation)?;
            PKey::from_ec_key(ec).map_err(generation)?
        }
        SignatureAlgorithm::Ed25519 => PKey::generate_ed25519().map_err(generation)?,
    };
    let key = SigningKey::from_pkey(pkey).map_err(|e| KeyError::Generation(e.to_string()))?;
    let pair = KeyPair::from_signing_key(&key, now())?;
    log::debug!("generated {algorithm} key pair {}", pair.fingerprint);
    Ok(pair)
}

/// Short, stable identifier for a public key: the first 16 bytes of the
/// SHA-256 of its DER encoding as colon-separated hex pairs.
///
/// ```
/// let fp = pdfseal::signing::fingerprint(b"example public key");
/// assert_eq!(fp.len(), 16 * 3 - 1);
/// assert_eq!(fp, pdfseal::signing::fingerprint(b"example public key"));
/// ```
pub fn fingerprint(public_key_der: &[u8]) -> String {
    let digest = Sha256::digest(public_key_der);
    digest[..FINGERPRINT_BYTES]
        .iter()
        .map(|b| hex::encode([*b]))
        .collect::<Vec<_>>()
        .join(":")
}

/// Read the public description from a serialised key pair.
///
/// Only `public_key` is required. When the blob carries a fingerprint it
/// must match the key; when it names an algorithm it must match the key
/// type.
pub fn parse_key_info(blob: &str) -> std::result::Result<KeyInfo, KeyError> {
    let parsed: PublicBlob = serde_json::from_str(blob.trim())
        .map_err(|e| KeyError::Malformed(format!("invalid key-pair JSON: {e}")))?;

    let key = VerifyingKey::parse(&parsed.public_key)?;
    let key_algorithm = key
        .algorithm()
        .ok_or_else(|| KeyError::Malformed("public key is on an unsupported curve".to_string()))?;

    let algorithm = match parsed.algorithm.as_deref() {
        Some(name) => {
            let declared: SignatureAlgorithm = name.parse()?;
            if declared != key_algorithm {
                return Err(KeyError::Malformed(format!(
                    "key pair declares {declared} but holds a {key_algorithm} key"
                )));
            }
            declared
        }
        None => key_algorithm,
    };

    let actual = key.fingerprint()?;
    if let Some(expected) = parsed.fingerprint.filter(|fp| !fp.is_empty()) {
        if !expected.eq_ignore_ascii_case(&actual) {
            return Err(KeyError::FingerprintMismatch { expected, actual });
        }
    }

    Ok(KeyInfo {
        fingerprint: actual,
        algorithm: algorithm.to_string(),
        public_key: parsed.public_key,
        created_at: parsed.created_at,
    })
}

/// Write a key pair to `path` as JSON. On Unix the file is made owner-only.
pub fn save_key_pair(pair: &KeyPair, path: &Path) -> Result<()> {
    let json = pair.to_json()?;
    let mut file = safe_create_file(path, false)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    }

    file.write_all(json.as_bytes())?;
    log::info!("saved key pair {} to {}", pair.fingerprint(), path.display());
    Ok(())
}

/// Load and validate a key pair written by [`save_key_pair`].
pub fn load_key_pair(path: &Path) -> Result<KeyPair> {
    let json = read_file_to_string(path)?;
    KeyPair::from_json(&json).map_err(Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_generate_key_pair_defaults() -> Result<()> {
        let pair = generate_key_pair()?;
        assert_eq!(pair.algorithm(), "ECDSA_P256_SHA256");
        assert!(!pair.private_key().is_empty());
        assert!(!pair.public_key().is_empty());
        assert!(chrono::DateTime::parse_from_rfc3339(pair.created_at()).is_ok());

        let der = BASE64.decode(pair.public_key()).expect("base64 public key");
        assert_eq!(pair.fingerprint(), fingerprint(&der));
        Ok(())
    }

    #[test]
    fn test_fingerprint_format() {
        let fp = fingerprint(b"abc");
        let parts: Vec<&str> = fp.split(':').collect();
        assert_eq!(parts.len(), FINGERPRINT_BYTES);
        assert!(parts.iter().all(|p| p.len() == 2));
        // SHA-256("abc") starts ba7816bf
        assert!(fp.starts_with("ba:78:16:bf"));
    }

    #[test]
    fn test_fingerprint_stable_and_distinct() -> Result<()> {
        let a = generate_key_pair()?;
        let b = generate_key_pair()?;
        let a_der = BASE64.decode(a.public_key()).expect("base64");
        assert_eq!(fingerprint(&a_der), fingerprint(&a_der));
        assert_ne!(a.fingerprint(), b.fingerprint());
        Ok(())
    }

    #[test]
    fn test_json_round_trip_validates() -> Result<()> {
        for algorithm in [SignatureAlgorithm::EcdsaP256Sha256, SignatureAlgorithm::Ed25519] {
            let pair = generate_key_pair_with_algorithm(algorithm)?;
            let loaded = KeyPair::from_json(&pair.to_json()?)?;
            assert_eq!(loaded.public_key(), pair.public_key());
            assert_eq!(loaded.fingerprint(), pair.fingerprint());
            assert_eq!(loaded.algorithm(), algorithm.as_str());
        }
        Ok(())
    }

    #[test]
    fn test_from_json_detects_tampered_fingerprint() -> Result<()> {
        let pair = generate_key_pair()?;
        let mut value: serde_json::Value = serde_json::from_str(&pair.to_json()?)?;
        value["fingerprint"] = serde_json::Value::from("00:11");
        let err = KeyPair::from_json(&value.to_string()).unwrap_err();
        assert!(matches!(err, KeyError::FingerprintMismatch { .. }));
        Ok(())
    }

    #[test]
    fn test_from_json_rejects_mismatched_halves() -> Result<()> {
        let a = generate_key_pair()?;
        let b = generate_key_pair()?;
        let mut value: serde_json::Value = serde_json::from_str(&a.to_json()?)?;
        value["public_key"] = serde_json::Value::from(b.public_key());
        assert!(matches!(
            KeyPair::from_json(&value.to_string()),
            Err(KeyError::Malformed(_))
        ));
        Ok(())
    }

    #[test]
    fn test_from_private_key_derives_public_half() -> Result<()> {
        let pair = generate_key_pair_with_algorithm(SignatureAlgorithm::Ed25519)?;
        let derived = KeyPair::from_private_key(pair.private_key())?;
        assert_eq!(derived.public_key(), pair.public_key());
        assert_eq!(derived.fingerprint(), pair.fingerprint());
        assert_eq!(derived.algorithm(), "ED25519");

        assert!(matches!(
            KeyPair::from_private_key("not a key"),
            Err(KeyError::Malformed(_))
        ));
        Ok(())
    }

    #[test]
    fn test_parse_key_info() -> Result<()> {
        let pair = generate_key_pair()?;
        let info = parse_key_info(&pair.to_json()?)?;
        assert_eq!(info, pair.info());

        // Public-only blob without fingerprint or algorithm
        let public_only = format!(r#"{{"public_key":"{}"}}"#, pair.public_key());
        let info = parse_key_info(&public_only)?;
        assert_eq!(info.fingerprint, pair.fingerprint());
        assert_eq!(info.algorithm, "ECDSA_P256_SHA256");
        assert_eq!(info.created_at, None);
        Ok(())
    }

    #[test]
    fn test_parse_key_info_failures() -> Result<()> {
        assert!(matches!(parse_key_info("not json"), Err(KeyError::Malformed(_))));
        assert!(matches!(parse_key_info("{}"), Err(KeyError::Malformed(_))));
        assert!(matches!(
            parse_key_info(r#"{"public_key":"AAAA"}"#),
            Err(KeyError::Malformed(_))
        ));

        let pair = generate_key_pair()?;
        let unknown = format!(
            r#"{{"public_key":"{}","algorithm":"RSA_PSS"}}"#,
            pair.public_key()
        );
        assert!(matches!(
            parse_key_info(&unknown),
            Err(KeyError::UnsupportedAlgorithm(_))
        ));

        let wrong_type = format!(
            r#"{{"public_key":"{}","algorithm":"ED25519"}}"#,
            pair.public_key()
        );
        assert!(matches!(parse_key_info(&wrong_type), Err(KeyError::Malformed(_))));

        let wrong_fp = format!(
            r#"{{"public_key":"{}","fingerprint":"aa:bb"}}"#,
            pair.public_key()
        );
        assert!(matches!(
            parse_key_info(&wrong_fp),
            Err(KeyError::FingerprintMismatch { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_save_and_load_key_pair() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("keys").join("signer.json");
        let pair = generate_key_pair()?;

        save_key_pair(&pair, &path)?;
        let loaded = load_key_pair(&path)?;
        assert_eq!(loaded.private_key(), pair.private_key());
        assert_eq!(loaded.created_at(), pair.created_at());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path)?.permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
        Ok(())
    }

    #[test]
    fn test_debug_redacts_private_key() -> Result<()> {
        let pair = generate_key_pair()?;
        let printed = format!("{pair:?}");
        assert!(printed.contains("[REDACTED]"));
        assert!(!printed.contains(pair.private_key()));
        Ok(())
    }
}
