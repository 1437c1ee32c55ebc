//! # Signing
//!
//! Key handles and the low-level signature primitives shared by the
//! [`signer`] and [`verifier`]. Everything here operates on the 32-byte
//! SHA-256 document digest, never on the document itself.
//!
//! Two algorithms are supported, identified by the string recorded in key
//! pairs and signature records:
//!
//! - `ECDSA_P256_SHA256` (default): ECDSA over NIST P-256, DER signatures.
//! - `ED25519`: Ed25519, 64-byte signatures.
//!
//! Key material is accepted as base64 DER (PKCS#8 for private keys,
//! SubjectPublicKeyInfo for public keys), as PEM, or as a key-pair JSON blob
//! as written by [`keys::KeyPair::to_json`].

use crate::error::{KeyError, SignError};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use openssl::ec::{EcGroup, EcKey, EcPoint};
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::{HasPublic, Id, PKey, PKeyRef, Private, Public};
use openssl::sign::{Signer, Verifier};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use zeroize::{ZeroizeOnDrop, Zeroizing};

pub mod keys;
pub mod signable;
pub mod signer;
pub mod verifier;

pub use keys::{
    KeyInfo, KeyPair, fingerprint, generate_key_pair, generate_key_pair_with_algorithm,
    parse_key_info,
};
pub use signable::Signable;
pub use signer::{SignOptions, SignatureRecord, SignedDocument, SignedOutput, sign};
pub use verifier::{VerificationResult, verify};

/// Length of an uncompressed SEC1 P-256 point.
const RAW_P256_POINT_LEN: usize = 65;
const RAW_ED25519_KEY_LEN: usize = 32;

/// Signature scheme recorded alongside keys and signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SignatureAlgorithm {
    #[default]
    EcdsaP256Sha256,
    Ed25519,
}

impl SignatureAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignatureAlgorithm::EcdsaP256Sha256 => "ECDSA_P256_SHA256",
            SignatureAlgorithm::Ed25519 => "ED25519",
        }
    }

    /// The algorithm a key of this type signs with, if any.
    fn of_key<T: HasPublic>(pkey: &PKeyRef<T>) -> Option<Self> {
        match pkey.id() {
            Id::EC => {
                let ec = pkey.ec_key().ok()?;
                (ec.group().curve_name() == Some(Nid::X9_62_PRIME256V1))
                    .then_some(SignatureAlgorithm::EcdsaP256Sha256)
            }
            Id::ED25519 => Some(SignatureAlgorithm::Ed25519),
            _ => None,
        }
    }
}

impl FromStr for SignatureAlgorithm {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "ECDSA_P256_SHA256" | "ES256" => Ok(SignatureAlgorithm::EcdsaP256Sha256),
            "ED25519" => Ok(SignatureAlgorithm::Ed25519),
            _ => Err(KeyError::UnsupportedAlgorithm(s.to_string())),
        }
    }
}

impl fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The key fields of a key-pair JSON blob; everything else is ignored here.
#[derive(Deserialize)]
struct KeyMaterial {
    private_key: Option<String>,
    public_key: Option<String>,
}

/// How a textual key was encoded.
enum Encoded {
    Pem(Vec<u8>),
    Der(Vec<u8>),
}

fn decode_material(input: &str, field: &str) -> Result<Encoded, KeyError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(KeyError::Malformed("key material is empty".to_string()));
    }

    if trimmed.starts_with('{') {
        let material: KeyMaterial = serde_json::from_str(trimmed)
            .map_err(|e| KeyError::Malformed(format!("invalid key-pair JSON: {e}")))?;
        let value = match field {
            "private_key" => material.private_key,
            _ => material.public_key,
        }
        .ok_or_else(|| KeyError::Malformed(format!("key-pair JSON has no {field}")))?;
        return decode_material(&value, field);
    }

    if trimmed.contains("-----BEGIN") {
        return Ok(Encoded::Pem(trimmed.as_bytes().to_vec()));
    }

    let compact: String = trimmed.split_whitespace().collect();
    BASE64
        .decode(compact.as_bytes())
        .map(Encoded::Der)
        .map_err(|e| KeyError::Malformed(format!("key is not valid base64: {e}")))
}

/// Private signing key that zeroizes its encoded form on drop.
#[derive(ZeroizeOnDrop)]
pub struct SigningKey {
    #[zeroize(skip)]
    pkey: PKey<Private>,
    #[zeroize(skip)]
    algorithm: SignatureAlgorithm,
    der: Zeroizing<Vec<u8>>,
}

impl SigningKey {
    /// Parse a private key from base64 PKCS#8 DER, PEM or key-pair JSON.
    pub fn parse(input: &str) -> Result<Self, SignError> {
        match decode_material(input, "private_key")
            .map_err(|e| SignError::InvalidKey(e.to_string()))?
        {
            Encoded::Pem(pem) => Self::from_pem(pem),
            Encoded::Der(der) => Self::from_der(der),
        }
    }

    /// Create a key from PKCS#8 DER bytes.
    pub fn from_der(der: Vec<u8>) -> Result<Self, SignError> {
        let der = Zeroizing::new(der);
        let pkey = PKey::private_key_from_der(&der)
            .map_err(|e| SignError::InvalidKey(format!("failed to load private key: {e}")))?;
        Self::from_pkey(pkey)
    }

    /// Create a key from PEM data (PKCS#8 or traditional EC).
    pub fn from_pem(pem: Vec<u8>) -> Result<Self, SignError> {
        let pem = Zeroizing::new(pem);
        let pkey = PKey::private_key_from_pem(&pem)
            .map_err(|e| SignError::InvalidKey(format!("failed to load private key: {e}")))?;
        Self::from_pkey(pkey)
    }

    pub fn from_pkey(pkey: PKey<Private>) -> Result<Self, SignError> {
        let algorithm = SignatureAlgorithm::of_key(&pkey).ok_or_else(|| {
            SignError::InvalidKey(format!("unsupported key type {:?}", pkey.id()))
        })?;
        // Normalise to PKCS#8 so the encoded form is the same whatever came in
        let der = pkey
            .private_key_to_pkcs8()
            .map(Zeroizing::new)
            .map_err(|e| SignError::InvalidKey(format!("failed to export private key: {e}")))?;
        Ok(Self {
            pkey,
            algorithm,
            der,
        })
    }

    pub fn algorithm(&self) -> SignatureAlgorithm {
        self.algorithm
    }

    /// PKCS#8 DER encoding of the key.
    pub fn to_der(&self) -> Zeroizing<Vec<u8>> {
        self.der.clone()
    }

    pub fn as_pkey(&self) -> &PKey<Private> {
        &self.pkey
    }

    /// Derive the public half.
    pub fn verifying_key(&self) -> Result<VerifyingKey, SignError> {
        let der = self
            .pkey
            .public_key_to_der()
            .map_err(|e| SignError::Crypto(format!("failed to export public key: {e}")))?;
        VerifyingKey::from_der(&der).map_err(|e| SignError::Crypto(e.to_string()))
    }

    /// Sign a document digest.
    pub fn sign_digest(&self, digest: &[u8]) -> Result<Vec<u8>, SignError> {
        match self.algorithm {
            SignatureAlgorithm::EcdsaP256Sha256 => {
                let mut signer = Signer::new(MessageDigest::sha256(), &self.pkey)
                    .map_err(|e| SignError::Crypto(format!("failed to create signer: {e}")))?;
                signer
                    .update(digest)
                    .map_err(|e| SignError::Crypto(format!("failed to update signer: {e}")))?;

                let sig_len = signer.len().map_err(|e| {
                    SignError::Crypto(format!("failed to get signature length: {e}"))
                })?;
                let mut signature = Zeroizing::new(vec![0u8; sig_len]);
                let len = signer
                    .sign(&mut signature)
                    .map_err(|e| SignError::Crypto(format!("failed to sign data: {e}")))?;
                Ok(signature[..len].to_vec())
            }
            SignatureAlgorithm::Ed25519 => Signer::new_without_digest(&self.pkey)
                .and_then(|mut signer| signer.sign_oneshot_to_vec(digest))
                .map_err(|e| SignError::Crypto(format!("failed to sign data: {e}"))),
        }
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

/// Public key used to check signatures.
#[derive(Clone)]
pub struct VerifyingKey {
    pkey: PKey<Public>,
}

impl VerifyingKey {
    /// Parse a public key from base64 DER, PEM or key-pair JSON.
    ///
    /// Besides SubjectPublicKeyInfo DER, bare key encodings are accepted: a
    /// 65-byte uncompressed P-256 point or a 32-byte Ed25519 key.
    pub fn parse(input: &str) -> Result<Self, KeyError> {
        match decode_material(input, "public_key")? {
            Encoded::Pem(pem) => Self::from_pem(&pem),
            Encoded::Der(der) => Self::from_der(&der),
        }
    }

    pub fn from_der(der: &[u8]) -> Result<Self, KeyError> {
        if let Ok(pkey) = PKey::public_key_from_der(der) {
            return Self::from_pkey(pkey);
        }
        let pkey = match der.len() {
            RAW_P256_POINT_LEN if der[0] == 0x04 => raw_p256_key(der)?,
            RAW_ED25519_KEY_LEN => PKey::public_key_from_raw_bytes(der, Id::ED25519)
                .map_err(|e| KeyError::Malformed(format!("invalid Ed25519 key: {e}")))?,
            _ => {
                return Err(KeyError::Malformed(
                    "public key is not DER SubjectPublicKeyInfo".to_string(),
                ));
            }
        };
        Self::from_pkey(pkey)
    }

    pub fn from_pem(pem: &[u8]) -> Result<Self, KeyError> {
        let pkey = PKey::public_key_from_pem(pem)
            .map_err(|e| KeyError::Malformed(format!("failed to load public key: {e}")))?;
        Self::from_pkey(pkey)
    }

    fn from_pkey(pkey: PKey<Public>) -> Result<Self, KeyError> {
        match pkey.id() {
            Id::EC | Id::ED25519 => Ok(Self { pkey }),
            other => Err(KeyError::Malformed(format!("unsupported key type {other:?}"))),
        }
    }

    /// The algorithm this key can verify, or `None` for an EC key on
    /// another curve.
    pub fn algorithm(&self) -> Option<SignatureAlgorithm> {
        SignatureAlgorithm::of_key(&self.pkey)
    }

    /// SubjectPublicKeyInfo DER encoding.
    pub fn to_der(&self) -> Result<Vec<u8>, KeyError> {
        self.pkey
            .public_key_to_der()
            .map_err(|e| KeyError::Malformed(format!("failed to encode public key: {e}")))
    }

    pub fn to_base64(&self) -> Result<String, KeyError> {
        Ok(BASE64.encode(self.to_der()?))
    }

    pub fn fingerprint(&self) -> Result<String, KeyError> {
        Ok(keys::fingerprint(&self.to_der()?))
    }

    /// Check `signature` over `digest` under `algorithm`.
    ///
    /// Any failure, including a key of the wrong type for `algorithm`,
    /// yields `false`.
    pub fn verify_digest(
        &self,
        algorithm: SignatureAlgorithm,
        digest: &[u8],
        signature: &[u8],
    ) -> bool {
        if self.algorithm() != Some(algorithm) {
            log::debug!(
                "key type {:?} cannot verify {algorithm} signatures",
                self.pkey.id()
            );
            return false;
        }

        let outcome = match algorithm {
            SignatureAlgorithm::EcdsaP256Sha256 => {
                Verifier::new(MessageDigest::sha256(), &self.pkey).and_then(|mut verifier| {
                    verifier.update(digest)?;
                    verifier.verify(signature)
                })
            }
            SignatureAlgorithm::Ed25519 => Verifier::new_without_digest(&self.pkey)
                .and_then(|mut verifier| verifier.verify_oneshot(signature, digest)),
        };
        match outcome {
            Ok(valid) => valid,
            Err(e) => {
                log::debug!("signature check errored: {e}");
                false
            }
        }
    }
}

impl fmt::Debug for VerifyingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerifyingKey")
            .field("type", &self.pkey.id())
            .finish()
    }
}

fn raw_p256_key(bytes: &[u8]) -> Result<PKey<Public>, KeyError> {
    let malformed =
        |e: openssl::error::ErrorStack| KeyError::Malformed(format!("invalid P-256 point: {e}"));
    let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).map_err(malformed)?;
    let mut ctx = openssl::bn::BigNumContext::new().map_err(malformed)?;
    let point = EcPoint::from_bytes(&group, bytes, &mut ctx).map_err(malformed)?;
    let ec = EcKey::from_public_key(&group, &point).map_err(malformed)?;
    PKey::from_ec_key(ec).map_err(malformed)
}
