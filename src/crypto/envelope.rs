//! Authenticated Password Envelope (v2.0)
//!
//! Encrypts secrets at rest using:
//! - PBKDF2-HMAC-SHA256 (600 000 iterations) for key derivation
//! - AES-256-GCM for authenticated encryption
//! - A random 32-byte salt and 12-byte IV per envelope
//!
//! The IV field is serialized as 16 bytes (12 random, 4 zero); only the first
//! 12 are used. Every decryption failure after the version/algorithm/KDF
//! checks surfaces as the same `AuthFailure`.
//!
//! Decryption accepts older iteration counts within the configured range,
//! which is always clamped to 100 000..=10 000 000.

#![allow(deprecated)] // GenericArray::from_slice deprecated in generic-array 1.x

use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce, Tag};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::config::{EnvelopeSettings, KDF_ITERATIONS};
use crate::error::{DkesError, DkesResult, ErrorCode};
use crate::security::secure_memory::SecretBytes;
use crate::wallet::rng::SecureRandom;
use crate::{log_debug, log_warn};

pub const ENVELOPE_VERSION: &str = "2.0";
pub const ENVELOPE_ALGORITHM: &str = "aes-256-gcm";

const SALT_LEN: usize = 32;
const IV_LEN: usize = 12;
const IV_FIELD_LEN: usize = 16;
const TAG_LEN: usize = 16;
const KEY_LEN: usize = 32;

/// Prefix of OpenSSL-style "Salted__" blobs produced by CryptoJS
const LEGACY_CRYPTOJS_PREFIX: &str = "U2FsdGVkX1";

/// Envelope failures before conversion to `DkesError`
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnvelopeError {
    #[error("unsupported envelope version {0:?}; re-encrypt required")]
    UnsupportedVersion(String),
    #[error("unsupported envelope algorithm {0:?}")]
    UnsupportedAlgorithm(String),
    #[error("legacy CryptoJS envelopes are not supported; re-encrypt required")]
    LegacyFormat,
    #[error("PBKDF2 iterations {0} outside accepted bounds")]
    KdfParamsOutOfBounds(u32),
    #[error("authentication failed")]
    AuthFailure,
}

impl From<EnvelopeError> for DkesError {
    fn from(e: EnvelopeError) -> Self {
        match e {
            EnvelopeError::AuthFailure => DkesError::auth_failure(),
            EnvelopeError::KdfParamsOutOfBounds(_) => DkesError::new(ErrorCode::KdfParamsOutOfBounds, e.to_string()),
            EnvelopeError::UnsupportedVersion(_)
            | EnvelopeError::UnsupportedAlgorithm(_)
            | EnvelopeError::LegacyFormat => DkesError::unsupported_format(e.to_string()),
        }
    }
}

/// Versioned ciphertext envelope; all byte fields are base64
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub version: String,
    pub algorithm: String,
    pub iterations: u32,
    pub salt: String,
    pub iv: String,
    #[serde(rename = "authTag")]
    pub auth_tag: String,
    pub ciphertext: String,
}

impl Envelope {
    /// Serialize to the canonical JSON form
    pub fn to_json(&self) -> DkesResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> DkesResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse an envelope from JSON. CryptoJS blobs are reported as
    /// `UnsupportedFormat`.
    pub fn from_json(json: &str) -> DkesResult<Self> {
        let trimmed = json.trim();
        let unquoted = trimmed.trim_matches('"');
        if unquoted.starts_with(LEGACY_CRYPTOJS_PREFIX) {
            return Err(EnvelopeError::LegacyFormat.into());
        }
        Ok(serde_json::from_str(trimmed)?)
    }
}

/// Encrypt `plaintext` under `password` at `KDF_ITERATIONS`
pub fn encrypt(plaintext: &[u8], password: &str, rng: &mut dyn SecureRandom) -> DkesResult<Envelope> {
    seal(plaintext, password, KDF_ITERATIONS, rng)
}

fn seal(plaintext: &[u8], password: &str, iterations: u32, rng: &mut dyn SecureRandom) -> DkesResult<Envelope> {
    let mut salt = [0u8; SALT_LEN];
    rng.fill(&mut salt)?;

    let mut iv = [0u8; IV_FIELD_LEN];
    rng.fill(&mut iv[..IV_LEN])?;

    let key = derive_key(password, &salt, iterations);
    let cipher = Aes256Gcm::new_from_slice(key.as_slice())
        .map_err(|e| DkesError::crypto_error(format!("Failed to create cipher: {}", e)))?;

    let mut buffer = Zeroizing::new(plaintext.to_vec());
    let tag = cipher
        .encrypt_in_place_detached(Nonce::from_slice(&iv[..IV_LEN]), b"", &mut *buffer)
        .map_err(|e| DkesError::crypto_error(format!("Encryption failed: {}", e)))?;

    log_debug!("envelope", "Encrypted envelope", iterations = iterations, len = plaintext.len());

    Ok(Envelope {
        version: ENVELOPE_VERSION.to_string(),
        algorithm: ENVELOPE_ALGORITHM.to_string(),
        iterations,
        salt: STANDARD.encode(salt),
        iv: STANDARD.encode(iv),
        auth_tag: STANDARD.encode(tag),
        ciphertext: STANDARD.encode(buffer.as_slice()),
    })
}

/// Decrypt an envelope. Returns the plaintext in a zeroizing container.
pub fn decrypt(envelope: &Envelope, password: &str, settings: &EnvelopeSettings) -> DkesResult<SecretBytes> {
    if envelope.version != ENVELOPE_VERSION {
        log_warn!("envelope", "Rejected envelope version", version = envelope.version);
        return Err(EnvelopeError::UnsupportedVersion(envelope.version.clone()).into());
    }
    if envelope.algorithm != ENVELOPE_ALGORITHM {
        return Err(EnvelopeError::UnsupportedAlgorithm(envelope.algorithm.clone()).into());
    }
    if !settings.accepted_iterations().contains(&envelope.iterations) {
        return Err(EnvelopeError::KdfParamsOutOfBounds(envelope.iterations).into());
    }

    open(envelope, password).map_err(DkesError::from)
}

/// Check a password against an envelope without returning the plaintext
pub fn verify_password(envelope: &Envelope, password: &str, settings: &EnvelopeSettings) -> bool {
    decrypt(envelope, password, settings).is_ok()
}

/// Encrypt and serialize to JSON
pub fn encrypt_to_json(plaintext: &[u8], password: &str, rng: &mut dyn SecureRandom) -> DkesResult<String> {
    encrypt(plaintext, password, rng)?.to_json()
}

/// Parse JSON and decrypt
pub fn decrypt_from_json(json: &str, password: &str, settings: &EnvelopeSettings) -> DkesResult<SecretBytes> {
    let envelope = Envelope::from_json(json)?;
    decrypt(&envelope, password, settings)
}

fn open(envelope: &Envelope, password: &str) -> Result<SecretBytes, EnvelopeError> {
    let salt = decode_exact(&envelope.salt, SALT_LEN)?;
    let iv = decode_field(&envelope.iv)?;
    if iv.len() != IV_LEN && iv.len() != IV_FIELD_LEN {
        return Err(EnvelopeError::AuthFailure);
    }
    let tag = decode_exact(&envelope.auth_tag, TAG_LEN)?;
    let ciphertext = decode_field(&envelope.ciphertext)?;

    let key = derive_key(password, &salt, envelope.iterations);
    let cipher = Aes256Gcm::new_from_slice(key.as_slice()).map_err(|_| EnvelopeError::AuthFailure)?;

    let mut buffer = SecretBytes::from_vec(ciphertext);
    cipher
        .decrypt_in_place_detached(
            Nonce::from_slice(&iv[..IV_LEN]),
            b"",
            buffer.expose_mut(),
            Tag::from_slice(&tag),
        )
        .map_err(|_| EnvelopeError::AuthFailure)?;

    Ok(buffer)
}

/// PBKDF2-HMAC-SHA256 → 32-byte AES key
fn derive_key(password: &str, salt: &[u8], iterations: u32) -> Zeroizing<[u8; KEY_LEN]> {
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, key.as_mut_slice());
    key
}

fn decode_field(field: &str) -> Result<Vec<u8>, EnvelopeError> {
    STANDARD.decode(field).map_err(|_| EnvelopeError::AuthFailure)
}

fn decode_exact(field: &str, len: usize) -> Result<Vec<u8>, EnvelopeError> {
    let bytes = decode_field(field)?;
    if bytes.len() != len {
        return Err(EnvelopeError::AuthFailure);
    }
    Ok(bytes)
}
