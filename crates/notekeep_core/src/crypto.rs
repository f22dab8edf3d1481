//! Password-based note locking primitives.
//!
//! # Responsibility
//! - Derive the one-way check value stored next to a locked note.
//! - Seal and open note content with a password.
//!
//! # Invariants
//! - The password itself, or anything reversible from it, is never returned.
//! - `decrypt` fails instead of returning garbage when the password, salt or
//!   ciphertext do not match (AES-256-GCM authenticates the body).
//! - This is a local convenience gate, not a security boundary: the unsalted
//!   check hash does not resist a determined local attacker.
//!
//! Keys come from Argon2id over the password and a per-envelope salt.
//! Envelope layout (base64, standard alphabet):
//! `version (1) | salt (16) | nonce (12) | ciphertext + tag (n + 16)`.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use argon2::{Algorithm, Argon2, Params, Version};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::error::Error;
use std::fmt::{Display, Formatter};

const ENVELOPE_VERSION: u8 = 2;
const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
const KEY_LEN: usize = 32;

/// Argon2id memory cost in KiB.
const KDF_MEMORY_KIB: u32 = 8 * 1024;
const KDF_ITERATIONS: u32 = 2;
const KDF_LANES: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Not base64, too short, or an unknown envelope version.
    Malformed(&'static str),
    /// Wrong password or tampered ciphertext.
    Authentication,
    /// Decrypted bytes are not UTF-8.
    InvalidUtf8,
    /// Argon2 rejected its parameters or inputs.
    KeyDerivation(String),
    /// The cipher refused to seal the plaintext.
    Seal,
}

impl Display for CryptoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed(details) => write!(f, "malformed ciphertext: {details}"),
            Self::Authentication => write!(f, "ciphertext authentication failed"),
            Self::InvalidUtf8 => write!(f, "decrypted content is not valid UTF-8"),
            Self::KeyDerivation(details) => write!(f, "key derivation failed: {details}"),
            Self::Seal => write!(f, "failed to seal content"),
        }
    }
}

impl Error for CryptoError {}

/// Hex SHA-256 of the password, stored as `Note::password_check`.
pub fn password_check(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

/// Seals `plaintext` under `password` with a fresh random salt and nonce.
pub fn encrypt(plaintext: &str, password: &str) -> Result<String, CryptoError> {
    let mut rng = rand::thread_rng();
    let mut salt = [0u8; SALT_LEN];
    rng.fill_bytes(&mut salt);
    let mut nonce = [0u8; NONCE_LEN];
    rng.fill_bytes(&mut nonce);

    let cipher = cipher_for(password, &salt)?;
    let body = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
        .map_err(|_| CryptoError::Seal)?;

    let mut envelope = Vec::with_capacity(1 + SALT_LEN + NONCE_LEN + body.len());
    envelope.push(ENVELOPE_VERSION);
    envelope.extend_from_slice(&salt);
    envelope.extend_from_slice(&nonce);
    envelope.extend_from_slice(&body);
    Ok(STANDARD.encode(envelope))
}

/// Opens an envelope produced by `encrypt`.
pub fn decrypt(ciphertext: &str, password: &str) -> Result<String, CryptoError> {
    let envelope = STANDARD
        .decode(ciphertext.trim())
        .map_err(|_| CryptoError::Malformed("not base64"))?;
    if envelope.len() < 1 + SALT_LEN + NONCE_LEN + TAG_LEN {
        return Err(CryptoError::Malformed("envelope too short"));
    }
    if envelope[0] != ENVELOPE_VERSION {
        return Err(CryptoError::Malformed("unknown envelope version"));
    }

    let (salt, rest) = envelope[1..].split_at(SALT_LEN);
    let (nonce, body) = rest.split_at(NONCE_LEN);

    let plain = cipher_for(password, salt)?
        .decrypt(Nonce::from_slice(nonce), body)
        .map_err(|_| CryptoError::Authentication)?;
    String::from_utf8(plain).map_err(|_| CryptoError::InvalidUtf8)
}

fn cipher_for(password: &str, salt: &[u8]) -> Result<Aes256Gcm, CryptoError> {
    let params = Params::new(KDF_MEMORY_KIB, KDF_ITERATIONS, KDF_LANES, Some(KEY_LEN))
        .map_err(|err| CryptoError::KeyDerivation(err.to_string()))?;
    let mut key = [0u8; KEY_LEN];
    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
        .hash_password_into(password.as_bytes(), salt, &mut key)
        .map_err(|err| CryptoError::KeyDerivation(err.to_string()))?;
    Aes256Gcm::new_from_slice(&key).map_err(|err| CryptoError::KeyDerivation(err.to_string()))
}
