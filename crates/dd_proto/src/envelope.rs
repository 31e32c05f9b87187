//! Message envelope — the only persisted form of message content.
//!
//! Binary layout:
//!   [ salt (16 bytes) | nonce (12 bytes) | ciphertext + tag ]
//! encoded with standard base64 for storage as a text column.
//!
//! The envelope is self-describing: given the right passphrase, the salt
//! and nonce it carries are enough to re-derive the key and decrypt. It
//! carries NO algorithm identifier — the construction is fixed system-wide;
//! changing it means introducing a version byte at the front and teaching
//! `unpack` to dispatch on it.

use base64::{engine::general_purpose::STANDARD, Engine as _};

use dd_crypto::aead::NONCE_LEN;
use dd_crypto::kdf::SALT_LEN;

/// Decoded envelope parts.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub salt: [u8; SALT_LEN],
    pub nonce: [u8; NONCE_LEN],
    /// Ciphertext ‖ 16-byte authentication tag.
    pub sealed: Vec<u8>,
}

impl Envelope {
    /// Pack into the stored text form: base64(salt ‖ nonce ‖ sealed).
    pub fn pack(&self) -> String {
        let mut raw = Vec::with_capacity(SALT_LEN + NONCE_LEN + self.sealed.len());
        raw.extend_from_slice(&self.salt);
        raw.extend_from_slice(&self.nonce);
        raw.extend_from_slice(&self.sealed);
        STANDARD.encode(raw)
    }

    /// Unpack the stored text form.
    pub fn unpack(text: &str) -> Result<Self, EnvelopeError> {
        let raw = STANDARD.decode(text)?;
        if raw.len() < SALT_LEN + NONCE_LEN {
            return Err(EnvelopeError::Truncated { len: raw.len() });
        }

        let (salt_bytes, rest) = raw.split_at(SALT_LEN);
        let (nonce_bytes, sealed) = rest.split_at(NONCE_LEN);

        let mut salt = [0u8; SALT_LEN];
        salt.copy_from_slice(salt_bytes);
        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(nonce_bytes);

        Ok(Self {
            salt,
            nonce,
            sealed: sealed.to_vec(),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    #[error("Envelope is not valid base64: {0}")]
    Base64Decode(#[from] base64::DecodeError),

    #[error("Envelope too short: {len} bytes, need at least {min}", min = SALT_LEN + NONCE_LEN)]
    Truncated { len: usize },
}
