//! Key derivation.
//!
//! `derive_message_key` — PBKDF2-HMAC-SHA256, derives the 32-byte key that
//!   seals a single message. The salt is generated fresh per message and
//!   travels inside the envelope, so identical passphrases never yield the
//!   same key twice.

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use zeroize::ZeroizeOnDrop;

use crate::error::CryptoError;

/// Salt length in bytes (128 bits).
pub const SALT_LEN: usize = 16;

/// Derived key length in bytes (256 bits).
pub const KEY_LEN: usize = 32;

/// PBKDF2 iteration count — the v1 security parameter. Deliberately
/// expensive (tens of milliseconds) to slow offline passphrase guessing.
/// Changing it invalidates every stored envelope; that needs an envelope
/// version field first.
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// 32-byte message key derived from a passphrase. Zeroized on drop.
#[derive(ZeroizeOnDrop)]
pub struct MessageKey(pub [u8; KEY_LEN]);

impl std::fmt::Debug for MessageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("MessageKey").field(&"<redacted>").finish()
    }
}

/// Derive the key for one message from a passphrase + 16-byte salt.
///
/// Deterministic: the same inputs always yield the same key. The salt
/// length is fixed by the type; the only runtime failure is an empty
/// passphrase.
pub fn derive_message_key(
    passphrase: &[u8],
    salt: &[u8; SALT_LEN],
) -> Result<MessageKey, CryptoError> {
    if passphrase.is_empty() {
        return Err(CryptoError::EmptyPassphrase);
    }
    let mut output = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(passphrase, salt, PBKDF2_ITERATIONS, &mut output);
    Ok(MessageKey(output))
}

/// Generate a fresh random 16-byte salt (one per message; not secret).
pub fn generate_salt() -> [u8; SALT_LEN] {
    use rand::RngCore;
    let mut salt = [0u8; SALT_LEN];
    rand::rngs::OsRng.fill_bytes(&mut salt);
    salt
}
