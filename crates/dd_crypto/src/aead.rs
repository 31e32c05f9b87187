//! Authenticated Encryption with Associated Data
//!
//! AES-256-GCM.  Key: 32 bytes.  Nonce: 12 bytes (random).  Tag: 16 bytes.
//!
//! The nonce is returned next to the sealed bytes rather than prepended;
//! the envelope codec frames salt, nonce, and sealed bytes together.
//! Nonce reuse under one key would be catastrophic for GCM, but every
//! message derives its own key from a fresh random salt, so random nonces
//! are safe here.

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng as AeadOsRng},
    Aes256Gcm,
};
use zeroize::Zeroizing;

use crate::error::CryptoError;
use crate::kdf::MessageKey;

/// Nonce length in bytes (96 bits, the GCM standard).
pub const NONCE_LEN: usize = 12;

/// Authentication tag length in bytes appended to the ciphertext.
pub const TAG_LEN: usize = 16;

/// Encrypt `plaintext` under a derived message key with a fresh random
/// nonce. Returns the nonce and the sealed bytes (ciphertext ‖ tag).
pub fn encrypt(
    key: &MessageKey,
    plaintext: &[u8],
) -> Result<([u8; NONCE_LEN], Vec<u8>), CryptoError> {
    let cipher = Aes256Gcm::new_from_slice(&key.0).map_err(|_| CryptoError::AeadEncrypt)?;

    let nonce = Aes256Gcm::generate_nonce(&mut AeadOsRng);

    let sealed = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|_| CryptoError::AeadEncrypt)?;

    Ok((nonce.into(), sealed))
}

/// Decrypt sealed bytes (ciphertext ‖ tag).
///
/// Fails with `AeadDecrypt` if the tag does not verify — a wrong passphrase
/// and a tampered envelope are deliberately indistinguishable, so a caller
/// guessing passphrases learns nothing about why an attempt failed.
pub fn decrypt(
    key: &MessageKey,
    nonce: &[u8; NONCE_LEN],
    sealed: &[u8],
) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    let cipher = Aes256Gcm::new_from_slice(&key.0).map_err(|_| CryptoError::AeadDecrypt)?;
    let nonce = aes_gcm::Nonce::from_slice(nonce);

    let plaintext = cipher
        .decrypt(nonce, sealed)
        .map_err(|_| CryptoError::AeadDecrypt)?;

    Ok(Zeroizing::new(plaintext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn test_key(byte: u8) -> MessageKey {
        MessageKey([byte; 32])
    }

    #[test]
    fn sealed_output_carries_the_tag() {
        let key = test_key(1);
        let (_, sealed) = encrypt(&key, b"hello").unwrap();
        assert_eq!(sealed.len(), 5 + TAG_LEN);
    }

    #[test]
    fn nonces_are_fresh_per_call() {
        let key = test_key(2);
        let (n1, s1) = encrypt(&key, b"same plaintext").unwrap();
        let (n2, s2) = encrypt(&key, b"same plaintext").unwrap();
        assert_ne!(n1, n2);
        assert_ne!(s1, s2);
    }

    #[test]
    fn every_single_bit_flip_is_detected() {
        let key = test_key(3);
        let (nonce, sealed) = encrypt(&key, b"tamper target").unwrap();

        for byte in 0..sealed.len() {
            for bit in 0..8 {
                let mut mangled = sealed.clone();
                mangled[byte] ^= 1 << bit;
                assert!(
                    matches!(decrypt(&key, &nonce, &mangled), Err(CryptoError::AeadDecrypt)),
                    "flip at byte {byte} bit {bit} was not detected"
                );
            }
        }
        for byte in 0..NONCE_LEN {
            for bit in 0..8 {
                let mut mangled = nonce;
                mangled[byte] ^= 1 << bit;
                assert!(matches!(
                    decrypt(&key, &mangled, &sealed),
                    Err(CryptoError::AeadDecrypt)
                ));
            }
        }
    }

    proptest! {
        #[test]
        fn roundtrip_returns_the_plaintext(plaintext in proptest::collection::vec(any::<u8>(), 0..512)) {
            let key = test_key(4);
            let (nonce, sealed) = encrypt(&key, &plaintext).unwrap();
            let opened = decrypt(&key, &nonce, &sealed).unwrap();
            prop_assert_eq!(opened.to_vec(), plaintext);
        }

        #[test]
        fn wrong_key_never_opens(key_byte in 5u8..255) {
            let key = test_key(4);
            let (nonce, sealed) = encrypt(&key, b"sealed under key four").unwrap();
            let other = test_key(key_byte);
            prop_assert!(decrypt(&other, &nonce, &sealed).is_err());
        }
    }
}
