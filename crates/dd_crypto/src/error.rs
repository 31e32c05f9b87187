use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Passphrase must not be empty")]
    EmptyPassphrase,

    #[error("AEAD encryption failed")]
    AeadEncrypt,

    #[error("AEAD decryption failed (wrong key or tampered data)")]
    AeadDecrypt,
}
