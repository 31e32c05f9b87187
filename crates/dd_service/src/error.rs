use thiserror::Error;

use dd_crypto::CryptoError;
use dd_proto::envelope::EnvelopeError;
use dd_proto::policy::PolicyError;
use dd_store::StoreError;

/// Unified failure taxonomy for the message lifecycle.
///
/// Every variant is a typed result returned to the caller; nothing is
/// swallowed and nothing is retried here.
#[derive(Debug, Error)]
pub enum MessagingError {
    /// Malformed input, rejected before any crypto work.
    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error("Recipient {0} not found")]
    RecipientNotFound(String),

    #[error("Message {0} not found")]
    MessageNotFound(String),

    /// The message is not addressed to the requester. No state change.
    #[error("Access denied: this message is not yours")]
    AccessDenied,

    /// The one-shot reveal has already been consumed — either before this
    /// attempt started or by a racing reader that won the transition.
    #[error("This message has already been read")]
    AlreadyRead,

    /// Wrong passphrase or tampered envelope — deliberately one signal.
    #[error("Wrong key! Access denied.")]
    WrongKey,

    #[error("Malformed envelope: {0}")]
    Envelope(#[from] EnvelopeError),

    #[error("Crypto error: {0}")]
    Crypto(CryptoError),

    /// Transient storage failure. Retry policy belongs to the host.
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("Decrypted payload is not valid UTF-8")]
    PayloadEncoding(#[from] std::string::FromUtf8Error),
}

impl From<CryptoError> for MessagingError {
    fn from(e: CryptoError) -> Self {
        match e {
            // Tag verification failure is the single wrong-key/tampering
            // signal the caller is allowed to see.
            CryptoError::AeadDecrypt => Self::WrongKey,
            other => Self::Crypto(other),
        }
    }
}
