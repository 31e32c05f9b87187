//! Gating rules applied before any crypto work.
//!
//! Undersized messages and weak passphrases are rejected here so they
//! never cost a key-derivation pass.

/// Minimum message body length, counted in UTF-8 code points.
pub const MIN_MESSAGE_CHARS: usize = 50;

/// Minimum passphrase length.
pub const MIN_PASSPHRASE_CHARS: usize = 8;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    #[error("Message must be at least {min} characters")]
    MessageTooShort { min: usize },

    #[error("Passphrase must be at least {min} characters")]
    PassphraseTooShort { min: usize },

    #[error("Passphrase must contain at least one letter")]
    PassphraseNeedsLetter,

    #[error("Passphrase must contain at least one digit")]
    PassphraseNeedsDigit,

    #[error("Username {0} must start with @")]
    MalformedUsername(String),
}

pub fn validate_message_body(body: &str) -> Result<(), PolicyError> {
    if body.chars().count() < MIN_MESSAGE_CHARS {
        return Err(PolicyError::MessageTooShort {
            min: MIN_MESSAGE_CHARS,
        });
    }
    Ok(())
}

/// Passphrase strength: length ≥ 8, at least one letter and one decimal
/// digit. No other character-class requirement; an empty passphrase falls
/// to the length rule.
pub fn validate_passphrase(passphrase: &str) -> Result<(), PolicyError> {
    if passphrase.chars().count() < MIN_PASSPHRASE_CHARS {
        return Err(PolicyError::PassphraseTooShort {
            min: MIN_PASSPHRASE_CHARS,
        });
    }
    if !passphrase.chars().any(char::is_alphabetic) {
        return Err(PolicyError::PassphraseNeedsLetter);
    }
    if !passphrase.chars().any(|c| c.is_ascii_digit()) {
        return Err(PolicyError::PassphraseNeedsDigit);
    }
    Ok(())
}

/// Username form check. Existence is the mailbox's concern.
pub fn validate_username(username: &str) -> Result<(), PolicyError> {
    if !username.starts_with('@') {
        return Err(PolicyError::MalformedUsername(username.to_string()));
    }
    Ok(())
}
