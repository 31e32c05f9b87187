//! Users, messages, and the read-state machine's states.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered identity. Immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique handle, always `@`-prefixed.
    pub username: String,
    pub created_at: DateTime<Utc>,
}

/// Read-state of a stored message.
///
/// Monotonic: `Unread` → `Read`, never back. The transition is owned by the
/// storage layer's conditional update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    Unread,
    Read,
}

impl MessageStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unread => "unread",
            Self::Read => "read",
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown message status: {0}")]
pub struct ParseStatusError(String);

impl std::str::FromStr for MessageStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unread" => Ok(Self::Unread),
            "read" => Ok(Self::Read),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

/// A stored message.
///
/// `envelope` is the packed, encrypted content — plaintext never reaches
/// this type. Owned exclusively by the (`from_user`, `to_user`) pair; only
/// `to_user` may attempt decryption.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Opaque identifier assigned at creation.
    pub id: String,
    pub from_user: String,
    pub to_user: String,
    /// base64(salt ‖ nonce ‖ ciphertext+tag).
    pub envelope: String,
    pub status: MessageStatus,
    pub sent_at: DateTime<Utc>,
}
