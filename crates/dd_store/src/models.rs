//! Database row models — these map to/from SQL rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use dd_proto::message::{Message, User};

use crate::error::StoreError;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserRow {
    pub username: String,
    pub created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            username: row.username,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MessageRow {
    pub id: String,
    pub from_user: String,
    pub to_user: String,
    /// Packed envelope text (base64). The only persisted form of content.
    pub envelope: String,
    /// MessageStatus as string: "unread" | "read".
    pub status: String,
    pub sent_at: DateTime<Utc>,
}

impl TryFrom<MessageRow> for Message {
    type Error = StoreError;

    fn try_from(row: MessageRow) -> Result<Self, StoreError> {
        let status = row.status.parse().map_err(|_| StoreError::CorruptRow {
            id: row.id.clone(),
            field: "status",
        })?;
        Ok(Self {
            id: row.id,
            from_user: row.from_user,
            to_user: row.to_user,
            envelope: row.envelope,
            status,
            sent_at: row.sent_at,
        })
    }
}
