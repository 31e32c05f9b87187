//! User directory operations.
//!
//! Login/session bookkeeping stays in the host; this layer only answers
//! "is this a known user" and "who can I write to".

use dd_proto::message::User;
use dd_proto::policy;
use dd_store::MailboxIndex;

use crate::error::MessagingError;

pub struct UserService<M> {
    mailbox: M,
}

impl<M: MailboxIndex> UserService<M> {
    pub fn new(mailbox: M) -> Self {
        Self { mailbox }
    }

    /// Format check, then existence lookup. A malformed handle is treated
    /// the same as an unknown one.
    pub async fn authenticate(&self, username: &str) -> Result<bool, MessagingError> {
        if policy::validate_username(username).is_err() {
            tracing::warn!(
                target: "deaddrop",
                event = "authenticate_malformed",
                username = %username
            );
            return Ok(false);
        }
        Ok(self.mailbox.user_exists(username).await?)
    }

    /// All users except `current` — the recipient picker.
    pub async fn available_users(&self, current: &str) -> Result<Vec<User>, MessagingError> {
        Ok(self.mailbox.list_users(Some(current)).await?)
    }

    /// Register a new user. Returns false when the username is taken.
    pub async fn register(&self, username: &str) -> Result<bool, MessagingError> {
        policy::validate_username(username)?;
        let created = self.mailbox.create_user(username).await?;
        if created {
            tracing::info!(target: "deaddrop", event = "user_created", username = %username);
        }
        Ok(created)
    }
}
