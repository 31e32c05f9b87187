//! The storage contract the message lifecycle depends on.
//!
//! The only mutation the lifecycle ever performs is the unread → read
//! transition, and it MUST go through `compare_and_set_status` — a genuine
//! conditional update, not read-then-write — so two racing readers cannot
//! both claim the one-shot reveal.

use async_trait::async_trait;

use dd_proto::message::{Message, MessageStatus, User};

use crate::error::StoreError;

#[async_trait]
pub trait MailboxIndex: Send + Sync {
    /// Store a new message in `Unread` state; returns the assigned id.
    async fn create_message(
        &self,
        from: &str,
        to: &str,
        envelope: &str,
    ) -> Result<String, StoreError>;

    async fn get_message(&self, id: &str) -> Result<Option<Message>, StoreError>;

    /// Atomically transition `status` from `expected` to `new`.
    /// Returns true iff the transition was applied.
    async fn compare_and_set_status(
        &self,
        id: &str,
        expected: MessageStatus,
        new: MessageStatus,
    ) -> Result<bool, StoreError>;

    /// Unread messages for `user`, newest first.
    async fn list_unread(&self, user: &str) -> Result<Vec<Message>, StoreError>;

    /// Unread messages for `user` from one sender, newest first.
    async fn list_unread_from(&self, user: &str, sender: &str)
        -> Result<Vec<Message>, StoreError>;

    async fn unread_count(&self, user: &str) -> Result<i64, StoreError>;

    async fn user_exists(&self, username: &str) -> Result<bool, StoreError>;

    /// Returns false when the username is already taken.
    async fn create_user(&self, username: &str) -> Result<bool, StoreError>;

    /// All users, optionally excluding one username.
    async fn list_users(&self, exclude: Option<&str>) -> Result<Vec<User>, StoreError>;
}
