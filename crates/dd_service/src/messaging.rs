//! Message lifecycle: send and one-shot read.
//!
//! A stored message moves through exactly one transition:
//! `Unread` (initial) → `Read` (terminal). The plaintext is revealed at
//! most once; the transition is a storage-level compare-and-set so two
//! racing readers cannot both claim the reveal.

use std::collections::BTreeMap;

use dd_crypto::{aead, kdf};
use dd_proto::envelope::Envelope;
use dd_proto::message::{Message, MessageStatus};
use dd_proto::policy;
use dd_store::MailboxIndex;

use crate::error::MessagingError;

/// Message operations over a mailbox.
///
/// Holds no state beyond the mailbox handle; construct once and pass by
/// reference.
pub struct MessageService<M> {
    mailbox: M,
}

impl<M: MailboxIndex> MessageService<M> {
    pub fn new(mailbox: M) -> Self {
        Self { mailbox }
    }

    /// Seal `body` under `passphrase` and store it for `to`.
    ///
    /// Validation runs before any key derivation so rejected input never
    /// costs a PBKDF2 pass. The plaintext and passphrase are gone once the
    /// envelope is packed. Returns the new message id.
    pub async fn send(
        &self,
        from: &str,
        to: &str,
        body: &str,
        passphrase: &str,
    ) -> Result<String, MessagingError> {
        policy::validate_message_body(body)?;
        policy::validate_username(to)?;
        policy::validate_passphrase(passphrase)?;

        if !self.mailbox.user_exists(to).await? {
            return Err(MessagingError::RecipientNotFound(to.to_string()));
        }

        let salt = kdf::generate_salt();
        let key = kdf::derive_message_key(passphrase.as_bytes(), &salt)?;
        let (nonce, sealed) = aead::encrypt(&key, body.as_bytes())?;
        let envelope = Envelope { salt, nonce, sealed };

        let id = self.mailbox.create_message(from, to, &envelope.pack()).await?;

        tracing::info!(
            target: "deaddrop",
            event = "message_sent",
            message_id = %id,
            from_user = %from,
            to_user = %to,
            body_chars = body.chars().count()
        );

        Ok(id)
    }

    /// Reveal a message exactly once.
    ///
    /// Order matters: ownership is checked before the one-shot gate, and
    /// both before any crypto. A wrong passphrase leaves the message
    /// `Unread` — retries are the caller's decision and unlimited. After a
    /// successful decrypt, the unread → read compare-and-set decides the
    /// winner; losing it reports `AlreadyRead` even though decryption
    /// succeeded locally.
    pub async fn read(
        &self,
        message_id: &str,
        passphrase: &str,
        requester: &str,
    ) -> Result<String, MessagingError> {
        let message = self
            .mailbox
            .get_message(message_id)
            .await?
            .ok_or_else(|| MessagingError::MessageNotFound(message_id.to_string()))?;

        if message.to_user != requester {
            tracing::warn!(
                target: "deaddrop",
                event = "read_denied",
                message_id = %message_id,
                requester = %requester
            );
            return Err(MessagingError::AccessDenied);
        }

        if message.status == MessageStatus::Read {
            return Err(MessagingError::AlreadyRead);
        }

        let envelope = Envelope::unpack(&message.envelope)?;
        let key = kdf::derive_message_key(passphrase.as_bytes(), &envelope.salt)?;
        let plaintext = aead::decrypt(&key, &envelope.nonce, &envelope.sealed)?;

        let won = self
            .mailbox
            .compare_and_set_status(message_id, MessageStatus::Unread, MessageStatus::Read)
            .await?;
        if !won {
            return Err(MessagingError::AlreadyRead);
        }

        tracing::info!(
            target: "deaddrop",
            event = "message_read",
            message_id = %message_id,
            to_user = %requester
        );

        Ok(String::from_utf8(plaintext.to_vec())?)
    }

    /// Unread messages for `user`, newest first.
    pub async fn inbox(&self, user: &str) -> Result<Vec<Message>, MessagingError> {
        Ok(self.mailbox.list_unread(user).await?)
    }

    /// Unread messages grouped by sender — senders in lexical order,
    /// newest first within each sender.
    pub async fn inbox_grouped(
        &self,
        user: &str,
    ) -> Result<BTreeMap<String, Vec<Message>>, MessagingError> {
        let mut grouped: BTreeMap<String, Vec<Message>> = BTreeMap::new();
        for message in self.mailbox.list_unread(user).await? {
            grouped
                .entry(message.from_user.clone())
                .or_default()
                .push(message);
        }
        Ok(grouped)
    }

    pub async fn unread_count(&self, user: &str) -> Result<i64, MessagingError> {
        Ok(self.mailbox.unread_count(user).await?)
    }

    /// Unread messages for `user` from one sender, newest first.
    pub async fn from_sender(
        &self,
        user: &str,
        sender: &str,
    ) -> Result<Vec<Message>, MessagingError> {
        Ok(self.mailbox.list_unread_from(user, sender).await?)
    }
}
