//! dd_store — SQLite-backed mailbox for Deaddrop
//!
//! # Storage strategy
//! - Message content is stored ONLY as the packed envelope text
//!   (base64 of salt ‖ nonce ‖ ciphertext+tag). The store never sees
//!   plaintext or passphrases.
//! - Metadata (usernames, status, timestamps) is stored in plaintext to
//!   allow efficient queries.
//! - The unread → read transition is a conditional UPDATE keyed on the
//!   current status, so racing readers serialise inside the database
//!   rather than in application code.
//!
//! # Migration
//! SQLx migrations in `migrations/` are run on open.

pub mod db;
pub mod error;
pub mod mailbox;
pub mod models;

pub use db::Store;
pub use error::StoreError;
pub use mailbox::MailboxIndex;
