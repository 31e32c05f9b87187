//! dd_proto — Domain types, envelope framing, and validation for Deaddrop
//!
//! # Modules
//! - `envelope` — the packed encrypted unit stored as a message's content
//! - `message`  — users, messages, and the read-state machine's states
//! - `policy`   — gating rules applied before any crypto work

pub mod envelope;
pub mod message;
pub mod policy;

pub use envelope::{Envelope, EnvelopeError};
pub use message::{Message, MessageStatus, User};
pub use policy::PolicyError;
