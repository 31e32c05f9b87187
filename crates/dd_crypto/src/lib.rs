//! dd_crypto — Deaddrop cryptographic primitives
//!
//! # Design principles
//! - NO custom crypto; all primitives come from audited Rust crates.
//! - Zeroize all secret material on drop.
//! - One fixed construction system-wide: PBKDF2-HMAC-SHA256 → AES-256-GCM.
//!
//! # Module layout
//! - `kdf`   — PBKDF2-HMAC-SHA256 message-key derivation
//! - `aead`  — AES-256-GCM encrypt/decrypt helpers
//! - `error` — unified error type

pub mod aead;
pub mod error;
pub mod kdf;

pub use error::CryptoError;
