//! BYOK credential vault
//!
//! Caller-supplied provider keys are stored encrypted by an external
//! store. The vault decrypts them on demand, caches the plaintext per
//! (user, provider) for a short TTL, and drops cache entries as soon as
//! a key is written or revoked.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod cipher;
mod credential;
mod error;
mod store;
mod vault;

pub use cipher::CredentialCipher;
pub use credential::{ByokCredential, DecryptedCredential};
pub use error::VaultError;
pub use store::{CredentialStore, KeyMutation, MemoryCredentialStore};
pub use vault::CredentialVault;
