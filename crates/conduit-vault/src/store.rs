use std::collections::HashMap;

use async_trait::async_trait;
use dashmap::DashMap;
use secrecy::SecretString;
use serde::Deserialize;
use tokio::sync::broadcast;

use crate::{ByokCredential, CredentialCipher, VaultError};

/// Capacity of the key mutation channel before slow listeners lag
const MUTATION_CHANNEL_CAPACITY: usize = 256;

/// Notification that a user's key for a provider changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyMutation {
    /// A key was written or replaced
    Stored { user_id: String, provider_id: String },
    /// A key was deactivated or deleted
    Revoked { user_id: String, provider_id: String },
}

impl KeyMutation {
    /// The affected `(user_id, provider_id)` pair
    pub fn target(&self) -> (&str, &str) {
        match self {
            Self::Stored { user_id, provider_id } | Self::Revoked { user_id, provider_id } => {
                (user_id, provider_id)
            }
        }
    }
}

/// Backing store for encrypted BYOK credentials
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// All credentials a user has stored, keyed by provider id
    async fn get(&self, user_id: &str) -> Result<HashMap<String, ByokCredential>, VaultError>;

    /// Insert or replace a credential
    async fn put(&self, credential: ByokCredential) -> Result<(), VaultError>;

    /// Delete a credential, returning whether one existed
    async fn remove(&self, user_id: &str, provider_id: &str) -> Result<bool, VaultError>;

    /// Out-of-band mutation feed, if the store has one
    fn subscribe(&self) -> Option<broadcast::Receiver<KeyMutation>> {
        None
    }
}

/// In-process credential store
///
/// Publishes a [`KeyMutation`] for every change, including changes made
/// directly through [`MemoryCredentialStore::deactivate`].
pub struct MemoryCredentialStore {
    entries: DashMap<String, HashMap<String, ByokCredential>>,
    mutations: broadcast::Sender<KeyMutation>,
}

impl Default for MemoryCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCredentialStore {
    /// Empty store
    pub fn new() -> Self {
        let (mutations, _) = broadcast::channel(MUTATION_CHANNEL_CAPACITY);
        Self {
            entries: DashMap::new(),
            mutations,
        }
    }

    /// Load a `[[credentials]]` TOML document
    ///
    /// Entries carry either a plaintext `key`, which is encrypted with
    /// `cipher` on load, or an already sealed `encrypted_key`.
    pub fn from_toml_str(raw: &str, cipher: &CredentialCipher) -> Result<Self, VaultError> {
        let document: CredentialsDocument = toml::from_str(raw).map_err(|e| VaultError::Parse(e.to_string()))?;
        let store = Self::new();

        for entry in document.credentials {
            let encrypted_key = match (entry.key, entry.encrypted_key) {
                (Some(plain), None) => cipher.encrypt(&plain)?,
                (None, Some(sealed)) => sealed,
                _ => {
                    return Err(VaultError::Parse(format!(
                        "credential for {}/{} needs exactly one of `key` or `encrypted_key`",
                        entry.user_id, entry.provider_id
                    )));
                }
            };

            let mut credential = ByokCredential::new(entry.user_id, entry.provider_id, entry.key_name, encrypted_key);
            credential.is_active = entry.is_active;
            store.insert(credential);
        }

        Ok(store)
    }

    /// Mark a credential inactive without deleting it
    pub fn deactivate(&self, user_id: &str, provider_id: &str) -> bool {
        let changed = self
            .entries
            .get_mut(user_id)
            .and_then(|mut by_provider| {
                by_provider.get_mut(provider_id).map(|credential| {
                    credential.is_active = false;
                })
            })
            .is_some();

        if changed {
            self.publish(KeyMutation::Revoked {
                user_id: user_id.to_owned(),
                provider_id: provider_id.to_owned(),
            });
        }

        changed
    }

    /// Number of stored credentials across all users
    pub fn len(&self) -> usize {
        self.entries.iter().map(|entry| entry.value().len()).sum()
    }

    /// Whether the store holds no credentials
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn insert(&self, credential: ByokCredential) -> (String, String) {
        let target = (credential.user_id.clone(), credential.provider_id.clone());
        self.entries
            .entry(credential.user_id.clone())
            .or_default()
            .insert(credential.provider_id.clone(), credential);
        target
    }

    fn publish(&self, mutation: KeyMutation) {
        // No receivers is not an error
        let _ = self.mutations.send(mutation);
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn get(&self, user_id: &str) -> Result<HashMap<String, ByokCredential>, VaultError> {
        Ok(self.entries.get(user_id).map(|entry| entry.value().clone()).unwrap_or_default())
    }

    async fn put(&self, credential: ByokCredential) -> Result<(), VaultError> {
        let (user_id, provider_id) = self.insert(credential);
        self.publish(KeyMutation::Stored { user_id, provider_id });
        Ok(())
    }

    async fn remove(&self, user_id: &str, provider_id: &str) -> Result<bool, VaultError> {
        let removed = self
            .entries
            .get_mut(user_id)
            .is_some_and(|mut by_provider| by_provider.remove(provider_id).is_some());

        if removed {
            self.publish(KeyMutation::Revoked {
                user_id: user_id.to_owned(),
                provider_id: provider_id.to_owned(),
            });
        }

        Ok(removed)
    }

    fn subscribe(&self) -> Option<broadcast::Receiver<KeyMutation>> {
        Some(self.mutations.subscribe())
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct CredentialsDocument {
    #[serde(default)]
    credentials: Vec<CredentialEntry>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct CredentialEntry {
    user_id: String,
    provider_id: String,
    #[serde(default)]
    key_name: String,
    key: Option<SecretString>,
    encrypted_key: Option<String>,
    #[serde(default = "default_active")]
    is_active: bool,
}

const fn default_active() -> bool {
    true
}
