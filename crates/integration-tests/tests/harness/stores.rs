//! Store doubles for the vault and usage seams

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use conduit_usage::{UsageError, UsageRecord, UsageStore};
use conduit_vault::{ByokCredential, CredentialStore, KeyMutation, MemoryCredentialStore, VaultError};
use tokio::sync::broadcast;

/// Memory store that counts `get` calls
#[derive(Default)]
pub struct CountingCredentialStore {
    pub inner: MemoryCredentialStore,
    gets: AtomicUsize,
}

impl CountingCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialStore for CountingCredentialStore {
    async fn get(&self, user_id: &str) -> Result<HashMap<String, ByokCredential>, VaultError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get(user_id).await
    }

    async fn put(&self, credential: ByokCredential) -> Result<(), VaultError> {
        self.inner.put(credential).await
    }

    async fn remove(&self, user_id: &str, provider_id: &str) -> Result<bool, VaultError> {
        self.inner.remove(user_id, provider_id).await
    }

    fn subscribe(&self) -> Option<broadcast::Receiver<KeyMutation>> {
        self.inner.subscribe()
    }
}

/// Store whose every call fails as unreachable
pub struct UnavailableCredentialStore;

#[async_trait]
impl CredentialStore for UnavailableCredentialStore {
    async fn get(&self, _: &str) -> Result<HashMap<String, ByokCredential>, VaultError> {
        Err(VaultError::Unavailable("connection refused".to_owned()))
    }

    async fn put(&self, _: ByokCredential) -> Result<(), VaultError> {
        Err(VaultError::Unavailable("connection refused".to_owned()))
    }

    async fn remove(&self, _: &str, _: &str) -> Result<bool, VaultError> {
        Err(VaultError::Unavailable("connection refused".to_owned()))
    }
}

/// Memory store whose reads stall for `delay`
pub struct SlowCredentialStore {
    pub inner: MemoryCredentialStore,
    pub delay: Duration,
}

#[async_trait]
impl CredentialStore for SlowCredentialStore {
    async fn get(&self, user_id: &str) -> Result<HashMap<String, ByokCredential>, VaultError> {
        tokio::time::sleep(self.delay).await;
        self.inner.get(user_id).await
    }

    async fn put(&self, credential: ByokCredential) -> Result<(), VaultError> {
        self.inner.put(credential).await
    }

    async fn remove(&self, user_id: &str, provider_id: &str) -> Result<bool, VaultError> {
        self.inner.remove(user_id, provider_id).await
    }
}

/// Usage store that rejects every append
pub struct FailingUsageStore;

#[async_trait]
impl UsageStore for FailingUsageStore {
    async fn append(&self, _: &UsageRecord) -> Result<(), UsageError> {
        Err(UsageError::Persistence("disk full".to_owned()))
    }
}
