use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use mini_moka::sync::Cache;
use secrecy::SecretString;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::{ByokCredential, CredentialCipher, CredentialStore, DecryptedCredential, KeyMutation, VaultError};

type CacheKey = (String, String);

/// Cached lookup result; `None` records that the user has no usable key
type CacheValue = Option<Arc<DecryptedCredential>>;

/// Per-user invalidation counter
type Generation = Arc<AtomicU64>;

/// Decrypting, caching front for a [`CredentialStore`]
///
/// Lookups are cached per `(user, provider)` for the configured TTL,
/// including negative results. Writes through the vault invalidate the
/// affected entry before returning, and mutations published by the
/// store are applied by [`CredentialVault::spawn_invalidation_listener`].
#[derive(Clone)]
pub struct CredentialVault {
    inner: Arc<Inner>,
}

struct Inner {
    store: Arc<dyn CredentialStore>,
    cipher: CredentialCipher,
    cache: Cache<CacheKey, CacheValue>,
    /// Bumped on every invalidation of a user so in-flight fetches do
    /// not re-populate stale entries. Bounded like `cache`; a fetch whose
    /// generation was evicted meanwhile is simply not cached.
    generations: Cache<String, Generation>,
}

impl CredentialVault {
    /// Create a vault over `store`
    pub fn new(store: Arc<dyn CredentialStore>, cipher: CredentialCipher, cache_ttl: Duration, cache_capacity: u64) -> Self {
        let cache = Cache::builder()
            .time_to_live(cache_ttl)
            .max_capacity(cache_capacity)
            .build();
        let generations = Cache::builder()
            .time_to_live(cache_ttl)
            .max_capacity(cache_capacity)
            .build();

        Self {
            inner: Arc::new(Inner {
                store,
                cipher,
                cache,
                generations,
            }),
        }
    }

    /// The cipher used for stored keys
    pub fn cipher(&self) -> &CredentialCipher {
        &self.inner.cipher
    }

    /// Active, decryptable credential for `(user_id, provider_id)`
    ///
    /// Store failures and undecryptable records both surface as `None`;
    /// store failures are not cached so the next call retries.
    pub async fn get_user_key(&self, user_id: &str, provider_id: &str) -> Option<Arc<DecryptedCredential>> {
        let key = (user_id.to_owned(), provider_id.to_owned());
        if let Some(cached) = self.inner.cache.get(&key) {
            tracing::trace!(user_id, provider_id, hit = cached.is_some(), "vault cache hit");
            return cached;
        }

        let generation = self.generation(user_id);
        let seen = generation.load(Ordering::Acquire);
        let stored = match self.inner.store.get(user_id).await {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!(user_id, provider_id, error = %e, "credential store lookup failed");
                return None;
            }
        };

        let mut found = None;
        for (stored_provider, record) in stored {
            let decrypted = self.decrypt_record(&record);
            if stored_provider == provider_id {
                found.clone_from(&decrypted);
            }
            self.populate(&generation, seen, (user_id.to_owned(), stored_provider), decrypted);
        }

        if found.is_none() {
            self.populate(&generation, seen, key, None);
        }

        tracing::debug!(user_id, provider_id, found = found.is_some(), "vault cache miss");
        found
    }

    /// Whether the user has an active, decryptable key for the provider
    pub async fn has_credential(&self, user_id: &str, provider_id: &str) -> bool {
        self.get_user_key(user_id, provider_id).await.is_some()
    }

    /// Encrypt and store a key, then drop any cached lookup for it
    pub async fn store_key(
        &self,
        user_id: &str,
        provider_id: &str,
        key_name: &str,
        plaintext: &SecretString,
    ) -> Result<(), VaultError> {
        let encrypted_key = self.inner.cipher.encrypt(plaintext)?;
        let credential = ByokCredential::new(user_id, provider_id, key_name, encrypted_key);

        self.inner.store.put(credential).await?;
        self.invalidate(user_id, provider_id);

        tracing::info!(user_id, provider_id, key_name, "byok credential stored");
        Ok(())
    }

    /// Delete a key, then drop any cached lookup for it
    pub async fn revoke_key(&self, user_id: &str, provider_id: &str) -> Result<bool, VaultError> {
        let removed = self.inner.store.remove(user_id, provider_id).await?;
        self.invalidate(user_id, provider_id);

        tracing::info!(user_id, provider_id, removed, "byok credential revoked");
        Ok(removed)
    }

    /// Drop the cached lookup for one `(user, provider)` pair
    pub fn invalidate(&self, user_id: &str, provider_id: &str) {
        self.bump(user_id);
        self.inner
            .cache
            .invalidate(&(user_id.to_owned(), provider_id.to_owned()));
    }

    /// Drop every cached lookup for a user
    pub fn invalidate_user(&self, user_id: &str) {
        self.bump(user_id);

        // Collect first: the cache iterator holds shard locks
        let keys: Vec<CacheKey> = self
            .inner
            .cache
            .iter()
            .filter(|entry| entry.key().0 == user_id)
            .map(|entry| entry.key().clone())
            .collect();
        for key in keys {
            self.inner.cache.invalidate(&key);
        }
    }

    /// Drop the whole cache
    pub fn invalidate_all(&self) {
        self.inner.generations.invalidate_all();
        self.inner.cache.invalidate_all();
    }

    /// Apply store-published key mutations to the cache
    ///
    /// Returns `None` when the store has no mutation feed. If the
    /// listener falls behind the channel, the whole cache is dropped.
    pub fn spawn_invalidation_listener(&self) -> Option<JoinHandle<()>> {
        let mut rx = self.inner.store.subscribe()?;
        let vault = self.clone();

        Some(tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(mutation) => vault.apply(&mutation),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "vault invalidation listener lagged, clearing cache");
                        vault.invalidate_all();
                    }
                    Err(RecvError::Closed) => {
                        tracing::debug!("credential mutation feed closed");
                        break;
                    }
                }
            }
        }))
    }

    fn apply(&self, mutation: &KeyMutation) {
        let (user_id, provider_id) = mutation.target();
        tracing::debug!(user_id, provider_id, ?mutation, "applying credential mutation");
        self.invalidate(user_id, provider_id);
    }

    fn decrypt_record(&self, record: &ByokCredential) -> CacheValue {
        if !record.is_active {
            return None;
        }

        match self.inner.cipher.decrypt(&record.encrypted_key) {
            Ok(secret) => Some(Arc::new(DecryptedCredential {
                provider_id: record.provider_id.clone(),
                key_name: record.key_name.clone(),
                secret,
            })),
            Err(e) => {
                tracing::warn!(
                    user_id = %record.user_id,
                    provider_id = %record.provider_id,
                    error = %e,
                    "stored credential could not be decrypted"
                );
                None
            }
        }
    }

    /// Current generation for a user, created on first use
    fn generation(&self, user_id: &str) -> Generation {
        if let Some(generation) = self.inner.generations.get(&user_id.to_owned()) {
            return generation;
        }

        let generation = Arc::new(AtomicU64::new(0));
        self.inner
            .generations
            .insert(user_id.to_owned(), Arc::clone(&generation));
        generation
    }

    fn bump(&self, user_id: &str) {
        if let Some(generation) = self.inner.generations.get(&user_id.to_owned()) {
            generation.fetch_add(1, Ordering::AcqRel);
        }
    }

    /// Whether `generation` is still the user's live generation at `seen`
    fn is_current(&self, user_id: &str, generation: &Generation, seen: u64) -> bool {
        self.inner
            .generations
            .get(&user_id.to_owned())
            .is_some_and(|live| Arc::ptr_eq(&live, generation))
            && generation.load(Ordering::Acquire) == seen
    }

    fn populate(&self, generation: &Generation, seen: u64, key: CacheKey, value: CacheValue) {
        if !self.is_current(&key.0, generation, seen) {
            return;
        }

        self.inner.cache.insert(key.clone(), value);

        // An invalidation that raced the insert wins
        if !self.is_current(&key.0, generation, seen) {
            self.inner.cache.invalidate(&key);
        }
    }
}

impl std::fmt::Debug for CredentialVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialVault")
            .field("cached_entries", &self.inner.cache.entry_count())
            .finish_non_exhaustive()
    }
}
