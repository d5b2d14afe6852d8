use jiff::Timestamp;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// Stored BYOK credential
///
/// `encrypted_key` is the cipher output; plaintext never lives here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByokCredential {
    /// Owning user
    pub user_id: String,
    /// Provider the key authenticates against
    pub provider_id: String,
    /// `base64(nonce || ciphertext)`
    pub encrypted_key: String,
    /// User-facing label
    #[serde(default)]
    pub key_name: String,
    /// Revoked keys stay in the store with this cleared
    #[serde(default = "default_active")]
    pub is_active: bool,
    /// When the key was stored
    #[serde(default = "Timestamp::now")]
    pub created_at: Timestamp,
}

const fn default_active() -> bool {
    true
}

impl ByokCredential {
    /// New active credential stamped with the current time
    pub fn new(
        user_id: impl Into<String>,
        provider_id: impl Into<String>,
        key_name: impl Into<String>,
        encrypted_key: String,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            provider_id: provider_id.into(),
            encrypted_key,
            key_name: key_name.into(),
            is_active: true,
            created_at: Timestamp::now(),
        }
    }
}

/// Decrypted credential held in the vault cache
#[derive(Clone)]
pub struct DecryptedCredential {
    /// Provider the key authenticates against
    pub provider_id: String,
    /// User-facing label
    pub key_name: String,
    /// Plaintext provider key
    pub secret: SecretString,
}

impl DecryptedCredential {
    /// Plaintext key for the outbound provider call
    pub fn expose(&self) -> &str {
        self.secret.expose_secret()
    }
}

impl std::fmt::Debug for DecryptedCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecryptedCredential")
            .field("provider_id", &self.provider_id)
            .field("key_name", &self.key_name)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}
