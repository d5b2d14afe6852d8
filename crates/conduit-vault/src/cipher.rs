use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};

use crate::VaultError;

/// AES-GCM nonce length in bytes
const NONCE_LEN: usize = 12;

/// AES-256 key length in bytes
const KEY_LEN: usize = 32;

/// Process-wide symmetric cipher for BYOK credentials
///
/// Ciphertext is `base64(nonce || aes-256-gcm(plaintext))` with a fresh
/// random nonce per encryption.
#[derive(Clone)]
pub struct CredentialCipher {
    cipher: Aes256Gcm,
}

impl CredentialCipher {
    /// Build a cipher from configured key material
    ///
    /// Base64 of exactly 32 bytes is used as the raw key; anything else
    /// is treated as a passphrase and hashed with SHA-256.
    pub fn new(key_material: &SecretString) -> Result<Self, VaultError> {
        let material = key_material.expose_secret().trim();
        if material.is_empty() {
            return Err(VaultError::InvalidKey("key material is empty".to_owned()));
        }

        let mut key_bytes = [0_u8; KEY_LEN];
        match BASE64.decode(material) {
            Ok(raw) if raw.len() == KEY_LEN => key_bytes.copy_from_slice(&raw),
            _ => key_bytes.copy_from_slice(&Sha256::digest(material.as_bytes())),
        }

        let key = Key::<Aes256Gcm>::from_slice(&key_bytes);
        Ok(Self {
            cipher: Aes256Gcm::new(key),
        })
    }

    /// Encrypt a plaintext provider key
    pub fn encrypt(&self, plaintext: &SecretString) -> Result<String, VaultError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.expose_secret().as_bytes())
            .map_err(|_| VaultError::Encrypt)?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&ciphertext);

        Ok(BASE64.encode(sealed))
    }

    /// Decrypt a stored provider key
    pub fn decrypt(&self, encoded: &str) -> Result<SecretString, VaultError> {
        let sealed = BASE64.decode(encoded.trim()).map_err(|_| VaultError::Decrypt)?;
        if sealed.len() <= NONCE_LEN {
            return Err(VaultError::Decrypt);
        }

        let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| VaultError::Decrypt)?;

        String::from_utf8(plaintext)
            .map(SecretString::from)
            .map_err(|_| VaultError::Decrypt)
    }
}

impl std::fmt::Debug for CredentialCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialCipher").finish_non_exhaustive()
    }
}
