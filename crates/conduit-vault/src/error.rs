/// Credential vault errors
///
/// Messages never include key material.
#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    /// The backing credential store could not be reached
    #[error("credential store unavailable: {0}")]
    Unavailable(String),

    /// Stored ciphertext could not be decrypted
    #[error("credential decryption failed")]
    Decrypt,

    /// Plaintext could not be encrypted
    #[error("credential encryption failed")]
    Encrypt,

    /// The configured encryption key is unusable
    #[error("invalid vault encryption key: {0}")]
    InvalidKey(String),

    /// A credentials document could not be parsed
    #[error("failed to parse credentials: {0}")]
    Parse(String),
}
