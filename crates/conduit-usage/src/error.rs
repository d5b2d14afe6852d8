/// Usage recording errors
#[derive(Debug, thiserror::Error)]
pub enum UsageError {
    /// The usage store rejected or failed the write
    #[error("failed to persist usage record: {0}")]
    Persistence(String),

    /// The record could not be serialized
    #[error("failed to serialize usage record: {0}")]
    Serialization(String),
}

impl From<std::io::Error> for UsageError {
    fn from(e: std::io::Error) -> Self {
        Self::Persistence(e.to_string())
    }
}

impl From<serde_json::Error> for UsageError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
