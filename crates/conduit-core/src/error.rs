//! Catalog validation errors

use thiserror::Error;

/// Errors raised while building a catalog snapshot
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A provider or model identifier was blank
    #[error("empty identifier in {context}")]
    EmptyId { context: String },

    /// Two providers share the same identifier
    #[error("duplicate provider id: {provider_id}")]
    DuplicateProvider { provider_id: String },

    /// Two models under one provider share the same identifier
    #[error("duplicate model id '{model_id}' for provider '{provider_id}'")]
    DuplicateModel { provider_id: String, model_id: String },

    /// Price was negative, NaN or infinite
    #[error("invalid price for model '{model_id}' of provider '{provider_id}': {value}")]
    InvalidPrice {
        provider_id: String,
        model_id: String,
        value: f64,
    },

    /// Catalog document could not be parsed
    #[error("failed to parse catalog: {0}")]
    Parse(String),
}
