use crate::assets::source::AssetError;
use crate::metadata::resolver::MetadataFetchError;

/// Convenience result type used across the compositor.
pub type RascalsResult<T> = Result<T, RascalsError>;

/// Top-level error taxonomy used by compositor APIs.
#[derive(thiserror::Error, Debug)]
pub enum RascalsError {
    /// Invalid user-provided or configuration data.
    #[error("validation error: {0}")]
    Validation(String),

    /// An image or data asset could not be fetched or decoded.
    #[error("asset error: {0}")]
    Asset(#[from] AssetError),

    /// Token metadata could not be resolved.
    #[error("metadata error: {0}")]
    Metadata(#[from] MetadataFetchError),

    /// Errors raised while compositing or encoding a frame.
    #[error("render error: {0}")]
    Render(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RascalsError {
    /// Build a [`RascalsError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`RascalsError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`RascalsError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
