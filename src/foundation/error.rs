/// Convenience result type used across memegen.
pub type MemegenResult<T> = Result<T, MemegenError>;

/// Top-level error taxonomy used by the generation pipeline.
#[derive(thiserror::Error, Debug)]
pub enum MemegenError {
    /// Invalid user-provided, schedule or configuration data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Malformed or truncated source image bytes.
    #[error("decode error: {0}")]
    Decode(String),

    /// Failures while producing the output artifact.
    #[error("encode error: {0}")]
    Encode(String),

    /// Asset fetch failures. Never retried by the core.
    #[error("transport error: {0}")]
    Transport(String),

    /// Text shaping or rasterisation failures.
    #[error("render error: {0}")]
    Render(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MemegenError {
    /// Build a [`MemegenError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`MemegenError::Decode`] value.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`MemegenError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build a [`MemegenError::Transport`] value.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Build a [`MemegenError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }
}

impl From<gif::DecodingError> for MemegenError {
    fn from(e: gif::DecodingError) -> Self {
        Self::Decode(e.to_string())
    }
}

impl From<gif::EncodingError> for MemegenError {
    fn from(e: gif::EncodingError) -> Self {
        Self::Encode(e.to_string())
    }
}

impl From<serde_json::Error> for MemegenError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serde(e.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
