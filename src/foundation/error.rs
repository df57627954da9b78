/// Convenience result type used across lxgrid.
pub type LxResult<T> = Result<T, LxError>;

/// Top-level error taxonomy used by engine and output APIs.
///
/// Datagram send failures never appear here: they are logged and counted by the
/// output stage so a flaky network cannot stall the animation loop.
#[derive(thiserror::Error, Debug)]
pub enum LxError {
    /// Geometry, node map or playlist configuration is inconsistent.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A caller-supplied argument was rejected; engine state is unchanged.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Errors when serializing or deserializing configuration documents.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LxError {
    /// Build a [`LxError::Configuration`] value.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Build a [`LxError::InvalidInput`] value.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Build a [`LxError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
