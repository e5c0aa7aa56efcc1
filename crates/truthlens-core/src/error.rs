//! Error types for TruthLens

/// Result type alias using TruthLens's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for TruthLens operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Pretrained artifact is missing, unreadable, or structurally invalid
    #[error("artifact error: {0}")]
    Artifact(String),

    /// Canonical label order disagrees between artifacts
    #[error("label order error: {0}")]
    LabelOrder(String),

    /// Classifier execution errors (tokenization, tensor ops, forward pass)
    #[error("classifier error: {0}")]
    Classifier(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Filesystem/IO errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new artifact error
    pub fn artifact(msg: impl Into<String>) -> Self {
        Self::Artifact(msg.into())
    }

    /// Create a new label order error
    pub fn label_order(msg: impl Into<String>) -> Self {
        Self::LabelOrder(msg.into())
    }

    /// Create a new classifier error
    pub fn classifier(msg: impl Into<String>) -> Self {
        Self::Classifier(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
