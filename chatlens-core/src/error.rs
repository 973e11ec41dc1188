//! Error types for chatlens-core

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the chatlens-core library
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed message batch document
    #[error("malformed message batch {path}: {source}")]
    Batch {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Conversation name not present in the configured table
    #[error("unknown conversation: {0}")]
    UnknownConversation(String),

    /// Conversation folder has no message batches at all
    #[error("conversation folder {0} contains no message batches")]
    EmptyConversation(PathBuf),

    /// Self identifier missing from a participant set or table
    #[error("'{name}' is not a participant of {context}")]
    SelfNotParticipant { name: String, context: String },

    /// Metric computed over zero qualifying messages
    #[error("no data for metric: {metric}")]
    EmptyData { metric: String },

    /// Derived computation given tables that do not share an axis
    #[error("table shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Chart backend failure
    #[error("render error: {0}")]
    Render(String),
}

/// Result type alias for chatlens-core
pub type Result<T> = std::result::Result<T, Error>;
