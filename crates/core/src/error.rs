use thiserror::Error;

/// Result type alias for deckhand-core
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for the deckhand harness
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error for file operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors (fatal at startup)
    #[error("configuration error: {0}")]
    Config(String),

    /// Agent-loop errors
    #[error("agent loop error: {0}")]
    Loop(String),

    /// Tool execution errors
    #[error("tool error: {0}")]
    Tool(String),

    /// Skill registry/manifest errors
    #[error("skill error: {0}")]
    Skill(String),

    /// Parse/serialization errors
    #[error("parse error: {0}")]
    Parse(String),

    /// Validation errors
    #[error("validation error: {0}")]
    Validation(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Construct a configuration error from any displayable cause.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Construct a skill error from any displayable cause.
    pub fn skill(msg: impl Into<String>) -> Self {
        Error::Skill(msg.into())
    }

    /// Construct a tool error from any displayable cause.
    pub fn tool(msg: impl Into<String>) -> Self {
        Error::Tool(msg.into())
    }
}
