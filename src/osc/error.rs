//! Error types for address patterns and dispatcher configuration.

use thiserror::Error;

/// An OSC address pattern that could not be compiled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("address pattern is empty")]
    Empty,

    #[error("address pattern must start with '/': {0:?}")]
    MissingLeadingSlash(String),

    #[error("unterminated character class starting at {position}")]
    UnterminatedClass { position: usize },

    #[error("unterminated alternatives starting at {position}")]
    UnterminatedAlternatives { position: usize },
}

/// Failure to read or write a dispatcher config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
