//! Error types for configuration, composition and template emission.

use crate::core::parser::ValidationError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SynthError {
    #[error("cannot access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{} configuration error(s): {}", .0.len(), join_messages(.0))]
    Invalid(Vec<ValidationError>),

    #[error("cannot load environment file {}: {source}", .path.display())]
    EnvFile {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },

    #[error("stack '{stack}': {message}")]
    Composition { stack: String, message: String },

    #[error("stack '{stack}': dependency cycle detected involving: {members}")]
    Cycle { stack: String, members: String },
}

impl SynthError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn composition(stack: &str, message: impl Into<String>) -> Self {
        Self::Composition {
            stack: stack.to_string(),
            message: message.into(),
        }
    }
}

fn join_messages(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type for synthesis operations
pub type Result<T> = std::result::Result<T, SynthError>;
