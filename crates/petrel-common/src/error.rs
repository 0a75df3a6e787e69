//! Unified error types for the Petrel workspace.
//!
//! Resolution failures carry the exact `(kind, name)` pair of the missing
//! resource so the operator knows what to create. Validation findings are
//! not errors; they live in `petrel-config`'s `ValidationReport`.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::ResourceKind;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum PetrelError {
    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A resource document could not be parsed or serialized.
    #[error("invalid YAML at {path}: {source}")]
    Yaml {
        /// Path of the offending document.
        path: PathBuf,
        /// Underlying serde error.
        source: serde_yaml::Error,
    },

    /// A referenced resource does not exist.
    #[error("{kind} not found: {name}")]
    NotFound {
        /// Kind of the missing resource.
        kind: ResourceKind,
        /// Name of the missing resource.
        name: String,
    },

    /// A project was given both a local directory and a repository URL.
    #[error("project {name}: --dir and --repo are mutually exclusive")]
    ConflictingSource {
        /// Name of the offending project.
        name: String,
    },

    /// A resource value is malformed.
    #[error("invalid resource: {message}")]
    InvalidResource {
        /// Description of the problem.
        message: String,
    },

    /// A container-engine or git subprocess failed.
    #[error("engine error: {message}")]
    Engine {
        /// Description of the failure.
        message: String,
    },
}

impl PetrelError {
    /// Shorthand for a `NotFound` error.
    #[must_use]
    pub fn not_found(kind: ResourceKind, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }

    /// Wraps an I/O error with the path it occurred at.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, PetrelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_names_kind_and_resource() {
        let err = PetrelError::not_found(ResourceKind::Environment, "staging");
        assert_eq!(err.to_string(), "environment not found: staging");
    }

    #[test]
    fn conflicting_source_names_project() {
        let err = PetrelError::ConflictingSource { name: "demo".into() };
        assert!(err.to_string().contains("demo"));
        assert!(err.to_string().contains("mutually exclusive"));
    }
}
