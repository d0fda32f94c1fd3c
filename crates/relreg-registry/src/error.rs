//! Error types for the registry crate.
//!
//! [`RegistryError`] covers everything that can go wrong while reading the
//! source dataset. Whether an error is fatal depends on where it happens: a
//! domain directory that cannot be listed stops that domain, while the same
//! error for a single entity only skips the entity.

use std::path::PathBuf;

use miette::Diagnostic;
use relreg_utils::error::FileSystemError;
use thiserror::Error;

/// Errors that can occur while reading the source dataset.
#[derive(Error, Diagnostic, Debug)]
pub enum RegistryError {
    #[error("Failed to read directory {path}")]
    #[diagnostic(
        code(relreg_registry::directory_unreadable),
        help("Check that the source root is correct and the directory is readable")
    )]
    DirectoryUnreadable {
        path: PathBuf,
        #[source]
        source: FileSystemError,
    },

    #[error("Document not found: {path}")]
    #[diagnostic(code(relreg_registry::entity_not_found))]
    EntityNotFound { path: PathBuf },

    #[error("Failed to read {path}: {source}")]
    #[diagnostic(code(relreg_registry::entity_read))]
    EntityRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    #[diagnostic(
        code(relreg_registry::entity_parse),
        help("The document must be a JSON object")
    )]
    EntityParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Malformed canonical id '{canonical}': {reason}")]
    #[diagnostic(
        code(relreg_registry::malformed_canonical),
        help("Canonical ids look like 'registry:name' or 'registry:namespace/name'")
    )]
    MalformedCanonical {
        canonical: String,
        reason: &'static str,
    },

    #[error("Error while {action}: {source}")]
    #[diagnostic(code(relreg_registry::io))]
    IoError {
        action: String,
        source: std::io::Error,
    },
}

impl RegistryError {
    /// Builds the error for a file that could not be read, keeping "missing" apart
    /// from other I/O failures.
    pub fn from_read(path: PathBuf, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            RegistryError::EntityNotFound { path }
        } else {
            RegistryError::EntityRead { path, source: err }
        }
    }
}

/// A specialized Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Extension trait for adding context to I/O errors.
pub trait ErrorContext<T> {
    /// Adds context to an error, describing what action was being performed.
    fn with_context<C>(self, context: C) -> Result<T>
    where
        C: FnOnce() -> String;
}

impl<T> ErrorContext<T> for std::io::Result<T> {
    fn with_context<C>(self, context: C) -> Result<T>
    where
        C: FnOnce() -> String,
    {
        self.map_err(|err| {
            RegistryError::IoError {
                action: context(),
                source: err,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    #[test]
    fn test_error_display() {
        let err = RegistryError::MalformedCanonical {
            canonical: "react".to_string(),
            reason: "missing ':' separator",
        };
        assert_eq!(
            err.to_string(),
            "Malformed canonical id 'react': missing ':' separator"
        );

        let err = RegistryError::EntityNotFound {
            path: PathBuf::from("/data/packages/npm/react/latest.json"),
        };
        assert_eq!(
            err.to_string(),
            "Document not found: /data/packages/npm/react/latest.json"
        );
    }

    #[test]
    fn test_from_read_distinguishes_not_found() {
        let path = PathBuf::from("latest.json");

        let err = RegistryError::from_read(path.clone(), io::Error::from(io::ErrorKind::NotFound));
        assert!(matches!(err, RegistryError::EntityNotFound { .. }));

        let err = RegistryError::from_read(path, io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(err, RegistryError::EntityRead { .. }));
    }

    #[test]
    fn test_with_context() {
        let result: io::Result<()> = Err(io::Error::other("boom"));
        let err = result.with_context(|| "reading marker".to_string()).unwrap_err();
        assert_eq!(err.to_string(), "Error while reading marker: boom");
    }
}
