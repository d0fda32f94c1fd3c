//! Error types for relreg-core.

use std::path::PathBuf;

use miette::Diagnostic;
use relreg_config::error::ConfigError;
use relreg_events::Domain;
use relreg_registry::RegistryError;
use relreg_utils::error::FileSystemError;
use thiserror::Error;

/// Error type for build and serve operations.
#[derive(Error, Diagnostic, Debug)]
pub enum BuildError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Registry(#[from] RegistryError),

    #[error("Failed to prepare output directory {path}: {source}")]
    #[diagnostic(
        code(relreg::output_root),
        help("Check that the output path is writable and not used by another process")
    )]
    OutputRoot {
        path: PathBuf,
        source: FileSystemError,
    },

    #[error("Failed to write {path}: {source}")]
    #[diagnostic(code(relreg::write), help("Check file permissions and disk space"))]
    Write {
        path: PathBuf,
        source: FileSystemError,
    },

    #[error("Failed to serialize {path}: {source}")]
    #[diagnostic(code(relreg::serialize))]
    Serialize {
        path: String,
        source: serde_json::Error,
    },

    #[error("Refusing to write outside the output tree: {0}")]
    #[diagnostic(
        code(relreg::unsafe_path),
        help("Entity ids must not contain empty, '.' or '..' path segments")
    )]
    UnsafePath(String),

    #[error("Failed to generate {domain}: {source}")]
    #[diagnostic(code(relreg::domain))]
    Domain {
        domain: Domain,
        source: Box<BuildError>,
    },

    #[error("Failed to start worker pool: {0}")]
    #[diagnostic(
        code(relreg::worker_pool),
        help("Lower build.max_workers or run with --sequential")
    )]
    WorkerPool(String),

    #[error("Error while {action}")]
    #[diagnostic(code(relreg::io), help("Check file permissions and disk space"))]
    IoError {
        action: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    #[diagnostic(code(relreg::error))]
    Custom(String),
}

impl BuildError {
    /// Wraps an error as the failure of one domain.
    pub fn in_domain(self, domain: Domain) -> Self {
        BuildError::Domain {
            domain,
            source: Box::new(self),
        }
    }

    /// The domain a failure belongs to, if it is a domain failure.
    pub fn domain(&self) -> Option<Domain> {
        match self {
            BuildError::Domain { domain, .. } => Some(*domain),
            _ => None,
        }
    }
}

pub trait ErrorContext<T> {
    fn with_context<C>(self, context: C) -> std::result::Result<T, BuildError>
    where
        C: FnOnce() -> String;
}

impl<T> ErrorContext<T> for std::io::Result<T> {
    fn with_context<C>(self, context: C) -> std::result::Result<T, BuildError>
    where
        C: FnOnce() -> String,
    {
        self.map_err(|err| {
            BuildError::IoError {
                action: context(),
                source: err,
            }
        })
    }
}
