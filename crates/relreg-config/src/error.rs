use miette::Diagnostic;
use relreg_utils::error::{FileSystemError, PathError, UtilsError};
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum ConfigError {
    #[error("TOML serialization error: {0}")]
    #[diagnostic(
        code(relreg_config::toml_serialize),
        help("Check your configuration structure for invalid values")
    )]
    TomlSerError(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    #[diagnostic(
        code(relreg_config::toml_deserialize),
        help("Check your config.toml syntax and structure")
    )]
    TomlDeError(#[from] toml::de::Error),

    #[error("Configuration file already exists: {0}")]
    #[diagnostic(
        code(relreg_config::already_exists),
        help("Remove the existing config file or pass a different --config path")
    )]
    ConfigAlreadyExists(String),

    #[error("Invalid worker count: {0}")]
    #[diagnostic(
        code(relreg_config::invalid_workers),
        help("build.max_workers must be greater than zero")
    )]
    InvalidWorkerCount(usize),

    #[error("Invalid namespace marker: {0:?}")]
    #[diagnostic(
        code(relreg_config::invalid_namespace_marker),
        help("build.namespace_marker must be a plain file name such as __NAMESPACE__")
    )]
    InvalidNamespaceMarker(String),

    #[error("Invalid port in {var}: {value}")]
    #[diagnostic(
        code(relreg_config::invalid_port),
        help("Ports must be integers between 1 and 65535")
    )]
    InvalidPort { var: String, value: String },

    #[error("IO error: {0}")]
    #[diagnostic(code(relreg_config::io))]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    #[diagnostic(code(relreg_config::utils))]
    Utils(#[from] UtilsError),

    #[error("Failed to parse TOML: {0}")]
    #[diagnostic(code(relreg_config::toml))]
    Toml(#[from] toml_edit::TomlError),

    #[error("Encountered unexpected TOML item: {0}")]
    #[diagnostic(code(relreg_config::unexpected_toml_item))]
    UnexpectedTomlItem(String),
}

impl From<PathError> for ConfigError {
    fn from(err: PathError) -> Self {
        Self::Utils(UtilsError::Path(err))
    }
}

impl From<FileSystemError> for ConfigError {
    fn from(err: FileSystemError) -> Self {
        Self::Utils(UtilsError::FileSystem(err))
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;
