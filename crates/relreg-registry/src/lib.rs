//! Source dataset model for the release registry builder.
//!
//! This crate reads the on-disk dataset the registry is built from:
//!
//! - [`CanonicalId`]: `registry:path` package identifiers
//! - [`SourceTree`]: locates and reads entity documents, discovers packages
//!   (expanding namespace directories) and lists versions
//! - [`PackageRecord`]: the normalized package document
//! - [`versions`]: semantic-version ordering of version labels
//!
//! Nothing here writes; producing the output tree is the job of the build
//! operations.

pub mod canonical;
pub mod error;
pub mod package;
pub mod reader;
pub mod versions;

pub use canonical::CanonicalId;
pub use error::{ErrorContext, RegistryError, Result};
pub use package::PackageRecord;
pub use reader::{Discovery, SourceTree};
pub use versions::{compare_versions, list_versions, sort_versions};

/// Label of the document every entity keeps for its current version.
pub const LATEST: &str = "latest";

/// Extension of every document in the source and output trees.
pub const JSON_EXTENSION: &str = ".json";

/// Default marker file name that turns a package directory into a namespace.
pub const DEFAULT_NAMESPACE_MARKER: &str = "__NAMESPACE__";
