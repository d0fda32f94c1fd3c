//! Build pipeline of the release registry.
//!
//! [`build`] turns the source dataset into the static JSON tree:
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use relreg_events::NullSink;
//! use relreg_operations::{build, BuildOptions};
//!
//! let options = BuildOptions::new("..", "./dist").max_workers(8);
//! let report = build(options, Arc::new(NullSink))?;
//! println!("{}", report.summary());
//! # Ok::<(), relreg_core::error::BuildError>(())
//! ```

pub mod build;
pub mod cache;
pub mod context;
pub mod domains;
pub mod types;

pub use build::{build, run};
pub use cache::PackageCache;
pub use context::{BuildContext, BuildOptions};
pub use types::*;
