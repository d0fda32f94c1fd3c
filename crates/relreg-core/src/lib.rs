use error::BuildError;

pub mod error;
pub mod layout;
pub mod writer;

pub use writer::OutputWriter;

pub type BuildResult<T> = std::result::Result<T, BuildError>;
