//! Project-level pipeline: file collection, parsing, indexing and analysis.

pub mod context;
pub mod file_scanner;

pub use context::CheckContext;
