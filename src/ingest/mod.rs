//! Parsers for the on-disk build descriptions
//!
//! Each parser streams plain records into a writer sink; parsers never
//! read back from the store. The store implements all three writer
//! traits, so ingestion is a single pass from file to tables.

mod cmake_reply;
mod ninja_build;
mod ninja_deps;

use anyhow::Result;

pub use cmake_reply::CMakeReplyParser;
pub use ninja_build::BuildFileParser;
pub use ninja_deps::DepsLogParser;

/// One `build ...:` statement from a Ninja file, after variable expansion
/// and path normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildStatement {
    /// Rule name, never expanded.
    pub rule: String,
    /// All declared outputs; the first one is the statement's target.
    pub outputs: Vec<String>,
    pub explicit_inputs: Vec<String>,
    pub implicit_inputs: Vec<String>,
    pub order_only_inputs: Vec<String>,
}

impl BuildStatement {
    /// The classified target of the statement. Secondary outputs are left
    /// for other statements or deps entries to claim.
    pub fn primary_output(&self) -> Option<&str> {
        self.outputs.first().map(String::as_str)
    }
}

/// One record from the `.ninja_deps` log: an output and the header
/// dependencies the compiler reported for it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DepsEntry {
    pub target: String,
    pub mtime: u64,
    pub deps: Vec<String>,
}

/// One target from the CMake File API reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CMakeTarget {
    pub id: String,
    pub name: String,
    /// CMake type string, e.g. EXECUTABLE or STATIC_LIBRARY.
    pub type_name: String,
    pub sources: Vec<String>,
}

/// Sink for Ninja build statements.
pub trait BuildWriter {
    fn insert_build_statement(&mut self, stmt: &BuildStatement) -> Result<()>;
}

/// Sink for deps-log entries.
pub trait DepsWriter {
    fn insert_deps_entry(&mut self, entry: &DepsEntry) -> Result<()>;
}

/// Sink for CMake reply targets.
pub trait CMakeTargetWriter {
    fn insert_cmake_target(&mut self, target: &CMakeTarget) -> Result<()>;
}
