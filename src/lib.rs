//! Kunai: a query accelerator for Ninja build graphs
//!
//! Kunai ingests a Ninja build directory (the textual `build.ninja`, the
//! binary `.ninja_deps` log, and optionally the CMake File API reply) into
//! a typed dependency graph persisted in SQLite, then answers two
//! questions fast: which targets of a given kind exist, and which
//! binaries or libraries must be rebuilt when a given source file
//! changes.
//!
//! The store lives at `kunai.db` inside the build directory and is only
//! refilled when the SHA-1 of an input file actually changed; unchanged
//! runs are read-only.

pub mod common;
pub mod error;
pub mod graph;
pub mod ingest;
pub mod loader;
pub mod output;

// Re-export the public surface
pub use error::KunaiError;
pub use graph::{BuildGraph, StatCounters, StatTimings, Stats, TargetKind};
pub use loader::{ExtensionOverrides, Loader, DB_FILE_NAME};
pub use output::OutputFormat;
