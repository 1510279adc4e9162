//! Error taxonomy for the ingestion core
//!
//! Command modules wrap these in `anyhow::Result`; the variants exist so
//! that the distinct failure classes (I/O, wire format, store schema,
//! transaction control, missing build directory) stay distinguishable.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum KunaiError {
    /// A required file could not be opened or read.
    #[error("cannot open {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Binary signature, version, or record layout violation in an input.
    #[error("{0}")]
    Format(String),

    /// The relational store refused to create or open its tables.
    #[error("schema initialization failed for {}: {source}", path.display())]
    Schema {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// BEGIN/COMMIT/ROLLBACK failed.
    #[error("{op} failed: {source}")]
    Transaction {
        op: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    /// The build directory itself does not exist.
    #[error("build directory does not exist: {}", .0.display())]
    NotFound(PathBuf),
}

impl KunaiError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn format(msg: impl Into<String>) -> Self {
        Self::Format(msg.into())
    }
}
