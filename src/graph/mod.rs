//! Graph persistence layer over SQLite
mod freshness;
mod ops;
mod query;
mod schema;

use std::path::{Path, PathBuf};

use anyhow::Result;
use rusqlite::Connection;

use crate::error::KunaiError;
use crate::ingest::{BuildStatement, BuildWriter, CMakeTarget, CMakeTargetWriter, DepsEntry, DepsWriter};

// Re-export public types
pub use freshness::{
    check_freshness, mtime_nanos, sha1_hex_of_file, FileStatus, FreshnessStatus,
    META_BUILD_NINJA_SHA1, META_BUILD_NINJA_TIME, META_NINJA_DEPS_SHA1, META_NINJA_DEPS_TIME,
};
pub use query::{StatCounters, StatTimings, Stats};
pub use schema::{
    TargetKind, DEFAULT_HEADER_EXTS, DEFAULT_INPUT_EXTS, DEFAULT_LIBRARY_EXTS, DEFAULT_SOURCE_EXTS,
};

/// Persistent typed multigraph of build targets.
///
/// Owns the SQLite connection exclusively; parsers reach it only through
/// the writer traits, queries only through the methods here. Dropping the
/// graph releases the store.
pub struct BuildGraph {
    conn: Connection,
    db_path: PathBuf,
}

impl BuildGraph {
    /// Open or create the store at `db_path`, creating the schema and
    /// seeding the default extension tables if absent.
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();
        let conn = Connection::open(&db_path).map_err(|source| KunaiError::Schema {
            path: db_path.clone(),
            source,
        })?;
        schema::create_schema(&conn, &db_path)?;
        let graph = Self { conn, db_path };
        graph.seed_default_extensions()?;
        Ok(graph)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn begin(&self) -> Result<()> {
        self.exec_tx("BEGIN TRANSACTION", "begin transaction")
    }

    pub fn commit(&self) -> Result<()> {
        self.exec_tx("COMMIT", "commit")
    }

    pub fn rollback(&self) -> Result<()> {
        self.exec_tx("ROLLBACK", "rollback")
    }

    fn exec_tx(&self, sql: &str, op: &'static str) -> Result<()> {
        self.conn
            .execute_batch(sql)
            .map_err(|source| KunaiError::Transaction { op, source })?;
        Ok(())
    }

    /// Remove all targets, links, and metadata; extensions survive.
    pub fn clear(&self) -> Result<()> {
        ops::clear(&self.conn)
    }

    pub fn seed_default_extensions(&self) -> Result<()> {
        ops::seed_default_extensions(&self.conn)
    }

    /// Register one extension mapping; non-admissible kinds are ignored.
    pub fn register_extension(&self, ext: &str, kind: TargetKind) -> Result<()> {
        ops::register_extension(&self.conn, ext, kind)
    }

    /// Classify a path through the `.o` rule and the extension table.
    pub fn classify_path(&self, path: &str) -> Result<TargetKind> {
        ops::classify_path(&self.conn, path)
    }

    /// Return the id for `path`, creating the node if absent; a supported
    /// incoming kind overwrites the stored one.
    pub fn upsert_target(&self, path: &str, kind: TargetKind) -> Result<i64> {
        ops::upsert_target(&self.conn, path, kind)
    }

    /// Insert the dependency edge `from -> to`; idempotent.
    pub fn insert_link(&self, from_id: i64, to_id: i64) -> Result<()> {
        ops::insert_link(&self.conn, from_id, to_id)
    }

    pub fn set_metadata(&self, key: &str, value: &str) -> Result<()> {
        ops::set_metadata(&self.conn, key, value)
    }

    /// Missing keys read as the empty string.
    pub fn get_metadata(&self, key: &str) -> Result<String> {
        ops::get_metadata(&self.conn, key)
    }

    /// All node paths of the given kind.
    pub fn all_of_kind(&self, kind: TargetKind) -> Result<Vec<String>> {
        query::all_of_kind(&self.conn, kind)
    }

    /// Nodes of `kind` from which any seed (by path equality or substring
    /// containment) is reachable following edges forward.
    pub fn reachable_reverse(&self, seeds: &[String], kind: TargetKind) -> Result<Vec<String>> {
        query::reachable_reverse(&self.conn, seeds, kind)
    }

    /// Counters per kind plus last recorded timings. Computed on demand.
    pub fn stats(&self) -> Result<Stats> {
        query::stats(&self.conn)
    }
}

impl BuildWriter for BuildGraph {
    fn insert_build_statement(&mut self, stmt: &BuildStatement) -> Result<()> {
        ops::insert_build_statement(&self.conn, stmt)
    }
}

impl DepsWriter for BuildGraph {
    fn insert_deps_entry(&mut self, entry: &DepsEntry) -> Result<()> {
        ops::insert_deps_entry(&self.conn, entry)
    }
}

impl CMakeTargetWriter for BuildGraph {
    fn insert_cmake_target(&mut self, target: &CMakeTarget) -> Result<()> {
        ops::insert_cmake_target(&self.conn, target)
    }
}
