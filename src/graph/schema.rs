//! Store schema for the build graph
//!
//! Defines the target kind enumeration, the SQLite table layout, and the
//! seeded default extension tables.

use std::path::Path;

use rusqlite::Connection;
use serde::Serialize;

use crate::error::KunaiError;

/// Kind of a node in the build graph.
///
/// Persisted as a small integer; the numeric values are part of the on-disk
/// format and must not be reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TargetKind {
    Unsupported = 0,
    Source = 1,
    Header = 2,
    Object = 3,
    Library = 4,
    Binary = 5,
    Input = 6,
}

impl TargetKind {
    pub fn as_i64(self) -> i64 {
        self as i64
    }

    /// Decode a persisted kind value. Unknown values decode as Unsupported.
    pub fn from_i64(value: i64) -> Self {
        match value {
            1 => TargetKind::Source,
            2 => TargetKind::Header,
            3 => TargetKind::Object,
            4 => TargetKind::Library,
            5 => TargetKind::Binary,
            6 => TargetKind::Input,
            _ => TargetKind::Unsupported,
        }
    }

    pub fn is_supported(self) -> bool {
        self != TargetKind::Unsupported
    }

    /// Whether this kind may appear in the file_extensions table.
    pub fn is_extension_kind(self) -> bool {
        matches!(
            self,
            TargetKind::Source | TargetKind::Header | TargetKind::Library | TargetKind::Input
        )
    }
}

/// Default extension tables, written into `file_extensions` at seed time.
pub const DEFAULT_SOURCE_EXTS: &[&str] = &[".c", ".cc", ".cpp", ".cxx", ".inl"];
pub const DEFAULT_HEADER_EXTS: &[&str] = &[".h", ".hh", ".hpp", ".hxx", ".tpp", ".inc"];
pub const DEFAULT_LIBRARY_EXTS: &[&str] =
    &[".a", ".so", ".dylib", ".lib", ".dll", ".dll.a", ".framework"];
pub const DEFAULT_INPUT_EXTS: &[&str] = &[".ini", ".log", ".txt", ".xml", ".csv", ".bin"];

const SCHEMA_SQL: &str = "
    CREATE TABLE IF NOT EXISTS targets (
        id INTEGER PRIMARY KEY,
        path TEXT UNIQUE NOT NULL,
        type INTEGER DEFAULT 0
    );

    CREATE TABLE IF NOT EXISTS links (
        from_id INTEGER NOT NULL,
        to_id INTEGER NOT NULL,
        PRIMARY KEY (from_id, to_id),
        FOREIGN KEY (from_id) REFERENCES targets(id),
        FOREIGN KEY (to_id) REFERENCES targets(id)
    );

    CREATE TABLE IF NOT EXISTS metadata (
        key TEXT PRIMARY KEY,
        value TEXT
    );

    CREATE TABLE IF NOT EXISTS file_extensions (
        id INTEGER PRIMARY KEY,
        ext TEXT NOT NULL,
        type INTEGER NOT NULL,
        UNIQUE(ext, type)
    );

    CREATE INDEX IF NOT EXISTS idx_links_to ON links(to_id);
    CREATE INDEX IF NOT EXISTS idx_links_from ON links(from_id);
    CREATE INDEX IF NOT EXISTS idx_targets_type ON targets(type);
";

/// Create all tables and indices if absent.
pub fn create_schema(conn: &Connection, db_path: &Path) -> Result<(), KunaiError> {
    conn.execute_batch(SCHEMA_SQL)
        .map_err(|source| KunaiError::Schema {
            path: db_path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_roundtrip() {
        for value in 0..=6 {
            assert_eq!(TargetKind::from_i64(value).as_i64(), value);
        }
    }

    #[test]
    fn test_unknown_kind_decodes_as_unsupported() {
        assert_eq!(TargetKind::from_i64(42), TargetKind::Unsupported);
        assert_eq!(TargetKind::from_i64(-1), TargetKind::Unsupported);
    }

    #[test]
    fn test_extension_kinds() {
        assert!(TargetKind::Source.is_extension_kind());
        assert!(TargetKind::Header.is_extension_kind());
        assert!(TargetKind::Library.is_extension_kind());
        assert!(TargetKind::Input.is_extension_kind());
        assert!(!TargetKind::Object.is_extension_kind());
        assert!(!TargetKind::Binary.is_extension_kind());
        assert!(!TargetKind::Unsupported.is_extension_kind());
    }
}
