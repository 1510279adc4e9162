//! Write path for the build graph
//!
//! Node upserts, edge inserts, extension registration, and the
//! classification rules applied while parsers stream records in.

use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};

use crate::graph::schema::TargetKind;
use crate::ingest::{BuildStatement, CMakeTarget, DepsEntry};

/// Return the id of the node for `path`, creating it if absent.
///
/// An existing node keeps its id; a supported incoming kind overwrites the
/// stored kind (last concrete write wins), an Unsupported incoming kind
/// leaves it untouched.
pub fn upsert_target(conn: &Connection, path: &str, kind: TargetKind) -> Result<i64> {
    let existing: Option<i64> = conn
        .query_row("SELECT id FROM targets WHERE path = ?1", params![path], |row| {
            row.get(0)
        })
        .optional()?;

    if let Some(id) = existing {
        if kind.is_supported() {
            conn.execute(
                "UPDATE targets SET type = ?1 WHERE id = ?2",
                params![kind.as_i64(), id],
            )?;
        }
        return Ok(id);
    }

    conn.execute(
        "INSERT INTO targets (path, type) VALUES (?1, ?2)",
        params![path, kind.as_i64()],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Insert the edge `from -> to`; duplicate inserts are no-ops.
pub fn insert_link(conn: &Connection, from_id: i64, to_id: i64) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO links (from_id, to_id) VALUES (?1, ?2)",
        params![from_id, to_id],
    )?;
    Ok(())
}

/// Remove all targets, links, and metadata. Extensions are kept; the
/// loader re-seeds defaults after a clear.
pub fn clear(conn: &Connection) -> Result<()> {
    conn.execute("DELETE FROM links", [])?;
    conn.execute("DELETE FROM targets", [])?;
    conn.execute("DELETE FROM metadata", [])?;
    Ok(())
}

pub fn set_metadata(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
        params![key, value],
    )?;
    Ok(())
}

/// Read a metadata value; missing keys read as the empty string.
pub fn get_metadata(conn: &Connection, key: &str) -> Result<String> {
    let value: Option<String> = conn
        .query_row("SELECT value FROM metadata WHERE key = ?1", params![key], |row| {
            row.get(0)
        })
        .optional()?;
    Ok(value.unwrap_or_default())
}

/// Register an extension mapping. Idempotent; kinds outside the admissible
/// set (SOURCE, HEADER, LIBRARY, INPUT) are silently ignored.
pub fn register_extension(conn: &Connection, ext: &str, kind: TargetKind) -> Result<()> {
    if !kind.is_extension_kind() {
        return Ok(());
    }
    conn.execute(
        "INSERT OR IGNORE INTO file_extensions (ext, type) VALUES (?1, ?2)",
        params![ext, kind.as_i64()],
    )?;
    Ok(())
}

/// Seed the default extension tables. Idempotent.
pub fn seed_default_extensions(conn: &Connection) -> Result<()> {
    use crate::graph::schema::{
        DEFAULT_HEADER_EXTS, DEFAULT_INPUT_EXTS, DEFAULT_LIBRARY_EXTS, DEFAULT_SOURCE_EXTS,
    };
    for ext in DEFAULT_SOURCE_EXTS {
        register_extension(conn, ext, TargetKind::Source)?;
    }
    for ext in DEFAULT_HEADER_EXTS {
        register_extension(conn, ext, TargetKind::Header)?;
    }
    for ext in DEFAULT_LIBRARY_EXTS {
        register_extension(conn, ext, TargetKind::Library)?;
    }
    for ext in DEFAULT_INPUT_EXTS {
        register_extension(conn, ext, TargetKind::Input)?;
    }
    Ok(())
}

/// Classify a path by its extension: `.o` is always an object file,
/// everything else goes through the persisted extension table.
///
/// The extension is the substring starting at the final `.` of the
/// basename; a basename without a dot is unsupported. Case-sensitive.
pub fn classify_path(conn: &Connection, path: &str) -> Result<TargetKind> {
    let basename = path.rsplit('/').next().unwrap_or(path);
    let Some(dot) = basename.rfind('.') else {
        return Ok(TargetKind::Unsupported);
    };
    let ext = &basename[dot..];

    if ext == ".o" {
        return Ok(TargetKind::Object);
    }

    let kind: Option<i64> = conn
        .query_row(
            "SELECT type FROM file_extensions WHERE ext = ?1 LIMIT 1",
            params![ext],
            |row| row.get(0),
        )
        .optional()?;
    Ok(kind.map(TargetKind::from_i64).unwrap_or(TargetKind::Unsupported))
}

/// Classify a build output from its rule name, falling back to the path.
///
/// The uppercase rule name is inspected unless it is CUSTOM_COMMAND:
/// EXECUTABLE means a linked binary, MODULE or LIBRARY a library. Rules
/// that match neither (compiles, code generators) fall back to the
/// extension of the output path.
pub fn classify(conn: &Connection, rule: &str, path: &str) -> Result<TargetKind> {
    if !rule.is_empty() {
        let upper = rule.to_ascii_uppercase();
        if upper != "CUSTOM_COMMAND" {
            if upper.contains("EXECUTABLE") {
                return Ok(TargetKind::Binary);
            }
            if upper.contains("MODULE") || upper.contains("LIBRARY") {
                return Ok(TargetKind::Library);
            }
        }
    }
    classify_path(conn, path)
}

/// Ingest one Ninja build statement.
///
/// Only the primary output is classified and inserted; if it is
/// unsupported the whole statement is skipped. Supported inputs from all
/// three classes get an `output -> input` edge.
pub fn insert_build_statement(conn: &Connection, stmt: &BuildStatement) -> Result<()> {
    let Some(target) = stmt.primary_output() else {
        return Ok(());
    };
    let kind = classify(conn, &stmt.rule, target)?;
    if !kind.is_supported() {
        return Ok(());
    }
    let target_id = upsert_target(conn, target, kind)?;

    for dep in stmt
        .explicit_inputs
        .iter()
        .chain(&stmt.implicit_inputs)
        .chain(&stmt.order_only_inputs)
    {
        let dep_kind = classify_path(conn, dep)?;
        if dep_kind.is_supported() {
            let dep_id = upsert_target(conn, dep, dep_kind)?;
            insert_link(conn, target_id, dep_id)?;
        }
    }
    Ok(())
}

/// Ingest one deps-log entry: the target plus its discovered header
/// dependencies. Unsupported targets and deps are skipped.
pub fn insert_deps_entry(conn: &Connection, entry: &DepsEntry) -> Result<()> {
    let kind = classify_path(conn, &entry.target)?;
    if !kind.is_supported() {
        return Ok(());
    }
    let target_id = upsert_target(conn, &entry.target, kind)?;

    for dep in &entry.deps {
        let dep_kind = classify_path(conn, dep)?;
        if dep_kind.is_supported() {
            let dep_id = upsert_target(conn, dep, dep_kind)?;
            insert_link(conn, target_id, dep_id)?;
        }
    }
    Ok(())
}

/// Ingest one CMake target: the node path is the CMake target *name*, the
/// kind derives from the CMake type string. Unknown types are skipped.
pub fn insert_cmake_target(conn: &Connection, target: &CMakeTarget) -> Result<()> {
    let kind = if target.type_name == "EXECUTABLE" {
        TargetKind::Binary
    } else if target.type_name.contains("LIBRARY") {
        TargetKind::Library
    } else {
        return Ok(());
    };
    let target_id = upsert_target(conn, &target.name, kind)?;

    for source in &target.sources {
        let source_kind = classify_path(conn, source)?;
        if source_kind.is_supported() {
            let source_id = upsert_target(conn, source, source_kind)?;
            insert_link(conn, target_id, source_id)?;
        }
    }
    Ok(())
}
