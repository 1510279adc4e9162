//! Freshness verdict for the persisted graph
//!
//! Decides whether the store must be rebuilt from the on-disk Ninja files.
//! Modification times gate the check: only a file whose mtime differs from
//! the stored value (or a forced run) pays for a SHA-1 pass, and only a
//! hash mismatch marks the file as changed.

use std::fs;
use std::path::Path;
use std::time::UNIX_EPOCH;

use anyhow::Result;
use sha1::{Digest, Sha1};

use crate::graph::BuildGraph;

pub const META_BUILD_NINJA_SHA1: &str = "build_ninja_sha1";
pub const META_NINJA_DEPS_SHA1: &str = "ninja_deps_sha1";
pub const META_BUILD_NINJA_TIME: &str = "build_ninja_time";
pub const META_NINJA_DEPS_TIME: &str = "ninja_deps_time";

/// Outcome of the freshness check for one input file.
#[derive(Debug, Clone, Default)]
pub struct FileStatus {
    /// Content hash differs from the stored one (or the run was forced).
    pub changed: bool,
    /// Hex SHA-1, present only when the mtime gate made us compute it.
    pub sha1: Option<String>,
    /// Current mtime in integer nanoseconds since epoch; 0 if missing.
    pub mtime_nanos: u128,
}

/// Freshness verdict for both Ninja inputs.
#[derive(Debug, Clone, Default)]
pub struct FreshnessStatus {
    pub build_ninja: FileStatus,
    pub ninja_deps: FileStatus,
}

impl FreshnessStatus {
    pub fn needs_rebuild(&self) -> bool {
        self.build_ninja.changed || self.ninja_deps.changed
    }
}

/// Modification time as nanoseconds since epoch; missing files read as 0.
pub fn mtime_nanos(path: &Path) -> u128 {
    fs::metadata(path)
        .and_then(|meta| meta.modified())
        .ok()
        .and_then(|mtime| mtime.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_nanos())
        .unwrap_or(0)
}

/// Hex SHA-1 of a file's contents; unreadable files hash to the empty
/// string (matching the stored default for never-seen files).
pub fn sha1_hex_of_file(path: &Path) -> String {
    match fs::read(path) {
        Ok(bytes) => {
            let mut hasher = Sha1::new();
            hasher.update(&bytes);
            hex::encode(hasher.finalize())
        }
        Err(_) => String::new(),
    }
}

fn check_file(
    graph: &BuildGraph,
    path: &Path,
    time_key: &str,
    sha_key: &str,
    force: bool,
) -> Result<FileStatus> {
    let mut status = FileStatus {
        mtime_nanos: mtime_nanos(path),
        ..FileStatus::default()
    };

    let stored_time = graph.get_metadata(time_key)?;
    let time_changed = stored_time.is_empty() || stored_time != status.mtime_nanos.to_string();

    if time_changed || force {
        let sha1 = sha1_hex_of_file(path);
        let stored_sha1 = graph.get_metadata(sha_key)?;
        status.changed = force || sha1 != stored_sha1;
        status.sha1 = Some(sha1);
    }

    Ok(status)
}

/// Compute the freshness verdict for `build.ninja` and `.ninja_deps`
/// against the metadata stored in `graph`.
pub fn check_freshness(graph: &BuildGraph, build_dir: &Path, force: bool) -> Result<FreshnessStatus> {
    Ok(FreshnessStatus {
        build_ninja: check_file(
            graph,
            &build_dir.join("build.ninja"),
            META_BUILD_NINJA_TIME,
            META_BUILD_NINJA_SHA1,
            force,
        )?,
        ninja_deps: check_file(
            graph,
            &build_dir.join(".ninja_deps"),
            META_NINJA_DEPS_TIME,
            META_NINJA_DEPS_SHA1,
            force,
        )?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha1_of_missing_file_is_empty() {
        assert_eq!(sha1_hex_of_file(Path::new("/nonexistent/file")), "");
    }

    #[test]
    fn test_mtime_of_missing_file_is_zero() {
        assert_eq!(mtime_nanos(Path::new("/nonexistent/file")), 0);
    }

    #[test]
    fn test_sha1_known_vector() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("probe.txt");
        std::fs::write(&file, b"abc").unwrap();
        // FIPS 180-1 test vector for "abc"
        assert_eq!(
            sha1_hex_of_file(&file),
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
    }
}
