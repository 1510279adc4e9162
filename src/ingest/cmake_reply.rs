//! Best-effort reader for the CMake File API reply
//!
//! When `<build_dir>/.cmake/api/v1/reply/` exists, follows the newest
//! index file to the codemodel and emits one record per target file.
//! The documents are machine-generated with one value per line, so a
//! line-based quoted-string extractor is all the JSON handling needed.

use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};

use crate::ingest::{CMakeTarget, CMakeTargetWriter};

pub struct CMakeReplyParser;

impl CMakeReplyParser {
    /// Absence of the reply directory is not an error; a malformed
    /// document skips the offending file.
    pub fn parse(build_dir: &Path, writer: &mut dyn CMakeTargetWriter) -> Result<()> {
        let reply_dir = build_dir.join(".cmake/api/v1/reply");
        if !reply_dir.is_dir() {
            return Ok(());
        }

        let Some(index) = latest_file(&reply_dir, "index-") else {
            return Err(anyhow!("no index file found in CMake reply directory"));
        };
        parse_index(&index, build_dir, writer)
    }
}

/// Newest reply file with the given prefix; reply files carry a timestamp
/// in the name, so lexicographic order is chronological.
fn latest_file(dir: &Path, prefix: &str) -> Option<PathBuf> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .ok()?
        .flatten()
        .filter(|entry| {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            name.starts_with(prefix) && name.contains(".json")
        })
        .map(|entry| entry.path())
        .collect();
    files.sort();
    files.pop()
}

/// Extract the quoted value of `"key": "value"` from one line.
fn extract_json_string(line: &str, key: &str) -> Option<String> {
    let key_pos = line.find(&format!("\"{}\"", key))?;
    let colon = line[key_pos..].find(':')? + key_pos;
    let first_quote = line[colon..].find('"')? + colon;
    let second_quote = line[first_quote + 1..].find('"')? + first_quote + 1;
    Some(line[first_quote + 1..second_quote].to_string())
}

fn parse_index(index: &Path, build_dir: &Path, writer: &mut dyn CMakeTargetWriter) -> Result<()> {
    let file = File::open(index)?;
    let mut lines = BufReader::new(file).lines();

    let mut codemodel_file = String::new();
    while let Some(line) = lines.next().transpose()? {
        if !line.contains("codemodel-v2") {
            continue;
        }
        // The reference is either on the marker line itself (CMake writes
        // keys alphabetically, jsonFile before kind) or a few lines away.
        if let Some(json_file) = extract_json_string(&line, "jsonFile") {
            if json_file.contains("codemodel-v2") {
                codemodel_file = json_file;
                break;
            }
        }
        for _ in 0..10 {
            let Some(next) = lines.next().transpose()? else {
                break;
            };
            if let Some(json_file) = extract_json_string(&next, "jsonFile") {
                if json_file.contains("codemodel-v2") {
                    codemodel_file = json_file;
                    break;
                }
            }
        }
        if !codemodel_file.is_empty() {
            break;
        }
    }

    if codemodel_file.is_empty() {
        return Ok(());
    }

    let reply_dir = index.parent().unwrap_or(Path::new("."));
    parse_codemodel(&reply_dir.join(codemodel_file), build_dir, writer)
}

fn parse_codemodel(
    codemodel: &Path,
    build_dir: &Path,
    writer: &mut dyn CMakeTargetWriter,
) -> Result<()> {
    let file = File::open(codemodel)?;
    let reader = BufReader::new(file);

    let mut target_files = Vec::new();
    let mut in_targets = false;
    for line in reader.lines() {
        let line = line?;
        if line.contains("\"targets\"") {
            in_targets = true;
            continue;
        }
        if in_targets {
            if line.contains(']') {
                break;
            }
            if let Some(json_file) = extract_json_string(&line, "jsonFile") {
                target_files.push(json_file);
            }
        }
    }

    let reply_dir = codemodel.parent().unwrap_or(Path::new("."));
    for target_file in target_files {
        if let Some(target) = parse_target(&reply_dir.join(target_file), build_dir) {
            writer.insert_cmake_target(&target)?;
        }
    }
    Ok(())
}

/// Read one target document; first occurrence wins for the scalar fields.
/// Returns None when the file is unreadable or carries no id.
fn parse_target(path: &Path, build_dir: &Path) -> Option<CMakeTarget> {
    let file = File::open(path).ok()?;
    let reader = BufReader::new(file);

    let mut target = CMakeTarget::default();
    let mut in_sources = false;

    for line in reader.lines() {
        let line = line.ok()?;

        if target.id.is_empty() {
            if let Some(id) = extract_json_string(&line, "id") {
                target.id = id;
            }
        }
        if target.name.is_empty() {
            if let Some(name) = extract_json_string(&line, "name") {
                target.name = name;
            }
        }
        if target.type_name.is_empty() {
            if let Some(type_name) = extract_json_string(&line, "type") {
                target.type_name = type_name;
            }
        }

        if line.contains("\"sources\"") {
            in_sources = true;
            continue;
        }
        if in_sources {
            if line.contains(']') {
                in_sources = false;
                continue;
            }
            if let Some(source) = extract_json_string(&line, "path") {
                target.sources.push(resolve_source(&source, build_dir));
            }
        }
    }

    if target.id.is_empty() {
        return None;
    }
    Some(target)
}

/// Relative source paths resolve against the build directory; they are
/// canonicalized when they exist so they line up with generator output.
fn resolve_source(source: &str, build_dir: &Path) -> String {
    if source.starts_with('/') {
        return source.to_string();
    }
    let absolute = build_dir.join(source);
    match absolute.canonicalize() {
        Ok(canonical) => canonical.to_string_lossy().into_owned(),
        Err(_) => absolute.to_string_lossy().into_owned(),
    }
}
