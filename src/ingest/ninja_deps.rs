//! Parser for the binary `.ninja_deps` log
//!
//! Layout is little-endian throughout: a 12-byte ASCII magic, a u32
//! version (3 and 4 are supported), then length-prefixed records. The top
//! bit of each record header selects between path records (which grow the
//! id table) and deps records (which reference it).

use std::fs;
use std::path::Path;

use anyhow::Result;

use crate::error::KunaiError;
use crate::ingest::{DepsEntry, DepsWriter};

const MAGIC: &[u8] = b"# ninjadeps\n";

pub struct DepsLogParser;

impl DepsLogParser {
    pub fn parse_file(path: &Path, writer: &mut dyn DepsWriter) -> Result<()> {
        let bytes = fs::read(path).map_err(|source| KunaiError::io(path, source))?;
        Self::parse_bytes(&bytes, writer)
    }

    pub fn parse_bytes(bytes: &[u8], writer: &mut dyn DepsWriter) -> Result<()> {
        if bytes.len() < MAGIC.len() + 4 || &bytes[..MAGIC.len()] != MAGIC {
            return Err(KunaiError::format("invalid .ninja_deps signature").into());
        }
        let version = read_u32(bytes, MAGIC.len());
        if version != 3 && version != 4 {
            return Err(
                KunaiError::format(format!("unsupported .ninja_deps version: {}", version)).into(),
            );
        }

        // Path ids are assigned sequentially from 0 in file order, so the
        // table index is the id.
        let mut paths: Vec<String> = Vec::new();
        let mut pos = MAGIC.len() + 4;

        while pos < bytes.len() {
            if pos + 4 > bytes.len() {
                // Trailing fragment shorter than a record header.
                break;
            }
            let header = read_u32(bytes, pos);
            pos += 4;
            let is_deps = header & 0x8000_0000 != 0;
            let payload = (header & 0x7FFF_FFFF) as usize;

            if payload == 0 {
                continue;
            }
            if pos + payload > bytes.len() {
                return Err(
                    KunaiError::format(format!("truncated record at offset {}", pos)).into(),
                );
            }
            let end = pos + payload;

            if !is_deps {
                // NUL-padded path followed by a 4-byte checksum we ignore.
                let text_len = payload.saturating_sub(4);
                let raw = &bytes[pos..pos + text_len];
                let text = match raw.iter().position(|&b| b == 0) {
                    Some(nul) => &raw[..nul],
                    None => raw,
                };
                paths.push(String::from_utf8_lossy(text).into_owned());
                pos = end;
            } else {
                let mtime_len = if version == 4 { 8 } else { 4 };
                if payload < 4 + mtime_len {
                    return Err(
                        KunaiError::format(format!("truncated deps record at offset {}", pos))
                            .into(),
                    );
                }
                let output_id = read_u32(bytes, pos);
                pos += 4;
                let mtime = if version == 4 {
                    read_u64(bytes, pos)
                } else {
                    read_u32(bytes, pos) as u64
                };
                pos += mtime_len;

                let target = match paths.get(output_id as usize) {
                    Some(path) => path.clone(),
                    // Keep the record visible rather than dropping it.
                    None => format!("<unknown:{}>", output_id),
                };

                let mut deps = Vec::new();
                while pos + 4 <= end {
                    let dep_id = read_u32(bytes, pos);
                    pos += 4;
                    // Ids not yet in the table are corruption; drop them.
                    if let Some(path) = paths.get(dep_id as usize) {
                        deps.push(path.clone());
                    }
                }
                pos = end;

                writer.insert_deps_entry(&DepsEntry { target, mtime, deps })?;
            }
        }

        Ok(())
    }
}

fn read_u32(bytes: &[u8], pos: usize) -> u32 {
    u32::from_le_bytes(bytes[pos..pos + 4].try_into().unwrap())
}

fn read_u64(bytes: &[u8], pos: usize) -> u64 {
    u64::from_le_bytes(bytes[pos..pos + 8].try_into().unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Collect(Vec<DepsEntry>);

    impl DepsWriter for Collect {
        fn insert_deps_entry(&mut self, entry: &DepsEntry) -> Result<()> {
            self.0.push(entry.clone());
            Ok(())
        }
    }

    fn path_record(log: &mut Vec<u8>, path: &str) {
        let mut payload = path.as_bytes().to_vec();
        // NUL padding to 4-byte alignment, as ninja writes it.
        while payload.len() % 4 != 0 {
            payload.push(0);
        }
        payload.extend_from_slice(&0u32.to_le_bytes());
        log.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        log.extend_from_slice(&payload);
    }

    fn deps_record_v4(log: &mut Vec<u8>, output_id: u32, mtime: u64, dep_ids: &[u32]) {
        let payload_len = 4 + 8 + dep_ids.len() * 4;
        log.extend_from_slice(&(payload_len as u32 | 0x8000_0000).to_le_bytes());
        log.extend_from_slice(&output_id.to_le_bytes());
        log.extend_from_slice(&mtime.to_le_bytes());
        for id in dep_ids {
            log.extend_from_slice(&id.to_le_bytes());
        }
    }

    fn header(version: u32) -> Vec<u8> {
        let mut log = MAGIC.to_vec();
        log.extend_from_slice(&version.to_le_bytes());
        log
    }

    #[test]
    fn test_bad_signature_is_fatal() {
        let mut sink = Collect(Vec::new());
        assert!(DepsLogParser::parse_bytes(b"# notninja!!\x04\x00\x00\x00", &mut sink).is_err());
    }

    #[test]
    fn test_unsupported_version_is_fatal() {
        let mut sink = Collect(Vec::new());
        assert!(DepsLogParser::parse_bytes(&header(5), &mut sink).is_err());
    }

    #[test]
    fn test_path_then_deps() {
        let mut log = header(4);
        path_record(&mut log, "a.o");
        path_record(&mut log, "a.c");
        deps_record_v4(&mut log, 0, 123, &[1]);

        let mut sink = Collect(Vec::new());
        DepsLogParser::parse_bytes(&log, &mut sink).unwrap();
        assert_eq!(sink.0.len(), 1);
        assert_eq!(sink.0[0].target, "a.o");
        assert_eq!(sink.0[0].mtime, 123);
        assert_eq!(sink.0[0].deps, vec!["a.c".to_string()]);
    }

    #[test]
    fn test_unknown_dep_id_dropped() {
        let mut log = header(4);
        path_record(&mut log, "a.o");
        deps_record_v4(&mut log, 0, 1, &[7, 0]);

        let mut sink = Collect(Vec::new());
        DepsLogParser::parse_bytes(&log, &mut sink).unwrap();
        assert_eq!(sink.0[0].deps, vec!["a.o".to_string()]);
    }

    #[test]
    fn test_unknown_output_id_gets_placeholder() {
        let mut log = header(4);
        deps_record_v4(&mut log, 9, 1, &[]);

        let mut sink = Collect(Vec::new());
        DepsLogParser::parse_bytes(&log, &mut sink).unwrap();
        assert_eq!(sink.0[0].target, "<unknown:9>");
    }

    #[test]
    fn test_truncated_payload_is_fatal() {
        let mut log = header(4);
        log.extend_from_slice(&100u32.to_le_bytes());
        log.extend_from_slice(b"short");

        let mut sink = Collect(Vec::new());
        assert!(DepsLogParser::parse_bytes(&log, &mut sink).is_err());
    }
}
