//! All command implementation
//!
//! Lists every target of the selected kinds, optionally filtered by a
//! wildcard pattern.

use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::Result;
use kunai::common::wildcard_search;
use kunai::output::{output_json, JsonResponse, TargetsResponse};
use kunai::{ExtensionOverrides, Loader, OutputFormat};

use crate::cli::KindSelection;

/// Run the all command. Exit code 1 when nothing matched.
pub fn run_all(
    build_dir: PathBuf,
    rebuild: bool,
    exts: ExtensionOverrides,
    kinds: KindSelection,
    match_pattern: Option<String>,
    output_format: OutputFormat,
) -> Result<u8> {
    let loader = Loader::open(&build_dir, rebuild, &exts)?;

    let mut targets: BTreeSet<String> = BTreeSet::new();
    for kind in kinds.selected() {
        targets.extend(loader.all_of_kind(kind)?);
    }

    print_targets(targets, match_pattern.as_deref(), output_format)
}

/// Render a de-duplicated, sorted target set; shared with `pointed`.
pub fn print_targets(
    targets: BTreeSet<String>,
    match_pattern: Option<&str>,
    output_format: OutputFormat,
) -> Result<u8> {
    let pattern = match_pattern.unwrap_or("");
    let matched: Vec<String> = targets
        .into_iter()
        .filter(|target| wildcard_search(target, pattern))
        .collect();

    if matched.is_empty() {
        return Ok(1);
    }

    match output_format {
        OutputFormat::Json | OutputFormat::Pretty => {
            let response = TargetsResponse {
                count: matched.len(),
                targets: matched,
            };
            output_json(&JsonResponse::new(response), output_format)?;
        }
        OutputFormat::Human => {
            for target in &matched {
                println!("{}", target);
            }
        }
    }

    Ok(0)
}
