//! Pointed command implementation
//!
//! Resolves which targets of the selected kinds transitively depend on
//! the given changed files.

use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::Result;
use kunai::{ExtensionOverrides, Loader, OutputFormat};

use crate::all_cmd::print_targets;
use crate::cli::KindSelection;

/// Run the pointed command. Exit code 1 when nothing matched.
pub fn run_pointed(
    build_dir: PathBuf,
    rebuild: bool,
    exts: ExtensionOverrides,
    kinds: KindSelection,
    match_pattern: Option<String>,
    source_files: Vec<String>,
    output_format: OutputFormat,
) -> Result<u8> {
    let loader = Loader::open(&build_dir, rebuild, &exts)?;

    let mut targets: BTreeSet<String> = BTreeSet::new();
    for kind in kinds.selected() {
        targets.extend(loader.pointed_targets(&source_files, kind)?);
    }

    print_targets(targets, match_pattern.as_deref(), output_format)
}
