//! End-to-end ingestion orchestration
//!
//! The loader owns the graph store, decides from the freshness verdict
//! whether to rebuild, drives all three parsers inside one transaction,
//! and exposes the query surface with per-query timing metadata.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Result;

use crate::error::KunaiError;
use crate::graph::{
    check_freshness, sha1_hex_of_file, BuildGraph, FreshnessStatus, Stats, TargetKind,
    META_BUILD_NINJA_SHA1, META_BUILD_NINJA_TIME, META_NINJA_DEPS_SHA1, META_NINJA_DEPS_TIME,
};
use crate::ingest::{BuildFileParser, CMakeReplyParser, DepsLogParser};

/// Store file name inside the build directory.
pub const DB_FILE_NAME: &str = "kunai.db";

/// Extension table overrides supplied on the command line, applied on top
/// of the seeded defaults.
#[derive(Debug, Clone, Default)]
pub struct ExtensionOverrides {
    pub sources: Vec<String>,
    pub headers: Vec<String>,
    pub inputs: Vec<String>,
}

impl ExtensionOverrides {
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty() && self.headers.is_empty() && self.inputs.is_empty()
    }

    fn apply(&self, graph: &BuildGraph) -> Result<()> {
        for ext in &self.sources {
            graph.register_extension(ext, TargetKind::Source)?;
        }
        for ext in &self.headers {
            graph.register_extension(ext, TargetKind::Header)?;
        }
        for ext in &self.inputs {
            graph.register_extension(ext, TargetKind::Input)?;
        }
        Ok(())
    }
}

/// Owner of one opened build directory.
pub struct Loader {
    graph: BuildGraph,
    build_dir: PathBuf,
}

impl Loader {
    /// Open the store at `<build_dir>/kunai.db` and bring it up to date
    /// with the on-disk Ninja files.
    ///
    /// When neither input changed (and no rebuild is forced) this only
    /// refreshes drifted timestamps; otherwise the store is cleared and
    /// refilled inside a single transaction.
    pub fn open(build_dir: &Path, force_rebuild: bool, overrides: &ExtensionOverrides) -> Result<Self> {
        if !build_dir.exists() {
            return Err(KunaiError::NotFound(build_dir.to_path_buf()).into());
        }

        let loading = Instant::now();
        let graph = BuildGraph::open(build_dir.join(DB_FILE_NAME))?;
        graph.set_metadata("perf_db_loading_ms", &format_ms(loading))?;

        overrides.apply(&graph)?;
        // A changed classification table invalidates the stored graph just
        // like changed inputs do.
        let force_rebuild = force_rebuild || !overrides.is_empty();

        let mut loader = Loader {
            graph,
            build_dir: build_dir.to_path_buf(),
        };

        let status = check_freshness(&loader.graph, build_dir, force_rebuild)?;
        if !force_rebuild && !status.needs_rebuild() {
            // Content unchanged; keep the timestamps in sync so the next
            // run can skip the hash pass.
            if status.build_ninja.sha1.is_some() {
                loader.graph.set_metadata(
                    META_BUILD_NINJA_TIME,
                    &status.build_ninja.mtime_nanos.to_string(),
                )?;
            }
            if status.ninja_deps.sha1.is_some() {
                loader.graph.set_metadata(
                    META_NINJA_DEPS_TIME,
                    &status.ninja_deps.mtime_nanos.to_string(),
                )?;
            }
            return Ok(loader);
        }

        let filling = Instant::now();
        loader.graph.begin()?;
        match loader.rebuild(&status, overrides) {
            Ok(()) => loader.graph.commit()?,
            Err(err) => {
                // Leave the pre-clear contents in place on any fatal error.
                let _ = loader.graph.rollback();
                return Err(err);
            }
        }
        loader.graph.set_metadata("perf_db_filling_ms", &format_ms(filling))?;

        Ok(loader)
    }

    fn rebuild(&mut self, status: &FreshnessStatus, overrides: &ExtensionOverrides) -> Result<()> {
        self.graph.clear()?;
        self.graph.seed_default_extensions()?;
        overrides.apply(&self.graph)?;

        let build_ninja = self.build_dir.join("build.ninja");
        if !build_ninja.exists() {
            return Err(KunaiError::io(
                &build_ninja,
                std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
            )
            .into());
        }
        BuildFileParser::parse(&build_ninja, &mut self.graph)?;

        let ninja_deps = self.build_dir.join(".ninja_deps");
        if ninja_deps.exists() {
            DepsLogParser::parse_file(&ninja_deps, &mut self.graph)?;
        }

        // CMake reply enriches target typing when present; its failure
        // never aborts an ingestion.
        let cmake_dir = self.build_dir.clone();
        let _ = CMakeReplyParser::parse(&cmake_dir, &mut self.graph);

        let build_sha1 = match &status.build_ninja.sha1 {
            Some(sha1) => sha1.clone(),
            None => sha1_hex_of_file(&build_ninja),
        };
        let deps_sha1 = match &status.ninja_deps.sha1 {
            Some(sha1) => sha1.clone(),
            None => sha1_hex_of_file(&ninja_deps),
        };
        self.graph.set_metadata(META_BUILD_NINJA_SHA1, &build_sha1)?;
        self.graph.set_metadata(META_NINJA_DEPS_SHA1, &deps_sha1)?;
        self.graph.set_metadata(
            META_BUILD_NINJA_TIME,
            &status.build_ninja.mtime_nanos.to_string(),
        )?;
        self.graph.set_metadata(
            META_NINJA_DEPS_TIME,
            &status.ninja_deps.mtime_nanos.to_string(),
        )?;
        self.graph
            .set_metadata("build_dir", &self.build_dir.to_string_lossy())?;

        Ok(())
    }

    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    pub fn graph(&self) -> &BuildGraph {
        &self.graph
    }

    pub fn stats(&self) -> Result<Stats> {
        self.graph.stats()
    }

    /// All targets of one kind; the query wall time lands in metadata.
    pub fn all_of_kind(&self, kind: TargetKind) -> Result<Vec<String>> {
        let timer = Instant::now();
        let ret = self.graph.all_of_kind(kind)?;
        if !ret.is_empty() {
            self.graph.set_metadata("perf_query_ms", &format_ms(timer))?;
        }
        Ok(ret)
    }

    /// Reverse-reachable targets of one kind from the given seeds.
    pub fn pointed_targets(&self, seeds: &[String], kind: TargetKind) -> Result<Vec<String>> {
        let timer = Instant::now();
        let ret = self.graph.reachable_reverse(seeds, kind)?;
        if !ret.is_empty() {
            self.graph.set_metadata("perf_query_ms", &format_ms(timer))?;
        }
        Ok(ret)
    }
}

fn format_ms(since: Instant) -> String {
    format!("{}", since.elapsed().as_secs_f64() * 1000.0)
}
