//! Stats command implementation

use std::path::PathBuf;

use anyhow::Result;
use kunai::output::{output_json, JsonResponse, StatsResponse};
use kunai::{ExtensionOverrides, Loader, OutputFormat, DB_FILE_NAME};

/// Run the stats command: counters per kind plus the last recorded
/// timings. Returns the process exit code.
pub fn run_stats(
    build_dir: PathBuf,
    rebuild: bool,
    exts: ExtensionOverrides,
    output_format: OutputFormat,
) -> Result<u8> {
    let loader = Loader::open(&build_dir, rebuild, &exts)?;
    let stats = loader.stats()?;
    let database = build_dir.join(DB_FILE_NAME).to_string_lossy().into_owned();

    match output_format {
        OutputFormat::Json | OutputFormat::Pretty => {
            let response = StatsResponse {
                database,
                dependencies: stats.counters.deps,
                sources: stats.counters.sources,
                headers: stats.counters.headers,
                objects: stats.counters.objects,
                libraries: stats.counters.libraries,
                binaries: stats.counters.binaries,
                inputs: stats.counters.inputs,
                db_filling_ms: stats.timings.db_filling_ms,
                db_loading_ms: stats.timings.db_loading_ms,
                query_ms: stats.timings.query_ms,
            };
            output_json(&JsonResponse::new(response), output_format)?;
        }
        OutputFormat::Human => {
            println!("database: {}", database);
            println!("dependencies: {}", stats.counters.deps);
            println!("sources: {}", stats.counters.sources);
            println!("headers: {}", stats.counters.headers);
            println!("objects: {}", stats.counters.objects);
            println!("libraries: {}", stats.counters.libraries);
            println!("binaries: {}", stats.counters.binaries);
            println!("inputs: {}", stats.counters.inputs);
            println!("db filling: {} ms", stats.timings.db_filling_ms);
            println!("db loading: {} ms", stats.timings.db_loading_ms);
            println!("last query: {} ms", stats.timings.query_ms);
        }
    }

    Ok(0)
}
