//! JSON output mode for the CLI commands

use anyhow::Result;
use serde::Serialize;

/// Schema version for JSON responses, bumped on breaking output changes.
pub const OUTPUT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
    Pretty,
}

/// Envelope wrapping every JSON response.
#[derive(Debug, Serialize)]
pub struct JsonResponse<T: Serialize> {
    pub schema_version: u32,
    pub data: T,
}

impl<T: Serialize> JsonResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            schema_version: OUTPUT_SCHEMA_VERSION,
            data,
        }
    }
}

/// Response payload for the `stats` command.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub database: String,
    pub dependencies: i64,
    pub sources: i64,
    pub headers: i64,
    pub objects: i64,
    pub libraries: i64,
    pub binaries: i64,
    pub inputs: i64,
    pub db_filling_ms: f64,
    pub db_loading_ms: f64,
    pub query_ms: f64,
}

/// Response payload for the `all` and `pointed` commands.
#[derive(Debug, Serialize)]
pub struct TargetsResponse {
    pub count: usize,
    pub targets: Vec<String>,
}

/// Serialize a response to stdout, compact or pretty.
pub fn output_json<T: Serialize>(response: &T, format: OutputFormat) -> Result<()> {
    let rendered = match format {
        OutputFormat::Pretty => serde_json::to_string_pretty(response)?,
        _ => serde_json::to_string(response)?,
    };
    println!("{}", rendered);
    Ok(())
}
