//! Kunai CLI - incremental-build accelerator for Ninja build directories
//!
//! Usage: kunai <build-dir> [global options] <command> [arguments]

mod all_cmd;
mod cli;
mod pointed_cmd;
mod stats_cmd;

use std::process::ExitCode;
use std::time::Instant;

fn main() -> ExitCode {
    let timer = Instant::now();

    let (result, show_time) = match cli::parse_args() {
        Ok(cli::Command::Help) => {
            cli::print_usage();
            return ExitCode::SUCCESS;
        }
        Ok(cli::Command::Stats {
            build_dir,
            rebuild,
            time,
            exts,
            output_format,
        }) => (stats_cmd::run_stats(build_dir, rebuild, exts, output_format), time),
        Ok(cli::Command::All {
            build_dir,
            rebuild,
            time,
            exts,
            kinds,
            match_pattern,
            output_format,
        }) => (
            all_cmd::run_all(build_dir, rebuild, exts, kinds, match_pattern, output_format),
            time,
        ),
        Ok(cli::Command::Pointed {
            build_dir,
            rebuild,
            time,
            exts,
            kinds,
            match_pattern,
            source_files,
            output_format,
        }) => (
            pointed_cmd::run_pointed(
                build_dir,
                rebuild,
                exts,
                kinds,
                match_pattern,
                source_files,
                output_format,
            ),
            time,
        ),
        Err(e) => {
            eprintln!("Error: {}", e);
            cli::print_usage();
            return ExitCode::from(1);
        }
    };

    let code = match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    };

    if show_time {
        println!("[retrieved in {} ms]", timer.elapsed().as_secs_f64() * 1000.0);
    }

    ExitCode::from(code)
}
