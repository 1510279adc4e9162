//! CLI argument parsing
//!
//! Defines the Command enum and parse_args() for the three subcommands.
//! Layout: `kunai <build-dir> [global options] <command> [arguments]`.

use std::path::PathBuf;

use anyhow::Result;
use kunai::{ExtensionOverrides, OutputFormat, TargetKind};

pub fn print_usage() {
    eprintln!("Kunai - parse Ninja files and find which executables to rebuild for changed files");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  kunai <build-dir> [global options] <command> [arguments]");
    eprintln!("  kunai --help");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  stats    Show database statistics");
    eprintln!("  all      List all targets of the selected kinds");
    eprintln!("  pointed  List targets pointed to by modified files");
    eprintln!();
    eprintln!("Global options:");
    eprintln!("  -r, --rebuild            Force the kunai database rebuild");
    eprintln!("  -t, --time               Print the elapsed wall time of the command");
    eprintln!("  --sources-exts <EXTS>    Override source extensions (default: .c .cc .cpp .cxx .inl)");
    eprintln!("  --headers-exts <EXTS>    Override header extensions (default: .h .hh .hpp .hxx .tpp .inc)");
    eprintln!("  --inputs-exts <EXTS>     Override input extensions (default: .ini .log .txt .xml .csv .bin)");
    eprintln!("  --output <FORMAT>        Output format: human (default), json, or pretty");
    eprintln!();
    eprintln!("All arguments:");
    eprintln!("  -b, --bins               Select binary targets");
    eprintln!("  -l, --libs               Select library targets");
    eprintln!("  -s, --sources            Select source targets");
    eprintln!("  -h, --headers            Select header targets");
    eprintln!("  --match <PATTERN>        Filter output, case-insensitive, * wildcards");
    eprintln!();
    eprintln!("Pointed arguments:");
    eprintln!("  <source-files>...        Case-insensitive substrings of changed file paths");
    eprintln!("  -b, -l, -s, -h, --match  As for the all command");
}

/// Kinds selected with -b/-l/-s/-h.
#[derive(Debug, Clone, Copy, Default)]
pub struct KindSelection {
    pub bins: bool,
    pub libs: bool,
    pub sources: bool,
    pub headers: bool,
}

impl KindSelection {
    pub fn selected(&self) -> Vec<TargetKind> {
        let mut kinds = Vec::new();
        if self.sources {
            kinds.push(TargetKind::Source);
        }
        if self.headers {
            kinds.push(TargetKind::Header);
        }
        if self.libs {
            kinds.push(TargetKind::Library);
        }
        if self.bins {
            kinds.push(TargetKind::Binary);
        }
        kinds
    }
}

#[derive(Debug)]
pub enum Command {
    Help,
    Stats {
        build_dir: PathBuf,
        rebuild: bool,
        time: bool,
        exts: ExtensionOverrides,
        output_format: OutputFormat,
    },
    All {
        build_dir: PathBuf,
        rebuild: bool,
        time: bool,
        exts: ExtensionOverrides,
        kinds: KindSelection,
        match_pattern: Option<String>,
        output_format: OutputFormat,
    },
    Pointed {
        build_dir: PathBuf,
        rebuild: bool,
        time: bool,
        exts: ExtensionOverrides,
        kinds: KindSelection,
        match_pattern: Option<String>,
        source_files: Vec<String>,
        output_format: OutputFormat,
    },
}

const COMMANDS: &[&str] = &["stats", "all", "pointed"];

pub fn parse_args_impl(args: &[String]) -> Result<Command> {
    if args.len() < 2 {
        return Err(anyhow::anyhow!("Missing build directory"));
    }
    if args[1] == "--help" {
        return Ok(Command::Help);
    }

    let build_dir = normalize_build_dir(&args[1])?;

    let mut rebuild = false;
    let mut time = false;
    let mut exts = ExtensionOverrides::default();
    let mut output_format = OutputFormat::Human;

    // Global options, then the command word.
    let mut command: Option<String> = None;
    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "-r" | "--rebuild" => {
                rebuild = true;
                i += 1;
            }
            "-t" | "--time" => {
                time = true;
                i += 1;
            }
            "--sources-exts" => {
                exts.sources = parse_ext_list(args, &mut i)?;
            }
            "--headers-exts" => {
                exts.headers = parse_ext_list(args, &mut i)?;
            }
            "--inputs-exts" => {
                exts.inputs = parse_ext_list(args, &mut i)?;
            }
            "--output" => {
                output_format = parse_output_format(args, &mut i)?;
            }
            word if COMMANDS.contains(&word) => {
                command = Some(word.to_string());
                i += 1;
                break;
            }
            other => {
                return Err(anyhow::anyhow!("Unknown argument: {}", other));
            }
        }
    }

    let Some(command) = command else {
        return Err(anyhow::anyhow!("Missing command (stats, all, or pointed)"));
    };

    match command.as_str() {
        "stats" => {
            while i < args.len() {
                match args[i].as_str() {
                    "-r" | "--rebuild" => {
                        rebuild = true;
                        i += 1;
                    }
                    "-t" | "--time" => {
                        time = true;
                        i += 1;
                    }
                    "--output" => {
                        output_format = parse_output_format(args, &mut i)?;
                    }
                    other => {
                        return Err(anyhow::anyhow!("Unknown argument: {}", other));
                    }
                }
            }
            Ok(Command::Stats {
                build_dir,
                rebuild,
                time,
                exts,
                output_format,
            })
        }
        "all" => {
            let mut kinds = KindSelection::default();
            let mut match_pattern: Option<String> = None;
            while i < args.len() {
                match args[i].as_str() {
                    "-b" | "--bins" => {
                        kinds.bins = true;
                        i += 1;
                    }
                    "-l" | "--libs" => {
                        kinds.libs = true;
                        i += 1;
                    }
                    "-s" | "--sources" => {
                        kinds.sources = true;
                        i += 1;
                    }
                    "-h" | "--headers" => {
                        kinds.headers = true;
                        i += 1;
                    }
                    "--match" => {
                        match_pattern = Some(parse_value(args, &mut i, "--match")?);
                    }
                    "-r" | "--rebuild" => {
                        rebuild = true;
                        i += 1;
                    }
                    "-t" | "--time" => {
                        time = true;
                        i += 1;
                    }
                    "--output" => {
                        output_format = parse_output_format(args, &mut i)?;
                    }
                    other => {
                        return Err(anyhow::anyhow!("Unknown argument: {}", other));
                    }
                }
            }
            Ok(Command::All {
                build_dir,
                rebuild,
                time,
                exts,
                kinds,
                match_pattern,
                output_format,
            })
        }
        "pointed" => {
            let mut kinds = KindSelection::default();
            let mut match_pattern: Option<String> = None;
            let mut source_files: Vec<String> = Vec::new();
            while i < args.len() {
                match args[i].as_str() {
                    "-b" | "--bins" => {
                        kinds.bins = true;
                        i += 1;
                    }
                    "-l" | "--libs" => {
                        kinds.libs = true;
                        i += 1;
                    }
                    "-s" | "--sources" => {
                        kinds.sources = true;
                        i += 1;
                    }
                    "-h" | "--headers" => {
                        kinds.headers = true;
                        i += 1;
                    }
                    "--match" => {
                        match_pattern = Some(parse_value(args, &mut i, "--match")?);
                    }
                    "-r" | "--rebuild" => {
                        rebuild = true;
                        i += 1;
                    }
                    "-t" | "--time" => {
                        time = true;
                        i += 1;
                    }
                    "--output" => {
                        output_format = parse_output_format(args, &mut i)?;
                    }
                    positional if !positional.starts_with('-') => {
                        source_files.push(positional.to_string());
                        i += 1;
                    }
                    other => {
                        return Err(anyhow::anyhow!("Unknown argument: {}", other));
                    }
                }
            }
            if source_files.is_empty() {
                return Err(anyhow::anyhow!("pointed requires at least one source file"));
            }
            Ok(Command::Pointed {
                build_dir,
                rebuild,
                time,
                exts,
                kinds,
                match_pattern,
                source_files,
                output_format,
            })
        }
        _ => unreachable!("command filtered above"),
    }
}

pub fn parse_args() -> Result<Command> {
    let args: Vec<String> = std::env::args().collect();
    parse_args_impl(&args)
}

/// `.` resolves to the current directory; a trailing slash is stripped.
fn normalize_build_dir(raw: &str) -> Result<PathBuf> {
    if raw.starts_with('-') {
        return Err(anyhow::anyhow!("Missing build directory"));
    }
    let mut dir = if raw == "." {
        std::env::current_dir()?.to_string_lossy().into_owned()
    } else {
        raw.to_string()
    };
    if dir.len() > 1 && dir.ends_with('/') {
        dir.pop();
    }
    Ok(PathBuf::from(dir))
}

fn parse_value(args: &[String], i: &mut usize, flag: &str) -> Result<String> {
    if *i + 1 >= args.len() {
        return Err(anyhow::anyhow!("{} requires an argument", flag));
    }
    let value = args[*i + 1].clone();
    *i += 2;
    Ok(value)
}

/// Consume the extension tokens following an `--*-exts` flag: every
/// following argument up to the next option or command word, with each
/// argument additionally split on whitespace.
fn parse_ext_list(args: &[String], i: &mut usize) -> Result<Vec<String>> {
    let flag = &args[*i];
    let mut exts = Vec::new();
    let mut j = *i + 1;
    while j < args.len() {
        let token = args[j].as_str();
        if token.starts_with('-') || COMMANDS.contains(&token) {
            break;
        }
        exts.extend(token.split_whitespace().map(str::to_string));
        j += 1;
    }
    if exts.is_empty() {
        return Err(anyhow::anyhow!("{} requires an argument", flag));
    }
    *i = j;
    Ok(exts)
}

fn parse_output_format(args: &[String], i: &mut usize) -> Result<OutputFormat> {
    let value = parse_value(args, i, "--output")?;
    match value.as_str() {
        "human" => Ok(OutputFormat::Human),
        "json" => Ok(OutputFormat::Json),
        "pretty" => Ok(OutputFormat::Pretty),
        other => Err(anyhow::anyhow!(
            "Invalid output format: {}. Must be human, json, or pretty",
            other
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("kunai")
            .chain(list.iter().copied())
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_stats_command() {
        let cmd = parse_args_impl(&args(&["/build", "stats"])).unwrap();
        match cmd {
            Command::Stats { build_dir, rebuild, .. } => {
                assert_eq!(build_dir, PathBuf::from("/build"));
                assert!(!rebuild);
            }
            other => panic!("expected Stats, got {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_before_command() {
        let cmd = parse_args_impl(&args(&["/build", "-r", "-t", "stats"])).unwrap();
        match cmd {
            Command::Stats { rebuild, time, .. } => {
                assert!(rebuild);
                assert!(time);
            }
            other => panic!("expected Stats, got {:?}", other),
        }
    }

    #[test]
    fn test_all_with_selectors_and_match() {
        let cmd = parse_args_impl(&args(&["/build", "all", "-b", "-l", "--match", "test_*"])).unwrap();
        match cmd {
            Command::All {
                kinds,
                match_pattern,
                ..
            } => {
                assert!(kinds.bins && kinds.libs);
                assert!(!kinds.sources && !kinds.headers);
                assert_eq!(match_pattern.as_deref(), Some("test_*"));
            }
            other => panic!("expected All, got {:?}", other),
        }
    }

    #[test]
    fn test_pointed_with_positionals() {
        let cmd = parse_args_impl(&args(&["/build", "pointed", "-b", "a.c", "inc/x.h"])).unwrap();
        match cmd {
            Command::Pointed { source_files, kinds, .. } => {
                assert_eq!(source_files, vec!["a.c".to_string(), "inc/x.h".to_string()]);
                assert!(kinds.bins);
            }
            other => panic!("expected Pointed, got {:?}", other),
        }
    }

    #[test]
    fn test_pointed_without_files_is_an_error() {
        assert!(parse_args_impl(&args(&["/build", "pointed", "-b"])).is_err());
    }

    #[test]
    fn test_sources_exts_collects_tokens() {
        let cmd = parse_args_impl(&args(&["/build", "--sources-exts", ".rs", ".zig", "stats"])).unwrap();
        match cmd {
            Command::Stats { exts, .. } => {
                assert_eq!(exts.sources, vec![".rs".to_string(), ".zig".to_string()]);
            }
            other => panic!("expected Stats, got {:?}", other),
        }
    }

    #[test]
    fn test_sources_exts_accepts_one_quoted_list() {
        let cmd = parse_args_impl(&args(&["/build", "--sources-exts", ".rs .zig", "stats"])).unwrap();
        match cmd {
            Command::Stats { exts, .. } => {
                assert_eq!(exts.sources, vec![".rs".to_string(), ".zig".to_string()]);
            }
            other => panic!("expected Stats, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_command_is_an_error() {
        assert!(parse_args_impl(&args(&["/build"])).is_err());
        assert!(parse_args_impl(&args(&["/build", "-r"])).is_err());
    }

    #[test]
    fn test_trailing_slash_stripped() {
        let cmd = parse_args_impl(&args(&["/build/", "stats"])).unwrap();
        match cmd {
            Command::Stats { build_dir, .. } => assert_eq!(build_dir, PathBuf::from("/build")),
            other => panic!("expected Stats, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_argument_is_an_error() {
        assert!(parse_args_impl(&args(&["/build", "stats", "--bogus"])).is_err());
    }
}
