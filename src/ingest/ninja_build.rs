//! Streaming parser for `build.ninja`
//!
//! Line-oriented with `$` continuations, recursive `include`/`subninja`
//! composition, and `$`-variable expansion. Includes are handled with an
//! explicit frame stack plus a visited set, so deeply nested files cannot
//! exhaust the host call stack and a file is never parsed twice.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

use anyhow::Result;

use crate::error::KunaiError;
use crate::ingest::{BuildStatement, BuildWriter};

/// One open file on the include stack.
struct Frame {
    lines: Lines<BufReader<File>>,
    pending: Option<String>,
}

impl Frame {
    fn next_raw(&mut self) -> Result<Option<String>> {
        if let Some(line) = self.pending.take() {
            return Ok(Some(line));
        }
        Ok(self.lines.next().transpose()?)
    }

    /// Whether the next physical line is indented (belongs to the current
    /// rule block or build statement). Buffers the peeked line.
    fn next_is_indented(&mut self) -> Result<bool> {
        if self.pending.is_none() {
            self.pending = self.lines.next().transpose()?;
        }
        Ok(self.pending.as_deref().is_some_and(|l| l.starts_with(' ')))
    }

    /// One logical line, with `$` continuations joined. The continuation
    /// marker is an odd run of trailing dollars; the next physical line is
    /// trimmed before concatenation.
    fn next_logical(&mut self) -> Result<Option<String>> {
        let Some(mut line) = self.next_raw()? else {
            return Ok(None);
        };
        while ends_in_continuation(&line) {
            line.pop();
            match self.next_raw()? {
                Some(next) => line.push_str(next.trim()),
                None => break,
            }
        }
        Ok(Some(line))
    }
}

fn ends_in_continuation(line: &str) -> bool {
    let trailing = line.bytes().rev().take_while(|&b| b == b'$').count();
    trailing % 2 == 1
}

/// Directory part of the top-level file's path, `"."` when it has none.
/// Include arguments resolve against this.
fn directory_of(path: &str) -> String {
    match path.rfind(['/', '\\']) {
        Some(pos) => path[..pos].to_string(),
        None => ".".to_string(),
    }
}

/// Parser for `build.ninja` and everything it pulls in.
///
/// Emits one [`BuildStatement`] per `build` line to the writer; rule
/// bodies are discarded, only the dependency structure survives.
pub struct BuildFileParser<'w> {
    writer: &'w mut dyn BuildWriter,
    globals: HashMap<String, String>,
    visited: HashSet<String>,
    base_dir: String,
}

impl<'w> BuildFileParser<'w> {
    /// Parse the top-level file. Its absence is fatal; files named by
    /// `include`/`subninja` that cannot be opened are tolerated.
    pub fn parse(path: &Path, writer: &'w mut dyn BuildWriter) -> Result<()> {
        let path_str = path.to_string_lossy().into_owned();
        let mut parser = BuildFileParser {
            writer,
            globals: HashMap::new(),
            visited: HashSet::new(),
            base_dir: directory_of(&path_str),
        };
        parser.run(&path_str)
    }

    fn run(&mut self, top: &str) -> Result<()> {
        let mut stack: Vec<Frame> = Vec::new();
        self.open_into(&mut stack, top, false)?;

        loop {
            let line = loop {
                let Some(frame) = stack.last_mut() else {
                    return Ok(());
                };
                match frame.next_logical()? {
                    Some(line) => break line,
                    None => {
                        stack.pop();
                    }
                }
            };

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some(arg) = line.strip_prefix("include ") {
                let target = expand_vars(arg.trim(), &self.globals);
                let resolved = self.resolve(&target);
                self.open_into(&mut stack, &resolved, true)?;
                continue;
            }

            if let Some(arg) = line.strip_prefix("subninja ") {
                let target = expand_vars(arg.trim(), &self.globals);
                let resolved = self.resolve(&target);
                self.open_into(&mut stack, &resolved, true)?;
                continue;
            }

            if line.starts_with("build ") {
                let locals = match stack.last_mut() {
                    Some(frame) => read_locals(frame, &self.globals)?,
                    None => self.globals.clone(),
                };
                self.emit_build(&line, &locals)?;
                continue;
            }

            if line.starts_with("rule ") {
                if let Some(frame) = stack.last_mut() {
                    while frame.next_is_indented()? {
                        frame.next_raw()?;
                    }
                }
                continue;
            }

            // Global variable definition, expanded at definition time.
            if line.contains('=') && !line.starts_with("  ") {
                parse_variable(&line, &mut self.globals);
            }
        }
    }

    /// Push a file onto the parse stack unless it was already visited.
    fn open_into(&mut self, stack: &mut Vec<Frame>, path: &str, optional: bool) -> Result<()> {
        if !self.visited.insert(path.to_string()) {
            return Ok(());
        }
        match File::open(path) {
            Ok(file) => {
                stack.push(Frame {
                    lines: BufReader::new(file).lines(),
                    pending: None,
                });
                Ok(())
            }
            Err(_) if optional => Ok(()),
            Err(source) => Err(KunaiError::io(path, source).into()),
        }
    }

    /// Resolve an include argument against the top-level file's directory.
    fn resolve(&self, path: &str) -> String {
        if path.is_empty()
            || path.starts_with('/')
            || path.starts_with('\\')
            || self.base_dir.is_empty()
            || self.base_dir == "."
        {
            return path.to_string();
        }
        format!("{}/{}", self.base_dir, path)
    }

    fn emit_build(&mut self, line: &str, locals: &HashMap<String, String>) -> Result<()> {
        // Windows generators emit backslash separators; normalize the
        // whole statement before tokenizing.
        let stmt = line["build ".len()..].replace('\\', "/");

        let Some(colon) = stmt.find(':') else {
            return Ok(());
        };
        let outputs_str = stmt[..colon].trim();
        let rest = stmt[colon + 1..].trim();

        // First whitespace-delimited token after ':' is the rule name.
        let (rule, inputs_str) = match rest.find(' ') {
            Some(space) => (rest[..space].trim().to_string(), rest[space + 1..].to_string()),
            None => (rest.to_string(), String::new()),
        };

        let outputs: Vec<String> = outputs_str
            .split_whitespace()
            .map(|token| expand_vars(token, locals))
            .collect();
        if outputs.is_empty() {
            return Ok(());
        }

        // Split off order-only then implicit segments; the remainder is
        // the explicit input list.
        let mut explicit_str = inputs_str;
        let mut order_only_str = String::new();
        let mut implicit_str = String::new();
        if let Some(idx) = explicit_str.find(" || ") {
            order_only_str = explicit_str[idx + 4..].to_string();
            explicit_str.truncate(idx);
        }
        if let Some(idx) = explicit_str.find(" | ") {
            implicit_str = explicit_str[idx + 3..].to_string();
            explicit_str.truncate(idx);
        }

        let collect = |segment: &str| -> Vec<String> {
            segment
                .split_whitespace()
                .map(|token| expand_vars(token, locals))
                .filter(|expanded| !expanded.is_empty())
                .collect()
        };

        let statement = BuildStatement {
            rule,
            outputs,
            explicit_inputs: collect(&explicit_str),
            implicit_inputs: collect(&implicit_str),
            order_only_inputs: collect(&order_only_str),
        };
        self.writer.insert_build_statement(&statement)
    }
}

/// Consume the indented variable lines following a build statement into a
/// local scope layered over a snapshot of the globals.
fn read_locals(frame: &mut Frame, globals: &HashMap<String, String>) -> Result<HashMap<String, String>> {
    let mut locals = globals.clone();
    while frame.next_is_indented()? {
        let Some(line) = frame.next_raw()? else {
            break;
        };
        if line.contains('=') {
            parse_variable(&line, &mut locals);
        }
    }
    Ok(locals)
}

/// `name = value`: both sides trimmed, the value expanded against the
/// bindings accumulated so far.
fn parse_variable(line: &str, vars: &mut HashMap<String, String>) {
    let Some(eq) = line.find('=') else {
        return;
    };
    let name = line[..eq].trim().to_string();
    let value = line[eq + 1..].trim();
    let expanded = expand_vars(value, vars);
    vars.insert(name, expanded);
}

/// Ninja `$`-expansion: `$$` is a literal dollar, `${name}` and `$name`
/// (name = maximal run of alphanumerics and underscore) resolve to the
/// current binding, unbound names expand to the empty string.
pub(crate) fn expand_vars(input: &str, vars: &HashMap<String, String>) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    let mut i = 0;
    while i < chars.len() {
        if chars[i] != '$' {
            out.push(chars[i]);
            i += 1;
            continue;
        }
        if i + 1 >= chars.len() {
            break;
        }
        match chars[i + 1] {
            '$' => {
                out.push('$');
                i += 2;
            }
            '{' => match chars[i + 2..].iter().position(|&c| c == '}') {
                Some(end) => {
                    let name: String = chars[i + 2..i + 2 + end].iter().collect();
                    if let Some(value) = vars.get(&name) {
                        out.push_str(value);
                    }
                    i += end + 3;
                }
                None => {
                    i += 1;
                }
            },
            _ => {
                let start = i + 1;
                let mut end = start;
                while end < chars.len() && (chars[end].is_ascii_alphanumeric() || chars[end] == '_') {
                    end += 1;
                }
                let name: String = chars[start..end].iter().collect();
                if let Some(value) = vars.get(&name) {
                    out.push_str(value);
                }
                i = end;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_expand_double_dollar() {
        assert_eq!(expand_vars("a$$b", &HashMap::new()), "a$b");
    }

    #[test]
    fn test_expand_braced_and_bare_agree() {
        let v = vars(&[("dir", "sub")]);
        assert_eq!(expand_vars("${dir}/x", &v), "sub/x");
        assert_eq!(expand_vars("$dir/x", &v), "sub/x");
    }

    #[test]
    fn test_expand_unbound_is_empty() {
        assert_eq!(expand_vars("a${nope}b", &HashMap::new()), "ab");
        assert_eq!(expand_vars("a$nope-b", &HashMap::new()), "a-b");
    }

    #[test]
    fn test_expand_name_stops_at_non_word() {
        let v = vars(&[("x", "1"), ("x_y2", "2")]);
        assert_eq!(expand_vars("$x.o", &v), "1.o");
        assert_eq!(expand_vars("$x_y2.o", &v), "2.o");
    }

    #[test]
    fn test_expand_trailing_dollar_dropped() {
        assert_eq!(expand_vars("abc$", &HashMap::new()), "abc");
    }

    #[test]
    fn test_continuation_marker() {
        assert!(ends_in_continuation("build a: $"));
        assert!(!ends_in_continuation("literal $$"));
        assert!(ends_in_continuation("odd $$$"));
        assert!(!ends_in_continuation("plain line"));
    }

    #[test]
    fn test_directory_of() {
        assert_eq!(directory_of("/build/build.ninja"), "/build");
        assert_eq!(directory_of("sub/part.ninja"), "sub");
        assert_eq!(directory_of("win\\dir\\build.ninja"), "win\\dir");
        assert_eq!(directory_of("build.ninja"), ".");
    }
}
