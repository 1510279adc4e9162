//! Tests for the build.ninja parser
//!
//! Each test writes Ninja text into a temp directory and collects the
//! emitted build statements through a recording writer.

use std::fs;
use std::path::Path;

use anyhow::Result;
use kunai::ingest::{BuildFileParser, BuildStatement, BuildWriter};
use tempfile::TempDir;

struct Collect(Vec<BuildStatement>);

impl BuildWriter for Collect {
    fn insert_build_statement(&mut self, stmt: &BuildStatement) -> Result<()> {
        self.0.push(stmt.clone());
        Ok(())
    }
}

fn parse(path: &Path) -> Vec<BuildStatement> {
    let mut sink = Collect(Vec::new());
    BuildFileParser::parse(path, &mut sink).unwrap();
    sink.0
}

fn write_ninja(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_simple_statement_decomposition() {
    let dir = TempDir::new().unwrap();
    let top = write_ninja(
        &dir,
        "build.ninja",
        "build out.o: CC in.c | dep.h || order.txt\n",
    );

    let stmts = parse(&top);
    assert_eq!(stmts.len(), 1);
    assert_eq!(stmts[0].rule, "CC");
    assert_eq!(stmts[0].outputs, vec!["out.o"]);
    assert_eq!(stmts[0].explicit_inputs, vec!["in.c"]);
    assert_eq!(stmts[0].implicit_inputs, vec!["dep.h"]);
    assert_eq!(stmts[0].order_only_inputs, vec!["order.txt"]);
}

#[test]
fn test_multiple_outputs_and_inputs() {
    let dir = TempDir::new().unwrap();
    let top = write_ninja(&dir, "build.ninja", "build a.o b.o: CC a.c b.c\n");

    let stmts = parse(&top);
    assert_eq!(stmts[0].outputs, vec!["a.o", "b.o"]);
    assert_eq!(stmts[0].primary_output(), Some("a.o"));
    assert_eq!(stmts[0].explicit_inputs, vec!["a.c", "b.c"]);
}

#[test]
fn test_global_variable_expansion() {
    let dir = TempDir::new().unwrap();
    let top = write_ninja(
        &dir,
        "build.ninja",
        "srcdir = src\nbuild out.o: CC ${srcdir}/in.c $srcdir/other.c\n",
    );

    let stmts = parse(&top);
    assert_eq!(stmts[0].explicit_inputs, vec!["src/in.c", "src/other.c"]);
}

#[test]
fn test_variable_defined_from_variable() {
    let dir = TempDir::new().unwrap();
    let top = write_ninja(
        &dir,
        "build.ninja",
        "root = top\nsub = $root/nested\nbuild out.o: CC $sub/in.c\n",
    );

    let stmts = parse(&top);
    assert_eq!(stmts[0].explicit_inputs, vec!["top/nested/in.c"]);
}

#[test]
fn test_local_variables_shadow_globals() {
    let dir = TempDir::new().unwrap();
    let top = write_ninja(
        &dir,
        "build.ninja",
        "v = global\nbuild a_$v: CC in_$v.c\n  v = local\nbuild b_$v: CC\n",
    );

    let stmts = parse(&top);
    assert_eq!(stmts.len(), 2);
    // Locals are read before the statement tokens expand
    assert_eq!(stmts[0].outputs, vec!["a_local"]);
    assert_eq!(stmts[0].explicit_inputs, vec!["in_local.c"]);
    // The local does not leak into the next statement
    assert_eq!(stmts[1].outputs, vec!["b_global"]);
}

#[test]
fn test_dollar_escapes() {
    let dir = TempDir::new().unwrap();
    let top = write_ninja(&dir, "build.ninja", "build a$$b: CC in.c\n");

    let stmts = parse(&top);
    assert_eq!(stmts[0].outputs, vec!["a$b"]);
}

#[test]
fn test_unbound_variable_expands_to_empty() {
    let dir = TempDir::new().unwrap();
    let top = write_ninja(&dir, "build.ninja", "build pre${nope}post: CC in.c\n");

    let stmts = parse(&top);
    assert_eq!(stmts[0].outputs, vec!["prepost"]);
}

#[test]
fn test_line_continuation() {
    let dir = TempDir::new().unwrap();
    let top = write_ninja(&dir, "build.ninja", "build out.o: CC $\n    in.c\n");

    let stmts = parse(&top);
    assert_eq!(stmts[0].explicit_inputs, vec!["in.c"]);
}

#[test]
fn test_comments_and_blank_lines_ignored() {
    let dir = TempDir::new().unwrap();
    let top = write_ninja(
        &dir,
        "build.ninja",
        "# header comment\n\nbuild out.o: CC in.c\n\n# trailing\n",
    );

    assert_eq!(parse(&top).len(), 1);
}

#[test]
fn test_rule_blocks_are_discarded() {
    let dir = TempDir::new().unwrap();
    let top = write_ninja(
        &dir,
        "build.ninja",
        "rule CC\n  command = gcc -c $in -o $out\n  description = CC $out\nbuild out.o: CC in.c\n",
    );

    let stmts = parse(&top);
    assert_eq!(stmts.len(), 1);
    assert_eq!(stmts[0].explicit_inputs, vec!["in.c"]);
}

#[test]
fn test_subninja_with_variable_path() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    write_ninja(
        &dir,
        "sub/part.ninja",
        "build t: CXX_EXECUTABLE_LINKER__t t.cc\n",
    );
    let top = write_ninja(&dir, "build.ninja", "dir = sub\nsubninja ${dir}/part.ninja\n");

    let stmts = parse(&top);
    assert_eq!(stmts.len(), 1);
    assert_eq!(stmts[0].outputs, vec!["t"]);
    assert_eq!(stmts[0].explicit_inputs, vec!["t.cc"]);
}

#[test]
fn test_include_sees_parent_globals() {
    let dir = TempDir::new().unwrap();
    write_ninja(&dir, "vars.ninja", "src = here\n");
    let top = write_ninja(
        &dir,
        "build.ninja",
        "include vars.ninja\nbuild out.o: CC $src/in.c\n",
    );

    let stmts = parse(&top);
    assert_eq!(stmts[0].explicit_inputs, vec!["here/in.c"]);
}

#[test]
fn test_include_cycle_is_guarded() {
    let dir = TempDir::new().unwrap();
    write_ninja(&dir, "a.ninja", "include b.ninja\nbuild a.o: CC a.c\n");
    write_ninja(&dir, "b.ninja", "include a.ninja\nbuild b.o: CC b.c\n");
    let top = write_ninja(&dir, "build.ninja", "include a.ninja\n");

    let stmts = parse(&top);
    // Both files parsed exactly once
    assert_eq!(stmts.len(), 2);
}

#[test]
fn test_missing_include_is_tolerated() {
    let dir = TempDir::new().unwrap();
    let top = write_ninja(
        &dir,
        "build.ninja",
        "include not_there.ninja\nbuild out.o: CC in.c\n",
    );

    let stmts = parse(&top);
    assert_eq!(stmts.len(), 1);
}

#[test]
fn test_missing_top_level_file_is_fatal() {
    let dir = TempDir::new().unwrap();
    let mut sink = Collect(Vec::new());
    let result = BuildFileParser::parse(&dir.path().join("build.ninja"), &mut sink);
    assert!(result.is_err(), "absent top-level file must fail the parse");
}

#[test]
fn test_backslashes_normalized_to_forward_slashes() {
    let dir = TempDir::new().unwrap();
    let top = write_ninja(
        &dir,
        "build.ninja",
        "build out\\sub\\a.o: CC src\\a.c\n",
    );

    let stmts = parse(&top);
    assert_eq!(stmts[0].outputs, vec!["out/sub/a.o"]);
    assert_eq!(stmts[0].explicit_inputs, vec!["src/a.c"]);
}

#[test]
fn test_statement_without_colon_is_skipped() {
    let dir = TempDir::new().unwrap();
    let top = write_ninja(
        &dir,
        "build.ninja",
        "build broken no colon here\nbuild ok.o: CC ok.c\n",
    );

    let stmts = parse(&top);
    assert_eq!(stmts.len(), 1);
    assert_eq!(stmts[0].outputs, vec!["ok.o"]);
}

#[test]
fn test_rule_name_is_not_expanded() {
    let dir = TempDir::new().unwrap();
    let top = write_ninja(
        &dir,
        "build.ninja",
        "r = CC\nbuild out.o: $r in.c\n",
    );

    let stmts = parse(&top);
    assert_eq!(stmts[0].rule, "$r");
}
