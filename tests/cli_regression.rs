// Regression tests for the `brite` binary: exit codes, output files and
// miette-rendered diagnostics.

use std::fs;

use assert_cmd::Command;
use predicates::{prelude::PredicateBooleanExt, str::contains};

fn brite() -> Command {
    Command::cargo_bin("brite").unwrap()
}

#[test]
fn cli_reports_miette_diagnostics_on_error() {
    let dir = tempfile::tempdir().unwrap();
    let bad_file = dir.path().join("bad.bs");
    fs::write(&bad_file, "const a = 1;\nstruct 123Bad { }\n").unwrap();

    brite()
        .current_dir(dir.path())
        .arg("compile")
        .arg(&bad_file)
        .assert()
        .failure()
        .code(1)
        .stderr(
            contains("britescript::parse")
                .and(contains("line 2"))
                .and(contains("help:")),
        );
}

#[test]
fn compile_writes_sibling_ts_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("main.bs");
    fs::write(&input, "struct User { name: string age: number }\n").unwrap();

    brite()
        .current_dir(dir.path())
        .arg("compile")
        .arg(&input)
        .assert()
        .success()
        .stdout(contains("Compiled"));

    let output = fs::read_to_string(dir.path().join("main.ts")).unwrap();
    assert_eq!(output, "type User = {\n  name: string;\n  age: number;\n};\n");
}

#[test]
fn compile_honours_output_minify_and_strategy() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("shapes.bs");
    let output = dir.path().join("out.ts");
    fs::write(
        &input,
        "trait Area { area(): number }\nimpl Area for Square {\n  area() {\n    return self.side * self.side;\n  }\n}\n",
    )
    .unwrap();

    brite()
        .current_dir(dir.path())
        .args(["compile", "-m", "--trait-impl", "adapter", "-o"])
        .arg(&output)
        .arg(&input)
        .assert()
        .success();

    let code = fs::read_to_string(&output).unwrap();
    assert!(code.contains("class SquareArea implements Area {"));
    assert!(code.contains("\nconst self = this.self;\n"));
    assert!(!code.contains("\n\n"));
}

#[test]
fn missing_input_exits_with_one() {
    let dir = tempfile::tempdir().unwrap();
    brite()
        .current_dir(dir.path())
        .args(["compile", "nope.bs"])
        .assert()
        .failure()
        .code(1)
        .stderr(contains("britescript::io"));
}

#[test]
fn ast_dumps_json() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("a.bs");
    fs::write(&input, "let x = :ok\n").unwrap();

    brite()
        .arg("ast")
        .arg(&input)
        .assert()
        .success()
        .stdout(contains("\"LetDecl\"").and(contains("\"name\": \"ok\"")));
}

#[test]
fn init_and_build_project() {
    let dir = tempfile::tempdir().unwrap();

    brite()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(contains("britescript.yaml"));

    brite()
        .current_dir(dir.path())
        .arg("build")
        .assert()
        .success();

    let built = fs::read_to_string(dir.path().join("dist/main.ts")).unwrap();
    assert!(built.contains("const UserGreet = {"));
}

#[test]
fn version_and_help() {
    brite()
        .arg("version")
        .assert()
        .success()
        .stdout(contains("brite "));
    brite()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("compile").and(contains("repl")));
}

#[test]
fn repl_compiles_balanced_input() {
    brite()
        .arg("repl")
        .write_stdin("struct P {\n  x: number\n}\n:quit\n")
        .assert()
        .success()
        .stdout(contains("type P = {").and(contains("Goodbye!")));
}
