// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Integration tests for the `talkc` binary.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

const COUNTER: &str = "Counter subclass: Object
  instanceVars: value:0
  method: increment [ value := value + 1 ]
  method: getValue [ ^ value ]
  method: reset [ _throw value ]
";

fn talkc() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_talkc"));
    command.env_remove("RUST_LOG");
    command
}

fn run_with_stdin(mut command: Command, stdin: &str) -> Output {
    let mut child = command
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn talkc");
    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(stdin.as_bytes())
        .expect("write stdin");
    child.wait_with_output().expect("wait for talkc")
}

fn write_source(dir: &Path, text: &str) -> std::path::PathBuf {
    let path = dir.join("counter.talk");
    std::fs::write(&path, text).expect("write source");
    path
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn tokenize_prints_token_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_source(dir.path(), "x := 1\n");
    let output = talkc().arg("tokenize").arg(&path).output().unwrap();
    assert!(output.status.success(), "{}", stderr(&output));

    let tokens: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let first = &tokens[0];
    assert_eq!(first["value"], "x");
    assert_eq!(first["line"], 1);
    assert_eq!(first["col"], 1);
}

#[test]
fn tokenize_reads_stdin() {
    let mut command = talkc();
    command.arg("tokenize");
    let output = run_with_stdin(command, "a + b");
    assert!(output.status.success());
    let tokens: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert!(tokens.as_array().is_some_and(|t| t.len() >= 3));
}

#[test]
fn parse_prints_declaration_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_source(dir.path(), COUNTER);
    let output = talkc().arg("parse").arg(&path).output().unwrap();
    assert!(output.status.success(), "{}", stderr(&output));

    let decl: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(decl["name"], "Counter");
    assert_eq!(decl["parent"], "Object");
    assert_eq!(decl["methods"].as_array().unwrap().len(), 3);
}

#[test]
fn parse_errors_exit_one() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_source(dir.path(), "A subclass: Object\n  method: broken [ x := 1\n");
    let output = talkc().arg("parse").arg(&path).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("declaration error"));
}

#[test]
fn compile_reads_declaration_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_source(dir.path(), COUNTER);
    let parsed = talkc().arg("parse").arg(&path).output().unwrap();
    assert!(parsed.status.success());

    let mut command = talkc();
    command.args(["compile", "--hash", "feed"]);
    let output = run_with_stdin(command, &stdout(&parsed));
    assert!(output.status.success(), "{}", stderr(&output));

    let go = stdout(&output);
    assert!(go.starts_with("// Code generated by talkc. DO NOT EDIT."));
    assert!(go.contains("func (c *Counter) Increment() {"));
    assert!(go.contains("\"feed\""));
    assert!(stderr(&output).contains("skipped reset:"));
}

#[test]
fn compile_dry_run_prints_summary() {
    let mut command = talkc();
    command.args(["compile", "--dry-run"]);
    let output = run_with_stdin(command, r#"{"name": "Empty", "parent": "Object"}"#);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(
        stdout(&output)
            .trim_end()
            .ends_with("bytes (0 methods compiled, 0 skipped)")
    );
}

#[test]
fn compile_rejects_bad_json() {
    let mut command = talkc();
    command.arg("compile");
    let output = run_with_stdin(command, "{not json");
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
}

#[test]
fn build_writes_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_source(dir.path(), COUNTER);
    let out = dir.path().join("counter.go");
    let output = talkc()
        .arg("build")
        .arg(&path)
        .arg("-o")
        .arg(&out)
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", stderr(&output));

    let go = std::fs::read_to_string(&out).unwrap();
    assert!(go.contains("package main"));
    assert!(go.contains("const _sourceCode = `Counter subclass: Object"));
    assert!(go.contains("_ \"modernc.org/sqlite\""));
    let hash_line = go.lines().find(|l| l.contains("_sourceHash")).unwrap();
    let hash = hash_line.split('"').nth(1).unwrap();
    assert_eq!(hash.len(), 64);
}

#[test]
fn build_plugin_mode() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_source(dir.path(), COUNTER);
    let output = talkc()
        .arg("build")
        .arg(&path)
        .args(["--mode", "plugin"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", stderr(&output));
    let go = stdout(&output);
    assert!(go.contains("//export Dispatch"));
    assert!(!go.contains("database/sql"));
}

#[test]
fn build_strict_fails_on_fallback() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_source(dir.path(), COUNTER);
    let output = talkc()
        .arg("build")
        .arg(&path)
        .arg("--strict")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let stderr = stderr(&output);
    assert!(stderr.contains("reset"));
    assert!(stderr.contains("`_throw`"), "{stderr}");
    assert!(output.stdout.is_empty());
}

#[test]
fn unknown_mode_is_a_usage_error() {
    let output = talkc()
        .args(["build", "x.talk", "--mode", "wasm"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(stderr(&output).contains("wasm"));
}
