//! Integration tests for the `fm2js` binary.
//!
//! These tests verify:
//! - stdout carries exactly the JavaScript (or one JSON object)
//! - failures exit non-zero with a SCREAMING_SNAKE_CASE code
//! - error positions are reported as 1-based line and column

use std::io::Write;
use std::process::{Command, Output, Stdio};
use tempfile::tempdir;

fn fm2js() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_fm2js"));
    cmd.env_remove("FM2JS_MAX_PARSE_DEPTH")
        .env_remove("FM2JS_MAX_CODEGEN_DEPTH")
        .env_remove("RUST_LOG");
    cmd
}

fn run_with_stdin(mut cmd: Command, input: &[u8]) -> Output {
    let mut child = cmd
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn fm2js");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(input)
        .expect("Failed to write stdin");
    child.wait_with_output().expect("Failed to wait for fm2js")
}

fn parse_json(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.trim().starts_with('{'),
        "stdout should begin with '{{': {stdout}"
    );
    serde_json::from_str(&stdout).expect("stdout should be valid JSON")
}

#[test]
fn test_compile_file_to_stdout() {
    let dir = tempdir().unwrap();
    let script = dir.path().join("total.fc");
    std::fs::write(&script, "Sum(1, 2)").unwrap();

    let output = fm2js().arg(&script).output().unwrap();
    assert!(output.status.success(), "{output:?}");

    let stdout = String::from_utf8(output.stdout).unwrap();
    let expected = formcalc_parser_expected("Sum(1, 2)");
    assert_eq!(stdout.trim_end(), expected);
}

fn formcalc_parser_expected(source: &str) -> String {
    // The binary prints the compiler output followed by one newline.
    formcalc_parser::compile(source).unwrap()
}

#[test]
fn test_json_success() {
    let dir = tempdir().unwrap();
    let script = dir.path().join("total.fc");
    std::fs::write(&script, "a = 1").unwrap();

    let output = fm2js().arg("--json").arg(&script).output().unwrap();
    assert!(output.status.success());

    let json = parse_json(&output);
    assert_eq!(json["ok"], true);
    assert_eq!(json["input"], script.display().to_string());
    assert_eq!(
        json["javascript"].as_str(),
        Some(formcalc_parser_expected("a = 1").as_str())
    );
    assert!(json.get("error").is_none(), "error must be omitted: {json}");
}

#[test]
fn test_json_error_reports_position() {
    let dir = tempdir().unwrap();
    let script = dir.path().join("bad.fc");
    std::fs::write(&script, "a = 1\nif (a) then\n  b = Summ(1)\nendif").unwrap();

    let output = fm2js().arg("--json").arg(&script).output().unwrap();
    assert_eq!(output.status.code(), Some(1));

    let json = parse_json(&output);
    assert_eq!(json["ok"], false);
    assert!(json.get("javascript").is_none());
    let error = &json["error"];
    assert_eq!(error["code"], "FORMCALC_UNKNOWN_FUNCTION");
    assert_eq!(error["line"], 3);
    assert_eq!(error["column"], 7);
    assert!(error["message"].as_str().unwrap().contains("Summ"));
}

#[test]
fn test_json_read_failure() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("missing.fc");

    let output = fm2js().arg("--json").arg(&missing).output().unwrap();
    assert_eq!(output.status.code(), Some(1));

    let json = parse_json(&output);
    assert_eq!(json["ok"], false);
    assert_eq!(json["error"]["code"], "FM2JS_READ_FAILED");
    assert!(json["error"].get("line").is_none());
}

#[test]
fn test_stdin_dash() {
    let mut cmd = fm2js();
    cmd.arg("-");
    let output = run_with_stdin(cmd, b"var x = 5");
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8(output.stdout).unwrap().trim_end(),
        formcalc_parser_expected("var x = 5")
    );
}

#[test]
fn test_stdin_when_no_input_given() {
    let output = run_with_stdin(fm2js(), b"\xEF\xBB\xBFx = 1");
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8(output.stdout).unwrap().trim_end(),
        formcalc_parser_expected("x = 1")
    );
}

#[test]
fn test_output_file() {
    let dir = tempdir().unwrap();
    let script = dir.path().join("in.fc");
    let out = dir.path().join("out.js");
    std::fs::write(&script, "Concat(\"a\", \"b\")").unwrap();

    let output = fm2js()
        .arg(&script)
        .arg("-o")
        .arg(&out)
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(output.stdout.is_empty());

    let written = std::fs::read_to_string(&out).unwrap();
    assert_eq!(written, formcalc_parser_expected("Concat(\"a\", \"b\")"));
}

#[test]
fn test_json_with_output_file_omits_javascript() {
    let dir = tempdir().unwrap();
    let script = dir.path().join("in.fc");
    let out = dir.path().join("out.js");
    std::fs::write(&script, "1").unwrap();

    let output = fm2js()
        .arg("--json")
        .arg(&script)
        .arg("--output")
        .arg(&out)
        .output()
        .unwrap();
    assert!(output.status.success());

    let json = parse_json(&output);
    assert_eq!(json["ok"], true);
    assert_eq!(json["output"], out.display().to_string());
    assert!(json.get("javascript").is_none());
    assert!(out.exists());
}

#[test]
fn test_human_failure_goes_to_stderr() {
    let mut cmd = fm2js();
    cmd.arg("-");
    let output = run_with_stdin(cmd, b"a = \"unterminated");
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("unterminated string literal"),
        "stderr: {stderr}"
    );
}

#[test]
fn test_parse_depth_from_env() {
    let script = "((((((((((1))))))))))";

    let mut cmd = fm2js();
    cmd.args(["--json", "-"]).env("FM2JS_MAX_PARSE_DEPTH", "4");
    let output = run_with_stdin(cmd, script.as_bytes());
    assert_eq!(output.status.code(), Some(1));
    let json = parse_json(&output);
    assert_eq!(json["error"]["code"], "FORMCALC_PARSE_TOO_DEEP");

    let mut cmd = fm2js();
    cmd.args(["--json", "-"]);
    let output = run_with_stdin(cmd, script.as_bytes());
    assert!(output.status.success());
}

#[test]
fn test_codegen_depth_flag() {
    let mut cmd = fm2js();
    cmd.args(["--json", "--max-codegen-depth", "2", "-"]);
    let output = run_with_stdin(cmd, b"if (1) then if (2) then 3 endif endif");
    assert_eq!(output.status.code(), Some(1));
    let json = parse_json(&output);
    assert_eq!(json["error"]["code"], "FORMCALC_CODEGEN_TOO_DEEP");
}

#[test]
fn test_utf16le_input() {
    let mut bytes = vec![0xFF, 0xFE];
    for unit in "Sum(1, 2)".encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }

    let mut cmd = fm2js();
    cmd.arg("-");
    let output = run_with_stdin(cmd, &bytes);
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8(output.stdout).unwrap().trim_end(),
        formcalc_parser_expected("Sum(1, 2)")
    );
}
