//! `fm2js` compile command implementation.
//!
//! Reads one FormCalc script, compiles it and writes the JavaScript to stdout
//! or a file. With `--json` both outcomes are reported as a single JSON
//! object on stdout.

use formcalc_parser::{CompileError, CompileOptions, LineIndex};
use miette::{IntoDiagnostic, LabeledSpan, NamedSource, Result};
use serde::Serialize;
use std::io::Read;
use std::path::PathBuf;
use tracing::{debug, info};

/// The input could not be read or decoded.
pub const FM2JS_READ_FAILED: &str = "FM2JS_READ_FAILED";
/// The output file could not be written.
pub const FM2JS_WRITE_FAILED: &str = "FM2JS_WRITE_FAILED";

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16LE_BOM: &[u8] = &[0xFF, 0xFE];

/// Compile command action.
#[derive(Debug, Clone)]
pub struct CompileAction {
    /// Script file (if None, reads stdin).
    pub input: Option<PathBuf>,
    /// Output file (if None, prints to stdout).
    pub output: Option<PathBuf>,
    /// Compiler limits.
    pub options: CompileOptions,
}

impl CompileAction {
    fn input_name(&self) -> String {
        self.input
            .as_ref()
            .map_or_else(|| "<stdin>".to_string(), |p| p.display().to_string())
    }
}

/// JSON output for the compile command.
#[derive(Serialize)]
struct CompileResultJson {
    ok: bool,
    input: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    javascript: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<CompileErrorJson>,
}

#[derive(Serialize)]
struct CompileErrorJson {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    line: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    column: Option<u32>,
}

/// A decoded script ready for compilation.
struct Script {
    /// Text shown in diagnostics and used for line/column lookup.
    text: String,
    /// Code units when the input was UTF-16, compiled as-is.
    utf16: Option<Vec<u16>>,
}

/// Run the compile command.
pub fn run(action: CompileAction, json: bool) -> Result<()> {
    let name = action.input_name();

    let script = match read_input(&action) {
        Ok(script) => script,
        Err(message) => return fail(&action, json, FM2JS_READ_FAILED, &message),
    };
    debug!(
        input = %name,
        bytes = script.text.len(),
        utf16 = script.utf16.is_some(),
        "read script"
    );

    let compiled = match &script.utf16 {
        Some(units) => formcalc_parser::compile_utf16_with_options(units, &action.options),
        None => formcalc_parser::compile_with_options(&script.text, &action.options),
    };

    let javascript = match compiled {
        Ok(js) => js,
        Err(err) => return fail_compile(&action, json, &name, script.text, &err),
    };

    if let Some(path) = &action.output {
        if let Err(e) = std::fs::write(path, &javascript) {
            let message = format!("failed to write {}: {e}", path.display());
            return fail(&action, json, FM2JS_WRITE_FAILED, &message);
        }
        info!(output = %path.display(), bytes = javascript.len(), "wrote JavaScript");
    }

    if json {
        let result = CompileResultJson {
            ok: true,
            input: name,
            output: action.output.as_ref().map(|p| p.display().to_string()),
            javascript: action.output.is_none().then_some(javascript),
            error: None,
        };
        println!("{}", serde_json::to_string(&result).into_diagnostic()?);
    } else if action.output.is_none() {
        println!("{javascript}");
    }

    Ok(())
}

fn read_input(action: &CompileAction) -> std::result::Result<Script, String> {
    let bytes = match &action.input {
        Some(path) => std::fs::read(path)
            .map_err(|e| format!("failed to read {}: {e}", path.display()))?,
        None => {
            let mut buf = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buf)
                .map_err(|e| format!("failed to read stdin: {e}"))?;
            buf
        }
    };
    decode(&bytes)
}

/// UTF-16LE when the input starts with its byte order mark, UTF-8 otherwise.
fn decode(bytes: &[u8]) -> std::result::Result<Script, String> {
    if let Some(rest) = bytes.strip_prefix(UTF16LE_BOM) {
        if rest.len() % 2 != 0 {
            return Err("UTF-16 input has an odd number of bytes".to_string());
        }
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        return Ok(Script {
            text: String::from_utf16_lossy(&units),
            utf16: Some(units),
        });
    }

    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let text = std::str::from_utf8(bytes)
        .map_err(|e| format!("input is not valid UTF-8: {e}"))?
        .to_string();
    Ok(Script { text, utf16: None })
}

fn fail(action: &CompileAction, json: bool, code: &str, message: &str) -> Result<()> {
    if json {
        let result = CompileResultJson {
            ok: false,
            input: action.input_name(),
            output: action.output.as_ref().map(|p| p.display().to_string()),
            javascript: None,
            error: Some(CompileErrorJson {
                code: code.to_string(),
                message: message.to_string(),
                line: None,
                column: None,
            }),
        };
        println!("{}", serde_json::to_string(&result).into_diagnostic()?);
        std::process::exit(1);
    }
    Err(miette::miette!(code = code.to_string(), "{message}"))
}

fn fail_compile(
    action: &CompileAction,
    json: bool,
    name: &str,
    source: String,
    err: &CompileError,
) -> Result<()> {
    let span = err.span();
    let position = LineIndex::new(&source).position(span.start);
    debug!(
        code = err.code(),
        line = position.line,
        column = position.column,
        "compile failed"
    );

    if json {
        let result = CompileResultJson {
            ok: false,
            input: name.to_string(),
            output: action.output.as_ref().map(|p| p.display().to_string()),
            javascript: None,
            error: Some(CompileErrorJson {
                code: err.code().to_string(),
                message: err.to_string(),
                line: Some(position.line),
                column: Some(position.column),
            }),
        };
        println!("{}", serde_json::to_string(&result).into_diagnostic()?);
        std::process::exit(1);
    }

    // Spans of UTF-16 input index the decoded text, which may be shorter
    // than the lossy display text but never longer.
    let end = span.range().end.min(source.len());
    let start = span.range().start.min(end);
    let report = miette::miette!(
        labels = vec![LabeledSpan::at(start..end, "here")],
        code = err.code().to_string(),
        "{err}"
    );
    Err(report.with_source_code(NamedSource::new(name, source)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_utf8() {
        let script = decode(b"Sum(1, 2)").unwrap();
        assert_eq!(script.text, "Sum(1, 2)");
        assert!(script.utf16.is_none());
    }

    #[test]
    fn test_decode_skips_utf8_bom() {
        let script = decode(b"\xEF\xBB\xBFa = 1").unwrap();
        assert_eq!(script.text, "a = 1");
    }

    #[test]
    fn test_decode_rejects_invalid_utf8() {
        let err = decode(b"a = \xFF").err().unwrap();
        assert!(err.contains("not valid UTF-8"), "{err}");
    }

    #[test]
    fn test_decode_utf16le() {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "a = 1".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        let script = decode(&bytes).unwrap();
        assert_eq!(script.text, "a = 1");
        assert_eq!(script.utf16.unwrap(), "a = 1".encode_utf16().collect::<Vec<_>>());
    }

    #[test]
    fn test_decode_rejects_odd_utf16() {
        let err = decode(&[0xFF, 0xFE, b'a']).err().unwrap();
        assert!(err.contains("odd number of bytes"), "{err}");
    }

    #[test]
    fn test_input_name() {
        let mut action = CompileAction {
            input: None,
            output: None,
            options: CompileOptions::default(),
        };
        assert_eq!(action.input_name(), "<stdin>");
        action.input = Some(PathBuf::from("form.fc"));
        assert_eq!(action.input_name(), "form.fc");
    }
}
