#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::doc_markdown)]

mod commands;
mod logging;

use clap::Parser;
use formcalc_parser::{
    CodegenOptions, CompileOptions, ParserOptions, DEFAULT_MAX_CODEGEN_DEPTH,
    DEFAULT_MAX_PARSE_DEPTH,
};
use miette::Result;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "fm2js")]
#[command(author, version, about = "Compile FormCalc scripts to JavaScript", long_about = None)]
struct Cli {
    /// FormCalc script to compile (`-` or omitted reads stdin)
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Write JavaScript to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Increase logging verbosity (-v for DEBUG, -vv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Emit JSON formatted output (stable, machine-readable)
    #[arg(long)]
    json: bool,

    /// Maximum parser nesting depth
    #[arg(
        long,
        value_name = "N",
        env = "FM2JS_MAX_PARSE_DEPTH",
        default_value_t = DEFAULT_MAX_PARSE_DEPTH
    )]
    max_parse_depth: usize,

    /// Maximum code generator nesting depth
    #[arg(
        long,
        value_name = "N",
        env = "FM2JS_MAX_CODEGEN_DEPTH",
        default_value_t = DEFAULT_MAX_CODEGEN_DEPTH
    )]
    max_codegen_depth: usize,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(cli.verbose, cli.json);

    let input = cli.input.filter(|path| path.as_os_str() != "-");

    let options = CompileOptions::default()
        .with_parser(ParserOptions::default().with_max_depth(cli.max_parse_depth))
        .with_codegen(CodegenOptions::default().with_max_depth(cli.max_codegen_depth));

    let action = commands::compile::CompileAction {
        input,
        output: cli.output,
        options,
    };

    commands::compile::run(action, cli.json)
}
