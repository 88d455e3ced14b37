//! formcalc-parser: FormCalc to JavaScript compiler
//!
//! FormCalc is the scripting language of XFA forms. This crate turns a
//! FormCalc script into a self-contained JavaScript program that calls into
//! a host-provided runtime object (`pfm_rt`, see [`runtime`]).
//!
//! # Pipeline
//!
//! 1. **Lexing on demand**: the parser pulls tokens one at a time from the
//!    [`Lexer`].
//! 2. **Arena-based AST**: the [`Parser`] allocates every node in an
//!    [`Arena`] that lives for exactly one compilation.
//! 3. **Code generation**: [`Codegen`] walks the tree and writes the
//!    JavaScript text.
//!
//! Compilation is all-or-nothing. Recursion depth and output size are
//! bounded by [`ParserOptions`] and [`CodegenOptions`], so hostile input
//! fails with an error instead of exhausting the stack.
//!
//! # Example
//!
//! ```
//! let js = formcalc_parser::compile("Sum(1, 2)")?;
//! assert!(js.contains("pfm_ret = pfm_rt.Sum(1, 2);"));
//! # Ok::<(), formcalc_parser::CompileError>(())
//! ```

mod arena;
mod ast;
mod codegen;
mod error;
mod lexer;
mod parser;
mod span;
mod token;

pub mod codes;
pub mod runtime;

// Re-exports
pub use arena::Arena;
pub use ast::*;
pub use codegen::{
    Codegen, CodegenOptions, ReturnType, COMMENTS_ONLY, DEFAULT_MAX_CODEGEN_DEPTH,
    DEFAULT_MAX_OUTPUT_LEN,
};
pub use error::{CodegenError, CompileError, LexError, ParseError};
pub use lexer::{is_formcalc_char, Lexer};
pub use parser::{
    Parser, ParserOptions, DEFAULT_MAX_PARSE_DEPTH, MAX_EXPRESSION_LIST, MAX_POST_EXPRESSIONS,
};
pub use span::{LineIndex, Position, Span};
pub use token::{keyword_from_str, Token, TokenKind, KEYWORDS};

use tracing::{debug, trace};

/// Options for a whole compilation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompileOptions {
    pub parser: ParserOptions,
    pub codegen: CodegenOptions,
}

impl CompileOptions {
    #[must_use]
    pub fn with_parser(mut self, parser: ParserOptions) -> Self {
        self.parser = parser;
        self
    }

    #[must_use]
    pub fn with_codegen(mut self, codegen: CodegenOptions) -> Self {
        self.codegen = codegen;
        self
    }
}

/// Compile a FormCalc script with default limits.
pub fn compile(source: &str) -> Result<String, CompileError> {
    compile_with_options(source, &CompileOptions::default())
}

/// Compile a FormCalc script.
pub fn compile_with_options(source: &str, options: &CompileOptions) -> Result<String, CompileError> {
    debug!(input_len = source.len(), "compiling FormCalc");
    let result = compile_inner(source, options);
    match &result {
        Ok(js) => debug!(output_len = js.len(), "compiled FormCalc"),
        Err(err) => debug!(code = err.code(), offset = err.span().start, error = %err, "compile failed"),
    }
    result
}

fn compile_inner(source: &str, options: &CompileOptions) -> Result<String, CompileError> {
    let arena = Arena::with_capacity(source.len());
    let program = Parser::new(&arena, source, options.parser).parse()?;
    trace!(
        statements = program.stmts.len(),
        arena_bytes = arena.allocated_bytes(),
        "parsed"
    );
    let js = Codegen::new(options.codegen).generate(&program)?;
    trace!("generated");
    Ok(js)
}

/// Compile a script given as UTF-16 code units, the form XFA documents
/// carry. An unpaired surrogate is an invalid character; its span is an
/// offset into the decoded text.
pub fn compile_utf16(units: &[u16]) -> Result<String, CompileError> {
    compile_utf16_with_options(units, &CompileOptions::default())
}

/// [`compile_utf16`] with explicit limits.
pub fn compile_utf16_with_options(
    units: &[u16],
    options: &CompileOptions,
) -> Result<String, CompileError> {
    let mut source = String::with_capacity(units.len());
    for decoded in char::decode_utf16(units.iter().copied()) {
        match decoded {
            Ok(c) => source.push(c),
            Err(err) => {
                let offset = source.len() as u32;
                return Err(LexError::InvalidCharacter {
                    code: u32::from(err.unpaired_surrogate()),
                    span: Span::new(offset, offset + 1),
                }
                .into());
            }
        }
    }
    compile_with_options(&source, options)
}

/// Entry point behind the runtime's `Translate` helper (used by `Eval`).
/// An empty script translates to an empty string.
pub fn translate(source: &str) -> Result<String, CompileError> {
    if source.is_empty() {
        return Ok(String::new());
    }
    compile(source)
}
