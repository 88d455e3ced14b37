//! Error types for the FormCalc compiler.
//!
//! Compilation is all-or-nothing: any of these errors means no JavaScript
//! was produced. Each error carries a stable code (see [`crate::codes`]) and,
//! where one is known, the span of source text that caused it.

use thiserror::Error;

use crate::codes;
use crate::span::Span;
use crate::token::TokenKind;

/// Errors raised while scanning. The lexer stops at the first one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    /// Outside `0x09-0x0D`, `0x20-0xD7FF`, `0xE000-0xFFFD`.
    #[error("invalid character U+{code:04X}")]
    InvalidCharacter { code: u32, span: Span },

    #[error("unexpected character `{ch}`")]
    UnexpectedCharacter { ch: char, span: Span },

    #[error("unterminated string literal")]
    UnterminatedString { span: Span },

    #[error("malformed number literal")]
    MalformedNumber { span: Span },
}

impl LexError {
    pub fn span(&self) -> Span {
        match self {
            LexError::InvalidCharacter { span, .. }
            | LexError::UnexpectedCharacter { span, .. }
            | LexError::UnterminatedString { span }
            | LexError::MalformedNumber { span } => *span,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            LexError::InvalidCharacter { .. } => codes::FORMCALC_INVALID_CHARACTER,
            LexError::UnexpectedCharacter { .. } => codes::FORMCALC_UNEXPECTED_CHARACTER,
            LexError::UnterminatedString { .. } => codes::FORMCALC_UNTERMINATED_STRING,
            LexError::MalformedNumber { .. } => codes::FORMCALC_MALFORMED_NUMBER,
        }
    }
}

/// Errors raised while building the AST.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("expected {expected}, found {found}")]
    UnexpectedToken {
        expected: TokenKind,
        found: TokenKind,
        span: Span,
    },

    #[error("expected an expression, found {found}")]
    ExpectedExpression { found: TokenKind, span: Span },

    #[error("parentheses must contain an expression")]
    EmptyParens { span: Span },

    #[error("nesting exceeds the maximum parse depth of {limit}")]
    TooDeep { limit: usize, span: Span },

    #[error("more than {limit} arguments")]
    TooManyArguments { limit: usize, span: Span },

    #[error("accessor chain longer than {limit} links")]
    ChainTooLong { limit: usize, span: Span },

    #[error("more than {limit} expressions in one list")]
    TooManyExpressions { limit: usize, span: Span },

    #[error("unexpected {found} after the last expression")]
    TrailingInput { found: TokenKind, span: Span },
}

impl ParseError {
    pub fn span(&self) -> Span {
        match self {
            ParseError::Lex(err) => err.span(),
            ParseError::UnexpectedToken { span, .. }
            | ParseError::ExpectedExpression { span, .. }
            | ParseError::EmptyParens { span }
            | ParseError::TooDeep { span, .. }
            | ParseError::TooManyArguments { span, .. }
            | ParseError::ChainTooLong { span, .. }
            | ParseError::TooManyExpressions { span, .. }
            | ParseError::TrailingInput { span, .. } => *span,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ParseError::Lex(err) => err.code(),
            ParseError::UnexpectedToken { .. } | ParseError::ExpectedExpression { .. } => {
                codes::FORMCALC_UNEXPECTED_TOKEN
            }
            ParseError::EmptyParens { .. } => codes::FORMCALC_EMPTY_PARENS,
            ParseError::TooDeep { .. } => codes::FORMCALC_PARSE_TOO_DEEP,
            ParseError::TooManyArguments { .. } => codes::FORMCALC_TOO_MANY_ARGUMENTS,
            ParseError::ChainTooLong { .. } => codes::FORMCALC_CHAIN_TOO_LONG,
            ParseError::TooManyExpressions { .. } => codes::FORMCALC_TOO_MANY_EXPRESSIONS,
            ParseError::TrailingInput { .. } => codes::FORMCALC_TRAILING_INPUT,
        }
    }
}

/// Errors raised while emitting JavaScript.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodegenError {
    #[error("generated code exceeds the maximum nesting depth of {limit}")]
    TooDeep { limit: usize, span: Span },

    #[error("generated code exceeds the size limit of {limit} bytes")]
    OutputTooLarge { limit: usize, span: Span },

    #[error("`{name}` is not a built-in function")]
    UnknownFunction { name: String, span: Span },
}

impl CodegenError {
    pub fn span(&self) -> Span {
        match self {
            CodegenError::TooDeep { span, .. }
            | CodegenError::OutputTooLarge { span, .. }
            | CodegenError::UnknownFunction { span, .. } => *span,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            CodegenError::TooDeep { .. } => codes::FORMCALC_CODEGEN_TOO_DEEP,
            CodegenError::OutputTooLarge { .. } => codes::FORMCALC_OUTPUT_TOO_LARGE,
            CodegenError::UnknownFunction { .. } => codes::FORMCALC_UNKNOWN_FUNCTION,
        }
    }
}

/// Any failure of [`crate::compile`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Codegen(#[from] CodegenError),
}

impl From<LexError> for CompileError {
    fn from(err: LexError) -> Self {
        CompileError::Parse(ParseError::Lex(err))
    }
}

impl CompileError {
    pub fn span(&self) -> Span {
        match self {
            CompileError::Parse(err) => err.span(),
            CompileError::Codegen(err) => err.span(),
        }
    }

    /// Stable SCREAMING_SNAKE_CASE code.
    pub fn code(&self) -> &'static str {
        match self {
            CompileError::Parse(err) => err.code(),
            CompileError::Codegen(err) => err.code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = LexError::InvalidCharacter {
            code: 0x1,
            span: Span::new(3, 4),
        };
        assert_eq!(err.to_string(), "invalid character U+0001");

        let err = ParseError::UnexpectedToken {
            expected: TokenKind::Endif,
            found: TokenKind::Eof,
            span: Span::empty(10),
        };
        assert_eq!(err.to_string(), "expected `endif`, found end of input");
    }

    #[test]
    fn test_lex_errors_keep_code_and_span_through_compile_error() {
        let lex = LexError::UnterminatedString {
            span: Span::new(2, 9),
        };
        let err = CompileError::from(lex.clone());
        assert_eq!(err.code(), codes::FORMCALC_UNTERMINATED_STRING);
        assert_eq!(err.span(), Span::new(2, 9));
        assert_eq!(err.to_string(), lex.to_string());
    }

    #[test]
    fn test_every_code_is_registered() {
        let errors = [
            CompileError::from(CodegenError::UnknownFunction {
                name: "foo".into(),
                span: Span::default(),
            }),
            CompileError::from(ParseError::TrailingInput {
                found: TokenKind::Endif,
                span: Span::default(),
            }),
        ];
        for err in errors {
            assert!(codes::ALL.contains(&err.code()));
        }
    }
}
