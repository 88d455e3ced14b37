//! Token types for FormCalc.

use std::fmt;

use crate::span::Span;

/// A token: its kind, the source text that produced it, and where.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    /// Borrowed slice of the input. Empty for `Eof` and `Reserved`.
    pub text: &'a str,
    pub span: Span,
}

impl<'a> Token<'a> {
    #[inline]
    pub const fn new(kind: TokenKind, text: &'a str, span: Span) -> Self {
        Self { kind, text, span }
    }
}

/// The kind of token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // === Punctuation ===
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `,`
    Comma,
    /// `.`
    Dot,
    /// `..`
    DotDot,
    /// `.#`
    DotHash,
    /// `.*`
    DotStar,

    // === Operators ===
    /// `=`
    Assign,
    /// `==`
    EqEq,
    /// `<>`
    LtGt,
    /// `<`
    Lt,
    /// `<=`
    LtEq,
    /// `>`
    Gt,
    /// `>=`
    GtEq,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `&`
    Amp,
    /// `|`
    Pipe,

    // === Keyword operators ===
    KwEq,
    KwNe,
    KwLt,
    KwLe,
    KwGt,
    KwGe,
    And,
    Or,
    Not,

    // === Keywords ===
    Do,
    End,
    If,
    Then,
    Elseif,
    Else,
    Endif,
    While,
    Endwhile,
    For,
    Upto,
    Downto,
    Step,
    Endfor,
    Foreach,
    In,
    Func,
    Endfunc,
    Var,
    Break,
    Continue,
    Null,
    // Reserved words the grammar never accepts.
    Return,
    Exit,
    Throw,
    Nan,
    Infinity,

    // === Terminals ===
    Identifier,
    /// Numeric literal, kept as raw text.
    Number,
    /// String literal, raw text including both quotes.
    String,
    Eof,
    /// Produced once the lexer has hit an error.
    Reserved,
}

impl TokenKind {
    /// Source spelling for fixed tokens, or a description for terminals.
    pub const fn as_str(self) -> &'static str {
        match self {
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::Comma => ",",
            TokenKind::Dot => ".",
            TokenKind::DotDot => "..",
            TokenKind::DotHash => ".#",
            TokenKind::DotStar => ".*",
            TokenKind::Assign => "=",
            TokenKind::EqEq => "==",
            TokenKind::LtGt => "<>",
            TokenKind::Lt => "<",
            TokenKind::LtEq => "<=",
            TokenKind::Gt => ">",
            TokenKind::GtEq => ">=",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Amp => "&",
            TokenKind::Pipe => "|",
            TokenKind::KwEq => "eq",
            TokenKind::KwNe => "ne",
            TokenKind::KwLt => "lt",
            TokenKind::KwLe => "le",
            TokenKind::KwGt => "gt",
            TokenKind::KwGe => "ge",
            TokenKind::And => "and",
            TokenKind::Or => "or",
            TokenKind::Not => "not",
            TokenKind::Do => "do",
            TokenKind::End => "end",
            TokenKind::If => "if",
            TokenKind::Then => "then",
            TokenKind::Elseif => "elseif",
            TokenKind::Else => "else",
            TokenKind::Endif => "endif",
            TokenKind::While => "while",
            TokenKind::Endwhile => "endwhile",
            TokenKind::For => "for",
            TokenKind::Upto => "upto",
            TokenKind::Downto => "downto",
            TokenKind::Step => "step",
            TokenKind::Endfor => "endfor",
            TokenKind::Foreach => "foreach",
            TokenKind::In => "in",
            TokenKind::Func => "func",
            TokenKind::Endfunc => "endfunc",
            TokenKind::Var => "var",
            TokenKind::Break => "break",
            TokenKind::Continue => "continue",
            TokenKind::Null => "null",
            TokenKind::Return => "return",
            TokenKind::Exit => "exit",
            TokenKind::Throw => "throw",
            TokenKind::Nan => "nan",
            TokenKind::Infinity => "infinity",
            TokenKind::Identifier => "identifier",
            TokenKind::Number => "number",
            TokenKind::String => "string",
            TokenKind::Eof => "end of input",
            TokenKind::Reserved => "invalid input",
        }
    }

    /// Whether this is a word-shaped keyword (including `eq`, `and`, ...).
    pub fn is_keyword(self) -> bool {
        !matches!(
            self,
            TokenKind::Identifier | TokenKind::Number | TokenKind::String | TokenKind::Reserved
        ) && self.as_str().bytes().all(|b| b.is_ascii_lowercase())
    }

    /// Whether the token can begin a simple expression.
    pub fn starts_simple_expr(self) -> bool {
        matches!(
            self,
            TokenKind::Null
                | TokenKind::Number
                | TokenKind::String
                | TokenKind::Plus
                | TokenKind::Minus
                | TokenKind::Not
                | TokenKind::Identifier
                | TokenKind::LParen
        )
    }

    /// Whether the token closes an expression list.
    pub fn ends_expression_list(self) -> bool {
        matches!(
            self,
            TokenKind::Eof
                | TokenKind::Endfunc
                | TokenKind::Endif
                | TokenKind::Elseif
                | TokenKind::Else
                | TokenKind::Endwhile
                | TokenKind::Endfor
                | TokenKind::End
                | TokenKind::Reserved
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Identifier
            | TokenKind::Number
            | TokenKind::String
            | TokenKind::Eof
            | TokenKind::Reserved => f.write_str(self.as_str()),
            _ => write!(f, "`{}`", self.as_str()),
        }
    }
}

/// Look up a keyword. Matching is exact: `IF` is an identifier.
pub fn keyword_from_str(s: &str) -> Option<TokenKind> {
    match s {
        "do" => Some(TokenKind::Do),
        "eq" => Some(TokenKind::KwEq),
        "ge" => Some(TokenKind::KwGe),
        "gt" => Some(TokenKind::KwGt),
        "if" => Some(TokenKind::If),
        "in" => Some(TokenKind::In),
        "le" => Some(TokenKind::KwLe),
        "lt" => Some(TokenKind::KwLt),
        "ne" => Some(TokenKind::KwNe),
        "or" => Some(TokenKind::Or),
        "null" => Some(TokenKind::Null),
        "break" => Some(TokenKind::Break),
        "and" => Some(TokenKind::And),
        "end" => Some(TokenKind::End),
        "eof" => Some(TokenKind::Eof),
        "for" => Some(TokenKind::For),
        "nan" => Some(TokenKind::Nan),
        "not" => Some(TokenKind::Not),
        "var" => Some(TokenKind::Var),
        "then" => Some(TokenKind::Then),
        "else" => Some(TokenKind::Else),
        "exit" => Some(TokenKind::Exit),
        "downto" => Some(TokenKind::Downto),
        "return" => Some(TokenKind::Return),
        "infinity" => Some(TokenKind::Infinity),
        "endwhile" => Some(TokenKind::Endwhile),
        "foreach" => Some(TokenKind::Foreach),
        "endfunc" => Some(TokenKind::Endfunc),
        "elseif" => Some(TokenKind::Elseif),
        "while" => Some(TokenKind::While),
        "endfor" => Some(TokenKind::Endfor),
        "throw" => Some(TokenKind::Throw),
        "step" => Some(TokenKind::Step),
        "upto" => Some(TokenKind::Upto),
        "continue" => Some(TokenKind::Continue),
        "func" => Some(TokenKind::Func),
        "endif" => Some(TokenKind::Endif),
        _ => None,
    }
}

/// Every keyword spelling, in lookup-table order.
pub const KEYWORDS: &[&str] = &[
    "do", "eq", "ge", "gt", "if", "in", "le", "lt", "ne", "or", "null", "break", "and", "end",
    "eof", "for", "nan", "not", "var", "then", "else", "exit", "downto", "return", "infinity",
    "endwhile", "foreach", "endfunc", "elseif", "while", "endfor", "throw", "step", "upto",
    "continue", "func", "endif",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_keyword_resolves() {
        for word in KEYWORDS {
            let kind = keyword_from_str(word).unwrap_or_else(|| panic!("{word} is not a keyword"));
            if kind != TokenKind::Eof {
                assert_eq!(kind.as_str(), *word);
                assert!(kind.is_keyword(), "{word} should report as keyword");
            }
        }
    }

    #[test]
    fn test_keywords_are_case_sensitive() {
        assert_eq!(keyword_from_str("If"), None);
        assert_eq!(keyword_from_str("ENDIF"), None);
        assert_eq!(keyword_from_str("Null"), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(TokenKind::Endif.to_string(), "`endif`");
        assert_eq!(TokenKind::DotDot.to_string(), "`..`");
        assert_eq!(TokenKind::Identifier.to_string(), "identifier");
        assert_eq!(TokenKind::Eof.to_string(), "end of input");
    }
}
