//! Lexer (tokenizer) for FormCalc.
//!
//! The parser pulls one token at a time with [`Lexer::next_token`]; there is
//! no token buffer. The first error poisons the lexer: the failing call and
//! every call after it return a `Reserved` token, and the error is available
//! from [`Lexer::error`].

use crate::error::LexError;
use crate::span::Span;
use crate::token::{keyword_from_str, Token, TokenKind};

/// Whether `c` may appear anywhere in a FormCalc script.
#[inline]
pub fn is_formcalc_char(c: char) -> bool {
    matches!(c as u32, 0x09..=0x0D | 0x20..=0xD7FF | 0xE000..=0xFFFD)
}

#[inline]
fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || matches!(c, '_' | '$' | '!')
}

#[inline]
fn is_identifier_part(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '$')
}

/// The lexer state.
#[derive(Clone)]
pub struct Lexer<'a> {
    source: &'a str,
    /// Current byte position.
    pos: usize,
    /// Start position of the current token.
    token_start: usize,
    error: Option<LexError>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: 0,
            token_start: 0,
            error: None,
        }
    }

    /// Get the current byte position.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// True once the whole input has been consumed.
    pub fn is_complete(&self) -> bool {
        self.pos >= self.source.len()
    }

    /// The error that poisoned the lexer, if any.
    pub fn error(&self) -> Option<&LexError> {
        self.error.as_ref()
    }

    /// Get the next token.
    pub fn next_token(&mut self) -> Token<'a> {
        if let Some(err) = &self.error {
            return Token::new(TokenKind::Reserved, "", err.span());
        }
        match self.scan() {
            Ok(token) => token,
            Err(err) => {
                tracing::trace!(code = err.code(), offset = err.span().start, "lexer poisoned");
                let token = Token::new(TokenKind::Reserved, "", err.span());
                self.error = Some(err);
                token
            }
        }
    }

    fn scan(&mut self) -> Result<Token<'a>, LexError> {
        loop {
            self.token_start = self.pos;
            let Some(ch) = self.current() else {
                return Ok(self.make_token(TokenKind::Eof));
            };
            self.check_char(ch)?;

            let kind = match ch {
                // Line terminators only separate tokens.
                '\n' | '\r' | '\t' | '\u{0B}' | '\u{0C}' | ' ' => {
                    self.advance();
                    continue;
                }
                ';' => {
                    self.skip_comment()?;
                    continue;
                }
                '"' => self.scan_string()?,
                '0'..='9' => self.scan_number()?,

                '(' => self.single(TokenKind::LParen),
                ')' => self.single(TokenKind::RParen),
                '[' => self.single(TokenKind::LBracket),
                ']' => self.single(TokenKind::RBracket),
                ',' => self.single(TokenKind::Comma),
                '&' => self.single(TokenKind::Amp),
                '|' => self.single(TokenKind::Pipe),
                '+' => self.single(TokenKind::Plus),
                '-' => self.single(TokenKind::Minus),
                '*' => self.single(TokenKind::Star),

                '=' => {
                    self.advance();
                    if self.eat('=') {
                        TokenKind::EqEq
                    } else {
                        TokenKind::Assign
                    }
                }
                '<' => {
                    self.advance();
                    if self.eat('=') {
                        TokenKind::LtEq
                    } else if self.eat('>') {
                        TokenKind::LtGt
                    } else {
                        TokenKind::Lt
                    }
                }
                '>' => {
                    self.advance();
                    if self.eat('=') {
                        TokenKind::GtEq
                    } else {
                        TokenKind::Gt
                    }
                }
                '/' => {
                    self.advance();
                    if self.current() == Some('/') {
                        self.skip_comment()?;
                        continue;
                    }
                    TokenKind::Slash
                }
                '.' => self.scan_dot()?,

                c if is_identifier_start(c) => self.scan_identifier()?,

                c => {
                    return Err(LexError::UnexpectedCharacter {
                        ch: c,
                        span: self.char_span(c),
                    })
                }
            };

            return Ok(self.make_token(kind));
        }
    }

    // === Helper methods ===

    fn current(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn peek_char(&self) -> Option<char> {
        let mut chars = self.source[self.pos..].chars();
        chars.next();
        chars.next()
    }

    fn advance(&mut self) {
        if let Some(c) = self.current() {
            self.pos += c.len_utf8();
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.current() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.advance();
        kind
    }

    fn make_token(&self, kind: TokenKind) -> Token<'a> {
        Token::new(
            kind,
            &self.source[self.token_start..self.pos],
            Span::new(self.token_start as u32, self.pos as u32),
        )
    }

    fn char_span(&self, c: char) -> Span {
        Span::new(self.pos as u32, (self.pos + c.len_utf8()) as u32)
    }

    fn token_span(&self) -> Span {
        Span::new(self.token_start as u32, self.pos as u32)
    }

    fn check_char(&self, c: char) -> Result<(), LexError> {
        if is_formcalc_char(c) {
            Ok(())
        } else {
            Err(LexError::InvalidCharacter {
                code: c as u32,
                span: self.char_span(c),
            })
        }
    }

    // === Comments ===

    /// Skip from the comment introducer through the line terminator.
    /// Called with the cursor on `;` or on the second `/` of `//`.
    fn skip_comment(&mut self) -> Result<(), LexError> {
        self.advance();
        while let Some(c) = self.current() {
            self.check_char(c)?;
            self.advance();
            if c == '\r' || c == '\n' {
                break;
            }
        }
        Ok(())
    }

    // === Token scanning ===

    fn scan_string(&mut self) -> Result<TokenKind, LexError> {
        self.advance(); // opening quote
        while let Some(c) = self.current() {
            self.check_char(c)?;
            self.advance();
            if c != '"' {
                continue;
            }
            match self.current() {
                // `""` is an escaped quote inside the literal.
                Some('"') => self.advance(),
                Some(next) => {
                    self.check_char(next)?;
                    return Ok(TokenKind::String);
                }
                None => return Ok(TokenKind::String),
            }
        }
        Err(LexError::UnterminatedString {
            span: self.token_span(),
        })
    }

    /// Digits, an optional fraction and an optional exponent. An exponent
    /// marker without digits is left behind, so `3e` fails on the letter.
    fn scan_number(&mut self) -> Result<TokenKind, LexError> {
        let start = self.pos;
        self.eat_digits();
        if self.eat('.') {
            self.eat_digits();
        }
        if matches!(self.current(), Some('e' | 'E')) {
            let mark = self.pos;
            self.advance();
            if matches!(self.current(), Some('+' | '-')) {
                self.advance();
            }
            if matches!(self.current(), Some('0'..='9')) {
                self.eat_digits();
            } else {
                self.pos = mark;
            }
        }

        let trailing_letter = self.current().filter(|c| c.is_alphabetic());
        if self.pos == start || trailing_letter.is_some() {
            let end = self.pos + trailing_letter.map_or(0, char::len_utf8);
            return Err(LexError::MalformedNumber {
                span: Span::new(self.token_start as u32, end as u32),
            });
        }
        Ok(TokenKind::Number)
    }

    fn eat_digits(&mut self) {
        while matches!(self.current(), Some('0'..='9')) {
            self.advance();
        }
    }

    fn scan_dot(&mut self) -> Result<TokenKind, LexError> {
        match self.peek_char() {
            Some('.') => {
                self.pos += 2;
                Ok(TokenKind::DotDot)
            }
            Some('*') => {
                self.pos += 2;
                Ok(TokenKind::DotStar)
            }
            Some('#') => {
                self.pos += 2;
                Ok(TokenKind::DotHash)
            }
            // `.5` is a number without an integer part.
            Some('0'..='9') => self.scan_number(),
            _ => {
                self.advance();
                Ok(TokenKind::Dot)
            }
        }
    }

    fn scan_identifier(&mut self) -> Result<TokenKind, LexError> {
        self.advance();
        while let Some(c) = self.current() {
            self.check_char(c)?;
            if !is_identifier_part(c) {
                break;
            }
            self.advance();
        }
        let text = &self.source[self.token_start..self.pos];
        Ok(keyword_from_str(text).unwrap_or(TokenKind::Identifier))
    }
}
