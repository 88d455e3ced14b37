//! Recursive-descent parser for FormCalc.
//!
//! One token of lookahead, one function per precedence layer. There is no
//! error recovery: the first mismatch is returned as a [`ParseError`] and
//! nothing is built.
//!
//! Every recursive production goes through [`Parser::nested`], which bumps a
//! depth counter, fails once it reaches the configured maximum, and restores
//! it on the way out. Binary layers additionally count each operator they
//! consume, so long flat chains are bounded as well as deep ones.

use crate::arena::{Arena, Vec};
use crate::ast::*;
use crate::error::ParseError;
use crate::lexer::Lexer;
use crate::span::Span;
use crate::token::{Token, TokenKind};

/// Default recursion ceiling for [`ParserOptions`].
pub const DEFAULT_MAX_PARSE_DEPTH: usize = 1250;

/// Longest accessor/call chain after a primary, and longest argument list.
pub const MAX_POST_EXPRESSIONS: usize = 256;

/// Most statements accepted in a single expression list.
pub const MAX_EXPRESSION_LIST: usize = 10_000;

/// Parser configuration options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserOptions {
    /// Parsing fails once the recursion depth reaches this value.
    pub max_depth: usize,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_PARSE_DEPTH,
        }
    }
}

impl ParserOptions {
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// Arena-backed FormCalc parser.
pub struct Parser<'a> {
    arena: &'a Arena,
    lexer: Lexer<'a>,
    source: &'a str,
    current: Token<'a>,
    /// Span of the most recently consumed token.
    prev: Span,
    depth: usize,
    max_depth: usize,
}

impl<'a> Parser<'a> {
    pub fn new(arena: &'a Arena, source: &'a str, options: ParserOptions) -> Self {
        Self {
            arena,
            lexer: Lexer::new(source),
            source,
            current: Token::new(TokenKind::Eof, "", Span::empty(0)),
            prev: Span::empty(0),
            depth: 0,
            max_depth: options.max_depth,
        }
    }

    /// Parse the whole script.
    pub fn parse(mut self) -> Result<Program<'a>, ParseError> {
        self.advance()?;
        let stmts = self.parse_expression_list()?;

        // A closing keyword with nothing to close, or an `eof` keyword in
        // the middle of the text, leaves input behind.
        if self.current.kind != TokenKind::Eof || !self.lexer.is_complete() {
            return Err(ParseError::TrailingInput {
                found: self.current.kind,
                span: self.current.span,
            });
        }

        Ok(Program::new(stmts, Span::new(0, self.source.len() as u32)))
    }

    // =========================================================================
    // Token Handling
    // =========================================================================

    fn peek(&self) -> TokenKind {
        self.current.kind
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    fn advance(&mut self) -> Result<Token<'a>, ParseError> {
        let next = self.lexer.next_token();
        if next.kind == TokenKind::Reserved {
            return Err(match self.lexer.error() {
                Some(err) => ParseError::Lex(err.clone()),
                None => ParseError::ExpectedExpression {
                    found: next.kind,
                    span: next.span,
                },
            });
        }
        self.prev = self.current.span;
        Ok(std::mem::replace(&mut self.current, next))
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token<'a>, ParseError> {
        if self.at(kind) {
            self.advance()
        } else {
            Err(ParseError::UnexpectedToken {
                expected: kind,
                found: self.current.kind,
                span: self.current.span,
            })
        }
    }

    fn eat(&mut self, kind: TokenKind) -> Result<bool, ParseError> {
        if self.at(kind) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn span_from(&self, start: u32) -> Span {
        Span::new(start, self.prev.end.max(start))
    }

    fn vec<T>(&self) -> Vec<'a, T> {
        self.arena.vec()
    }

    fn alloc(&self, kind: ExprKind<'a>, span: Span) -> &'a Expr<'a> {
        self.arena.alloc(Expr::new(kind, span))
    }

    // =========================================================================
    // Depth Guard
    // =========================================================================

    fn enter(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth < self.max_depth {
            Ok(())
        } else {
            Err(ParseError::TooDeep {
                limit: self.max_depth,
                span: self.current.span,
            })
        }
    }

    fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        let saved = self.depth;
        let result = match self.enter() {
            Ok(()) => f(self),
            Err(err) => Err(err),
        };
        self.depth = saved;
        result
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn parse_expression_list(&mut self) -> Result<&'a [Stmt<'a>], ParseError> {
        self.nested(|p| {
            let mut stmts = p.vec();
            while !p.peek().ends_expression_list() {
                let stmt = if p.at(TokenKind::Func) {
                    p.parse_function()?
                } else {
                    p.parse_expression()?
                };
                stmts.push(stmt);
                if stmts.len() > MAX_EXPRESSION_LIST {
                    return Err(ParseError::TooManyExpressions {
                        limit: MAX_EXPRESSION_LIST,
                        span: stmt.span,
                    });
                }
            }
            Ok(stmts.into_bump_slice())
        })
    }

    fn parse_block(&mut self) -> Result<Block<'a>, ParseError> {
        let start = self.current.span.start;
        let stmts = self.parse_expression_list()?;
        Ok(Block {
            stmts,
            span: self.span_from(start),
        })
    }

    /// `func name(a, b) do ... endfunc`
    fn parse_function(&mut self) -> Result<Stmt<'a>, ParseError> {
        self.nested(|p| {
            let start = p.current.span.start;
            p.expect(TokenKind::Func)?;
            let name = p.expect(TokenKind::Identifier)?.text;
            p.expect(TokenKind::LParen)?;

            let mut params = p.vec();
            if !p.at(TokenKind::RParen) {
                loop {
                    params.push(p.expect(TokenKind::Identifier)?.text);
                    if !p.eat(TokenKind::Comma)? {
                        break;
                    }
                }
            }
            p.expect(TokenKind::RParen)?;
            p.expect(TokenKind::Do)?;
            let body = p.parse_expression_list()?;
            p.expect(TokenKind::Endfunc)?;

            let function = p.arena.alloc(Function {
                name,
                params: params.into_bump_slice(),
                body,
            });
            Ok(Stmt::new(StmtKind::Function(function), p.span_from(start)))
        })
    }

    fn parse_expression(&mut self) -> Result<Stmt<'a>, ParseError> {
        self.nested(|p| {
            let start = p.current.span.start;
            let kind = match p.peek() {
                TokenKind::Var => p.parse_var()?,
                TokenKind::If => p.parse_if()?,
                TokenKind::While => p.parse_while()?,
                TokenKind::For => p.parse_for()?,
                TokenKind::Foreach => p.parse_foreach()?,
                TokenKind::Do => p.parse_do()?,
                TokenKind::Break => {
                    p.advance()?;
                    StmtKind::Break
                }
                TokenKind::Continue => {
                    p.advance()?;
                    StmtKind::Continue
                }
                kind if kind.starts_simple_expr() => p.parse_exp_expression()?,
                found => {
                    return Err(ParseError::ExpectedExpression {
                        found,
                        span: p.current.span,
                    })
                }
            };
            Ok(Stmt::new(kind, p.span_from(start)))
        })
    }

    /// `var name` or `var name = expr`
    fn parse_var(&mut self) -> Result<StmtKind<'a>, ParseError> {
        self.nested(|p| {
            p.expect(TokenKind::Var)?;
            let name = p.expect(TokenKind::Identifier)?.text;
            let init = if p.eat(TokenKind::Assign)? {
                Some(p.parse_simple_expression()?)
            } else {
                None
            };
            Ok(StmtKind::Var { name, init })
        })
    }

    /// A simple expression, optionally assigned to. The value side is a
    /// simple expression too, so `a = b = c` leaves a stray `=` behind.
    fn parse_exp_expression(&mut self) -> Result<StmtKind<'a>, ParseError> {
        self.nested(|p| {
            let start = p.current.span.start;
            let target = p.parse_simple_expression()?;
            if !p.eat(TokenKind::Assign)? {
                return Ok(StmtKind::Expr(target));
            }
            let value = p.parse_simple_expression()?;
            let assign = p.alloc(ExprKind::Assign { target, value }, p.span_from(start));
            Ok(StmtKind::Expr(assign))
        })
    }

    /// `if (c) then ... (elseif (c) then ...)* (else ...)? endif`
    fn parse_if(&mut self) -> Result<StmtKind<'a>, ParseError> {
        self.nested(|p| {
            p.expect(TokenKind::If)?;
            let cond = p.parse_paren()?;
            p.expect(TokenKind::Then)?;
            let then_branch = p.parse_block()?;

            let mut else_ifs = p.vec();
            while p.eat(TokenKind::Elseif)? {
                let cond = p.parse_paren()?;
                p.expect(TokenKind::Then)?;
                let body = p.parse_block()?;
                else_ifs.push(ElseIf { cond, body });
            }

            let else_branch = if p.eat(TokenKind::Else)? {
                Some(p.parse_block()?)
            } else {
                None
            };
            p.expect(TokenKind::Endif)?;

            Ok(StmtKind::If(p.arena.alloc(IfStmt {
                cond,
                then_branch,
                else_ifs: else_ifs.into_bump_slice(),
                else_branch,
            })))
        })
    }

    /// `while (c) do ... endwhile`
    fn parse_while(&mut self) -> Result<StmtKind<'a>, ParseError> {
        self.nested(|p| {
            p.expect(TokenKind::While)?;
            let cond = p.parse_paren()?;
            p.expect(TokenKind::Do)?;
            let body = p.parse_block()?;
            p.expect(TokenKind::Endwhile)?;
            Ok(StmtKind::While { cond, body })
        })
    }

    /// `for i = a upto|downto b (step s)? do ... endfor`
    fn parse_for(&mut self) -> Result<StmtKind<'a>, ParseError> {
        self.nested(|p| {
            p.expect(TokenKind::For)?;
            let var = p.expect(TokenKind::Identifier)?.text;
            p.expect(TokenKind::Assign)?;
            let start = p.parse_simple_expression()?;

            let direction = match p.peek() {
                TokenKind::Upto => ForDirection::Upto,
                TokenKind::Downto => ForDirection::Downto,
                found => {
                    return Err(ParseError::UnexpectedToken {
                        expected: TokenKind::Upto,
                        found,
                        span: p.current.span,
                    })
                }
            };
            p.advance()?;
            let end = p.parse_simple_expression()?;
            let step = if p.eat(TokenKind::Step)? {
                Some(p.parse_simple_expression()?)
            } else {
                None
            };

            p.expect(TokenKind::Do)?;
            let body = p.parse_block()?;
            p.expect(TokenKind::Endfor)?;

            Ok(StmtKind::For(p.arena.alloc(ForStmt {
                var,
                start,
                end,
                direction,
                step,
                body,
            })))
        })
    }

    /// `foreach v in (a, b) do ... endfor`
    fn parse_foreach(&mut self) -> Result<StmtKind<'a>, ParseError> {
        self.nested(|p| {
            p.expect(TokenKind::Foreach)?;
            let var = p.expect(TokenKind::Identifier)?.text;
            p.expect(TokenKind::In)?;
            let collections = p.parse_argument_list()?;
            if collections.is_empty() {
                return Err(ParseError::ExpectedExpression {
                    found: TokenKind::RParen,
                    span: p.prev,
                });
            }
            p.expect(TokenKind::Do)?;
            let body = p.parse_block()?;
            p.expect(TokenKind::Endfor)?;

            Ok(StmtKind::Foreach(p.arena.alloc(ForeachStmt {
                var,
                collections,
                body,
            })))
        })
    }

    /// `do ... end`
    fn parse_do(&mut self) -> Result<StmtKind<'a>, ParseError> {
        self.nested(|p| {
            p.expect(TokenKind::Do)?;
            let body = p.parse_block()?;
            p.expect(TokenKind::End)?;
            Ok(StmtKind::Do(body))
        })
    }

    // =========================================================================
    // Simple Expressions
    // =========================================================================

    fn parse_simple_expression(&mut self) -> Result<&'a Expr<'a>, ParseError> {
        self.parse_logical_or()
    }

    /// One left-associative precedence layer.
    fn parse_binary_layer(
        &mut self,
        operand: fn(&mut Self) -> Result<&'a Expr<'a>, ParseError>,
        operator: fn(TokenKind) -> Option<BinaryOp>,
    ) -> Result<&'a Expr<'a>, ParseError> {
        self.nested(|p| {
            let start = p.current.span.start;
            let mut left = operand(p)?;
            while let Some(op) = operator(p.peek()) {
                p.enter()?;
                p.advance()?;
                let right = operand(p)?;
                left = p.alloc(ExprKind::Binary { op, left, right }, p.span_from(start));
            }
            Ok(left)
        })
    }

    fn parse_logical_or(&mut self) -> Result<&'a Expr<'a>, ParseError> {
        self.parse_binary_layer(Self::parse_logical_and, |kind| match kind {
            TokenKind::Pipe | TokenKind::Or => Some(BinaryOp::Or),
            _ => None,
        })
    }

    fn parse_logical_and(&mut self) -> Result<&'a Expr<'a>, ParseError> {
        self.parse_binary_layer(Self::parse_equality, |kind| match kind {
            TokenKind::Amp | TokenKind::And => Some(BinaryOp::And),
            _ => None,
        })
    }

    fn parse_equality(&mut self) -> Result<&'a Expr<'a>, ParseError> {
        self.parse_binary_layer(Self::parse_relational, |kind| match kind {
            TokenKind::EqEq | TokenKind::KwEq => Some(BinaryOp::Eq),
            TokenKind::LtGt | TokenKind::KwNe => Some(BinaryOp::Ne),
            _ => None,
        })
    }

    fn parse_relational(&mut self) -> Result<&'a Expr<'a>, ParseError> {
        self.parse_binary_layer(Self::parse_additive, |kind| match kind {
            TokenKind::Lt | TokenKind::KwLt => Some(BinaryOp::Lt),
            TokenKind::Gt | TokenKind::KwGt => Some(BinaryOp::Gt),
            TokenKind::LtEq | TokenKind::KwLe => Some(BinaryOp::Le),
            TokenKind::GtEq | TokenKind::KwGe => Some(BinaryOp::Ge),
            _ => None,
        })
    }

    fn parse_additive(&mut self) -> Result<&'a Expr<'a>, ParseError> {
        self.parse_binary_layer(Self::parse_multiplicative, |kind| match kind {
            TokenKind::Plus => Some(BinaryOp::Add),
            TokenKind::Minus => Some(BinaryOp::Sub),
            _ => None,
        })
    }

    fn parse_multiplicative(&mut self) -> Result<&'a Expr<'a>, ParseError> {
        self.parse_binary_layer(Self::parse_unary, |kind| match kind {
            TokenKind::Star => Some(BinaryOp::Mul),
            TokenKind::Slash => Some(BinaryOp::Div),
            _ => None,
        })
    }

    fn parse_unary(&mut self) -> Result<&'a Expr<'a>, ParseError> {
        self.nested(|p| {
            let start = p.current.span.start;
            let op = match p.peek() {
                TokenKind::Plus => UnaryOp::Plus,
                TokenKind::Minus => UnaryOp::Minus,
                TokenKind::Not => UnaryOp::Not,
                _ => return p.parse_primary(),
            };
            p.advance()?;
            let operand = p.parse_unary()?;
            Ok(p.alloc(ExprKind::Unary { op, operand }, p.span_from(start)))
        })
    }

    /// Literals stand alone; identifiers and parenthesised expressions may
    /// be followed by accessor and call suffixes.
    fn parse_primary(&mut self) -> Result<&'a Expr<'a>, ParseError> {
        self.nested(|p| {
            let token = p.current;
            let literal = match token.kind {
                TokenKind::Null => Some(ExprKind::Null),
                TokenKind::Number => Some(ExprKind::Number(token.text)),
                TokenKind::String => Some(ExprKind::String(token.text)),
                _ => None,
            };
            if let Some(kind) = literal {
                p.advance()?;
                return Ok(p.alloc(kind, token.span));
            }

            let expr = match token.kind {
                TokenKind::Identifier => {
                    p.advance()?;
                    if p.at(TokenKind::LBracket) {
                        let index = p.parse_index()?;
                        let member = Member::Named(token.text);
                        p.alloc(
                            ExprKind::Dot {
                                base: None,
                                member,
                                index,
                            },
                            p.span_from(token.span.start),
                        )
                    } else {
                        p.alloc(ExprKind::Identifier(token.text), token.span)
                    }
                }
                TokenKind::LParen => p.parse_paren()?,
                found => {
                    return Err(ParseError::ExpectedExpression {
                        found,
                        span: token.span,
                    })
                }
            };
            p.parse_post_expression(expr)
        })
    }

    /// `( expr )`; empty parentheses are rejected.
    fn parse_paren(&mut self) -> Result<&'a Expr<'a>, ParseError> {
        self.nested(|p| {
            let open = p.expect(TokenKind::LParen)?;
            if p.at(TokenKind::RParen) {
                return Err(ParseError::EmptyParens {
                    span: open.span.to(p.current.span),
                });
            }
            let expr = p.parse_simple_expression()?;
            p.expect(TokenKind::RParen)?;
            Ok(expr)
        })
    }

    fn parse_post_expression(&mut self, base: &'a Expr<'a>) -> Result<&'a Expr<'a>, ParseError> {
        self.nested(|p| {
            let start = base.span.start;
            let mut expr = base;
            let mut links = 0;
            loop {
                links += 1;
                if links > MAX_POST_EXPRESSIONS {
                    return Err(ParseError::ChainTooLong {
                        limit: MAX_POST_EXPRESSIONS,
                        span: p.current.span,
                    });
                }

                expr = match p.peek() {
                    TokenKind::LParen => {
                        let args = p.parse_argument_list()?;
                        let call = p.alloc(
                            ExprKind::Call {
                                callee: expr,
                                args,
                                is_som_method: false,
                            },
                            p.span_from(start),
                        );
                        p.parse_call_index(call, start)?
                    }
                    TokenKind::Dot => {
                        p.advance()?;
                        let name = p.expect(TokenKind::Identifier)?;
                        if p.at(TokenKind::LParen) {
                            let args = p.parse_argument_list()?;
                            let callee = p.alloc(ExprKind::Identifier(name.text), name.span);
                            let call = p.alloc(
                                ExprKind::Call {
                                    callee,
                                    args,
                                    is_som_method: true,
                                },
                                p.span_from(name.span.start),
                            );
                            let method = p.alloc(
                                ExprKind::MethodCall {
                                    receiver: expr,
                                    call,
                                },
                                p.span_from(start),
                            );
                            p.parse_call_index(method, start)?
                        } else {
                            let index = p.parse_optional_index()?;
                            p.alloc(
                                ExprKind::Dot {
                                    base: Some(expr),
                                    member: Member::Named(name.text),
                                    index,
                                },
                                p.span_from(start),
                            )
                        }
                    }
                    TokenKind::DotDot => {
                        p.advance()?;
                        let name = p.expect(TokenKind::Identifier)?.text;
                        let index = p.parse_optional_index()?;
                        p.alloc(
                            ExprKind::DotDot {
                                base: expr,
                                name,
                                index,
                            },
                            p.span_from(start),
                        )
                    }
                    TokenKind::DotHash => {
                        p.advance()?;
                        let name = p.expect(TokenKind::Identifier)?.text;
                        let index = p.parse_optional_index()?;
                        p.alloc(
                            ExprKind::Dot {
                                base: Some(expr),
                                member: Member::Hash(name),
                                index,
                            },
                            p.span_from(start),
                        )
                    }
                    TokenKind::DotStar => {
                        p.advance()?;
                        p.alloc(
                            ExprKind::Dot {
                                base: Some(expr),
                                member: Member::Star,
                                index: Index::None,
                            },
                            p.span_from(start),
                        )
                    }
                    _ => return Ok(expr),
                };
            }
        })
    }

    /// `call(...)[i]` wraps the call in an index-only accessor.
    fn parse_call_index(
        &mut self,
        call: &'a Expr<'a>,
        start: u32,
    ) -> Result<&'a Expr<'a>, ParseError> {
        if !self.at(TokenKind::LBracket) {
            return Ok(call);
        }
        let index = self.parse_index()?;
        Ok(self.alloc(
            ExprKind::Dot {
                base: Some(call),
                member: Member::CallResult,
                index,
            },
            self.span_from(start),
        ))
    }

    /// `( a, b, c )`, strictly comma separated.
    fn parse_argument_list(&mut self) -> Result<&'a [Expr<'a>], ParseError> {
        self.expect(TokenKind::LParen)?;
        let mut args = self.vec();
        while !self.at(TokenKind::RParen) {
            if !args.is_empty() {
                self.expect(TokenKind::Comma)?;
            }
            let arg = self.parse_simple_expression()?;
            args.push(*arg);
            if args.len() > MAX_POST_EXPRESSIONS {
                return Err(ParseError::TooManyArguments {
                    limit: MAX_POST_EXPRESSIONS,
                    span: arg.span,
                });
            }
        }
        self.expect(TokenKind::RParen)?;
        Ok(args.into_bump_slice())
    }

    fn parse_optional_index(&mut self) -> Result<Index<'a>, ParseError> {
        if self.at(TokenKind::LBracket) {
            self.parse_index()
        } else {
            Ok(Index::None)
        }
    }

    /// `[*]`, `[e]`, `[+e]` or `[-e]`.
    fn parse_index(&mut self) -> Result<Index<'a>, ParseError> {
        self.nested(|p| {
            p.expect(TokenKind::LBracket)?;
            let index = match p.peek() {
                TokenKind::Star => {
                    p.advance()?;
                    Index::Star
                }
                TokenKind::Plus => {
                    p.advance()?;
                    Index::Positive(p.parse_simple_expression()?)
                }
                TokenKind::Minus => {
                    p.advance()?;
                    Index::Negative(p.parse_simple_expression()?)
                }
                _ => Index::Absolute(p.parse_simple_expression()?),
            };
            p.expect(TokenKind::RBracket)?;
            Ok(index)
        })
    }
}
