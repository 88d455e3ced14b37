//! Arena-allocated AST for FormCalc.
//!
//! Simple expressions ([`Expr`]) produce values; statements ([`Stmt`]) make
//! up expression lists. Children are `&'a` references into the [`Arena`]
//! that owns the whole tree, and every node has exactly one parent.
//!
//! [`Arena`]: crate::Arena

use crate::span::Span;

// =============================================================================
// Expressions
// =============================================================================

/// A simple expression.
#[derive(Debug, Clone, Copy)]
pub struct Expr<'a> {
    pub kind: ExprKind<'a>,
    pub span: Span,
}

impl<'a> Expr<'a> {
    pub fn new(kind: ExprKind<'a>, span: Span) -> Self {
        Self { kind, span }
    }

    /// Whether the expression evaluates to a SOM reference that must be
    /// dereferenced with `get_val` before it is stored as a result.
    pub fn is_accessor(&self) -> bool {
        match self.kind {
            ExprKind::Dot { member, .. } => member != Member::CallResult,
            ExprKind::DotDot { .. } | ExprKind::MethodCall { .. } => true,
            _ => false,
        }
    }

    /// The identifier text if this is a bare identifier.
    pub fn as_identifier(&self) -> Option<&'a str> {
        match self.kind {
            ExprKind::Identifier(name) => Some(name),
            _ => None,
        }
    }
}

/// Expression kinds.
#[derive(Debug, Clone, Copy)]
pub enum ExprKind<'a> {
    // === Literals ===
    Null,
    /// Raw numeric text, never evaluated.
    Number(&'a str),
    /// Raw string text including the delimiting quotes.
    String(&'a str),
    Identifier(&'a str),

    // === Operations ===
    Unary {
        op: UnaryOp,
        operand: &'a Expr<'a>,
    },
    Binary {
        op: BinaryOp,
        left: &'a Expr<'a>,
        right: &'a Expr<'a>,
    },
    Assign {
        target: &'a Expr<'a>,
        value: &'a Expr<'a>,
    },

    // === Calls and accessors ===
    /// `callee(args)`. SOM calls only appear as the call half of a
    /// [`ExprKind::MethodCall`].
    Call {
        callee: &'a Expr<'a>,
        args: &'a [Expr<'a>],
        is_som_method: bool,
    },
    /// `base.name`, `base.#name`, `base.*`, `name[i]` (no base) or
    /// `call(...)[i]`.
    Dot {
        base: Option<&'a Expr<'a>>,
        member: Member<'a>,
        index: Index<'a>,
    },
    /// `base..name[i]`
    DotDot {
        base: &'a Expr<'a>,
        name: &'a str,
        index: Index<'a>,
    },
    /// `receiver.method(args)`; `call` is a SOM [`ExprKind::Call`].
    MethodCall {
        receiver: &'a Expr<'a>,
        call: &'a Expr<'a>,
    },
}

/// What a dot accessor selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Member<'a> {
    /// `.name`
    Named(&'a str),
    /// `.#name`
    Hash(&'a str),
    /// `.*`
    Star,
    /// Index applied to a call result: `f(x)[0]`.
    CallResult,
}

/// Index suffix of an accessor.
#[derive(Debug, Clone, Copy)]
pub enum Index<'a> {
    /// No brackets at all.
    None,
    /// `[*]`
    Star,
    /// `[e]`
    Absolute(&'a Expr<'a>),
    /// `[+e]`
    Positive(&'a Expr<'a>),
    /// `[-e]`
    Negative(&'a Expr<'a>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `+x`
    Plus,
    /// `-x`
    Minus,
    /// `not x`
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `|`, `or`
    Or,
    /// `&`, `and`
    And,
    /// `==`, `eq`
    Eq,
    /// `<>`, `ne`
    Ne,
    /// `<`, `lt`
    Lt,
    /// `>`, `gt`
    Gt,
    /// `<=`, `le`
    Le,
    /// `>=`, `ge`
    Ge,
    Add,
    Sub,
    Mul,
    Div,
}

// =============================================================================
// Statements
// =============================================================================

/// An entry of an expression list.
#[derive(Debug, Clone, Copy)]
pub struct Stmt<'a> {
    pub kind: StmtKind<'a>,
    pub span: Span,
}

impl<'a> Stmt<'a> {
    pub fn new(kind: StmtKind<'a>, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum StmtKind<'a> {
    Function(&'a Function<'a>),
    /// `var name (= init)?`
    Var {
        name: &'a str,
        init: Option<&'a Expr<'a>>,
    },
    /// A simple expression or assignment used as a statement.
    Expr(&'a Expr<'a>),
    /// `do ... end`
    Do(Block<'a>),
    If(&'a IfStmt<'a>),
    While {
        cond: &'a Expr<'a>,
        body: Block<'a>,
    },
    For(&'a ForStmt<'a>),
    Foreach(&'a ForeachStmt<'a>),
    Break,
    Continue,
}

/// A braced statement list.
#[derive(Debug, Clone, Copy)]
pub struct Block<'a> {
    pub stmts: &'a [Stmt<'a>],
    pub span: Span,
}

/// `func name(params) do body endfunc`
#[derive(Debug, Clone, Copy)]
pub struct Function<'a> {
    pub name: &'a str,
    pub params: &'a [&'a str],
    pub body: &'a [Stmt<'a>],
}

#[derive(Debug, Clone, Copy)]
pub struct IfStmt<'a> {
    pub cond: &'a Expr<'a>,
    pub then_branch: Block<'a>,
    pub else_ifs: &'a [ElseIf<'a>],
    pub else_branch: Option<Block<'a>>,
}

/// `elseif (cond) then body`
#[derive(Debug, Clone, Copy)]
pub struct ElseIf<'a> {
    pub cond: &'a Expr<'a>,
    pub body: Block<'a>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForDirection {
    Upto,
    Downto,
}

#[derive(Debug, Clone, Copy)]
pub struct ForStmt<'a> {
    pub var: &'a str,
    pub start: &'a Expr<'a>,
    pub end: &'a Expr<'a>,
    pub direction: ForDirection,
    pub step: Option<&'a Expr<'a>>,
    pub body: Block<'a>,
}

#[derive(Debug, Clone, Copy)]
pub struct ForeachStmt<'a> {
    pub var: &'a str,
    /// Non-empty list of collections to concatenate and walk.
    pub collections: &'a [Expr<'a>],
    pub body: Block<'a>,
}

// =============================================================================
// Program
// =============================================================================

/// The root of a parsed script.
#[derive(Debug, Clone, Copy)]
pub struct Program<'a> {
    pub stmts: &'a [Stmt<'a>],
    pub span: Span,
}

impl<'a> Program<'a> {
    pub fn new(stmts: &'a [Stmt<'a>], span: Span) -> Self {
        Self { stmts, span }
    }

    /// True for empty and comment-only scripts.
    pub fn is_empty(&self) -> bool {
        self.stmts.is_empty()
    }
}
