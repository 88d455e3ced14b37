//! JavaScript code generator.
//!
//! Walks a [`Program`] and writes JavaScript that calls into the runtime
//! namespace (see [`crate::runtime`]). The result of the script is carried
//! in a `pfm_ret` variable: statements in tail position are emitted with
//! [`ReturnType::Implied`] and store their value there.
//!
//! Every node passes through a guard that bounds recursion depth and output
//! size. Either limit aborts the whole generation.

use crate::ast::*;
use crate::error::CodegenError;
use crate::runtime;
use crate::span::Span;

/// Default nesting ceiling for [`CodegenOptions`].
pub const DEFAULT_MAX_CODEGEN_DEPTH: usize = 5000;

/// Default output ceiling (256 MiB) for [`CodegenOptions`].
pub const DEFAULT_MAX_OUTPUT_LEN: usize = 256 * 1024 * 1024;

/// Output for scripts without a single expression.
pub const COMMENTS_ONLY: &str = "// comments only";

const PROLOGUE: &str = "(function() {\n\
let pfm_method_runner = function(obj, cb) {\n\
\x20 if (pfm_rt.is_ary(obj)) {\n\
\x20   let pfm_method_return = null;\n\
\x20   for (var idx = obj.length -1; idx > 1; idx--) {\n\
\x20     pfm_method_return = cb(obj[idx]);\n\
\x20   }\n\
\x20   return pfm_method_return;\n\
\x20 }\n\
\x20 return cb(obj);\n\
};\n\
var pfm_ret = null;\n";

const EPILOGUE: &str = "return pfm_rt.get_val(pfm_ret);\n}).call(this);";

/// Code generation options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodegenOptions {
    /// Generation fails once more nodes than this are nested.
    pub max_depth: usize,
    /// Generation fails once the output reaches this many bytes.
    pub max_output_len: usize,
}

impl Default for CodegenOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_CODEGEN_DEPTH,
            max_output_len: DEFAULT_MAX_OUTPUT_LEN,
        }
    }
}

impl CodegenOptions {
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    #[must_use]
    pub fn with_max_output_len(mut self, max_output_len: usize) -> Self {
        self.max_output_len = max_output_len;
        self
    }
}

/// Where a statement's value goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnType {
    /// Tail position: the value becomes the result of the enclosing script
    /// or function and is stored in `pfm_ret`.
    Implied,
    /// The value is discarded.
    Inferred,
}

type Result<T = ()> = std::result::Result<T, CodegenError>;

/// The code generator.
pub struct Codegen {
    options: CodegenOptions,
    output: String,
    depth: usize,
}

impl Codegen {
    pub fn new(options: CodegenOptions) -> Self {
        Self {
            options,
            output: String::new(),
            depth: 0,
        }
    }

    /// Generate JavaScript for a whole script.
    pub fn generate(mut self, program: &Program<'_>) -> Result<String> {
        if program.is_empty() {
            return Ok(COMMENTS_ONLY.to_string());
        }

        self.emit(PROLOGUE);
        self.emit_stmts(program.stmts, ReturnType::Implied)?;
        self.emit(EPILOGUE);
        self.check_size(program.span)?;
        Ok(self.output)
    }

    // =========================================================================
    // Output Helpers
    // =========================================================================

    #[inline]
    fn emit(&mut self, s: &str) {
        self.output.push_str(s);
    }

    /// `pfm_rt.<member>`
    fn emit_runtime(&mut self, member: &str) {
        self.emit(runtime::NAMESPACE);
        self.emit(".");
        self.emit(member);
    }

    fn check_size(&self, span: Span) -> Result {
        if self.output.len() >= self.options.max_output_len {
            return Err(CodegenError::OutputTooLarge {
                limit: self.options.max_output_len,
                span,
            });
        }
        Ok(())
    }

    /// Run `f` one level deeper, with the size checked before and after.
    fn node(&mut self, span: Span, f: impl FnOnce(&mut Self) -> Result) -> Result {
        self.depth += 1;
        let result = self.guarded(span, f);
        self.depth -= 1;
        result
    }

    fn guarded(&mut self, span: Span, f: impl FnOnce(&mut Self) -> Result) -> Result {
        self.check_depth(span)?;
        self.check_size(span)?;
        f(self)?;
        self.check_size(span)
    }

    fn check_depth(&self, span: Span) -> Result {
        if self.depth > self.options.max_depth {
            return Err(CodegenError::TooDeep {
                limit: self.options.max_depth,
                span,
            });
        }
        Ok(())
    }

    /// One link of an operator chain: a level deeper without a stack frame.
    /// The caller restores `depth`.
    fn descend(&mut self, span: Span) -> Result {
        self.depth += 1;
        self.check_depth(span)?;
        self.check_size(span)
    }

    /// Emit into a scratch buffer and hand back the text.
    fn render(&mut self, f: impl FnOnce(&mut Self) -> Result) -> Result<String> {
        let saved = std::mem::take(&mut self.output);
        let result = f(self);
        let rendered = std::mem::replace(&mut self.output, saved);
        result.map(|()| rendered)
    }

    // =========================================================================
    // Statements
    // =========================================================================

    /// A statement list whose last entry takes `ty`.
    fn emit_stmts(&mut self, stmts: &[Stmt<'_>], ty: ReturnType) -> Result {
        let last = stmts.len().saturating_sub(1);
        for (i, stmt) in stmts.iter().enumerate() {
            let stmt_ty = if i == last { ty } else { ReturnType::Inferred };
            self.emit_stmt(stmt, stmt_ty)?;
        }
        Ok(())
    }

    fn emit_stmt(&mut self, stmt: &Stmt<'_>, ty: ReturnType) -> Result {
        self.node(stmt.span, |g| match stmt.kind {
            StmtKind::Function(function) => g.emit_function(function),
            StmtKind::Var { name, init } => g.emit_var(name, init, ty),
            StmtKind::Expr(expr) => g.emit_expr_stmt(expr, ty),
            StmtKind::Do(ref block) => g.emit_block(block, ty),
            StmtKind::If(stmt) => g.emit_if(stmt, ty),
            StmtKind::While { cond, ref body } => {
                if ty == ReturnType::Implied {
                    g.emit("pfm_ret = 0;\n");
                }
                g.emit("while (");
                g.emit_expr(cond)?;
                g.emit(")\n");
                g.check_size(stmt.span)?;
                g.emit_block(body, ty)
            }
            StmtKind::For(stmt) => g.emit_for(stmt, ty),
            StmtKind::Foreach(stmt) => g.emit_foreach(stmt, ty),
            StmtKind::Break => {
                g.emit("pfm_ret = 0;\nbreak;\n");
                Ok(())
            }
            StmtKind::Continue => {
                g.emit("pfm_ret = 0;\ncontinue;\n");
                Ok(())
            }
        })
    }

    fn emit_block(&mut self, block: &Block<'_>, ty: ReturnType) -> Result {
        self.node(block.span, |g| {
            g.emit("{\n");
            g.emit_stmts(block.stmts, ty)?;
            g.emit("}\n");
            Ok(())
        })
    }

    /// Function bodies always return their own last value.
    fn emit_function(&mut self, function: &Function<'_>) -> Result {
        self.emit("function ");
        self.emit(&declared_name(function.name));
        self.emit("(");
        for (i, param) in function.params.iter().enumerate() {
            if i > 0 {
                self.emit(", ");
            }
            self.emit(&declared_name(param));
        }
        self.emit(") {\n");
        self.emit("var pfm_ret = null;\n");
        self.emit_stmts(function.body, ReturnType::Implied)?;
        self.emit("return pfm_ret;\n");
        self.emit("}\n");
        Ok(())
    }

    fn emit_var(&mut self, name: &str, init: Option<&Expr<'_>>, ty: ReturnType) -> Result {
        let name = declared_name(name);
        self.emit("var ");
        self.emit(&name);
        self.emit(" = ");
        match init {
            Some(init) => {
                self.emit_expr(init)?;
                self.emit(";\n");
                self.emit(&name);
                self.emit(" = ");
                self.emit_runtime(runtime::VAR_FILTER);
                self.emit("(");
                self.emit(&name);
                self.emit(");\n");
            }
            None => self.emit("\"\";\n"),
        }
        if ty == ReturnType::Implied {
            self.emit("pfm_ret = ");
            self.emit(&name);
            self.emit(";\n");
        }
        Ok(())
    }

    fn emit_expr_stmt(&mut self, expr: &Expr<'_>, ty: ReturnType) -> Result {
        let is_assign = matches!(expr.kind, ExprKind::Assign { .. });
        match ty {
            ReturnType::Inferred => {
                self.emit_expr_typed(expr, ReturnType::Inferred)?;
                if !is_assign {
                    self.emit(";\n");
                }
            }
            ReturnType::Implied if is_assign => {
                self.emit_expr_typed(expr, ReturnType::Implied)?;
            }
            ReturnType::Implied if expr.is_accessor() => {
                self.emit("pfm_ret = ");
                self.emit_runtime(runtime::GET_VAL);
                self.emit("(");
                self.emit_expr(expr)?;
                self.emit(");\n");
            }
            ReturnType::Implied => {
                self.emit("pfm_ret = ");
                self.emit_expr(expr)?;
                self.emit(";\n");
            }
        }
        Ok(())
    }

    fn emit_if(&mut self, stmt: &IfStmt<'_>, ty: ReturnType) -> Result {
        if ty == ReturnType::Implied {
            self.emit("pfm_ret = 0;\n");
        }
        self.emit_condition("if", stmt.cond)?;
        self.emit_block(&stmt.then_branch, ty)?;

        for else_if in stmt.else_ifs {
            let span = else_if.cond.span.to(else_if.body.span);
            self.node(span, |g| {
                g.emit_condition("else if", else_if.cond)?;
                g.emit_block(&else_if.body, ty)
            })?;
        }

        if let Some(else_branch) = &stmt.else_branch {
            self.emit("else ");
            self.emit_block(else_branch, ty)?;
        }
        Ok(())
    }

    /// `<keyword> (pfm_rt.get_val(<cond>))\n`
    fn emit_condition(&mut self, keyword: &str, cond: &Expr<'_>) -> Result {
        self.emit(keyword);
        self.emit(" (");
        self.emit_runtime(runtime::GET_VAL);
        self.emit("(");
        self.emit_expr(cond)?;
        self.emit("))\n");
        self.check_size(cond.span)
    }

    fn emit_for(&mut self, stmt: &ForStmt<'_>, ty: ReturnType) -> Result {
        if ty == ReturnType::Implied {
            self.emit("pfm_ret = 0;\n");
        }
        let (compare, advance) = match stmt.direction {
            ForDirection::Upto => (" <= ", " += "),
            ForDirection::Downto => (" >= ", " -= "),
        };
        let var = declared_name(stmt.var);

        self.emit("{\n");
        self.emit("var ");
        self.emit(&var);
        self.emit(" = null;\n");

        self.emit("for (");
        self.emit(&var);
        self.emit(" = ");
        self.emit_value(stmt.start)?;
        self.emit("; ");

        self.emit(&var);
        self.emit(compare);
        self.emit_value(stmt.end)?;
        self.emit("; ");

        self.emit(&var);
        self.emit(advance);
        match stmt.step {
            Some(step) => self.emit_value(step)?,
            None => self.emit("1"),
        }
        self.emit(")\n");
        self.check_size(stmt.body.span)?;

        self.emit_block(&stmt.body, ty)?;
        self.emit("}\n");
        Ok(())
    }

    fn emit_foreach(&mut self, stmt: &ForeachStmt<'_>, ty: ReturnType) -> Result {
        if ty == ReturnType::Implied {
            self.emit("pfm_ret = 0;\n");
        }
        let var = declared_name(stmt.var);

        self.emit("{\n");
        self.emit("var ");
        self.emit(&var);
        self.emit(" = null;\n");
        self.emit("var pfm_ary = ");
        self.emit_runtime(runtime::CONCAT_OBJ);
        self.emit("(");
        self.emit_args(stmt.collections)?;
        self.emit(");\n");

        self.emit("var pfm_ary_idx = 0;\n");
        self.emit("while(pfm_ary_idx < pfm_ary.length)\n{\n");
        self.emit(&var);
        self.emit(" = pfm_ary[pfm_ary_idx++];\n");
        self.emit_block(&stmt.body, ty)?;
        self.emit("}\n");
        self.emit("}\n");
        Ok(())
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn emit_expr(&mut self, expr: &Expr<'_>) -> Result {
        self.emit_expr_typed(expr, ReturnType::Inferred)
    }

    /// Only assignments care about the return type.
    fn emit_expr_typed(&mut self, expr: &Expr<'_>, ty: ReturnType) -> Result {
        // Operator chains can nest one level per source token; walk them
        // instead of recursing so the stack stays flat.
        if matches!(expr.kind, ExprKind::Unary { .. } | ExprKind::Binary { .. }) {
            let saved = self.depth;
            let result = self.emit_operator_chain(expr);
            self.depth = saved;
            return result;
        }

        self.node(expr.span, |g| {
            match expr.kind {
                ExprKind::Null => g.emit("null"),
                ExprKind::Number(text) => g.emit(text),
                ExprKind::String(raw) => g.emit_string(raw),
                ExprKind::Identifier(name) => g.emit_identifier(name),
                ExprKind::Unary { .. } | ExprKind::Binary { .. } => g.emit_operator_chain(expr)?,
                ExprKind::Assign { target, value } => g.emit_assign(target, value, ty)?,
                ExprKind::Call {
                    callee,
                    args,
                    is_som_method,
                } => g.emit_call(callee, args, is_som_method)?,
                ExprKind::Dot {
                    base,
                    member,
                    ref index,
                } => g.emit_dot(base, member, index, expr.span)?,
                ExprKind::DotDot {
                    base,
                    name,
                    ref index,
                } => g.emit_dotdot(base, name, index, expr.span)?,
                ExprKind::MethodCall { receiver, call } => {
                    g.emit("(function() {\n");
                    g.emit("  return pfm_method_runner(");
                    g.emit_expr(receiver)?;
                    g.emit(", function(obj) {\n");
                    g.emit("    return obj.");
                    g.emit_expr(call)?;
                    g.emit(";\n");
                    g.emit("  });\n");
                    g.emit("}).call(this)");
                }
            }
            Ok(())
        })
    }

    /// `pfm_rt.<op>(` for every prefix operator and every left-nested binary
    /// operator, then the innermost operand, then the right operands from
    /// the inside out. Each link counts as one level of depth.
    fn emit_operator_chain(&mut self, expr: &Expr<'_>) -> Result {
        let mut rights = Vec::new();
        let mut current = expr;
        loop {
            match current.kind {
                ExprKind::Unary { op, operand } => {
                    self.descend(current.span)?;
                    self.emit_runtime(unary_helper(op));
                    self.emit("(");
                    rights.push(None);
                    current = operand;
                }
                ExprKind::Binary { op, left, right } => {
                    self.descend(current.span)?;
                    self.emit_runtime(binary_helper(op));
                    self.emit("(");
                    rights.push(Some(right));
                    current = left;
                }
                _ => break,
            }
        }

        self.emit_expr(current)?;
        while let Some(right) = rights.pop() {
            if let Some(right) = right {
                self.emit(", ");
                self.emit_expr(right)?;
            }
            self.emit(")");
            self.depth -= 1;
        }
        self.check_size(expr.span)
    }

    /// Strings of at most two characters are already valid JavaScript.
    /// Longer ones have their doubled quotes escaped, CRs dropped and LFs
    /// turned into `\n`.
    fn emit_string(&mut self, raw: &str) {
        if raw.len() <= 2 {
            self.emit(raw);
            return;
        }
        self.output.push('"');
        let mut chars = raw[1..raw.len() - 1].chars();
        while let Some(c) = chars.next() {
            match c {
                '"' => {
                    chars.next();
                    self.emit("\\\"");
                }
                '\r' => {}
                '\n' => self.emit("\\n"),
                c => self.output.push(c),
            }
        }
        self.output.push('"');
    }

    fn emit_identifier(&mut self, name: &str) {
        match name {
            "$" => self.emit("this"),
            "!" => self.emit("xfa.datasets"),
            "$data" => self.emit("xfa.datasets.data"),
            "$event" => self.emit("xfa.event"),
            "$form" => self.emit("xfa.form"),
            "$host" => self.emit("xfa.host"),
            "$layout" => self.emit("xfa.layout"),
            "$template" => self.emit("xfa.template"),
            _ => match name.strip_prefix('!') {
                Some(rest) => {
                    self.emit(EXCL_PREFIX);
                    self.emit(rest);
                }
                None => self.emit(name),
            },
        }
    }

    /// Assign through the runtime when the target is a SOM object; plain
    /// variables also get a direct JavaScript assignment.
    fn emit_assign(&mut self, target: &Expr<'_>, value: &Expr<'_>, ty: ReturnType) -> Result {
        let lhs = self.render(|g| g.emit_expr(target))?;
        let rhs = self.render(|g| g.emit_expr(value))?;

        self.emit("if (");
        self.emit_runtime(runtime::IS_OBJ);
        self.emit("(");
        self.emit(&lhs);
        self.emit("))\n{\n");
        if ty == ReturnType::Implied {
            self.emit("pfm_ret = ");
        }
        self.emit_asgn_val_op(&lhs, &rhs);
        self.emit(";\n}\n");

        if target.as_identifier().is_some() && lhs != "this" {
            self.emit("else\n{\n");
            if ty == ReturnType::Implied {
                self.emit("pfm_ret = ");
            }
            self.emit(&lhs);
            self.emit(" = ");
            self.emit_asgn_val_op(&lhs, &rhs);
            self.emit(";\n");
            self.emit("}\n");
        }
        Ok(())
    }

    fn emit_asgn_val_op(&mut self, lhs: &str, rhs: &str) {
        self.emit_runtime(runtime::ASGN_VAL_OP);
        self.emit("(");
        self.emit(lhs);
        self.emit(", ");
        self.emit(rhs);
        self.emit(")");
    }

    fn emit_call(&mut self, callee: &Expr<'_>, args: &[Expr<'_>], is_som_method: bool) -> Result {
        let name = self.render(|g| g.emit_expr(callee))?;

        if is_som_method {
            let mask = runtime::som_method_params(&name);
            self.emit(&name);
            self.emit("(");
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    self.emit(", ");
                }
                let by_reference = i < 32 && mask & (1 << i) != 0;
                self.emit_runtime(if by_reference {
                    runtime::GET_JSOBJ
                } else {
                    runtime::GET_VAL
                });
                self.emit("(");
                self.emit_expr(arg)?;
                self.emit(")");
            }
            self.emit(")");
            return Ok(());
        }

        let Some(builtin) = runtime::builtin_function_name(&name) else {
            return Err(CodegenError::UnknownFunction {
                name,
                span: callee.span,
            });
        };

        match builtin {
            "Eval" => {
                self.emit("eval.call(this, ");
                self.emit_runtime(runtime::TRANSLATE);
                self.emit("(");
                self.emit_args(args)?;
                self.emit("))");
            }
            "Exists" => {
                // Accessing a missing node throws; report it as 0.
                self.emit_runtime(builtin);
                self.emit("(\n(\nfunction ()\n{\ntry\n{\n");
                match args.first() {
                    Some(arg) => {
                        self.emit("return ");
                        self.emit_expr(arg)?;
                        self.emit(";\n}\n");
                    }
                    None => self.emit("return 0;\n}\n"),
                }
                self.emit("catch(accessExceptions)\n");
                self.emit("{\nreturn 0;\n}\n}\n).call(this)\n");
                self.emit(")");
            }
            _ => {
                self.emit_runtime(builtin);
                self.emit("(");
                self.emit_args(args)?;
                self.emit(")");
            }
        }
        Ok(())
    }

    fn emit_args(&mut self, args: &[Expr<'_>]) -> Result {
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                self.emit(", ");
            }
            self.emit_expr(arg)?;
        }
        Ok(())
    }

    fn emit_dot(
        &mut self,
        base: Option<&Expr<'_>>,
        member: Member<'_>,
        index: &Index<'_>,
        span: Span,
    ) -> Result {
        self.emit_runtime(runtime::DOT_ACC);
        self.emit("(");
        match base {
            Some(base) => self.emit_expr(base)?,
            None => self.emit("null"),
        }
        self.emit(", \"");
        if let Some(base) = base {
            self.emit_base_name(base)?;
        }
        self.emit("\", ");
        match member {
            Member::Named(name) => {
                self.emit("\"");
                self.emit(name);
                self.emit("\", ");
            }
            Member::Hash(name) => {
                self.emit("\"#");
                self.emit(name);
                self.emit("\", ");
            }
            Member::Star => self.emit("\"*\", "),
            Member::CallResult => self.emit("\"\", "),
        }
        self.emit_index(index, span)?;
        self.emit(")");
        Ok(())
    }

    fn emit_dotdot(&mut self, base: &Expr<'_>, name: &str, index: &Index<'_>, span: Span) -> Result {
        self.emit_runtime(runtime::DOTDOT_ACC);
        self.emit("(");
        self.emit_expr(base)?;
        self.emit(", \"");
        self.emit_base_name(base)?;
        self.emit("\", \"");
        self.emit(name);
        self.emit("\", ");
        self.emit_index(index, span)?;
        self.emit(")");
        Ok(())
    }

    /// Accessors pass a bare identifier base a second time, as a name.
    fn emit_base_name(&mut self, base: &Expr<'_>) -> Result {
        if base.as_identifier().is_some() {
            self.emit_expr(base)?;
        }
        Ok(())
    }

    /// `<kind>[, <expr>]` where kind is 0 (none), 1 (absolute or `*`),
    /// 2 (relative forward) or 3 (relative backward).
    fn emit_index(&mut self, index: &Index<'_>, span: Span) -> Result {
        self.node(span, |g| {
            let (kind, expr) = match *index {
                Index::None => {
                    g.emit("0, 0");
                    return Ok(());
                }
                Index::Star => {
                    g.emit("1");
                    return Ok(());
                }
                Index::Absolute(expr) => ("1", expr),
                Index::Positive(expr) => ("2", expr),
                Index::Negative(expr) => ("3", expr),
            };
            g.emit(kind);
            g.emit(", ");
            g.emit_expr(expr)
        })
    }

    /// `pfm_rt.get_val(<expr>)`
    fn emit_value(&mut self, expr: &Expr<'_>) -> Result {
        self.emit_runtime(runtime::GET_VAL);
        self.emit("(");
        self.emit_expr(expr)?;
        self.emit(")");
        Ok(())
    }
}

// =============================================================================
// Helpers
// =============================================================================

const EXCL_PREFIX: &str = "pfm__excl__";

/// Names bound by `var`, `func`, parameters and loops only have the `!`
/// prefix rewritten.
fn declared_name(name: &str) -> std::borrow::Cow<'_, str> {
    match name.strip_prefix('!') {
        Some(rest) => format!("{EXCL_PREFIX}{rest}").into(),
        None => name.into(),
    }
}

fn unary_helper(op: UnaryOp) -> &'static str {
    match op {
        UnaryOp::Plus => runtime::POS_OP,
        UnaryOp::Minus => runtime::NEG_OP,
        UnaryOp::Not => runtime::LOG_NOT_OP,
    }
}

fn binary_helper(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Or => runtime::LOG_OR_OP,
        BinaryOp::And => runtime::LOG_AND_OP,
        BinaryOp::Eq => runtime::EQ_OP,
        BinaryOp::Ne => runtime::NEQ_OP,
        BinaryOp::Lt => runtime::LT_OP,
        BinaryOp::Gt => runtime::GT_OP,
        BinaryOp::Le => runtime::LE_OP,
        BinaryOp::Ge => runtime::GE_OP,
        BinaryOp::Add => runtime::PLUS_OP,
        BinaryOp::Sub => runtime::MINUS_OP,
        BinaryOp::Mul => runtime::MUL_OP,
        BinaryOp::Div => runtime::DIV_OP,
    }
}
