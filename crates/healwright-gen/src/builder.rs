//! Chained constructors for HIR nodes.
//!
//! Every constructor that takes a name validates it as an identifier,
//! so a malformed name fails here instead of in the emitted file.
//!
//! # Example
//!
//! ```rust,no_run
//! use healwright_gen::prelude::*;
//!
//! let module = JsModuleBuilder::new()
//!     .comment("Generated - DO NOT EDIT")
//!     .import(&["test", "expect"], "@playwright/test").unwrap()
//!     .const_decl("BASE_DELAY", Expr::num(500)).unwrap()
//!     .build();
//! let source = generate(&module);
//! ```

use crate::error::GenResult;
use crate::hir::*;

fn idents(names: &[&str]) -> GenResult<Vec<Identifier>> {
    names.iter().map(|n| Identifier::new(*n)).collect()
}

fn params(names: &[&str]) -> GenResult<Vec<Param>> {
    names.iter().map(|n| Param::name(n)).collect()
}

/// Accumulates top-level statements for one generated file.
#[derive(Debug, Default)]
pub struct JsModuleBuilder {
    statements: Vec<Stmt>,
    metadata: Option<GenerationMetadata>,
}

impl JsModuleBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach provenance metadata.
    #[must_use]
    pub fn metadata(mut self, metadata: GenerationMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    #[must_use]
    pub fn stmt(mut self, stmt: Stmt) -> Self {
        self.statements.push(stmt);
        self
    }

    #[must_use]
    pub fn stmts(mut self, stmts: impl IntoIterator<Item = Stmt>) -> Self {
        self.statements.extend(stmts);
        self
    }

    /// `// text`, one line per input line.
    #[must_use]
    pub fn comment(self, text: impl Into<String>) -> Self {
        self.stmt(Stmt::Comment(text.into()))
    }

    /// Blank separator line.
    #[must_use]
    pub fn blank(self) -> Self {
        self.stmt(Stmt::Blank)
    }

    /// `import { names } from 'from';`
    pub fn import(self, names: &[&str], from: impl Into<String>) -> GenResult<Self> {
        Ok(self.stmt(Stmt::import(names, from)?))
    }

    /// `let name = value;`
    pub fn let_decl(self, name: impl Into<String>, value: Expr) -> GenResult<Self> {
        Ok(self.stmt(Stmt::let_decl(name, value)?))
    }

    /// `const name = value;`
    pub fn const_decl(self, name: impl Into<String>, value: Expr) -> GenResult<Self> {
        Ok(self.stmt(Stmt::const_decl(name, value)?))
    }

    #[must_use]
    pub fn function(self, function: JsFunction) -> Self {
        self.stmt(Stmt::Function(function))
    }

    #[must_use]
    pub fn expr(self, e: Expr) -> Self {
        self.stmt(Stmt::Expr(e))
    }

    #[must_use]
    pub fn build(self) -> JsModule {
        JsModule {
            statements: self.statements,
            metadata: self.metadata,
        }
    }
}

/// Assembles a named `function` declaration.
#[derive(Debug)]
pub struct JsFunctionBuilder {
    function: JsFunction,
}

impl JsFunctionBuilder {
    /// Plain `function name() {}`.
    pub fn new(name: impl Into<String>) -> GenResult<Self> {
        Ok(Self {
            function: JsFunction {
                name: Identifier::new(name)?,
                is_async: false,
                params: Vec::new(),
                body: Vec::new(),
            },
        })
    }

    /// `async function name() {}`.
    pub fn new_async(name: impl Into<String>) -> GenResult<Self> {
        let mut builder = Self::new(name)?;
        builder.function.is_async = true;
        Ok(builder)
    }

    /// Replace the parameter list; each name is validated.
    pub fn params(mut self, names: &[&str]) -> GenResult<Self> {
        self.function.params = params(names)?;
        Ok(self)
    }

    #[must_use]
    pub fn stmt(mut self, stmt: Stmt) -> Self {
        self.function.body.push(stmt);
        self
    }

    #[must_use]
    pub fn stmts(mut self, stmts: impl IntoIterator<Item = Stmt>) -> Self {
        self.function.body.extend(stmts);
        self
    }

    #[must_use]
    pub fn build(self) -> JsFunction {
        self.function
    }
}

impl Param {
    /// Single named parameter.
    pub fn name(name: &str) -> GenResult<Self> {
        Ok(Self::Name(Identifier::new(name)?))
    }

    /// Destructured object parameter: `{ a, b }`.
    pub fn destructure(names: &[&str]) -> GenResult<Self> {
        Ok(Self::Destructure(idents(names)?))
    }
}

impl Expr {
    #[must_use]
    pub const fn null() -> Self {
        Self::Null
    }

    #[must_use]
    pub const fn bool(v: bool) -> Self {
        Self::Bool(v)
    }

    /// Numeric literal from anything that widens to `f64`.
    #[must_use]
    pub fn num(v: impl Into<f64>) -> Self {
        Self::Num(v.into())
    }

    /// Millisecond durations from `RunConfig` fields.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn millis(ms: u64) -> Self {
        Self::Num(ms as f64)
    }

    /// Single-quoted string; escaping happens at emit time.
    #[must_use]
    pub fn str(s: impl Into<String>) -> Self {
        Self::Str(s.into())
    }

    #[must_use]
    pub fn template(parts: Vec<TemplatePart>) -> Self {
        Self::Template(parts)
    }

    /// Reference to a binding; fails on a reserved or malformed name.
    pub fn ident(name: impl Into<String>) -> GenResult<Self> {
        Ok(Self::Ident(Identifier::new(name)?))
    }

    /// `self.prop`
    pub fn dot(self, prop: impl Into<String>) -> GenResult<Self> {
        Ok(Self::Member {
            object: Box::new(self),
            property: Identifier::new(prop)?,
        })
    }

    /// `self(args)`
    #[must_use]
    pub fn call(self, args: Vec<Expr>) -> Self {
        Self::Call {
            callee: Box::new(self),
            args,
        }
    }

    /// `self.name(args)`
    pub fn method(self, name: impl Into<String>, args: Vec<Expr>) -> GenResult<Self> {
        Ok(self.dot(name)?.call(args))
    }

    /// `new self(args)`
    #[must_use]
    pub fn new_expr(self, args: Vec<Expr>) -> Self {
        Self::New {
            constructor: Box::new(self),
            args,
        }
    }

    /// `await self`
    #[must_use]
    pub fn await_expr(self) -> Self {
        Self::Await(Box::new(self))
    }

    fn binary(self, op: BinOp, other: Expr) -> Self {
        Self::Binary {
            left: Box::new(self),
            op,
            right: Box::new(other),
        }
    }

    /// `self + other`
    #[must_use]
    pub fn add(self, other: Expr) -> Self {
        self.binary(BinOp::Add, other)
    }

    /// `self - other`
    #[must_use]
    pub fn sub(self, other: Expr) -> Self {
        self.binary(BinOp::Sub, other)
    }

    /// `self * other`
    #[must_use]
    pub fn mul(self, other: Expr) -> Self {
        self.binary(BinOp::Mul, other)
    }

    /// `self ** other`, right-associative when emitted
    #[must_use]
    pub fn pow(self, other: Expr) -> Self {
        self.binary(BinOp::Pow, other)
    }

    /// `self === other`
    #[must_use]
    pub fn strict_eq(self, other: Expr) -> Self {
        self.binary(BinOp::EqStrict, other)
    }

    /// `self !== other`
    #[must_use]
    pub fn strict_ne(self, other: Expr) -> Self {
        self.binary(BinOp::NeStrict, other)
    }

    /// `self < other`
    #[must_use]
    pub fn lt(self, other: Expr) -> Self {
        self.binary(BinOp::Lt, other)
    }

    /// `self <= other`
    #[must_use]
    pub fn le(self, other: Expr) -> Self {
        self.binary(BinOp::Le, other)
    }

    /// `self && other`
    #[must_use]
    pub fn and(self, other: Expr) -> Self {
        self.binary(BinOp::And, other)
    }

    /// `self || other`
    #[must_use]
    pub fn or(self, other: Expr) -> Self {
        self.binary(BinOp::Or, other)
    }

    /// `!self`
    #[must_use]
    pub fn not(self) -> Self {
        Self::Unary {
            op: UnaryOp::Not,
            operand: Box::new(self),
        }
    }

    /// `-self`
    #[must_use]
    pub fn neg(self) -> Self {
        Self::Unary {
            op: UnaryOp::Neg,
            operand: Box::new(self),
        }
    }

    /// `self ? then_expr : else_expr`
    #[must_use]
    pub fn ternary(self, then_expr: Expr, else_expr: Expr) -> Self {
        Self::Ternary {
            condition: Box::new(self),
            then_expr: Box::new(then_expr),
            else_expr: Box::new(else_expr),
        }
    }

    /// `{ key: value }` with keys in the given order.
    #[must_use]
    pub fn object(pairs: Vec<(&str, Expr)>) -> Self {
        Self::Object(pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }

    #[must_use]
    pub fn array(items: Vec<Expr>) -> Self {
        Self::Array(items)
    }

    /// `['a', 'b']`
    #[must_use]
    pub fn str_array<S: AsRef<str>>(items: &[S]) -> Self {
        Self::Array(items.iter().map(|s| Self::str(s.as_ref())).collect())
    }

    /// `(names) => body`
    pub fn arrow(names: &[&str], body: Expr) -> GenResult<Self> {
        Ok(Self::Arrow {
            params: params(names)?,
            body: Box::new(body),
        })
    }

    /// `(names) => { body }`
    pub fn arrow_block(names: &[&str], body: Vec<Stmt>) -> GenResult<Self> {
        Ok(Self::ArrowBlock {
            is_async: false,
            params: params(names)?,
            body,
        })
    }

    /// `async ({ page }) => { body }` and similar.
    #[must_use]
    pub fn async_arrow(params: Vec<Param>, body: Vec<Stmt>) -> Self {
        Self::ArrowBlock {
            is_async: true,
            params,
            body,
        }
    }
}

impl TemplatePart {
    #[must_use]
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    /// `${e}`
    #[must_use]
    pub const fn expr(e: Expr) -> Self {
        Self::Expr(e)
    }
}

impl Stmt {
    /// `import { names } from 'from';`
    pub fn import(names: &[&str], from: impl Into<String>) -> GenResult<Self> {
        Ok(Self::Import {
            names: idents(names)?,
            from: from.into(),
        })
    }

    /// `let name = value;`
    pub fn let_decl(name: impl Into<String>, value: Expr) -> GenResult<Self> {
        Ok(Self::Let {
            name: Identifier::new(name)?,
            value,
        })
    }

    /// `const name = value;`
    pub fn const_decl(name: impl Into<String>, value: Expr) -> GenResult<Self> {
        Ok(Self::Const {
            name: Identifier::new(name)?,
            value,
        })
    }

    /// `name = value;`
    pub fn assign(name: impl Into<String>, value: Expr) -> GenResult<Self> {
        Ok(Self::Assign {
            name: Identifier::new(name)?,
            value,
        })
    }

    #[must_use]
    pub fn expr(e: Expr) -> Self {
        Self::Expr(e)
    }

    /// Bare `return;`
    #[must_use]
    pub fn ret() -> Self {
        Self::Return(None)
    }

    /// `return e;`
    #[must_use]
    pub fn ret_val(e: Expr) -> Self {
        Self::Return(Some(e))
    }

    /// `throw e;`
    #[must_use]
    pub fn throw(e: Expr) -> Self {
        Self::Throw(e)
    }

    /// `if (cond) { .. }` with no else branch.
    #[must_use]
    pub fn if_then(cond: Expr, then_body: Vec<Stmt>) -> Self {
        Self::If {
            condition: cond,
            then_branch: then_body,
            else_branch: None,
        }
    }

    #[must_use]
    pub fn if_else(cond: Expr, then_body: Vec<Stmt>, else_body: Vec<Stmt>) -> Self {
        Self::If {
            condition: cond,
            then_branch: then_body,
            else_branch: Some(else_body),
        }
    }

    /// `for (let var = start; var < end; var++)`
    pub fn for_loop(var: impl Into<String>, start: Expr, end: Expr, body: Vec<Stmt>) -> GenResult<Self> {
        Ok(Self::For {
            var: Identifier::new(var)?,
            start,
            end,
            inclusive: false,
            body,
        })
    }

    /// `for (let var = start; var <= end; var++)`
    pub fn for_inclusive(var: impl Into<String>, start: Expr, end: Expr, body: Vec<Stmt>) -> GenResult<Self> {
        Ok(Self::For {
            var: Identifier::new(var)?,
            start,
            end,
            inclusive: true,
            body,
        })
    }

    /// `for (const var of iterable)`
    pub fn for_of(var: impl Into<String>, iterable: Expr, body: Vec<Stmt>) -> GenResult<Self> {
        Ok(Self::ForOf {
            var: Identifier::new(var)?,
            iterable,
            body,
        })
    }

    /// `try { body } catch (catch_var) { handler }`
    pub fn try_catch(body: Vec<Stmt>, catch_var: impl Into<String>, handler: Vec<Stmt>) -> GenResult<Self> {
        Ok(Self::TryCatch {
            body,
            catch_var: Identifier::new(catch_var)?,
            handler,
        })
    }

    #[must_use]
    pub fn comment(text: impl Into<String>) -> Self {
        Self::Comment(text.into())
    }
}
