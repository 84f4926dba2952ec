//! Typed tree for generated test files.
//!
//! Nodes cover what a Playwright test file needs and nothing more: ES
//! module imports, `async` functions and arrows, counted and `for...of`
//! loops, `try`/`catch`, `throw` and template literals. Names are
//! [`Identifier`]s, validated when built, so the emitter never has to
//! reject input.

use serde::{Deserialize, Serialize};

use crate::error::{GenError, GenResult};

/// A complete module (one generated file).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsModule {
    pub statements: Vec<Stmt>,
    /// Provenance written to the header and the manifest
    pub metadata: Option<GenerationMetadata>,
}

impl Default for JsModule {
    fn default() -> Self {
        Self::new()
    }
}

impl JsModule {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            statements: Vec::new(),
            metadata: None,
        }
    }
}

/// Metadata about code generation, recorded in the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationMetadata {
    /// Generator name
    pub tool: String,
    pub version: String,
    /// Blake3 hash of the input (script and configuration)
    pub input_hash: String,
    /// RFC 3339 generation time
    pub timestamp: String,
    /// Shell command that reproduces the file
    pub regenerate_cmd: String,
}

/// Statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    /// Named import: `import { a, b } from 'module';`
    Import {
        /// Imported names
        names: Vec<Identifier>,
        /// Module specifier
        from: String,
    },
    /// `let name = value;`
    Let { name: Identifier, value: Expr },
    /// `const name = value;`
    Const { name: Identifier, value: Expr },
    /// `name = value;`
    Assign { name: Identifier, value: Expr },
    /// `expr;`
    Expr(Expr),
    /// `return expr;` or `return;`
    Return(Option<Expr>),
    /// `throw expr;`
    Throw(Expr),
    /// `if (condition) { .. } else { .. }`
    If {
        condition: Expr,
        then_branch: Vec<Stmt>,
        else_branch: Option<Vec<Stmt>>,
    },
    /// Counted loop: `for (let i = start; i < end; i++) { body }`
    /// (`<=` when `inclusive`)
    For {
        var: Identifier,
        start: Expr,
        end: Expr,
        inclusive: bool,
        body: Vec<Stmt>,
    },
    /// `for (const var of iterable) { body }`
    ForOf {
        var: Identifier,
        iterable: Expr,
        body: Vec<Stmt>,
    },
    /// `try { body } catch (catch_var) { handler }`
    TryCatch {
        body: Vec<Stmt>,
        catch_var: Identifier,
        handler: Vec<Stmt>,
    },
    Function(JsFunction),
    /// `// text`; multi-line text becomes several comment lines
    Comment(String),
    Blank,
}

/// Expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Null,
    Bool(bool),
    /// Whole values print without a fraction; non-finite values print as
    /// `NaN`, `Infinity` or `-Infinity`
    Num(f64),
    /// Quoted and escaped at emit time
    Str(String),
    /// `` `text ${expr}` ``
    Template(Vec<TemplatePart>),
    Ident(Identifier),
    /// `object.property`
    Member {
        object: Box<Expr>,
        property: Identifier,
    },
    /// `callee(args)`
    Call { callee: Box<Expr>, args: Vec<Expr> },
    /// `new constructor(args)`
    New {
        constructor: Box<Expr>,
        args: Vec<Expr>,
    },
    Await(Box<Expr>),
    /// Parenthesized by the emitter according to [`BinOp::precedence`]
    Binary {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
    },
    Unary { op: UnaryOp, operand: Box<Expr> },
    /// `condition ? then_expr : else_expr`
    Ternary {
        condition: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
    },
    /// Keys keep insertion order
    Object(Vec<(String, Expr)>),
    Array(Vec<Expr>),
    /// `(params) => body`
    Arrow { params: Vec<Param>, body: Box<Expr> },
    /// `async (params) => { body }` when `is_async`
    ArrowBlock {
        is_async: bool,
        params: Vec<Param>,
        body: Vec<Stmt>,
    },
}

/// Piece of a template literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TemplatePart {
    /// Literal text (escaped by the emitter)
    Text(String),
    /// `${expr}`
    Expr(Expr),
}

/// Function or arrow parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Param {
    /// Plain name
    Name(Identifier),
    /// Object destructuring: `{ a, b }`
    Destructure(Vec<Identifier>),
}

/// Named function declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsFunction {
    pub name: Identifier,
    pub is_async: bool,
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
}

/// Infix operators. Only strict equality is offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    EqStrict,
    NeStrict,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinOp {
    /// Source token.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Pow => "**",
            Self::EqStrict => "===",
            Self::NeStrict => "!==",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::And => "&&",
            Self::Or => "||",
        }
    }

    /// Binding strength; higher binds tighter.
    #[must_use]
    pub const fn precedence(self) -> u8 {
        match self {
            Self::Or => 1,
            Self::And => 2,
            Self::EqStrict | Self::NeStrict => 3,
            Self::Lt | Self::Le | Self::Gt | Self::Ge => 4,
            Self::Add | Self::Sub => 5,
            Self::Mul | Self::Div => 6,
            Self::Pow => 7,
        }
    }
}

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Not,
    Neg,
}

impl UnaryOp {
    /// Source token.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Not => "!",
            Self::Neg => "-",
        }
    }
}

/// Binding or property name: ASCII letters, digits, `_` and `$`, not
/// starting with a digit and not a reserved word.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identifier(String);

impl Identifier {
    /// Keywords, strict-mode reserved words and the literal names.
    #[rustfmt::skip]
    pub const RESERVED_WORDS: &'static [&'static str] = &[
        // keywords
        "await", "break", "case", "catch", "class", "const", "continue", "debugger",
        "default", "delete", "do", "else", "export", "extends", "finally", "for",
        "function", "if", "import", "in", "instanceof", "let", "new", "return",
        "static", "super", "switch", "this", "throw", "try", "typeof", "var",
        "void", "while", "with", "yield",
        // future and strict-mode reserved
        "enum", "implements", "interface", "package", "private", "protected", "public",
        // literals
        "null", "true", "false",
    ];

    /// Validate `name`, reporting the first rule it breaks.
    pub fn new(name: impl Into<String>) -> GenResult<Self> {
        let name = name.into();

        let reason = match name.chars().next() {
            None => Some("identifier cannot be empty".to_string()),
            Some(first) if first.is_ascii_digit() => {
                Some("identifier cannot start with a digit".to_string())
            }
            Some(_) => name
                .chars()
                .find(|c| !c.is_ascii_alphanumeric() && *c != '_' && *c != '$')
                .map(|c| format!("invalid character '{c}'"))
                .or_else(|| {
                    Self::RESERVED_WORDS
                        .contains(&name.as_str())
                        .then(|| "reserved word".to_string())
                }),
        };

        match reason {
            Some(reason) => Err(GenError::InvalidIdentifier { name, reason }),
            None => Ok(Self(name)),
        }
    }

    /// Create an identifier without validation.
    ///
    /// Only for names known to be valid at compile time.
    #[must_use]
    pub fn new_unchecked(name: &'static str) -> Self {
        Self(name.to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
