//! Abstract-syntax-tree data model.
//!
//! Every node produced by the builders carries a [`Location`] pointing back
//! into the original source, via the [`ExprLoc`] / [`StmtLoc`] wrappers. The
//! type checker and code generator consume this schema; the runtime stack
//! manager consumes the `Location` values the code generator bakes into the
//! target program.

use num_bigint::BigInt;

use crate::parse::Location;

/// A literal value: integer (arbitrary precision), string, boolean, or `None`.
///
/// Literals are the only legal initializers for typed variable declarations
/// and parameter defaults.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Literal {
    Num(BigInt),
    Str(String),
    Bool(bool),
    None,
}

/// Unary built-in functions recognized at call sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString, serde::Serialize, serde::Deserialize)]
#[strum(serialize_all = "lowercase")]
pub enum Builtin1Fn {
    Print,
    Abs,
}

/// Binary built-in functions recognized at call sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString, serde::Serialize, serde::Deserialize)]
#[strum(serialize_all = "lowercase")]
pub enum Builtin2Fn {
    Max,
    Min,
    Pow,
}

/// Binary operators.
///
/// The strum `serialize` attributes carry the concrete operator token, so the
/// builder maps token text to a variant with `str::parse` and diagnostics can
/// print the token back with `Display`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString, serde::Serialize, serde::Deserialize)]
pub enum BinOp {
    #[strum(serialize = "+")]
    Plus,
    #[strum(serialize = "-")]
    Minus,
    #[strum(serialize = "*")]
    Mul,
    #[strum(serialize = "//")]
    IDiv,
    #[strum(serialize = "%")]
    Mod,
    #[strum(serialize = "==")]
    Eq,
    #[strum(serialize = "!=")]
    Neq,
    #[strum(serialize = "<=")]
    Lte,
    #[strum(serialize = ">=")]
    Gte,
    #[strum(serialize = "<")]
    Lt,
    #[strum(serialize = ">")]
    Gt,
    #[strum(serialize = "is")]
    Is,
    #[strum(serialize = "and")]
    And,
    #[strum(serialize = "or")]
    Or,
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString, serde::Serialize, serde::Deserialize)]
pub enum UniOp {
    #[strum(serialize = "-")]
    Neg,
    #[strum(serialize = "not")]
    Not,
}

/// An expression in the AST.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Expr {
    Literal(Literal),
    /// A variable reference.
    Id(String),
    /// Generic call whose callee is itself an expression (a plain function
    /// name, or the result of another call).
    CallExpr {
        callee: Box<ExprLoc>,
        args: Vec<ExprLoc>,
    },
    /// Method call on an object: `obj.method(args)`.
    ///
    /// Produced by rewriting a call whose callee resolved to a field
    /// [`Expr::Lookup`]; this is how method dispatch is distinguished from
    /// function calls that look identical at the call site.
    MethodCall {
        obj: Box<ExprLoc>,
        method: String,
        args: Vec<ExprLoc>,
    },
    /// Call of a unary built-in (`print`, `abs`).
    Builtin1 {
        name: Builtin1Fn,
        arg: Box<ExprLoc>,
    },
    /// Call of a binary built-in (`max`, `min`, `pow`).
    Builtin2 {
        name: Builtin2Fn,
        left: Box<ExprLoc>,
        right: Box<ExprLoc>,
    },
    /// The special-cased `range` call, kept by name for the code generator.
    Call {
        name: String,
        args: Vec<ExprLoc>,
    },
    BinOp {
        op: BinOp,
        left: Box<ExprLoc>,
        right: Box<ExprLoc>,
    },
    UniOp {
        op: UniOp,
        expr: Box<ExprLoc>,
    },
    /// Field access: `obj.field`.
    Lookup {
        obj: Box<ExprLoc>,
        field: String,
    },
    /// Single-index access: `obj[key]`.
    BracketLookup {
        obj: Box<ExprLoc>,
        key: Box<ExprLoc>,
    },
    /// Slice access: `obj[start:end:stride]`.
    ///
    /// Components omitted in the source are filled with literal defaults:
    /// start `0`, end `-1`, stride `1`.
    Slicing {
        obj: Box<ExprLoc>,
        start: Box<ExprLoc>,
        end: Box<ExprLoc>,
        stride: Box<ExprLoc>,
    },
    ListExpr(Vec<ExprLoc>),
    /// Dict literal as ordered key/value pairs.
    Dict(Vec<(ExprLoc, ExprLoc)>),
    /// Lambda with untyped parameter names and a single return expression.
    Lambda {
        params: Vec<String>,
        ret: Box<ExprLoc>,
    },
}

impl Expr {
    /// Whether this expression is a legal assignment target: an identifier,
    /// a field lookup, or a bracket lookup.
    #[must_use]
    pub fn is_assignable(&self) -> bool {
        matches!(self, Self::Id(_) | Self::Lookup { .. } | Self::BracketLookup { .. })
    }
}

/// An expression with its source location.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ExprLoc {
    pub location: Location,
    pub expr: Expr,
}

impl ExprLoc {
    #[must_use]
    pub fn new(location: Location, expr: Expr) -> Self {
        Self { location, expr }
    }
}

/// One target on the left-hand side of an assignment.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AssignTarget {
    pub target: ExprLoc,
    /// True exactly when the target is the identifier `_`.
    pub ignore: bool,
    /// True for a `*target` splat capturing the remainder of the values.
    pub starred: bool,
}

/// The full left-hand side of an assignment.
///
/// At most one target may be starred, and a starred target is illegal when
/// the target list is a single bare target (`*x = ...` is rejected even
/// though the trailing-comma form `*x, = ...` is legal).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Destructure {
    pub targets: Vec<AssignTarget>,
    /// False only for a single bare target with no trailing comma.
    pub is_destructured: bool,
}

/// A statement in the AST.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Stmt {
    Return(ExprLoc),
    Assign {
        destruct: Destructure,
        value: ExprLoc,
    },
    Expr(ExprLoc),
    /// `if` statement. The else block is mandatory; a missing else is a
    /// parse error, so both branches are always present.
    If {
        cond: ExprLoc,
        then_body: Vec<StmtLoc>,
        else_body: Vec<StmtLoc>,
    },
    While {
        cond: ExprLoc,
        body: Vec<StmtLoc>,
    },
    Pass,
    Continue,
    Break,
    /// `for` loop. `index` is present only for the two-variable
    /// enumerate-like form `for i, x in ...`.
    For {
        name: String,
        index: Option<String>,
        iterable: ExprLoc,
        body: Vec<StmtLoc>,
    },
}

/// A statement with its source location.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StmtLoc {
    pub location: Location,
    pub stmt: Stmt,
}

impl StmtLoc {
    #[must_use]
    pub fn new(location: Location, stmt: Stmt) -> Self {
        Self { location, stmt }
    }
}

/// A type annotation.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Type {
    Num,
    Bool,
    None,
    Str,
    /// A nominal class type.
    Class(String),
    List(Box<Type>),
    Dict {
        key: Box<Type>,
        value: Box<Type>,
    },
    /// A callable signature: `Callable[[int, str], bool]`.
    Callable {
        params: Vec<Parameter>,
        ret: Box<Type>,
    },
}

/// A typed function parameter with an optional default literal.
///
/// Once one parameter in a list has a default, every following parameter
/// must also have one; the builder enforces this.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Parameter {
    pub name: String,
    pub typ: Type,
    pub default: Option<Literal>,
}

/// A typed variable declaration with a mandatory literal initializer, at
/// module, class-field, or function-local level.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct VarInit {
    pub name: String,
    pub typ: Type,
    pub value: Literal,
    pub location: Location,
}

/// A `nonlocal` scope declaration.
///
/// `global` declarations are rejected as unsupported at parse time, so only
/// the nonlocal form reaches the AST.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NonlocalDecl {
    pub name: String,
    pub location: Location,
}

/// A function (or method) definition.
///
/// The leading section of the body is split out during parsing: typed local
/// inits, nonlocal declarations, and nested function definitions must all
/// appear, in that order, before the first executable statement.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FunDef {
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub ret: Type,
    /// Leading typed local variable declarations.
    pub inits: Vec<VarInit>,
    /// Leading nonlocal declarations.
    pub decls: Vec<NonlocalDecl>,
    /// Leading nested function definitions.
    pub funs: Vec<FunDef>,
    /// The executable statement sequence.
    pub body: Vec<StmtLoc>,
    pub location: Location,
}

/// A class definition: typed fields plus methods.
///
/// Every class has an `__init__` method; when the source omits one, the
/// builder synthesizes a no-op constructor taking only `self`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ClassDef {
    pub name: String,
    pub fields: Vec<VarInit>,
    pub methods: Vec<FunDef>,
    pub location: Location,
}

/// A whole parsed program.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Program {
    pub funs: Vec<FunDef>,
    pub inits: Vec<VarInit>,
    pub classes: Vec<ClassDef>,
    /// Top-level executable statements, in source order.
    pub stmts: Vec<StmtLoc>,
    /// Reserved for the downstream closure-lowering pass; always empty here.
    pub closures: Vec<FunDef>,
}
