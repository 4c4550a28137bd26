//! Shared test support: a sketch builder that assembles a source string and
//! its concrete syntax tree in lockstep, so node byte ranges never have to be
//! computed by hand.

use pyrite::{ParseError, Program, SyntaxTree, TreeBuilder};

pub struct Sketch {
    builder: TreeBuilder,
    source: String,
}

impl Sketch {
    pub fn new() -> Self {
        Self {
            builder: TreeBuilder::new(),
            source: String::new(),
        }
    }

    /// Opens an interior node.
    pub fn node(&mut self, kind: &str) -> &mut Self {
        self.builder.start_node(kind);
        self
    }

    /// Closes the innermost open node.
    pub fn end(&mut self) -> &mut Self {
        self.builder.finish_node();
        self
    }

    /// Appends a leaf token, extending the source with its text.
    pub fn leaf(&mut self, kind: &str, text: &str) -> &mut Self {
        let start = self.source.len();
        self.source.push_str(text);
        self.builder.token(kind, start, self.source.len());
        self
    }

    /// A punctuation or keyword token whose kind equals its text.
    pub fn tok(&mut self, text: &str) -> &mut Self {
        let start = self.source.len();
        self.source.push_str(text);
        self.builder.token(text, start, self.source.len());
        self
    }

    /// Appends source text with no corresponding token (whitespace).
    pub fn ws(&mut self, text: &str) -> &mut Self {
        self.source.push_str(text);
        self
    }

    pub fn finish(self) -> (SyntaxTree, String) {
        (self.builder.finish(), self.source)
    }

    /// Finishes the sketch and runs the AST builders over it as file 0.
    pub fn parse(self) -> Result<Program, ParseError> {
        let (tree, source) = self.finish();
        pyrite::parse(&tree, &source, 0)
    }
}

/// Builds a program whose single top-level statement wraps the expression
/// sketched by `build`.
pub fn expr_program(build: impl FnOnce(&mut Sketch)) -> Result<Program, ParseError> {
    let mut s = Sketch::new();
    s.node("Script").node("ExpressionStatement");
    build(&mut s);
    s.end().end();
    s.parse()
}

/// Extracts the expression of the program's single expression statement.
pub fn first_expr(program: Program) -> pyrite::Expr {
    match program.stmts.into_iter().next().map(|s| s.stmt) {
        Some(pyrite::Stmt::Expr(e)) => e.expr,
        other => panic!("expected a single expression statement, got {other:?}"),
    }
}
