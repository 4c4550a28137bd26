//! CST-to-AST transformation.
//!
//! The builders here walk the immutable [`SyntaxTree`] arena and reconstruct
//! the typed, source-located AST. Traversal is purely
//! recursive over child-id slices; classification of leading declarations
//! (`is_var_init` and friends) is a non-destructive kind peek with no
//! traversal side effects.
//!
//! All errors are fatal: an unrecognized node, unknown operator token,
//! missing else block, invalid assignment target, or malformed type syntax
//! aborts the whole transformation with a [`ParseError`] carrying the
//! offending [`Location`].

use std::{borrow::Cow, fmt, str::FromStr};

use num_bigint::BigInt;

use crate::{
    ast::{
        AssignTarget, BinOp, Builtin1Fn, Builtin2Fn, ClassDef, Destructure, Expr, ExprLoc, FunDef, Literal,
        NonlocalDecl, Parameter, Program, Stmt, StmtLoc, Type, UniOp, VarInit,
    },
    cst::{NodeId, SyntaxTree},
};

/// Source position of an AST node: 1-based line and column, byte length of
/// the spanning token, and the id of the source file.
///
/// Attached to every node the builders produce, and baked into generated
/// code as `push_stack` arguments so the runtime can render traces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Location {
    pub line: u32,
    pub col: u32,
    pub length: u32,
    pub file_id: u32,
}

impl Location {
    #[must_use]
    pub fn new(line: u32, col: u32, length: u32, file_id: u32) -> Self {
        Self {
            line,
            col,
            length,
            file_id,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.col)
    }
}

/// Parses a whole source file into a [`Program`].
///
/// `tree` is the concrete syntax tree the external parser produced for
/// `source`; `file_id` identifies the file in the multi-file source table
/// kept by the runtime stack manager.
pub fn parse(tree: &SyntaxTree, source: &str, file_id: u32) -> Result<Program, ParseError> {
    let parser = Parser::new(tree, source, file_id);
    parser.parse_program(tree.root())
}

/// Builder state shared by all traversal routines.
///
/// Holds the tree, the source text, and the byte positions of line ends so
/// node offsets can be converted to line/column locations.
struct Parser<'a> {
    tree: &'a SyntaxTree,
    source: &'a str,
    line_ends: Vec<usize>,
    file_id: u32,
}

impl<'a> Parser<'a> {
    fn new(tree: &'a SyntaxTree, source: &'a str, file_id: u32) -> Self {
        // Position of each line end, to convert byte offsets to line and column numbers
        let mut line_ends = Vec::new();
        for (i, c) in source.char_indices() {
            if c == '\n' {
                line_ends.push(i);
            }
        }
        Self {
            tree,
            source,
            line_ends,
            file_id,
        }
    }

    fn kind(&self, node: NodeId) -> &str {
        self.tree.kind(node)
    }

    fn text(&self, node: NodeId) -> &str {
        self.tree.text(node, self.source)
    }

    /// Returns the 0-indexed line number and the byte offset of that line's
    /// first character for a byte index into the source.
    fn index_to_position(&self, index: usize) -> (usize, usize) {
        let mut line_start = 0;
        for (line_no, line_end) in self.line_ends.iter().enumerate() {
            if index <= *line_end {
                return (line_no, line_start);
            }
            line_start = *line_end + 1;
        }
        // Content after the last newline (file without trailing newline)
        (self.line_ends.len(), line_start)
    }

    fn location(&self, node: NodeId) -> Location {
        let start = self.tree.start(node);
        let end = self.tree.end(node);
        let (line_no, line_start) = self.index_to_position(start);
        Location {
            line: line_no as u32 + 1,
            col: (start - line_start) as u32 + 1,
            length: (end - start) as u32,
            file_id: self.file_id,
        }
    }

    // ---------------------------------------------------------------------
    // classification
    // ---------------------------------------------------------------------

    /// A typed variable declaration is an assignment whose second child is a
    /// type annotation.
    fn is_var_init(&self, node: NodeId) -> bool {
        self.kind(node) == "AssignStatement"
            && self
                .tree
                .children(node)
                .get(1)
                .is_some_and(|&c| self.kind(c) == "TypeDef")
    }

    fn is_fun_def(&self, node: NodeId) -> bool {
        self.kind(node) == "FunctionDefinition"
    }

    fn is_class_def(&self, node: NodeId) -> bool {
        self.kind(node) == "ClassDefinition"
    }

    fn is_scope_decl(&self, node: NodeId) -> bool {
        self.kind(node) == "ScopeStatement"
    }

    // ---------------------------------------------------------------------
    // literals and expressions
    // ---------------------------------------------------------------------

    fn parse_literal(&self, node: NodeId) -> Result<Literal, ParseError> {
        let location = self.location(node);
        match self.kind(node) {
            "Number" => {
                let text = self.text(node);
                let value = text
                    .parse::<BigInt>()
                    .map_err(|_| ParseError::syntax(format!("invalid number literal {text}"), location))?;
                Ok(Literal::Num(value))
            }
            "String" => {
                // Strip the surrounding quote characters
                let text = self.text(node);
                let inner = text.get(1..text.len().saturating_sub(1)).unwrap_or("");
                Ok(Literal::Str(inner.to_owned()))
            }
            "Boolean" => Ok(Literal::Bool(self.text(node) == "True")),
            "None" => Ok(Literal::None),
            _ => Err(ParseError::syntax("not a literal", location)),
        }
    }

    /// Parses one expression subtree.
    fn parse_expr(&self, node: NodeId) -> Result<ExprLoc, ParseError> {
        let location = self.location(node);
        let expr = match self.kind(node) {
            "Number" | "String" | "Boolean" | "None" => Expr::Literal(self.parse_literal(node)?),
            "VariableName" => Expr::Id(self.text(node).to_owned()),
            "self" => Expr::Id("self".to_owned()),
            "CallExpression" => self.parse_call(node, location)?,
            "BinaryExpression" => self.parse_binary(node, location)?,
            "UnaryExpression" => self.parse_unary(node, location)?,
            "ParenthesizedExpression" => return self.parse_paren(node, location),
            "MemberExpression" => self.parse_member(node, location)?,
            "ArrayExpression" => self.parse_list(node)?,
            "DictionaryExpression" => self.parse_dict(node, location)?,
            "LambdaExpression" => self.parse_lambda(node, location)?,
            _ => {
                return Err(ParseError::syntax(
                    format!("could not parse expression: {}", self.text(node)),
                    location,
                ));
            }
        };
        Ok(ExprLoc::new(location, expr))
    }

    /// A parenthesized expression is transparent: the inner expression is
    /// returned with its own location.
    fn parse_paren(&self, node: NodeId, location: Location) -> Result<ExprLoc, ParseError> {
        for &child in self.tree.children(node) {
            if matches!(self.kind(child), "(" | ")") {
                continue;
            }
            return self.parse_expr(child);
        }
        Err(ParseError::syntax("empty parenthesized expression", location))
    }

    fn parse_call(&self, node: NodeId, location: Location) -> Result<Expr, ParseError> {
        let children = self.tree.children(node);
        let (&callee_node, rest) = children
            .split_first()
            .ok_or_else(|| ParseError::syntax("could not parse call expression", location))?;
        let callee = self.parse_expr(callee_node)?;
        let arg_list = rest
            .iter()
            .copied()
            .find(|&c| self.kind(c) == "ArgList")
            .ok_or_else(|| ParseError::syntax("missing argument list in call expression", location))?;
        let args = self.parse_arguments(arg_list)?;
        Self::rewrite_call(callee, args, location)
    }

    fn parse_arguments(&self, arg_list: NodeId) -> Result<Vec<ExprLoc>, ParseError> {
        let mut args = Vec::new();
        for &child in self.tree.children(arg_list) {
            if matches!(self.kind(child), "(" | "," | ")") {
                continue;
            }
            args.push(self.parse_expr(child)?);
        }
        Ok(args)
    }

    /// Rewrites a generic call according to the shape of its just-built
    /// callee: a field lookup becomes a method call, a bare identifier is
    /// checked against the fixed built-in table, and a call result stays a
    /// generic call of that expression.
    fn rewrite_call(callee: ExprLoc, args: Vec<ExprLoc>, location: Location) -> Result<Expr, ParseError> {
        match callee.expr {
            Expr::Lookup { obj, field } => Ok(Expr::MethodCall {
                obj,
                method: field,
                args,
            }),
            Expr::Id(name) => Self::rewrite_named_call(name, args, location),
            Expr::CallExpr { .. } | Expr::MethodCall { .. } => Ok(Expr::CallExpr {
                callee: Box::new(callee),
                args,
            }),
            _ => Err(ParseError::syntax("expression is not callable", location)),
        }
    }

    /// Dispatches a call of a plain name: built-in forms get their dedicated
    /// variants (with arity checked here), everything else is a generic call.
    fn rewrite_named_call(name: String, args: Vec<ExprLoc>, location: Location) -> Result<Expr, ParseError> {
        if let Ok(builtin) = Builtin1Fn::from_str(&name) {
            let mut args = args.into_iter();
            return match (args.next(), args.next()) {
                (Some(arg), None) => Ok(Expr::Builtin1 {
                    name: builtin,
                    arg: Box::new(arg),
                }),
                _ => Err(ParseError::syntax(
                    format!("{builtin}() takes exactly 1 argument"),
                    location,
                )),
            };
        }
        if let Ok(builtin) = Builtin2Fn::from_str(&name) {
            let mut args = args.into_iter();
            return match (args.next(), args.next(), args.next()) {
                (Some(left), Some(right), None) => Ok(Expr::Builtin2 {
                    name: builtin,
                    left: Box::new(left),
                    right: Box::new(right),
                }),
                _ => Err(ParseError::syntax(
                    format!("{builtin}() takes exactly 2 arguments"),
                    location,
                )),
            };
        }
        if name == "range" {
            return Ok(Expr::Call { name, args });
        }
        Ok(Expr::CallExpr {
            callee: Box::new(ExprLoc::new(location, Expr::Id(name))),
            args,
        })
    }

    fn parse_binary(&self, node: NodeId, location: Location) -> Result<Expr, ParseError> {
        let &[lhs, op_node, rhs] = self.tree.children(node) else {
            return Err(ParseError::syntax("could not parse binary expression", location));
        };
        let op_text = self.text(op_node);
        let op = BinOp::from_str(op_text)
            .map_err(|_| ParseError::syntax(format!("could not parse operator {op_text}"), self.location(op_node)))?;
        Ok(Expr::BinOp {
            op,
            left: Box::new(self.parse_expr(lhs)?),
            right: Box::new(self.parse_expr(rhs)?),
        })
    }

    fn parse_unary(&self, node: NodeId, location: Location) -> Result<Expr, ParseError> {
        let &[op_node, operand] = self.tree.children(node) else {
            return Err(ParseError::syntax("could not parse unary expression", location));
        };
        let op_text = self.text(op_node);
        let op = UniOp::from_str(op_text)
            .map_err(|_| ParseError::syntax(format!("could not parse operator {op_text}"), self.location(op_node)))?;
        Ok(Expr::UniOp {
            op,
            expr: Box::new(self.parse_expr(operand)?),
        })
    }

    /// Member access: the separator token decides between dotted field
    /// access and bracket access (index or slice).
    fn parse_member(&self, node: NodeId, location: Location) -> Result<Expr, ParseError> {
        let children = self.tree.children(node);
        let (&obj_node, rest) = children
            .split_first()
            .ok_or_else(|| ParseError::syntax("could not parse member expression", location))?;
        let (&sep, rest) = rest
            .split_first()
            .ok_or_else(|| ParseError::syntax("could not parse member expression", location))?;
        let obj = self.parse_expr(obj_node)?;
        match self.text(sep) {
            "[" => self.parse_bracket(obj, rest, location),
            "." => {
                let &field_node = rest
                    .first()
                    .ok_or_else(|| ParseError::syntax("missing field name after '.'", location))?;
                Ok(Expr::Lookup {
                    obj: Box::new(obj),
                    field: self.text(field_node).to_owned(),
                })
            }
            other => Err(ParseError::syntax(
                format!("could not parse member access separator {other}"),
                location,
            )),
        }
    }

    /// Bracket access. The bracket body's children are split on `:` tokens:
    /// no colon is a plain index, one or two colons are a slice with
    /// defaulted missing components, more is an error.
    fn parse_bracket(&self, obj: ExprLoc, body: &[NodeId], location: Location) -> Result<Expr, ParseError> {
        let mut groups: Vec<Vec<NodeId>> = vec![Vec::new()];
        for &child in body {
            match self.kind(child) {
                "]" => break,
                ":" => groups.push(Vec::new()),
                _ => {
                    if let Some(group) = groups.last_mut() {
                        group.push(child);
                    }
                }
            }
        }
        if groups.len() == 1 {
            return match groups[0].as_slice() {
                [] => Err(ParseError::syntax("need a value inside the brackets", location)),
                &[key] => Ok(Expr::BracketLookup {
                    obj: Box::new(obj),
                    key: Box::new(self.parse_expr(key)?),
                }),
                _ => Err(ParseError::syntax("invalid index expression", location)),
            };
        }
        if groups.len() > 3 {
            return Err(ParseError::syntax("too many slice components inside brackets", location));
        }
        let start = self.slice_component(&groups[0], 0, location)?;
        let end = self.slice_component(groups.get(1).map_or(&[][..], Vec::as_slice), -1, location)?;
        let stride = self.slice_component(groups.get(2).map_or(&[][..], Vec::as_slice), 1, location)?;
        Ok(Expr::Slicing {
            obj: Box::new(obj),
            start,
            end,
            stride,
        })
    }

    /// One slice component: empty means the literal default for its slot.
    fn slice_component(&self, group: &[NodeId], default: i64, location: Location) -> Result<Box<ExprLoc>, ParseError> {
        match group {
            [] => Ok(Box::new(ExprLoc::new(
                location,
                Expr::Literal(Literal::Num(BigInt::from(default))),
            ))),
            &[node] => Ok(Box::new(self.parse_expr(node)?)),
            _ => Err(ParseError::syntax("invalid slice expression", location)),
        }
    }

    fn parse_list(&self, node: NodeId) -> Result<Expr, ParseError> {
        let mut items = Vec::new();
        for &child in self.tree.children(node) {
            if matches!(self.kind(child), "[" | "," | "]") {
                continue;
            }
            items.push(self.parse_expr(child)?);
        }
        Ok(Expr::ListExpr(items))
    }

    fn parse_dict(&self, node: NodeId, location: Location) -> Result<Expr, ParseError> {
        let mut entries = Vec::new();
        let mut pending_key: Option<ExprLoc> = None;
        for &child in self.tree.children(node) {
            if matches!(self.kind(child), "{" | "," | ":" | "}") {
                continue;
            }
            let expr = self.parse_expr(child)?;
            match pending_key.take() {
                None => pending_key = Some(expr),
                Some(key) => entries.push((key, expr)),
            }
        }
        if pending_key.is_some() {
            return Err(ParseError::syntax("dictionary entry is missing a value", location));
        }
        Ok(Expr::Dict(entries))
    }

    /// Lambda: an optional untyped parameter-name list followed by a single
    /// return expression.
    fn parse_lambda(&self, node: NodeId, location: Location) -> Result<Expr, ParseError> {
        let children = self.tree.children(node);
        let mut idx = 1; // past the `lambda` keyword
        let mut params = Vec::new();
        if let Some(&param_list) = children.get(idx)
            && self.kind(param_list) == "ParamList"
        {
            for &child in self.tree.children(param_list) {
                if self.kind(child) == "VariableName" {
                    params.push(self.text(child).to_owned());
                }
            }
            idx += 1;
        }
        match children.get(idx) {
            Some(&colon) if self.kind(colon) == ":" => idx += 1,
            _ => return Err(ParseError::syntax("invalid lambda expression", location)),
        }
        let &ret_node = children
            .get(idx)
            .ok_or_else(|| ParseError::syntax("invalid lambda expression", location))?;
        Ok(Expr::Lambda {
            params,
            ret: Box::new(self.parse_expr(ret_node)?),
        })
    }

    // ---------------------------------------------------------------------
    // assignment targets
    // ---------------------------------------------------------------------

    /// Parses one assignment target and validates it is assignable.
    fn parse_assign_target(&self, node: NodeId, starred: bool) -> Result<AssignTarget, ParseError> {
        let location = self.location(node);
        let target = self.parse_expr(node).map_err(|_| {
            ParseError::syntax(
                format!("expected assignment target, got {}", self.text(node)),
                location,
            )
        })?;
        if !target.expr.is_assignable() {
            return Err(ParseError::syntax(
                format!("cannot assign to {}", self.text(node)),
                location,
            ));
        }
        // Underscore targets are ignored
        let ignore = matches!(&target.expr, Expr::Id(name) if name == "_");
        Ok(AssignTarget {
            target,
            ignore,
            starred,
        })
    }

    /// Parses the whole left-hand side of an assignment: the given children
    /// are the nodes before the assignment operator.
    ///
    /// A trailing comma makes a single target a destructuring list, which is
    /// why `*z, = ...` is legal while `*z = ...` is not.
    fn parse_destructure(&self, target_children: &[NodeId], location: Location) -> Result<Destructure, ParseError> {
        let mut targets = Vec::new();
        let mut saw_comma = false;
        let mut starred_pending = false;
        let mut have_starred = false;
        for &child in target_children {
            match self.kind(child) {
                "," => saw_comma = true,
                "*" => starred_pending = true,
                _ => {
                    let target = self.parse_assign_target(child, starred_pending)?;
                    starred_pending = false;
                    if target.starred {
                        if have_starred {
                            return Err(ParseError::syntax(
                                "cannot have multiple starred targets in assignment",
                                location,
                            ));
                        }
                        have_starred = true;
                    }
                    targets.push(target);
                }
            }
        }
        if targets.is_empty() {
            return Err(ParseError::syntax("missing assignment target", location));
        }
        let is_simple = targets.len() == 1 && !saw_comma;
        if is_simple && have_starred {
            return Err(ParseError::syntax(
                "starred assignment target must be in a list or tuple",
                location,
            ));
        }
        Ok(Destructure {
            targets,
            is_destructured: !is_simple,
        })
    }

    // ---------------------------------------------------------------------
    // statements
    // ---------------------------------------------------------------------

    fn parse_stmt(&self, node: NodeId) -> Result<StmtLoc, ParseError> {
        let location = self.location(node);
        let children = self.tree.children(node);
        let stmt = match self.kind(node) {
            "ReturnStatement" => {
                let value = match children.get(1) {
                    Some(&value) => self.parse_expr(value)?,
                    None => ExprLoc::new(location, Expr::Literal(Literal::None)),
                };
                Stmt::Return(value)
            }
            "AssignStatement" => {
                if self.is_var_init(node) {
                    return Err(ParseError::syntax(
                        "variable declarations must come before statements",
                        location,
                    ));
                }
                let op_idx = children
                    .iter()
                    .position(|&c| self.kind(c) == "AssignOp")
                    .ok_or_else(|| ParseError::syntax("could not parse assignment", location))?;
                let destruct = self.parse_destructure(&children[..op_idx], location)?;
                let &value_node = children
                    .get(op_idx + 1)
                    .ok_or_else(|| ParseError::syntax("missing assignment value", location))?;
                Stmt::Assign {
                    destruct,
                    value: self.parse_expr(value_node)?,
                }
            }
            "ExpressionStatement" => {
                let &inner = children
                    .first()
                    .ok_or_else(|| ParseError::syntax("empty expression statement", location))?;
                Stmt::Expr(self.parse_expr(inner)?)
            }
            "IfStatement" => self.parse_if(children, location)?,
            "WhileStatement" => {
                let &cond = children
                    .get(1)
                    .ok_or_else(|| ParseError::syntax("could not parse while statement", location))?;
                let &body = children
                    .get(2)
                    .ok_or_else(|| ParseError::syntax("missing while body", location))?;
                Stmt::While {
                    cond: self.parse_expr(cond)?,
                    body: self.parse_body(body)?,
                }
            }
            "PassStatement" => Stmt::Pass,
            "ContinueStatement" => Stmt::Continue,
            "BreakStatement" => Stmt::Break,
            "ForStatement" => self.parse_for(children, location)?,
            _ => {
                return Err(ParseError::syntax(
                    format!("could not parse statement: {}", self.text(node)),
                    location,
                ));
            }
        };
        Ok(StmtLoc::new(location, stmt))
    }

    fn parse_if(&self, children: &[NodeId], location: Location) -> Result<Stmt, ParseError> {
        let &cond = children
            .get(1)
            .ok_or_else(|| ParseError::syntax("could not parse if statement", location))?;
        let cond = self.parse_expr(cond)?;
        let &then_node = children
            .get(2)
            .ok_or_else(|| ParseError::syntax("missing if body", location))?;
        let then_body = self.parse_body(then_node)?;
        // The else block is mandatory
        match children.get(3) {
            Some(&kw) if self.kind(kw) == "else" => {}
            _ => {
                return Err(ParseError::syntax("if statement missing else block", location));
            }
        }
        let &else_node = children
            .get(4)
            .ok_or_else(|| ParseError::syntax("if statement missing else block", location))?;
        let else_body = self.parse_body(else_node)?;
        Ok(Stmt::If {
            cond,
            then_body,
            else_body,
        })
    }

    fn parse_for(&self, children: &[NodeId], location: Location) -> Result<Stmt, ParseError> {
        // "for", name, optional "," and second name, "in", iterable, Body
        let &first = children
            .get(1)
            .ok_or_else(|| ParseError::syntax("could not parse for statement", location))?;
        let mut name = self.text(first).to_owned();
        let mut index = None;
        let mut idx = 2;
        if let Some(&comma) = children.get(idx)
            && self.kind(comma) == ","
        {
            // Two-variable enumerate-like form: the first name is the index
            let &second = children
                .get(idx + 1)
                .ok_or_else(|| ParseError::syntax("could not parse for statement", location))?;
            index = Some(name);
            name = self.text(second).to_owned();
            idx += 2;
        }
        match children.get(idx) {
            Some(&kw) if self.text(kw) == "in" => idx += 1,
            _ => return Err(ParseError::syntax("missing 'in' in for statement", location)),
        }
        let &iter_node = children
            .get(idx)
            .ok_or_else(|| ParseError::syntax("missing iterable in for statement", location))?;
        let iterable = self.parse_expr(iter_node)?;
        let &body = children
            .get(idx + 1)
            .ok_or_else(|| ParseError::syntax("missing for body", location))?;
        Ok(Stmt::For {
            name,
            index,
            iterable,
            body: self.parse_body(body)?,
        })
    }

    /// Parses a statement block (`Body` node): every child except the
    /// leading colon is a statement.
    fn parse_body(&self, node: NodeId) -> Result<Vec<StmtLoc>, ParseError> {
        let mut stmts = Vec::new();
        for &child in self.tree.children(node) {
            if self.kind(child) == ":" {
                continue;
            }
            stmts.push(self.parse_stmt(child)?);
        }
        Ok(stmts)
    }

    // ---------------------------------------------------------------------
    // type annotations
    // ---------------------------------------------------------------------

    fn parse_type(&self, node: NodeId) -> Result<Type, ParseError> {
        let location = self.location(node);
        match self.kind(node) {
            "ArrayExpression" => self.parse_bracket_type(node, location),
            "MemberExpression" => self.parse_callable_type(node, location),
            "None" => Ok(Type::None),
            "VariableName" => Ok(match self.text(node) {
                "int" => Type::Num,
                "str" => Type::Str,
                "bool" => Type::Bool,
                "None" => Type::None,
                name => Type::Class(name.to_owned()),
            }),
            _ => Err(ParseError::syntax(
                format!("could not parse type: {}", self.text(node)),
                location,
            )),
        }
    }

    /// A bracketed type is a generic container: one inner type is a list,
    /// two are a dictionary.
    fn parse_bracket_type(&self, node: NodeId, location: Location) -> Result<Type, ParseError> {
        let mut inner = Vec::new();
        for &child in self.tree.children(node) {
            if matches!(self.kind(child), "[" | "," | "]") {
                continue;
            }
            inner.push(self.parse_type(child)?);
        }
        let mut inner = inner.into_iter();
        match (inner.next(), inner.next(), inner.next()) {
            (Some(elem), None, None) => Ok(Type::List(Box::new(elem))),
            (Some(key), Some(value), None) => Ok(Type::Dict {
                key: Box::new(key),
                value: Box::new(value),
            }),
            _ => Err(ParseError::syntax("could not parse bracketed type", location)),
        }
    }

    /// `Callable[[arg, ...], ret]`: the first bracket element is the
    /// argument-type list, the second the return type (`None` when omitted).
    /// Parameters are auto-named positionally.
    fn parse_callable_type(&self, node: NodeId, location: Location) -> Result<Type, ParseError> {
        let children = self.tree.children(node);
        let &head = children
            .first()
            .ok_or_else(|| ParseError::syntax("invalid callable type", location))?;
        if self.text(head) != "Callable" {
            return Err(ParseError::syntax(
                format!("unsupported generic type {}", self.text(head)),
                location,
            ));
        }
        let args_idx = children
            .iter()
            .position(|&c| self.kind(c) == "ArrayExpression")
            .ok_or_else(|| ParseError::syntax("invalid callable type", location))?;
        let mut params = Vec::new();
        for &child in self.tree.children(children[args_idx]) {
            if matches!(self.kind(child), "[" | "," | "]") {
                continue;
            }
            if !matches!(self.kind(child), "VariableName" | "MemberExpression" | "None") {
                return Err(ParseError::syntax(
                    "invalid callable argument type",
                    self.location(child),
                ));
            }
            params.push(Parameter {
                name: format!("callable_{}", params.len()),
                typ: self.parse_type(child)?,
                default: None,
            });
        }
        let mut ret = Type::None;
        for &child in &children[args_idx + 1..] {
            match self.kind(child) {
                "," => {}
                "]" => break,
                _ => {
                    ret = self.parse_type(child)?;
                    break;
                }
            }
        }
        Ok(Type::Callable {
            params,
            ret: Box::new(ret),
        })
    }

    /// Unwraps a `TypeDef` annotation node to its type.
    fn parse_type_def(&self, node: NodeId) -> Result<Type, ParseError> {
        for &child in self.tree.children(node) {
            if matches!(self.kind(child), ":" | "->") {
                continue;
            }
            return self.parse_type(child);
        }
        Err(ParseError::syntax("invalid type annotation", self.location(node)))
    }

    // ---------------------------------------------------------------------
    // definitions
    // ---------------------------------------------------------------------

    /// Parses a parameter list, enforcing that every parameter carries a
    /// type and that defaulted parameters are not followed by non-defaulted
    /// ones.
    fn parse_parameters(&self, param_list: NodeId) -> Result<Vec<Parameter>, ParseError> {
        let children = self.tree.children(param_list);
        let mut parameters = Vec::new();
        let mut saw_default = false;
        let mut idx = 0;
        while idx < children.len() {
            let child = children[idx];
            match self.kind(child) {
                "(" | "," | ")" => {
                    idx += 1;
                    continue;
                }
                "VariableName" | "self" => {}
                other => {
                    return Err(ParseError::syntax(
                        format!("could not parse parameter {other}"),
                        self.location(child),
                    ));
                }
            }
            let name = self.text(child).to_owned();
            let location = self.location(child);
            idx += 1;
            let Some(&type_def) = children.get(idx).filter(|&&c| self.kind(c) == "TypeDef") else {
                return Err(ParseError::syntax(
                    format!("missing type annotation for parameter {name}"),
                    location,
                ));
            };
            let typ = self.parse_type_def(type_def)?;
            idx += 1;
            let mut default = None;
            if let Some(&eq) = children.get(idx)
                && self.kind(eq) == "AssignOp"
            {
                let Some(&value) = children.get(idx + 1) else {
                    return Err(ParseError::syntax(
                        format!("missing default value for parameter {name}"),
                        location,
                    ));
                };
                default = Some(self.parse_literal(value)?);
                saw_default = true;
                idx += 2;
            } else if saw_default {
                return Err(ParseError::syntax(
                    format!("expected a default value for parameter {name}"),
                    location,
                ));
            }
            parameters.push(Parameter { name, typ, default });
        }
        Ok(parameters)
    }

    /// Parses a typed variable declaration with its mandatory literal
    /// initializer.
    fn parse_var_init(&self, node: NodeId) -> Result<VarInit, ParseError> {
        let location = self.location(node);
        let &[name_node, type_def, assign_op, value_node] = self.tree.children(node) else {
            return Err(ParseError::syntax("invalid variable declaration", location));
        };
        if self.kind(type_def) != "TypeDef" || self.kind(assign_op) != "AssignOp" {
            return Err(ParseError::syntax("invalid variable declaration", location));
        }
        Ok(VarInit {
            name: self.text(name_node).to_owned(),
            typ: self.parse_type_def(type_def)?,
            value: self.parse_literal(value_node)?,
            location,
        })
    }

    /// Parses a scope declaration. Only `nonlocal` is supported.
    fn parse_scope_decl(&self, node: NodeId) -> Result<NonlocalDecl, ParseError> {
        let location = self.location(node);
        let &[keyword, name_node, ..] = self.tree.children(node) else {
            return Err(ParseError::syntax("invalid scope declaration", location));
        };
        match self.text(keyword) {
            "nonlocal" => Ok(NonlocalDecl {
                name: self.text(name_node).to_owned(),
                location,
            }),
            "global" => Err(ParseError::not_supported(
                "global declarations are not supported",
                location,
            )),
            _ => Err(ParseError::syntax("invalid scope declaration", location)),
        }
    }

    /// Parses a function definition, splitting the leading declarations
    /// (typed locals, nonlocal declarations, nested functions) from the
    /// executable body.
    fn parse_fun_def(&self, node: NodeId) -> Result<FunDef, ParseError> {
        let location = self.location(node);
        let children = self.tree.children(node);
        let &name_node = children
            .get(1)
            .ok_or_else(|| ParseError::syntax("could not parse function definition", location))?;
        let name = self.text(name_node).to_owned();
        let Some(&param_list) = children.get(2).filter(|&&c| self.kind(c) == "ParamList") else {
            return Err(ParseError::syntax(
                format!("missing parameter list of function {name}"),
                location,
            ));
        };
        let parameters = self.parse_parameters(param_list)?;
        let mut idx = 3;
        let mut ret = Type::None;
        if let Some(&type_def) = children.get(idx)
            && self.kind(type_def) == "TypeDef"
        {
            ret = self.parse_type_def(type_def)?;
            idx += 1;
        }
        let Some(&body_node) = children.get(idx).filter(|&&c| self.kind(c) == "Body") else {
            return Err(ParseError::syntax(format!("missing body of function {name}"), location));
        };

        let body_children: Vec<NodeId> = self
            .tree
            .children(body_node)
            .iter()
            .copied()
            .filter(|&c| self.kind(c) != ":")
            .collect();
        let mut inits = Vec::new();
        let mut decls = Vec::new();
        let mut funs = Vec::new();
        let mut split = body_children.len();
        for (i, &child) in body_children.iter().enumerate() {
            if self.is_var_init(child) {
                inits.push(self.parse_var_init(child)?);
            } else if self.is_scope_decl(child) {
                decls.push(self.parse_scope_decl(child)?);
            } else if self.is_fun_def(child) {
                funs.push(self.parse_fun_def(child)?);
            } else {
                split = i;
                break;
            }
        }
        let mut body = Vec::new();
        for &child in &body_children[split..] {
            body.push(self.parse_stmt(child)?);
        }
        Ok(FunDef {
            name,
            parameters,
            ret,
            inits,
            decls,
            funs,
            body,
            location,
        })
    }

    /// Parses a class definition: typed fields and methods only. Synthesizes
    /// a no-op `__init__` when the source does not define one.
    fn parse_class(&self, node: NodeId) -> Result<ClassDef, ParseError> {
        let location = self.location(node);
        let children = self.tree.children(node);
        let &name_node = children
            .get(1)
            .ok_or_else(|| ParseError::syntax("could not parse class definition", location))?;
        let name = self.text(name_node).to_owned();
        let &body_node = children
            .iter()
            .find(|&&c| self.kind(c) == "Body")
            .ok_or_else(|| ParseError::syntax(format!("missing body of class {name}"), location))?;
        let mut fields = Vec::new();
        let mut methods = Vec::new();
        for &child in self.tree.children(body_node) {
            if self.kind(child) == ":" {
                continue;
            }
            if self.is_var_init(child) {
                fields.push(self.parse_var_init(child)?);
            } else if self.is_fun_def(child) {
                methods.push(self.parse_fun_def(child)?);
            } else {
                return Err(ParseError::syntax(
                    format!("could not parse the body of class {name}"),
                    location,
                ));
            }
        }
        if !methods.iter().any(|m| m.name == "__init__") {
            methods.push(FunDef {
                name: "__init__".to_owned(),
                parameters: vec![Parameter {
                    name: "self".to_owned(),
                    typ: Type::Class(name.clone()),
                    default: None,
                }],
                ret: Type::None,
                inits: Vec::new(),
                decls: Vec::new(),
                funs: Vec::new(),
                body: Vec::new(),
                location,
            });
        }
        Ok(ClassDef {
            name,
            fields,
            methods,
            location,
        })
    }

    /// Top-level driver: partitions the script into global variable inits,
    /// function definitions, and class definitions, then parses everything
    /// remaining as the top-level statement sequence.
    fn parse_program(&self, root: NodeId) -> Result<Program, ParseError> {
        let location = self.location(root);
        if self.kind(root) != "Script" {
            return Err(ParseError::syntax(
                format!("could not parse program: unexpected root {}", self.kind(root)),
                location,
            ));
        }
        let children = self.tree.children(root);
        let mut inits = Vec::new();
        let mut funs = Vec::new();
        let mut classes = Vec::new();
        let mut split = children.len();
        for (i, &child) in children.iter().enumerate() {
            if self.is_var_init(child) {
                inits.push(self.parse_var_init(child)?);
            } else if self.is_fun_def(child) {
                funs.push(self.parse_fun_def(child)?);
            } else if self.is_class_def(child) {
                classes.push(self.parse_class(child)?);
            } else {
                split = i;
                break;
            }
        }
        let mut stmts = Vec::new();
        for &child in &children[split..] {
            stmts.push(self.parse_stmt(child)?);
        }
        Ok(Program {
            funs,
            inits,
            classes,
            stmts,
            closures: Vec::new(),
        })
    }
}

/// Errors raised while transforming the concrete syntax tree into the AST.
///
/// All variants are fatal: no recovery or resynchronization is attempted and
/// the whole compilation aborts.
#[derive(Debug, Clone)]
pub enum ParseError {
    /// Malformed or unrecognized syntax.
    Syntax { msg: Cow<'static, str>, location: Location },
    /// Syntax that is recognized but deliberately unsupported (e.g. `global`).
    NotSupported { msg: Cow<'static, str>, location: Location },
}

impl ParseError {
    fn syntax(msg: impl Into<Cow<'static, str>>, location: Location) -> Self {
        Self::Syntax {
            msg: msg.into(),
            location,
        }
    }

    fn not_supported(msg: impl Into<Cow<'static, str>>, location: Location) -> Self {
        Self::NotSupported {
            msg: msg.into(),
            location,
        }
    }

    /// The source location the error points at.
    #[must_use]
    pub fn location(&self) -> Location {
        match self {
            Self::Syntax { location, .. } | Self::NotSupported { location, .. } => *location,
        }
    }

    /// The human-readable message, without the location suffix.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Syntax { msg, .. } | Self::NotSupported { msg, .. } => msg,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message(), self.location())
    }
}

impl std::error::Error for ParseError {}
