//! Tests of the fatal diagnostics the AST builders raise on malformed input.

mod support;

use pretty_assertions::assert_eq;
use pyrite::{ParseError, Program};
use support::{Sketch, expr_program};

fn err_message(result: Result<Program, ParseError>) -> String {
    match result {
        Err(e) => e.message().to_owned(),
        Ok(program) => panic!("expected a parse error, got {program:?}"),
    }
}

#[test]
fn if_without_else_is_rejected() {
    let mut s = Sketch::new();
    s.node("Script")
        .node("IfStatement")
        .tok("if")
        .ws(" ")
        .leaf("Boolean", "True")
        .node("Body")
        .tok(":")
        .ws("\n    ")
        .node("PassStatement")
        .tok("pass")
        .end()
        .end()
        .end()
        .end();
    assert_eq!(err_message(s.parse()), "if statement missing else block");
}

#[test]
fn unknown_binary_operator() {
    let result = expr_program(|s| {
        s.node("BinaryExpression")
            .leaf("Number", "1")
            .ws(" ")
            .leaf("ArithOp", "@")
            .ws(" ")
            .leaf("Number", "2")
            .end();
    });
    assert_eq!(err_message(result), "could not parse operator @");
}

/// `*x = y` is illegal: a lone starred target needs a trailing comma.
#[test]
fn bare_starred_target_is_rejected() {
    let mut s = Sketch::new();
    s.node("Script")
        .node("AssignStatement")
        .tok("*")
        .leaf("VariableName", "x")
        .ws(" ")
        .leaf("AssignOp", "=")
        .ws(" ")
        .leaf("VariableName", "y")
        .end()
        .end();
    assert_eq!(
        err_message(s.parse()),
        "starred assignment target must be in a list or tuple"
    );
}

#[test]
fn multiple_starred_targets_are_rejected() {
    let mut s = Sketch::new();
    s.node("Script")
        .node("AssignStatement")
        .tok("*")
        .leaf("VariableName", "x")
        .tok(",")
        .ws(" ")
        .tok("*")
        .leaf("VariableName", "y")
        .ws(" ")
        .leaf("AssignOp", "=")
        .ws(" ")
        .leaf("VariableName", "z")
        .end()
        .end();
    assert_eq!(
        err_message(s.parse()),
        "cannot have multiple starred targets in assignment"
    );
}

#[test]
fn assignment_to_literal_is_rejected() {
    let mut s = Sketch::new();
    s.node("Script")
        .node("AssignStatement")
        .leaf("Number", "1")
        .ws(" ")
        .leaf("AssignOp", "=")
        .ws(" ")
        .leaf("Number", "2")
        .end()
        .end();
    assert_eq!(err_message(s.parse()), "cannot assign to 1");
}

#[test]
fn parameter_without_type_annotation() {
    let mut s = Sketch::new();
    s.node("Script")
        .node("FunctionDefinition")
        .tok("def")
        .ws(" ")
        .leaf("VariableName", "f")
        .node("ParamList")
        .tok("(")
        .leaf("VariableName", "a")
        .tok(")")
        .end()
        .node("Body")
        .tok(":")
        .ws("\n    ")
        .node("PassStatement")
        .tok("pass")
        .end()
        .end()
        .end()
        .end();
    assert_eq!(err_message(s.parse()), "missing type annotation for parameter a");
}

/// Once one parameter has a default, all following parameters need one.
#[test]
fn default_parameters_must_trail() {
    let mut s = Sketch::new();
    s.node("Script")
        .node("FunctionDefinition")
        .tok("def")
        .ws(" ")
        .leaf("VariableName", "f")
        .node("ParamList")
        .tok("(")
        .leaf("VariableName", "a")
        .node("TypeDef")
        .tok(":")
        .ws(" ")
        .leaf("VariableName", "int")
        .end()
        .leaf("AssignOp", "=")
        .leaf("Number", "1")
        .tok(",")
        .ws(" ")
        .leaf("VariableName", "b")
        .node("TypeDef")
        .tok(":")
        .ws(" ")
        .leaf("VariableName", "int")
        .end()
        .tok(")")
        .end()
        .node("Body")
        .tok(":")
        .ws("\n    ")
        .node("PassStatement")
        .tok("pass")
        .end()
        .end()
        .end()
        .end();
    assert_eq!(err_message(s.parse()), "expected a default value for parameter b");
}

/// `global` declarations are recognized but deliberately unsupported.
#[test]
fn global_declaration_is_not_supported() {
    let mut s = Sketch::new();
    s.node("Script")
        .node("FunctionDefinition")
        .tok("def")
        .ws(" ")
        .leaf("VariableName", "f")
        .node("ParamList")
        .tok("(")
        .tok(")")
        .end()
        .node("Body")
        .tok(":")
        .ws("\n    ")
        .node("ScopeStatement")
        .tok("global")
        .ws(" ")
        .leaf("VariableName", "x")
        .end()
        .ws("\n    ")
        .node("PassStatement")
        .tok("pass")
        .end()
        .end()
        .end()
        .end();
    let err = s.parse().unwrap_err();
    assert!(matches!(err, ParseError::NotSupported { .. }), "got {err:?}");
    assert_eq!(err.message(), "global declarations are not supported");
}

#[test]
fn empty_brackets_are_rejected() {
    let result = expr_program(|s| {
        s.node("MemberExpression")
            .leaf("VariableName", "a")
            .tok("[")
            .tok("]")
            .end();
    });
    assert_eq!(err_message(result), "need a value inside the brackets");
}

#[test]
fn too_many_slice_components() {
    let result = expr_program(|s| {
        s.node("MemberExpression")
            .leaf("VariableName", "a")
            .tok("[")
            .leaf("Number", "1")
            .tok(":")
            .leaf("Number", "2")
            .tok(":")
            .leaf("Number", "3")
            .tok(":")
            .leaf("Number", "4")
            .tok("]")
            .end();
    });
    assert_eq!(err_message(result), "too many slice components inside brackets");
}

/// Class bodies may contain only typed fields and method definitions.
#[test]
fn class_body_rejects_plain_statements() {
    let mut s = Sketch::new();
    s.node("Script")
        .node("ClassDefinition")
        .tok("class")
        .ws(" ")
        .leaf("VariableName", "C")
        .node("Body")
        .tok(":")
        .ws("\n    ")
        .node("PassStatement")
        .tok("pass")
        .end()
        .end()
        .end()
        .end();
    assert_eq!(err_message(s.parse()), "could not parse the body of class C");
}

#[test]
fn unary_builtin_arity_is_checked() {
    let result = expr_program(|s| {
        s.node("CallExpression")
            .leaf("VariableName", "print")
            .node("ArgList")
            .tok("(")
            .leaf("Number", "1")
            .tok(",")
            .ws(" ")
            .leaf("Number", "2")
            .tok(")")
            .end()
            .end();
    });
    assert_eq!(err_message(result), "print() takes exactly 1 argument");
}

#[test]
fn binary_builtin_arity_is_checked() {
    let result = expr_program(|s| {
        s.node("CallExpression")
            .leaf("VariableName", "max")
            .node("ArgList")
            .tok("(")
            .leaf("Number", "1")
            .tok(")")
            .end()
            .end();
    });
    assert_eq!(err_message(result), "max() takes exactly 2 arguments");
}

/// Typed variable declarations are only legal in the leading declaration
/// section, never after an executable statement.
#[test]
fn late_variable_declaration_is_rejected() {
    let mut s = Sketch::new();
    s.node("Script");
    s.node("ExpressionStatement").leaf("VariableName", "x").end().ws("\n");
    s.node("AssignStatement")
        .leaf("VariableName", "y")
        .node("TypeDef")
        .tok(":")
        .ws(" ")
        .leaf("VariableName", "int")
        .end()
        .ws(" ")
        .leaf("AssignOp", "=")
        .ws(" ")
        .leaf("Number", "1")
        .end();
    s.end();
    assert_eq!(
        err_message(s.parse()),
        "variable declarations must come before statements"
    );
}

#[test]
fn dict_entry_without_value() {
    let result = expr_program(|s| {
        s.node("DictionaryExpression")
            .tok("{")
            .leaf("Number", "1")
            .tok("}")
            .end();
    });
    assert_eq!(err_message(result), "dictionary entry is missing a value");
}

/// Errors render their message together with the 1-based source position.
#[test]
fn error_display_includes_location() {
    let mut s = Sketch::new();
    s.node("Script").node("ExpressionStatement");
    s.ws("\n");
    s.node("MemberExpression")
        .leaf("VariableName", "a")
        .tok("[")
        .tok("]")
        .end();
    s.end().end();
    let err = s.parse().unwrap_err();
    assert_eq!(
        err.to_string(),
        "need a value inside the brackets (line 2, column 1)"
    );
}
