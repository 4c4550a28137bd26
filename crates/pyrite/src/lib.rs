#![doc = include_str!("../../../README.md")]
#![expect(clippy::cast_possible_truncation, reason = "source offsets and line numbers fit in u32")]

mod ast;
mod cst;
mod parse;
mod stack;

pub use crate::{
    ast::{
        AssignTarget, BinOp, Builtin1Fn, Builtin2Fn, ClassDef, Destructure, Expr, ExprLoc, FunDef, Literal,
        NonlocalDecl, Parameter, Program, Stmt, StmtLoc, Type, UniOp, VarInit,
    },
    cst::{NodeId, SyntaxTree, TreeBuilder},
    parse::{Location, ParseError, parse},
    stack::{MAX_CALL_DEPTH, RuntimeError, StackManager},
};
