//! Lexer, parser and normal-order evaluator for the untyped lambda calculus.

pub mod ast;
pub mod context;
pub mod eval;
pub mod lexer;
pub mod numerals;
pub mod parser;
