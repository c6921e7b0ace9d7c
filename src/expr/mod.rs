//! The typed expression engine
//!
//! This is the part of the tool that every command runs through: `search`,
//! `filter`, `eval`, `poke` and `explain` all compile a C-like expression
//! once and evaluate it one or many times.
//!
//! ```text
//! input line -> [lexer] -> tokens -> [parser] -> typed AST -> [opt] -> AST
//!                                                                 |
//!                                              [eval] <- per-address values
//! ```
//!
//! - [`lexer`]: restartable tokenizer with typed literal payloads
//! - [`parser`]: 13-level recursive descent producing a typed [`ast::Expr`]
//! - [`ast`]: the node types and the Reverse-Polish diagnostic printer
//! - [`eval`]: recursive evaluator, dereferencing through a
//!   [`crate::target::MemoryTarget`]
//! - [`opt`]: constant folding over `Var`/`Deref`-free subtrees

pub mod ast;
pub mod eval;
pub mod lexer;
pub mod opt;
pub mod parser;

pub use ast::Expr;
pub use parser::{parse_expression, ParseError};
