//! # Introduction
//!
//! memscan attaches to a running process, walks its mapped memory, and lets
//! you search, filter, peek and poke typed values at arbitrary addresses.
//! Searches are driven by a C-like expression language: `search value == 42`
//! records every aligned address whose bytes read 42, and
//! `filter value == value - 1` narrows the list against live memory.
//!
//! ## Pipeline
//!
//! ```text
//! input line -> Lexer -> Parser -> typed AST -> constant folding
//!                                                    |
//!                     MemoryTarget <- evaluate, once per candidate address
//! ```
//!
//! 1. [`expr`] — the expression engine: lexer, parser, typed AST,
//!    evaluator, and the constant-folding optimiser.
//! 2. [`value`] — tagged scalars with C-style conversion and promotion
//!    rules; the operation kernels everything evaluates through.
//! 3. [`symbol`] — name bindings (`addr`, `value`) backed by shared slots.
//! 4. [`target`] — the [`target::MemoryTarget`] capability plus the Linux
//!    `/proc` process target and an in-process buffer target.
//! 5. [`scan`] — compiles an expression into a predicate and drives it
//!    across every readable region; hit lists and filtering.
//! 6. [`session`] / [`commands`] — interactive state and the command set.
//! 7. [`ui`] — ratatui front end; not part of the stable library API.
//!
//! ## Expression language
//!
//! Fixed-width scalars `s8 u8 s16 u16 s32 u32 s64 u64 f32 f64`, C operator
//! precedence, casts `(u16)x` and `(u16*)x`, pointer dereference
//! `*(s32*)addr`, and C's usual arithmetic conversions. Comparisons yield
//! `s32` 0 or 1, so predicates compose with `&&`, `||` and the bitwise
//! operators.

pub mod commands;
pub mod config;
pub mod expr;
pub mod scan;
pub mod session;
pub mod symbol;
pub mod target;
pub mod ui;
pub mod value;
