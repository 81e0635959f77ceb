// Copyright (c) 2018 Fabian Schuiki

//! A configurable tokenizer and LR(1) parser generator.
//!
//! Tokens are recognized by chains of checker callbacks, one chain per
//! tokenizer state. Grammars are written as plain `LHS -> RHS...` rules and
//! compiled into action and goto tables, which `runtime::Parser` executes
//! against the token stream while a `runtime::ValueStack` computes values.

#![deny(missing_docs)]

pub use lrkit_runtime as runtime;

pub mod builder;
pub mod checkers;
pub mod first;
pub mod grammar;
pub mod input;
pub mod item_set;
pub mod lexer;
pub mod machine;
pub mod parser;
pub mod source;
pub mod token;

/// A pretty printer.
pub struct Pretty<C, T> {
    ctx: C,
    item: T,
}

impl<C, T> Pretty<C, T> {
    pub(crate) fn new(ctx: C, item: T) -> Pretty<C, T> {
        Pretty { ctx, item }
    }
}
