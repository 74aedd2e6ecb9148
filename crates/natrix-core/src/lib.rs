//! natrix-core: source loading, the indentation-sensitive lexer, the
//! recursive-descent parser, and the arena-owned AST they build into.
//!
//! This crate is the front end only — no heap values, no evaluation. See
//! `natrix-runtime` for the GC, object model, and evaluator built on top of
//! the [`ast`] types re-exported here.

pub mod arena;
pub mod ast;
pub mod diagnostics;
pub mod lexer;
pub mod parser;
pub mod source;
pub mod token;

pub use arena::Arena;
pub use ast::{Block, Expr, Stmt};
pub use diagnostics::{Diagnostic, DiagnosticSink};
pub use parser::{parse, parse_with_lexer};
pub use source::Source;
pub use token::{Token, TokenKind};
