//! The `natrix` driver: argument parsing, configuration, and the
//! `source_load → parse → evaluate` control flow (spec.md §2, §6). Kept as
//! a library so `bin.rs` stays a thin wrapper and so integration tests can
//! drive `cli::run` directly.

pub mod cli;
pub mod config;
pub mod error;

pub use error::NatrixError;
