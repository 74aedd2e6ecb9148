//! The driver's only `Result`-shaped error type. Diagnostics and runtime
//! faults are *not* represented here: parser diagnostics go through the
//! `DiagnosticSink`, and runtime faults panic (spec.md §7). This enum
//! covers the handful of genuinely recoverable host-level failures that can
//! stop `run()` before evaluation even starts.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NatrixError {
  #[error("{0}: no such file")]
  FileNotFound(String),

  #[error("'{0}' is not a valid non-negative base-10 integer")]
  InvalidArg(String),

  #[error("parsing failed")]
  ParseFailed,
}

impl NatrixError {
  /// Exit code per spec.md §6: "Exit 0 on success; 1 if wrong argc, file
  /// unreadable, or `arg` is non-numeric." Every `NatrixError` variant maps
  /// to the same 1; there is no richer taxonomy to invent.
  pub fn exit_code(&self) -> u8 {
    1
  }
}
