//! Position-aware diagnostic reporting with a pluggable sink (spec.md §4.5).

use crate::source::Source;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
  Error,
  Warning,
}

impl fmt::Display for DiagnosticKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      DiagnosticKind::Error => write!(f, "error"),
      DiagnosticKind::Warning => write!(f, "warning"),
    }
  }
}

/// A single reported diagnostic, carrying everything a sink needs to render
/// it (or store it structurally, as the test sink does).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
  pub kind: DiagnosticKind,
  pub start: usize,
  pub end: usize,
  pub message: String,
}

impl Diagnostic {
  pub fn line(&self, source: &Source) -> usize {
    source.line_number(self.start)
  }

  pub fn col(&self, source: &Source) -> usize {
    self.start - source.line_start(self.line(source)) + 1
  }
}

/// A sink for diagnostics. The default handler (see [`StderrSink`]) prints
/// `filename:line:col: kind: message`, the offending source line, and a
/// caret strip; tests substitute a structural sink instead.
pub trait DiagnosticSink {
  fn report(&mut self, source: &Source, diag: &Diagnostic);
}

/// The default sink: prints to stderr in the format spec.md §6 mandates.
#[derive(Debug, Default)]
pub struct StderrSink;

impl DiagnosticSink for StderrSink {
  fn report(&mut self, source: &Source, diag: &Diagnostic) {
    eprint!("{}", render(source, diag));
  }
}

/// Renders a diagnostic exactly as `StderrSink` would, without writing it
/// anywhere — used by `StderrSink` itself and by tests that want the text.
pub fn render(source: &Source, diag: &Diagnostic) -> String {
  let line = diag.line(source);
  let col = diag.col(source);
  let width = (diag.end.saturating_sub(diag.start)).max(1);
  let src_line = source.line_text(line);
  let mut caret = String::with_capacity(col + width);
  for _ in 1..col {
    caret.push(' ');
  }
  for _ in 0..width {
    caret.push('^');
  }
  format!("{}:{}:{}: {}: {}\n{}\n{}\n", source.filename(), line, col, diag.kind, diag.message, src_line, caret)
}

/// A sink that collects diagnostics in memory, used by tests.
#[derive(Debug, Default)]
pub struct VecSink {
  pub diagnostics: Vec<Diagnostic>,
}

impl DiagnosticSink for VecSink {
  fn report(&mut self, _source: &Source, diag: &Diagnostic) {
    self.diagnostics.push(diag.clone());
  }
}

impl VecSink {
  pub fn has_errors(&self) -> bool {
    self.diagnostics.iter().any(|d| d.kind == DiagnosticKind::Error)
  }
}
