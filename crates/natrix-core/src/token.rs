//! Token kinds and the `{kind, start, end}` token shape (spec.md §3, §4.3).

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
  Eof,
  Error,
  Newline,
  Indent,
  Dedent,

  IntLiteral,
  StringLiteral,
  Identifier,

  // keywords
  KwIf,
  KwElse,
  KwElif,
  KwWhile,
  KwPrint,
  KwPass,

  // single-char symbols
  Plus,
  Minus,
  Star,
  Slash,
  LParen,
  RParen,
  LBracket,
  RBracket,
  Comma,
  Colon,
  Equals,

  // compound symbols
  EqEq,
  NotEq,
  Gt,
  Ge,
  Lt,
  Le,
}

impl TokenKind {
  /// `true` for tokens that are always empty spans (`start == end`).
  pub fn is_virtual(self) -> bool {
    matches!(self, TokenKind::Eof | TokenKind::Dedent)
  }
}

impl fmt::Display for TokenKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Debug::fmt(self, f)
  }
}

/// A lexed token: a half-open `start..end` byte slice into the source buffer,
/// tagged with a [`TokenKind`]. Empty tokens (`EOF`, `DEDENT`) have
/// `start == end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
  pub kind: TokenKind,
  pub start: usize,
  pub end: usize,
}

impl Token {
  pub fn new(kind: TokenKind, start: usize, end: usize) -> Self {
    Token { kind, start, end }
  }

  pub fn len(&self) -> usize {
    self.end - self.start
  }

  pub fn is_empty(&self) -> bool {
    self.start == self.end
  }

  /// The source slice this token spans.
  pub fn text<'s>(&self, source_text: &'s str) -> &'s str {
    &source_text[self.start..self.end]
  }
}
