//! Recursive-descent parser (spec.md §4.4).
//!
//! Stops at the first diagnostic (single-error mode): [`parse`] returns
//! `None` when any error was reported, otherwise a non-empty statement
//! chain. Expected-token mismatches report the exact message set spec.md
//! §4.4/§7 names; when the current token is itself `ERROR`, the lexer's
//! static message is substituted for whatever this parser would otherwise
//! have said.

use crate::arena::Arena;
use crate::ast::{BinaryOp, Block, Expr, Stmt};
use crate::diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink};
use crate::lexer::Lexer;
use crate::source::Source;
use crate::token::{Token, TokenKind};
use tracing::trace;

struct Parser<'a, 's, 'sink> {
  arena: &'a Arena,
  source: &'s Source,
  lexer: Lexer<'s>,
  sink: &'sink mut dyn DiagnosticSink,
  current: Token,
  had_error: bool,
}

/// Parse a complete source buffer into an arena-owned statement chain.
/// Returns `None` (having reported at least one diagnostic) on any lexical
/// or syntactic error; otherwise `Some` of a non-empty [`Block`].
pub fn parse<'a>(arena: &'a Arena, source: &Source, sink: &mut dyn DiagnosticSink) -> Option<Block<'a>> {
  parse_with_lexer(arena, source, Lexer::new(source), sink)
}

/// Like [`parse`], but with a caller-constructed [`Lexer`] (e.g. one built
/// via [`Lexer::with_max_indent_depth`]) instead of the default.
pub fn parse_with_lexer<'a, 's>(arena: &'a Arena, source: &'s Source, mut lexer: Lexer<'s>, sink: &mut dyn DiagnosticSink) -> Option<Block<'a>> {
  trace!(filename = source.filename(), "parser: start");
  let current = lexer.next_token();
  let mut parser = Parser { arena, source, lexer, sink, current, had_error: false };
  parser.parse_file()
}

impl<'a, 's, 'sink> Parser<'a, 's, 'sink> {
  fn check(&self, kind: TokenKind) -> bool {
    self.current.kind == kind
  }

  fn bump(&mut self) -> Token {
    let old = self.current;
    if !self.had_error {
      self.current = self.lexer.next_token();
    }
    old
  }

  fn report(&mut self, start: usize, end: usize, message: impl Into<String>) {
    if self.had_error {
      return;
    }
    self.had_error = true;
    self.sink.report(self.source, &Diagnostic { kind: DiagnosticKind::Error, start, end, message: message.into() });
  }

  fn report_at_current(&mut self, message: impl Into<String>) {
    let (start, end) = (self.current.start, self.current.end);
    self.report(start, end, message);
  }

  /// If the current token is a lexer `ERROR`, substitute its static message
  /// for whatever the caller would otherwise report (spec.md §4.4).
  fn check_lexer_error(&mut self) -> bool {
    if self.check(TokenKind::Error) {
      let msg = self.lexer.error_message().unwrap_or("invalid syntax");
      self.report_at_current(msg);
      true
    } else {
      false
    }
  }

  fn expect(&mut self, kind: TokenKind, message: &'static str) -> Option<Token> {
    if self.had_error {
      return None;
    }
    if self.check_lexer_error() {
      return None;
    }
    if self.check(kind) {
      Some(self.bump())
    } else {
      self.report_at_current(message);
      None
    }
  }

  fn parse_file(&mut self) -> Option<Block<'a>> {
    let mut stmts = Vec::new();
    loop {
      match self.statement() {
        Some(s) => stmts.push(s),
        None => return None,
      }
      if self.check(TokenKind::Eof) {
        break;
      }
    }
    if self.had_error {
      None
    } else {
      Some(stmts)
    }
  }

  fn statement(&mut self) -> Option<&'a Stmt<'a>> {
    if self.had_error {
      return None;
    }
    match self.current.kind {
      TokenKind::KwWhile => self.while_stmt(),
      TokenKind::KwIf => self.if_stmt(),
      _ => self.simple_stmt_line(),
    }
  }

  fn while_stmt(&mut self) -> Option<&'a Stmt<'a>> {
    self.bump();
    let cond = self.expr()?;
    self.expect(TokenKind::Colon, "expected ':'")?;
    let body = self.block()?;
    Some(self.arena.alloc(Stmt::While { cond, body }))
  }

  fn if_stmt(&mut self) -> Option<&'a Stmt<'a>> {
    self.bump();
    let cond = self.expr()?;
    self.expect(TokenKind::Colon, "expected ':'")?;
    let then_branch = self.block()?;
    let else_branch = self.elif_or_else()?;
    Some(self.arena.alloc(Stmt::If { cond, then_branch, else_branch }))
  }

  /// Parses `elif_block | else_block`, defaulting to a synthetic `pass`
  /// block when neither is present (spec.md §4.8: "the parser always
  /// supplies a non-null `else`").
  fn elif_or_else(&mut self) -> Option<Block<'a>> {
    if self.check(TokenKind::KwElif) {
      self.bump();
      let cond = self.expr()?;
      self.expect(TokenKind::Colon, "expected ':'")?;
      let then_branch = self.block()?;
      let else_branch = self.elif_or_else()?;
      let stmt = self.arena.alloc(Stmt::If { cond, then_branch, else_branch });
      Some(vec![stmt])
    } else if self.check(TokenKind::KwElse) {
      self.bump();
      self.expect(TokenKind::Colon, "expected ':'")?;
      self.block()
    } else {
      Some(vec![self.arena.alloc(Stmt::Pass)])
    }
  }

  fn block(&mut self) -> Option<Block<'a>> {
    self.expect(TokenKind::Newline, "newline expected")?;
    self.expect(TokenKind::Indent, "indent expected")?;
    let mut stmts = Vec::new();
    loop {
      stmts.push(self.statement()?);
      if self.check(TokenKind::Dedent) || self.check(TokenKind::Eof) {
        break;
      }
    }
    self.expect(TokenKind::Dedent, "indent expected")?;
    Some(stmts)
  }

  fn simple_stmt_line(&mut self) -> Option<&'a Stmt<'a>> {
    let stmt = self.simple_stmt()?;
    self.expect(TokenKind::Newline, "expected end of line")?;
    Some(stmt)
  }

  fn simple_stmt(&mut self) -> Option<&'a Stmt<'a>> {
    match self.current.kind {
      TokenKind::KwPrint => {
        self.bump();
        self.expect(TokenKind::LParen, "expected '('")?;
        let e = self.expr()?;
        self.expect(TokenKind::RParen, "expected ')'")?;
        Some(self.arena.alloc(Stmt::Print(e)))
      }
      TokenKind::KwPass => {
        self.bump();
        Some(self.arena.alloc(Stmt::Pass))
      }
      _ => {
        let lhs = self.expr()?;
        if self.check(TokenKind::Equals) {
          self.bump();
          if !lhs.is_assignable() {
            let (start, end) = lhs.span();
            self.report(start, end, "cannot assign to expression here");
            return None;
          }
          let rhs = self.expr()?;
          Some(self.arena.alloc(Stmt::Assign { lvalue: lhs, rvalue: rhs }))
        } else {
          Some(self.arena.alloc(Stmt::Expr(lhs)))
        }
      }
    }
  }

  fn expr(&mut self) -> Option<&'a Expr<'a>> {
    self.rel_expr()
  }

  fn rel_op(&self) -> Option<BinaryOp> {
    match self.current.kind {
      TokenKind::EqEq => Some(BinaryOp::Eq),
      TokenKind::NotEq => Some(BinaryOp::Ne),
      TokenKind::Gt => Some(BinaryOp::Gt),
      TokenKind::Ge => Some(BinaryOp::Ge),
      TokenKind::Lt => Some(BinaryOp::Lt),
      TokenKind::Le => Some(BinaryOp::Le),
      _ => None,
    }
  }

  /// Non-associative: `a < b < c` is a parse error, not a chained compare.
  fn rel_expr(&mut self) -> Option<&'a Expr<'a>> {
    let left = self.add_expr()?;
    if let Some(op) = self.rel_op() {
      let token = self.bump();
      let right = self.add_expr()?;
      Some(self.arena.alloc(Expr::Binary { left, op, right, token }))
    } else {
      Some(left)
    }
  }

  fn add_expr(&mut self) -> Option<&'a Expr<'a>> {
    let mut left = self.mul_expr()?;
    loop {
      let op = match self.current.kind {
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Sub,
        _ => break,
      };
      let token = self.bump();
      let right = self.mul_expr()?;
      left = self.arena.alloc(Expr::Binary { left, op, right, token });
    }
    Some(left)
  }

  fn mul_expr(&mut self) -> Option<&'a Expr<'a>> {
    let mut left = self.postfix_expr()?;
    loop {
      let op = match self.current.kind {
        TokenKind::Star => BinaryOp::Mul,
        TokenKind::Slash => BinaryOp::Div,
        _ => break,
      };
      let token = self.bump();
      let right = self.postfix_expr()?;
      left = self.arena.alloc(Expr::Binary { left, op, right, token });
    }
    Some(left)
  }

  fn postfix_expr(&mut self) -> Option<&'a Expr<'a>> {
    let mut e = self.primary()?;
    while self.check(TokenKind::LBracket) {
      let start = e.span().0;
      self.bump();
      let index = self.expr()?;
      let end_tok = self.expect(TokenKind::RBracket, "expected closing bracket")?;
      e = self.arena.alloc(Expr::Subscript { receiver: e, index, start, end: end_tok.end });
    }
    Some(e)
  }

  fn primary(&mut self) -> Option<&'a Expr<'a>> {
    if self.check_lexer_error() {
      return None;
    }
    match self.current.kind {
      TokenKind::IntLiteral => {
        let t = self.bump();
        Some(self.arena.alloc(Expr::Int(t)))
      }
      TokenKind::StringLiteral => {
        let t = self.bump();
        Some(self.arena.alloc(Expr::Str(t)))
      }
      TokenKind::Identifier => {
        let t = self.bump();
        Some(self.arena.alloc(Expr::Name(t)))
      }
      TokenKind::LParen => {
        self.bump();
        let e = self.expr()?;
        self.expect(TokenKind::RParen, "expected closing parenthesis")?;
        Some(e)
      }
      TokenKind::LBracket => {
        let open = self.bump();
        let mut elements = Vec::new();
        if !self.check(TokenKind::RBracket) {
          loop {
            elements.push(self.expr()?);
            if self.check(TokenKind::Comma) {
              self.bump();
              if self.check(TokenKind::RBracket) {
                break;
              }
            } else {
              break;
            }
          }
        }
        let close = self.expect(TokenKind::RBracket, "expected closing bracket")?;
        Some(self.arena.alloc(Expr::List { elements, token: Token::new(open.kind, open.start, close.end) }))
      }
      _ => {
        self.report_at_current("expected expression");
        None
      }
    }
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::diagnostics::VecSink;

  fn parse_src<'a>(arena: &'a Arena, source: &Source) -> (Option<Block<'a>>, VecSink) {
    let mut sink = VecSink::default();
    let ast = parse(arena, source, &mut sink);
    (ast, sink)
  }

  #[test]
  fn golden_binary_precedence() {
    let arena = Arena::new();
    let source = Source::load_string("t.nx", "(10 - 3) * 6\n1\n");
    let (ast, sink) = parse_src(&arena, &source);
    assert!(sink.diagnostics.is_empty());
    let block = ast.expect("parses");
    assert_eq!(block.len(), 2);
    match block[0] {
      Stmt::Expr(Expr::Binary { op: BinaryOp::Mul, left, right, .. }) => {
        match left {
          Expr::Binary { op: BinaryOp::Sub, .. } => {}
          other => panic!("expected SUB on the left, got {other:?}"),
        }
        match right {
          Expr::Int(_) => {}
          other => panic!("expected INT on the right, got {other:?}"),
        }
      }
      other => panic!("expected Expr(Binary(MUL, ..)), got {other:?}"),
    }
    match block[1] {
      Stmt::Expr(Expr::Int(_)) => {}
      other => panic!("expected a bare literal statement, got {other:?}"),
    }
  }

  #[test]
  fn comment_absorbed_newline_span() {
    let arena = Arena::new();
    let source = Source::load_string("t.nx", "x = 1\n(10 - 3   # comment\n");
    let mut sink = VecSink::default();
    let ast = parse(&arena, &source, &mut sink);
    assert!(ast.is_none());
    assert_eq!(sink.diagnostics.len(), 1);
    let diag = &sink.diagnostics[0];
    assert_eq!(diag.message, "expected closing parenthesis");
    assert_eq!(diag.line(&source), 2);
    assert_eq!(diag.col(&source), 11);
    assert_eq!(diag.end - diag.start, 10);
  }

  #[test]
  fn chained_comparisons_are_non_associative() {
    let arena = Arena::new();
    let source = Source::load_string("t.nx", "a = 1\nb = 2\nc = 3\na < b < c\n");
    let (ast, sink) = parse_src(&arena, &source);
    assert!(ast.is_none());
    assert!(sink.has_errors());
  }

  #[test]
  fn invalid_assignment_target_reports_exact_message() {
    let arena = Arena::new();
    let source = Source::load_string("t.nx", "1 + 1 = 2\n");
    let (ast, sink) = parse_src(&arena, &source);
    assert!(ast.is_none());
    assert_eq!(sink.diagnostics[0].message, "cannot assign to expression here");
  }

  #[test]
  fn if_without_else_gets_synthetic_pass() {
    let arena = Arena::new();
    let source = Source::load_string("t.nx", "if 1:\n  pass\n");
    let (ast, sink) = parse_src(&arena, &source);
    assert!(sink.diagnostics.is_empty());
    let block = ast.unwrap();
    match block[0] {
      Stmt::If { else_branch, .. } => {
        assert_eq!(else_branch.len(), 1);
        assert!(matches!(else_branch[0], Stmt::Pass));
      }
      other => panic!("expected If, got {other:?}"),
    }
  }

  #[test]
  fn list_literal_with_trailing_comma() {
    let arena = Arena::new();
    let source = Source::load_string("t.nx", "a = [1, 2, 3,]\n");
    let (ast, sink) = parse_src(&arena, &source);
    assert!(sink.diagnostics.is_empty());
    let block = ast.unwrap();
    match block[0] {
      Stmt::Assign { rvalue: Expr::List { elements, .. }, .. } => assert_eq!(elements.len(), 3),
      other => panic!("expected Assign(List), got {other:?}"),
    }
  }
}
