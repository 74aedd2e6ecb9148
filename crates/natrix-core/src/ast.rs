//! Arena-owned AST node types (spec.md §3).
//!
//! The reference implementation threads statement/list-element chains
//! through a shared `next` field on each node so the whole tree can live in
//! one bump arena with no secondary allocations. Rust already gives us an
//! arena-friendly, equally zero-copy way to express an ordered child
//! sequence — `Vec<&'a Expr<'a>>` / `Vec<&'a Stmt<'a>>` — so that's what's
//! used here instead of hand-rolling the linked list; the parser still
//! allocates every leaf node through [`crate::arena::Arena`], and the
//! sequencing semantics (order, "list literal elements chain the same way
//! statements do") are unchanged. See `DESIGN.md`.

use crate::token::Token;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
  Add,
  Sub,
  Mul,
  Div,
  Eq,
  Ne,
  Lt,
  Le,
  Gt,
  Ge,
}

impl fmt::Display for BinaryOp {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      BinaryOp::Add => "+",
      BinaryOp::Sub => "-",
      BinaryOp::Mul => "*",
      BinaryOp::Div => "/",
      BinaryOp::Eq => "==",
      BinaryOp::Ne => "!=",
      BinaryOp::Lt => "<",
      BinaryOp::Le => "<=",
      BinaryOp::Gt => ">",
      BinaryOp::Ge => ">=",
    };
    f.write_str(s)
  }
}

/// A typed expression node. Leaf tokens carry their originating [`Token`] so
/// diagnostics and the evaluator can recover both source text and position.
#[derive(Debug)]
pub enum Expr<'a> {
  Int(Token),
  Str(Token),
  List { elements: Vec<&'a Expr<'a>>, token: Token },
  Name(Token),
  Binary { left: &'a Expr<'a>, op: BinaryOp, right: &'a Expr<'a>, token: Token },
  Subscript { receiver: &'a Expr<'a>, index: &'a Expr<'a>, start: usize, end: usize },
}

impl<'a> Expr<'a> {
  /// The byte span this expression covers in the source buffer.
  pub fn span(&self) -> (usize, usize) {
    match self {
      Expr::Int(t) | Expr::Str(t) | Expr::Name(t) => (t.start, t.end),
      Expr::List { token, .. } => (token.start, token.end),
      Expr::Binary { left, right, .. } => (left.span().0, right.span().1),
      Expr::Subscript { start, end, .. } => (*start, *end),
    }
  }

  /// `true` for the two lvalue-eligible expression shapes (spec.md §4.4).
  pub fn is_assignable(&self) -> bool {
    matches!(self, Expr::Name(_) | Expr::Subscript { .. })
  }
}

/// A typed statement node.
#[derive(Debug)]
pub enum Stmt<'a> {
  Expr(&'a Expr<'a>),
  Assign { lvalue: &'a Expr<'a>, rvalue: &'a Expr<'a> },
  While { cond: &'a Expr<'a>, body: Block<'a> },
  If { cond: &'a Expr<'a>, then_branch: Block<'a>, else_branch: Block<'a> },
  Pass,
  Print(&'a Expr<'a>),
}

/// An ordered sequence of statements (a `file`, or the body of a block).
pub type Block<'a> = Vec<&'a Stmt<'a>>;

/// A pretty-printer for the AST, used by the `--dump-ast` CLI flag
/// (spec.md §1: debug-dump routines are boundary tooling, not core, but are
/// still named explicitly, so they get a small home here).
pub fn dump_block(block: &Block<'_>, source_text: &str) -> String {
  let mut out = String::new();
  for stmt in block {
    dump_stmt(stmt, source_text, 0, &mut out);
  }
  out
}

fn indent(depth: usize, out: &mut String) {
  for _ in 0..depth {
    out.push_str("  ");
  }
}

fn dump_stmt(stmt: &Stmt<'_>, src: &str, depth: usize, out: &mut String) {
  indent(depth, out);
  match stmt {
    Stmt::Expr(e) => {
      out.push_str("Expr\n");
      dump_expr(e, src, depth + 1, out);
    }
    Stmt::Assign { lvalue, rvalue } => {
      out.push_str("Assign\n");
      dump_expr(lvalue, src, depth + 1, out);
      dump_expr(rvalue, src, depth + 1, out);
    }
    Stmt::While { cond, body } => {
      out.push_str("While\n");
      dump_expr(cond, src, depth + 1, out);
      for s in body {
        dump_stmt(s, src, depth + 1, out);
      }
    }
    Stmt::If { cond, then_branch, else_branch } => {
      out.push_str("If\n");
      dump_expr(cond, src, depth + 1, out);
      for s in then_branch {
        dump_stmt(s, src, depth + 1, out);
      }
      indent(depth, out);
      out.push_str("Else\n");
      for s in else_branch {
        dump_stmt(s, src, depth + 1, out);
      }
    }
    Stmt::Pass => out.push_str("Pass\n"),
    Stmt::Print(e) => {
      out.push_str("Print\n");
      dump_expr(e, src, depth + 1, out);
    }
  }
}

fn dump_expr(expr: &Expr<'_>, src: &str, depth: usize, out: &mut String) {
  indent(depth, out);
  match expr {
    Expr::Int(t) => out.push_str(&format!("Int({})\n", t.text(src))),
    Expr::Str(t) => out.push_str(&format!("Str({})\n", t.text(src))),
    Expr::Name(t) => out.push_str(&format!("Name({})\n", t.text(src))),
    Expr::List { elements, .. } => {
      out.push_str("List\n");
      for e in elements {
        dump_expr(e, src, depth + 1, out);
      }
    }
    Expr::Binary { left, op, right, .. } => {
      out.push_str(&format!("Binary({op})\n"));
      dump_expr(left, src, depth + 1, out);
      dump_expr(right, src, depth + 1, out);
    }
    Expr::Subscript { receiver, index, .. } => {
      out.push_str("Subscript\n");
      dump_expr(receiver, src, depth + 1, out);
      dump_expr(index, src, depth + 1, out);
    }
  }
}
