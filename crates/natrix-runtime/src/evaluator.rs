//! The statement executor and expression evaluator (spec.md §4.8).
//!
//! Every panic message here is one of spec.md §7's exact runtime-fault
//! strings. Rust's own panic machinery already prints a `file:line:column`
//! tag ahead of the message and aborts the process with a non-zero status,
//! which is exactly the "single formatted line... followed by process
//! termination" contract §7 asks for — there is no separate formatter to
//! write. Runtime faults are deliberately not `Result`s: per spec.md §7
//! they are "intentionally non-catchable in this language".

use crate::env::Env;
use crate::gc::Gc;
use crate::object::{self, ObjPtr, Value};
use natrix_core::ast::{BinaryOp, Block, Expr, Stmt};
use std::io::Write;

pub struct Evaluator<'gc, 'out> {
  gc: &'gc Gc,
  source_text: &'gc str,
  env: Env<'gc>,
  stdout: &'out mut dyn Write,
}

impl<'gc, 'out> Evaluator<'gc, 'out> {
  /// `arg` seeds the `arg` binding (spec.md §4.8 / §6).
  pub fn new(gc: &'gc Gc, source_text: &'gc str, arg: i64, stdout: &'out mut dyn Write) -> Self {
    let arg_obj = gc.int_obj(arg);
    Evaluator { gc, source_text, env: Env::new(gc, Some(("arg", arg_obj))), stdout }
  }

  pub fn run(&mut self, program: &Block<'_>) {
    for stmt in program {
      self.exec_stmt(stmt);
    }
  }

  fn exec_stmt(&mut self, stmt: &Stmt<'_>) {
    match stmt {
      Stmt::Expr(e) => {
        self.eval(e);
      }
      Stmt::Assign { lvalue, rvalue } => self.exec_assign(lvalue, rvalue),
      Stmt::While { cond, body } => self.exec_while(cond, body),
      Stmt::If { cond, then_branch, else_branch } => self.exec_if(cond, then_branch, else_branch),
      Stmt::Pass => {}
      Stmt::Print(e) => self.exec_print(e),
    }
  }

  fn exec_assign(&mut self, lvalue: &Expr<'_>, rvalue: &Expr<'_>) {
    match lvalue {
      Expr::Name(tok) => {
        let value = self.eval(rvalue);
        // `env.assign` may allocate a new binding cell, which can trigger a
        // collection; `value` has no other root until it's linked in.
        self.gc.root(value);
        self.env.assign(tok.text(self.source_text), value);
        self.gc.unroot(value);
      }
      Expr::Subscript { receiver, index, .. } => {
        let receiver_obj = self.eval(receiver);
        self.gc.root(receiver_obj);
        let index_obj = self.eval(index);
        self.gc.root(index_obj);
        let value = self.eval(rvalue);
        match object::value_of(receiver_obj) {
          Value::List(_) => object::set_element(receiver_obj, index_obj, value),
          _ => panic!("Subscripted value must be a list"),
        }
        self.gc.unroot(index_obj);
        self.gc.unroot(receiver_obj);
      }
      _ => unreachable!("the parser only ever builds Name/Subscript lvalues"),
    }
  }

  fn exec_while(&mut self, cond: &Expr<'_>, body: &Block<'_>) {
    while self.eval_condition(cond) {
      for stmt in body {
        self.exec_stmt(stmt);
      }
    }
  }

  fn exec_if(&mut self, cond: &Expr<'_>, then_branch: &Block<'_>, else_branch: &Block<'_>) {
    let branch = if self.eval_condition(cond) { then_branch } else { else_branch };
    for stmt in branch {
      self.exec_stmt(stmt);
    }
  }

  /// A condition must be an `int`; truthiness is "nonzero" (spec.md §4.8).
  fn eval_condition(&mut self, cond: &Expr<'_>) -> bool {
    let obj = self.eval(cond);
    match object::value_of(obj) {
      Value::Int(n) => *n != 0,
      _ => panic!("Condition must be an integer"),
    }
  }

  fn exec_print(&mut self, expr: &Expr<'_>) {
    let obj = self.eval(expr);
    match object::value_of(obj) {
      Value::Int(n) => writeln!(self.stdout, "{n}").expect("write to stdout"),
      Value::Str(s) => writeln!(self.stdout, "{s}").expect("write to stdout"),
      other => panic!("cannot print '{}' object", object::type_name(other)),
    }
  }

  fn eval(&mut self, expr: &Expr<'_>) -> ObjPtr {
    match expr {
      Expr::Int(tok) => self.eval_int_literal(tok.text(self.source_text)),
      Expr::Str(tok) => self.eval_str_literal(tok.text(self.source_text)),
      Expr::List { elements, .. } => self.eval_list_literal(elements),
      Expr::Name(tok) => self.eval_name(tok.text(self.source_text)),
      Expr::Binary { left, op, right, .. } => self.eval_binary(left, *op, right),
      Expr::Subscript { receiver, index, .. } => self.eval_subscript(receiver, index),
    }
  }

  fn eval_int_literal(&self, text: &str) -> ObjPtr {
    let n: i64 = text.parse().unwrap_or_else(|_| panic!("Integer literal too large"));
    self.gc.int_obj(n)
  }

  /// The token text includes the surrounding quotes (spec.md §3); strip them.
  fn eval_str_literal(&self, text: &str) -> ObjPtr {
    let inner = &text[1..text.len() - 1];
    self.gc.str_obj(inner.into())
  }

  fn eval_list_literal(&mut self, elements: &[&Expr<'_>]) -> ObjPtr {
    let list = self.gc.list_obj(Vec::with_capacity(elements.len()));
    self.gc.root(list);
    for element in elements {
      let value = self.eval(element);
      if let Value::List(items) = object::value_of(list) {
        items.borrow_mut().push(value);
      }
    }
    self.gc.unroot(list);
    list
  }

  fn eval_name(&self, name: &str) -> ObjPtr {
    self.env.lookup(name).unwrap_or_else(|| panic!("Undefined variable: {name}"))
  }

  fn eval_binary(&mut self, left: &Expr<'_>, op: BinaryOp, right: &Expr<'_>) -> ObjPtr {
    let lhs = self.eval(left);
    self.gc.root(lhs);
    let rhs = self.eval(right);
    self.gc.unroot(lhs);

    match (object::value_of(lhs), object::value_of(rhs)) {
      (Value::Int(a), Value::Int(b)) => self.gc.int_obj(apply_int_op(op, *a, *b)),
      (Value::Str(a), Value::Str(b)) if op == BinaryOp::Add => {
        let mut s = String::with_capacity(a.len() + b.len());
        s.push_str(a);
        s.push_str(b);
        self.gc.str_obj(s.into_boxed_str())
      }
      _ => panic!("Operands must be integers"),
    }
  }

  fn eval_subscript(&mut self, receiver: &Expr<'_>, index: &Expr<'_>) -> ObjPtr {
    let receiver_obj = self.eval(receiver);
    self.gc.root(receiver_obj);
    let index_obj = self.eval(index);
    let result = match object::value_of(receiver_obj) {
      Value::List(items) => {
        let items = items.borrow();
        let i = object::check_index(index_obj, items.len());
        items[i]
      }
      _ => panic!("Subscripted value must be a list"),
    };
    self.gc.unroot(receiver_obj);
    result
  }
}

/// Two's-complement wraparound arithmetic and int-vs-int comparisons
/// (spec.md's Non-goals explicitly keep overflow out of scope beyond
/// wraparound; relational ops produce `bool`).
fn apply_int_op(op: BinaryOp, a: i64, b: i64) -> i64 {
  match op {
    BinaryOp::Add => a.wrapping_add(b),
    BinaryOp::Sub => a.wrapping_sub(b),
    BinaryOp::Mul => a.wrapping_mul(b),
    BinaryOp::Div => {
      if b == 0 {
        panic!("Division by zero");
      }
      a.wrapping_div(b)
    }
    BinaryOp::Eq => (a == b) as i64,
    BinaryOp::Ne => (a != b) as i64,
    BinaryOp::Lt => (a < b) as i64,
    BinaryOp::Le => (a <= b) as i64,
    BinaryOp::Gt => (a > b) as i64,
    BinaryOp::Ge => (a >= b) as i64,
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use natrix_core::arena::Arena;
  use natrix_core::diagnostics::VecSink;
  use natrix_core::parser::parse;
  use natrix_core::source::Source;

  fn run_program(text: &str, arg: i64) -> String {
    let source = Source::load_string("t.nx", text);
    let arena = Arena::new();
    let mut sink = VecSink::default();
    let program = parse(&arena, &source, &mut sink).expect("program should parse");
    let gc = Gc::new();
    let mut out = Vec::new();
    let mut eval = Evaluator::new(&gc, source.text(), arg, &mut out);
    eval.run(&program);
    String::from_utf8(out).unwrap()
  }

  #[test]
  fn factorial_of_five_is_120() {
    let text = "n = arg\nfact = 1\nwhile n > 0:\n  fact = fact * n\n  n = n - 1\nprint(fact)\n";
    assert_eq!(run_program(text, 5), "120\n");
  }

  #[test]
  fn list_mutation_concatenates_strings() {
    let text = "a = [\"Hello\", \"world!\"]\na[0] = \"Goodbye\"\nprint(a[0] + \" \" + a[1])\n";
    assert_eq!(run_program(text, 0), "Goodbye world!\n");
  }

  #[test]
  fn arg_defaults_are_visible_as_int() {
    assert_eq!(run_program("print(arg)\n", 42), "42\n");
  }

  #[test]
  #[should_panic(expected = "Division by zero")]
  fn division_by_zero_panics() {
    run_program("print(1 / 0)\n", 0);
  }

  #[test]
  #[should_panic(expected = "Undefined variable: missing")]
  fn undefined_variable_panics() {
    run_program("print(missing)\n", 0);
  }

  #[test]
  #[should_panic(expected = "Operands must be integers")]
  fn mixed_operand_types_panic() {
    run_program("print(1 + \"a\")\n", 0);
  }

  #[test]
  fn gc_cycle_is_collected_once_unrooted() {
    let gc = Gc::new();
    let a = gc.list_obj(vec![]);
    gc.root(a);
    let b = gc.list_obj(vec![a]);
    if let Value::List(items) = object::value_of(a) {
      items.borrow_mut().push(b);
    }
    gc.collect();
    assert_eq!(gc.object_count(), 2);
    gc.unroot(a);
    gc.collect();
    assert_eq!(gc.object_count(), 0);
  }
}
