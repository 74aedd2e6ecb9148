//! The environment: a singly-linked list of `{name, value, next}` cells
//! (spec.md §4.8), implemented as ordinary GC heap objects (see
//! [`crate::object::Value::Env`]) so the collector's existing mark pass
//! already keeps every bound value alive for free — no separate rooting
//! discipline is needed for bindings once they're linked in.
//!
//! The chain's *head* changes on every new binding, though, and the GC root
//! stack is strictly LIFO (`Gc::unroot` asserts it pops exactly what it was
//! given). Re-rooting the head on each assignment would require popping
//! whatever the evaluator pushed on top of it first — which it hasn't,
//! since the evaluator roots its own temporaries above the environment for
//! the evaluator's own duration. So the head is never rooted directly: one
//! [`crate::object::Value::EnvHandle`] cell is rooted once, for the whole
//! life of the `Env`, and assignment mutates its contents in place.

use crate::gc::Gc;
use crate::object::{value_of, ObjPtr, Value};

/// Holds the environment's handle cell, rooted for as long as this `Env`
/// lives. Mirrors spec.md §5's "the environment is rooted for the lifetime
/// of execution": construction roots the handle once, `Drop` unroots it so
/// a final collection can reclaim everything.
pub struct Env<'gc> {
  gc: &'gc Gc,
  handle: ObjPtr,
}

impl<'gc> Env<'gc> {
  /// Creates an empty environment. If `seed` is given, it is bound under
  /// `name` as the environment's first (innermost) cell — this is how the
  /// CLI's `--arg` binds the program's sole input value (spec.md §6).
  pub fn new(gc: &'gc Gc, seed: Option<(&str, ObjPtr)>) -> Self {
    let head = seed.map(|(name, value)| {
      // `value` has no other root yet; guard it across the cell allocation.
      gc.root(value);
      let cell = gc.env_cell(name.into(), value, None);
      gc.unroot(value);
      cell
    });
    // `head`, if any, is unrooted at this point; guard it across the handle
    // allocation the same way (child rooted before the parent is built).
    if let Some(h) = head {
      gc.root(h);
    }
    let handle = gc.env_handle(head);
    if let Some(h) = head {
      gc.unroot(h);
    }
    gc.root(handle);
    Env { gc, handle }
  }

  fn head(&self) -> Option<ObjPtr> {
    match value_of(self.handle) {
      Value::EnvHandle(cell) => *cell.borrow(),
      _ => unreachable!("Env::handle is not an EnvHandle cell"),
    }
  }

  fn set_head(&self, new_head: Option<ObjPtr>) {
    match value_of(self.handle) {
      Value::EnvHandle(cell) => *cell.borrow_mut() = new_head,
      _ => unreachable!("Env::handle is not an EnvHandle cell"),
    }
  }

  /// Looks up `name`, walking from the innermost binding outward. Returns
  /// the bound value, or `None` if unbound.
  pub fn lookup(&self, name: &str) -> Option<ObjPtr> {
    let mut cur = self.head();
    while let Some(cell) = cur {
      match value_of(cell) {
        Value::Env { name: cell_name, value, next } => {
          if &**cell_name == name {
            return Some(*value.borrow());
          }
          cur = *next;
        }
        _ => unreachable!("environment chain contains a non-Env cell"),
      }
    }
    None
  }

  /// Rebinds `name` to `value` if already bound anywhere in the chain,
  /// otherwise pushes a new innermost cell for it. Matches spec.md §4.8's
  /// single-scope assignment semantics: there is no shadowing, every name
  /// is globally unique for the run.
  pub fn assign(&mut self, name: &str, value: ObjPtr) {
    let head = self.head();
    let mut cur = head;
    while let Some(cell) = cur {
      match value_of(cell) {
        Value::Env { name: cell_name, value: slot, next } => {
          if &**cell_name == name {
            *slot.borrow_mut() = value;
            return;
          }
          cur = *next;
        }
        _ => unreachable!("environment chain contains a non-Env cell"),
      }
    }
    // `value` has no other root yet; guard it across the cell allocation.
    self.gc.root(value);
    let new_head = self.gc.env_cell(name.into(), value, head);
    self.gc.unroot(value);
    // The handle itself stays rooted throughout; no root-stack churn here.
    self.set_head(Some(new_head));
  }
}

impl Drop for Env<'_> {
  fn drop(&mut self) {
    self.gc.unroot(self.handle);
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::gc::Gc;

  #[test]
  fn assign_then_lookup_round_trips() {
    let gc = Gc::new();
    let mut env = Env::new(&gc, None);
    let one = gc.int_obj(1);
    env.assign("x", one);
    assert_eq!(env.lookup("x"), Some(one));
    assert_eq!(env.lookup("y"), None);
  }

  #[test]
  fn reassignment_updates_in_place_without_shadowing() {
    let gc = Gc::new();
    let mut env = Env::new(&gc, None);
    env.assign("x", gc.int_obj(1));
    env.assign("x", gc.int_obj(2));
    assert_eq!(env.lookup("x"), Some(gc.int_obj(2)));
  }

  #[test]
  fn seeded_arg_binding_is_visible_immediately() {
    let gc = Gc::new();
    let five = gc.int_obj(5);
    let env = Env::new(&gc, Some(("arg", five)));
    assert_eq!(env.lookup("arg"), Some(five));
  }

  #[test]
  fn bound_values_survive_collection() {
    let gc = Gc::new();
    let mut env = Env::new(&gc, None);
    let value = gc.list_obj(vec![]);
    env.assign("x", value);
    for _ in 0..200 {
      gc.alloc(crate::object::Value::Int(999999));
    }
    gc.collect();
    assert_eq!(env.lookup("x"), Some(value));
  }

  /// Regression test for the bug the new-binding branch of `assign` used to
  /// have: the evaluator roots its own temporary (the RHS value) *above*
  /// the environment's root before calling `assign`, so `assign` must never
  /// try to unroot/reroot the head itself — only the stable `EnvHandle` is
  /// ever pushed/popped, once, for the whole `Env` lifetime.
  #[test]
  fn new_binding_while_caller_holds_an_outer_root_does_not_panic() {
    let gc = Gc::new();
    let mut env = Env::new(&gc, Some(("arg", gc.int_obj(5))));
    let value = gc.int_obj(42);
    gc.root(value);
    env.assign("n", value);
    gc.unroot(value);
    assert_eq!(env.lookup("n"), Some(value));
  }
}
