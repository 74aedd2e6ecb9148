//! Mark-and-sweep collector (spec.md §4.6).
//!
//! `Gc` owns the heap: the intrusive singly-linked object list, the root
//! stack, and the survivor-threshold policy. spec.md frames the heap and
//! root stack as process-wide singletons; this implementation keeps them as
//! fields of an ordinary struct instead, one instance per interpreter run,
//! so that independent test cases (and, in principle, independent
//! `natrix-cli` invocations within one process) don't share mutable global
//! state. Within a single run the observable behavior — the root-stack
//! discipline, collection triggers, and threshold growth — is identical to
//! a literal process-wide singleton, so this is a transparent substitution
//! (recorded in `DESIGN.md`), not a semantic change.

use crate::object::{GcHeader, GcObject, ObjPtr, Value};
use std::cell::{Cell, RefCell};
use std::ptr::NonNull;
use tracing::trace;

/// Matches spec.md §4.6's root stack capacity.
pub const MAX_ROOTS: usize = 64;

/// spec.md §4.6: the collector first runs once 100 objects are live, and
/// doubles the threshold whenever a collection leaves at least 87.5% of it
/// occupied by survivors.
const INITIAL_THRESHOLD: usize = 100;
const SURVIVOR_NUMERATOR: usize = 7;
const SURVIVOR_DENOMINATOR: usize = 8;

pub struct Gc {
  head: Cell<Option<ObjPtr>>,
  object_count: Cell<usize>,
  threshold: Cell<usize>,
  roots: RefCell<Vec<ObjPtr>>,
  max_roots: usize,
  true_obj: ObjPtr,
  false_obj: ObjPtr,
  /// Cache for integers in `[-1, 255]`; index `n + 1`.
  small_ints: Vec<ObjPtr>,
}

impl Gc {
  pub fn new() -> Self {
    Self::with_limits(INITIAL_THRESHOLD, MAX_ROOTS)
  }

  /// Like [`Gc::new`], but with caller-chosen initial threshold and root
  /// stack depth instead of the spec defaults. Exposed so `natrix-cli`'s
  /// hidden `--gc-threshold`/`--max-gc-roots` test-harness flags can
  /// override them.
  pub fn with_limits(initial_threshold: usize, max_roots: usize) -> Self {
    let true_obj = Self::alloc_immortal(Value::Bool(true));
    let false_obj = Self::alloc_immortal(Value::Bool(false));
    let small_ints = (-1i64..=255).map(|n| Self::alloc_immortal(Value::Int(n))).collect();
    Gc {
      head: Cell::new(None),
      object_count: Cell::new(0),
      threshold: Cell::new(initial_threshold),
      roots: RefCell::new(Vec::with_capacity(max_roots)),
      max_roots,
      true_obj,
      false_obj,
      small_ints,
    }
  }

  /// Allocates an object that is never linked into the heap list and never
  /// marked or swept: the bool singletons and the small-int cache. Leaked
  /// for the process's lifetime, mirroring the spec's "statically
  /// allocated" wording for these values.
  fn alloc_immortal(value: Value) -> ObjPtr {
    let boxed = Box::new(GcObject { header: GcHeader { next: Cell::new(None), marked: Cell::new(false), is_static: true }, value });
    NonNull::from(Box::leak(boxed))
  }

  pub fn true_obj(&self) -> ObjPtr {
    self.true_obj
  }

  pub fn false_obj(&self) -> ObjPtr {
    self.false_obj
  }

  pub fn bool_obj(&self, b: bool) -> ObjPtr {
    if b {
      self.true_obj
    } else {
      self.false_obj
    }
  }

  /// Returns the cached singleton for `n` if `n` is within `[-1, 255]`,
  /// else a freshly heap-allocated (and thus collectible) int. Pointer
  /// identity is preserved across repeated creations of the same cached
  /// value, per spec.md's int-cache testable property.
  pub fn int_obj(&self, n: i64) -> ObjPtr {
    if (-1..=255).contains(&n) {
      self.small_ints[(n + 1) as usize]
    } else {
      self.alloc(Value::Int(n))
    }
  }

  pub fn str_obj(&self, s: Box<str>) -> ObjPtr {
    self.alloc(Value::Str(s))
  }

  pub fn list_obj(&self, items: Vec<ObjPtr>) -> ObjPtr {
    self.alloc(Value::List(RefCell::new(items)))
  }

  pub fn env_cell(&self, name: Box<str>, value: ObjPtr, next: Option<ObjPtr>) -> ObjPtr {
    self.alloc(Value::Env { name, value: RefCell::new(value), next })
  }

  /// Allocates the environment's single stable root cell (spec.md §4.8):
  /// [`crate::env::Env`] roots exactly one of these for its whole lifetime,
  /// mutating `head` in place as bindings are added instead of re-rooting.
  pub fn env_handle(&self, head: Option<ObjPtr>) -> ObjPtr {
    self.alloc(Value::EnvHandle(RefCell::new(head)))
  }

  /// Allocates a new collectible object, running a collection first if the
  /// live-object count has reached the threshold (spec.md §4.6 step 1).
  pub fn alloc(&self, value: Value) -> ObjPtr {
    if self.object_count.get() >= self.threshold.get() {
      self.collect();
    }
    let boxed = Box::new(GcObject {
      header: GcHeader { next: Cell::new(self.head.get()), marked: Cell::new(false), is_static: false },
      value,
    });
    let ptr = NonNull::from(Box::leak(boxed));
    self.head.set(Some(ptr));
    self.object_count.set(self.object_count.get() + 1);
    ptr
  }

  /// Pushes `ptr` onto the root stack, keeping it reachable across
  /// collections until the matching [`Gc::unroot`]. Panics if the stack is
  /// already at `MAX_ROOTS`: spec.md treats this as a host-resource
  /// exhaustion fault, and the call sites in the evaluator are structured
  /// so the live root depth never approaches the limit in practice.
  pub fn root(&self, ptr: ObjPtr) {
    let mut roots = self.roots.borrow_mut();
    assert!(roots.len() < self.max_roots, "too many GC roots (max = {})", self.max_roots);
    roots.push(ptr);
  }

  /// Pops the root stack, which must be non-empty and topped by `ptr`: the
  /// root stack is strictly LIFO, matching the evaluator's nested
  /// root/unroot call discipline.
  pub fn unroot(&self, ptr: ObjPtr) {
    let mut roots = self.roots.borrow_mut();
    let top = roots.pop().expect("unroot on empty root stack");
    assert_eq!(top, ptr, "unroot did not match the most recently rooted object");
  }

  pub fn object_count(&self) -> usize {
    self.object_count.get()
  }

  pub fn threshold(&self) -> usize {
    self.threshold.get()
  }

  /// Runs a full mark-and-sweep pass: mark from every root, then unlink and
  /// free every unmarked object, then grow the threshold if survivors are
  /// dense (spec.md §4.6 steps 2-4).
  pub fn collect(&self) {
    for root in self.roots.borrow().iter() {
      Self::mark(*root);
    }
    let freed = self.sweep();
    trace!(freed, remaining = self.object_count.get(), "gc: collection complete");

    let survivors = self.object_count.get();
    if survivors * SURVIVOR_DENOMINATOR >= self.threshold.get() * SURVIVOR_NUMERATOR {
      self.threshold.set(self.threshold.get().checked_mul(2).expect("gc threshold overflow"));
    }
  }

  fn mark(ptr: ObjPtr) {
    // SAFETY: `ptr` is either a root or reached from one through a chain of
    // live objects; the heap never frees a reachable object mid-mark.
    let obj = unsafe { ptr.as_ref() };
    if obj.header.is_static || obj.header.marked.get() {
      return;
    }
    obj.header.marked.set(true);
    match &obj.value {
      Value::List(items) => {
        for item in items.borrow().iter() {
          Self::mark(*item);
        }
      }
      Value::Env { value, next, .. } => {
        Self::mark(*value.borrow());
        if let Some(next) = next {
          Self::mark(*next);
        }
      }
      Value::EnvHandle(head) => {
        if let Some(head) = *head.borrow() {
          Self::mark(head);
        }
      }
      _ => {}
    }
  }

  /// Walks the intrusive list, unlinking and freeing every unmarked node
  /// and clearing the mark bit on every survivor. Returns the freed count.
  fn sweep(&self) -> usize {
    let mut freed = 0;
    let mut prev: Option<ObjPtr> = None;
    let mut cur = self.head.get();
    while let Some(node) = cur {
      // SAFETY: `node` is still a valid, allocated heap object: it has not
      // yet been unlinked/freed by this same sweep pass.
      let header = unsafe { &node.as_ref().header };
      let next = header.next.get();
      if header.marked.get() {
        header.marked.set(false);
        prev = Some(node);
      } else {
        match prev {
          // SAFETY: `prev`, if set, is the most recently visited surviving
          // node and is still live.
          Some(p) => unsafe { p.as_ref() }.header.next.set(next),
          None => self.head.set(next),
        }
        // SAFETY: `node` was allocated by `Gc::alloc` via `Box::leak` and
        // is now unreachable from both the root stack and every surviving
        // node, so this is the unique place it is ever freed.
        drop(unsafe { Box::from_raw(node.as_ptr()) });
        self.object_count.set(self.object_count.get() - 1);
        freed += 1;
      }
      cur = next;
    }
    freed
  }
}

impl Default for Gc {
  fn default() -> Self {
    Self::new()
  }
}

impl Drop for Gc {
  fn drop(&mut self) {
    let mut cur = self.head.get();
    while let Some(node) = cur {
      // SAFETY: every node on this heap list was leaked by `Gc::alloc` and
      // is being dropped exactly once, here, as the `Gc` itself goes away.
      let next = unsafe { node.as_ref() }.header.next.get();
      drop(unsafe { Box::from_raw(node.as_ptr()) });
      cur = next;
    }
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn small_int_cache_has_pointer_identity() {
    let gc = Gc::new();
    assert_eq!(gc.int_obj(5), gc.int_obj(5));
    assert_eq!(gc.int_obj(-1), gc.int_obj(-1));
    assert_eq!(gc.int_obj(255), gc.int_obj(255));
  }

  #[test]
  fn out_of_cache_ints_are_distinct_allocations() {
    let gc = Gc::new();
    assert_ne!(gc.int_obj(1000), gc.int_obj(1000));
  }

  #[test]
  fn bool_singletons_are_stable_and_unswept() {
    let gc = Gc::new();
    let t = gc.true_obj();
    assert_eq!(t, gc.bool_obj(true));
    for _ in 0..200 {
      gc.alloc(Value::Int(999999));
    }
    gc.collect();
    assert_eq!(t, gc.true_obj());
  }

  #[test]
  fn unreachable_objects_are_collected() {
    let gc = Gc::new();
    for _ in 0..50 {
      gc.alloc(Value::Int(1));
    }
    assert_eq!(gc.object_count(), 50);
    gc.collect();
    assert_eq!(gc.object_count(), 0);
  }

  #[test]
  fn rooted_objects_and_their_children_survive() {
    let gc = Gc::new();
    let a = gc.alloc(Value::Int(1));
    let list = gc.list_obj(vec![a]);
    gc.root(list);
    for _ in 0..50 {
      gc.alloc(Value::Int(2));
    }
    gc.collect();
    assert_eq!(gc.object_count(), 2);
    gc.unroot(list);
    gc.collect();
    assert_eq!(gc.object_count(), 0);
  }

  #[test]
  fn cyclic_list_is_collected_once_unrooted() {
    let gc = Gc::new();
    let list = gc.list_obj(vec![]);
    gc.root(list);
    if let Value::List(items) = crate::object::value_of(list) {
      items.borrow_mut().push(list);
    }
    gc.collect();
    assert_eq!(gc.object_count(), 1);
    gc.unroot(list);
    gc.collect();
    assert_eq!(gc.object_count(), 0);
  }

  #[test]
  fn threshold_doubles_once_survivors_are_dense() {
    // 90 children + the list itself = 91 live survivors, comfortably past
    // the 87.5%-of-100 threshold-doubling line, all kept alive through a
    // single root-stack entry (the root stack only holds MAX_ROOTS = 64).
    let gc = Gc::new();
    let children: Vec<ObjPtr> = (0..90).map(|_| gc.alloc(Value::Int(1))).collect();
    let list = gc.list_obj(children);
    gc.root(list);
    assert_eq!(gc.threshold(), INITIAL_THRESHOLD);
    gc.collect();
    assert_eq!(gc.threshold(), INITIAL_THRESHOLD * 2);
    gc.unroot(list);
  }
}
