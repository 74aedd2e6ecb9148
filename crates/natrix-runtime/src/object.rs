//! The natrix value model: heap object variants and the per-type operation
//! set spec.md §4.7 describes as a v-table. spec.md §9 explicitly licenses
//! replacing that v-table with "an algebraic value type; all dispatches...
//! become match arms" provided the missing-slot panic contract survives —
//! that's what [`Value`] and the functions below do. `object_array` is
//! folded directly into `List`'s backing `Vec` rather than kept as its own
//! traced heap object: a growable array is exactly what `Vec` already is,
//! so giving it a second GC-object identity would just be re-deriving `Vec`
//! under another name (see `DESIGN.md`).

use std::cell::RefCell;
use std::fmt;
use std::ptr::NonNull;

/// Every heap value. `Bool` and the cached `Int`s in `[-1, 255]` are never
/// reached through [`Value::List`]'s child slots as anything but shared,
/// immortal singletons — see [`crate::gc::Gc`].
pub enum Value {
  Int(i64),
  Bool(bool),
  Str(Box<str>),
  List(RefCell<Vec<ObjPtr>>),
  /// A self-typed meta-object; `Type("list")` etc. Not reachable from
  /// ordinary language values today (no introspection operator is defined),
  /// but kept as a first-class variant since spec.md's object model names it.
  Type(&'static str),
  /// One cell of the environment's singly-linked binding list (spec.md
  /// §4.8): a name, its current value, and the next (outer) cell. These are
  /// ordinary GC heap objects like everything else, so the environment
  /// stays reachable — and its bound values stay alive — for as long as its
  /// head cell is rooted. See [`crate::env`].
  Env { name: Box<str>, value: RefCell<ObjPtr>, next: Option<ObjPtr> },
  /// The environment's single stable root: holds the current head cell of
  /// the binding chain (or `None` for an empty chain) behind one level of
  /// interior mutability. [`crate::env::Env`] roots exactly one of these for
  /// its whole lifetime, so rebinding the head on every assignment never
  /// requires popping/pushing the GC root stack out of LIFO order. See
  /// [`crate::env`].
  EnvHandle(RefCell<Option<ObjPtr>>),
}

/// The fixed per-object header: the intrusive heap-list link and the mark
/// bit. spec.md §4.6 steals the low bit of the link pointer for the mark
/// bit; this implementation keeps them as two separate fields instead — an
/// explicitly licensed substitution (spec.md §9: "an implementation without
/// pointer bit-stealing may use a separate `uint8` mark field; semantics are
/// identical") since Rust raw pointers don't make bit-stealing any cheaper
/// than an extra `Cell<bool>`.
pub struct GcHeader {
  pub(crate) next: std::cell::Cell<Option<ObjPtr>>,
  pub(crate) marked: std::cell::Cell<bool>,
  /// `true` for the bool singletons and the small-int cache: never linked
  /// into the heap list, never marked, never swept.
  pub(crate) is_static: bool,
}

pub struct GcObject {
  pub(crate) header: GcHeader,
  pub value: Value,
}

/// A pointer to a heap-managed object. Dereferencing is only valid while the
/// pointee is reachable, which is the caller's responsibility to arrange via
/// [`crate::gc::Gc::root`]/[`crate::gc::Gc::unroot`].
pub type ObjPtr = NonNull<GcObject>;

pub fn value_of(ptr: ObjPtr) -> &'static Value {
  // SAFETY: callers only hold `ObjPtr`s to live, rooted-or-reachable
  // objects; see the module doc and `Gc`'s safety contract.
  unsafe { &(*ptr.as_ptr()).value }
}

pub fn type_name(value: &Value) -> &'static str {
  match value {
    Value::Int(_) => "int",
    Value::Bool(_) => "bool",
    Value::Str(_) => "str",
    Value::List(_) => "list",
    Value::Type(_) => "type",
    Value::Env { .. } => "env",
    Value::EnvHandle(_) => "env_handle",
  }
}

pub fn ptr_type_name(ptr: ObjPtr) -> &'static str {
  type_name(value_of(ptr))
}

/// `true` iff non-zero/non-empty, per spec.md §4.7's per-type `as_bool`.
/// Every current variant defines this operation, so there is no
/// "unsupported" panic path to preserve here (unlike subscripting below).
pub fn as_bool(ptr: ObjPtr) -> bool {
  match value_of(ptr) {
    Value::Int(n) => *n != 0,
    Value::Bool(b) => *b,
    Value::Str(s) => !s.is_empty(),
    Value::List(items) => !items.borrow().is_empty(),
    Value::Type(_) => true,
    Value::Env { .. } => unreachable!("env cells are never exposed as language-level values"),
    Value::EnvHandle(_) => unreachable!("env handles are never exposed as language-level values"),
  }
}

/// Normalizes a negative index and bounds-checks it against `len`. Panics
/// with the exact spec.md §7 messages on failure.
pub fn check_index(index_ptr: ObjPtr, len: usize) -> usize {
  let i = match value_of(index_ptr) {
    Value::Int(n) => *n,
    _ => panic!("Index must be an integer"),
  };
  let normalized = if i < 0 { i + len as i64 } else { i };
  if normalized < 0 || normalized >= len as i64 {
    panic!("Index out of range");
  }
  normalized as usize
}

/// Returns the single-byte `str` at byte index `i`, or the list element at
/// index `i`. Panics with spec.md's exact "is not subscriptable" message
/// for every other type.
pub fn get_element(receiver: ObjPtr, index_ptr: ObjPtr, alloc_str: impl FnOnce(Box<str>) -> ObjPtr) -> ObjPtr {
  match value_of(receiver) {
    Value::Str(s) => {
      let i = check_index(index_ptr, s.len());
      alloc_str(s.as_bytes()[i..i + 1].iter().map(|&b| b as char).collect::<String>().into_boxed_str())
    }
    Value::List(items) => {
      let items = items.borrow();
      let i = check_index(index_ptr, items.len());
      items[i]
    }
    other => panic!("'{}' object is not subscriptable", type_name(other)),
  }
}

/// Item assignment. Panics with spec.md's exact "does not support item
/// assignment" message for every non-`list` type.
pub fn set_element(receiver: ObjPtr, index_ptr: ObjPtr, value: ObjPtr) {
  match value_of(receiver) {
    Value::List(items) => {
      let mut items = items.borrow_mut();
      let i = check_index(index_ptr, items.len());
      items[i] = value;
    }
    other => panic!("'{}' object does not support item assignment", type_name(other)),
  }
}

impl fmt::Debug for Value {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Value::Int(n) => write!(f, "Int({n})"),
      Value::Bool(b) => write!(f, "Bool({b})"),
      Value::Str(s) => write!(f, "Str({s:?})"),
      Value::List(items) => write!(f, "List(len={})", items.borrow().len()),
      Value::Type(name) => write!(f, "Type({name})"),
      Value::Env { name, .. } => write!(f, "Env({name})"),
      Value::EnvHandle(head) => write!(f, "EnvHandle(has_head={})", head.borrow().is_some()),
    }
  }
}
