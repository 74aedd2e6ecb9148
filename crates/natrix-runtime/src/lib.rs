//! natrix-runtime: the mark-and-sweep collector, the heap value model, the
//! environment, and the tree-walking evaluator built on top of
//! `natrix-core`'s AST.

pub mod env;
pub mod evaluator;
pub mod gc;
pub mod object;

pub use env::Env;
pub use evaluator::Evaluator;
pub use gc::Gc;
pub use object::{ObjPtr, Value};
