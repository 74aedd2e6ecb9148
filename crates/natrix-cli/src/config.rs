//! Engineering knobs that aren't language surface: the initial GC
//! threshold, the arena's default chunk size, and the depth limits the
//! lexer and GC enforce. Grounded on `radlr-core`'s `ParserConfig`/`Journal`
//! config structs — a small, `Default`-able struct carrying constants that
//! are otherwise buried in the library, overridable by hidden CLI flags for
//! test harnesses.

#[derive(Debug, Clone, Copy)]
pub struct Config {
  pub gc_initial_threshold: usize,
  pub arena_chunk_size: usize,
  pub max_indent_depth: usize,
  pub max_gc_roots: usize,
}

impl Default for Config {
  fn default() -> Self {
    Config {
      gc_initial_threshold: 100,
      arena_chunk_size: natrix_core::arena::DEFAULT_CHUNK_SIZE,
      max_indent_depth: natrix_core::lexer::MAX_INDENT_DEPTH,
      max_gc_roots: natrix_runtime::gc::MAX_ROOTS,
    }
  }
}
