//! Argument parsing and the top-level `run()` control flow:
//! `source_load → parse → evaluate` (spec.md §2), wrapped in the ambient
//! CLI surface (debug dump flags, verbosity, hidden tuning flags for test
//! harnesses). Mirrors the shape of `radlr`'s own `src/app/cli/main.rs`: a
//! builder-style `clap::Command` returning `ArgMatches`, consumed by a
//! small `configure_matches`-style function.

use crate::config::Config;
use crate::error::NatrixError;
use clap::{arg, value_parser, Arg, ArgAction, ArgMatches, Command};
use natrix_core::arena::Arena;
use natrix_core::diagnostics::StderrSink;
use natrix_core::lexer::Lexer;
use natrix_core::source::Source;
use natrix_core::{ast, parser};
use natrix_runtime::evaluator::Evaluator;
use natrix_runtime::gc::Gc;
use std::path::PathBuf;
use tracing::debug;

/// Builds the `Command` definition without running it — split out from
/// [`command`] so tests can feed it an explicit argv via
/// `build_command().get_matches_from(...)` instead of the process's real one.
pub fn build_command() -> Command {
  Command::new("natrix")
    .version(env!("CARGO_PKG_VERSION"))
    .about("A tree-walking interpreter for the natrix language.")
    .arg(arg!(<FILE> "The .nx source file to run").value_parser(value_parser!(PathBuf)))
    .arg(arg!([ARG] "Non-negative integer bound to the `arg` variable").default_value("0"))
    .arg(
      Arg::new("verbose")
        .short('v')
        .long("verbose")
        .help("Raise the tracing verbosity (-v, -vv, -vvv)")
        .action(ArgAction::Count),
    )
    .arg(arg!(--"dump-tokens" "Print the token stream instead of running the program"))
    .arg(arg!(--"dump-ast" "Print the parsed AST instead of running the program"))
    .arg(arg!(--"gc-threshold" <N> "Override the initial GC collection threshold").value_parser(value_parser!(usize)).hide(true))
    .arg(arg!(--"arena-chunk-size" <N> "Override the arena's default chunk size").value_parser(value_parser!(usize)).hide(true))
    .arg(arg!(--"max-indent-depth" <N> "Override the lexer's indentation-depth limit").value_parser(value_parser!(usize)).hide(true))
    .arg(arg!(--"max-gc-roots" <N> "Override the GC root stack's capacity").value_parser(value_parser!(usize)).hide(true))
}

pub fn command() -> ArgMatches {
  build_command().get_matches()
}

pub fn verbosity_filter(matches: &ArgMatches) -> &'static str {
  match matches.get_count("verbose") {
    0 => "warn",
    1 => "info",
    2 => "debug",
    _ => "trace",
  }
}

fn configure(matches: &ArgMatches) -> Config {
  let defaults = Config::default();
  Config {
    gc_initial_threshold: matches.get_one::<usize>("gc-threshold").copied().unwrap_or(defaults.gc_initial_threshold),
    arena_chunk_size: matches.get_one::<usize>("arena-chunk-size").copied().unwrap_or(defaults.arena_chunk_size),
    max_indent_depth: matches.get_one::<usize>("max-indent-depth").copied().unwrap_or(defaults.max_indent_depth),
    max_gc_roots: matches.get_one::<usize>("max-gc-roots").copied().unwrap_or(defaults.max_gc_roots),
  }
}

pub fn run(matches: &ArgMatches) -> Result<(), NatrixError> {
  let config = configure(matches);
  let path = matches.get_one::<PathBuf>("FILE").expect("FILE is required");
  if !path.is_file() {
    return Err(NatrixError::FileNotFound(path.display().to_string()));
  }
  let arg_text = matches.get_one::<String>("ARG").expect("ARG has a default value");
  let arg: u64 = arg_text.parse().map_err(|_| NatrixError::InvalidArg(arg_text.clone()))?;

  let source = Source::load_file(path);
  debug!(filename = source.filename(), bytes = source.text().len(), "loaded source");

  if matches.get_flag("dump-tokens") {
    dump_tokens(&source, &config);
    return Ok(());
  }

  let arena = Arena::with_chunk_size(config.arena_chunk_size);
  let mut sink = StderrSink;
  let lexer = Lexer::with_max_indent_depth(&source, config.max_indent_depth);
  let program = parser::parse_with_lexer(&arena, &source, lexer, &mut sink).ok_or(NatrixError::ParseFailed)?;

  if matches.get_flag("dump-ast") {
    print!("{}", ast::dump_block(&program, source.text()));
    return Ok(());
  }

  let gc = Gc::with_limits(config.gc_initial_threshold, config.max_gc_roots);
  let mut stdout = std::io::stdout();
  let mut evaluator = Evaluator::new(&gc, source.text(), arg as i64, &mut stdout);
  evaluator.run(&program);
  Ok(())
}

fn dump_tokens(source: &Source, config: &Config) {
  let mut lexer = Lexer::with_max_indent_depth(source, config.max_indent_depth);
  loop {
    let tok = lexer.next_token();
    let done = tok.kind == natrix_core::token::TokenKind::Eof || tok.kind == natrix_core::token::TokenKind::Error;
    println!("{:?} {:?}", tok.kind, tok.text(source.text()));
    if done {
      break;
    }
  }
}
