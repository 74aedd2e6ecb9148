//! Exercises `natrix_cli::cli` the way `bin.rs` does, minus the real
//! process argv: `build_command().get_matches_from(...)` stands in for it.

use natrix_cli::cli;
use natrix_cli::NatrixError;

fn fixture(name: &str) -> String {
  format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR"))
}

#[test]
fn runs_a_real_program_to_completion() {
  let matches = cli::build_command().get_matches_from(["natrix", &fixture("factorial.nx"), "5"]);
  assert!(cli::run(&matches).is_ok());
}

#[test]
fn missing_file_is_a_recoverable_error() {
  let matches = cli::build_command().get_matches_from(["natrix", "/definitely/does/not/exist.nx"]);
  let err = cli::run(&matches).unwrap_err();
  assert!(matches!(err, NatrixError::FileNotFound(_)));
  assert_eq!(err.exit_code(), 1);
}

#[test]
fn non_numeric_arg_is_a_recoverable_error() {
  let matches = cli::build_command().get_matches_from(["natrix", &fixture("factorial.nx"), "not-a-number"]);
  let err = cli::run(&matches).unwrap_err();
  assert!(matches!(err, NatrixError::InvalidArg(_)));
}

#[test]
fn parse_failure_is_a_recoverable_error_not_a_panic() {
  let matches = cli::build_command().get_matches_from(["natrix", &fixture("syntax_error.nx")]);
  let err = cli::run(&matches).unwrap_err();
  assert!(matches!(err, NatrixError::ParseFailed));
}

#[test]
fn dump_ast_flag_short_circuits_evaluation() {
  let matches = cli::build_command().get_matches_from(["natrix", &fixture("factorial.nx"), "--dump-ast"]);
  assert!(cli::run(&matches).is_ok());
}

#[test]
fn dump_tokens_flag_short_circuits_evaluation() {
  let matches = cli::build_command().get_matches_from(["natrix", &fixture("factorial.nx"), "--dump-tokens"]);
  assert!(cli::run(&matches).is_ok());
}
