//! Whole-program scenarios driving the full `natrix-core` → `natrix-runtime`
//! pipeline (parse once, then evaluate), beyond the unit-level coverage
//! already in `evaluator.rs`.

use natrix_core::arena::Arena;
use natrix_core::diagnostics::VecSink;
use natrix_core::parser::parse;
use natrix_core::source::Source;
use natrix_runtime::evaluator::Evaluator;
use natrix_runtime::gc::Gc;

fn run(text: &str, arg: i64) -> String {
  let source = Source::load_string("t.nx", text);
  let arena = Arena::new();
  let mut sink = VecSink::default();
  let program = parse(&arena, &source, &mut sink).expect("program should parse");
  let gc = Gc::new();
  let mut out = Vec::new();
  Evaluator::new(&gc, source.text(), arg, &mut out).run(&program);
  String::from_utf8(out).unwrap()
}

#[test]
fn negative_index_wraps_from_the_end() {
  let text = "a = [10, 20, 30]\nprint(a[-1])\n";
  assert_eq!(run(text, 0), "30\n");
}

#[test]
fn nested_list_literals_hold_pointer_identity_for_cached_ints() {
  // both inner lists end up holding the *same* cached 1 object
  let text = "a = [1, 1]\nprint(a[0] == a[1])\n";
  assert_eq!(run(text, 0), "1\n");
}

#[test]
fn elif_chain_picks_the_first_true_branch() {
  let text = "n = 2\nif n == 1:\n  print(1)\nelif n == 2:\n  print(2)\nelse:\n  print(3)\n";
  assert_eq!(run(text, 0), "2\n");
}

#[test]
fn string_equality_feeds_a_boolean_into_the_next_condition() {
  // `==`/`!=` yield plain 0/1 ints, which is what `if`/`while` actually
  // accept as a condition (conditions must be `int`, not generic truthy
  // values — unlike `object::as_bool`, which every heap type defines).
  let text = "a = \"hi\"\nb = \"hi\"\nif a == b:\n  print(1)\nelse:\n  print(0)\n";
  assert_eq!(run(text, 0), "1\n");
}

#[test]
#[should_panic(expected = "Condition must be an integer")]
fn string_condition_panics_even_though_it_would_be_truthy() {
  run("s = \"x\"\nif s:\n  pass\n", 0);
}

#[test]
#[should_panic(expected = "Index out of range")]
fn out_of_range_index_panics() {
  run("a = [1]\nprint(a[5])\n", 0);
}

#[test]
#[should_panic(expected = "Subscripted value must be a list")]
fn subscripting_an_int_panics() {
  run("a = 5\nprint(a[0])\n", 0);
}

#[test]
#[should_panic(expected = "Condition must be an integer")]
fn non_int_while_condition_panics() {
  run("while \"x\":\n  pass\n", 0);
}

#[test]
fn collection_runs_mid_program_without_losing_live_values() {
  // force several collections worth of allocation while a live total
  // accumulates, to exercise the GC threshold/doubling path end-to-end
  let text = "total = 0\nn = 0\nwhile n < 500:\n  total = total + n\n  n = n + 1\nprint(total)\n";
  assert_eq!(run(text, 0), "124750\n");
}
