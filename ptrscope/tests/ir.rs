//! Textual loader and dump round trips.

use ptrscope::analysis::{DataflowSolver, LiveValues};
use ptrscope::ir::parse;
use ptrscope::Error;

const PROGRAM: &str = "declare @malloc(i64) -> ptr i8\n\
     global @handler fn(i32, i32) -> i32\n\
     func @plus(i32 %a, i32 %b) -> i32 {\n\
     entry:\n\
     \x20 %s = add %a, %b\n\
     \x20 ret %s\n\
     }\n\
     func @main(i32 %k) -> i32 {\n\
     entry:\n\
     \x20 store @plus, @handler\n\
     \x20 condbr %k, go, out\n\
     go:\n\
     \x20 %f = load @handler\n\
     \x20 %r = call %f(1, 2) !line 12\n\
     \x20 ret %r\n\
     out:\n\
     \x20 ret 0\n\
     }\n";

#[test]
fn dump_is_stable_under_reparse() {
    let module = parse(PROGRAM).unwrap();
    assert_eq!(module.functions().len(), 3);
    assert_eq!(module.globals().len(), 1);

    let dumped = module.to_string();
    let reparsed = parse(&dumped).unwrap();
    assert_eq!(reparsed.functions().len(), 3);
    assert_eq!(reparsed.globals().len(), 1);
    assert_eq!(reparsed.to_string(), dumped);
}

#[test]
fn global_cell_resolves_indirect_call() {
    let module = parse(PROGRAM).unwrap();
    let results = ptrscope::analysis::resolve_call_targets(&module);
    assert_eq!(results.to_string(), "12 : plus\n");
}

#[test]
fn liveness_runs_over_parsed_module() {
    let module = parse(PROGRAM).unwrap();
    let func = module.function_by_name("main").unwrap();
    let (results, _) = DataflowSolver::new(&module, LiveValues::new()).solve(func);

    // %k steers the branch, so it is live into the entry block.
    let main = module.function(func);
    let k = main.params()[0];
    let entry = module.entry_ref(func);
    assert!(results.in_state(entry).unwrap().is_live(k));
    // Exit blocks carry nothing out.
    for exit in module.exit_refs(func) {
        assert!(results.out_state(exit).unwrap().is_empty());
    }
}

#[test]
fn parse_errors_carry_line_numbers() {
    let err = parse("func @f() -> i32 {\nentry:\n  %x = load\n  ret 0\n}\n").unwrap_err();
    match err {
        Error::Parse { line, .. } => assert_eq!(line, 3),
        other => panic!("unexpected error: {other}"),
    }

    let err = parse("definitely not ir\n").unwrap_err();
    assert!(matches!(err, Error::Parse { line: 1, .. }));
}

#[test]
fn missing_debug_line_reports_zero() {
    let module = parse(
        "func @f() -> void {\n\
         entry:\n\
         \x20 %c = alloca i32\n\
         \x20 ret\n\
         }\n",
    )
    .unwrap();
    let f = &module.functions()[0];
    for inst in f.blocks()[0].instructions() {
        assert_eq!(inst.line(), 0);
    }
}
