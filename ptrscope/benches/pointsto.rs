use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use ptrscope::analysis::resolve_call_targets;
use ptrscope::ir::{parse, Module};

/// Builds a chain of `depth` functions, each forwarding a function pointer
/// to the next, ending in an indirect call.
fn call_chain(depth: usize) -> Module {
    let mut src = String::from(
        "func @plus(i32 %a, i32 %b) -> i32 {\n\
         entry:\n\
         \x20 %s = add %a, %b\n\
         \x20 ret %s\n\
         }\n",
    );
    src.push_str(
        "func @sink(fn(i32, i32) -> i32 %g) -> void {\n\
         entry:\n\
         \x20 call %g(1, 2) !line 1\n\
         \x20 ret\n\
         }\n",
    );
    for i in (0..depth).rev() {
        let next = if i + 1 == depth {
            "sink".to_string()
        } else {
            format!("hop{}", i + 1)
        };
        src.push_str(&format!(
            "func @hop{i}(fn(i32, i32) -> i32 %g) -> void {{\n\
             entry:\n\
             \x20 call @{next}(%g)\n\
             \x20 ret\n\
             }}\n"
        ));
    }
    src.push_str(
        "func @main() -> void {\n\
         entry:\n\
         \x20 call @hop0(@plus)\n\
         \x20 ret\n\
         }\n",
    );
    parse(&src).expect("benchmark module must parse")
}

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_call_targets");
    for depth in [4usize, 16, 64] {
        let module = call_chain(depth);
        group.bench_with_input(BenchmarkId::from_parameter(depth), &module, |b, module| {
            b.iter(|| resolve_call_targets(module));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_resolve);
criterion_main!(benches);
