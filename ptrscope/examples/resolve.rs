//! Minimal end-to-end use of the library: parse a module, resolve indirect
//! calls, print the call-site table.
//!
//! Run with: `cargo run --example resolve`

use ptrscope::analysis::resolve_call_targets;
use ptrscope::ir::parse;

const SOURCE: &str = "func @plus(i32 %a, i32 %b) -> i32 {\n\
     entry:\n\
     \x20 %s = add %a, %b\n\
     \x20 ret %s\n\
     }\n\
     func @minus(i32 %a, i32 %b) -> i32 {\n\
     entry:\n\
     \x20 %s = sub %a, %b\n\
     \x20 ret %s\n\
     }\n\
     func @main(i32 %x) -> i32 {\n\
     entry:\n\
     \x20 %fp = alloca fn(i32, i32) -> i32\n\
     \x20 condbr %x, then, else\n\
     then:\n\
     \x20 store @plus, %fp\n\
     \x20 br join\n\
     else:\n\
     \x20 store @minus, %fp\n\
     \x20 br join\n\
     join:\n\
     \x20 %f = load %fp\n\
     \x20 %r = call %f(1, 2) !line 11\n\
     \x20 ret %r\n\
     }\n";

fn main() -> ptrscope::Result<()> {
    let module = parse(SOURCE)?;
    print!("{}", resolve_call_targets(&module));
    Ok(())
}
