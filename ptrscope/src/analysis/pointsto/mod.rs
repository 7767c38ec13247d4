//! Interprocedural may-points-to analysis and indirect-call resolution.
//!
//! Given a module, this analysis reports for every call site the set of
//! callees that may be invoked at runtime, resolving function pointers
//! passed through parameters, returned from functions, stored in memory,
//! and copied by bulk memory operations.
//!
//! # Architecture
//!
//! - [`PointsToState`]: the lattice, a pair of alias-binding and points-to maps
//! - [`PointsToAnalysis`]: the transfer function, run by the generic
//!   [`DataflowSolver`](crate::analysis::DataflowSolver)
//! - [`CallSiteResults`]: accumulated call-site → callee-name output
//!
//! # Example
//!
//! ```rust
//! use ptrscope::analysis::resolve_call_targets;
//! use ptrscope::ir;
//!
//! let module = ir::parse(
//!     "func @plus(i32 %a, i32 %b) -> i32 {\n\
//!      entry:\n\
//!      \x20 %s = add %a, %b\n\
//!      \x20 ret %s\n\
//!      }\n\
//!      func @main() -> i32 {\n\
//!      entry:\n\
//!      \x20 %fp = alloca fn(i32, i32) -> i32\n\
//!      \x20 store @plus, %fp\n\
//!      \x20 %f = load %fp\n\
//!      \x20 %r = call %f(1, 2) !line 7\n\
//!      \x20 ret %r\n\
//!      }\n",
//! )?;
//!
//! let results = resolve_call_targets(&module);
//! assert_eq!(results.to_string(), "7 : plus\n");
//! # Ok::<(), ptrscope::Error>(())
//! ```

mod callsites;
mod state;
mod transfer;

pub use callsites::CallSiteResults;
pub use state::PointsToState;
pub use transfer::PointsToAnalysis;

use log::debug;

use crate::analysis::dataflow::DataflowSolver;
use crate::ir::{FuncId, Module};

/// Selects the analysis entry: the last non-intrinsic function with a body,
/// in module order. Other functions are analyzed reactively via calls.
#[must_use]
pub fn entry_function(module: &Module) -> Option<FuncId> {
    module
        .functions()
        .iter()
        .enumerate()
        .rev()
        .find(|(_, f)| !f.is_declaration() && !f.is_intrinsic())
        .map(|(index, _)| FuncId::new(index))
}

/// Runs the points-to analysis over the module and returns the resolved
/// call targets.
///
/// A module without any defined function yields empty results; unresolved
/// call sites are simply absent. The analysis itself never fails.
#[must_use]
pub fn resolve_call_targets(module: &Module) -> CallSiteResults {
    let Some(entry) = entry_function(module) else {
        debug!("no analyzable function in module");
        return CallSiteResults::new();
    };
    debug!(
        "resolving call targets from '{}'",
        module.function(entry).name()
    );
    let solver = DataflowSolver::new(module, PointsToAnalysis::new());
    let (_, analysis) = solver.solve(entry);
    analysis.into_results()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{ModuleBuilder, Type};

    #[test]
    fn entry_is_last_defined_function() {
        let mut m = ModuleBuilder::new();
        m.declare("malloc", vec![Type::Int(64)], Type::ptr(Type::Int(8)))
            .unwrap();
        let first = m.define("first", vec![], Type::Void).unwrap();
        let mut f = m.body(first).unwrap();
        f.block("entry");
        f.ret(None).unwrap();
        f.finish().unwrap();
        let second = m.define("second", vec![], Type::Void).unwrap();
        let mut f = m.body(second).unwrap();
        f.block("entry");
        f.ret(None).unwrap();
        f.finish().unwrap();
        let module = m.finish().unwrap();

        let entry = entry_function(&module).unwrap();
        assert_eq!(module.function(entry).name(), "second");
    }

    #[test]
    fn declaration_only_module_has_no_entry() {
        let mut m = ModuleBuilder::new();
        m.declare("malloc", vec![Type::Int(64)], Type::ptr(Type::Int(8)))
            .unwrap();
        let module = m.finish().unwrap();
        assert!(entry_function(&module).is_none());
        assert!(resolve_call_targets(&module).is_empty());
    }
}
