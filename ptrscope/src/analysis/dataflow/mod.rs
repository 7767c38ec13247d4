//! Generic data flow analysis framework.
//!
//! This module provides a worklist-based fixed-point solver for forward and
//! backward analyses over the IR. It supports interprocedural analyses
//! through a cooperative side channel: a transfer function can hand callee
//! entry blocks (with prepared incoming lattices) back to the solver, which
//! schedules them in the same module-wide worklist.
//!
//! # Architecture
//!
//! The framework is built around three core abstractions:
//!
//! - **Lattice** ([`JoinSemiLattice`]): the domain of abstract values with a
//!   least-upper-bound join
//! - **Analysis** ([`DataflowAnalysis`]): the per-instruction transfer
//!   function and initial value
//! - **Solver** ([`DataflowSolver`]): iterates to a fixed point using an
//!   ordered worklist
//!
//! # Analyses Provided
//!
//! - [`PointsToAnalysis`](crate::analysis::PointsToAnalysis): interprocedural
//!   may-points-to with indirect-call resolution
//! - [`LiveValues`](crate::analysis::LiveValues): backward liveness over
//!   value ids
//!
//! # Example
//!
//! ```rust,ignore
//! use ptrscope::analysis::{DataflowSolver, LiveValues};
//!
//! let solver = DataflowSolver::new(&module, LiveValues::new());
//! let (results, _) = solver.solve(func);
//! for (block, _) in results.iter() {
//!     println!("{block}: {:?}", results.in_state(block));
//! }
//! ```

mod framework;
mod lattice;
mod solver;

pub use framework::{AnalysisResults, DataflowAnalysis, Direction, SolverCx};
pub use lattice::JoinSemiLattice;
pub use solver::DataflowSolver;
