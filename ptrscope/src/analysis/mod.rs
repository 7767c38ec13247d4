//! Program analysis infrastructure.
//!
//! This module provides the analyses of the crate and the framework they run
//! on:
//!
//! - [`dataflow`]: the generic worklist fixed-point solver, parameterized by
//!   a lattice and a transfer function, forward or backward
//! - [`pointsto`]: interprocedural, flow-sensitive, field-insensitive
//!   may-points-to with indirect-call resolution
//! - [`liveness`]: backward live-value analysis, a second (intraprocedural)
//!   client of the same solver
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use ptrscope::analysis::resolve_call_targets;
//!
//! let module = ptrscope::ir::parse(&source)?;
//! let results = resolve_call_targets(&module);
//! print!("{results}");
//! ```

pub mod dataflow;
pub mod liveness;
pub mod pointsto;

pub use dataflow::{
    AnalysisResults, DataflowAnalysis, DataflowSolver, Direction, JoinSemiLattice, SolverCx,
};
pub use liveness::{LiveSet, LiveValues};
pub use pointsto::{
    entry_function, resolve_call_targets, CallSiteResults, PointsToAnalysis, PointsToState,
};
