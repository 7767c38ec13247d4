//! # ptrscope Prelude
//!
//! This module provides a convenient prelude for the most commonly used
//! types and traits of the library. Import it to get quick access to the
//! essentials of IR construction and analysis.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all ptrscope operations
pub use crate::Error;

/// The result type used throughout ptrscope
pub use crate::Result;

// ================================================================================================
// IR
// ================================================================================================

/// The analyzed program and its identifiers
pub use crate::ir::{Block, BlockId, BlockRef, FuncId, Function, Module, ValueId};

/// Values and types
pub use crate::ir::{Type, Value, ValueKind};

/// Instructions
pub use crate::ir::{InstKind, Instruction};

/// Construction surfaces: programmatic and textual
pub use crate::ir::{parse, parse_file, FunctionBuilder, ModuleBuilder};

// ================================================================================================
// Analyses
// ================================================================================================

/// One-call driver: module in, resolved call sites out
pub use crate::analysis::{entry_function, resolve_call_targets};

/// The points-to analysis and its state and output types
pub use crate::analysis::{CallSiteResults, PointsToAnalysis, PointsToState};

/// The generic dataflow framework
pub use crate::analysis::{
    AnalysisResults, DataflowAnalysis, DataflowSolver, Direction, JoinSemiLattice, SolverCx,
};

/// Liveness, the second solver client
pub use crate::analysis::{LiveSet, LiveValues};
