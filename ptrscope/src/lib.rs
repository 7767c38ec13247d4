// Copyright 2025-2026 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![deny(missing_docs)]

//! # ptrscope
//!
//! Interprocedural, flow-sensitive, field-insensitive **may-points-to
//! analysis** over a low-level SSA intermediate representation. Given a
//! module of functions, `ptrscope` reports for every indirect call site the
//! set of callees that may be invoked at runtime, resolving function
//! pointers passed through parameters, returned from functions, stored in
//! memory, and copied by bulk memory operations.
//!
//! # Architecture
//!
//! The library is organized into layers that build on each other:
//!
//! - **IR Layer** ([`crate::ir`]): arena-allocated values with stable ids,
//!   functions, basic blocks, instruction taxonomy, a programmatic builder,
//!   and a textual loader
//! - **Dataflow Layer** ([`crate::analysis::dataflow`]): a generic monotone
//!   worklist fixed-point solver, forward and backward, with a cooperative
//!   side channel for interprocedural scheduling
//! - **Points-To Layer** ([`crate::analysis::pointsto`]): the dual
//!   alias-binding / points-to lattice and the transfer function, including
//!   call-boundary argument binding and mutation carry-back
//! - **Liveness** ([`crate::analysis::liveness`]): a second, backward client
//!   of the same solver
//!
//! ## Key Components
//!
//! - [`crate::ir::Module`] / [`crate::ir::ModuleBuilder`] / [`crate::ir::parse`] -
//!   the analyzed program and its construction surfaces
//! - [`crate::analysis::resolve_call_targets`] - one-call driver from module
//!   to resolved call sites
//! - [`crate::analysis::DataflowSolver`] - the generic fixed-point engine
//! - [`crate::analysis::CallSiteResults`] - line → callee-name output map
//! - [`crate::prelude`] - convenient re-exports of commonly used types
//! - [`crate::Error`] and [`crate::Result`] - error handling for the IR
//!   surface
//!
//! # Usage Examples
//!
//! ## Quick Start
//!
//! ```rust
//! use ptrscope::prelude::*;
//!
//! let module = ptrscope::ir::parse(
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
//!
//! ## Determinism
//!
//! All result-bearing containers are ordered; two runs over the same module
//! produce byte-identical output. The analysis itself never fails: the
//! result is always a sound, best-effort may-set.

#[macro_use]
pub(crate) mod error;

pub mod analysis;
pub mod ir;
pub mod prelude;

pub use error::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
