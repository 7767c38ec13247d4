//! Instructions with explicit operand and result accessors.
//!
//! Unlike a stack machine, every instruction here names its operands and its
//! result directly, so def/use information is available without simulation.
//! The points-to transfer dispatches on [`InstKind`]; the liveness analysis
//! only consults [`Instruction::def`] and [`Instruction::uses`].

use crate::ir::{BlockId, ValueId};

/// The operation an [`Instruction`] performs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstKind {
    /// Stack allocation. The result value doubles as the abstract cell.
    Alloca {
        /// The pointer to the fresh cell.
        result: ValueId,
    },
    /// `*ptr = value`.
    Store {
        /// The value being written.
        value: ValueId,
        /// The destination pointer.
        ptr: ValueId,
    },
    /// `result = *ptr`.
    Load {
        /// The source pointer.
        ptr: ValueId,
        /// The loaded value.
        result: ValueId,
    },
    /// Address computation into an aggregate. Indices are not modeled.
    GetElementPtr {
        /// The base pointer.
        base: ValueId,
        /// The derived pointer.
        result: ValueId,
    },
    /// Type reinterpretation; operand identity is preserved.
    BitCast {
        /// The source value.
        src: ValueId,
        /// The reinterpreted value.
        result: ValueId,
    },
    /// Bulk copy of memory contents from `src` to `dst`.
    MemCpy {
        /// Destination pointer.
        dst: ValueId,
        /// Source pointer.
        src: ValueId,
    },
    /// Bulk fill; recognized so it never falls through into call handling.
    MemSet {
        /// Destination pointer.
        dst: ValueId,
    },
    /// Direct or indirect call.
    Call {
        /// The callee expression: a function, or a temporary holding one.
        callee: ValueId,
        /// Actual arguments in order.
        args: Vec<ValueId>,
        /// The returned value, when the callee produces one.
        result: Option<ValueId>,
    },
    /// Return from the enclosing function.
    Return {
        /// The returned value, if any.
        value: Option<ValueId>,
    },
    /// Unconditional branch.
    Branch {
        /// Target block.
        target: BlockId,
    },
    /// Two-way conditional branch.
    CondBranch {
        /// The branch condition.
        cond: ValueId,
        /// Target when the condition is non-zero.
        then_dest: BlockId,
        /// Target when the condition is zero.
        else_dest: BlockId,
    },
    /// Debug metadata marker; every analysis skips it.
    DbgInfo,
    /// Any operation without pointer semantics (arithmetic, comparisons).
    Other {
        /// Source mnemonic, kept for display.
        mnemonic: String,
        /// The produced value, if any.
        result: Option<ValueId>,
        /// Consumed operands.
        operands: Vec<ValueId>,
    },
}

/// A single IR instruction together with its source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    kind: InstKind,
    line: u32,
}

impl Instruction {
    /// Creates an instruction. A `line` of `0` means "no debug location".
    #[must_use]
    pub const fn new(kind: InstKind, line: u32) -> Self {
        Self { kind, line }
    }

    /// Returns the operation.
    #[must_use]
    pub const fn kind(&self) -> &InstKind {
        &self.kind
    }

    /// Returns the source line from debug metadata, or `0` when absent.
    #[must_use]
    pub const fn line(&self) -> u32 {
        self.line
    }

    /// Returns the value this instruction defines, if any.
    #[must_use]
    pub fn def(&self) -> Option<ValueId> {
        match &self.kind {
            InstKind::Alloca { result }
            | InstKind::Load { result, .. }
            | InstKind::GetElementPtr { result, .. }
            | InstKind::BitCast { result, .. } => Some(*result),
            InstKind::Call { result, .. } | InstKind::Other { result, .. } => *result,
            _ => None,
        }
    }

    /// Returns the values this instruction reads.
    #[must_use]
    pub fn uses(&self) -> Vec<ValueId> {
        match &self.kind {
            InstKind::Store { value, ptr } => vec![*value, *ptr],
            InstKind::Load { ptr, .. } => vec![*ptr],
            InstKind::GetElementPtr { base, .. } => vec![*base],
            InstKind::BitCast { src, .. } => vec![*src],
            InstKind::MemCpy { dst, src } => vec![*dst, *src],
            InstKind::MemSet { dst } => vec![*dst],
            InstKind::Call { callee, args, .. } => {
                let mut uses = Vec::with_capacity(args.len() + 1);
                uses.push(*callee);
                uses.extend_from_slice(args);
                uses
            }
            InstKind::Return { value } => value.iter().copied().collect(),
            InstKind::CondBranch { cond, .. } => vec![*cond],
            InstKind::Other { operands, .. } => operands.clone(),
            InstKind::Alloca { .. }
            | InstKind::Branch { .. }
            | InstKind::DbgInfo => Vec::new(),
        }
    }

    /// Returns `true` if this instruction ends a basic block.
    #[must_use]
    pub const fn is_terminator(&self) -> bool {
        matches!(
            self.kind,
            InstKind::Return { .. } | InstKind::Branch { .. } | InstKind::CondBranch { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn def_use_accessors() {
        let v = |i: usize| ValueId::new(i);

        let store = Instruction::new(
            InstKind::Store {
                value: v(0),
                ptr: v(1),
            },
            4,
        );
        assert_eq!(store.def(), None);
        assert_eq!(store.uses(), vec![v(0), v(1)]);
        assert_eq!(store.line(), 4);

        let call = Instruction::new(
            InstKind::Call {
                callee: v(2),
                args: vec![v(3), v(4)],
                result: Some(v(5)),
            },
            0,
        );
        assert_eq!(call.def(), Some(v(5)));
        assert_eq!(call.uses(), vec![v(2), v(3), v(4)]);
        assert!(!call.is_terminator());

        let ret = Instruction::new(InstKind::Return { value: None }, 0);
        assert!(ret.is_terminator());
        assert!(ret.uses().is_empty());
    }
}
