//! Basic blocks.

use std::fmt;

use crate::ir::{InstKind, Instruction};

/// Function-local basic block identifier. Block 0 is always the entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockId(u32);

impl BlockId {
    /// Creates a block id from a raw index.
    #[must_use]
    pub fn new(index: usize) -> Self {
        Self(u32::try_from(index).expect("block count exceeds u32 range"))
    }

    /// Returns the raw index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bb{}", self.0)
    }
}

/// A maximal straight-line instruction sequence ending in a terminator.
#[derive(Debug, Clone)]
pub struct Block {
    id: BlockId,
    label: Option<String>,
    insts: Vec<Instruction>,
}

impl Block {
    pub(crate) fn new(id: BlockId, label: Option<String>, insts: Vec<Instruction>) -> Self {
        Self { id, label, insts }
    }

    /// Returns this block's id.
    #[must_use]
    pub const fn id(&self) -> BlockId {
        self.id
    }

    /// Returns the source-level label, if any.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Returns the instructions in program order.
    #[must_use]
    pub fn instructions(&self) -> &[Instruction] {
        &self.insts
    }

    /// Returns the control-flow successors, derived from the terminator.
    ///
    /// A block ending in `Return` (or missing a terminator in malformed
    /// input) has no successors.
    #[must_use]
    pub fn successors(&self) -> Vec<BlockId> {
        match self.insts.last().map(Instruction::kind) {
            Some(InstKind::Branch { target }) => vec![*target],
            Some(InstKind::CondBranch {
                then_dest,
                else_dest,
                ..
            }) => {
                if then_dest == else_dest {
                    vec![*then_dest]
                } else {
                    vec![*then_dest, *else_dest]
                }
            }
            _ => Vec::new(),
        }
    }

    /// Returns `true` if the block ends in a `Return`.
    #[must_use]
    pub fn is_exit(&self) -> bool {
        matches!(
            self.insts.last().map(Instruction::kind),
            Some(InstKind::Return { .. })
        )
    }
}
