//! Functions: parameter lists, block graphs, and derived CFG edges.

use std::fmt;

use crate::ir::{Block, BlockId, Type, ValueId};

/// Index of a [`Function`] within its module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FuncId(u32);

impl FuncId {
    /// Creates a function id from a raw index.
    #[must_use]
    pub fn new(index: usize) -> Self {
        Self(u32::try_from(index).expect("function count exceeds u32 range"))
    }

    /// Returns the raw index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for FuncId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fn{}", self.0)
    }
}

/// A function definition or declaration.
///
/// Declarations carry a signature but no blocks; calls to them are treated
/// as opaque external calls and recorded by name only.
#[derive(Debug, Clone)]
pub struct Function {
    name: String,
    value: ValueId,
    params: Vec<ValueId>,
    ret: Type,
    blocks: Vec<Block>,
    preds: Vec<Vec<BlockId>>,
    exits: Vec<BlockId>,
}

impl Function {
    /// Assembles a function and computes predecessor lists and exit blocks.
    pub(crate) fn new(
        name: String,
        value: ValueId,
        params: Vec<ValueId>,
        ret: Type,
        blocks: Vec<Block>,
    ) -> Self {
        let mut preds = vec![Vec::new(); blocks.len()];
        let mut exits = Vec::new();
        for block in &blocks {
            for succ in block.successors() {
                let list = &mut preds[succ.index()];
                if !list.contains(&block.id()) {
                    list.push(block.id());
                }
            }
            if block.is_exit() {
                exits.push(block.id());
            }
        }
        Self {
            name,
            value,
            params,
            ret,
            blocks,
            preds,
            exits,
        }
    }

    /// Returns the function name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the value representing this function in the arena.
    #[must_use]
    pub const fn value(&self) -> ValueId {
        self.value
    }

    /// Returns the formal parameters in declaration order.
    #[must_use]
    pub fn params(&self) -> &[ValueId] {
        &self.params
    }

    /// Returns the return type.
    #[must_use]
    pub const fn return_type(&self) -> &Type {
        &self.ret
    }

    /// Returns the basic blocks.
    #[must_use]
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Returns a block by id.
    #[must_use]
    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(id.index())
    }

    /// Returns the entry block id. Panics on a declaration.
    #[must_use]
    pub fn entry(&self) -> BlockId {
        debug_assert!(!self.blocks.is_empty(), "entry() on a declaration");
        BlockId::new(0)
    }

    /// Returns the predecessors of a block.
    #[must_use]
    pub fn predecessors(&self, id: BlockId) -> &[BlockId] {
        &self.preds[id.index()]
    }

    /// Returns the blocks ending in `Return`.
    #[must_use]
    pub fn exits(&self) -> &[BlockId] {
        &self.exits
    }

    /// Returns `true` if the function has no body.
    #[must_use]
    pub fn is_declaration(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Returns `true` for compiler-reserved intrinsics.
    #[must_use]
    pub fn is_intrinsic(&self) -> bool {
        self.name.starts_with("llvm.")
    }
}
