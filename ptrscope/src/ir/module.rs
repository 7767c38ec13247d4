//! The module: value arena plus function table.

use std::fmt;

use rustc_hash::FxHashMap;

use crate::ir::{Block, BlockId, FuncId, Function, Value, ValueId};

/// Module-wide identity of a basic block.
///
/// The dataflow solver schedules blocks of different functions in one
/// worklist, so block identity must carry the owning function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockRef {
    /// The owning function.
    pub func: FuncId,
    /// The block within that function.
    pub block: BlockId,
}

impl BlockRef {
    /// Creates a block reference.
    #[must_use]
    pub const fn new(func: FuncId, block: BlockId) -> Self {
        Self { func, block }
    }
}

impl fmt::Display for BlockRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.func, self.block)
    }
}

/// An immutable module of IR functions over a shared value arena.
#[derive(Debug, Clone)]
pub struct Module {
    values: Vec<Value>,
    functions: Vec<Function>,
    by_name: FxHashMap<String, FuncId>,
    globals: Vec<ValueId>,
}

impl Module {
    pub(crate) fn new(
        values: Vec<Value>,
        functions: Vec<Function>,
        by_name: FxHashMap<String, FuncId>,
        globals: Vec<ValueId>,
    ) -> Self {
        Self {
            values,
            functions,
            by_name,
            globals,
        }
    }

    /// Returns a value by id.
    #[must_use]
    pub fn value(&self, id: ValueId) -> &Value {
        &self.values[id.index()]
    }

    /// Returns the number of values in the arena.
    #[must_use]
    pub fn value_count(&self) -> usize {
        self.values.len()
    }

    /// Returns a function by id.
    #[must_use]
    pub fn function(&self, id: FuncId) -> &Function {
        &self.functions[id.index()]
    }

    /// Returns the functions in module order.
    #[must_use]
    pub fn functions(&self) -> &[Function] {
        &self.functions
    }

    /// Looks a function up by name.
    #[must_use]
    pub fn function_by_name(&self, name: &str) -> Option<FuncId> {
        self.by_name.get(name).copied()
    }

    /// Returns the module-level global cells in declaration order.
    #[must_use]
    pub fn globals(&self) -> &[ValueId] {
        &self.globals
    }

    /// Returns a block through its module-wide reference.
    #[must_use]
    pub fn block(&self, r: BlockRef) -> &Block {
        self.function(r.func)
            .block(r.block)
            .expect("dangling block reference")
    }

    /// Returns the entry block reference of a defined function.
    #[must_use]
    pub fn entry_ref(&self, func: FuncId) -> BlockRef {
        BlockRef::new(func, self.function(func).entry())
    }

    /// Returns the predecessors of a block as module-wide references.
    pub fn predecessors(&self, r: BlockRef) -> impl Iterator<Item = BlockRef> + '_ {
        self.function(r.func)
            .predecessors(r.block)
            .iter()
            .map(move |&b| BlockRef::new(r.func, b))
    }

    /// Returns the successors of a block as module-wide references.
    pub fn successors(&self, r: BlockRef) -> impl Iterator<Item = BlockRef> + '_ {
        self.block(r)
            .successors()
            .into_iter()
            .map(move |b| BlockRef::new(r.func, b))
    }

    /// Returns the exit (returning) blocks of a function.
    pub fn exit_refs(&self, func: FuncId) -> impl Iterator<Item = BlockRef> + '_ {
        self.function(func)
            .exits()
            .iter()
            .map(move |&b| BlockRef::new(func, b))
    }

    /// Returns a human-readable name for a value, for diagnostics and dumps.
    #[must_use]
    pub fn value_name(&self, id: ValueId) -> String {
        match self.value(id).name() {
            Some(name) => name.to_string(),
            None => id.to_string(),
        }
    }
}
