//! Programmatic module construction.
//!
//! [`ModuleBuilder`] owns the value arena while a module is under
//! construction. Function signatures are registered first with
//! [`define`](ModuleBuilder::define) or [`declare`](ModuleBuilder::declare);
//! bodies are emitted afterwards through [`body`](ModuleBuilder::body), which
//! allows functions to reference one another regardless of order. Both
//! builders validate as they go and return [`crate::Error::Malformed`] for
//! shapes the IR cannot represent (a `load` through a non-pointer, a block
//! left without a terminator, a duplicate symbol name).
//!
//! # Example
//!
//! ```rust
//! use ptrscope::ir::{ModuleBuilder, Type};
//!
//! let mut module = ModuleBuilder::new();
//! let answer = module.define("answer", vec![], Type::Int(32))?;
//! let mut f = module.body(answer)?;
//! f.block("entry");
//! let c = f.const_int(42);
//! f.ret(Some(c))?;
//! f.finish()?;
//! let module = module.finish()?;
//! assert_eq!(module.functions().len(), 1);
//! # Ok::<(), ptrscope::Error>(())
//! ```

use rustc_hash::FxHashMap;

use crate::{
    ir::{
        Block, BlockId, FuncId, Function, InstKind, Instruction, Module, Type, Value, ValueId,
        ValueKind,
    },
    Result,
};

/// Signature of a defined function awaiting its body.
#[derive(Debug)]
struct PendingFunc {
    name: String,
    value: ValueId,
    params: Vec<ValueId>,
    ret: Type,
}

/// Builds a [`Module`] value by value, function by function.
#[derive(Debug, Default)]
pub struct ModuleBuilder {
    values: Vec<Value>,
    functions: Vec<Option<Function>>,
    pending: FxHashMap<usize, PendingFunc>,
    by_name: FxHashMap<String, FuncId>,
    global_names: FxHashMap<String, ValueId>,
    globals: Vec<ValueId>,
    const_ints: FxHashMap<i64, ValueId>,
}

impl ModuleBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn intern(&mut self, value: Value) -> ValueId {
        let id = ValueId::new(self.values.len());
        self.values.push(value);
        id
    }

    /// Returns the interned value for an integer constant.
    pub fn const_int(&mut self, v: i64) -> ValueId {
        if let Some(&id) = self.const_ints.get(&v) {
            return id;
        }
        let id = self.intern(Value::new(None, Type::Int(64), ValueKind::ConstInt(v)));
        self.const_ints.insert(v, id);
        id
    }

    /// Returns a fresh null constant of the given pointer type.
    pub fn const_null(&mut self, ty: Type) -> ValueId {
        self.intern(Value::new(None, ty, ValueKind::ConstNull))
    }

    /// Adds a module-level global cell of the given pointee type.
    ///
    /// The resulting value is a pointer to the cell, as in any load/store IR.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if the name is already taken.
    pub fn global(&mut self, name: &str, pointee: Type) -> Result<ValueId> {
        if self.by_name.contains_key(name) || self.global_names.contains_key(name) {
            return Err(malformed_error!("duplicate symbol '{}'", name));
        }
        let id = self.intern(Value::new(
            Some(name.to_string()),
            Type::ptr(pointee),
            ValueKind::Global,
        ));
        self.global_names.insert(name.to_string(), id);
        self.globals.push(id);
        Ok(id)
    }

    /// Declares an external function (signature only, no body).
    ///
    /// Calls to declared functions are treated as opaque by the analyses and
    /// recorded by name only.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] on a duplicate name.
    pub fn declare(&mut self, name: &str, params: Vec<Type>, ret: Type) -> Result<ValueId> {
        let (func, value) = self.register(name, &params, ret.clone())?;
        let param_ids: Vec<ValueId> = params
            .iter()
            .enumerate()
            .map(|(index, ty)| {
                self.intern(Value::new(
                    None,
                    ty.clone(),
                    ValueKind::Argument { func, index },
                ))
            })
            .collect();
        self.functions[func.index()] = Some(Function::new(
            name.to_string(),
            value,
            param_ids,
            ret,
            Vec::new(),
        ));
        Ok(value)
    }

    /// Registers a function definition; emit its body later with
    /// [`body`](Self::body).
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] on a duplicate name.
    pub fn define(&mut self, name: &str, params: Vec<(&str, Type)>, ret: Type) -> Result<FuncId> {
        let types: Vec<Type> = params.iter().map(|(_, t)| t.clone()).collect();
        let (func, value) = self.register(name, &types, ret.clone())?;
        let param_ids: Vec<ValueId> = params
            .iter()
            .enumerate()
            .map(|(index, (pname, ty))| {
                self.intern(Value::new(
                    Some((*pname).to_string()),
                    ty.clone(),
                    ValueKind::Argument { func, index },
                ))
            })
            .collect();
        self.pending.insert(
            func.index(),
            PendingFunc {
                name: name.to_string(),
                value,
                params: param_ids,
                ret,
            },
        );
        Ok(func)
    }

    /// Starts emitting the body of a previously defined function.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if the function is unknown, is a
    /// declaration, or already has a body.
    pub fn body(&mut self, func: FuncId) -> Result<FunctionBuilder<'_>> {
        let Some(pending) = self.pending.remove(&func.index()) else {
            return Err(malformed_error!(
                "function {} has no pending definition",
                func
            ));
        };
        Ok(FunctionBuilder {
            module: self,
            func,
            pending,
            blocks: Vec::new(),
            current: None,
            line: 0,
        })
    }

    /// Looks up the value of a previously added function or global.
    #[must_use]
    pub fn symbol(&self, name: &str) -> Option<ValueId> {
        if let Some(func) = self.by_name.get(name) {
            return match self.functions[func.index()].as_ref() {
                Some(f) => Some(f.value()),
                None => self.pending.get(&func.index()).map(|p| p.value),
            };
        }
        self.global_names.get(name).copied()
    }

    /// Seals the builder into an immutable [`Module`].
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if a definition was registered but
    /// its body was never emitted.
    pub fn finish(self) -> Result<Module> {
        if let Some(pending) = self.pending.values().next() {
            return Err(malformed_error!(
                "function '{}' was defined but has no body",
                pending.name
            ));
        }
        let mut functions = Vec::with_capacity(self.functions.len());
        for (index, slot) in self.functions.into_iter().enumerate() {
            match slot {
                Some(f) => functions.push(f),
                None => {
                    return Err(malformed_error!(
                        "body of function {} was started but never committed",
                        FuncId::new(index)
                    ))
                }
            }
        }
        Ok(Module::new(
            self.values,
            functions,
            self.by_name,
            self.globals,
        ))
    }

    fn register(&mut self, name: &str, params: &[Type], ret: Type) -> Result<(FuncId, ValueId)> {
        if self.by_name.contains_key(name) || self.global_names.contains_key(name) {
            return Err(malformed_error!("duplicate symbol '{}'", name));
        }
        let func = FuncId::new(self.functions.len());
        self.functions.push(None);
        self.by_name.insert(name.to_string(), func);
        let value = self.intern(Value::new(
            Some(name.to_string()),
            Type::func(params.to_vec(), ret),
            ValueKind::Function(func),
        ));
        Ok((func, value))
    }
}

#[derive(Debug)]
struct BlockInProgress {
    label: Option<String>,
    insts: Vec<Instruction>,
}

impl BlockInProgress {
    fn is_terminated(&self) -> bool {
        self.insts.last().is_some_and(Instruction::is_terminator)
    }
}

/// Appends instructions to one function under construction.
///
/// Create blocks with [`block`](Self::block) (the first one becomes the
/// entry), move the cursor with [`switch_to`](Self::switch_to), and attach a
/// debug line to subsequently emitted instructions with [`at`](Self::at).
#[derive(Debug)]
pub struct FunctionBuilder<'m> {
    module: &'m mut ModuleBuilder,
    func: FuncId,
    pending: PendingFunc,
    blocks: Vec<BlockInProgress>,
    current: Option<usize>,
    line: u32,
}

impl FunctionBuilder<'_> {
    /// Returns the value of the function being built.
    #[must_use]
    pub const fn value(&self) -> ValueId {
        self.pending.value
    }

    /// Returns the value of the `index`-th formal parameter.
    #[must_use]
    pub fn param(&self, index: usize) -> ValueId {
        self.pending.params[index]
    }

    /// Returns the interned value for an integer constant.
    pub fn const_int(&mut self, v: i64) -> ValueId {
        self.module.const_int(v)
    }

    /// Returns a fresh null constant of the given pointer type.
    pub fn const_null(&mut self, ty: Type) -> ValueId {
        self.module.const_null(ty)
    }

    /// Looks up a previously added function or global by name.
    #[must_use]
    pub fn symbol(&self, name: &str) -> Option<ValueId> {
        self.module.symbol(name)
    }

    /// Sets the debug line attached to instructions emitted from here on.
    pub fn at(&mut self, line: u32) -> &mut Self {
        self.line = line;
        self
    }

    /// Creates a new, empty block, makes it current, and returns its id.
    ///
    /// The first block created is the function entry.
    pub fn block(&mut self, label: &str) -> BlockId {
        let id = BlockId::new(self.blocks.len());
        self.blocks.push(BlockInProgress {
            label: Some(label.to_string()),
            insts: Vec::new(),
        });
        self.current = Some(id.index());
        id
    }

    /// Moves the emission cursor to the given block.
    pub fn switch_to(&mut self, block: BlockId) {
        debug_assert!(block.index() < self.blocks.len());
        self.current = Some(block.index());
    }

    fn emit(&mut self, kind: InstKind) -> Result<()> {
        let Some(current) = self.current else {
            return Err(malformed_error!(
                "no active block in '{}'; call block() first",
                self.pending.name
            ));
        };
        let block = &mut self.blocks[current];
        if block.is_terminated() {
            return Err(malformed_error!(
                "block {} of '{}' already has a terminator",
                BlockId::new(current),
                self.pending.name
            ));
        }
        block.insts.push(Instruction::new(kind, self.line));
        Ok(())
    }

    fn local(&mut self, name: Option<&str>, ty: Type) -> ValueId {
        self.module
            .intern(Value::new(name.map(str::to_string), ty, ValueKind::Local))
    }

    /// Emits `alloca`, returning the pointer to the fresh cell.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if no block is active or the
    /// current block is closed.
    pub fn alloca(&mut self, name: &str, pointee: Type) -> Result<ValueId> {
        let result = self.local(Some(name), Type::ptr(pointee));
        self.emit(InstKind::Alloca { result })?;
        Ok(result)
    }

    /// Emits `store value, ptr`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if `ptr` is not pointer-typed or
    /// emission is impossible.
    pub fn store(&mut self, value: ValueId, ptr: ValueId) -> Result<()> {
        if !self.module.values[ptr.index()].is_pointer() {
            return Err(malformed_error!("store through non-pointer operand"));
        }
        self.emit(InstKind::Store { value, ptr })
    }

    /// Emits `load`, returning the loaded value.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if `ptr` has no pointee type or
    /// emission is impossible.
    pub fn load(&mut self, name: &str, ptr: ValueId) -> Result<ValueId> {
        let Some(pointee) = self.module.values[ptr.index()].ty().pointee().cloned() else {
            return Err(malformed_error!("load through non-pointer operand"));
        };
        let result = self.local(Some(name), pointee);
        self.emit(InstKind::Load { ptr, result })?;
        Ok(result)
    }

    /// Emits `gep`; the result aliases the base (indices are not modeled).
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if emission is impossible.
    pub fn gep(&mut self, name: &str, base: ValueId) -> Result<ValueId> {
        let ty = self.module.values[base.index()].ty().clone();
        let result = self.local(Some(name), ty);
        self.emit(InstKind::GetElementPtr { base, result })?;
        Ok(result)
    }

    /// Emits `bitcast` to the given type.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if emission is impossible.
    pub fn bitcast(&mut self, name: &str, src: ValueId, ty: Type) -> Result<ValueId> {
        let result = self.local(Some(name), ty);
        self.emit(InstKind::BitCast { src, result })?;
        Ok(result)
    }

    /// Emits `memcpy dst, src`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if emission is impossible.
    pub fn memcpy(&mut self, dst: ValueId, src: ValueId) -> Result<()> {
        self.emit(InstKind::MemCpy { dst, src })
    }

    /// Emits `memset dst`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if emission is impossible.
    pub fn memset(&mut self, dst: ValueId) -> Result<()> {
        self.emit(InstKind::MemSet { dst })
    }

    /// Emits a call. Returns the result value when the callee's return type
    /// is not `void`.
    ///
    /// The callee may be a function value or any pointer-typed temporary; the
    /// result type is taken from the callee's function type when visible and
    /// defaults to `i64` for fully opaque callees.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if emission is impossible.
    pub fn call(
        &mut self,
        name: Option<&str>,
        callee: ValueId,
        args: &[ValueId],
    ) -> Result<Option<ValueId>> {
        let callee_ty = self.module.values[callee.index()].ty();
        let ret = match callee_ty {
            Type::Func { ret, .. } => ret.as_ref().clone(),
            Type::Ptr(inner) => match inner.as_ref() {
                Type::Func { ret, .. } => ret.as_ref().clone(),
                _ => Type::Int(64),
            },
            _ => Type::Int(64),
        };
        let result = match ret {
            Type::Void => None,
            ty => Some(self.local(name, ty)),
        };
        self.emit(InstKind::Call {
            callee,
            args: args.to_vec(),
            result,
        })?;
        Ok(result)
    }

    /// Emits a generic non-pointer operation (arithmetic, comparison).
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if emission is impossible.
    pub fn other(
        &mut self,
        name: &str,
        mnemonic: &str,
        operands: &[ValueId],
        ty: Type,
    ) -> Result<ValueId> {
        let result = self.local(Some(name), ty);
        self.emit(InstKind::Other {
            mnemonic: mnemonic.to_string(),
            result: Some(result),
            operands: operands.to_vec(),
        })?;
        Ok(result)
    }

    /// Emits a debug metadata marker.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if emission is impossible.
    pub fn dbg(&mut self) -> Result<()> {
        self.emit(InstKind::DbgInfo)
    }

    /// Emits `ret`, terminating the current block.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if emission is impossible.
    pub fn ret(&mut self, value: Option<ValueId>) -> Result<()> {
        self.emit(InstKind::Return { value })
    }

    /// Emits an unconditional branch, terminating the current block.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if emission is impossible.
    pub fn br(&mut self, target: BlockId) -> Result<()> {
        self.emit(InstKind::Branch { target })
    }

    /// Emits a conditional branch, terminating the current block.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if emission is impossible.
    pub fn cond_br(&mut self, cond: ValueId, then_dest: BlockId, else_dest: BlockId) -> Result<()> {
        self.emit(InstKind::CondBranch {
            cond,
            then_dest,
            else_dest,
        })
    }

    /// Validates the body and commits the function to the module builder.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if the body is empty or any block
    /// lacks a terminator.
    pub fn finish(self) -> Result<ValueId> {
        if self.blocks.is_empty() {
            return Err(malformed_error!("function '{}' has no blocks", self.pending.name));
        }
        let mut blocks = Vec::with_capacity(self.blocks.len());
        for (index, block) in self.blocks.into_iter().enumerate() {
            if !block.is_terminated() {
                return Err(malformed_error!(
                    "block {} of '{}' has no terminator",
                    BlockId::new(index),
                    self.pending.name
                ));
            }
            blocks.push(Block::new(BlockId::new(index), block.label, block.insts));
        }
        self.module.functions[self.func.index()] = Some(Function::new(
            self.pending.name,
            self.pending.value,
            self.pending.params,
            self.pending.ret,
            blocks,
        ));
        Ok(self.pending.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_diamond() {
        let mut m = ModuleBuilder::new();
        let pick = m
            .define("pick", vec![("k", Type::Int(32))], Type::Int(32))
            .unwrap();
        let mut f = m.body(pick).unwrap();
        let k = f.param(0);
        let entry = f.block("entry");
        let then_b = f.block("then");
        let else_b = f.block("else");
        f.switch_to(entry);
        f.cond_br(k, then_b, else_b).unwrap();
        f.switch_to(then_b);
        let one = f.const_int(1);
        f.ret(Some(one)).unwrap();
        f.switch_to(else_b);
        let two = f.const_int(2);
        f.ret(Some(two)).unwrap();
        f.finish().unwrap();

        let module = m.finish().unwrap();
        let func = &module.functions()[0];
        assert_eq!(func.blocks().len(), 3);
        assert_eq!(func.exits().len(), 2);
        assert_eq!(func.predecessors(then_b), &[func.entry()]);
        assert_eq!(
            func.block(func.entry()).unwrap().successors(),
            vec![then_b, else_b]
        );
    }

    #[test]
    fn forward_references_between_functions() {
        let mut m = ModuleBuilder::new();
        let main = m.define("main", vec![], Type::Int(32)).unwrap();
        let helper = m.define("helper", vec![], Type::Int(32)).unwrap();

        let helper_value = m.symbol("helper").unwrap();
        let mut f = m.body(main).unwrap();
        f.block("entry");
        let r = f.call(Some("r"), helper_value, &[]).unwrap().unwrap();
        f.ret(Some(r)).unwrap();
        f.finish().unwrap();

        let mut f = m.body(helper).unwrap();
        f.block("entry");
        let c = f.const_int(0);
        f.ret(Some(c)).unwrap();
        f.finish().unwrap();

        let module = m.finish().unwrap();
        assert_eq!(module.functions().len(), 2);
    }

    #[test]
    fn unterminated_block_is_rejected() {
        let mut m = ModuleBuilder::new();
        let broken = m.define("broken", vec![], Type::Void).unwrap();
        let mut f = m.body(broken).unwrap();
        f.block("entry");
        f.alloca("x", Type::Int(32)).unwrap();
        assert!(f.finish().is_err());
    }

    #[test]
    fn missing_body_is_rejected() {
        let mut m = ModuleBuilder::new();
        m.define("nobody", vec![], Type::Void).unwrap();
        assert!(m.finish().is_err());
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut m = ModuleBuilder::new();
        m.declare("malloc", vec![Type::Int(64)], Type::ptr(Type::Int(8)))
            .unwrap();
        assert!(m
            .declare("malloc", vec![Type::Int(64)], Type::ptr(Type::Int(8)))
            .is_err());
    }

    #[test]
    fn constants_are_interned() {
        let mut m = ModuleBuilder::new();
        assert_eq!(m.const_int(7), m.const_int(7));
        assert_ne!(m.const_int(7), m.const_int(8));
    }
}
