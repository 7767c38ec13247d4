//! Textual rendering of modules, mirroring the input format of [`super::parse`].

use std::fmt;

use crate::ir::{Function, InstKind, Instruction, Module, Type, ValueKind};

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Void => write!(f, "void"),
            Type::Int(bits) => write!(f, "i{bits}"),
            Type::Ptr(inner) => write!(f, "ptr {inner}"),
            Type::Func { params, ret } => {
                write!(f, "fn(")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{p}")?;
                }
                write!(f, ") -> {ret}")
            }
        }
    }
}

impl Module {
    fn fmt_operand(&self, f: &mut fmt::Formatter<'_>, id: crate::ir::ValueId) -> fmt::Result {
        let value = self.value(id);
        match value.kind() {
            ValueKind::ConstInt(v) => write!(f, "{v}"),
            ValueKind::ConstNull => write!(f, "null"),
            ValueKind::Function(_) | ValueKind::Global => match value.name() {
                Some(name) => write!(f, "@{name}"),
                None => write!(f, "@{id}"),
            },
            ValueKind::Argument { .. } | ValueKind::Local => match value.name() {
                Some(name) => write!(f, "%{name}"),
                None => write!(f, "%{id}"),
            },
        }
    }

    fn fmt_instruction(&self, f: &mut fmt::Formatter<'_>, func: &Function, inst: &Instruction) -> fmt::Result {
        write!(f, "  ")?;
        match inst.kind() {
            InstKind::Alloca { result } => {
                self.fmt_operand(f, *result)?;
                let pointee = self
                    .value(*result)
                    .ty()
                    .pointee()
                    .cloned()
                    .unwrap_or(Type::Void);
                write!(f, " = alloca {pointee}")?;
            }
            InstKind::Store { value, ptr } => {
                write!(f, "store ")?;
                self.fmt_operand(f, *value)?;
                write!(f, ", ")?;
                self.fmt_operand(f, *ptr)?;
            }
            InstKind::Load { ptr, result } => {
                self.fmt_operand(f, *result)?;
                write!(f, " = load ")?;
                self.fmt_operand(f, *ptr)?;
            }
            InstKind::GetElementPtr { base, result } => {
                self.fmt_operand(f, *result)?;
                write!(f, " = gep ")?;
                self.fmt_operand(f, *base)?;
            }
            InstKind::BitCast { src, result } => {
                self.fmt_operand(f, *result)?;
                write!(f, " = bitcast ")?;
                self.fmt_operand(f, *src)?;
                write!(f, " to {}", self.value(*result).ty())?;
            }
            InstKind::MemCpy { dst, src } => {
                write!(f, "memcpy ")?;
                self.fmt_operand(f, *dst)?;
                write!(f, ", ")?;
                self.fmt_operand(f, *src)?;
            }
            InstKind::MemSet { dst } => {
                write!(f, "memset ")?;
                self.fmt_operand(f, *dst)?;
            }
            InstKind::Call {
                callee,
                args,
                result,
            } => {
                if let Some(result) = result {
                    self.fmt_operand(f, *result)?;
                    write!(f, " = ")?;
                }
                write!(f, "call ")?;
                self.fmt_operand(f, *callee)?;
                write!(f, "(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    self.fmt_operand(f, *arg)?;
                }
                write!(f, ")")?;
            }
            InstKind::Return { value } => {
                write!(f, "ret")?;
                if let Some(value) = value {
                    write!(f, " ")?;
                    self.fmt_operand(f, *value)?;
                }
            }
            InstKind::Branch { target } => {
                let label = func
                    .block(*target)
                    .and_then(|b| b.label())
                    .map_or_else(|| target.to_string(), str::to_string);
                write!(f, "br {label}")?;
            }
            InstKind::CondBranch {
                cond,
                then_dest,
                else_dest,
            } => {
                write!(f, "condbr ")?;
                self.fmt_operand(f, *cond)?;
                let then_label = func
                    .block(*then_dest)
                    .and_then(|b| b.label())
                    .map_or_else(|| then_dest.to_string(), str::to_string);
                let else_label = func
                    .block(*else_dest)
                    .and_then(|b| b.label())
                    .map_or_else(|| else_dest.to_string(), str::to_string);
                write!(f, ", {then_label}, {else_label}")?;
            }
            InstKind::DbgInfo => write!(f, "dbg")?,
            InstKind::Other {
                mnemonic,
                result,
                operands,
            } => {
                if let Some(result) = result {
                    self.fmt_operand(f, *result)?;
                    write!(f, " = ")?;
                }
                write!(f, "{mnemonic}")?;
                for (i, op) in operands.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, " ")?;
                    self.fmt_operand(f, *op)?;
                }
            }
        }
        if inst.line() != 0 {
            write!(f, " !line {}", inst.line())?;
        }
        writeln!(f)
    }

    fn fmt_function(&self, f: &mut fmt::Formatter<'_>, func: &Function) -> fmt::Result {
        if func.is_declaration() {
            write!(f, "declare @{}(", func.name())?;
            for (i, &param) in func.params().iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", self.value(param).ty())?;
            }
            return writeln!(f, ") -> {}", func.return_type());
        }

        write!(f, "func @{}(", func.name())?;
        for (i, &param) in func.params().iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} ", self.value(param).ty())?;
            self.fmt_operand(f, param)?;
        }
        writeln!(f, ") -> {} {{", func.return_type())?;
        for block in func.blocks() {
            match block.label() {
                Some(label) => writeln!(f, "{label}:")?,
                None => writeln!(f, "{}:", block.id())?,
            }
            for inst in block.instructions() {
                self.fmt_instruction(f, func, inst)?;
            }
        }
        writeln!(f, "}}")
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for &global in self.globals() {
            let pointee = self
                .value(global)
                .ty()
                .pointee()
                .cloned()
                .unwrap_or(Type::Void);
            writeln!(f, "global @{} {}", self.value_name(global), pointee)?;
            first = false;
        }
        for func in self.functions() {
            if !first {
                writeln!(f)?;
            }
            self.fmt_function(f, func)?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::ir::parse;

    #[test]
    fn dump_parses_back() {
        let text = "declare @malloc(i64) -> ptr i8\n\
             func @plus(i32 %a, i32 %b) -> i32 {\n\
             entry:\n\
             \x20 %s = add %a, %b\n\
             \x20 ret %s\n\
             }\n\
             func @main() -> i32 {\n\
             entry:\n\
             \x20 %fp = alloca fn(i32, i32) -> i32\n\
             \x20 store @plus, %fp !line 6\n\
             \x20 %f = load %fp\n\
             \x20 %r = call %f(1, 2) !line 7\n\
             \x20 ret %r\n\
             }\n";
        let module = parse(text).unwrap();
        let dumped = module.to_string();
        let reparsed = parse(&dumped).expect("dump should parse back");
        assert_eq!(reparsed.functions().len(), module.functions().len());
        assert_eq!(reparsed.to_string(), dumped);
    }
}
