use std::collections::HashMap;

use log::trace;

use crate::ir::module::{BasicBlock, IrFunction, IrModule, IrParam};
use crate::ir::op::{IROp, Register, Terminator};
use crate::ir::types::IrType;
use crate::ir::value::Value;

use super::err::LoweringError;

/// A named storage slot. `slot` is the `alloca` pointer, `ty` the stored type.
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub slot: Value,
    pub ty: IrType,
}

/// Per-function lowering state: register and label counters, the block
/// list with its insertion point, and the function's flat symbol table.
/// Allocas are collected separately and placed at the top of the entry
/// block when the function is finalized.
pub struct FunctionBuilder {
    name: String,
    ret: IrType,
    params: Vec<IrParam>,
    blocks: Vec<BasicBlock>,
    current: usize,
    allocas: Vec<IROp>,
    symbols: HashMap<String, Symbol>,
    next_reg: Register,
    next_label: usize,
}

impl FunctionBuilder {
    pub fn new(name: &str, ret: IrType, params: Vec<IrParam>) -> Self {
        FunctionBuilder {
            name: name.to_string(),
            ret,
            params,
            blocks: vec![BasicBlock::new("entry")],
            current: 0,
            allocas: Vec::new(),
            symbols: HashMap::new(),
            next_reg: 0,
            next_label: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ret(&self) -> &IrType {
        &self.ret
    }

    pub fn alloc_reg(&mut self) -> Register {
        let r = self.next_reg;
        self.next_reg += 1;
        r
    }

    /// Label unique within this function, e.g. `then3`.
    pub fn fresh_label(&mut self, prefix: &str) -> String {
        let label = format!("{}{}", prefix, self.next_label);
        self.next_label += 1;
        label
    }

    /// Append a block and move the insertion point into it.
    pub fn start_block(&mut self, label: &str) {
        trace!("{}: start block {}", self.name, label);
        self.blocks.push(BasicBlock::new(label));
        self.current = self.blocks.len() - 1;
    }

    pub fn current_label(&self) -> &str {
        &self.blocks[self.current].label
    }

    pub fn is_terminated(&self) -> bool {
        self.blocks[self.current].is_terminated()
    }

    /// Code after a terminator goes into a fresh, unreachable block.
    pub fn ensure_open(&mut self) {
        if self.is_terminated() {
            let label = self.fresh_label("dead");
            self.start_block(&label);
        }
    }

    pub fn emit(&mut self, op: IROp) {
        self.blocks[self.current].ops.push(op);
    }

    /// Emit an op producing a value of type `ty` into a fresh register.
    pub fn emit_value(&mut self, ty: IrType, build: impl FnOnce(Register) -> IROp) -> Value {
        let dest = self.alloc_reg();
        let op = build(dest);
        self.emit(op);
        Value::Reg { id: dest, ty }
    }

    /// Stack slot for `ty`; the returned pointer is usable anywhere in the
    /// function.
    pub fn alloca(&mut self, ty: IrType) -> Value {
        let dest = self.alloc_reg();
        self.allocas.push(IROp::Alloca {
            dest,
            ty: ty.clone(),
        });
        Value::Reg {
            id: dest,
            ty: ty.ptr_to(),
        }
    }

    pub fn load(&mut self, ptr: Value) -> Result<Value, LoweringError> {
        let ty = ptr
            .ty()
            .pointee()
            .cloned()
            .ok_or_else(|| LoweringError::invariant(format!("load through non-pointer {}", ptr.typed())))?;
        Ok(self.emit_value(ty.clone(), |dest| IROp::Load { dest, ty, ptr }))
    }

    pub fn store(&mut self, value: Value, ptr: Value) {
        self.emit(IROp::Store { value, ptr });
    }

    /// Void calls produce no value.
    pub fn call(&mut self, callee: &str, ret: IrType, args: Vec<Value>) -> Option<Value> {
        if ret == IrType::Void {
            self.emit(IROp::Call {
                dest: None,
                callee: callee.to_string(),
                ret,
                args,
            });
            return None;
        }
        let callee = callee.to_string();
        Some(self.emit_value(ret.clone(), |dest| IROp::Call {
            dest: Some(dest),
            callee,
            ret,
            args,
        }))
    }

    pub fn terminate(&mut self, terminator: Terminator) -> Result<(), LoweringError> {
        self.blocks[self.current]
            .terminate(terminator)
            .map_err(LoweringError::invariant)
    }

    pub fn branch(&mut self, target: &str) -> Result<(), LoweringError> {
        self.terminate(Terminator::Br {
            target: target.to_string(),
        })
    }

    /// Branch only when the current block is still open.
    pub fn branch_if_open(&mut self, target: &str) -> Result<(), LoweringError> {
        if self.is_terminated() {
            return Ok(());
        }
        self.branch(target)
    }

    /// Flat scope: a redeclaration replaces the earlier entry.
    pub fn declare(&mut self, name: &str, symbol: Symbol) {
        self.symbols.insert(name.to_string(), symbol);
    }

    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    /// Move the finished function into `module`.
    pub fn finalize_into(self, module: &mut IrModule) -> Result<(), LoweringError> {
        let FunctionBuilder {
            name,
            ret,
            params,
            mut blocks,
            allocas,
            ..
        } = self;

        if let Some(block) = blocks.iter().find(|b| !b.is_terminated()) {
            return Err(LoweringError::invariant(format!(
                "block '{}' in function '{}' has no terminator",
                block.label, name
            )));
        }

        let entry = &mut blocks[0];
        let body = std::mem::take(&mut entry.ops);
        entry.ops = allocas;
        entry.ops.extend(body);

        trace!("{}: finalized with {} block(s)", name, blocks.len());
        module.add_function(IrFunction {
            name,
            ret,
            params,
            blocks,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocas_are_hoisted_into_entry() {
        let mut fb = FunctionBuilder::new("f", IrType::Void, Vec::new());
        fb.branch("next").unwrap();
        fb.start_block("next");
        let slot = fb.alloca(IrType::I32);
        fb.store(Value::i32(1), slot);
        fb.terminate(Terminator::Ret { value: None }).unwrap();

        let mut module = IrModule::new("m", None);
        fb.finalize_into(&mut module).unwrap();
        let f = module.find_function("f").unwrap();
        assert!(matches!(f.blocks[0].ops[0], IROp::Alloca { .. }));
        assert_eq!(f.blocks[1].ops.len(), 1);
    }

    #[test]
    fn double_termination_is_an_invariant_error() {
        let mut fb = FunctionBuilder::new("f", IrType::Void, Vec::new());
        fb.terminate(Terminator::Ret { value: None }).unwrap();
        assert!(fb.branch("x").is_err());
        assert!(fb.branch_if_open("x").is_ok());
    }

    #[test]
    fn open_block_fails_finalize() {
        let fb = FunctionBuilder::new("f", IrType::Void, Vec::new());
        let mut module = IrModule::new("m", None);
        assert!(fb.finalize_into(&mut module).is_err());
        assert!(module.functions.is_empty());
    }

    #[test]
    fn ensure_open_starts_a_fresh_block_after_return() {
        let mut fb = FunctionBuilder::new("f", IrType::Void, Vec::new());
        fb.terminate(Terminator::Ret { value: None }).unwrap();
        fb.ensure_open();
        assert!(!fb.is_terminated());
        assert_ne!(fb.current_label(), "entry");
    }
}
