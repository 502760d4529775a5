//! file: core/src/ir/lower/lowering_context.rs
//! description: module-wide state owned by one lowering run.
//!
//! Holds the module under construction, the options, the set of processed
//! imports and the signatures of user functions declared so far. Per
//! function state lives in `FunctionBuilder`.

use std::collections::{HashMap, HashSet};

use crate::config::CompileOptions;
use crate::ir::module::IrModule;
use crate::ir::types::IrType;

/// Callable signature of a user function.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSig {
    pub name: String,
    pub ret: IrType,
    pub params: Vec<IrType>,
}

#[derive(Debug)]
pub struct LoweringContext<'a> {
    pub module: IrModule,
    pub options: &'a CompileOptions,
    imports: HashSet<String>,
    functions: HashMap<String, FunctionSig>,
}

impl<'a> LoweringContext<'a> {
    pub fn new(options: &'a CompileOptions) -> Self {
        LoweringContext {
            module: IrModule::new(&options.module_name, options.target_triple.clone()),
            options,
            imports: HashSet::new(),
            functions: HashMap::new(),
        }
    }

    pub fn is_imported(&self, module_name: &str) -> bool {
        self.imports.contains(module_name)
    }

    pub fn mark_imported(&mut self, module_name: &str) {
        self.imports.insert(module_name.to_string());
    }

    pub fn declare_function(&mut self, sig: FunctionSig) {
        self.functions.insert(sig.name.clone(), sig);
    }

    pub fn lookup_function(&self, name: &str) -> Option<&FunctionSig> {
        self.functions.get(name)
    }

    pub fn into_module(self) -> IrModule {
        self.module
    }
}
