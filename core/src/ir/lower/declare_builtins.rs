//! file: core/src/ir/lower/declare_builtins.rs
//! description: the fixed runtime support surface.
//!
//! `print` is always available; the three print entry points are declared
//! up front. File and OS primitives are only declared by their import and
//! calling them without it is an error.
//!
use crate::ir::module::{ExternDecl, IrModule};
use crate::ir::types::IrType;

pub(crate) const PRINT_INT: &str = "cscript_print_int";
pub(crate) const PRINT_FLOAT: &str = "cscript_print_float";
pub(crate) const PRINT_STRING: &str = "cscript_print_string";

/// (source name, import module, runtime symbol)
const GATED_FUNCTIONS: &[(&str, &str, &str)] = &[
    ("fopen", "file", "cscript_fopen"),
    ("fwrite", "file", "cscript_fwrite"),
    ("fread", "file", "cscript_fread"),
    ("fclose", "file", "cscript_fclose"),
    ("system", "os", "cscript_system"),
    ("getenv", "os", "cscript_getenv"),
];

pub const IMPORTABLE_MODULES: &[&str] = &["file", "os"];

fn text() -> IrType {
    IrType::I8.ptr_to()
}

/// Signature of a runtime entry point by symbol.
pub(crate) fn runtime_decl(symbol: &str) -> Option<ExternDecl> {
    let decl = match symbol {
        PRINT_INT => ExternDecl::new(symbol, IrType::Void, vec![IrType::I32]),
        PRINT_FLOAT => ExternDecl::new(symbol, IrType::Void, vec![IrType::F32]),
        PRINT_STRING => ExternDecl::new(symbol, IrType::Void, vec![text()]),
        "cscript_fopen" => ExternDecl::new(symbol, IrType::I32, vec![text(), text()]),
        "cscript_fwrite" => ExternDecl::new(symbol, IrType::I32, vec![IrType::I32, text()]),
        "cscript_fread" => ExternDecl::new(symbol, text(), vec![IrType::I32, IrType::I32]),
        "cscript_fclose" => ExternDecl::new(symbol, IrType::I32, vec![IrType::I32]),
        "cscript_system" => ExternDecl::new(symbol, IrType::I32, vec![text()]),
        "cscript_getenv" => ExternDecl::new(symbol, text(), vec![text()]),
        _ => return None,
    };
    Some(decl)
}

pub(crate) fn declare_print_functions(module: &mut IrModule) {
    for symbol in [PRINT_INT, PRINT_FLOAT, PRINT_STRING] {
        if let Some(decl) = runtime_decl(symbol) {
            module.declare_external(decl);
        }
    }
}

/// Declare everything `module_name` exposes. `false` for an unknown module.
pub(crate) fn declare_import(module: &mut IrModule, module_name: &str) -> bool {
    if !IMPORTABLE_MODULES.contains(&module_name) {
        return false;
    }
    for (_, _, symbol) in GATED_FUNCTIONS.iter().filter(|(_, m, _)| *m == module_name) {
        if let Some(decl) = runtime_decl(symbol) {
            module.declare_external(decl);
        }
    }
    true
}

/// `(import module, runtime symbol)` for an import-gated source name.
pub(crate) fn gated_function(name: &str) -> Option<(&'static str, &'static str)> {
    GATED_FUNCTIONS
        .iter()
        .find(|(source, _, _)| *source == name)
        .map(|(_, module, symbol)| (*module, *symbol))
}

/// Names a user function may not take.
pub(crate) fn is_runtime_name(name: &str) -> bool {
    name == "print" || gated_function(name).is_some() || runtime_decl(name).is_some()
}
