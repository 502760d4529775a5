//! file: core/src/ir/lower/mod.rs
//! description: `Program` AST -> `IrModule`.
//!
//! Top-level statements are partitioned into imports, function definitions
//! and loose statements. Imports declare their runtime functions first,
//! then each function is lowered in source order, then the loose statements
//! become the body of the synthesised entry point.
//!
pub mod declare_builtins;
pub mod err;
pub mod function_builder;
pub mod lower_expr;
pub mod lower_stmt;
pub mod lowering_context;

pub use err::{LoweringError, LoweringErrorKind};
pub use function_builder::{FunctionBuilder, Symbol};
pub use lowering_context::{FunctionSig, LoweringContext};

use log::{debug, warn};

use crate::ast::{AstNode, AstNodeKind};
use crate::config::CompileOptions;
use crate::ir::module::{IrModule, IrParam};
use crate::ir::op::Terminator;
use crate::ir::types::IrType;
use crate::ir::value::Value;

pub fn lower_program(ast: &AstNode, options: &CompileOptions) -> Result<IrModule, LoweringError> {
    let AstNodeKind::Program { body } = &ast.kind else {
        return Err(LoweringError::new(
            LoweringErrorKind::Invariant,
            format!("expected a program, found {}", ast.kind),
            Some(ast),
        ));
    };

    let mut ctx = LoweringContext::new(options);
    declare_builtins::declare_print_functions(&mut ctx.module);

    let mut functions = Vec::new();
    let mut loose = Vec::new();
    for stmt in body {
        match &stmt.kind {
            AstNodeKind::Import { module } => lower_import(module, stmt, &mut ctx)?,
            AstNodeKind::FunctionDef { .. } => functions.push(stmt),
            _ => loose.push(stmt),
        }
    }

    for function in functions {
        lower_function(function, &mut ctx)?;
    }

    if !loose.is_empty() {
        lower_entry_point(&loose, &mut ctx)?;
    }

    let module = ctx.into_module();
    module
        .verify()
        .map_err(|msg| LoweringError::invariant(msg).with_issuer("cscript.ir.lower.verify"))?;
    debug!(
        "lowered module '{}': {} function(s), {} external(s), {} string(s)",
        module.name,
        module.functions.len(),
        module.externals.len(),
        module.strings.len()
    );
    Ok(module)
}

fn lower_import(module: &str, node: &AstNode, ctx: &mut LoweringContext) -> Result<(), LoweringError> {
    if ctx.is_imported(module) {
        debug!("import '{}' repeated, ignoring", module);
        return Ok(());
    }
    if !declare_builtins::declare_import(&mut ctx.module, module) {
        return Err(LoweringError::new(
            LoweringErrorKind::UnknownImport,
            format!(
                "unknown module '{}' (available: {})",
                module,
                declare_builtins::IMPORTABLE_MODULES.join(", ")
            ),
            Some(node),
        ));
    }
    ctx.mark_imported(module);
    Ok(())
}

/// Close the current block with the function's implicit return.
fn finish_with_default_return(fb: &mut FunctionBuilder) -> Result<(), LoweringError> {
    if fb.is_terminated() {
        return Ok(());
    }
    let value = Value::zero(fb.ret());
    fb.terminate(Terminator::Ret { value })
}

fn lower_function(node: &AstNode, ctx: &mut LoweringContext) -> Result<(), LoweringError> {
    let AstNodeKind::FunctionDef {
        name,
        params,
        return_type,
        body,
    } = &node.kind
    else {
        return Err(LoweringError::invariant(format!("expected a function, found {}", node.kind)));
    };

    if declare_builtins::is_runtime_name(name) || ctx.lookup_function(name).is_some() {
        return Err(LoweringError::new(
            LoweringErrorKind::DuplicateFunction,
            format!("function '{}' is already defined", name),
            Some(node),
        ));
    }

    let mut ir_params = Vec::with_capacity(params.len());
    for param in params {
        let ty = lower_stmt::storage_type(&param.ty, &format!("parameter '{}'", param.name), node)?;
        ir_params.push(IrParam {
            name: param.name.clone(),
            ty,
        });
    }
    let ret = IrType::from_type_name(return_type);

    // Declared before the body so the function can call itself.
    ctx.declare_function(FunctionSig {
        name: name.clone(),
        ret: ret.clone(),
        params: ir_params.iter().map(|p| p.ty.clone()).collect(),
    });

    let mut fb = FunctionBuilder::new(name, ret, ir_params.clone());
    for (index, param) in ir_params.into_iter().enumerate() {
        let slot = fb.alloca(param.ty.clone());
        fb.store(
            Value::Arg {
                index,
                ty: param.ty.clone(),
            },
            slot.clone(),
        );
        fb.declare(&param.name, Symbol { slot, ty: param.ty });
    }

    lower_stmt::lower_block(body, ctx, &mut fb)?;
    finish_with_default_return(&mut fb)?;
    fb.finalize_into(&mut ctx.module)?;
    debug!("lowered function '{}'", name);
    Ok(())
}

fn lower_entry_point(stmts: &[&AstNode], ctx: &mut LoweringContext) -> Result<(), LoweringError> {
    let entry = ctx.options.entry_point.clone();
    if ctx.lookup_function(&entry).is_some() {
        if ctx.options.strict_entry_point {
            return Err(LoweringError::new(
                LoweringErrorKind::EntryPointConflict,
                format!(
                    "function '{}' collides with the entry point built from {} top-level statement(s)",
                    entry,
                    stmts.len()
                ),
                Some(stmts[0]),
            ));
        }
        warn!(
            "function '{}' already defined; {} top-level statement(s) are not emitted",
            entry,
            stmts.len()
        );
        return Ok(());
    }

    let mut fb = FunctionBuilder::new(&entry, IrType::I32, Vec::new());
    for stmt in stmts {
        lower_stmt::lower_stmt(stmt, ctx, &mut fb)?;
    }
    if !fb.is_terminated() {
        fb.terminate(Terminator::Ret {
            value: Some(Value::i32(0)),
        })?;
    }
    fb.finalize_into(&mut ctx.module)?;
    debug!("synthesised entry point '{}' from {} statement(s)", entry, stmts.len());
    Ok(())
}
