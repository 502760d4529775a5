//! Lowering for statement nodes.
//!
//! Control flow builds its blocks through the `FunctionBuilder`; every arm
//! that may fall through gets its branch only when the block is still open.

use crate::ast::{AstNode, AstNodeKind};
use crate::ir::op::Terminator;
use crate::ir::types::IrType;

use super::err::{LoweringError, LoweringErrorKind};
use super::function_builder::{FunctionBuilder, Symbol};
use super::lower_expr::{coerce_value, lower_call, lower_condition, lower_expr, lower_lvalue};
use super::lowering_context::LoweringContext;

pub(crate) fn lower_block(
    stmts: &[AstNode],
    ctx: &mut LoweringContext,
    fb: &mut FunctionBuilder,
) -> Result<(), LoweringError> {
    for stmt in stmts {
        lower_stmt(stmt, ctx, fb)?;
    }
    Ok(())
}

/// Storage type for a declaration; `void` has none.
pub(crate) fn storage_type(
    ty: &crate::ast::TypeName,
    what: &str,
    node: &AstNode,
) -> Result<IrType, LoweringError> {
    let ir_ty = IrType::from_type_name(ty);
    if ir_ty == IrType::Void {
        return Err(LoweringError::new(
            LoweringErrorKind::UnknownType,
            format!("{} cannot have type void", what),
            Some(node),
        ));
    }
    Ok(ir_ty)
}

pub(crate) fn lower_stmt(
    node: &AstNode,
    ctx: &mut LoweringContext,
    fb: &mut FunctionBuilder,
) -> Result<(), LoweringError> {
    fb.ensure_open();

    match &node.kind {
        AstNodeKind::VarDecl { ty, name, value } => {
            let slot_ty = storage_type(ty, &format!("variable '{}'", name), node)?;
            // The initializer cannot see the name it initializes.
            let init = lower_expr(value, ctx, fb)?;
            let init = coerce_value(init, &slot_ty, value, fb)?;
            let slot = fb.alloca(slot_ty.clone());
            fb.store(init, slot.clone());
            fb.declare(name, Symbol { slot, ty: slot_ty });
            Ok(())
        }
        AstNodeKind::ArrayDecl {
            element_type,
            name,
            length,
        } => {
            let elem = storage_type(element_type, &format!("elements of array '{}'", name), node)?;
            let ty = elem.array_of(*length);
            let slot = fb.alloca(ty.clone());
            fb.declare(name, Symbol { slot, ty });
            Ok(())
        }
        AstNodeKind::Assign { target, value } => {
            let address = lower_lvalue(target, ctx, fb)?;
            let rhs = lower_expr(value, ctx, fb)?;
            let Some(slot_ty) = address.ty().pointee().cloned() else {
                return Err(LoweringError::invariant("assignment target is not an address"));
            };
            let rhs = coerce_value(rhs, &slot_ty, value, fb)?;
            fb.store(rhs, address);
            Ok(())
        }
        AstNodeKind::ExprStmt { expr } => lower_stmt(expr, ctx, fb),
        AstNodeKind::If {
            condition,
            then_body,
            else_body,
        } => {
            let cond = lower_condition(condition, ctx, fb)?;
            let then_label = fb.fresh_label("then");
            let else_label = fb.fresh_label("else");
            let merge_label = fb.fresh_label("ifcont");
            fb.terminate(Terminator::CondBr {
                cond,
                then_label: then_label.clone(),
                else_label: else_label.clone(),
            })?;

            fb.start_block(&then_label);
            lower_block(then_body, ctx, fb)?;
            fb.branch_if_open(&merge_label)?;

            fb.start_block(&else_label);
            if let Some(else_body) = else_body {
                lower_block(else_body, ctx, fb)?;
            }
            fb.branch_if_open(&merge_label)?;

            fb.start_block(&merge_label);
            Ok(())
        }
        AstNodeKind::While { condition, body } => {
            let cond_label = fb.fresh_label("whilecond");
            let body_label = fb.fresh_label("whilebody");
            let end_label = fb.fresh_label("whileend");
            fb.branch(&cond_label)?;

            fb.start_block(&cond_label);
            let cond = lower_condition(condition, ctx, fb)?;
            fb.terminate(Terminator::CondBr {
                cond,
                then_label: body_label.clone(),
                else_label: end_label.clone(),
            })?;

            fb.start_block(&body_label);
            lower_block(body, ctx, fb)?;
            fb.branch_if_open(&cond_label)?;

            fb.start_block(&end_label);
            Ok(())
        }
        AstNodeKind::For {
            init,
            condition,
            update,
            body,
        } => {
            lower_stmt(init, ctx, fb)?;
            let cond_label = fb.fresh_label("forcond");
            let body_label = fb.fresh_label("forbody");
            let end_label = fb.fresh_label("forend");
            fb.branch(&cond_label)?;

            fb.start_block(&cond_label);
            let cond = lower_condition(condition, ctx, fb)?;
            fb.terminate(Terminator::CondBr {
                cond,
                then_label: body_label.clone(),
                else_label: end_label.clone(),
            })?;

            fb.start_block(&body_label);
            lower_block(body, ctx, fb)?;
            if !fb.is_terminated() {
                lower_stmt(update, ctx, fb)?;
                fb.branch(&cond_label)?;
            }

            fb.start_block(&end_label);
            Ok(())
        }
        AstNodeKind::Return { value } => {
            let ret = fb.ret().clone();
            let value = match (value, &ret) {
                (None, IrType::Void) => None,
                (Some(v), IrType::Void) => {
                    return Err(LoweringError::new(
                        LoweringErrorKind::TypeMismatch,
                        format!("void function '{}' cannot return a value", fb.name()),
                        Some(v),
                    ));
                }
                (None, ty) => {
                    return Err(LoweringError::new(
                        LoweringErrorKind::TypeMismatch,
                        format!("function '{}' must return a value of type {}", fb.name(), ty.describe()),
                        Some(node),
                    ));
                }
                (Some(v), ty) => {
                    let lowered = lower_expr(v, ctx, fb)?;
                    Some(coerce_value(lowered, ty, v, fb)?)
                }
            };
            fb.terminate(Terminator::Ret { value })
        }
        AstNodeKind::FunctionDef { name, .. } => Err(LoweringError::new(
            LoweringErrorKind::Invariant,
            format!("function '{}' cannot be defined inside another function", name),
            Some(node),
        )),
        AstNodeKind::Import { module } => Err(LoweringError::new(
            LoweringErrorKind::Invariant,
            format!("'import {}' is only allowed at top level", module),
            Some(node),
        )),
        AstNodeKind::Program { .. } => Err(LoweringError::new(
            LoweringErrorKind::Invariant,
            "nested program node",
            Some(node),
        )),
        // Evaluated for effect; a void call is fine here.
        AstNodeKind::FuncCall { name, args } => lower_call(name, args, node, ctx, fb).map(|_| ()),
        AstNodeKind::BinOp { .. }
        | AstNodeKind::UnaryOp { .. }
        | AstNodeKind::ArrayAccess { .. }
        | AstNodeKind::Identifier { .. }
        | AstNodeKind::String { .. }
        | AstNodeKind::Number { .. }
        | AstNodeKind::Float { .. } => lower_expr(node, ctx, fb).map(|_| ()),
    }
}
