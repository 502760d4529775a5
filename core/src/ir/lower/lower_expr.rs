//! file: core/src/ir/lower/lower_expr.rs
//! description: expression lowering.
//!
//! Expressions lower to a `Value`. Variables live in stack slots, so reading
//! one is a load, and lvalues lower to the slot pointer itself. Integer
//! arithmetic happens at `i32`, comparisons are widened back to `i32`.
//!
use crate::ast::{AstNode, AstNodeKind, BinaryOperator, UnaryOperator};
use crate::ir::op::{BinaryKind, CastKind, FCmpPredicate, ICmpPredicate, IROp};
use crate::ir::types::IrType;
use crate::ir::value::Value;

use super::declare_builtins::{self, PRINT_FLOAT, PRINT_INT, PRINT_STRING};
use super::err::{LoweringError, LoweringErrorKind};
use super::function_builder::FunctionBuilder;
use super::lowering_context::LoweringContext;

pub(crate) fn lower_expr(
    node: &AstNode,
    ctx: &mut LoweringContext,
    fb: &mut FunctionBuilder,
) -> Result<Value, LoweringError> {
    match &node.kind {
        AstNodeKind::Number { value } => Ok(Value::i32(i64::from(*value))),
        AstNodeKind::Float { value } => Ok(Value::ConstFloat { value: *value }),
        AstNodeKind::String { value } => {
            let global = ctx.module.intern_string(value);
            let base_ty = global.ty();
            let base = global.address();
            Ok(fb.emit_value(IrType::I8.ptr_to(), |dest| IROp::Gep {
                dest,
                base_ty,
                base,
                indices: vec![Value::i32(0), Value::i32(0)],
            }))
        }
        AstNodeKind::Identifier { name } => {
            let symbol = lookup_symbol(name, node, fb)?;
            if symbol.ty.is_array() {
                return Ok(decay_array(symbol.slot, symbol.ty, fb));
            }
            fb.load(symbol.slot)
        }
        AstNodeKind::BinOp { left, op, right } => lower_binary(left, *op, right, node, ctx, fb),
        AstNodeKind::UnaryOp {
            op: UnaryOperator::AddressOf,
            operand,
        } => lower_address_of(operand, ctx, fb),
        AstNodeKind::UnaryOp {
            op: UnaryOperator::Deref,
            operand,
        } => {
            let ptr = lower_pointer(operand, "dereference", ctx, fb)?;
            match ptr.ty().pointee() {
                Some(array @ IrType::Array(..)) => {
                    let array = array.clone();
                    Ok(decay_array(ptr, array, fb))
                }
                _ => fb.load(ptr),
            }
        }
        AstNodeKind::FuncCall { name, args } => lower_call(name, args, node, ctx, fb)?.ok_or_else(|| {
            LoweringError::new(
                LoweringErrorKind::VoidValue,
                format!("call to '{}' returns void and cannot be used as a value", name),
                Some(node),
            )
        }),
        AstNodeKind::ArrayAccess { name, index } => {
            let address = lower_element_address(name, index, node, ctx, fb)?;
            fb.load(address)
        }
        AstNodeKind::Program { .. }
        | AstNodeKind::Import { .. }
        | AstNodeKind::FunctionDef { .. }
        | AstNodeKind::VarDecl { .. }
        | AstNodeKind::ArrayDecl { .. }
        | AstNodeKind::Assign { .. }
        | AstNodeKind::ExprStmt { .. }
        | AstNodeKind::If { .. }
        | AstNodeKind::While { .. }
        | AstNodeKind::For { .. }
        | AstNodeKind::Return { .. } => Err(LoweringError::new(
            LoweringErrorKind::Invariant,
            format!("{} used as an expression", node.kind),
            Some(node),
        )),
    }
}

fn lookup_symbol(
    name: &str,
    node: &AstNode,
    fb: &FunctionBuilder,
) -> Result<super::function_builder::Symbol, LoweringError> {
    fb.lookup(name).cloned().ok_or_else(|| {
        LoweringError::new(
            LoweringErrorKind::UndefinedSymbol,
            format!("undefined variable '{}'", name),
            Some(node),
        )
    })
}

/// Pointer to the first element of the array behind `slot`.
fn decay_array(slot: Value, array_ty: IrType, fb: &mut FunctionBuilder) -> Value {
    let elem = array_ty.element().cloned().unwrap_or(IrType::I8);
    fb.emit_value(elem.ptr_to(), |dest| IROp::Gep {
        dest,
        base_ty: array_ty,
        base: slot,
        indices: vec![Value::i32(0), Value::i32(0)],
    })
}

/// Lower `node` and require a pointer result.
fn lower_pointer(
    node: &AstNode,
    what: &str,
    ctx: &mut LoweringContext,
    fb: &mut FunctionBuilder,
) -> Result<Value, LoweringError> {
    let value = lower_expr(node, ctx, fb)?;
    if !value.ty().is_pointer() {
        return Err(LoweringError::new(
            LoweringErrorKind::TypeMismatch,
            format!("cannot {} a value of type {}", what, value.ty().describe()),
            Some(node),
        ));
    }
    Ok(value)
}

/// Store-side conversion of `value` to `to`.
pub(crate) fn coerce_value(
    value: Value,
    to: &IrType,
    node: &AstNode,
    fb: &mut FunctionBuilder,
) -> Result<Value, LoweringError> {
    let from = value.ty();
    if from == *to {
        return Ok(value);
    }

    if let (Some(from_w), Some(to_w)) = (from.int_width(), to.int_width()) {
        if let Value::ConstInt { value: v, .. } = value {
            return Ok(Value::int(to.clone(), wrap_to_width(v, to_w)));
        }
        let kind = if to_w < from_w {
            CastKind::Trunc
        } else if from_w == 1 {
            CastKind::ZExt
        } else {
            CastKind::SExt
        };
        return Ok(cast(kind, value, to, fb));
    }

    if from.is_pointer() && to.is_integer() {
        return Ok(cast(CastKind::PtrToInt, value, to, fb));
    }

    if from.is_pointer() && to.is_pointer() {
        return Ok(cast(CastKind::BitCast, value, to, fb));
    }

    Err(LoweringError::new(
        LoweringErrorKind::TypeMismatch,
        format!("cannot convert {} to {}", from.describe(), to.describe()),
        Some(node),
    ))
}

fn wrap_to_width(value: i64, width: u32) -> i64 {
    match width {
        1 => value & 1,
        8 => i64::from(value as i8),
        32 => i64::from(value as i32),
        _ => value,
    }
}

fn cast(kind: CastKind, value: Value, to: &IrType, fb: &mut FunctionBuilder) -> Value {
    let to = to.clone();
    fb.emit_value(to.clone(), |dest| IROp::Cast { dest, kind, value, to })
}

fn lower_binary(
    left: &AstNode,
    op: BinaryOperator,
    right: &AstNode,
    node: &AstNode,
    ctx: &mut LoweringContext,
    fb: &mut FunctionBuilder,
) -> Result<Value, LoweringError> {
    let lhs = lower_expr(left, ctx, fb)?;
    let rhs = lower_expr(right, ctx, fb)?;
    let (lt, rt) = (lhs.ty(), rhs.ty());

    if lt.is_integer() && rt.is_integer() {
        let lhs = coerce_value(lhs, &IrType::I32, left, fb)?;
        let rhs = coerce_value(rhs, &IrType::I32, right, fb)?;
        let kind = match op {
            BinaryOperator::Add => BinaryKind::Add,
            BinaryOperator::Sub => BinaryKind::Sub,
            BinaryOperator::Mul => BinaryKind::Mul,
            BinaryOperator::Div => BinaryKind::SDiv,
            _ => {
                let pred = match op {
                    BinaryOperator::Lt => ICmpPredicate::Slt,
                    BinaryOperator::Le => ICmpPredicate::Sle,
                    BinaryOperator::Gt => ICmpPredicate::Sgt,
                    BinaryOperator::Ge => ICmpPredicate::Sge,
                    BinaryOperator::Eq => ICmpPredicate::Eq,
                    _ => ICmpPredicate::Ne,
                };
                let flag = fb.emit_value(IrType::I1, |dest| IROp::ICmp { dest, pred, lhs, rhs });
                return Ok(cast(CastKind::ZExt, flag, &IrType::I32, fb));
            }
        };
        return Ok(fb.emit_value(IrType::I32, |dest| IROp::Binary { dest, op: kind, lhs, rhs }));
    }

    if lt.is_float() && rt.is_float() {
        let kind = match op {
            BinaryOperator::Add => BinaryKind::FAdd,
            BinaryOperator::Sub => BinaryKind::FSub,
            BinaryOperator::Mul => BinaryKind::FMul,
            BinaryOperator::Div => BinaryKind::FDiv,
            _ => {
                let pred = match op {
                    BinaryOperator::Lt => FCmpPredicate::Olt,
                    BinaryOperator::Le => FCmpPredicate::Ole,
                    BinaryOperator::Gt => FCmpPredicate::Ogt,
                    BinaryOperator::Ge => FCmpPredicate::Oge,
                    BinaryOperator::Eq => FCmpPredicate::Oeq,
                    _ => FCmpPredicate::One,
                };
                let flag = fb.emit_value(IrType::I1, |dest| IROp::FCmp { dest, pred, lhs, rhs });
                return Ok(cast(CastKind::ZExt, flag, &IrType::I32, fb));
            }
        };
        return Ok(fb.emit_value(IrType::F32, |dest| IROp::Binary { dest, op: kind, lhs, rhs }));
    }

    if lt.is_pointer() && lt == rt && matches!(op, BinaryOperator::Eq | BinaryOperator::Ne) {
        let pred = if op == BinaryOperator::Eq {
            ICmpPredicate::Eq
        } else {
            ICmpPredicate::Ne
        };
        let flag = fb.emit_value(IrType::I1, |dest| IROp::ICmp { dest, pred, lhs, rhs });
        return Ok(cast(CastKind::ZExt, flag, &IrType::I32, fb));
    }

    Err(LoweringError::new(
        LoweringErrorKind::TypeMismatch,
        format!(
            "operator '{}' cannot combine {} and {}",
            op.symbol(),
            lt.describe(),
            rt.describe()
        ),
        Some(node),
    ))
}

/// Branch condition: the value compared against zero of its own type.
pub(crate) fn lower_condition(
    node: &AstNode,
    ctx: &mut LoweringContext,
    fb: &mut FunctionBuilder,
) -> Result<Value, LoweringError> {
    let value = lower_expr(node, ctx, fb)?;
    let ty = value.ty();
    if ty.is_integer() {
        let zero = Value::int(ty, 0);
        return Ok(fb.emit_value(IrType::I1, |dest| IROp::ICmp {
            dest,
            pred: ICmpPredicate::Ne,
            lhs: value,
            rhs: zero,
        }));
    }
    if ty.is_float() {
        return Ok(fb.emit_value(IrType::I1, |dest| IROp::FCmp {
            dest,
            pred: FCmpPredicate::One,
            lhs: value,
            rhs: Value::ConstFloat { value: 0.0 },
        }));
    }
    Err(LoweringError::new(
        LoweringErrorKind::TypeMismatch,
        format!("condition of type {} is not a number", ty.describe()),
        Some(node),
    ))
}

/// Address designated by an assignment target.
pub(crate) fn lower_lvalue(
    node: &AstNode,
    ctx: &mut LoweringContext,
    fb: &mut FunctionBuilder,
) -> Result<Value, LoweringError> {
    match &node.kind {
        AstNodeKind::Identifier { name } => {
            let symbol = lookup_symbol(name, node, fb)?;
            if symbol.ty.is_array() {
                return Err(LoweringError::new(
                    LoweringErrorKind::InvalidAssignTarget,
                    format!("cannot assign to array '{}'", name),
                    Some(node),
                ));
            }
            Ok(symbol.slot)
        }
        AstNodeKind::UnaryOp {
            op: UnaryOperator::Deref,
            operand,
        } => lower_pointer(operand, "dereference", ctx, fb),
        AstNodeKind::ArrayAccess { name, index } => lower_element_address(name, index, node, ctx, fb),
        _ => Err(LoweringError::new(
            LoweringErrorKind::InvalidAssignTarget,
            format!("cannot assign to {}", node.kind),
            Some(node),
        )),
    }
}

fn lower_address_of(
    operand: &AstNode,
    ctx: &mut LoweringContext,
    fb: &mut FunctionBuilder,
) -> Result<Value, LoweringError> {
    match &operand.kind {
        AstNodeKind::Identifier { name } => Ok(lookup_symbol(name, operand, fb)?.slot),
        // &*p is p: no load, no store.
        AstNodeKind::UnaryOp {
            op: UnaryOperator::Deref,
            operand: inner,
        } => lower_pointer(inner, "dereference", ctx, fb),
        _ => Err(LoweringError::new(
            LoweringErrorKind::InvalidAddressOf,
            format!("cannot take address of a computed value ({})", operand.kind),
            Some(operand),
        )),
    }
}

/// `name[index]`: GEP `[0, index]` into an array slot, or `[index]` off a
/// loaded pointer. No bounds check.
fn lower_element_address(
    name: &str,
    index: &AstNode,
    node: &AstNode,
    ctx: &mut LoweringContext,
    fb: &mut FunctionBuilder,
) -> Result<Value, LoweringError> {
    let symbol = lookup_symbol(name, node, fb)?;
    let idx = lower_expr(index, ctx, fb)?;
    if !idx.ty().is_integer() {
        return Err(LoweringError::new(
            LoweringErrorKind::TypeMismatch,
            format!("index of '{}' has type {}", name, idx.ty().describe()),
            Some(index),
        ));
    }
    let idx = coerce_value(idx, &IrType::I32, index, fb)?;

    match &symbol.ty {
        IrType::Array(elem, _) => {
            let elem = elem.as_ref().clone();
            let base_ty = symbol.ty.clone();
            Ok(fb.emit_value(elem.ptr_to(), |dest| IROp::Gep {
                dest,
                base_ty,
                base: symbol.slot,
                indices: vec![Value::i32(0), idx],
            }))
        }
        IrType::Ptr(pointee) => {
            let pointee = pointee.as_ref().clone();
            let base = fb.load(symbol.slot)?;
            Ok(fb.emit_value(pointee.clone().ptr_to(), |dest| IROp::Gep {
                dest,
                base_ty: pointee,
                base,
                indices: vec![idx],
            }))
        }
        other => Err(LoweringError::new(
            LoweringErrorKind::TypeMismatch,
            format!("'{}' of type {} cannot be indexed", name, other.describe()),
            Some(node),
        )),
    }
}

fn arity_check(name: &str, expected: usize, args: &[AstNode], node: &AstNode) -> Result<(), LoweringError> {
    if expected == args.len() {
        return Ok(());
    }
    Err(LoweringError::new(
        LoweringErrorKind::ArityMismatch,
        format!("'{}' takes {} argument(s) but {} were given", name, expected, args.len()),
        Some(node),
    ))
}

fn lower_args(
    args: &[AstNode],
    params: &[IrType],
    ctx: &mut LoweringContext,
    fb: &mut FunctionBuilder,
) -> Result<Vec<Value>, LoweringError> {
    let mut values = Vec::with_capacity(args.len());
    for (arg, ty) in args.iter().zip(params) {
        let value = lower_expr(arg, ctx, fb)?;
        values.push(coerce_value(value, ty, arg, fb)?);
    }
    Ok(values)
}

/// Lower a call. `None` when the callee returns void.
pub(crate) fn lower_call(
    name: &str,
    args: &[AstNode],
    node: &AstNode,
    ctx: &mut LoweringContext,
    fb: &mut FunctionBuilder,
) -> Result<Option<Value>, LoweringError> {
    if name == "print" {
        arity_check(name, 1, args, node)?;
        let value = lower_expr(&args[0], ctx, fb)?;
        let ty = value.ty();
        let (symbol, param) = if ty.is_integer() {
            (PRINT_INT, IrType::I32)
        } else if ty.is_float() {
            (PRINT_FLOAT, IrType::F32)
        } else if ty.is_pointer() {
            (PRINT_STRING, IrType::I8.ptr_to())
        } else {
            return Err(LoweringError::new(
                LoweringErrorKind::TypeMismatch,
                format!("cannot print a value of type {}", ty.describe()),
                Some(&args[0]),
            ));
        };
        let value = coerce_value(value, &param, &args[0], fb)?;
        return Ok(fb.call(symbol, IrType::Void, vec![value]));
    }

    if let Some((module_name, symbol)) = declare_builtins::gated_function(name) {
        if !ctx.is_imported(module_name) {
            return Err(LoweringError::new(
                LoweringErrorKind::MissingImport,
                format!("'{}' requires 'import {}'", name, module_name),
                Some(node),
            ));
        }
        let decl = ctx
            .module
            .find_external(symbol)
            .cloned()
            .ok_or_else(|| LoweringError::invariant(format!("'{}' imported but not declared", symbol)))?;
        arity_check(name, decl.params.len(), args, node)?;
        let values = lower_args(args, &decl.params, ctx, fb)?;
        return Ok(fb.call(&decl.name, decl.ret, values));
    }

    let Some(sig) = ctx.lookup_function(name).cloned() else {
        return Err(LoweringError::new(
            LoweringErrorKind::UndefinedFunction,
            format!("undefined function '{}'", name),
            Some(node),
        ));
    };
    arity_check(name, sig.params.len(), args, node)?;
    let values = lower_args(args, &sig.params, ctx, fb)?;
    Ok(fb.call(&sig.name, sig.ret, values))
}
