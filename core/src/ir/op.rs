use serde::Serialize;

use super::types::IrType;
use super::value::Value;

pub type Register = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BinaryKind {
    Add,
    Sub,
    Mul,
    SDiv,
    FAdd,
    FSub,
    FMul,
    FDiv,
}

impl BinaryKind {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            BinaryKind::Add => "add",
            BinaryKind::Sub => "sub",
            BinaryKind::Mul => "mul",
            BinaryKind::SDiv => "sdiv",
            BinaryKind::FAdd => "fadd",
            BinaryKind::FSub => "fsub",
            BinaryKind::FMul => "fmul",
            BinaryKind::FDiv => "fdiv",
        }
    }
}

/// Signed integer comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ICmpPredicate {
    Eq,
    Ne,
    Slt,
    Sle,
    Sgt,
    Sge,
}

impl ICmpPredicate {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            ICmpPredicate::Eq => "eq",
            ICmpPredicate::Ne => "ne",
            ICmpPredicate::Slt => "slt",
            ICmpPredicate::Sle => "sle",
            ICmpPredicate::Sgt => "sgt",
            ICmpPredicate::Sge => "sge",
        }
    }
}

/// Ordered float comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FCmpPredicate {
    Oeq,
    One,
    Olt,
    Ole,
    Ogt,
    Oge,
}

impl FCmpPredicate {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            FCmpPredicate::Oeq => "oeq",
            FCmpPredicate::One => "one",
            FCmpPredicate::Olt => "olt",
            FCmpPredicate::Ole => "ole",
            FCmpPredicate::Ogt => "ogt",
            FCmpPredicate::Oge => "oge",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CastKind {
    ZExt,
    SExt,
    Trunc,
    PtrToInt,
    BitCast,
}

impl CastKind {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            CastKind::ZExt => "zext",
            CastKind::SExt => "sext",
            CastKind::Trunc => "trunc",
            CastKind::PtrToInt => "ptrtoint",
            CastKind::BitCast => "bitcast",
        }
    }
}

/// Non-terminating instruction inside a basic block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum IROp {
    Alloca { dest: Register, ty: IrType },
    Load { dest: Register, ty: IrType, ptr: Value },
    Store { value: Value, ptr: Value },
    Binary { dest: Register, op: BinaryKind, lhs: Value, rhs: Value },
    ICmp { dest: Register, pred: ICmpPredicate, lhs: Value, rhs: Value },
    FCmp { dest: Register, pred: FCmpPredicate, lhs: Value, rhs: Value },
    Cast { dest: Register, kind: CastKind, value: Value, to: IrType },
    /// `base_ty` is the type `base` points at.
    Gep { dest: Register, base_ty: IrType, base: Value, indices: Vec<Value> },
    Call { dest: Option<Register>, callee: String, ret: IrType, args: Vec<Value> },
}

impl IROp {
    pub fn dest(&self) -> Option<Register> {
        match self {
            IROp::Alloca { dest, .. }
            | IROp::Load { dest, .. }
            | IROp::Binary { dest, .. }
            | IROp::ICmp { dest, .. }
            | IROp::FCmp { dest, .. }
            | IROp::Cast { dest, .. }
            | IROp::Gep { dest, .. } => Some(*dest),
            IROp::Call { dest, .. } => *dest,
            IROp::Store { .. } => None,
        }
    }
}

impl std::fmt::Display for IROp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IROp::Alloca { dest, ty } => write!(f, "%t{} = alloca {}", dest, ty),
            IROp::Load { dest, ty, ptr } => write!(f, "%t{} = load {}, {}", dest, ty, ptr.typed()),
            IROp::Store { value, ptr } => write!(f, "store {}, {}", value.typed(), ptr.typed()),
            IROp::Binary { dest, op, lhs, rhs } => {
                write!(f, "%t{} = {} {}, {}", dest, op.mnemonic(), lhs.typed(), rhs)
            }
            IROp::ICmp { dest, pred, lhs, rhs } => {
                write!(f, "%t{} = icmp {} {}, {}", dest, pred.mnemonic(), lhs.typed(), rhs)
            }
            IROp::FCmp { dest, pred, lhs, rhs } => {
                write!(f, "%t{} = fcmp {} {}, {}", dest, pred.mnemonic(), lhs.typed(), rhs)
            }
            IROp::Cast { dest, kind, value, to } => {
                write!(f, "%t{} = {} {} to {}", dest, kind.mnemonic(), value.typed(), to)
            }
            IROp::Gep { dest, base_ty, base, indices } => {
                write!(f, "%t{} = getelementptr {}, {}", dest, base_ty, base.typed())?;
                for idx in indices {
                    write!(f, ", {}", idx.typed())?;
                }
                Ok(())
            }
            IROp::Call { dest, callee, ret, args } => {
                if let Some(dest) = dest {
                    write!(f, "%t{} = ", dest)?;
                }
                write!(f, "call {} @{}(", ret, callee)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg.typed())?;
                }
                write!(f, ")")
            }
        }
    }
}

/// The single instruction that ends a basic block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Terminator {
    Br { target: String },
    CondBr { cond: Value, then_label: String, else_label: String },
    Ret { value: Option<Value> },
}

impl Terminator {
    pub fn successors(&self) -> Vec<&str> {
        match self {
            Terminator::Br { target } => vec![target.as_str()],
            Terminator::CondBr { then_label, else_label, .. } => {
                vec![then_label.as_str(), else_label.as_str()]
            }
            Terminator::Ret { .. } => Vec::new(),
        }
    }
}

impl std::fmt::Display for Terminator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Terminator::Br { target } => write!(f, "br label %{}", target),
            Terminator::CondBr { cond, then_label, else_label } => write!(
                f,
                "br {}, label %{}, label %{}",
                cond.typed(),
                then_label,
                else_label
            ),
            Terminator::Ret { value: Some(v) } => write!(f, "ret {}", v.typed()),
            Terminator::Ret { value: None } => write!(f, "ret void"),
        }
    }
}
