use std::fmt;

use serde::Serialize;

use super::op::Register;
use super::types::IrType;

/// An operand. Every variant knows its own `IrType`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Value {
    ConstInt { ty: IrType, value: i64 },
    ConstFloat { value: f64 },
    Null { ty: IrType },
    Reg { id: Register, ty: IrType },
    Arg { index: usize, ty: IrType },
    /// Address of a module-level constant; `ty` is the pointer type.
    Global { name: String, ty: IrType },
}

impl Value {
    pub fn int(ty: IrType, value: i64) -> Value {
        Value::ConstInt { ty, value }
    }

    pub fn i32(value: i64) -> Value {
        Value::ConstInt {
            ty: IrType::I32,
            value,
        }
    }

    pub fn ty(&self) -> IrType {
        match self {
            Value::ConstInt { ty, .. } => ty.clone(),
            Value::ConstFloat { .. } => IrType::F32,
            Value::Null { ty } | Value::Reg { ty, .. } | Value::Arg { ty, .. } | Value::Global { ty, .. } => {
                ty.clone()
            }
        }
    }

    /// Zero of `ty`, `None` for `void` and aggregates.
    pub fn zero(ty: &IrType) -> Option<Value> {
        match ty {
            IrType::I1 | IrType::I8 | IrType::I32 => Some(Value::int(ty.clone(), 0)),
            IrType::F32 => Some(Value::ConstFloat { value: 0.0 }),
            IrType::Ptr(_) => Some(Value::Null { ty: ty.clone() }),
            IrType::Void | IrType::Array(..) => None,
        }
    }

    /// Operand with its type prefix, e.g. `i32 %t3`.
    pub fn typed(&self) -> String {
        format!("{} {}", self.ty(), self)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::ConstInt { ty: IrType::I1, value } => {
                write!(f, "{}", if *value != 0 { "true" } else { "false" })
            }
            Value::ConstInt { value, .. } => write!(f, "{}", value),
            // Float constants are written as the hex image of the double
            // that holds the rounded single-precision value.
            Value::ConstFloat { value } => write!(f, "0x{:016X}", (*value as f32 as f64).to_bits()),
            Value::Null { .. } => write!(f, "null"),
            Value::Reg { id, .. } => write!(f, "%t{}", id),
            Value::Arg { index, .. } => write!(f, "%arg{}", index),
            Value::Global { name, .. } => write!(f, "@{}", name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_constants_use_hex_doubles() {
        assert_eq!(Value::ConstFloat { value: 1.5 }.to_string(), "0x3FF8000000000000");
        assert_eq!(Value::ConstFloat { value: 0.1 }.to_string(), "0x3FB99999A0000000");
    }

    #[test]
    fn typed_operands() {
        assert_eq!(Value::i32(5).typed(), "i32 5");
        assert_eq!(Value::int(IrType::I1, 1).typed(), "i1 true");
        assert_eq!(
            Value::Reg { id: 2, ty: IrType::I8.ptr_to() }.typed(),
            "ptr %t2"
        );
    }
}
