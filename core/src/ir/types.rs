use std::fmt;

use serde::Serialize;

use crate::ast::TypeName;

/// Type of every IR value. Pointers keep their pointee so loads, stores and
/// GEPs know the element type; the rendered text uses opaque `ptr`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum IrType {
    Void,
    I1,
    I8,
    I32,
    F32,
    Ptr(Box<IrType>),
    Array(Box<IrType>, u32),
}

impl IrType {
    pub fn ptr_to(self) -> IrType {
        IrType::Ptr(Box::new(self))
    }

    pub fn array_of(self, length: u32) -> IrType {
        IrType::Array(Box::new(self), length)
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, IrType::I1 | IrType::I8 | IrType::I32)
    }

    pub fn is_float(&self) -> bool {
        matches!(self, IrType::F32)
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, IrType::Ptr(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, IrType::Array(..))
    }

    pub fn int_width(&self) -> Option<u32> {
        match self {
            IrType::I1 => Some(1),
            IrType::I8 => Some(8),
            IrType::I32 => Some(32),
            _ => None,
        }
    }

    pub fn pointee(&self) -> Option<&IrType> {
        match self {
            IrType::Ptr(inner) => Some(inner),
            _ => None,
        }
    }

    pub fn element(&self) -> Option<&IrType> {
        match self {
            IrType::Array(inner, _) => Some(inner),
            _ => None,
        }
    }

    /// `void*` has no storable pointee, so it is carried as `i8*`.
    pub fn from_type_name(ty: &TypeName) -> IrType {
        match ty {
            TypeName::Int => IrType::I32,
            TypeName::Float => IrType::F32,
            TypeName::Char => IrType::I8,
            TypeName::Void => IrType::Void,
            TypeName::Pointer(inner) if inner.is_void() => IrType::I8.ptr_to(),
            TypeName::Pointer(inner) => IrType::from_type_name(inner).ptr_to(),
        }
    }

    /// Fully spelled type for diagnostics (`i8*`, `[3 x i32]`).
    pub fn describe(&self) -> String {
        match self {
            IrType::Ptr(inner) => format!("{}*", inner.describe()),
            IrType::Array(inner, len) => format!("[{} x {}]", len, inner.describe()),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for IrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrType::Void => write!(f, "void"),
            IrType::I1 => write!(f, "i1"),
            IrType::I8 => write!(f, "i8"),
            IrType::I32 => write!(f, "i32"),
            IrType::F32 => write!(f, "float"),
            IrType::Ptr(_) => write!(f, "ptr"),
            IrType::Array(inner, len) => write!(f, "[{} x {}]", len, inner),
        }
    }
}
