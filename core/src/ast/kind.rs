//! file: core/src/ast/kind.rs
//! description: AST node kind definitions, declared types and operator enums.
//!
//! `AstNodeKind` is the closed vocabulary the parser builds and the code
//! generator matches on exhaustively.
//!
use std::fmt;

use serde::Serialize;

use super::node::AstNode;

/// A type as written in the source: a base type followed by any number of `*`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum TypeName {
    Int,
    Float,
    Char,
    Void,
    Pointer(Box<TypeName>),
}

impl TypeName {
    pub fn pointer_to(self) -> TypeName {
        TypeName::Pointer(Box::new(self))
    }

    pub fn is_void(&self) -> bool {
        matches!(self, TypeName::Void)
    }

    pub fn from_base(name: &str) -> Option<TypeName> {
        match name {
            "int" => Some(TypeName::Int),
            "float" => Some(TypeName::Float),
            "char" => Some(TypeName::Char),
            "void" => Some(TypeName::Void),
            _ => None,
        }
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeName::Int => write!(f, "int"),
            TypeName::Float => write!(f, "float"),
            TypeName::Char => write!(f, "char"),
            TypeName::Void => write!(f, "void"),
            TypeName::Pointer(inner) => write!(f, "{}*", inner),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BinaryOperator {
    Add, // +
    Sub, // -
    Mul, // *
    Div, // /
    Lt,  // <
    Le,  // <=
    Gt,  // >
    Ge,  // >=
    Eq,  // ==
    Ne,  // !=
}

impl BinaryOperator {
    pub fn from_symbol(symbol: &str) -> Option<BinaryOperator> {
        let op = match symbol {
            "+" => BinaryOperator::Add,
            "-" => BinaryOperator::Sub,
            "*" => BinaryOperator::Mul,
            "/" => BinaryOperator::Div,
            "<" => BinaryOperator::Lt,
            "<=" => BinaryOperator::Le,
            ">" => BinaryOperator::Gt,
            ">=" => BinaryOperator::Ge,
            "==" => BinaryOperator::Eq,
            "!=" => BinaryOperator::Ne,
            _ => return None,
        };
        Some(op)
    }

    pub fn is_comparison(&self) -> bool {
        !matches!(
            self,
            BinaryOperator::Add | BinaryOperator::Sub | BinaryOperator::Mul | BinaryOperator::Div
        )
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::Lt => "<",
            BinaryOperator::Le => "<=",
            BinaryOperator::Gt => ">",
            BinaryOperator::Ge => ">=",
            BinaryOperator::Eq => "==",
            BinaryOperator::Ne => "!=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum UnaryOperator {
    AddressOf, // &
    Deref,     // *
}

impl UnaryOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOperator::AddressOf => "&",
            UnaryOperator::Deref => "*",
        }
    }
}

/// One `(type, name)` entry of a function signature.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Param {
    pub ty: TypeName,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum AstNodeKind {
    Program { body: Vec<AstNode> },
    Import { module: String },
    FunctionDef {
        name: String,
        params: Vec<Param>,
        return_type: TypeName,
        body: Vec<AstNode>,
    },

    VarDecl { ty: TypeName, name: String, value: Box<AstNode> },
    ArrayDecl { element_type: TypeName, name: String, length: u32 },
    Assign { target: Box<AstNode>, value: Box<AstNode> },
    ExprStmt { expr: Box<AstNode> },

    If {
        condition: Box<AstNode>,
        then_body: Vec<AstNode>,
        else_body: Option<Vec<AstNode>>,
    },
    While { condition: Box<AstNode>, body: Vec<AstNode> },
    For {
        init: Box<AstNode>,
        condition: Box<AstNode>,
        update: Box<AstNode>,
        body: Vec<AstNode>,
    },
    Return { value: Option<Box<AstNode>> },

    BinOp { left: Box<AstNode>, op: BinaryOperator, right: Box<AstNode> },
    UnaryOp { op: UnaryOperator, operand: Box<AstNode> },
    FuncCall { name: String, args: Vec<AstNode> },
    ArrayAccess { name: String, index: Box<AstNode> },

    Identifier { name: String },
    String { value: Vec<u8> },
    Number { value: i32 },
    Float { value: f64 },
}

impl AstNodeKind {
    pub fn is_expression(&self) -> bool {
        matches!(
            self,
            AstNodeKind::BinOp { .. }
                | AstNodeKind::UnaryOp { .. }
                | AstNodeKind::FuncCall { .. }
                | AstNodeKind::ArrayAccess { .. }
                | AstNodeKind::Identifier { .. }
                | AstNodeKind::String { .. }
                | AstNodeKind::Number { .. }
                | AstNodeKind::Float { .. }
        )
    }

    /// Valid on the left of `=`.
    pub fn is_lvalue(&self) -> bool {
        matches!(
            self,
            AstNodeKind::Identifier { .. }
                | AstNodeKind::ArrayAccess { .. }
                | AstNodeKind::UnaryOp { op: UnaryOperator::Deref, .. }
        )
    }
}

impl fmt::Display for AstNodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AstNodeKind::Program { .. } => write!(f, "Program"),
            AstNodeKind::Import { module } => write!(f, "Import({})", module),
            AstNodeKind::FunctionDef { name, .. } => write!(f, "FunctionDef({})", name),
            AstNodeKind::VarDecl { ty, name, .. } => write!(f, "VarDecl({} {})", ty, name),
            AstNodeKind::ArrayDecl { element_type, name, length } => {
                write!(f, "ArrayDecl({} {}[{}])", element_type, name, length)
            }
            AstNodeKind::Assign { .. } => write!(f, "Assign"),
            AstNodeKind::ExprStmt { .. } => write!(f, "ExprStmt"),
            AstNodeKind::If { .. } => write!(f, "If"),
            AstNodeKind::While { .. } => write!(f, "While"),
            AstNodeKind::For { .. } => write!(f, "For"),
            AstNodeKind::Return { .. } => write!(f, "Return"),
            AstNodeKind::BinOp { op, .. } => write!(f, "BinOp({})", op.symbol()),
            AstNodeKind::UnaryOp { op, .. } => write!(f, "UnaryOp({})", op.symbol()),
            AstNodeKind::FuncCall { name, .. } => write!(f, "FuncCall({})", name),
            AstNodeKind::ArrayAccess { name, .. } => write!(f, "ArrayAccess({})", name),
            AstNodeKind::Identifier { name } => write!(f, "Identifier({})", name),
            AstNodeKind::String { value } => write!(f, "String({:?})", String::from_utf8_lossy(value)),
            AstNodeKind::Number { value } => write!(f, "Number({})", value),
            AstNodeKind::Float { value } => write!(f, "Float({})", value),
        }
    }
}
