pub mod lower;
pub mod module;
pub mod op;
pub mod types;
pub mod value;

pub use self::lower::{LoweringError, LoweringErrorKind};
pub use self::module::{BasicBlock, ExternDecl, GlobalString, IrFunction, IrModule, IrParam};
pub use self::op::{BinaryKind, CastKind, FCmpPredicate, ICmpPredicate, IROp, Register, Terminator};
pub use self::types::IrType;
pub use self::value::Value;

use crate::ast::AstNode;
use crate::config::CompileOptions;
use crate::error::CScriptErrorExt;

pub fn lower_ast_to_ir(
    ast: &AstNode,
    options: &CompileOptions,
) -> Result<IrModule, Box<dyn CScriptErrorExt>> {
    Ok(lower::lower_program(ast, options)?)
}
