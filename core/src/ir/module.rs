//! file: core/src/ir/module.rs
//! description: the lowered module handed to the external backend.
//!
//! `IrModule` owns the external declarations, the string constant pool and
//! the function bodies. `Display` renders LLVM-style textual IR.
//!
use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use super::op::{IROp, Terminator};
use super::types::IrType;
use super::value::Value;

/// A runtime function the module calls but does not define.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExternDecl {
    pub name: String,
    pub ret: IrType,
    pub params: Vec<IrType>,
}

impl ExternDecl {
    pub fn new(name: &str, ret: IrType, params: Vec<IrType>) -> Self {
        ExternDecl {
            name: name.to_string(),
            ret,
            params,
        }
    }
}

/// One pooled, NUL-terminated string literal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlobalString {
    pub name: String,
    /// Literal bytes, without the trailing NUL.
    pub text: Vec<u8>,
}

impl GlobalString {
    pub fn byte_len(&self) -> u32 {
        self.text.len() as u32 + 1
    }

    pub fn ty(&self) -> IrType {
        IrType::I8.array_of(self.byte_len())
    }

    pub fn address(&self) -> Value {
        Value::Global {
            name: self.name.clone(),
            ty: self.ty().ptr_to(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BasicBlock {
    pub label: String,
    pub ops: Vec<IROp>,
    pub terminator: Option<Terminator>,
}

impl BasicBlock {
    pub fn new(label: &str) -> Self {
        BasicBlock {
            label: label.to_string(),
            ops: Vec::new(),
            terminator: None,
        }
    }

    pub fn is_terminated(&self) -> bool {
        self.terminator.is_some()
    }

    /// A block takes exactly one terminator; a second one is refused.
    pub fn terminate(&mut self, terminator: Terminator) -> Result<(), String> {
        if let Some(existing) = &self.terminator {
            return Err(format!(
                "block '{}' already ends in '{}', cannot add '{}'",
                self.label, existing, terminator
            ));
        }
        self.terminator = Some(terminator);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IrParam {
    pub name: String,
    pub ty: IrType,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IrFunction {
    pub name: String,
    pub ret: IrType,
    pub params: Vec<IrParam>,
    pub blocks: Vec<BasicBlock>,
}

impl IrFunction {
    pub fn block(&self, label: &str) -> Option<&BasicBlock> {
        self.blocks.iter().find(|b| b.label == label)
    }

    pub fn entry(&self) -> Option<&BasicBlock> {
        self.blocks.first()
    }

    pub fn ops(&self) -> impl Iterator<Item = &IROp> {
        self.blocks.iter().flat_map(|b| b.ops.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IrModule {
    pub name: String,
    pub target_triple: Option<String>,
    pub externals: Vec<ExternDecl>,
    pub strings: Vec<GlobalString>,
    pub functions: Vec<IrFunction>,
}

impl IrModule {
    pub fn new(name: &str, target_triple: Option<String>) -> Self {
        IrModule {
            name: name.to_string(),
            target_triple,
            externals: Vec::new(),
            strings: Vec::new(),
            functions: Vec::new(),
        }
    }

    /// Pool `text`, returning the existing constant when the exact text was
    /// seen before.
    pub fn intern_string(&mut self, text: &[u8]) -> &GlobalString {
        let idx = match self.strings.iter().position(|s| s.text == text) {
            Some(idx) => idx,
            None => {
                let name = format!(".str.{}", self.strings.len());
                self.strings.push(GlobalString {
                    name,
                    text: text.to_vec(),
                });
                self.strings.len() - 1
            }
        };
        &self.strings[idx]
    }

    /// Returns false when `decl.name` was already declared.
    pub fn declare_external(&mut self, decl: ExternDecl) -> bool {
        if self.find_external(&decl.name).is_some() {
            return false;
        }
        self.externals.push(decl);
        true
    }

    pub fn find_external(&self, name: &str) -> Option<&ExternDecl> {
        self.externals.iter().find(|e| e.name == name)
    }

    pub fn find_function(&self, name: &str) -> Option<&IrFunction> {
        self.functions.iter().find(|f| f.name == name)
    }

    pub fn add_function(&mut self, function: IrFunction) {
        self.functions.push(function);
    }

    /// Structural well-formedness: every block terminated, every branch
    /// target present, every callee declared with a matching arity.
    pub fn verify(&self) -> Result<(), String> {
        let mut callees: Vec<(&str, usize)> = self
            .externals
            .iter()
            .map(|e| (e.name.as_str(), e.params.len()))
            .collect();
        callees.extend(self.functions.iter().map(|f| (f.name.as_str(), f.params.len())));

        for function in &self.functions {
            if function.blocks.is_empty() {
                return Err(format!("function '{}' has no blocks", function.name));
            }
            let labels: HashSet<&str> = function.blocks.iter().map(|b| b.label.as_str()).collect();
            if labels.len() != function.blocks.len() {
                return Err(format!("function '{}' repeats a block label", function.name));
            }
            for block in &function.blocks {
                let Some(term) = &block.terminator else {
                    return Err(format!(
                        "block '{}' in '{}' has no terminator",
                        block.label, function.name
                    ));
                };
                for target in term.successors() {
                    if !labels.contains(target) {
                        return Err(format!(
                            "block '{}' in '{}' branches to unknown label '{}'",
                            block.label, function.name, target
                        ));
                    }
                }
                for op in &block.ops {
                    if let IROp::Call { callee, args, .. } = op {
                        match callees.iter().find(|(name, _)| name == callee) {
                            Some((_, arity)) if *arity == args.len() => {}
                            Some(_) => {
                                return Err(format!(
                                    "call to '{}' in '{}' has the wrong number of arguments",
                                    callee, function.name
                                ));
                            }
                            None => {
                                return Err(format!(
                                    "call to undeclared '{}' in '{}'",
                                    callee, function.name
                                ));
                            }
                        }
                    }
                }
            }
        }
        Ok(())
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn escape_bytes(text: &[u8]) -> String {
    let mut out = String::new();
    for &byte in text {
        if byte < 32 || byte > 126 || byte == b'"' || byte == b'\\' {
            out.push_str(&format!("\\{:02X}", byte));
        } else {
            out.push(byte as char);
        }
    }
    out.push_str("\\00");
    out
}

fn join<T: fmt::Display>(items: impl Iterator<Item = T>) -> String {
    items.map(|i| i.to_string()).collect::<Vec<_>>().join(", ")
}

impl fmt::Display for IrFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params = join(
            self.params
                .iter()
                .enumerate()
                .map(|(i, p)| format!("{} %arg{}", p.ty, i)),
        );
        writeln!(f, "define {} @{}({}) {{", self.ret, self.name, params)?;
        for (i, block) in self.blocks.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            writeln!(f, "{}:", block.label)?;
            for op in &block.ops {
                writeln!(f, "  {}", op)?;
            }
            if let Some(term) = &block.terminator {
                writeln!(f, "  {}", term)?;
            }
        }
        writeln!(f, "}}")
    }
}

impl fmt::Display for IrModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "; ModuleID = '{}'", self.name)?;
        writeln!(f, "source_filename = \"{}\"", self.name)?;
        if let Some(triple) = &self.target_triple {
            writeln!(f, "target triple = \"{}\"", triple)?;
        }

        if !self.strings.is_empty() {
            writeln!(f)?;
        }
        for s in &self.strings {
            writeln!(
                f,
                "@{} = private unnamed_addr constant {} c\"{}\"",
                s.name,
                s.ty(),
                escape_bytes(&s.text)
            )?;
        }

        if !self.externals.is_empty() {
            writeln!(f)?;
        }
        for e in &self.externals {
            writeln!(f, "declare {} @{}({})", e.ret, e.name, join(e.params.iter()))?;
        }

        for function in &self.functions {
            writeln!(f)?;
            write!(f, "{}", function)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_terminator_is_refused() {
        let mut block = BasicBlock::new("entry");
        assert!(block.terminate(Terminator::Ret { value: None }).is_ok());
        let err = block
            .terminate(Terminator::Br { target: "next".into() })
            .unwrap_err();
        assert!(err.contains("already ends"));
        assert_eq!(block.terminator, Some(Terminator::Ret { value: None }));
    }

    #[test]
    fn strings_are_pooled_by_exact_text() {
        let mut module = IrModule::new("m", None);
        let a = module.intern_string(b"hi").name.clone();
        let b = module.intern_string(b"hi ").name.clone();
        let c = module.intern_string(b"hi").name.clone();
        assert_eq!(a, c);
        assert_ne!(a, b);
        assert_eq!(module.strings.len(), 2);
    }

    #[test]
    fn string_constants_escape_control_bytes() {
        let mut module = IrModule::new("m", None);
        module.intern_string(b"a\"b\n");
        let text = module.to_string();
        assert!(text.contains(r#"@.str.0 = private unnamed_addr constant [5 x i8] c"a\22b\0A\00""#));
    }

    #[test]
    fn externals_are_declared_once() {
        let mut module = IrModule::new("m", None);
        assert!(module.declare_external(ExternDecl::new("f", IrType::Void, vec![IrType::I32])));
        assert!(!module.declare_external(ExternDecl::new("f", IrType::Void, vec![IrType::I32])));
        assert_eq!(module.externals.len(), 1);
        assert!(module.to_string().contains("declare void @f(i32)"));
    }

    #[test]
    fn verify_rejects_unterminated_blocks() {
        let mut module = IrModule::new("m", None);
        module.add_function(IrFunction {
            name: "f".into(),
            ret: IrType::Void,
            params: Vec::new(),
            blocks: vec![BasicBlock::new("entry")],
        });
        assert!(module.verify().unwrap_err().contains("no terminator"));
    }
}
