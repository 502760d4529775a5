use std::fmt;

use crate::ast::AstNode;
use crate::error::{CScriptErrorExt, Level};
use crate::location::{Location, Span};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum LoweringErrorKind {
    UndefinedSymbol,
    UndefinedFunction,
    UnknownType,
    UnknownImport,
    MissingImport,
    InvalidAssignTarget,
    InvalidAddressOf,
    TypeMismatch,
    ArityMismatch,
    VoidValue,
    DuplicateFunction,
    EntryPointConflict,
    /// Generator bug or AST shape the parser never builds.
    Invariant,
}

impl fmt::Display for LoweringErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            LoweringErrorKind::UndefinedSymbol => "undefined symbol",
            LoweringErrorKind::UndefinedFunction => "undefined function",
            LoweringErrorKind::UnknownType => "unknown type",
            LoweringErrorKind::UnknownImport => "unknown import",
            LoweringErrorKind::MissingImport => "missing import",
            LoweringErrorKind::InvalidAssignTarget => "invalid assignment target",
            LoweringErrorKind::InvalidAddressOf => "invalid address-of",
            LoweringErrorKind::TypeMismatch => "type mismatch",
            LoweringErrorKind::ArityMismatch => "arity mismatch",
            LoweringErrorKind::VoidValue => "void value",
            LoweringErrorKind::DuplicateFunction => "duplicate function",
            LoweringErrorKind::EntryPointConflict => "entry point conflict",
            LoweringErrorKind::Invariant => "internal invariant",
        };
        write!(f, "{}", text)
    }
}

/// Fatal code generation failure. The partially built module is dropped.
#[derive(Debug, Clone)]
pub struct LoweringError {
    level: Level,
    kind: LoweringErrorKind,
    message: String,
    issuer: String,
    location: Option<Location>,
    span: Option<Span>,
}

impl LoweringError {
    pub fn new(kind: LoweringErrorKind, message: impl Into<String>, node: Option<&AstNode>) -> Self {
        let level = match kind {
            LoweringErrorKind::Invariant => Level::Critical,
            _ => Level::Error,
        };
        LoweringError {
            level,
            kind,
            message: message.into(),
            issuer: "cscript.ir.lower".to_string(),
            location: node.and_then(|n| n.location.clone()),
            span: node.and_then(|n| n.span.clone()),
        }
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        LoweringError::new(LoweringErrorKind::Invariant, message, None)
    }

    pub fn with_issuer(mut self, issuer: &str) -> Self {
        self.issuer = issuer.to_string();
        self
    }

    pub fn kind(&self) -> LoweringErrorKind {
        self.kind
    }
}

impl fmt::Display for LoweringError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(loc) => write!(f, "{} (at {})", self.message(), loc),
            None => write!(f, "{}", self.message()),
        }
    }
}

impl std::error::Error for LoweringError {}

impl CScriptErrorExt for LoweringError {
    fn level(&self) -> Level {
        self.level
    }

    fn message(&self) -> String {
        match &self.location {
            Some(loc) => format!("{}: {} on line {}", self.kind, self.message, loc.line),
            None => format!("{}: {}", self.kind, self.message),
        }
    }

    fn issuer(&self) -> String {
        self.issuer.clone()
    }

    fn span(&self) -> Option<Span> {
        self.span.clone()
    }

    fn location(&self) -> Option<Location> {
        self.location.clone()
    }
}

impl From<LoweringError> for Box<dyn CScriptErrorExt> {
    fn from(err: LoweringError) -> Self {
        Box::new(err)
    }
}
