use std::fmt;

use serde::Serialize;

use crate::location;

use super::kind::AstNodeKind;

#[derive(Clone, PartialEq, Serialize)]
pub struct AstNode {
    id: usize,
    pub kind: AstNodeKind,
    pub location: Option<location::Location>,
    pub span: Option<location::Span>,
}

impl AstNode {
    fn create_id() -> usize {
        use std::sync::atomic::{AtomicUsize, Ordering};
        static COUNTER: AtomicUsize = AtomicUsize::new(1);
        COUNTER.fetch_add(1, Ordering::Relaxed)
    }

    pub fn new(
        kind: AstNodeKind,
        location: Option<location::Location>,
        span: Option<location::Span>,
    ) -> Self {
        AstNode {
            id: Self::create_id(),
            kind,
            location,
            span,
        }
    }

    pub fn with_location(mut self, location: location::Location) -> Self {
        self.location = Some(location);
        self
    }

    pub fn get_id(&self) -> usize {
        self.id
    }

    pub fn get_kind(&self) -> &AstNodeKind {
        &self.kind
    }

    pub fn get_location(&self) -> Option<&location::Location> {
        self.location.as_ref()
    }

    pub fn get_span(&self) -> Option<&location::Span> {
        self.span.as_ref()
    }

    /// Source line of the node, 0 when unknown.
    pub fn line(&self) -> usize {
        self.location.as_ref().map(|l| l.line).unwrap_or(0)
    }

    /// Direct children in source order.
    pub fn children(&self) -> Vec<&AstNode> {
        match &self.kind {
            AstNodeKind::Program { body } => body.iter().collect(),
            AstNodeKind::FunctionDef { body, .. } => body.iter().collect(),
            AstNodeKind::VarDecl { value, .. } => vec![value.as_ref()],
            AstNodeKind::Assign { target, value } => vec![target.as_ref(), value.as_ref()],
            AstNodeKind::ExprStmt { expr } => vec![expr.as_ref()],
            AstNodeKind::If { condition, then_body, else_body } => {
                let mut out = vec![condition.as_ref()];
                out.extend(then_body.iter());
                if let Some(else_body) = else_body {
                    out.extend(else_body.iter());
                }
                out
            }
            AstNodeKind::While { condition, body } => {
                let mut out = vec![condition.as_ref()];
                out.extend(body.iter());
                out
            }
            AstNodeKind::For { init, condition, update, body } => {
                let mut out = vec![init.as_ref(), condition.as_ref(), update.as_ref()];
                out.extend(body.iter());
                out
            }
            AstNodeKind::Return { value } => value.iter().map(|v| v.as_ref()).collect(),
            AstNodeKind::BinOp { left, right, .. } => vec![left.as_ref(), right.as_ref()],
            AstNodeKind::UnaryOp { operand, .. } => vec![operand.as_ref()],
            AstNodeKind::FuncCall { args, .. } => args.iter().collect(),
            AstNodeKind::ArrayAccess { index, .. } => vec![index.as_ref()],
            AstNodeKind::Import { .. }
            | AstNodeKind::ArrayDecl { .. }
            | AstNodeKind::Identifier { .. }
            | AstNodeKind::String { .. }
            | AstNodeKind::Number { .. }
            | AstNodeKind::Float { .. } => Vec::new(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for AstNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn write_tree(node: &AstNode, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
            write!(f, "{:indent$}{}", "", node.kind, indent = depth * 2)?;
            if let Some(loc) = &node.location {
                write!(f, " @{}:{}", loc.line, loc.column)?;
            }
            writeln!(f)?;
            for child in node.children() {
                write_tree(child, f, depth + 1)?;
            }
            Ok(())
        }
        write_tree(self, f, 0)
    }
}

impl fmt::Debug for AstNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AstNode")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("location", &self.location)
            .finish()
    }
}
