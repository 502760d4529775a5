//! file: core/src/ast/mod.rs
//! description: token stream -> `Program` AST.
//!
//! The lexer's tokens are laid back out at their source positions and parsed
//! with `Rule::program`. Parsing has no recovery: the first token the grammar
//! cannot accept is reported as a `SyntaxError` and no tree is produced.
//!
//! Tokens contribute their text and position only. Literal values are
//! rebuilt from the matched text with the lexer's own helpers
//! (`lexer::decode_escapes` for strings); `TokenValue` is not consulted.
//!
pub mod err;
pub mod kind;
pub mod node;

mod expr;
mod rules;
mod stmt;

pub use crate::error::CScriptErrorExt;
pub use err::{EmptyScriptError, SyntaxError};
pub use kind::{AstNodeKind, BinaryOperator, Param, TypeName, UnaryOperator};
pub use node::AstNode;
pub use rules::{get_location_from_pair, get_span_from_pair};

use log::debug;
use pest::Parser;

use crate::grammar::{Rule, RulesParser};
use crate::lexer::{self, TokenStream};
use crate::script::Script;

/// Lex and parse `script` into a `Program` node. Lexical errors are dropped
/// here; use `lexer::tokenize` + `parse_token_stream` to keep them.
pub fn generate_ast_from_source(script: &Script) -> Result<AstNode, Box<dyn CScriptErrorExt>> {
    let stream = lexer::tokenize(script);
    parse_token_stream(&stream, script)
}

pub fn parse_token_stream(
    stream: &TokenStream,
    script: &Script,
) -> Result<AstNode, Box<dyn CScriptErrorExt>> {
    if stream.is_empty() {
        return Err(Box::new(EmptyScriptError::new(
            "cscript.ast.parse_token_stream".into(),
            None,
            None,
        )));
    }

    let text = stream.render();
    let mut pairs = RulesParser::parse(Rule::program, &text).map_err(|e| {
        let (line, column) = match e.line_col {
            pest::error::LineColLocation::Pos(pos) => pos,
            pest::error::LineColLocation::Span(start, _) => start,
        };
        let err: Box<dyn CScriptErrorExt> = match stream.token_at(line, column) {
            Some(token) => Box::new(SyntaxError::unexpected(token)),
            None => rules::syntax_error(
                format!("Syntax error on line {}", line),
                "cscript.ast.parse_token_stream",
                None,
                None,
            ),
        };
        err
    })?;

    let program = pairs.next().ok_or_else(|| {
        rules::syntax_error(
            "Parser produced no program".into(),
            "cscript.ast.parse_token_stream",
            None,
            None,
        )
    })?;
    let ast = stmt::parse_program_rule(program, script)?;
    if let AstNodeKind::Program { body } = &ast.kind {
        debug!("parsed {} top-level statement(s) from {}", body.len(), script.name);
    }
    Ok(ast)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> AstNode {
        generate_ast_from_source(&Script::from_source("t.cs", src)).unwrap()
    }

    fn body(node: &AstNode) -> &Vec<AstNode> {
        match &node.kind {
            AstNodeKind::Program { body } => body,
            other => panic!("expected program, got {}", other),
        }
    }

    fn expr_of(stmt: &AstNode) -> &AstNode {
        match &stmt.kind {
            AstNodeKind::ExprStmt { expr } => expr,
            AstNodeKind::VarDecl { value, .. } => value,
            other => panic!("expected expression statement, got {}", other),
        }
    }

    #[test]
    fn unary_deref_binds_tighter_than_addition() {
        let ast = parse("*p + 1;");
        match &expr_of(&body(&ast)[0]).kind {
            AstNodeKind::BinOp { left, op, .. } => {
                assert_eq!(*op, BinaryOperator::Add);
                assert!(matches!(left.kind, AstNodeKind::UnaryOp { op: UnaryOperator::Deref, .. }));
            }
            other => panic!("unexpected {}", other),
        }
    }

    #[test]
    fn star_between_operands_is_multiplication() {
        let ast = parse("int c = a * b;");
        assert!(matches!(
            expr_of(&body(&ast)[0]).kind,
            AstNodeKind::BinOp { op: BinaryOperator::Mul, .. }
        ));
    }

    #[test]
    fn binary_operators_are_left_associative() {
        let ast = parse("1 - 2 - 3;");
        match &expr_of(&body(&ast)[0]).kind {
            AstNodeKind::BinOp { left, right, .. } => {
                assert!(matches!(left.kind, AstNodeKind::BinOp { .. }));
                assert!(matches!(right.kind, AstNodeKind::Number { value: 3 }));
            }
            other => panic!("unexpected {}", other),
        }
    }

    #[test]
    fn comparison_is_looser_than_arithmetic() {
        let ast = parse("1 + 2 < 3 == 1;");
        match &expr_of(&body(&ast)[0]).kind {
            AstNodeKind::BinOp { left, op, .. } => {
                assert_eq!(*op, BinaryOperator::Eq);
                assert!(matches!(left.kind, AstNodeKind::BinOp { op: BinaryOperator::Lt, .. }));
            }
            other => panic!("unexpected {}", other),
        }
    }

    #[test]
    fn else_if_nests_in_else_body() {
        let ast = parse("if (a) { x = 1; } else if (b) { x = 2; } else { x = 3; }");
        match &body(&ast)[0].kind {
            AstNodeKind::If { else_body: Some(else_body), .. } => {
                assert_eq!(else_body.len(), 1);
                assert!(matches!(
                    else_body[0].kind,
                    AstNodeKind::If { else_body: Some(_), .. }
                ));
            }
            other => panic!("unexpected {}", other),
        }
    }

    #[test]
    fn pointer_types_nest() {
        let ast = parse("int** pp = 0;");
        match &body(&ast)[0].kind {
            AstNodeKind::VarDecl { ty, .. } => assert_eq!(ty.to_string(), "int**"),
            other => panic!("unexpected {}", other),
        }
    }

    #[test]
    fn function_definition_with_params() {
        let ast = parse("def add(int a, char* b) -> int { return a; }");
        match &body(&ast)[0].kind {
            AstNodeKind::FunctionDef { name, params, return_type, body } => {
                assert_eq!(name, "add");
                assert_eq!(params.len(), 2);
                assert_eq!(params[1].ty, TypeName::Char.pointer_to());
                assert_eq!(*return_type, TypeName::Int);
                assert_eq!(body.len(), 1);
            }
            other => panic!("unexpected {}", other),
        }
    }

    #[test]
    fn keyword_prefix_is_an_identifier() {
        let ast = parse("int iffy = 1; iffy = 2;");
        assert!(matches!(body(&ast)[1].kind, AstNodeKind::Assign { .. }));
    }

    #[test]
    fn missing_semicolon_names_the_next_token() {
        let err = generate_ast_from_source(&Script::from_source("t.cs", "int x = 1\nprint(x);"))
            .unwrap_err();
        assert!(err.message().contains("'print'"), "{}", err.message());
        assert!(err.message().contains("line 2"), "{}", err.message());
    }

    #[test]
    fn truncated_input_reports_end_of_input() {
        let err = generate_ast_from_source(&Script::from_source("t.cs", "while (x) {"))
            .unwrap_err();
        assert!(err.message().contains("end of input"), "{}", err.message());
    }

    #[test]
    fn comment_only_script_is_empty() {
        let err = generate_ast_from_source(&Script::from_source("t.cs", "// nothing\n"))
            .unwrap_err();
        assert!(err.message().contains("no statements"));
    }
}
