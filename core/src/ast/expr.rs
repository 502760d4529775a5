//! file: core/src/ast/expr.rs
//! description: parsing helpers for expressions.
//!
//! The precedence ladder lives in the grammar (`equality` down to `unary`);
//! each level here folds its `(operand, op, operand, ...)` children into a
//! left-associative `BinOp` chain.
//!
use pest::iterators::Pair;

use crate::{
    ast::{AstNode, AstNodeKind, BinaryOperator, CScriptErrorExt, UnaryOperator, rules},
    grammar::Rule,
    lexer::decode_escapes,
    script,
};

pub(crate) fn parse_expression_rule(
    pair: Pair<Rule>,
    script: &script::Script,
) -> Result<AstNode, Box<dyn CScriptErrorExt>> {
    match pair.as_rule() {
        Rule::expr => {
            let (mut inner_pairs, location, span) = rules::get_data_from_rule(&pair, script);
            let next = rules::fetch_next_pair(&mut inner_pairs, &location, &span)?;
            parse_expression_rule(next, script)
        }
        Rule::equality | Rule::relational | Rule::additive | Rule::multiplicative => {
            parse_binary_chain_rule(pair, script)
        }
        Rule::unary => parse_unary_rule(pair, script),
        Rule::call => parse_call_rule(pair, script),
        Rule::array_access => parse_array_access_rule(pair, script),
        Rule::number => parse_number_rule(pair, script),
        Rule::float_lit => {
            let location = rules::get_location_from_pair(&pair, script);
            let span = rules::get_span_from_pair(&pair, script);
            let value = pair.as_str().parse::<f64>().map_err(|_| {
                rules::syntax_error(
                    format!("Invalid float literal '{}'", pair.as_str()),
                    "cscript.ast.expr.parse_expression_rule",
                    location.clone(),
                    span.clone(),
                )
            })?;
            Ok(AstNode::new(AstNodeKind::Float { value }, location, span))
        }
        Rule::string_lit => {
            let raw = pair.as_str();
            let value = decode_escapes(&raw[1..raw.len() - 1]);
            Ok(AstNode::new(
                AstNodeKind::String { value },
                rules::get_location_from_pair(&pair, script),
                rules::get_span_from_pair(&pair, script),
            ))
        }
        Rule::identifier => Ok(AstNode::new(
            AstNodeKind::Identifier {
                name: pair.as_str().to_string(),
            },
            rules::get_location_from_pair(&pair, script),
            rules::get_span_from_pair(&pair, script),
        )),
        other => Err(rules::syntax_error(
            format!("Unexpected expression rule {:?}", other),
            "cscript.ast.expr.parse_expression_rule",
            rules::get_location_from_pair(&pair, script),
            rules::get_span_from_pair(&pair, script),
        )),
    }
}

fn parse_binary_chain_rule(
    pair: Pair<Rule>,
    script: &script::Script,
) -> Result<AstNode, Box<dyn CScriptErrorExt>> {
    let (mut inner_pairs, location, span) = rules::get_data_from_rule(&pair, script);

    let left_pair = rules::fetch_next_pair(&mut inner_pairs, &location, &span)?;
    let mut node = parse_expression_rule(left_pair, script)?;

    while let Some(op_pair) = inner_pairs.next() {
        let op = BinaryOperator::from_symbol(op_pair.as_str()).ok_or_else(|| {
            rules::syntax_error(
                format!("Invalid binary operator '{}'", op_pair.as_str()),
                "cscript.ast.expr.parse_binary_chain_rule",
                location.clone(),
                span.clone(),
            )
        })?;
        let right_pair = rules::fetch_next_pair(&mut inner_pairs, &location, &span)?;
        let right = parse_expression_rule(right_pair, script)?;

        let node_location = node.location.clone();
        node = AstNode::new(
            AstNodeKind::BinOp {
                left: Box::new(node),
                op,
                right: Box::new(right),
            },
            node_location,
            rules::get_span_from_pair(&op_pair, script),
        );
    }

    Ok(node)
}

fn parse_unary_rule(
    pair: Pair<Rule>,
    script: &script::Script,
) -> Result<AstNode, Box<dyn CScriptErrorExt>> {
    let (mut inner_pairs, location, span) = rules::get_data_from_rule(&pair, script);
    let first = rules::fetch_next_pair(&mut inner_pairs, &location, &span)?;
    if first.as_rule() != Rule::unary_op {
        return parse_expression_rule(first, script);
    }

    let op = match first.as_str() {
        "&" => UnaryOperator::AddressOf,
        _ => UnaryOperator::Deref,
    };
    let operand_pair = rules::fetch_next_pair(&mut inner_pairs, &location, &span)?;
    let operand = parse_expression_rule(operand_pair, script)?;
    Ok(AstNode::new(
        AstNodeKind::UnaryOp {
            op,
            operand: Box::new(operand),
        },
        location,
        span,
    ))
}

fn parse_call_rule(
    pair: Pair<Rule>,
    script: &script::Script,
) -> Result<AstNode, Box<dyn CScriptErrorExt>> {
    let (mut inner_pairs, location, span) = rules::get_data_from_rule(&pair, script);
    let callee = rules::fetch_next_pair(&mut inner_pairs, &location, &span)?;

    let mut args = Vec::new();
    if let Some(arg_list) = inner_pairs.next() {
        for arg in arg_list.into_inner() {
            args.push(parse_expression_rule(arg, script)?);
        }
    }

    Ok(AstNode::new(
        AstNodeKind::FuncCall {
            name: callee.as_str().to_string(),
            args,
        },
        location,
        span,
    ))
}

fn parse_array_access_rule(
    pair: Pair<Rule>,
    script: &script::Script,
) -> Result<AstNode, Box<dyn CScriptErrorExt>> {
    let (mut inner_pairs, location, span) = rules::get_data_from_rule(&pair, script);
    let name = rules::fetch_next_pair(&mut inner_pairs, &location, &span)?;
    let index_pair = rules::fetch_next_pair(&mut inner_pairs, &location, &span)?;
    let index = parse_expression_rule(index_pair, script)?;
    Ok(AstNode::new(
        AstNodeKind::ArrayAccess {
            name: name.as_str().to_string(),
            index: Box::new(index),
        },
        location,
        span,
    ))
}

fn parse_number_rule(
    pair: Pair<Rule>,
    script: &script::Script,
) -> Result<AstNode, Box<dyn CScriptErrorExt>> {
    let location = rules::get_location_from_pair(&pair, script);
    let span = rules::get_span_from_pair(&pair, script);
    let value = pair.as_str().parse::<i32>().map_err(|_| {
        rules::syntax_error(
            format!(
                "Integer literal '{}' does not fit in 32 bits on line {}",
                pair.as_str(),
                location.as_ref().map(|l| l.line).unwrap_or(0)
            ),
            "cscript.ast.expr.parse_number_rule",
            location.clone(),
            span.clone(),
        )
    })?;
    Ok(AstNode::new(AstNodeKind::Number { value }, location, span))
}
