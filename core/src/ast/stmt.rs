//! file: core/src/ast/stmt.rs
//! description: parsing helpers for top-level items and statements.
//!
//! Converts the statement-level pairs of `Rule::program` into `AstNode`s.
//! Every node carries the `Location`/`Span` of the pair it came from.
//!
use pest::iterators::Pair;

use crate::{
    ast::{AstNode, AstNodeKind, CScriptErrorExt, Param, TypeName, expr, rules},
    grammar::Rule,
    script,
};

/// Build the `Program` node from the root pair. `EOI` is dropped.
pub(crate) fn parse_program_rule(
    pair: Pair<Rule>,
    script: &script::Script,
) -> Result<AstNode, Box<dyn CScriptErrorExt>> {
    let (inner_pairs, location, span) = rules::get_data_from_rule(&pair, script);
    let mut body = Vec::new();
    for item in inner_pairs {
        if item.as_rule() == Rule::EOI {
            continue;
        }
        body.push(parse_statement_rule(item, script)?);
    }
    Ok(AstNode::new(AstNodeKind::Program { body }, location, span))
}

pub(crate) fn parse_statement_rule(
    pair: Pair<Rule>,
    script: &script::Script,
) -> Result<AstNode, Box<dyn CScriptErrorExt>> {
    match pair.as_rule() {
        Rule::import_stmt => parse_import_rule(pair, script),
        Rule::function_def => parse_function_def_rule(pair, script),
        Rule::if_stmt => parse_if_rule(pair, script),
        Rule::while_stmt => parse_while_rule(pair, script),
        Rule::for_stmt => parse_for_rule(pair, script),
        Rule::return_stmt => parse_return_rule(pair, script),
        Rule::var_decl => parse_var_decl_rule(pair, script),
        Rule::array_decl => parse_array_decl_rule(pair, script),
        Rule::assignment | Rule::for_update => parse_assignment_rule(pair, script),
        Rule::expr_stmt => {
            let (mut inner_pairs, location, span) = rules::get_data_from_rule(&pair, script);
            let expr_pair = rules::fetch_next_pair(&mut inner_pairs, &location, &span)?;
            let expr = expr::parse_expression_rule(expr_pair, script)?;
            Ok(AstNode::new(
                AstNodeKind::ExprStmt {
                    expr: Box::new(expr),
                },
                location,
                span,
            ))
        }
        other => Err(rules::syntax_error(
            format!("Unexpected statement rule {:?}", other),
            "cscript.ast.stmt.parse_statement_rule",
            rules::get_location_from_pair(&pair, script),
            rules::get_span_from_pair(&pair, script),
        )),
    }
}

fn parse_block_rule(
    pair: Pair<Rule>,
    script: &script::Script,
) -> Result<Vec<AstNode>, Box<dyn CScriptErrorExt>> {
    pair.into_inner()
        .map(|stmt| parse_statement_rule(stmt, script))
        .collect()
}

pub(crate) fn parse_type_rule(
    pair: Pair<Rule>,
    script: &script::Script,
) -> Result<TypeName, Box<dyn CScriptErrorExt>> {
    let (mut inner_pairs, location, span) = rules::get_data_from_rule(&pair, script);
    let base = rules::fetch_next_pair(&mut inner_pairs, &location, &span)?;
    let mut ty = TypeName::from_base(base.as_str()).ok_or_else(|| {
        rules::syntax_error(
            format!("Unknown type '{}'", base.as_str()),
            "cscript.ast.stmt.parse_type_rule",
            location.clone(),
            span.clone(),
        )
    })?;
    for _star in inner_pairs {
        ty = ty.pointer_to();
    }
    Ok(ty)
}

fn parse_import_rule(
    pair: Pair<Rule>,
    script: &script::Script,
) -> Result<AstNode, Box<dyn CScriptErrorExt>> {
    let (mut inner_pairs, location, span) = rules::get_data_from_rule(&pair, script);
    let module = rules::fetch_next_pair(&mut inner_pairs, &location, &span)?;
    Ok(AstNode::new(
        AstNodeKind::Import {
            module: module.as_str().to_string(),
        },
        location,
        span,
    ))
}

fn parse_function_def_rule(
    pair: Pair<Rule>,
    script: &script::Script,
) -> Result<AstNode, Box<dyn CScriptErrorExt>> {
    let (mut inner_pairs, location, span) = rules::get_data_from_rule(&pair, script);
    let name = rules::fetch_next_pair(&mut inner_pairs, &location, &span)?
        .as_str()
        .to_string();

    let mut params = Vec::new();
    let mut next = rules::fetch_next_pair(&mut inner_pairs, &location, &span)?;
    if next.as_rule() == Rule::param_list {
        for param in next.into_inner() {
            let (mut parts, p_loc, p_span) = rules::get_data_from_rule(&param, script);
            let ty = parse_type_rule(rules::fetch_next_pair(&mut parts, &p_loc, &p_span)?, script)?;
            let p_name = rules::fetch_next_pair(&mut parts, &p_loc, &p_span)?;
            params.push(Param {
                ty,
                name: p_name.as_str().to_string(),
            });
        }
        next = rules::fetch_next_pair(&mut inner_pairs, &location, &span)?;
    }

    let return_type = parse_type_rule(next, script)?;
    let block = rules::fetch_next_pair(&mut inner_pairs, &location, &span)?;
    let body = parse_block_rule(block, script)?;

    Ok(AstNode::new(
        AstNodeKind::FunctionDef {
            name,
            params,
            return_type,
            body,
        },
        location,
        span,
    ))
}

fn parse_if_rule(
    pair: Pair<Rule>,
    script: &script::Script,
) -> Result<AstNode, Box<dyn CScriptErrorExt>> {
    let (mut inner_pairs, location, span) = rules::get_data_from_rule(&pair, script);
    let condition = expr::parse_expression_rule(
        rules::fetch_next_pair(&mut inner_pairs, &location, &span)?,
        script,
    )?;
    let then_body = parse_block_rule(
        rules::fetch_next_pair(&mut inner_pairs, &location, &span)?,
        script,
    )?;

    // `else if` nests as a single `If` statement in the else body.
    let else_body = match inner_pairs.next() {
        Some(clause) => {
            let (mut clause_pairs, c_loc, c_span) = rules::get_data_from_rule(&clause, script);
            let target = rules::fetch_next_pair(&mut clause_pairs, &c_loc, &c_span)?;
            match target.as_rule() {
                Rule::if_stmt => Some(vec![parse_if_rule(target, script)?]),
                _ => Some(parse_block_rule(target, script)?),
            }
        }
        None => None,
    };

    Ok(AstNode::new(
        AstNodeKind::If {
            condition: Box::new(condition),
            then_body,
            else_body,
        },
        location,
        span,
    ))
}

fn parse_while_rule(
    pair: Pair<Rule>,
    script: &script::Script,
) -> Result<AstNode, Box<dyn CScriptErrorExt>> {
    let (mut inner_pairs, location, span) = rules::get_data_from_rule(&pair, script);
    let condition = expr::parse_expression_rule(
        rules::fetch_next_pair(&mut inner_pairs, &location, &span)?,
        script,
    )?;
    let body = parse_block_rule(
        rules::fetch_next_pair(&mut inner_pairs, &location, &span)?,
        script,
    )?;
    Ok(AstNode::new(
        AstNodeKind::While {
            condition: Box::new(condition),
            body,
        },
        location,
        span,
    ))
}

fn parse_for_rule(
    pair: Pair<Rule>,
    script: &script::Script,
) -> Result<AstNode, Box<dyn CScriptErrorExt>> {
    let (mut inner_pairs, location, span) = rules::get_data_from_rule(&pair, script);
    let init = parse_statement_rule(
        rules::fetch_next_pair(&mut inner_pairs, &location, &span)?,
        script,
    )?;
    let condition = expr::parse_expression_rule(
        rules::fetch_next_pair(&mut inner_pairs, &location, &span)?,
        script,
    )?;
    let update = parse_statement_rule(
        rules::fetch_next_pair(&mut inner_pairs, &location, &span)?,
        script,
    )?;
    let body = parse_block_rule(
        rules::fetch_next_pair(&mut inner_pairs, &location, &span)?,
        script,
    )?;
    Ok(AstNode::new(
        AstNodeKind::For {
            init: Box::new(init),
            condition: Box::new(condition),
            update: Box::new(update),
            body,
        },
        location,
        span,
    ))
}

fn parse_return_rule(
    pair: Pair<Rule>,
    script: &script::Script,
) -> Result<AstNode, Box<dyn CScriptErrorExt>> {
    let (mut inner_pairs, location, span) = rules::get_data_from_rule(&pair, script);
    let value = match inner_pairs.next() {
        Some(expr_pair) => Some(Box::new(expr::parse_expression_rule(expr_pair, script)?)),
        None => None,
    };
    Ok(AstNode::new(AstNodeKind::Return { value }, location, span))
}

fn parse_var_decl_rule(
    pair: Pair<Rule>,
    script: &script::Script,
) -> Result<AstNode, Box<dyn CScriptErrorExt>> {
    let (mut inner_pairs, location, span) = rules::get_data_from_rule(&pair, script);
    let ty = parse_type_rule(
        rules::fetch_next_pair(&mut inner_pairs, &location, &span)?,
        script,
    )?;
    let name = rules::fetch_next_pair(&mut inner_pairs, &location, &span)?
        .as_str()
        .to_string();
    let value = expr::parse_expression_rule(
        rules::fetch_next_pair(&mut inner_pairs, &location, &span)?,
        script,
    )?;
    Ok(AstNode::new(
        AstNodeKind::VarDecl {
            ty,
            name,
            value: Box::new(value),
        },
        location,
        span,
    ))
}

fn parse_array_decl_rule(
    pair: Pair<Rule>,
    script: &script::Script,
) -> Result<AstNode, Box<dyn CScriptErrorExt>> {
    let (mut inner_pairs, location, span) = rules::get_data_from_rule(&pair, script);
    let element_type = parse_type_rule(
        rules::fetch_next_pair(&mut inner_pairs, &location, &span)?,
        script,
    )?;
    let name = rules::fetch_next_pair(&mut inner_pairs, &location, &span)?
        .as_str()
        .to_string();
    let length_pair = rules::fetch_next_pair(&mut inner_pairs, &location, &span)?;
    let length = length_pair.as_str().parse::<u32>().map_err(|_| {
        rules::syntax_error(
            format!("Array length '{}' is out of range", length_pair.as_str()),
            "cscript.ast.stmt.parse_array_decl_rule",
            location.clone(),
            span.clone(),
        )
    })?;
    Ok(AstNode::new(
        AstNodeKind::ArrayDecl {
            element_type,
            name,
            length,
        },
        location,
        span,
    ))
}

fn parse_assignment_rule(
    pair: Pair<Rule>,
    script: &script::Script,
) -> Result<AstNode, Box<dyn CScriptErrorExt>> {
    let (mut inner_pairs, location, span) = rules::get_data_from_rule(&pair, script);
    let target = expr::parse_expression_rule(
        rules::fetch_next_pair(&mut inner_pairs, &location, &span)?,
        script,
    )?;
    let value = expr::parse_expression_rule(
        rules::fetch_next_pair(&mut inner_pairs, &location, &span)?,
        script,
    )?;
    Ok(AstNode::new(
        AstNodeKind::Assign {
            target: Box::new(target),
            value: Box::new(value),
        },
        location,
        span,
    ))
}
