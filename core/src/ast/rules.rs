use pest::iterators::{Pair, Pairs};

use crate::error::CScriptErrorExt;
use crate::grammar::Rule;
use crate::location::{Location, Span};
use crate::script::Script;

use super::err::SyntaxError;

pub(crate) fn syntax_error(
    message: String,
    issuer: &str,
    location: Option<Location>,
    span: Option<Span>,
) -> Box<dyn CScriptErrorExt> {
    Box::new(SyntaxError::with(
        crate::Level::Error,
        message,
        issuer.to_string(),
        location,
        span,
    ))
}

pub(crate) fn fetch_next_pair<'a>(
    pairs: &mut Pairs<'a, Rule>,
    location: &Option<Location>,
    span: &Option<Span>,
) -> Result<Pair<'a, Rule>, Box<dyn CScriptErrorExt>> {
    pairs.next().ok_or_else(|| {
        syntax_error(
            "Expected more inner pairs but found none.".into(),
            "cscript.ast.rules.fetch_next_pair",
            location.clone(),
            span.clone(),
        )
    })
}

pub(crate) fn get_data_from_rule<'a>(
    rule: &Pair<'a, Rule>,
    script: &Script,
) -> (Pairs<'a, Rule>, Option<Location>, Option<Span>) {
    let inner_rules = rule.clone().into_inner();
    let span = get_span_from_pair(rule, script);
    let location = get_location_from_pair(rule, script);
    (inner_rules, location, span)
}

pub fn get_location_from_pair(rule: &Pair<Rule>, script: &Script) -> Option<Location> {
    let (line, column) = rule.as_span().start_pos().line_col();
    Some(Location::new(script.name.clone(), line, column))
}

pub fn get_span_from_pair(rule: &Pair<Rule>, script: &Script) -> Option<Span> {
    let span = rule.as_span();
    let (start_line, start_col) = span.start_pos().line_col();
    let (end_line, end_col) = span.end_pos().line_col();
    Some(Span::new(
        Location::new(script.name.clone(), start_line, start_col),
        Location::new(script.name.clone(), end_line, end_col),
    ))
}
