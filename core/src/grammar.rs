use pest_derive::Parser;

/// pest parser generated from `grammar.pest`. The lexer drives the token
/// rules, the AST builder drives `Rule::program`.
#[derive(Parser)]
#[grammar = "grammar.pest"]
pub struct RulesParser;
