//! file: core/src/lexer/mod.rs
//! description: source text -> token stream.
//!
//! Tokens are recognised by the `lex_token` rule of the shared pest grammar,
//! one token per call. Whitespace and comments are discarded, newlines only
//! advance the line counter. An unrecognised character is reported, dropped
//! and scanning resumes on the next character.
//!
pub mod err;
pub mod token;

pub use err::LexicalError;
pub use token::{Token, TokenKind, TokenValue};

use log::{debug, warn};
use pest::Parser;

use crate::grammar::{Rule, RulesParser};
use crate::location::Location;
use crate::script::Script;

/// Lazy token iterator over one source text. Yields a single `Eof` token
/// last, then `None`.
pub struct Lexer<'a> {
    source: &'a str,
    file: String,
    pos: usize,
    line: usize,
    column: usize,
    finished: bool,
    errors: Vec<LexicalError>,
}

impl<'a> Lexer<'a> {
    pub fn new(script: &'a Script) -> Self {
        Lexer::with_name(&script.name, &script.content)
    }

    pub fn with_name(name: &str, source: &'a str) -> Self {
        Lexer {
            source,
            file: name.to_string(),
            pos: 0,
            line: 1,
            column: 1,
            finished: false,
            errors: Vec::new(),
        }
    }

    /// Rewind to the start of the source and forget earlier diagnostics.
    pub fn reset(&mut self) {
        self.pos = 0;
        self.line = 1;
        self.column = 1;
        self.finished = false;
        self.errors.clear();
    }

    pub fn errors(&self) -> &[LexicalError] {
        &self.errors
    }

    pub fn take_errors(&mut self) -> Vec<LexicalError> {
        std::mem::take(&mut self.errors)
    }

    fn location(&self) -> Location {
        Location::new(self.file.clone(), self.line, self.column)
    }

    fn advance(&mut self, text: &str) {
        for c in text.chars() {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.pos += text.len();
    }

    fn scan_token(&self, rest: &'a str) -> Option<(Token, &'a str)> {
        let mut pairs = RulesParser::parse(Rule::lex_token, rest).ok()?;
        let inner = pairs.next()?.into_inner().next()?;
        let text = inner.as_str();
        let location = self.location();
        let token = match inner.as_rule() {
            Rule::float_lit => Token::new(
                TokenKind::FloatLiteral,
                text,
                text.parse::<f64>().map(TokenValue::Float).unwrap_or(TokenValue::None),
                location,
            ),
            Rule::number => Token::new(
                TokenKind::IntLiteral,
                text,
                text.parse::<i64>().map(TokenValue::Int).unwrap_or(TokenValue::None),
                location,
            ),
            Rule::string_lit => Token::new(
                TokenKind::StringLiteral,
                text,
                TokenValue::Bytes(decode_escapes(&text[1..text.len() - 1])),
                location,
            ),
            Rule::word => Token::new(TokenKind::from_word(text), text, TokenValue::None, location),
            Rule::symbol => Token::new(TokenKind::from_symbol(text)?, text, TokenValue::None, location),
            _ => return None,
        };
        Some((token, text))
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.finished {
            return None;
        }
        let source: &'a str = self.source;
        loop {
            let rest = &source[self.pos..];
            let Some(c) = rest.chars().next() else {
                self.finished = true;
                return Some(Token::eof(self.location()));
            };

            if matches!(c, ' ' | '\t' | '\r' | '\n') {
                self.advance(&rest[..c.len_utf8()]);
                continue;
            }

            if c == '/' {
                if let Some(comment) = RulesParser::parse(Rule::comment, rest)
                    .ok()
                    .and_then(|mut pairs| pairs.next())
                {
                    self.advance(comment.as_str());
                    continue;
                }
            }

            if let Some((token, text)) = self.scan_token(rest) {
                self.advance(text);
                return Some(token);
            }

            let err = LexicalError::new(c, self.location());
            warn!("{}", err);
            self.errors.push(err);
            self.advance(&rest[..c.len_utf8()]);
        }
    }
}

/// Fully materialised lexer output: every token (ending in `Eof`) plus the
/// characters that were skipped.
#[derive(Debug, Clone)]
pub struct TokenStream {
    pub tokens: Vec<Token>,
    pub errors: Vec<LexicalError>,
}

impl TokenStream {
    pub fn is_empty(&self) -> bool {
        self.tokens.iter().all(Token::is_eof)
    }

    /// Lay the tokens back out at their original line/column. Skipped
    /// characters leave a gap, so tokens on either side stay separate.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let (mut line, mut column) = (1usize, 1usize);
        for token in self.tokens.iter().filter(|t| !t.is_eof()) {
            while line < token.location.line {
                out.push('\n');
                line += 1;
                column = 1;
            }
            if line == token.location.line && column > token.location.column {
                out.push(' ');
                column += 1;
            }
            while column < token.location.column {
                out.push(' ');
                column += 1;
            }
            for c in token.text.chars() {
                out.push(c);
                if c == '\n' {
                    line += 1;
                    column = 1;
                } else {
                    column += 1;
                }
            }
        }
        out
    }

    /// Token covering the given position, else the next one after it
    /// (`Eof` at worst).
    pub fn token_at(&self, line: usize, column: usize) -> Option<&Token> {
        self.tokens.iter().find(|t| {
            t.is_eof()
                || t.location.is_at_or_after(line, column)
                || (t.location.line == line
                    && column < t.location.column + t.text.chars().count())
        })
    }
}

pub fn tokenize(script: &Script) -> TokenStream {
    let mut lexer = Lexer::new(script);
    let tokens: Vec<Token> = lexer.by_ref().collect();
    let errors = lexer.take_errors();
    debug!(
        "lexed {} token(s) from {} with {} illegal character(s)",
        tokens.len(),
        script.name,
        errors.len()
    );
    TokenStream { tokens, errors }
}

/// Decode backslash escapes inside a string literal body into the bytes
/// the literal denotes. `\xHH` and octal escapes yield one raw byte each;
/// unknown escapes are kept as written.
pub fn decode_escapes(raw: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            push_char(&mut out, c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push(b'\n'),
            Some('t') => out.push(b'\t'),
            Some('r') => out.push(b'\r'),
            Some('a') => out.push(0x07),
            Some('b') => out.push(0x08),
            Some('f') => out.push(0x0C),
            Some('v') => out.push(0x0B),
            Some('\\') => out.push(b'\\'),
            Some('\'') => out.push(b'\''),
            Some('"') => out.push(b'"'),
            Some('x') => {
                let mut hex = String::new();
                while hex.len() < 2 {
                    match chars.peek() {
                        Some(h) if h.is_ascii_hexdigit() => {
                            hex.push(*h);
                            chars.next();
                        }
                        _ => break,
                    }
                }
                match u8::from_str_radix(&hex, 16) {
                    Ok(byte) if hex.len() == 2 => out.push(byte),
                    _ => {
                        out.extend_from_slice(b"\\x");
                        out.extend_from_slice(hex.as_bytes());
                    }
                }
            }
            Some(d) if d.is_digit(8) => {
                let mut value = d.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match chars.peek().and_then(|o| o.to_digit(8)) {
                        Some(o) => {
                            value = value * 8 + o;
                            chars.next();
                        }
                        None => break,
                    }
                }
                out.push((value & 0xFF) as u8);
            }
            Some(other) => {
                out.push(b'\\');
                push_char(&mut out, other);
            }
            None => out.push(b'\\'),
        }
    }
    out
}

fn push_char(out: &mut Vec<u8>, c: char) {
    let mut buf = [0u8; 4];
    out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::with_name("t.cs", src).map(|t| t.kind).collect()
    }

    #[test]
    fn keywords_shadow_identifiers() {
        assert_eq!(
            kinds("int intx print"),
            vec![TokenKind::Int, TokenKind::Identifier, TokenKind::Print, TokenKind::Eof]
        );
    }

    #[test]
    fn two_character_operators_win() {
        assert_eq!(
            kinds("a <= b == c != d >= e"),
            vec![
                TokenKind::Identifier,
                TokenKind::Le,
                TokenKind::Identifier,
                TokenKind::EqEq,
                TokenKind::Identifier,
                TokenKind::NotEq,
                TokenKind::Identifier,
                TokenKind::Ge,
                TokenKind::Identifier,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn illegal_character_is_skipped_and_reported() {
        let mut lexer = Lexer::with_name("t.cs", "int $x = 1;");
        let toks: Vec<Token> = lexer.by_ref().collect();
        assert_eq!(toks.len(), 6);
        assert_eq!(toks[1].text, "x");
        assert_eq!(lexer.errors().len(), 1);
        assert_eq!(lexer.errors()[0].character(), '$');
    }

    #[test]
    fn newlines_and_comments_only_move_the_line_counter() {
        let toks: Vec<Token> = Lexer::with_name("t.cs", "a // one\n/* two\n */ b").collect();
        assert_eq!(toks[0].line(), 1);
        assert_eq!(toks[1].text, "b");
        assert_eq!(toks[1].line(), 3);
    }

    #[test]
    fn string_literal_is_decoded() {
        let toks: Vec<Token> = Lexer::with_name("t.cs", r#""a\tb\n\x41""#).collect();
        assert_eq!(toks[0].value, TokenValue::Bytes(b"a\tb\nA".to_vec()));
    }

    #[test]
    fn numeric_escapes_are_single_bytes() {
        assert_eq!(decode_escapes(r"\xff\377\x7"), vec![0xFF, 0xFF, b'\\', b'x', b'7']);
        assert_eq!(decode_escapes("é"), "é".as_bytes().to_vec());
    }

    #[test]
    fn reset_restarts_the_scan() {
        let mut lexer = Lexer::with_name("t.cs", "x;");
        assert_eq!(lexer.by_ref().count(), 3);
        assert!(lexer.next().is_none());
        lexer.reset();
        assert_eq!(lexer.next().map(|t| t.kind), Some(TokenKind::Identifier));
    }

    #[test]
    fn render_keeps_positions_and_drops_skipped_characters() {
        let script = Script::from_source("t.cs", "int a$b;\n  x;");
        let stream = tokenize(&script);
        assert_eq!(stream.render(), "int a b;\n  x;");
    }
}
