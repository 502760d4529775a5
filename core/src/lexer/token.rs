//! Token vocabulary produced by the lexer.
use std::fmt;

use serde::Serialize;

use crate::location::Location;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    // Literals
    Identifier,
    IntLiteral,
    FloatLiteral,
    StringLiteral,

    // Keywords
    Int,
    Float,
    Char,
    Void,
    If,
    Else,
    While,
    For,
    Print,
    Fopen,
    Fread,
    Fwrite,
    Fclose,
    Def,
    Return,
    Import,

    // Operators
    Plus,   // +
    Minus,  // -
    Star,   // *
    Slash,  // /
    Assign, // =
    EqEq,   // ==
    NotEq,  // !=
    Lt,     // <
    Le,     // <=
    Gt,     // >
    Ge,     // >=
    Amp,    // &
    Arrow,  // ->

    // Punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Semi,
    Comma,

    Eof,
}

impl TokenKind {
    /// Reserved words shadow the generic identifier tag.
    pub fn from_word(word: &str) -> TokenKind {
        match word {
            "int" => TokenKind::Int,
            "float" => TokenKind::Float,
            "char" => TokenKind::Char,
            "void" => TokenKind::Void,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "while" => TokenKind::While,
            "for" => TokenKind::For,
            "print" => TokenKind::Print,
            "fopen" => TokenKind::Fopen,
            "fread" => TokenKind::Fread,
            "fwrite" => TokenKind::Fwrite,
            "fclose" => TokenKind::Fclose,
            "def" => TokenKind::Def,
            "return" => TokenKind::Return,
            "import" => TokenKind::Import,
            _ => TokenKind::Identifier,
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<TokenKind> {
        let kind = match symbol {
            "+" => TokenKind::Plus,
            "-" => TokenKind::Minus,
            "*" => TokenKind::Star,
            "/" => TokenKind::Slash,
            "=" => TokenKind::Assign,
            "==" => TokenKind::EqEq,
            "!=" => TokenKind::NotEq,
            "<" => TokenKind::Lt,
            "<=" => TokenKind::Le,
            ">" => TokenKind::Gt,
            ">=" => TokenKind::Ge,
            "&" => TokenKind::Amp,
            "->" => TokenKind::Arrow,
            "(" => TokenKind::LParen,
            ")" => TokenKind::RParen,
            "{" => TokenKind::LBrace,
            "}" => TokenKind::RBrace,
            "[" => TokenKind::LBracket,
            "]" => TokenKind::RBracket,
            ";" => TokenKind::Semi,
            "," => TokenKind::Comma,
            _ => return None,
        };
        Some(kind)
    }

    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::Int
                | TokenKind::Float
                | TokenKind::Char
                | TokenKind::Void
                | TokenKind::If
                | TokenKind::Else
                | TokenKind::While
                | TokenKind::For
                | TokenKind::Print
                | TokenKind::Fopen
                | TokenKind::Fread
                | TokenKind::Fwrite
                | TokenKind::Fclose
                | TokenKind::Def
                | TokenKind::Return
                | TokenKind::Import
        )
    }
}

/// Decoded payload of a literal token.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TokenValue {
    None,
    Int(i64),
    Float(f64),
    /// Decoded string literal bytes.
    Bytes(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    /// Source text exactly as matched (string literals keep their quotes).
    pub text: String,
    pub value: TokenValue,
    pub location: Location,
}

impl Token {
    pub fn new(kind: TokenKind, text: &str, value: TokenValue, location: Location) -> Self {
        Token {
            kind,
            text: text.to_string(),
            value,
            location,
        }
    }

    pub fn eof(location: Location) -> Self {
        Token::new(TokenKind::Eof, "", TokenValue::None, location)
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }

    pub fn line(&self) -> usize {
        self.location.line
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_eof() {
            write!(f, "end of input")
        } else {
            write!(f, "'{}'", self.text)
        }
    }
}
