use crate::error::{Level, CScriptErrorExt};
use crate::location::{Location, Span};

/// An unrecognised character. The lexer skips it and keeps going, so this
/// never aborts a compilation on its own.
#[derive(Debug, Clone, PartialEq)]
pub struct LexicalError {
    level: Level,
    character: char,
    issuer: String,
    location: Option<Location>,
}

impl LexicalError {
    pub fn new(character: char, location: Location) -> Self {
        LexicalError {
            level: Level::Error,
            character,
            issuer: "cscript.lexer.next".to_string(),
            location: Some(location),
        }
    }

    pub fn character(&self) -> char {
        self.character
    }

    pub fn line(&self) -> usize {
        self.location.as_ref().map(|l| l.line).unwrap_or(0)
    }
}

impl std::fmt::Display for LexicalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.location {
            Some(loc) => write!(f, "{} (at {})", self.message(), loc),
            None => write!(f, "{}", self.message()),
        }
    }
}

impl std::error::Error for LexicalError {}

impl CScriptErrorExt for LexicalError {
    fn level(&self) -> Level {
        self.level
    }

    fn message(&self) -> String {
        format!("Illegal character '{}'", self.character.escape_default())
    }

    fn issuer(&self) -> String {
        self.issuer.clone()
    }

    fn span(&self) -> Option<Span> {
        self.location.clone().map(|loc| Span::new(loc.clone(), loc))
    }

    fn location(&self) -> Option<Location> {
        self.location.clone()
    }
}
