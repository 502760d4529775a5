use crate::error::{CScriptErrorExt, Level};
use crate::location::{Location, Span};

#[derive(Debug, Clone)]
pub struct EmptyScriptError {
    level: Level,
    message: String,
    issuer: String,
    location: Option<Location>,
    span: Option<Span>,
}

impl EmptyScriptError {
    pub fn new(issuer: String, location: Option<Location>, span: Option<Span>) -> Self {
        EmptyScriptError {
            level: Level::Error,
            message: "The provided script contains no statements.".to_string(),
            issuer,
            location,
            span,
        }
    }
}

impl std::fmt::Display for EmptyScriptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(loc) = &self.location {
            write!(f, "{} (at {})", self.message, loc)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for EmptyScriptError {}

impl CScriptErrorExt for EmptyScriptError {
    fn level(&self) -> Level {
        self.level
    }

    fn message(&self) -> String {
        self.message.clone()
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

/// The token stream cannot be derived from `program`. Parsing stops at the
/// first one.
#[derive(Debug, Clone)]
pub struct SyntaxError {
    level: Level,
    message: String,
    issuer: String,
    location: Option<Location>,
    span: Option<Span>,
}

impl SyntaxError {
    pub fn with(
        level: Level,
        message: String,
        issuer: String,
        location: Option<Location>,
        span: Option<Span>,
    ) -> Self {
        SyntaxError {
            level,
            message,
            issuer,
            location,
            span,
        }
    }

    /// Report the token the grammar could not accept.
    pub fn unexpected(token: &crate::lexer::Token) -> Self {
        let message = if token.is_eof() {
            format!("Syntax error: unexpected end of input on line {}", token.line())
        } else {
            format!(
                "Syntax error: unexpected token {} on line {}",
                token,
                token.line()
            )
        };
        SyntaxError::with(
            Level::Error,
            message,
            "cscript.ast.parse_program".to_string(),
            Some(token.location.clone()),
            None,
        )
    }
}

impl std::fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(loc) = &self.location {
            write!(f, "{} (at {})", self.message, loc)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for SyntaxError {}

impl CScriptErrorExt for SyntaxError {
    fn level(&self) -> Level {
        self.level
    }

    fn message(&self) -> String {
        self.message.clone()
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
