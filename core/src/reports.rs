//! file: core/src/reports.rs
//! description: diagnostics collected over one compilation.
//!
//! Lexical errors never stop the pipeline, so they are gathered here and
//! handed back next to the module. Any `CScriptErrorExt` can be turned into
//! a `Report`.
//!
use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{CScriptErrorExt, Level};
use crate::location::Location;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub message: String,
    pub level: Level,
    pub issuer: String,
    pub location: Option<Location>,
}

impl Report {
    pub fn new(message: &str, level: Level, issuer: &str, location: Option<Location>) -> Self {
        Report {
            message: message.to_string(),
            level,
            issuer: issuer.to_string(),
            location,
        }
    }

    pub fn from_error(error: &dyn CScriptErrorExt) -> Self {
        Report {
            message: error.message(),
            level: error.level(),
            issuer: error.issuer(),
            location: error.location(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Editor-style diagnostic with 0-based positions.
    pub fn to_lsp_diagnostic(&self) -> serde_json::Value {
        let range = match &self.location {
            Some(loc) => json!({
                "start": { "line": loc.line.saturating_sub(1), "character": loc.column.saturating_sub(1) },
                "end": { "line": loc.line.saturating_sub(1), "character": loc.column }
            }),
            None => serde_json::Value::Null,
        };
        json!({
            "severity": match self.level {
                Level::Critical | Level::Error => 1,
                Level::Warning => 2,
                Level::Info => 3,
            },
            "source": self.issuer,
            "message": self.message,
            "range": range,
        })
    }

    /// The report followed by the offending source line and a caret under
    /// the column.
    pub fn render_with_source(&self, source: &str) -> String {
        let mut out = self.to_string();
        let Some(loc) = &self.location else {
            return out;
        };
        if let Some(line) = source.lines().nth(loc.line.saturating_sub(1)) {
            out.push_str(&format!("\n {:4} | {}", loc.line, line));
            out.push_str(&format!(
                "\n      | {}^",
                " ".repeat(loc.column.saturating_sub(1))
            ));
        }
        out
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(l) => write!(f, "[{}] {}: {}", self.level, l, self.message),
            None => write!(f, "[{}] {}", self.level, self.message),
        }
    }
}

impl std::error::Error for Report {}

/// Ordered, de-duplicated set of reports.
#[derive(Debug, Clone, Default)]
pub struct ReportCollector {
    reports: Vec<Report>,
    seen: HashSet<(String, Option<Location>)>,
}

impl ReportCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Same message at the same place is kept once.
    pub fn push(&mut self, report: Report) {
        let key = (report.message.clone(), report.location.clone());
        if self.seen.insert(key) {
            self.reports.push(report);
        }
    }

    pub fn push_error(&mut self, error: &dyn CScriptErrorExt) {
        self.push(Report::from_error(error));
    }

    pub fn extend(&mut self, others: impl IntoIterator<Item = Report>) {
        for r in others {
            self.push(r);
        }
    }

    pub fn reports(&self) -> &[Report] {
        &self.reports
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.reports
            .iter()
            .any(|r| matches!(r.level, Level::Error | Level::Critical))
    }

    pub fn has_warnings(&self) -> bool {
        self.reports.iter().any(|r| r.level == Level::Warning)
    }

    /// (critical, error, warning, info)
    pub fn counts(&self) -> (usize, usize, usize, usize) {
        let (mut c, mut e, mut w, mut i) = (0, 0, 0, 0);
        for r in &self.reports {
            match r.level {
                Level::Critical => c += 1,
                Level::Error => e += 1,
                Level::Warning => w += 1,
                Level::Info => i += 1,
            }
        }
        (c, e, w, i)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.reports)
    }

    /// Diagnostics grouped by file name.
    pub fn to_lsp_array(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        for r in &self.reports {
            let file = r
                .location
                .as_ref()
                .map(|l| l.file.clone())
                .unwrap_or_else(|| "<unknown>".to_string());
            let entry = map.entry(file).or_insert_with(|| json!([]));
            if let serde_json::Value::Array(arr) = entry {
                arr.push(r.to_lsp_diagnostic());
            }
        }
        serde_json::Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::LexicalError;

    #[test]
    fn duplicates_are_dropped() {
        let err = LexicalError::new('$', Location::new("a.cs".into(), 1, 5));
        let mut reports = ReportCollector::new();
        reports.push_error(&err);
        reports.push_error(&err);
        assert_eq!(reports.len(), 1);
        assert!(reports.has_errors());
        assert_eq!(reports.counts(), (0, 1, 0, 0));
    }

    #[test]
    fn caret_sits_under_the_column() {
        let err = LexicalError::new('$', Location::new("a.cs".into(), 1, 5));
        let text = Report::from_error(&err).render_with_source("int $x = 1;");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].ends_with("int $x = 1;"));
        assert_eq!(lines[2], "      |     ^");
    }

    #[test]
    fn lsp_positions_are_zero_based() {
        let report = Report::new("boom", Level::Warning, "test", Some(Location::new("f".into(), 3, 2)));
        let diag = report.to_lsp_diagnostic();
        assert_eq!(diag["severity"], 2);
        assert_eq!(diag["range"]["start"]["line"], 2);
        assert_eq!(diag["range"]["start"]["character"], 1);
    }
}
