pub mod ast;
pub mod config;
pub mod error;
pub mod grammar;
pub mod ir;
pub mod lexer;
pub mod location;
pub mod reports;
pub mod script;

pub use ast::{generate_ast_from_source, parse_token_stream};
pub use config::CompileOptions;
pub use error::{CScriptErrorExt, Level};
pub use grammar::RulesParser;
pub use ir::{IrModule, lower_ast_to_ir};
pub use lexer::tokenize;
pub use location::{Location, Span};
pub use reports::{Report, ReportCollector};
pub use script::Script;

use log::{debug, warn};

pub fn generate_error_report(error: &dyn CScriptErrorExt) -> String {
    let level = error.level();
    let location = match error.location() {
        Some(loc) => loc.to_string(),
        None => "unknown location".to_string(),
    };
    let message = error.message();

    format!("CSCRIPT | {} | {} | {}", level, location, message)
}

/// A successfully generated module plus the non-fatal diagnostics
/// (skipped characters) met on the way.
#[derive(Debug)]
pub struct Compilation {
    pub module: IrModule,
    pub reports: ReportCollector,
}

impl Compilation {
    /// Textual IR for the whole module.
    pub fn ir_text(&self) -> String {
        self.module.to_string()
    }
}

/// Lex, parse and lower `script`. Lexical errors are recorded and skipped;
/// the first syntax or lowering error aborts the run.
pub fn compile_script(
    script: &Script,
    options: &CompileOptions,
) -> Result<Compilation, Box<dyn CScriptErrorExt>> {
    let stream = lexer::tokenize(script);
    let mut reports = ReportCollector::new();
    for err in &stream.errors {
        warn!("{}", generate_error_report(err));
        reports.push_error(err);
    }

    let ast = parse_token_stream(&stream, script)?;
    let module = lower_ast_to_ir(&ast, options)?;
    debug!(
        "compiled {} with {} report(s)",
        script.name,
        reports.len()
    );
    Ok(Compilation { module, reports })
}

/// `compile_script` over in-memory text.
pub fn compile_source(
    source: &str,
    options: &CompileOptions,
) -> Result<Compilation, Box<dyn CScriptErrorExt>> {
    compile_script(&Script::from_source("<source>", source), options)
}
