//! file: core/src/config.rs
//! description: options controlling a single compilation.
//!
//! `CompileOptions` is plain data: callers build it in code or load it from
//! JSON, then hand it to `compile_script`/`lower_ast_to_ir`.
//!
use serde::{Deserialize, Serialize};

pub const DEFAULT_MODULE_NAME: &str = "c-script";
pub const DEFAULT_ENTRY_POINT: &str = "main";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    /// Name recorded in the emitted module header.
    pub module_name: String,
    /// Name of the function synthesised from loose top-level statements.
    pub entry_point: String,
    /// Target triple written into the module, if any.
    pub target_triple: Option<String>,
    /// Reject a user function that collides with the synthesised entry point
    /// instead of silently dropping the loose statements.
    pub strict_entry_point: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            module_name: DEFAULT_MODULE_NAME.to_string(),
            entry_point: DEFAULT_ENTRY_POINT.to_string(),
            target_triple: host_triple().map(str::to_string),
            strict_entry_point: false,
        }
    }
}

impl CompileOptions {
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn with_entry_point(mut self, name: &str) -> Self {
        self.entry_point = name.to_string();
        self
    }

    pub fn strict(mut self) -> Self {
        self.strict_entry_point = true;
        self
    }
}

fn host_triple() -> Option<&'static str> {
    if cfg!(all(target_os = "linux", target_arch = "x86_64")) {
        Some("x86_64-pc-linux-gnu")
    } else if cfg!(all(target_os = "macos", target_arch = "aarch64")) {
        Some("aarch64-apple-darwin")
    } else if cfg!(all(target_os = "macos", target_arch = "x86_64")) {
        Some("x86_64-apple-darwin")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let opts = CompileOptions::from_json(r#"{ "strict_entry_point": true }"#).unwrap();
        assert!(opts.strict_entry_point);
        assert_eq!(opts.entry_point, "main");
        assert_eq!(opts.module_name, "c-script");
    }
}
