//! `[[modules]]` section configuration.
//!
//! Each entry is one template-cache group with its own generated script.
//!
//! # Example
//!
//! ```toml
//! [[modules]]
//! name = "app.templates"
//! root = "app/"                          # cache key prefix (default: top-level `root`)
//! source = ["src/app/**/*.html", "src/icons/*.svg"]
//! output_filename = "app-templates.js"   # default: top-level `output_filename`
//! ```

use serde::{Deserialize, Serialize};

use crate::config::OneOrMany;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleConfig {
    /// Angular module name the templates are registered on.
    #[serde(alias = "module_name")]
    pub name: String,

    /// URL prefix for every generated cache key.
    #[serde(default)]
    pub root: Option<String>,

    /// Glob pattern(s) or literal file path(s).
    pub source: OneOrMany<String>,

    /// Generated script name(s).
    #[serde(default)]
    pub output_filename: Option<OneOrMany<String>>,
}

/// A fully resolved module, every optional field filled in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleSpec {
    pub name: String,
    pub root: String,
    pub source: Vec<String>,
    pub output_filenames: Vec<String>,
}

impl ModuleConfig {
    /// Fill unset fields from the top-level defaults.
    pub fn resolve(&self, default_root: &str, default_filenames: &OneOrMany<String>) -> ModuleSpec {
        ModuleSpec {
            name: self.name.clone(),
            root: self
                .root
                .clone()
                .unwrap_or_else(|| default_root.to_string()),
            source: self.source.to_vec(),
            output_filenames: self
                .output_filename
                .as_ref()
                .unwrap_or(default_filenames)
                .to_vec(),
        }
    }
}
