//! `[[key_rewrite]]` section configuration.
//!
//! Regex rewrites applied in order to every computed cache key.
//!
//! # Example
//!
//! ```toml
//! [[key_rewrite]]
//! pattern = "^src/"
//! replace = ""
//!
//! [[key_rewrite]]
//! pattern = '\.html$'
//! replace = ".tpl.html"
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::ConfigDiagnostics;
use crate::config::types::field::KEY_REWRITE_PATTERN;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRewrite {
    /// Regex matched against the key.
    pub pattern: String,
    /// Replacement, may reference groups as `$1` or `${name}`.
    #[serde(default)]
    pub replace: String,
}

pub fn validate_rewrites(rules: &[KeyRewrite], diag: &mut ConfigDiagnostics) {
    for (i, rule) in rules.iter().enumerate() {
        if let Err(e) = Regex::new(&rule.pattern) {
            diag.entry_error(
                KEY_REWRITE_PATTERN,
                i,
                format!("invalid pattern `{}`: {}", rule.pattern, e),
            );
        }
    }
}
