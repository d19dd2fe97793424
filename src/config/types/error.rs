//! Configuration errors and the validation report.
//!
//! Validation collects every problem before failing. The report groups
//! them under the TOML table they live in, so each line can be matched
//! against `tplcache.toml` directly:
//!
//! ```text
//! invalid config: 2 problems
//!
//! destination
//!   → destination list is empty
//!     hint: remove the key to write into the output directory
//!
//! [[modules]] #2
//!   name → module `admin` is declared more than once
//! ```

use super::FieldPath;
use crate::utils::plural_count;
use owo_colors::OwoColorize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Config file parsing error")]
    Toml(#[from] toml::de::Error),

    #[error("Config validation error: {0}")]
    Validation(String),

    // No #[from]: a source() here prints the report twice.
    #[error("{0}")]
    Diagnostics(ConfigDiagnostics),
}

/// TOML location of a diagnostic: the table header and the key under it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// `None` for top-level keys.
    pub header: Option<String>,
    pub key: &'static str,
}

/// One problem in the config, pointing at a field.
#[derive(Debug, Clone)]
pub struct ConfigDiagnostic {
    pub field: FieldPath,
    /// Index into an array of tables (`[[modules]]`, `[[key_rewrite]]`).
    pub entry: Option<usize>,
    pub message: String,
    pub hint: Option<String>,
}

impl ConfigDiagnostic {
    pub fn new(field: FieldPath, message: impl Into<String>) -> Self {
        Self {
            field,
            entry: None,
            message: message.into(),
            hint: None,
        }
    }

    pub fn at_entry(mut self, index: usize) -> Self {
        self.entry = Some(index);
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Where to look in `tplcache.toml`.
    ///
    /// Entries are numbered from 1, in file order.
    pub fn location(&self) -> Location {
        match self.field.split() {
            (None, key) => Location { header: None, key },
            (Some(table), key) if self.field.is_array_table() => Location {
                header: Some(match self.entry {
                    Some(i) => format!("[[{table}]] #{}", i + 1),
                    None => format!("[[{table}]]"),
                }),
                key,
            },
            (Some(table), key) => Location {
                header: Some(format!("[{table}]")),
                key,
            },
        }
    }

    fn fmt_body(&self, f: &mut fmt::Formatter<'_>, key: Option<&str>) -> fmt::Result {
        match key {
            Some(key) => write!(f, "  {} {} {}", key.cyan(), "→".red(), self.message)?,
            None => write!(f, "  {} {}", "→".red(), self.message)?,
        }
        if let Some(hint) = &self.hint {
            write!(f, "\n    {} {}", "hint:".yellow(), hint)?;
        }
        Ok(())
    }
}

impl fmt::Display for ConfigDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let location = self.location();
        match &location.header {
            Some(header) => {
                writeln!(f, "{}", header.bold())?;
                self.fmt_body(f, Some(location.key))
            }
            None => {
                writeln!(f, "{}", location.key.bold())?;
                self.fmt_body(f, None)
            }
        }
    }
}

/// Every problem found while validating a config, reported together.
#[derive(Debug, Default)]
pub struct ConfigDiagnostics {
    errors: Vec<ConfigDiagnostic>,
}

impl ConfigDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: ConfigDiagnostic) {
        self.errors.push(diagnostic);
    }

    pub fn error(&mut self, field: FieldPath, message: impl Into<String>) {
        self.push(ConfigDiagnostic::new(field, message));
    }

    pub fn error_with_hint(
        &mut self,
        field: FieldPath,
        message: impl Into<String>,
        hint: impl Into<String>,
    ) {
        self.push(ConfigDiagnostic::new(field, message).with_hint(hint));
    }

    /// Report a problem in the `index`th entry of an array of tables.
    pub fn entry_error(&mut self, field: FieldPath, index: usize, message: impl Into<String>) {
        self.push(ConfigDiagnostic::new(field, message).at_entry(index));
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[ConfigDiagnostic] {
        &self.errors
    }

    pub fn into_result(self) -> Result<(), Self> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ConfigDiagnostics {
    /// Consecutive problems under the same table share one header.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}",
            "invalid config:".red().bold(),
            plural_count(self.errors.len(), "problem")
        )?;

        let mut current: Option<Location> = None;
        for err in &self.errors {
            let location = err.location();
            let same_table = current.as_ref().is_some_and(|prev| {
                prev.header.is_some() && prev.header == location.header
            });

            if same_table {
                writeln!(f)?;
            } else {
                write!(f, "\n\n{}", location.header.as_deref().unwrap_or(location.key).bold())?;
                writeln!(f)?;
            }
            err.fmt_body(f, location.header.as_ref().map(|_| location.key))?;
            current = Some(location);
        }
        Ok(())
    }
}

impl std::error::Error for ConfigDiagnostics {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::field::{
        DESTINATION, MODULES_NAME, MODULES_SOURCE, TEMPLATE_BODY,
    };
    use std::io::{Error, ErrorKind};

    /// Report with color codes stripped.
    fn plain(diag: &ConfigDiagnostics) -> String {
        let ansi = regex::Regex::new("\x1b\\[[0-9;]*m").unwrap();
        ansi.replace_all(&diag.to_string(), "").into_owned()
    }

    #[test]
    fn test_config_error_display() {
        let io_err = ConfigError::Io(
            PathBuf::from("tplcache.toml"),
            Error::new(ErrorKind::NotFound, "file not found"),
        );
        let display = format!("{io_err}");
        assert!(display.contains("IO error"));
        assert!(display.contains("tplcache.toml"));

        let validation_err = ConfigError::Validation("bad key_rewrite".to_string());
        assert!(format!("{validation_err}").contains("bad key_rewrite"));
    }

    #[test]
    fn test_locations() {
        let top = ConfigDiagnostic::new(DESTINATION, "x").location();
        assert_eq!(top.header, None);
        assert_eq!(top.key, "destination");

        let table = ConfigDiagnostic::new(TEMPLATE_BODY, "x").location();
        assert_eq!(table.header.as_deref(), Some("[template]"));
        assert_eq!(table.key, "body");

        let entry = ConfigDiagnostic::new(MODULES_NAME, "x").at_entry(1).location();
        assert_eq!(entry.header.as_deref(), Some("[[modules]] #2"));
        assert_eq!(entry.key, "name");
    }

    #[test]
    fn test_report_groups_by_table() {
        let mut diag = ConfigDiagnostics::new();
        diag.error_with_hint(
            DESTINATION,
            "destination list is empty",
            "remove the key to write into the output directory",
        );
        diag.entry_error(MODULES_NAME, 0, "module name is empty");
        diag.entry_error(MODULES_SOURCE, 0, "module `` has an empty source list");
        diag.entry_error(MODULES_NAME, 2, "module `a` is declared more than once");

        let report = plain(&diag);
        assert!(report.starts_with("invalid config: 4 problems"), "{report}");
        assert!(report.contains("destination\n  → destination list is empty\n    hint: remove"), "{report}");
        assert!(
            report.contains("[[modules]] #1\n  name → module name is empty\n  source → module ``"),
            "{report}"
        );
        assert!(report.contains("[[modules]] #3\n  name → module `a`"), "{report}");
        assert_eq!(report.matches("[[modules]] #1").count(), 1);
    }

    #[test]
    fn test_collect_and_into_result() {
        let mut diag = ConfigDiagnostics::new();
        assert!(diag.is_empty());
        diag.error(TEMPLATE_BODY, "unknown placeholder `x`");
        assert_eq!(diag.len(), 1);
        assert!(diag.into_result().is_err());
        assert!(ConfigDiagnostics::new().into_result().is_ok());
    }
}
