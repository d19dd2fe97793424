//! Config field path used in diagnostics.

use owo_colors::OwoColorize;
use std::fmt;

/// Dotted path of a config field, e.g. `template.body`.
///
/// Diagnostics carry one so the user can find the offending key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldPath(pub &'static str);

impl FieldPath {
    #[inline]
    pub const fn new(path: &'static str) -> Self {
        Self(path)
    }

    #[inline]
    pub const fn as_str(&self) -> &'static str {
        self.0
    }

    /// `template.body` -> `(Some("template"), "body")`, `source` -> `(None, "source")`.
    pub fn split(&self) -> (Option<&'static str>, &'static str) {
        match self.0.split_once('.') {
            Some((table, key)) => (Some(table), key),
            None => (None, self.0),
        }
    }

    /// Whether the field sits in an array of tables (`[[modules]]`).
    pub fn is_array_table(&self) -> bool {
        self.split().0.is_some_and(|table| ARRAY_TABLES.contains(&table))
    }
}

/// Tables written as `[[name]]`, one per entry.
const ARRAY_TABLES: &[&str] = &["modules", "key_rewrite"];

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_args!("`{}`", self.0).bright_blue())
    }
}

impl AsRef<str> for FieldPath {
    fn as_ref(&self) -> &str {
        self.0
    }
}

// Field paths referenced by validation.
pub const SOURCE: FieldPath = FieldPath::new("source");
pub const DESTINATION: FieldPath = FieldPath::new("destination");
pub const OUTPUT_FILENAME: FieldPath = FieldPath::new("output_filename");
pub const MODULES: FieldPath = FieldPath::new("modules");
pub const MODULES_NAME: FieldPath = FieldPath::new("modules.name");
pub const MODULES_SOURCE: FieldPath = FieldPath::new("modules.source");
pub const MODULES_OUTPUT_FILENAME: FieldPath = FieldPath::new("modules.output_filename");
pub const TEMPLATE_HEADER: FieldPath = FieldPath::new("template.header");
pub const TEMPLATE_BODY: FieldPath = FieldPath::new("template.body");
pub const TEMPLATE_SVG_BODY: FieldPath = FieldPath::new("template.svg_body");
pub const KEY_REWRITE_PATTERN: FieldPath = FieldPath::new("key_rewrite.pattern");
