//! Template rendering: cache keys, escaping and placeholder templates.
//!
//! - [`key`]: cache key derivation and key transforms
//! - [`escape`]: script string literal escaping
//! - [`template`]: `<%= name %>` placeholder templates

pub mod escape;
pub mod key;
pub mod template;

pub use escape::{EscapeOptions, Quotes, escape_js, escape_template_literal};
pub use key::{KeyTransform, RewriteRules, cache_key};
pub use template::{BodyVars, HeaderVars, Template, TemplateError, TemplateVars, Templates};
