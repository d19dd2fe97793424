//! Configuration sections.

mod key;
mod module;
mod template;

pub use key::{KeyRewrite, validate_rewrites};
pub use module::{ModuleConfig, ModuleSpec};
pub use template::{DEFAULT_BODY, DEFAULT_FOOTER, DEFAULT_HEADER, DEFAULT_SVG_BODY, TemplateConfig};
