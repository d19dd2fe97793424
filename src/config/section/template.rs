//! `[template]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [template]
//! header = "angular.module('<%= module %>'<%= standalone %>).run(['$templateCache', function($templateCache) {"
//! body = '$templateCache.put("<%= url %>","<%= contents %>");'
//! svg_body = '$templateCache.put("<%= url %>",`<%= contents %>`);'
//! footer = "}]);"
//! ```
//!
//! | Template   | Placeholders           |
//! |------------|------------------------|
//! | `header`   | `module`, `standalone` |
//! | `body`     | `url`, `contents`      |
//! | `svg_body` | `url`, `contents`      |
//! | `footer`   | none (emitted as-is)   |

use serde::{Deserialize, Serialize};

use crate::config::types::field::{TEMPLATE_BODY, TEMPLATE_HEADER, TEMPLATE_SVG_BODY};
use crate::config::{ConfigDiagnostics, FieldPath};
use crate::render::{BodyVars, HeaderVars, Template, TemplateError, TemplateVars, Templates};

pub const DEFAULT_HEADER: &str =
    "angular.module('<%= module %>'<%= standalone %>).run(['$templateCache', function($templateCache) {";
pub const DEFAULT_BODY: &str = r#"$templateCache.put("<%= url %>","<%= contents %>");"#;
pub const DEFAULT_SVG_BODY: &str = r#"$templateCache.put("<%= url %>",`<%= contents %>`);"#;
pub const DEFAULT_FOOTER: &str = "}]);";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateConfig {
    /// Wrapping registration statement, rendered once per module.
    pub header: String,
    /// One statement per markup fragment.
    pub body: String,
    /// One statement per SVG fragment.
    pub svg_body: String,
    pub footer: String,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            header: DEFAULT_HEADER.to_string(),
            body: DEFAULT_BODY.to_string(),
            svg_body: DEFAULT_SVG_BODY.to_string(),
            footer: DEFAULT_FOOTER.to_string(),
        }
    }
}

impl TemplateConfig {
    /// Parse and check every template.
    pub fn compile(&self) -> Result<Templates, TemplateError> {
        Ok(Templates {
            header: parse_checked::<HeaderVars>(&self.header)?,
            body: parse_checked::<BodyVars>(&self.body)?,
            svg_body: parse_checked::<BodyVars>(&self.svg_body)?,
            footer: self.footer.clone(),
        })
    }

    /// Report template problems against their field paths.
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        check_field::<HeaderVars>(&self.header, TEMPLATE_HEADER, diag);
        check_field::<BodyVars>(&self.body, TEMPLATE_BODY, diag);
        check_field::<BodyVars>(&self.svg_body, TEMPLATE_SVG_BODY, diag);
    }
}

fn parse_checked<V: TemplateVars>(source: &str) -> Result<Template, TemplateError> {
    let template = Template::parse(source)?;
    template.check::<V>()?;
    Ok(template)
}

fn check_field<V: TemplateVars>(source: &str, field: FieldPath, diag: &mut ConfigDiagnostics) {
    if let Err(e) = parse_checked::<V>(source) {
        diag.error(field, e.to_string());
    }
}
