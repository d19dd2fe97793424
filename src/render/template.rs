//! Placeholder templates for the generated script.
//!
//! Supports the lodash-style tags users already write for this kind of plugin:
//!
//! | Tag             | Effect                                   |
//! |-----------------|------------------------------------------|
//! | `<%= name %>`   | insert value as-is                       |
//! | `<%- name %>`   | insert value HTML-escaped                |
//! | `${ name }`     | insert value as-is (ES template form)    |
//!
//! Evaluate blocks (`<% code %>`) are rejected at parse time.

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

use crate::utils::html;

/// Matches a complete tag. Group 1: `=`/`-`/empty, group 2: `<% %>` body,
/// group 3: `${ }` body.
static TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<%([=-]?)([\s\S]*?)%>|\$\{([^}]*)\}").expect("valid tag regex")
});

static IDENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").expect("valid ident regex"));

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("unterminated `<%` tag at byte {0}")]
    Unterminated(usize),

    #[error("evaluate blocks (`<% ... %>`) are not supported (at byte {0})")]
    Evaluate(usize),

    #[error("`{0}` is not a valid placeholder name")]
    InvalidName(String),

    #[error("unknown placeholder `{name}`, available: {available}")]
    UnknownVariable { name: String, available: String },
}

/// Values a template can reference.
pub trait TemplateVars {
    /// Every name this variable set provides.
    const NAMES: &'static [&'static str];

    fn get(&self, name: &str) -> Option<&str>;
}

/// `module` and `standalone` for the header template.
pub struct HeaderVars<'a> {
    pub module: &'a str,
    pub standalone: &'a str,
}

impl TemplateVars for HeaderVars<'_> {
    const NAMES: &'static [&'static str] = &["module", "standalone"];

    fn get(&self, name: &str) -> Option<&str> {
        match name {
            "module" => Some(self.module),
            "standalone" => Some(self.standalone),
            _ => None,
        }
    }
}

/// `url` and `contents` for the body templates.
pub struct BodyVars<'a> {
    pub url: &'a str,
    pub contents: &'a str,
}

impl TemplateVars for BodyVars<'_> {
    const NAMES: &'static [&'static str] = &["url", "contents"];

    fn get(&self, name: &str) -> Option<&str> {
        match name {
            "url" => Some(self.url),
            "contents" => Some(self.contents),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Value { name: String, escape: bool },
}

/// A parsed template, ready to render many times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut last = 0;

        for caps in TAG.captures_iter(source) {
            let Some(whole) = caps.get(0) else { continue };
            push_literal(&mut segments, &source[last..whole.start()])?;
            last = whole.end();

            let (name, escape) = match (caps.get(2), caps.get(3)) {
                (Some(body), _) => match caps.get(1).map(|m| m.as_str()) {
                    Some("=") => (body.as_str(), false),
                    Some("-") => (body.as_str(), true),
                    _ => return Err(TemplateError::Evaluate(whole.start())),
                },
                (None, Some(body)) => (body.as_str(), false),
                (None, None) => continue,
            };

            let name = name.trim();
            if !IDENT.is_match(name) {
                return Err(TemplateError::InvalidName(name.to_string()));
            }
            segments.push(Segment::Value {
                name: name.to_string(),
                escape,
            });
        }
        push_literal(&mut segments, &source[last..])?;

        Ok(Self { segments })
    }

    /// Names referenced by this template, in order of appearance.
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Value { name, .. } => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Check every placeholder against the names `V` provides.
    pub fn check<V: TemplateVars>(&self) -> Result<(), TemplateError> {
        match self.placeholders().find(|name| !V::NAMES.contains(name)) {
            Some(name) => Err(unknown::<V>(name)),
            None => Ok(()),
        }
    }

    pub fn render<V: TemplateVars>(&self, vars: &V) -> Result<String, TemplateError> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Value { name, escape } => {
                    let value = vars.get(name).ok_or_else(|| unknown::<V>(name))?;
                    if *escape {
                        out.push_str(&html::escape(value));
                    } else {
                        out.push_str(value);
                    }
                }
            }
        }
        Ok(out)
    }
}

/// The four templates making up one generated script.
///
/// The footer is emitted verbatim.
#[derive(Debug, Clone)]
pub struct Templates {
    pub header: Template,
    pub body: Template,
    pub svg_body: Template,
    pub footer: String,
}

fn push_literal(segments: &mut Vec<Segment>, text: &str) -> Result<(), TemplateError> {
    if let Some(pos) = text.find("<%") {
        return Err(TemplateError::Unterminated(pos));
    }
    if !text.is_empty() {
        segments.push(Segment::Literal(text.to_string()));
    }
    Ok(())
}

fn unknown<V: TemplateVars>(name: &str) -> TemplateError {
    TemplateError::UnknownVariable {
        name: name.to_string(),
        available: V::NAMES.join(", "),
    }
}
