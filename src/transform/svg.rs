//! SVG fragment optimization using oxvg.
//!
//! Many icons end up concatenated into one document at runtime, so their
//! internal ids must not collide. The optimizer shortens referenced ids,
//! drops unreferenced ones and prefixes the rest with the file stem:
//!
//! ```text
//! <linearGradient id="gradient-blue"/> ... fill="url(#gradient-blue)"
//!   -> <linearGradient id="star-a"/> ... fill="url(#star-a)"
//! ```
//!
//! `viewBox` is always kept so icons scale with their container.

use minify_html::{Cfg, minify};
use oxvg_ast::{
    implementations::{roxmltree::parse, shared::Element},
    serialize::{Node, Options},
    visitor::Info,
};
use oxvg_optimiser::Jobs;
use serde_json::{Value, json};
use std::sync::LazyLock;
use thiserror::Error;
use typed_arena::Arena;

use crate::debug;

/// Separator between the file stem and the minified id.
const PREFIX_DELIM: &str = "-";

static SVG_CFG: LazyLock<Cfg> = LazyLock::new(|| Cfg {
    keep_closing_tags: true,
    keep_spaces_between_attributes: true,
    ..Cfg::default()
});

#[derive(Debug, Error)]
pub enum SvgError {
    #[error("parse failed: {0}")]
    Parse(String),

    #[error("invalid optimizer preset: {0}")]
    Preset(#[from] serde_json::Error),

    #[error("optimization failed: {0}")]
    Optimize(String),

    #[error("serialization failed: {0}")]
    Serialize(String),

    #[error("minified output is not utf-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Optimize an SVG fragment, falling back to the input when it does not parse.
pub fn optimize_svg(source: &str, prefix: &str) -> String {
    match try_optimize(source, prefix) {
        Ok(optimized) => optimized,
        Err(e) => {
            debug!("svg"; "kept `{}` unoptimized: {}", prefix, e);
            source.to_string()
        }
    }
}

fn try_optimize(source: &str, prefix: &str) -> Result<String, SvgError> {
    let jobs = icon_jobs(prefix)?;

    let arena = Arena::new();
    let dom = parse(source, &arena).map_err(|e| SvgError::Parse(e.to_string()))?;
    let info = Info::<Element>::new(&arena);
    jobs.run(&dom, &info)
        .map_err(|e| SvgError::Optimize(e.to_string()))?;

    let optimized = dom
        .serialize_with_options(Options::default())
        .map_err(|e| SvgError::Serialize(e.to_string()))?;

    let minified = minify(optimized.as_bytes(), &SVG_CFG);
    Ok(String::from_utf8(minified)?)
}

/// Default preset with id minification on, ids prefixed by `prefix`
/// and `viewBox` kept.
fn icon_jobs(prefix: &str) -> Result<Jobs, SvgError> {
    let mut preset = serde_json::to_value(Jobs::default())?;
    let Value::Object(jobs) = &mut preset else {
        return Err(SvgError::Optimize("preset is not a map".into()));
    };

    let cleanup = jobs.entry("cleanupIds").or_insert_with(|| json!({}));
    if let Value::Object(cleanup) = cleanup {
        cleanup.insert("minify".into(), Value::Bool(true));
    } else {
        *cleanup = json!({ "minify": true });
    }

    if !prefix.is_empty() {
        jobs.insert(
            "prefixIds".into(),
            json!({ "prefix": prefix, "delim": PREFIX_DELIM }),
        );
    }
    jobs.insert("removeViewBox".into(), Value::Null);

    Ok(serde_json::from_value(preset)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    const STAR: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<!-- Generator: hand -->
<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" viewBox="0 0 24 24">
  <defs>
    <linearGradient id="gradient-blue"><stop offset="0" stop-color="#00f"/></linearGradient>
    <path id="shape" d="M0 0L24 24"/>
  </defs>
  <g id="unused">
    <use xlink:href="#shape" fill="url(#gradient-blue)"/>
  </g>
</svg>
"##;

    fn captures(out: &str, pattern: &str) -> Vec<String> {
        Regex::new(pattern)
            .unwrap()
            .captures_iter(out)
            .map(|c| c[1].to_string())
            .collect()
    }

    fn ids(out: &str) -> Vec<String> {
        captures(out, r#"\bid="?([^"\s>]+)"#)
    }

    fn references(out: &str) -> Vec<String> {
        let mut refs = captures(out, r#"href="?#([^"\s>]+)"#);
        refs.extend(captures(out, r#"url\(['"]?#([^'")]+)"#));
        refs
    }

    #[test]
    fn test_ids_prefixed_and_references_rewritten() {
        let out = optimize_svg(STAR, "star");
        let ids = ids(&out);
        let refs = references(&out);

        assert!(!ids.is_empty(), "{out}");
        assert!(ids.iter().all(|id| id.starts_with("star-")), "{out}");
        assert!(refs.len() >= 2, "{out}");
        assert!(refs.iter().all(|r| ids.contains(r)), "{out}");
        assert!(!out.contains("gradient-blue"));
        assert!(!out.contains("shape"));
    }

    #[test]
    fn test_unreferenced_ids_removed() {
        let out = optimize_svg(STAR, "star");
        assert!(!out.contains("unused"), "{out}");
    }

    #[test]
    fn test_viewbox_preserved() {
        let out = optimize_svg(STAR, "star");
        assert!(out.contains("viewBox="), "{out}");
        assert!(out.contains("0 0 24 24"), "{out}");
    }

    #[test]
    fn test_prolog_and_comments_removed() {
        let out = optimize_svg(STAR, "star");
        assert!(out.starts_with("<svg"), "{out}");
        assert!(!out.contains("<?xml"));
        assert!(!out.contains("Generator"));
    }

    #[test]
    fn test_animation_begin_references_survive() {
        let src = r#"<svg xmlns="http://www.w3.org/2000/svg"><circle id="dot" r="1"/><animate id="grow" begin="dot.click" attributeName="r" to="2" dur="1s"/><animate begin="grow.end" attributeName="r" to="1" dur="1s"/></svg>"#;
        let out = optimize_svg(src, "icon");
        let ids = ids(&out);
        let begins = captures(&out, r#"begin="?([^".\s>]+)\."#);

        assert_eq!(begins.len(), 2, "{out}");
        for target in &begins {
            assert!(target.starts_with("icon-"), "{out}");
            assert!(ids.contains(target), "`{target}` lost its id: {out}");
        }
    }

    #[test]
    fn test_unknown_reference_untouched() {
        let src = r#"<svg xmlns="http://www.w3.org/2000/svg"><rect width="1" height="1" fill="url(#elsewhere)"/></svg>"#;
        let out = optimize_svg(src, "x");
        assert!(out.contains("elsewhere"), "{out}");
    }

    #[test]
    fn test_malformed_svg_passes_through() {
        let src = "<svg><g></svg>";
        assert_eq!(optimize_svg(src, "broken"), src);
    }
}
