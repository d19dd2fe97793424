//! Markup fragment minification using minify-html.
//!
//! minify-html drops whitespace-only text between elements, which changes
//! how inline siblings render. Such gaps are swapped for a private-use
//! marker before minifying and restored as a single space afterwards.

use minify_html::Cfg;
use regex::Regex;
use std::sync::LazyLock;

/// Fixed minification policy for template fragments.
///
/// Whitespace is collapsed and comments are removed. Closing tags are kept
/// because fragments are injected into arbitrary parents. `type="text"` on
/// inputs stays since CSS frameworks select on it. `{{ }}` bindings are
/// never touched.
static FRAGMENT_CFG: LazyLock<Cfg> = LazyLock::new(|| Cfg {
    keep_closing_tags: true,
    keep_comments: false,
    keep_html_and_head_opening_tags: true,
    keep_input_type_text_attr: true,
    keep_spaces_between_attributes: true,
    preserve_brace_template_syntax: true,
    minify_css: false,
    minify_js: false,
    ..Cfg::default()
});

/// Stands in for a whitespace gap while minify-html runs.
const GAP: char = '\u{E000}';

/// Whitespace-only run between two tags.
static TAG_GAP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r">\s+<").expect("valid gap regex"));

/// Elements whose contents keep their whitespace verbatim.
static VERBATIM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<pre\b.*?</pre\s*>|<textarea\b.*?</textarea\s*>|<script\b.*?</script\s*>|<style\b.*?</style\s*>")
        .expect("valid verbatim regex")
});

/// Minify a markup fragment. Never fails: malformed input is minified best-effort.
///
/// Whitespace between sibling tags collapses to one space instead of
/// disappearing. Leading and trailing whitespace of the fragment is trimmed.
pub fn minify_markup(source: &[u8]) -> String {
    let text = String::from_utf8_lossy(source);
    let marked = mark_gaps(text.trim());
    let minified = minify_html::minify(marked.as_bytes(), &FRAGMENT_CFG);
    String::from_utf8_lossy(&minified).replace(GAP, " ")
}

/// Replace tag gaps with [`GAP`], leaving verbatim elements alone.
fn mark_gaps(source: &str) -> String {
    let marker = format!(">{GAP}<");
    let mut out = String::with_capacity(source.len());
    let mut last = 0;

    for verbatim in VERBATIM.find_iter(source) {
        out.push_str(&TAG_GAP.replace_all(&source[last..verbatim.start()], marker.as_str()));
        out.push_str(verbatim.as_str());
        last = verbatim.end();
    }
    out.push_str(&TAG_GAP.replace_all(&source[last..], marker.as_str()));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(minify_markup(b"<div>  Hi  </div>"), "<div>Hi</div>");
    }

    #[test]
    fn test_structural_whitespace_trimmed() {
        let out = minify_markup(b"\n\n   <div>\n    <p>text</p>\n  </div>\n\n");
        assert_eq!(out, out.trim());
        assert!(out.contains("<p>text</p>"));
        assert!(!out.contains('\n'));
    }

    #[test]
    fn test_sibling_whitespace_collapses_to_one_space() {
        let out = minify_markup(b"<button>A</button>   <button>B</button>");
        assert_eq!(out, "<button>A</button> <button>B</button>");

        let out = minify_markup(b"<label>Name</label>\n  <input ng-model=\"n\">");
        assert!(out.starts_with("<label>Name</label> <input"), "{out}");

        let out = minify_markup(b"<div><span>a</span> <span>b</span></div>");
        assert!(out.contains("<span>a</span> <span>b</span>"), "{out}");
    }

    #[test]
    fn test_pre_whitespace_untouched() {
        let out = minify_markup(b"<pre><b>a</b>\n    <b>b</b></pre>");
        assert!(out.contains("<b>a</b>\n    <b>b</b>"), "{out}");
    }

    #[test]
    fn test_attributes_stay_separated() {
        let out = minify_markup(b"<div ng-if=\"a && b\" ng-class=\"{'x': y}\">z</div>");
        assert!(!out.contains("\"ng-"), "{out}");
        assert!(out.contains("ng-if="), "{out}");
        assert!(out.contains("ng-class="), "{out}");
    }

    #[test]
    fn test_comments_removed() {
        let out = minify_markup(b"<div><!-- note --><span>x</span></div>");
        assert!(!out.contains("note"));
        assert!(out.contains("<span>x</span>"));
    }

    #[test]
    fn test_angular_bindings_preserved() {
        let out = minify_markup(b"<li ng-repeat=\"item in items\">{{ item.name }}</li>");
        assert!(out.contains("{{ item.name }}"));
        assert!(out.contains("ng-repeat"));
        assert!(out.contains("</li>"));
    }

    #[test]
    fn test_malformed_markup_passes() {
        let out = minify_markup(b"<div><span>unclosed");
        assert!(out.contains("unclosed"));
    }
}
