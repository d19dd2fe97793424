//! Escaping of fragment contents for script string literals.
//!
//! Output is always valid inside a literal delimited by the configured
//! quote character. With `minimal = false` (the default) the result is
//! pure printable ASCII.

use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Quote character the escaped string will be embedded in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quotes {
    Single,
    #[default]
    Double,
    Backtick,
}

impl Quotes {
    pub const fn as_char(self) -> char {
        match self {
            Self::Single => '\'',
            Self::Double => '"',
            Self::Backtick => '`',
        }
    }
}

/// `[escape]` section.
///
/// ```toml
/// [escape]
/// quotes = "double"       # single | double | backtick
/// wrap = false            # surround output with the quote character
/// minimal = false         # only escape what the literal requires
/// es6 = false             # \u{1F600} instead of surrogate pairs
/// lowercase_hex = false
/// script_context = false  # neutralize </script and <!--
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EscapeOptions {
    pub quotes: Quotes,
    pub wrap: bool,
    pub minimal: bool,
    pub es6: bool,
    pub lowercase_hex: bool,
    pub script_context: bool,
}

/// Escape `input` for a script string literal.
pub fn escape_js(input: &str, options: &EscapeOptions) -> String {
    let quote = options.quotes.as_char();
    let mut out = String::with_capacity(input.len() + input.len() / 8 + 2);

    if options.wrap {
        out.push(quote);
    }

    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\0' => {
                // `\0` followed by a digit would read as an octal escape
                if chars.peek().is_some_and(char::is_ascii_digit) {
                    push_hex(&mut out, 0, options);
                } else {
                    out.push_str("\\0");
                }
            }
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            ' '..='~' => out.push(c),
            c if options.minimal && !needs_escape_minimal(c) => out.push(c),
            c => push_code_point(&mut out, c, options),
        }
    }

    if options.wrap {
        out.push(quote);
    }

    if options.script_context {
        out = neutralize_script_context(&out);
    }

    out
}

/// Characters a literal cannot hold raw even in minimal mode.
fn needs_escape_minimal(c: char) -> bool {
    c.is_control() || matches!(c, '\u{2028}' | '\u{2029}')
}

fn push_code_point(out: &mut String, c: char, options: &EscapeOptions) {
    let cp = c as u32;
    if cp <= 0xFF {
        push_hex(out, cp, options);
    } else if cp <= 0xFFFF {
        push_unicode(out, cp, options);
    } else if options.es6 {
        out.push_str("\\u{");
        push_digits(out, cp, 0, options);
        out.push('}');
    } else {
        let mut units = [0u16; 2];
        for unit in c.encode_utf16(&mut units) {
            push_unicode(out, u32::from(*unit), options);
        }
    }
}

fn push_hex(out: &mut String, cp: u32, options: &EscapeOptions) {
    out.push_str("\\x");
    push_digits(out, cp, 2, options);
}

fn push_unicode(out: &mut String, cp: u32, options: &EscapeOptions) {
    out.push_str("\\u");
    push_digits(out, cp, 4, options);
}

fn push_digits(out: &mut String, value: u32, width: usize, options: &EscapeOptions) {
    if options.lowercase_hex {
        let _ = write!(out, "{value:0width$x}");
    } else {
        let _ = write!(out, "{value:0width$X}");
    }
}

/// Break up `</script` and `<!--` so an inline script block cannot be closed early.
fn neutralize_script_context(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(pos) = rest.find('<') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        if tail
            .get(..8)
            .is_some_and(|head| head.eq_ignore_ascii_case("</script"))
        {
            out.push_str("<\\/");
            rest = &tail[2..];
        } else if tail.starts_with("<!--") {
            out.push_str("\\x3C!--");
            rest = &tail[4..];
        } else {
            out.push('<');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}

/// Keep contents intact inside a backtick literal.
///
/// Only the three sequences that would end the literal or start an
/// interpolation are escaped.
pub fn escape_template_literal(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str("\\\\"),
            '`' => out.push_str("\\`"),
            '$' if chars.peek() == Some(&'{') => out.push_str("\\$"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn escape(input: &str) -> String {
        escape_js(input, &EscapeOptions::default())
    }

    #[test]
    fn test_printable_ascii_unchanged() {
        assert_eq!(escape("<div class=a>Hi</div>"), "<div class=a>Hi</div>");
    }

    #[test]
    fn test_quotes_and_backslash() {
        assert_eq!(escape(r#"a "b" 'c' \d"#), r#"a \"b\" 'c' \\d"#);

        let single = EscapeOptions {
            quotes: Quotes::Single,
            ..Default::default()
        };
        assert_eq!(escape_js(r#"a "b" 'c'"#, &single), r#"a "b" \'c\'"#);

        let backtick = EscapeOptions {
            quotes: Quotes::Backtick,
            ..Default::default()
        };
        assert_eq!(escape_js("a `b`", &backtick), "a \\`b\\`");
    }

    #[test]
    fn test_control_characters() {
        assert_eq!(escape("a\nb\tc\r\u{8}\u{c}"), "a\\nb\\tc\\r\\b\\f");
        assert_eq!(escape("\u{1}"), "\\x01");
        assert_eq!(escape("\0a"), "\\0a");
        assert_eq!(escape("\x001"), "\\x001");
    }

    #[test]
    fn test_non_ascii() {
        assert_eq!(escape("©"), "\\xA9");
        assert_eq!(escape("é"), "\\xE9");
        assert_eq!(escape("€"), "\\u20AC");
        assert_eq!(escape("😀"), "\\uD83D\\uDE00");
    }

    #[test]
    fn test_es6_and_lowercase() {
        let options = EscapeOptions {
            es6: true,
            lowercase_hex: true,
            ..Default::default()
        };
        assert_eq!(escape_js("😀©", &options), "\\u{1f600}\\xa9");
    }

    #[test]
    fn test_minimal_keeps_unicode() {
        let options = EscapeOptions {
            minimal: true,
            ..Default::default()
        };
        assert_eq!(escape_js("é € \"q\"\n", &options), "é € \\\"q\\\"\\n");
        assert_eq!(escape_js("\u{2028}", &options), "\\u2028");
    }

    #[test]
    fn test_wrap() {
        let options = EscapeOptions {
            wrap: true,
            ..Default::default()
        };
        assert_eq!(escape_js("a\"b", &options), "\"a\\\"b\"");
    }

    #[test]
    fn test_script_context() {
        let options = EscapeOptions {
            script_context: true,
            ..Default::default()
        };
        assert_eq!(
            escape_js("<script></SCRIPT><!-- x -->", &options),
            "<script><\\/SCRIPT>\\x3C!-- x -->"
        );
    }

    #[test]
    fn test_template_literal() {
        assert_eq!(
            escape_template_literal("<svg>`${a}` $b \\</svg>"),
            "<svg>\\`\\${a}\\` $b \\\\</svg>"
        );
    }
}
