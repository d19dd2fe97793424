//! Cache key derivation.
//!
//! ```text
//! root = "app/", glob = "src/views/**/*.html"
//! src/views/users/list.html  ->  glob base "src/views"  ->  "app/users/list.html"
//! ```

use regex::Regex;
use std::path::Path;

use crate::config::KeyRewrite;

/// Hook applied to every computed cache key before it is rendered.
pub trait KeyTransform {
    fn transform(&self, key: &str) -> String;
}

impl<F> KeyTransform for F
where
    F: Fn(&str) -> String,
{
    fn transform(&self, key: &str) -> String {
        self(key)
    }
}

/// `[[key_rewrite]]` rules, applied in order.
#[derive(Debug, Clone)]
pub struct RewriteRules {
    rules: Vec<(Regex, String)>,
}

impl RewriteRules {
    pub fn compile(rules: &[KeyRewrite]) -> Result<Self, regex::Error> {
        let rules = rules
            .iter()
            .map(|rule| Ok((Regex::new(&rule.pattern)?, rule.replace.clone())))
            .collect::<Result<_, regex::Error>>()?;
        Ok(Self { rules })
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl KeyTransform for RewriteRules {
    fn transform(&self, key: &str) -> String {
        self.rules
            .iter()
            .fold(key.to_string(), |key, (pattern, replace)| {
                pattern.replace_all(&key, replace.as_str()).into_owned()
            })
    }
}

/// Default key for `file`: `root` joined with its path relative to `base`.
///
/// A root of `.` or starting with `./` keeps a leading `./` that the join
/// would otherwise normalize away.
pub fn cache_key(root: &str, base: &Path, file: &Path) -> String {
    let relative = file.strip_prefix(base).unwrap_or(file);
    let relative = to_url_path(relative);
    let url = join_url(root, &relative);
    if root == "." || root.starts_with("./") {
        format!("./{url}")
    } else {
        url
    }
}

/// Path with `/` separators regardless of platform.
fn to_url_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Join and normalize URL path segments (`.` dropped, `..` resolved,
/// repeated slashes collapsed).
pub fn join_url(root: &str, relative: &str) -> String {
    let joined = match (root.is_empty(), relative.is_empty()) {
        (true, true) => return ".".to_string(),
        (true, false) => relative.to_string(),
        (false, true) => root.to_string(),
        (false, false) => format!("{root}/{relative}"),
    };

    let absolute = joined.starts_with('/');
    let trailing = joined.ends_with('/');
    let mut segments: Vec<&str> = Vec::new();

    for segment in joined.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.last().is_some_and(|last| *last != "..") {
                    segments.pop();
                } else if !absolute {
                    segments.push("..");
                }
            }
            s => segments.push(s),
        }
    }

    let mut url = segments.join("/");
    if absolute {
        url.insert(0, '/');
    }
    if url.is_empty() {
        return ".".to_string();
    }
    if trailing && !url.ends_with('/') {
        url.push('/');
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_cache_key_with_root() {
        let key = cache_key(
            "app/",
            Path::new("/site/app"),
            Path::new("/site/app/widget.html"),
        );
        assert_eq!(key, "app/widget.html");
    }

    #[test]
    fn test_cache_key_nested() {
        let key = cache_key(
            "/views",
            Path::new("/site/src"),
            Path::new("/site/src/users/list.html"),
        );
        assert_eq!(key, "/views/users/list.html");
    }

    #[test]
    fn test_cache_key_empty_root() {
        let key = cache_key("", Path::new("/site/src"), Path::new("/site/src/a.html"));
        assert_eq!(key, "a.html");
    }

    #[test]
    fn test_cache_key_dot_root() {
        let base = Path::new("/site/src");
        let file = Path::new("/site/src/a/b.html");
        assert_eq!(cache_key(".", base, file), "./a/b.html");
        assert_eq!(cache_key("./", base, file), "./a/b.html");
        assert_eq!(cache_key("./tpl", base, file), "./tpl/a/b.html");
    }

    #[test]
    fn test_cache_key_is_idempotent() {
        let base = PathBuf::from("/site/src");
        let file = base.join("x.html");
        assert_eq!(cache_key(".", &base, &file), cache_key(".", &base, &file));
    }

    #[test]
    fn test_cache_key_outside_base_uses_full_path() {
        let key = cache_key("", Path::new("/other"), Path::new("shared/a.html"));
        assert_eq!(key, "shared/a.html");
    }

    #[test]
    fn test_join_url_normalization() {
        assert_eq!(join_url("app//", "x.html"), "app/x.html");
        assert_eq!(join_url("app/../lib", "x.html"), "lib/x.html");
        assert_eq!(join_url("", "../x.html"), "../x.html");
        assert_eq!(join_url("/", "x.html"), "/x.html");
        assert_eq!(join_url("app", ""), "app");
        assert_eq!(join_url("app/", ""), "app/");
        assert_eq!(join_url("", ""), ".");
        assert_eq!(join_url(".", ""), ".");
    }

    #[test]
    fn test_closure_transform() {
        let upper = |key: &str| key.to_uppercase();
        assert_eq!(upper.transform("app/a.html"), "APP/A.HTML");
    }

    #[test]
    fn test_rewrite_rules() {
        let rules = RewriteRules::compile(&[
            KeyRewrite {
                pattern: r"^src/".into(),
                replace: String::new(),
            },
            KeyRewrite {
                pattern: r"\.html$".into(),
                replace: ".tpl.html".into(),
            },
        ])
        .unwrap();
        assert!(!rules.is_empty());
        assert_eq!(rules.transform("src/users/list.html"), "users/list.tpl.html");
    }

    #[test]
    fn test_rewrite_rules_capture_groups() {
        let rules = RewriteRules::compile(&[KeyRewrite {
            pattern: r"^(\w+)/(.*)$".into(),
            replace: "$2@$1".into(),
        }])
        .unwrap();
        assert_eq!(rules.transform("views/a.html"), "a.html@views");
    }

    #[test]
    fn test_rewrite_rules_invalid_pattern() {
        let result = RewriteRules::compile(&[KeyRewrite {
            pattern: "(".into(),
            replace: String::new(),
        }]);
        assert!(result.is_err());
    }
}
