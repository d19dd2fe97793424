//! Source collection.
//!
//! Expands each module's source entries into concrete files, in order:
//!
//! - an entry containing `*`, `?`, `[` or `{` is a glob (brace alternatives
//!   expanded first, matches sorted, dotfiles skipped, directories dropped)
//! - any other entry is a literal path, kept even when it does not exist
//!   so the read fails loudly at render time
//!
//! Every file remembers the directory its key is computed from: the glob
//! parent of the entry that produced it.

use rustc_hash::{FxHashMap, FxHashSet};
use std::path::{Path, PathBuf};

use crate::config::ModuleSpec;
use crate::debug;
use crate::error::{CacheError, Result};

/// One file to be cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// File to read.
    pub path: PathBuf,
    /// Directory the cache key is relative to.
    pub base: PathBuf,
}

/// Module name → ordered file list, computed once per resolve.
#[derive(Debug, Default, Clone)]
pub struct ResolvedFileSet {
    files: FxHashMap<String, Vec<SourceFile>>,
}

impl ResolvedFileSet {
    pub fn resolve(modules: &[ModuleSpec], base_dir: &Path) -> Result<Self> {
        let mut files = FxHashMap::default();
        for module in modules {
            let list = collect(module, base_dir)?;
            debug!("source"; "module `{}`: {} file(s)", module.name, list.len());
            files.insert(module.name.clone(), list);
        }
        Ok(Self { files })
    }

    /// Files of `module`, empty when unknown.
    pub fn get(&self, module: &str) -> &[SourceFile] {
        self.files.get(module).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total number of files across all modules.
    pub fn len(&self) -> usize {
        self.files.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Expand the source entries of one module.
pub fn collect(module: &ModuleSpec, base_dir: &Path) -> Result<Vec<SourceFile>> {
    let mut files = Vec::new();

    for entry in &module.source {
        if !is_pattern(entry) {
            let path = base_dir.join(entry);
            let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
            files.push(SourceFile { path, base });
            continue;
        }

        let base = base_dir.join(glob_parent(entry));
        let mut seen = FxHashSet::default();

        for pattern in expand_braces(entry) {
            let full = absolute_pattern(&pattern, base_dir);
            let paths = glob::glob_with(&full, match_options()).map_err(|source| {
                CacheError::Pattern {
                    pattern: pattern.clone(),
                    source,
                }
            })?;

            for found in paths {
                match found {
                    Ok(path) if path.is_file() => {
                        if seen.insert(path.clone()) {
                            files.push(SourceFile {
                                path,
                                base: base.clone(),
                            });
                        }
                    }
                    Ok(_) => {}
                    Err(e) => debug!("source"; "skipping unreadable entry: {}", e),
                }
            }
        }
    }

    Ok(files)
}

/// Glob options matching shell conventions: `*` stops at `/`, dotfiles need a literal dot.
fn match_options() -> glob::MatchOptions {
    glob::MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: true,
    }
}

fn absolute_pattern(pattern: &str, base_dir: &Path) -> String {
    if Path::new(pattern).is_absolute() {
        return pattern.to_string();
    }
    let base = glob::Pattern::escape(&base_dir.to_string_lossy());
    if base.is_empty() {
        pattern.to_string()
    } else {
        format!("{}/{}", base.trim_end_matches('/'), pattern)
    }
}

/// Whether a source entry is a glob rather than a literal path.
pub fn is_pattern(entry: &str) -> bool {
    entry.contains(['*', '?', '[', '{'])
}

/// Check that every brace alternative of `pattern` is a valid glob.
pub fn check_pattern(pattern: &str) -> std::result::Result<(), glob::PatternError> {
    for expanded in expand_braces(pattern) {
        if is_pattern(&expanded) {
            glob::Pattern::new(&expanded)?;
        }
    }
    Ok(())
}

/// Longest leading run of path segments free of glob syntax.
///
/// ```text
/// src/app/**/*.html  ->  src/app
/// *.html             ->  (empty)
/// /abs/{a,b}/*.svg   ->  /abs
/// src/app/a.html     ->  src/app
/// ```
pub fn glob_parent(pattern: &str) -> PathBuf {
    let segments: Vec<&str> = pattern.split('/').collect();
    let Some((_last, dirs)) = segments.split_last() else {
        return PathBuf::new();
    };

    let literal: Vec<&str> = dirs
        .iter()
        .take_while(|segment| !is_pattern(segment))
        .copied()
        .collect();

    if literal.len() == 1 && literal[0].is_empty() {
        return PathBuf::from("/");
    }
    PathBuf::from(literal.join("/"))
}

/// Expand `{a,b}` alternatives (nested braces included).
///
/// A brace group without a top-level comma is kept literally.
pub fn expand_braces(pattern: &str) -> Vec<String> {
    let mut search_from = 0;
    while let Some(offset) = pattern[search_from..].find('{') {
        let open = search_from + offset;
        let Some((close, parts)) = split_brace_group(pattern, open) else {
            break;
        };
        if parts.len() > 1 {
            let prefix = &pattern[..open];
            let suffix = &pattern[close + 1..];
            return parts
                .iter()
                .flat_map(|part| expand_braces(&format!("{prefix}{part}{suffix}")))
                .collect();
        }
        search_from = close + 1;
    }
    vec![pattern.to_string()]
}

/// Split the group opening at `open` on top-level commas.
///
/// Returns the index of the matching `}` and the alternatives.
fn split_brace_group(pattern: &str, open: usize) -> Option<(usize, Vec<&str>)> {
    let mut depth = 0usize;
    let mut parts = Vec::new();
    let mut start = open + 1;

    for (i, b) in pattern.bytes().enumerate().skip(open) {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    parts.push(&pattern[start..i]);
                    return Some((i, parts));
                }
            }
            b',' if depth == 1 => {
                parts.push(&pattern[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    None
}
