//! Content transformation per fragment kind.
//!
//! - [`html`]: markup minification (minify-html)
//! - [`svg`]: SVG optimization with a per-file id prefix (oxvg)

pub mod html;
pub mod svg;

use std::path::Path;

pub use html::minify_markup;
pub use svg::optimize_svg;

/// Which branch of the transformer a file takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Markup,
    Svg,
}

impl ContentKind {
    /// `.svg` files are vector graphics, everything else is markup.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("svg") => Self::Svg,
            _ => Self::Markup,
        }
    }
}

/// Transform raw file contents according to `kind`.
///
/// SVG ids are prefixed with the file stem so fragments stay unique
/// once concatenated.
pub fn transform(path: &Path, kind: ContentKind, raw: &[u8]) -> String {
    match kind {
        ContentKind::Markup => minify_markup(raw),
        ContentKind::Svg => {
            let prefix = path
                .file_stem()
                .map(|s| s.to_string_lossy())
                .unwrap_or_default();
            optimize_svg(&String::from_utf8_lossy(raw), &prefix)
        }
    }
}
