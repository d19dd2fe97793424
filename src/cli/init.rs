//! `tplcache init`: starter configuration.

use anyhow::{Context, Result, bail};
use std::{fs, path::Path};

use tplcache::config::section::{DEFAULT_BODY, DEFAULT_FOOTER, DEFAULT_HEADER, DEFAULT_SVG_BODY};
use tplcache::config::{DEFAULT_FILENAME, DEFAULT_MODULE, DEFAULT_OUTPUT};
use tplcache::log;

/// Generate tplcache.toml content with comments
pub fn generate_config_template() -> String {
    format!(
        r#"# tplcache configuration file (v{version})

# Host output directory (relative to this file)
output = "{output}"
# Folder(s) under `output` receiving the script
destination = [""]
output_filename = "{filename}"

# Shorthand for a single module; use [[modules]] for several
module = "{module}"
# Prefix of every cache key
root = ""
source = "src/**/*.{{html,svg}}"
# Register as `angular.module(name, [])`
standalone = false

# [[modules]]
# name = "admin"
# root = "admin/"
# source = ["admin/**/*.html"]
# output_filename = "admin-templates.js"

[template]
header = {header:?}
body = '{body}'
svg_body = '{svg_body}'
footer = "{footer}"

[escape]
quotes = "double"   # single | double | backtick
minimal = false
script_context = false

# Rewrite cache keys, applied in order
# [[key_rewrite]]
# pattern = '\.html$'
# replace = ".tpl.html"
"#,
        version = env!("CARGO_PKG_VERSION"),
        output = DEFAULT_OUTPUT,
        filename = DEFAULT_FILENAME,
        module = DEFAULT_MODULE,
        header = DEFAULT_HEADER,
        body = DEFAULT_BODY,
        svg_body = DEFAULT_SVG_BODY,
        footer = DEFAULT_FOOTER,
    )
}

/// Write the starter config to `path`, or print it when `dry`.
///
/// An existing file is never overwritten.
pub fn init(path: &Path, dry: bool) -> Result<()> {
    if dry {
        print!("{}", generate_config_template());
        return Ok(());
    }

    if path.exists() {
        bail!("'{}' already exists", path.display());
    }

    fs::write(path, generate_config_template())
        .with_context(|| format!("failed to write config file '{}'", path.display()))?;
    log!("init"; "wrote {}", path.display());
    Ok(())
}
