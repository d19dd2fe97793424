//! Command-line interface module.

mod args;
pub mod build;
pub mod init;
pub mod list;
pub mod watch;

pub use args::{Cli, Commands};

use anyhow::{Context, Result};

use tplcache::config::{CacheConfig, find_config_file};
use tplcache::log;

/// Locate and load the config file, applying CLI overrides.
///
/// Exits when no config file exists, pointing at `tplcache init`.
pub fn load_config(cli: &Cli) -> Result<CacheConfig> {
    let Some(path) = find_config_file(&cli.config) else {
        log!(
            "error";
            "config file '{}' not found. Run 'tplcache init' to create one.",
            cli.config.display()
        );
        std::process::exit(1);
    };

    let mut config = CacheConfig::from_path(&path)
        .with_context(|| format!("failed to load config '{}'", path.display()))?;
    if let Some(build_args) = cli.build_args() {
        config.apply_overrides(&build_args.overrides());
    }
    Ok(config)
}
