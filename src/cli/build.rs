//! `tplcache build`: one compilation, written to disk.

use anyhow::Result;

use tplcache::utils::path::display_relative;
use tplcache::utils::plural_count;
use tplcache::{CacheConfig, Compilation, TemplateCache, log};

/// Compile every module; write the assets unless `dry`.
pub fn build(config: CacheConfig, dry: bool) -> Result<()> {
    let output_dir = config.output_dir();
    let cache = TemplateCache::new(config)?;
    let compilation = cache.compile(&output_dir)?;

    if dry {
        print_assets(&compilation, &cache);
        return Ok(());
    }

    compilation.write_all()?;
    log!(
        "build";
        "{} from {}",
        plural_count(compilation.assets.len(), "script"),
        plural_count(compilation.dependencies.len(), "template")
    );
    Ok(())
}

/// One line per asset: size and path relative to the config directory.
fn print_assets(compilation: &Compilation, cache: &TemplateCache) {
    let base = &cache.config().base_dir;
    for asset in &compilation.assets {
        println!("{:>8}  {}", asset.size, display_relative(&asset.path, base));
    }
}
