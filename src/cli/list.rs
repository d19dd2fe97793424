//! `tplcache list`: resolved files and cache keys per module.

use anyhow::Result;
use owo_colors::OwoColorize;
use serde::Serialize;

use tplcache::utils::path::display_relative;
use tplcache::{CacheConfig, TemplateCache};

#[derive(Debug, Serialize)]
struct ModuleListing {
    name: String,
    outputs: Vec<String>,
    files: Vec<FileListing>,
}

#[derive(Debug, Serialize)]
struct FileListing {
    path: String,
    key: String,
}

pub fn list(config: CacheConfig, json: bool) -> Result<()> {
    let cache = TemplateCache::new(config)?;
    let listings = collect(&cache);

    if json {
        println!("{}", serde_json::to_string_pretty(&listings)?);
        return Ok(());
    }

    for module in &listings {
        println!("{} -> {}", module.name.bold(), module.outputs.join(", "));
        for file in &module.files {
            println!("  {}  {}", file.key.cyan(), file.path.dimmed());
        }
    }
    Ok(())
}

fn collect(cache: &TemplateCache) -> Vec<ModuleListing> {
    let config = cache.config();
    let base = &config.base_dir;

    cache
        .modules()
        .iter()
        .map(|module| ModuleListing {
            name: module.name.clone(),
            outputs: config
                .relative_outputs(module)
                .iter()
                .map(|p| config.output.join(p).display().to_string())
                .collect(),
            files: cache
                .files(&module.name)
                .iter()
                .map(|file| FileListing {
                    path: display_relative(&file.path, base),
                    key: cache.cache_key(module, file),
                })
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_collect_listing() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("views")).unwrap();
        fs::write(dir.path().join("views/a.html"), "<p></p>").unwrap();

        let config = CacheConfig::from_str("root = \"app/\"\nsource = \"views/*.html\"")
            .unwrap()
            .with_base_dir(dir.path());
        let cache = TemplateCache::new(config).unwrap();
        let listings = collect(&cache);

        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].name, "templates");
        assert_eq!(listings[0].outputs, vec!["dist/templates.js".to_string()]);
        assert_eq!(listings[0].files[0].key, "app/a.html");
        assert_eq!(listings[0].files[0].path, "views/a.html");

        let json = serde_json::to_value(&listings).unwrap();
        assert_eq!(json[0]["files"][0]["key"], "app/a.html");
    }
}
