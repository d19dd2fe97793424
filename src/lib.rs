//! tplcache - precompile HTML and SVG fragments into an AngularJS
//! `$templateCache` script.
//!
//! ```no_run
//! use std::path::Path;
//! use tplcache::{CacheConfig, TemplateCache};
//!
//! let config = CacheConfig::from_path(Path::new("tplcache.toml"))?;
//! let output = config.output_dir();
//! let cache = TemplateCache::new(config)?;
//! cache.compile(&output)?.write_all()?;
//! # Ok::<(), tplcache::CacheError>(())
//! ```

pub mod config;
pub mod error;
pub mod logger;
pub mod plugin;
pub mod render;
pub mod source;
pub mod transform;
pub mod utils;

pub use config::{CacheConfig, ConfigError};
pub use error::{CacheError, Result};
pub use plugin::{Compilation, OutputAsset, TemplateCache};
pub use render::KeyTransform;
