//! Error taxonomy of the template cache pipeline.

use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;
use crate::render::TemplateError;

/// Anything that stops a compilation.
///
/// None of these are retried; a failed compilation emits no assets.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid glob pattern `{pattern}`")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("failed to read template `{}`", path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to render `{file}` in module `{module}`")]
    TemplateFormat {
        module: String,
        file: String,
        #[source]
        source: TemplateError,
    },

    #[error("failed to write `{}`", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<TemplateError> for CacheError {
    fn from(source: TemplateError) -> Self {
        Self::Config(ConfigError::Validation(source.to_string()))
    }
}

pub type Result<T, E = CacheError> = std::result::Result<T, E>;
