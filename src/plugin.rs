//! The template cache pipeline.
//!
//! ```text
//! CacheConfig ─► validate ─► resolve globs ─► ResolvedFileSet
//!                                                  │  (per compile)
//!                   read ─► transform ─► key + escape ─► body snippets
//!                                                  │
//!                              header + bodies + footer ─► OutputAsset × N
//! ```
//!
//! Construction does every check that needs no file contents. Each
//! [`TemplateCache::compile`] re-reads and re-transforms every file.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{CacheConfig, ConfigError, ModuleSpec};
use crate::debug;
use crate::error::{CacheError, Result};
use crate::render::{
    BodyVars, HeaderVars, KeyTransform, RewriteRules, Templates, cache_key, escape_js,
    escape_template_literal,
};
use crate::source::{self, ResolvedFileSet, SourceFile};
use crate::transform::{self, ContentKind};
use crate::utils::plural_count;

/// Standalone suffix spliced into the header.
const STANDALONE_SUFFIX: &str = ", []";

/// One generated script, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputAsset {
    pub path: PathBuf,
    pub content: String,
    /// Byte length of `content`.
    pub size: usize,
}

impl OutputAsset {
    fn new(path: PathBuf, content: String) -> Self {
        let size = content.len();
        Self {
            path,
            content,
            size,
        }
    }
}

/// Result of one compilation.
#[derive(Debug, Clone, Default)]
pub struct Compilation {
    /// Every source file read, for host file watching.
    pub dependencies: Vec<PathBuf>,
    pub assets: Vec<OutputAsset>,
}

impl Compilation {
    /// Write every asset, creating parent directories.
    pub fn write_all(&self) -> Result<()> {
        for asset in &self.assets {
            let write_err = |source| CacheError::Write {
                path: asset.path.clone(),
                source,
            };
            if let Some(parent) = asset.path.parent() {
                fs::create_dir_all(parent).map_err(write_err)?;
            }
            fs::write(&asset.path, &asset.content).map_err(write_err)?;
            debug!("write"; "{} ({} bytes)", asset.path.display(), asset.size);
        }
        Ok(())
    }

    /// Total bytes across all assets.
    pub fn total_size(&self) -> usize {
        self.assets.iter().map(|a| a.size).sum()
    }
}

type BoxedTransform = Box<dyn KeyTransform + Send + Sync>;

/// A configured plugin instance.
pub struct TemplateCache {
    config: CacheConfig,
    modules: Vec<ModuleSpec>,
    templates: Templates,
    files: ResolvedFileSet,
    key_transform: Option<BoxedTransform>,
}

impl std::fmt::Debug for TemplateCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateCache")
            .field("modules", &self.modules)
            .field("files", &self.files.len())
            .field("key_transform", &self.key_transform.is_some())
            .finish_non_exhaustive()
    }
}

impl TemplateCache {
    /// Validate `config` and expand every module's sources.
    ///
    /// Relative paths resolve against `config.base_dir`.
    pub fn new(config: CacheConfig) -> Result<Self> {
        config.validate()?;
        let templates = config.template.compile()?;
        let rules = RewriteRules::compile(&config.key_rewrite)
            .map_err(|e| ConfigError::Validation(format!("invalid key_rewrite pattern: {e}")))?;

        let modules = config.module_specs();
        let files = ResolvedFileSet::resolve(&modules, &config.base_dir)?;
        debug!(
            "cache";
            "{} in {}",
            plural_count(files.len(), "file"),
            plural_count(modules.len(), "module")
        );

        let key_transform = if rules.is_empty() {
            None
        } else {
            Some(Box::new(rules) as BoxedTransform)
        };

        Ok(Self {
            config,
            modules,
            templates,
            files,
            key_transform,
        })
    }

    /// Install a cache key hook, replacing any `[[key_rewrite]]` rules.
    pub fn with_key_transform(mut self, transform: impl KeyTransform + Send + Sync + 'static) -> Self {
        self.key_transform = Some(Box::new(transform));
        self
    }

    /// Re-expand the globs, picking up created and removed files.
    pub fn refresh(&mut self) -> Result<()> {
        self.files = ResolvedFileSet::resolve(&self.modules, &self.config.base_dir)?;
        Ok(())
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn modules(&self) -> &[ModuleSpec] {
        &self.modules
    }

    pub fn files(&self, module: &str) -> &[SourceFile] {
        self.files.get(module)
    }

    /// Every source file, in module then collection order.
    pub fn dependencies(&self) -> Vec<PathBuf> {
        self.modules
            .iter()
            .flat_map(|m| self.files.get(&m.name))
            .map(|f| f.path.clone())
            .collect()
    }

    /// Directories whose contents decide the file lists.
    pub fn watch_roots(&self) -> Vec<PathBuf> {
        let mut roots: Vec<PathBuf> = Vec::new();
        for entry in self.modules.iter().flat_map(|m| &m.source) {
            let dir = if source::is_pattern(entry) {
                self.config.base_dir.join(source::glob_parent(entry))
            } else {
                let path = self.config.base_dir.join(entry);
                path.parent().map(Path::to_path_buf).unwrap_or_default()
            };
            if !roots.contains(&dir) {
                roots.push(dir);
            }
        }
        roots
    }

    /// Final cache key of `file` within `module`.
    pub fn cache_key(&self, module: &ModuleSpec, file: &SourceFile) -> String {
        let key = cache_key(&module.root, &file.base, &file.path);
        match &self.key_transform {
            Some(transform) => transform.transform(&key),
            None => key,
        }
    }

    /// Render the script of one module.
    pub fn render_module(&self, module: &ModuleSpec) -> Result<String> {
        let format_err = |file: String| {
            let module = module.name.clone();
            move |source| CacheError::TemplateFormat {
                module,
                file,
                source,
            }
        };

        let standalone = if self.config.standalone {
            STANDALONE_SUFFIX
        } else {
            ""
        };
        let header = self
            .templates
            .header
            .render(&HeaderVars {
                module: &module.name,
                standalone,
            })
            .map_err(format_err("<header>".to_string()))?;

        let mut out = String::new();
        out.push_str(&header);
        out.push('\n');

        for file in self.files.get(&module.name) {
            let raw = fs::read(&file.path).map_err(|source| CacheError::FileAccess {
                path: file.path.clone(),
                source,
            })?;
            let kind = ContentKind::from_path(&file.path);
            let transformed = transform::transform(&file.path, kind, &raw);

            let (template, contents) = match kind {
                ContentKind::Markup => (
                    &self.templates.body,
                    escape_js(&transformed, &self.config.escape),
                ),
                ContentKind::Svg => (
                    &self.templates.svg_body,
                    escape_template_literal(&transformed),
                ),
            };
            let url = self.cache_key(module, file);
            let snippet = template
                .render(&BodyVars {
                    url: &url,
                    contents: &contents,
                })
                .map_err(format_err(file.path.display().to_string()))?;

            out.push_str(&snippet);
            out.push('\n');
        }

        out.push_str(&self.templates.footer);
        out.push('\n');
        Ok(out)
    }

    /// Run the whole pipeline, producing assets under `output_dir`.
    ///
    /// Nothing is returned unless every module renders.
    pub fn compile(&self, output_dir: &Path) -> Result<Compilation> {
        let mut assets = Vec::new();
        for module in &self.modules {
            let content = self.render_module(module)?;
            for relative in self.config.relative_outputs(module) {
                assets.push(OutputAsset::new(output_dir.join(relative), content.clone()));
            }
        }

        Ok(Compilation {
            dependencies: self.dependencies(),
            assets,
        })
    }
}
