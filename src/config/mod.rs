//! Plugin configuration (`tplcache.toml`).
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # [template], [[modules]], [[key_rewrite]]
//! ├── types/         # ConfigError, FieldPath, OneOrMany
//! ├── util.rs        # config file discovery
//! └── mod.rs         # CacheConfig (this file)
//! ```
//!
//! # Example
//!
//! ```toml
//! output = "dist"
//! destination = ["js", "public/js"]
//! module = "templates"
//! root = "app/"
//! source = "src/app/**/*.{html,svg}"
//! standalone = true
//!
//! [escape]
//! quotes = "double"
//! ```
//!
//! A config without `[[modules]]` describes one module through the
//! top-level `module`, `root`, `source` and `output_filename` keys.

pub mod section;
pub mod types;
mod util;

pub use section::{KeyRewrite, ModuleConfig, ModuleSpec, TemplateConfig};
pub use types::{ConfigDiagnostic, ConfigDiagnostics, ConfigError, FieldPath, OneOrMany};
pub use util::find_config_file;

pub use crate::render::EscapeOptions;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{log, source};
use types::field::{
    DESTINATION, MODULES, MODULES_NAME, MODULES_OUTPUT_FILENAME, MODULES_SOURCE,
    OUTPUT_FILENAME, SOURCE,
};

/// Default config file name.
pub const CONFIG_FILE: &str = "tplcache.toml";
pub const DEFAULT_FILENAME: &str = "templates.js";
pub const DEFAULT_MODULE: &str = "templates";
pub const DEFAULT_OUTPUT: &str = "dist";

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing `tplcache.toml`.
///
/// Immutable once handed to [`crate::TemplateCache::new`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Directory relative paths resolve against (internal use only)
    #[serde(skip)]
    pub base_dir: PathBuf,

    /// Host output directory.
    pub output: PathBuf,

    /// Folder(s) under `output` receiving each generated script.
    pub destination: OneOrMany<PathBuf>,

    /// Default generated script name(s).
    pub output_filename: OneOrMany<String>,

    /// Module name of the top-level shorthand module.
    pub module: String,

    /// Cache key prefix (default for every module).
    pub root: String,

    /// Source of the top-level shorthand module.
    pub source: Option<OneOrMany<String>>,

    /// Register the module without dependencies (`angular.module(name, [])`).
    pub standalone: bool,

    pub template: TemplateConfig,

    pub escape: EscapeOptions,

    pub key_rewrite: Vec<KeyRewrite>,

    pub modules: Vec<ModuleConfig>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            config_path: PathBuf::new(),
            base_dir: PathBuf::new(),
            output: PathBuf::from(DEFAULT_OUTPUT),
            destination: OneOrMany::Many(vec![PathBuf::new()]),
            output_filename: OneOrMany::One(DEFAULT_FILENAME.to_string()),
            module: DEFAULT_MODULE.to_string(),
            root: String::new(),
            source: None,
            standalone: false,
            template: TemplateConfig::default(),
            escape: EscapeOptions::default(),
            key_rewrite: Vec::new(),
            modules: Vec::new(),
        }
    }
}

/// Values the host (CLI flags) may override after loading.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub output: Option<PathBuf>,
    pub standalone: Option<bool>,
}

impl CacheConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    ///
    /// Relative paths in the file resolve against its directory.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (mut config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        let config_path = crate::utils::path::normalize_path(path);
        config.base_dir = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        config.config_path = config_path;
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    /// Set the directory relative paths resolve against.
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = dir.into();
        self
    }

    /// Apply host-provided overrides.
    pub fn apply_overrides(&mut self, overrides: &Overrides) {
        Self::update_option(&mut self.output, overrides.output.as_ref());
        Self::update_option(&mut self.standalone, overrides.standalone.as_ref());
    }

    /// Update config option if a value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Absolute output directory.
    pub fn output_dir(&self) -> PathBuf {
        self.base_dir.join(&self.output)
    }

    /// Every module with defaults filled in, in declaration order.
    ///
    /// Without `[[modules]]` the top-level shorthand yields one module.
    pub fn module_specs(&self) -> Vec<ModuleSpec> {
        if !self.modules.is_empty() {
            return self
                .modules
                .iter()
                .map(|m| m.resolve(&self.root, &self.output_filename))
                .collect();
        }

        match &self.source {
            Some(source) => vec![ModuleSpec {
                name: self.module.clone(),
                root: self.root.clone(),
                source: source.to_vec(),
                output_filenames: self.output_filename.to_vec(),
            }],
            None => Vec::new(),
        }
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Validate configuration before any file is read.
    ///
    /// Collects all validation errors and returns them at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut diag = ConfigDiagnostics::new();

        if self.destination.is_empty() {
            diag.error_with_hint(
                DESTINATION,
                "destination list is empty",
                "remove the key to write into the output directory",
            );
        }
        if self.output_filename.is_empty() {
            diag.error(OUTPUT_FILENAME, "output_filename list is empty");
        }

        self.validate_modules(&mut diag);
        self.template.validate(&mut diag);
        section::validate_rewrites(&self.key_rewrite, &mut diag);

        diag.into_result().map_err(ConfigError::Diagnostics)
    }

    fn validate_modules(&self, diag: &mut ConfigDiagnostics) {
        if self.modules.is_empty() {
            match &self.source {
                None => diag.error_with_hint(
                    MODULES,
                    "no module configured",
                    "set `source` or add a [[modules]] table",
                ),
                Some(source) if source.is_empty() => {
                    diag.error(SOURCE, "source list is empty");
                }
                Some(_) => {}
            }
        }

        let mut names = FxHashSet::default();
        for (i, module) in self.modules.iter().enumerate() {
            if module.name.trim().is_empty() {
                diag.entry_error(MODULES_NAME, i, "module name is empty");
            } else if !names.insert(module.name.as_str()) {
                diag.entry_error(
                    MODULES_NAME,
                    i,
                    format!("module `{}` is declared more than once", module.name),
                );
            }
            if module.source.is_empty() {
                diag.entry_error(
                    MODULES_SOURCE,
                    i,
                    format!("module `{}` has an empty source list", module.name),
                );
            }
            if module.output_filename.as_ref().is_some_and(OneOrMany::is_empty) {
                diag.entry_error(
                    MODULES_OUTPUT_FILENAME,
                    i,
                    format!("module `{}` has an empty output_filename list", module.name),
                );
            }
        }

        let specs = self.module_specs();
        for (i, spec) in specs.iter().enumerate() {
            for pattern in &spec.source {
                if let Err(e) = source::check_pattern(pattern) {
                    let message = format!("invalid glob `{}`: {}", pattern, e);
                    if self.modules.is_empty() {
                        diag.error(SOURCE, message);
                    } else {
                        diag.entry_error(MODULES_SOURCE, i, message);
                    }
                }
            }
        }
        self.validate_output_collisions(&specs, diag);
    }

    /// Two modules writing the same file would silently overwrite each other.
    fn validate_output_collisions(&self, specs: &[ModuleSpec], diag: &mut ConfigDiagnostics) {
        let mut owners: FxHashMap<PathBuf, &str> = FxHashMap::default();
        for spec in specs {
            for path in self.relative_outputs(spec) {
                match owners.get(&path) {
                    Some(owner) if *owner != spec.name => diag.error_with_hint(
                        MODULES_OUTPUT_FILENAME,
                        format!(
                            "modules `{}` and `{}` both write `{}`",
                            owner,
                            spec.name,
                            path.display()
                        ),
                        "give each module its own output_filename",
                    ),
                    Some(_) => {}
                    None => {
                        owners.insert(path, spec.name.as_str());
                    }
                }
            }
        }
    }

    /// Output paths of `spec` relative to the output directory.
    pub fn relative_outputs(&self, spec: &ModuleSpec) -> Vec<PathBuf> {
        self.destination
            .iter()
            .flat_map(|folder| spec.output_filenames.iter().map(move |name| folder.join(name)))
            .collect()
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config content.
/// Panics if there are unknown fields (to catch config typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str) -> CacheConfig {
    let (parsed, ignored) = CacheConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn errors_of(config: &CacheConfig) -> Vec<FieldPath> {
        match config.validate() {
            Err(ConfigError::Diagnostics(diag)) => diag.errors().iter().map(|e| e.field).collect(),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(()) => Vec::new(),
        }
    }

    #[test]
    fn test_from_str_invalid_toml() {
        assert!(CacheConfig::from_str("[template\nbody = \"x\"").is_err());
    }

    #[test]
    fn test_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.output, PathBuf::from("dist"));
        assert_eq!(config.destination.to_vec(), vec![PathBuf::new()]);
        assert_eq!(config.output_filename.to_vec(), vec!["templates.js".to_string()]);
        assert_eq!(config.module, "templates");
        assert_eq!(config.root, "");
        assert!(!config.standalone);
        assert!(config.source.is_none());
        assert!(config.modules.is_empty());
    }

    #[test]
    fn test_shorthand_module() {
        let config = test_parse_config("module = \"app\"\nroot = \"app/\"\nsource = \"src/*.html\"");
        let specs = config.module_specs();
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].name, "app");
        assert_eq!(specs[0].root, "app/");
        assert_eq!(specs[0].source, vec!["src/*.html".to_string()]);
        assert_eq!(specs[0].output_filenames, vec!["templates.js".to_string()]);
    }

    #[test]
    fn test_modules_take_precedence_over_shorthand() {
        let config = test_parse_config(
            "source = \"ignored/*.html\"\n[[modules]]\nname = \"a\"\nsource = \"a/*.html\"",
        );
        let specs = config.module_specs();
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].name, "a");
    }

    #[test]
    fn test_unknown_fields_detected() {
        let (config, ignored) =
            CacheConfig::parse_with_ignored("module = \"x\"\nmodul_name = \"y\"").unwrap();
        assert_eq!(config.module, "x");
        assert_eq!(ignored, vec!["modul_name".to_string()]);
    }

    #[test]
    fn test_wrong_type_rejected() {
        assert!(CacheConfig::from_str("standalone = \"yes\"").is_err());
        assert!(CacheConfig::from_str("destination = 3").is_err());
    }

    #[test]
    fn test_validate_ok() {
        let config = test_parse_config("source = \"src/**/*.html\"");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_no_module() {
        let config = test_parse_config("");
        assert_eq!(errors_of(&config), vec![MODULES]);
    }

    #[test]
    fn test_validate_empty_lists() {
        let config = test_parse_config("source = []\ndestination = []\noutput_filename = []");
        let errors = errors_of(&config);
        assert!(errors.contains(&SOURCE));
        assert!(errors.contains(&DESTINATION));
        assert!(errors.contains(&OUTPUT_FILENAME));
    }

    #[test]
    fn test_validate_module_names() {
        let config = test_parse_config(
            r#"
[[modules]]
name = ""
source = "a/*.html"
output_filename = "a.js"

[[modules]]
name = "b"
source = "b/*.html"
output_filename = "b.js"

[[modules]]
name = "b"
source = "c/*.html"
output_filename = "c.js"
"#,
        );
        assert_eq!(errors_of(&config), vec![MODULES_NAME, MODULES_NAME]);

        let Err(ConfigError::Diagnostics(diag)) = config.validate() else {
            panic!("expected diagnostics");
        };
        let entries: Vec<_> = diag.errors().iter().map(|e| e.entry).collect();
        assert_eq!(entries, vec![Some(0), Some(2)]);
        assert!(diag.to_string().contains("[[modules]] #3"));
    }

    #[test]
    fn test_validate_output_collision() {
        let config = test_parse_config(
            "[[modules]]\nname = \"a\"\nsource = \"a/*.html\"\n[[modules]]\nname = \"b\"\nsource = \"b/*.html\"",
        );
        assert_eq!(errors_of(&config), vec![MODULES_OUTPUT_FILENAME]);
    }

    #[test]
    fn test_validate_bad_glob() {
        let config = test_parse_config("source = \"src/[*.html\"");
        assert_eq!(errors_of(&config), vec![SOURCE]);
    }

    #[test]
    fn test_validate_collects_template_and_rewrite_errors() {
        let config = test_parse_config(
            "source = \"*.html\"\n[template]\nbody = \"<%= file %>\"\n[[key_rewrite]]\npattern = \"(\"",
        );
        let errors = errors_of(&config);
        assert_eq!(errors.len(), 2);
        assert!(errors.contains(&types::field::TEMPLATE_BODY));
        assert!(errors.contains(&types::field::KEY_REWRITE_PATTERN));
    }

    #[test]
    fn test_relative_outputs() {
        let config = test_parse_config(
            "source = \"*.html\"\ndestination = [\"js\", \"public/js\"]\noutput_filename = [\"t.js\", \"t2.js\"]",
        );
        let spec = &config.module_specs()[0];
        let outputs = config.relative_outputs(spec);
        assert_eq!(
            outputs,
            vec![
                PathBuf::from("js/t.js"),
                PathBuf::from("js/t2.js"),
                PathBuf::from("public/js/t.js"),
                PathBuf::from("public/js/t2.js"),
            ]
        );
    }

    #[test]
    fn test_apply_overrides() {
        let mut config = test_parse_config("source = \"*.html\"");
        config.apply_overrides(&Overrides {
            output: Some(PathBuf::from("build")),
            standalone: Some(true),
        });
        assert_eq!(config.output, PathBuf::from("build"));
        assert!(config.standalone);

        config.apply_overrides(&Overrides::default());
        assert!(config.standalone);
    }

    #[test]
    fn test_from_path_sets_base_dir() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "source = \"src/*.html\"\noutput = \"out\"").unwrap();

        let config = CacheConfig::from_path(&path).unwrap();
        let base = crate::utils::path::normalize_path(dir.path());
        assert_eq!(config.base_dir, base);
        assert_eq!(config.output_dir(), base.join("out"));
    }

    #[test]
    fn test_from_path_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = CacheConfig::from_path(&dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(..)));
    }
}
