//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/socialtree/socialtree.toml`
//! 3. Local config: `--config <file>`, else `./.socialtree.toml` if present
//! 4. Environment variables: `SOCIALTREE_*` prefix, `__` between sections

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::services::analytics::DEFAULT_MAX_ITERATIONS;
use crate::application::ApplicationError;
use crate::util::path::expand_env_vars;

/// Name of the local config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = ".socialtree.toml";

/// Community detection settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Upper bound on label propagation passes
    pub max_iterations: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

/// Sentiment lexicon additions.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SentimentConfig {
    /// Extra words and their polarity, merged over the built-in lexicon
    pub words: BTreeMap<String, f64>,
}

/// Tree export settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory receiving exported files
    pub dir: PathBuf,
    /// File stem used when no name is given
    pub default_filename: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            default_filename: "social_tree".to_string(),
        }
    }
}

/// Raw settings for intermediate parsing (every field optional to detect "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub prompt: Option<String>,
    pub analytics: RawAnalyticsConfig,
    pub sentiment: RawSentimentConfig,
    pub export: RawExportConfig,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawAnalyticsConfig {
    pub max_iterations: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSentimentConfig {
    pub words: Option<BTreeMap<String, f64>>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawExportConfig {
    pub dir: Option<PathBuf>,
    pub default_filename: Option<String>,
}

/// Unified configuration for socialtree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Prompt shown by the interactive shell
    pub prompt: String,
    pub analytics: AnalyticsConfig,
    pub sentiment: SentimentConfig,
    pub export: ExportConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            prompt: "socialtree> ".to_string(),
            analytics: AnalyticsConfig::default(),
            sentiment: SentimentConfig::default(),
            export: ExportConfig::default(),
        }
    }
}

/// Get the XDG config directory for socialtree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "socialtree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("socialtree.toml"))
}

/// Get the path to the local config file in a directory.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(LOCAL_CONFIG_FILE)
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Expand shell variables and tilde in path-like fields.
    fn expand_paths(&mut self) {
        let expanded = expand_env_vars(self.export.dir.to_string_lossy().as_ref());
        self.export.dir = PathBuf::from(expanded);
    }

    /// Merge overlay config onto self (base).
    ///
    /// - Scalar options: overlay wins if Some, otherwise keep base
    /// - Lexicon words: union, overlay entries replace base entries
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        let mut words = self.sentiment.words.clone();
        if let Some(extra) = &overlay.sentiment.words {
            words.extend(extra.iter().map(|(k, v)| (k.to_lowercase(), *v)));
        }

        Self {
            prompt: overlay.prompt.clone().unwrap_or_else(|| self.prompt.clone()),
            analytics: AnalyticsConfig {
                max_iterations: overlay
                    .analytics
                    .max_iterations
                    .unwrap_or(self.analytics.max_iterations),
            },
            sentiment: SentimentConfig { words },
            export: ExportConfig {
                dir: overlay
                    .export
                    .dir
                    .clone()
                    .unwrap_or_else(|| self.export.dir.clone()),
                default_filename: overlay
                    .export
                    .default_filename
                    .clone()
                    .unwrap_or_else(|| self.export.default_filename.clone()),
            },
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local` - Explicit local config file; must exist when given.
    ///   Without it, `./.socialtree.toml` is used if present.
    pub fn load(local: Option<&Path>) -> Result<Self, ApplicationError> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Global config
        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                debug!("loading global config {}", global_path.display());
                current = current.merge_with(&load_raw_settings(&global_path)?);
            }
        }

        // 3. Local config
        match local {
            Some(path) => {
                debug!("loading local config {}", path.display());
                current = current.merge_with(&load_raw_settings(path)?);
            }
            None => {
                let path = local_config_path(Path::new("."));
                if path.exists() {
                    debug!("loading local config {}", path.display());
                    current = current.merge_with(&load_raw_settings(&path)?);
                }
            }
        }

        // 4. Environment variables (explicit override)
        current = Self::apply_env_overrides(current)?;

        current.expand_paths();

        Ok(current)
    }

    /// Apply SOCIALTREE_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let builder = Config::builder().add_source(
            Environment::with_prefix("SOCIALTREE")
                .prefix_separator("_")
                .separator("__"),
        );

        let config = builder.build().map_err(config_err)?;

        if let Ok(val) = config.get_string("prompt") {
            settings.prompt = val;
        }
        if let Ok(val) = config.get_int("analytics.max_iterations") {
            settings.analytics.max_iterations = usize::try_from(val).map_err(|_| {
                ApplicationError::Config {
                    message: format!("analytics.max_iterations must not be negative: {}", val),
                }
            })?;
        }
        if let Ok(val) = config.get_string("export.dir") {
            settings.export.dir = PathBuf::from(val);
        }
        if let Ok(val) = config.get_string("export.default_filename") {
            settings.export.default_filename = val;
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# socialtree configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/socialtree/socialtree.toml
#   Local:  ./.socialtree.toml (or --config <file>)
#   Env:    SOCIALTREE_* environment variables, e.g. SOCIALTREE_ANALYTICS__MAX_ITERATIONS=50

# Prompt of the interactive shell
# prompt = "socialtree> "

[analytics]
# Upper bound on label propagation passes
# max_iterations = 100

[sentiment.words]
# Extra lexicon entries, polarity in [-1, 1]
# splendid = 0.9
# meh = -0.2

[export]
# Directory for exported .dot files
# dir = "~/socialtree"
# default_filename = "social_tree"
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
