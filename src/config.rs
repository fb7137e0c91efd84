//! Configuration loading for Sieve.
//!
//! Configuration follows a precedence chain:
//! 1. Environment variables (highest priority)
//! 2. Project config (`.sieve/config.toml`)
//! 3. User config (`~/.sieve/config.toml`)
//! 4. Defaults (lowest priority)
//!
//! All configuration is optional. The system runs with sensible defaults
//! when no config exists.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::engine::{Normalizer, DEFAULT_THRESHOLD};
use crate::error::{Result, SieveError};

/// Main configuration struct for Sieve.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Query behavior.
    pub search: SearchConfig,
    /// Text normalization.
    pub normalize: NormalizeConfig,
    /// Where the corpus comes from.
    pub source: SourceConfig,
    /// Searchable categories and the fields each one indexes.
    ///
    /// Empty in a config file that declares none, so the layer inherits the
    /// categories below it.
    #[serde(default)]
    pub categories: BTreeMap<String, CategoryConfig>,
}

impl Default for Config {
    fn default() -> Self {
        let mut categories = BTreeMap::new();
        categories.insert("jobs".to_string(), CategoryConfig::default());
        Self {
            search: SearchConfig::default(),
            normalize: NormalizeConfig::default(),
            source: SourceConfig::default(),
            categories,
        }
    }
}

/// Query behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SearchConfig {
    /// Minimum score for a record to be returned.
    pub threshold: f64,
    /// Result count used when the caller gives no limit.
    pub default_limit: usize,
}

impl SearchConfig {
    /// Check if a threshold value is valid (must be in [0.0, 1.0] and finite).
    pub fn is_valid_threshold(value: f64) -> bool {
        value.is_finite() && (0.0..=1.0).contains(&value)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            default_limit: 20,
        }
    }
}

/// Text normalization configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NormalizeConfig {
    /// Character variants folded together before indexing, e.g. `"ё" = "е"`.
    pub folds: BTreeMap<String, String>,
}

impl NormalizeConfig {
    /// Build the normalizer described by this config.
    pub fn normalizer(&self) -> Normalizer {
        Normalizer::from_table(&self.folds)
    }
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        let mut folds = BTreeMap::new();
        folds.insert("ё".to_string(), "е".to_string());
        Self { folds }
    }
}

/// Record source configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SourceConfig {
    /// Directory of `<category>.json` corpus files.
    pub data_dir: PathBuf,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
        }
    }
}

/// Per-category index configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CategoryConfig {
    /// Record fields that contribute text, in order.
    pub fields: Vec<String>,
}

impl Default for CategoryConfig {
    fn default() -> Self {
        Self {
            fields: vec![
                "title".to_string(),
                "company".to_string(),
                "description".to_string(),
                "skills".to_string(),
            ],
        }
    }
}

impl Config {
    /// Load configuration with full precedence chain.
    ///
    /// Precedence (highest to lowest):
    /// 1. Environment variables
    /// 2. Project config (`.sieve/config.toml` in cwd)
    /// 3. User config (`~/.sieve/config.toml`)
    /// 4. Defaults
    pub fn load() -> Self {
        match env::current_dir() {
            Ok(cwd) => Self::load_from_cwd(&cwd),
            Err(_) => {
                let mut config = Config::default();
                if let Some(user_config) = Self::load_user_config() {
                    config = config.merge(user_config);
                }
                config.apply_env_overrides();
                config
            }
        }
    }

    /// Load configuration with a specific working directory.
    pub fn load_from_cwd(cwd: &Path) -> Self {
        let mut config = Config::default();

        if let Some(user_config) = Self::load_user_config() {
            config = config.merge(user_config);
        }

        if let Some(project_config) = Self::load_project_config(cwd) {
            config = config.merge(project_config);
        }

        config.apply_env_overrides();

        config
    }

    /// Load user config from `~/.sieve/config.toml`.
    fn load_user_config() -> Option<Config> {
        let home = sieve_home()?;
        Self::load_optional(&home.join("config.toml"))
    }

    /// Load project config from `.sieve/config.toml` in the given directory.
    fn load_project_config(cwd: &Path) -> Option<Config> {
        Self::load_optional(&cwd.join(".sieve").join("config.toml"))
    }

    /// Load a config file that may legitimately be absent.
    ///
    /// A file that exists but fails to parse is logged and skipped.
    fn load_optional(path: &Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }
        match Self::load_from_file(path) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable config file");
                None
            }
        }
    }

    /// Load config from a specific file path.
    pub fn load_from_file(path: &Path) -> Result<Config> {
        let content = fs::read_to_string(path).map_err(|e| SieveError::storage(path, e))?;
        toml::from_str(&content).map_err(|e| SieveError::config(e.to_string()))
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        // SIEVE_THRESHOLD
        if let Ok(val) = env::var("SIEVE_THRESHOLD") {
            match val.parse::<f64>() {
                Ok(n) if SearchConfig::is_valid_threshold(n) => self.search.threshold = n,
                Ok(n) => tracing::warn!(
                    "Invalid SIEVE_THRESHOLD value '{}'. Must be in range [0.0, 1.0]. Using '{}'.",
                    n,
                    self.search.threshold
                ),
                Err(_) => tracing::warn!(
                    "Invalid SIEVE_THRESHOLD value '{}'. Expected a decimal number. Using '{}'.",
                    val,
                    self.search.threshold
                ),
            }
        }

        // SIEVE_DEFAULT_LIMIT
        if let Ok(val) = env::var("SIEVE_DEFAULT_LIMIT") {
            match val.parse::<usize>() {
                Ok(n) if n > 0 => self.search.default_limit = n,
                _ => tracing::warn!(
                    "Invalid SIEVE_DEFAULT_LIMIT value '{}'. Expected a positive integer. Using '{}'.",
                    val,
                    self.search.default_limit
                ),
            }
        }

        // SIEVE_DATA_DIR
        if let Ok(val) = env::var("SIEVE_DATA_DIR") {
            if val.is_empty() {
                tracing::warn!("SIEVE_DATA_DIR is empty, ignoring");
            } else {
                self.source.data_dir = PathBuf::from(val);
            }
        }
    }

    /// Merge another config into this one.
    ///
    /// The `other` config takes precedence field by field: any value in
    /// `other` that differs from the default replaces the value in `self`.
    /// Folds merge by key. A layer that declares any categories replaces
    /// the inherited set as a whole, so the default `jobs` category only
    /// survives when no layer names its own.
    ///
    /// # Limitation
    ///
    /// A layer cannot reset a value back to its default once a lower layer
    /// has changed it, because "not set" and "set to the default" look the
    /// same after deserialization. The same goes for removing a fold
    /// inherited from a lower layer.
    fn merge(mut self, other: Config) -> Self {
        let default_search = SearchConfig::default();
        if other.search.threshold != default_search.threshold {
            self.search.threshold = other.search.threshold;
        }
        if other.search.default_limit != default_search.default_limit {
            self.search.default_limit = other.search.default_limit;
        }

        for (from, to) in other.normalize.folds {
            self.normalize.folds.insert(from, to);
        }

        if other.source.data_dir != SourceConfig::default().data_dir {
            self.source.data_dir = other.source.data_dir;
        }

        if !other.categories.is_empty() {
            self.categories = other.categories;
        }

        self
    }

    /// Validate values that serde alone cannot check.
    pub fn validate(&self) -> Result<()> {
        if !SearchConfig::is_valid_threshold(self.search.threshold) {
            return Err(SieveError::config(format!(
                "search.threshold must be in [0.0, 1.0], got {}",
                self.search.threshold
            )));
        }
        if self.search.default_limit == 0 {
            return Err(SieveError::config("search.default_limit must be at least 1"));
        }
        for (name, category) in &self.categories {
            if category.fields.is_empty() {
                return Err(SieveError::config(format!(
                    "category '{}' has no fields to index",
                    name
                )));
            }
        }
        Ok(())
    }
}

/// Get the Sieve home directory.
///
/// Checks `SIEVE_HOME` environment variable first, then falls back to
/// `~/.sieve`. An empty `SIEVE_HOME` is ignored.
pub fn sieve_home() -> Option<PathBuf> {
    if let Ok(home) = env::var("SIEVE_HOME") {
        if home.is_empty() {
            tracing::warn!("SIEVE_HOME is empty, using default");
        } else {
            let path = PathBuf::from(&home);
            if path.is_absolute() {
                return Some(path);
            }
            if let Ok(canonical) = path.canonicalize() {
                return Some(canonical);
            }
            tracing::warn!("SIEVE_HOME is relative and doesn't exist, using as-is");
            return Some(path);
        }
    }

    dirs::home_dir().map(|home| home.join(".sieve"))
}
