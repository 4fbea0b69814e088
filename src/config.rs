//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/pagetree/pagetree.toml`
//! 3. Local config: `--config <file>` or `./.pagetree.toml`
//! 4. Environment variables: `PAGETREE_*` prefix, `__` between nested keys
//!    (e.g. `PAGETREE_CACHE__ENABLED=false`)

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::DEFAULT_SLUG_MAX_LENGTH;

/// Traversal cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CacheConfig {
    /// Memoize flattened orders, ancestor chains and gate decisions
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Gating configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GatingConfig {
    /// Default for commands that do not pass `--enforce`/`--no-enforce`
    pub enforce: bool,
}

impl Default for GatingConfig {
    fn default() -> Self {
        Self { enforce: true }
    }
}

/// Raw settings for intermediate parsing (`None` → not specified, inherit).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub store_path: Option<PathBuf>,
    pub slug_max_length: Option<usize>,
    pub cache: RawCacheConfig,
    pub gating: RawGatingConfig,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawCacheConfig {
    pub enabled: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawGatingConfig {
    pub enforce: Option<bool>,
}

/// Unified configuration for pagetree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// JSON snapshot holding all hierarchies and progress records
    pub store_path: PathBuf,
    /// Maximum section slug length
    pub slug_max_length: usize,
    pub cache: CacheConfig,
    pub gating: GatingConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            slug_max_length: DEFAULT_SLUG_MAX_LENGTH,
            cache: CacheConfig::default(),
            gating: GatingConfig::default(),
        }
    }
}

/// Get the default snapshot location (XDG data dir).
fn default_store_path() -> PathBuf {
    ProjectDirs::from("", "", "pagetree")
        .map(|dirs| dirs.data_dir().join("pagetree.json"))
        .unwrap_or_else(|| PathBuf::from("pagetree.json"))
}

/// Get the XDG config directory for pagetree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "pagetree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("pagetree.toml"))
}

/// Get the path to the local config file in a directory.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(".pagetree.toml")
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
    ///
    /// Handles `~`, `$VAR`, and `${VAR}` syntax. Unknown variables are left as is.
    fn expand_paths(&mut self) {
        let raw = self.store_path.to_string_lossy().to_string();
        let expanded = shellexpand::full(&raw)
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| raw.clone());
        self.store_path = PathBuf::from(expanded);
    }

    /// Overlay config onto self: scalar options win if specified.
    pub fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            store_path: overlay
                .store_path
                .clone()
                .unwrap_or_else(|| self.store_path.clone()),
            slug_max_length: overlay.slug_max_length.unwrap_or(self.slug_max_length),
            cache: CacheConfig {
                enabled: overlay.cache.enabled.unwrap_or(self.cache.enabled),
            },
            gating: GatingConfig {
                enforce: overlay.gating.enforce.unwrap_or(self.gating.enforce),
            },
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local_config` - Explicit local config file (`--config`); must exist.
    ///   Without it `./.pagetree.toml` is used when present.
    ///
    /// # Precedence (lowest to highest)
    /// 1. Compiled defaults
    /// 2. Global config: `$XDG_CONFIG_HOME/pagetree/pagetree.toml`
    /// 3. Local config
    /// 4. Environment variables: `PAGETREE_*` prefix
    pub fn load(local_config: Option<&Path>) -> Result<Self, ApplicationError> {
        let global = global_config_path().filter(|p| p.exists());
        let local = match local_config {
            Some(path) if !path.exists() => {
                return Err(ApplicationError::Config {
                    message: format!("config file not found: {}", path.display()),
                })
            }
            Some(path) => Some(path.to_path_buf()),
            None => Some(local_config_path(Path::new("."))).filter(|p| p.exists()),
        };
        Self::load_from(global.as_deref(), local.as_deref())
    }

    /// Load from explicit global and local files (either may be absent).
    pub fn load_from(global: Option<&Path>, local: Option<&Path>) -> Result<Self, ApplicationError> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Global config
        if let Some(path) = global {
            current = current.merge_with(&load_raw_settings(path)?);
        }

        // 3. Local config
        if let Some(path) = local {
            current = current.merge_with(&load_raw_settings(path)?);
        }

        // 4. Environment variables (explicit override)
        current = Self::apply_env_overrides(current)?;

        // Expand ~ and $VAR in path-like fields
        current.expand_paths();
        current.validate()?;

        Ok(current)
    }

    /// Apply PAGETREE_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("PAGETREE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("store_path") {
            settings.store_path = PathBuf::from(val);
        }
        if let Ok(val) = config.get_int("slug_max_length") {
            settings.slug_max_length = usize::try_from(val).map_err(|_| ApplicationError::Config {
                message: format!("slug_max_length must be positive, got {val}"),
            })?;
        }
        if let Ok(val) = config.get_bool("cache.enabled") {
            settings.cache.enabled = val;
        }
        if let Ok(val) = config.get_bool("gating.enforce") {
            settings.gating.enforce = val;
        }

        Ok(settings)
    }

    fn validate(&self) -> Result<(), ApplicationError> {
        if self.slug_max_length == 0 {
            return Err(ApplicationError::Config {
                message: "slug_max_length must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# pagetree configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/pagetree/pagetree.toml
#   Local:  ./.pagetree.toml or --config <file>
#   Env:    PAGETREE_* environment variables (PAGETREE_CACHE__ENABLED=false)

# Snapshot file holding hierarchies and progress
# store_path = "~/.local/share/pagetree/pagetree.json"

# Maximum section slug length
# slug_max_length = 50

[cache]
# enabled = true

[gating]
# Require sections to be visited in order
# enforce = true
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_defaults_when_created_then_match_documented_values() {
        let settings = Settings::default();
        assert_eq!(settings.slug_max_length, 50);
        assert!(settings.cache.enabled);
        assert!(settings.gating.enforce);
        assert!(settings.store_path.ends_with("pagetree.json"));
    }

    #[test]
    fn given_tilde_in_store_path_when_expand_paths_then_expands_to_home() {
        let mut settings = Settings {
            store_path: PathBuf::from("~/trees/pagetree.json"),
            ..Settings::default()
        };

        settings.expand_paths();

        let home = std::env::var("HOME").expect("HOME should be set");
        let path = settings.store_path.to_string_lossy();
        assert!(path.starts_with(&home), "store_path should start with home: {path}");
        assert!(!path.contains('~'));
    }

    #[test]
    fn given_partial_overlay_when_merging_then_unspecified_fields_are_kept() {
        let base = Settings::default();
        let overlay = RawSettings {
            slug_max_length: Some(20),
            gating: RawGatingConfig {
                enforce: Some(false),
            },
            ..RawSettings::default()
        };

        let merged = base.merge_with(&overlay);

        assert_eq!(merged.slug_max_length, 20);
        assert!(!merged.gating.enforce);
        assert!(merged.cache.enabled);
        assert_eq!(merged.store_path, base.store_path);
    }

    #[test]
    fn given_template_when_parsed_then_is_valid_toml() {
        let raw: RawSettings = toml::from_str(&Settings::template()).expect("template parses");
        assert!(raw.store_path.is_none());
    }
}
