//! Build configuration.
//!
//! Values are resolved from several sources; each resolved value remembers
//! where it came from.
//!
//! Precedence (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (`MYSTBUILD_OUT_DIR`, `MYSTBUILD_FORCE`)
//! 3. Project config (`mystbuild.json` in the source directory)
//! 4. Defaults

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{BuildError, BuildResult};

/// Name of the project configuration file inside the source directory.
pub const PROJECT_CONFIG_FILE: &str = "mystbuild.json";

/// Default output directory, relative to the source directory.
pub const DEFAULT_OUT_DIR: &str = "_build/myst";

pub const ENV_OUT_DIR: &str = "MYSTBUILD_OUT_DIR";
pub const ENV_FORCE: &str = "MYSTBUILD_FORCE";

// ============================================================================
// Configuration Sources
// ============================================================================

/// Configuration value source (for precedence tracking).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigSource {
    /// Built-in default value.
    Default = 0,
    /// From `mystbuild.json`.
    ProjectConfig = 1,
    /// From environment variable.
    EnvVar = 2,
    /// From CLI flag (highest precedence).
    CliFlag = 3,
}

/// A configuration value with its source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigValue<T> {
    /// The actual value.
    pub value: T,
    /// Where the value came from.
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    /// Create a new config value with the given source.
    pub fn new(value: T, source: ConfigSource) -> Self {
        ConfigValue { value, source }
    }

    /// Merge with another value, preferring higher precedence.
    pub fn merge(self, other: Self) -> Self {
        if other.source >= self.source {
            other
        } else {
            self
        }
    }
}

// ============================================================================
// Project Config
// ============================================================================

/// Contents of `mystbuild.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Output directory; relative paths are taken from the source directory.
    #[serde(default)]
    pub out_dir: Option<PathBuf>,
    /// Rebuild every document regardless of staleness.
    #[serde(default)]
    pub force: Option<bool>,
}

impl ProjectConfig {
    /// Load `mystbuild.json` from `source_dir`, if present.
    pub fn load(source_dir: &Path) -> BuildResult<Option<Self>> {
        let path = source_dir.join(PROJECT_CONFIG_FILE);
        if !path.is_file() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        let config = serde_json::from_str(&content).map_err(|e| BuildError::InvalidConfig {
            path: path.clone(),
            message: e.to_string(),
        })?;
        debug!(path = %path.display(), "loaded project config");
        Ok(Some(config))
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// CLI configuration overrides.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    /// --source-dir flag.
    pub source_dir: Option<PathBuf>,
    /// --out-dir flag.
    pub out_dir: Option<PathBuf>,
    /// --force flag (only an override when set).
    pub force: bool,
}

/// Fully resolved build configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedConfig {
    /// Directory containing `<docname>.json` source trees.
    pub source_dir: ConfigValue<PathBuf>,
    /// Directory receiving envelopes and the manifest.
    pub out_dir: ConfigValue<PathBuf>,
    /// Rebuild every document regardless of staleness.
    pub force: ConfigValue<bool>,
}

impl ResolvedConfig {
    /// Resolve configuration from all sources, reading the process
    /// environment.
    pub fn resolve(cli: &CliOverrides) -> BuildResult<Self> {
        Self::resolve_with_env(cli, |key| std::env::var(key).ok())
    }

    /// Resolve configuration with an explicit environment lookup.
    pub fn resolve_with_env<F>(cli: &CliOverrides, env: F) -> BuildResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let source_dir = match &cli.source_dir {
            Some(dir) => ConfigValue::new(dir.clone(), ConfigSource::CliFlag),
            None => ConfigValue::new(PathBuf::from("."), ConfigSource::Default),
        };

        let mut config = ResolvedConfig {
            out_dir: ConfigValue::new(
                source_dir.value.join(DEFAULT_OUT_DIR),
                ConfigSource::Default,
            ),
            force: ConfigValue::new(false, ConfigSource::Default),
            source_dir,
        };

        if let Some(project) = ProjectConfig::load(&config.source_dir.value)? {
            config.apply_project_config(project);
        }
        config.apply_env_vars(env)?;
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    pub fn source_dir(&self) -> &Path {
        &self.source_dir.value
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir.value
    }

    pub fn force(&self) -> bool {
        self.force.value
    }

    fn apply_project_config(&mut self, project: ProjectConfig) {
        if let Some(out_dir) = project.out_dir {
            let out_dir = self.source_dir.value.join(out_dir);
            self.out_dir = self
                .out_dir
                .clone()
                .merge(ConfigValue::new(out_dir, ConfigSource::ProjectConfig));
        }
        if let Some(force) = project.force {
            self.force = self
                .force
                .clone()
                .merge(ConfigValue::new(force, ConfigSource::ProjectConfig));
        }
    }

    fn apply_env_vars<F>(&mut self, env: F) -> BuildResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(out_dir) = env(ENV_OUT_DIR).filter(|v| !v.is_empty()) {
            self.out_dir = self
                .out_dir
                .clone()
                .merge(ConfigValue::new(PathBuf::from(out_dir), ConfigSource::EnvVar));
        }
        if let Some(force) = env(ENV_FORCE) {
            let force = parse_flag(&force).ok_or_else(|| {
                BuildError::invalid_args(format!(
                    "{ENV_FORCE} must be one of 1, 0, true, false, yes, no (got '{force}')"
                ))
            })?;
            self.force = self
                .force
                .clone()
                .merge(ConfigValue::new(force, ConfigSource::EnvVar));
        }
        Ok(())
    }

    fn apply_cli_overrides(&mut self, overrides: &CliOverrides) {
        if let Some(ref out_dir) = overrides.out_dir {
            self.out_dir = ConfigValue::new(out_dir.clone(), ConfigSource::CliFlag);
        }
        if overrides.force {
            self.force = ConfigValue::new(true, ConfigSource::CliFlag);
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
