//! Configuration for ktgen
//!
//! Sources, highest priority first:
//! 1. Command-line arguments
//! 2. Environment variables (`KTGEN_*`)
//! 3. Configuration files (.ktgen.yaml, .ktgen.json, .ktgen.toml, ...)
//! 4. Built-in defaults

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ValueEnum;
use ktgen_codegen::{GenerationSettings, DEFAULT_RUN_ARGUMENTS};
use ktgen_spec::{Category, DefaultExtent, DEFAULT_STATIC_EXTENT, DEFINITIONS_FILE};
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// Main ktgen configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KtgenConfig {
    /// Where definitions are read and programs are written
    #[serde(default)]
    pub generation: GenerationConfig,
    /// Defaults for unspecified static extents
    #[serde(default)]
    pub extents: ExtentConfig,
    /// Build registration settings
    #[serde(default)]
    pub build: BuildConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Tests root holding one directory per category
    #[serde(default = "default_root")]
    pub root: PathBuf,
    /// Categories to generate
    #[serde(default = "default_categories")]
    pub categories: Vec<Category>,
    /// Definitions document read from each category directory
    #[serde(default = "default_definitions_file")]
    pub definitions_file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtentConfig {
    /// Static extent for indices that do not give one
    #[serde(default = "default_static_extent")]
    pub default_static: u32,
    /// When set, unspecified extents are drawn from [3,7) with this seed
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Arguments passed to every correctness program at run time
    #[serde(default = "default_run_arguments")]
    pub run_arguments: Vec<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: LogLevel,
    #[serde(default)]
    pub debug: bool,
}

/// Log level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn category_stream(category: Category) -> u64 {
    match category {
        Category::Correctness => 0,
        Category::CompileTimeChecks => 1,
    }
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}
fn default_categories() -> Vec<Category> {
    Category::ALL.to_vec()
}
fn default_definitions_file() -> String {
    DEFINITIONS_FILE.to_string()
}
fn default_static_extent() -> u32 {
    DEFAULT_STATIC_EXTENT
}
fn default_run_arguments() -> Vec<u32> {
    DEFAULT_RUN_ARGUMENTS.to_vec()
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            categories: default_categories(),
            definitions_file: default_definitions_file(),
        }
    }
}

impl Default for ExtentConfig {
    fn default() -> Self {
        Self {
            default_static: default_static_extent(),
            seed: None,
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            run_arguments: default_run_arguments(),
        }
    }
}

impl KtgenConfig {
    /// Policy for static extents `category` leaves unspecified. Each category
    /// gets its own stream, so a seeded run draws the same extents whether or
    /// not the other categories are generated alongside it.
    pub fn default_extent(&self, category: Category) -> DefaultExtent {
        match self.extents.seed {
            Some(seed) => DefaultExtent::seeded(seed ^ category_stream(category)),
            None => DefaultExtent::fixed(self.extents.default_static),
        }
    }

    pub fn generation_settings(&self) -> GenerationSettings {
        GenerationSettings {
            definitions_file: self.generation.definitions_file.clone(),
            run_arguments: self.build.run_arguments.clone(),
        }
    }
}

/// Configuration loader with multiple source support
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources. An explicit path must exist.
    pub fn load(explicit: Option<&Path>) -> Result<KtgenConfig> {
        let mut config = match explicit {
            Some(path) => Self::load_from_file(path)?,
            None => Self::load_from_files()?,
        };
        Self::apply_environment_variables(&mut config)?;
        Ok(config)
    }

    fn load_from_files() -> Result<KtgenConfig> {
        for path in Self::find_config_files() {
            if path.exists() {
                info!("Loading configuration from: {}", path.display());
                return Self::load_from_file(&path);
            }
        }

        debug!("No configuration file found, using defaults");
        Ok(KtgenConfig::default())
    }

    fn find_config_files() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        if let Ok(config_path) = env::var("KTGEN_CONFIG") {
            paths.push(PathBuf::from(config_path));
        }

        if let Ok(current_dir) = env::current_dir() {
            for name in [".ktgen.yaml", ".ktgen.yml", ".ktgen.json", ".ktgen.toml"] {
                paths.push(current_dir.join(name));
            }
        }

        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(".config/ktgen/config.yaml"));
            paths.push(home_dir.join(".config/ktgen/config.yml"));
        }

        paths
    }

    /// Load configuration from a specific file, choosing the format by extension
    pub fn load_from_file(path: &Path) -> Result<KtgenConfig> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))?,
            Some("toml") => toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display()))?,
            _ => serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display()))?,
        };

        Ok(config)
    }

    fn apply_environment_variables(config: &mut KtgenConfig) -> Result<()> {
        if let Ok(root) = env::var("KTGEN_ROOT") {
            if !root.trim().is_empty() {
                config.generation.root = PathBuf::from(root);
            }
        }

        if let Ok(extent) = env::var("KTGEN_DEFAULT_EXTENT") {
            config.extents.default_static = extent
                .trim()
                .parse()
                .with_context(|| format!("KTGEN_DEFAULT_EXTENT is not a number: {extent}"))?;
        }

        if let Ok(seed) = env::var("KTGEN_SEED") {
            config.extents.seed = Some(
                seed.trim()
                    .parse()
                    .with_context(|| format!("KTGEN_SEED is not a number: {seed}"))?,
            );
        }

        if let Ok(args) = env::var("KTGEN_RUN_ARGS") {
            config.build.run_arguments = parse_run_arguments(&args)?;
        }

        if let Ok(debug) = env::var("KTGEN_DEBUG") {
            config.logging.debug = parse_bool(&debug).unwrap_or(false);
        }

        if let Ok(log_level) = env::var("KTGEN_LOG_LEVEL") {
            if let Ok(level) = LogLevel::from_str(&log_level, true) {
                config.logging.level = level;
            }
        }

        Ok(())
    }

    /// Save configuration to a file
    pub fn save_to_file(config: &KtgenConfig, path: &Path) -> Result<()> {
        let content = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::to_string_pretty(config)
                .context("Failed to serialize config to JSON")?,
            Some("toml") => {
                toml::to_string_pretty(config).context("Failed to serialize config to TOML")?
            }
            _ => serde_yaml::to_string(config).context("Failed to serialize config to YAML")?,
        };

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        info!("Configuration saved to: {}", path.display());
        Ok(())
    }
}

/// Parse a run-argument list such as `3,4,5` or `3 4 5`
pub fn parse_run_arguments(value: &str) -> Result<Vec<u32>> {
    value
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|item| !item.is_empty())
        .map(|item| {
            item.parse()
                .with_context(|| format!("invalid run argument '{item}'"))
        })
        .collect()
}

/// Parse a boolean value from string with various formats
fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" | "enable" | "enabled" => Some(true),
        "0" | "false" | "no" | "off" | "disable" | "disabled" => Some(false),
        "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_defaults() {
        let config = KtgenConfig::default();
        assert_eq!(config.generation.root, PathBuf::from("."));
        assert_eq!(config.generation.categories, Category::ALL.to_vec());
        assert_eq!(config.generation.definitions_file, "test_definitions.yaml");
        assert_eq!(config.extents.default_static, DEFAULT_STATIC_EXTENT);
        assert_eq!(config.extents.seed, None);
        assert_eq!(config.build.run_arguments, vec![3, 4, 5, 6, 7, 8, 9]);
        assert_eq!(config.logging.level, LogLevel::Info);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: KtgenConfig =
            serde_yaml::from_str("extents:\n  seed: 11\ngeneration:\n  categories: [correctness]\n")
                .unwrap();
        assert_eq!(config.extents.seed, Some(11));
        assert_eq!(config.extents.default_static, DEFAULT_STATIC_EXTENT);
        assert_eq!(config.generation.categories, vec![Category::Correctness]);
        assert_eq!(config.build.run_arguments.len(), 7);
    }

    #[test]
    fn test_file_round_trip_in_each_format() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = KtgenConfig::default();
        config.extents.default_static = 6;
        config.build.run_arguments = vec![2, 3];

        for name in [".ktgen.yaml", ".ktgen.json", ".ktgen.toml"] {
            let path = temp_dir.path().join(name);
            ConfigLoader::save_to_file(&config, &path).unwrap();
            let loaded = ConfigLoader::load_from_file(&path).unwrap();
            assert_eq!(loaded.extents.default_static, 6, "{name}");
            assert_eq!(loaded.build.run_arguments, vec![2, 3], "{name}");
        }
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad.yaml");
        fs::write(&path, "extents: [unclosed").unwrap();
        assert!(ConfigLoader::load_from_file(&path).is_err());
    }

    #[test]
    fn test_default_extent_policy() {
        let mut config = KtgenConfig::default();
        config.extents.default_static = 4;
        for category in Category::ALL {
            assert_eq!(config.default_extent(category).next_extent(), 4);
        }

        config.extents.seed = Some(3);
        let mut a = config.default_extent(Category::CompileTimeChecks);
        let mut b = config.default_extent(Category::CompileTimeChecks);
        assert_eq!(a.next_extent(), b.next_extent());
    }

    #[test]
    fn test_seeded_categories_draw_independent_streams() {
        let mut config = KtgenConfig::default();
        config.extents.seed = Some(11);
        let draws = |category| {
            let mut extents = config.default_extent(category);
            (0..16).map(|_| extents.next_extent()).collect::<Vec<_>>()
        };

        let checks = draws(Category::CompileTimeChecks);
        assert_eq!(checks, draws(Category::CompileTimeChecks));
        assert!(checks.iter().all(|extent| (3..7).contains(extent)));
        assert_ne!(draws(Category::Correctness), checks);
    }

    #[test]
    fn test_run_argument_parsing() {
        assert_eq!(parse_run_arguments("3,4, 5").unwrap(), vec![3, 4, 5]);
        assert_eq!(parse_run_arguments("7 8").unwrap(), vec![7, 8]);
        assert!(parse_run_arguments("3,x").is_err());
    }

    #[test]
    fn test_bool_parsing() {
        assert_eq!(parse_bool("true"), Some(true));
        assert_eq!(parse_bool("1"), Some(true));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("invalid"), None);
    }
}
