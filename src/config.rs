use serde::Deserialize;
use std::path::{Path, PathBuf};

use anyhow::Context;

use trailsift_types::DEFAULT_INDENT;

/// Settings read from `config.toml`; every field may be omitted
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub output: OutputConfig,
    pub compile: CompileConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct OutputConfig {
    /// Spaces per indentation level of the printed JSON
    #[serde(default = "default_indent")]
    pub indent: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            indent: default_indent(),
        }
    }
}

#[derive(Debug, Default, Deserialize, PartialEq)]
pub struct CompileConfig {
    /// Keep only successful API calls even without `--successful_api`
    #[serde(default)]
    pub successful_only: bool,
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_indent() -> usize {
    DEFAULT_INDENT
}

fn default_log_level() -> String {
    "warn".to_string()
}

/// Default config location, e.g. `~/.config/trailsift/config.toml`
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("trailsift").join("config.toml"))
}

/// Load the configuration.
///
/// An explicit `path` must exist. Without one, the default location is used
/// when present and built-in defaults otherwise.
pub fn load(path: Option<&Path>) -> anyhow::Result<Config> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => match default_path() {
            Some(path) if path.exists() => path,
            _ => return Ok(Config::default()),
        },
    };

    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;

    toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.output.indent, 4);
        assert!(!config.compile.successful_only);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_partial_file() {
        let config: Config = toml::from_str(
            r#"
            [output]
            indent = 2

            [compile]
            successful_only = true
            "#,
        )
        .unwrap();

        assert_eq!(config.output.indent, 2);
        assert!(config.compile.successful_only);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[logging]\nlevel = \"debug\"\n").unwrap();

        let config = load(Some(&path)).unwrap();
        assert_eq!(config.logging.level, "debug");

        assert!(load(Some(&dir.path().join("missing.toml"))).is_err());

        std::fs::write(&path, "[output]\nindent = \"wide\"\n").unwrap();
        let err = load(Some(&path)).unwrap_err();
        assert!(format!("{err:#}").contains("failed to parse config file"));
    }
}
