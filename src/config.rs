//! Optional `equity.toml` project configuration.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::diagnostics::CompileError;

pub const CONFIG_FILE: &str = "equity.toml";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// Extra import search roots, already resolved against the config file's directory.
    pub import_paths: Vec<PathBuf>,
    pub format: OutputFormat,
    pub steps: bool,
}

// ---- TOML deserialization types ----

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlConfig {
    #[serde(default)]
    imports: TomlImports,
    #[serde(default)]
    output: TomlOutput,
}

#[derive(Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlImports {
    #[serde(default)]
    paths: Vec<String>,
}

#[derive(Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlOutput {
    #[serde(default)]
    format: OutputFormat,
    #[serde(default)]
    steps: bool,
}

impl Config {
    /// Parses `content`, resolving relative import paths against `base_dir`.
    pub fn parse(content: &str, base_dir: &Path, config_path: &Path) -> Result<Config, CompileError> {
        let raw: TomlConfig = toml::from_str(content).map_err(|e| {
            CompileError::config(format!("{CONFIG_FILE}: invalid syntax: {e}"), config_path.to_path_buf())
        })?;
        let import_paths = raw
            .imports
            .paths
            .iter()
            .map(|p| {
                let p = Path::new(p);
                if p.is_absolute() { p.to_path_buf() } else { base_dir.join(p) }
            })
            .collect();
        Ok(Config { import_paths, format: raw.output.format, steps: raw.output.steps })
    }

    pub fn load(config_path: &Path) -> Result<Config, CompileError> {
        let content = std::fs::read_to_string(config_path).map_err(|e| {
            CompileError::config(format!("{CONFIG_FILE}: could not read file: {e}"), config_path.to_path_buf())
        })?;
        let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
        Config::parse(&content, base_dir, config_path)
    }

    /// Loads `equity.toml` from the entry file's directory if present.
    pub fn discover(entry_file: &Path) -> Result<Option<Config>, CompileError> {
        let dir = entry_file.parent().unwrap_or_else(|| Path::new("."));
        let candidate = dir.join(CONFIG_FILE);
        if !candidate.is_file() {
            return Ok(None);
        }
        tracing::debug!(path = %candidate.display(), "loading config");
        Config::load(&candidate).map(Some)
    }
}
