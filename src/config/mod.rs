use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::assistant::MatcherMode;
use crate::cli::Args;
use crate::grammar::Language;
use crate::suppression::DEFAULT_STORE_FILE;

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = ".migration-assistant.yml";

pub const DEFAULT_VERSION: &str = "6.0";
pub const DEFAULT_CONTEXT_LINES: usize = 3;

/// Contents of `.migration-assistant.yml`. Every key is optional.
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub language: Option<String>,
    pub version: Option<String>,
    pub context_lines: Option<usize>,
    pub regex_parser: Option<bool>,
    pub catalog: Option<PathBuf>,
    pub ignore_file: Option<PathBuf>,
    /// Glob patterns of files to skip while walking directories.
    pub exclude: Vec<String>,
}

/// Load the config file. An explicitly given file must exist; the default
/// one is optional.
pub fn load_config(path: Option<&Path>) -> Result<FileConfig> {
    let (config_path, explicit) = match path {
        Some(p) => (p.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };

    if !config_path.exists() {
        if explicit {
            bail!("config file not found: {}", config_path.display());
        }
        return Ok(FileConfig::default());
    }

    let contents = std::fs::read_to_string(&config_path)
        .with_context(|| format!("failed to read config {}", config_path.display()))?;
    if contents.trim().is_empty() {
        return Ok(FileConfig::default());
    }
    serde_yml::from_str(&contents)
        .with_context(|| format!("failed to parse {}", config_path.display()))
}

/// Settings for one run: CLI flags over config file values over defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub language: Language,
    pub version: String,
    pub context_lines: usize,
    pub mode: MatcherMode,
    pub catalog: Option<PathBuf>,
    pub ignore_file: PathBuf,
    pub excludes: Vec<String>,
}

impl Settings {
    pub fn resolve(args: &Args, file: FileConfig) -> Result<Self> {
        let language = match args.language.as_deref().or(file.language.as_deref()) {
            Some(name) => name.parse::<Language>()?,
            None => bail!("no language given; pass --language or set `language` in {DEFAULT_CONFIG_FILE}"),
        };
        let regex_parser = args.regex_parser || file.regex_parser.unwrap_or(false);
        // Java and .NET have no grammar; the regex parser is their only mode.
        let mode = if regex_parser || language.compiler().is_none() {
            MatcherMode::Fallback
        } else {
            MatcherMode::Structural
        };

        Ok(Self {
            language,
            version: args
                .version
                .clone()
                .or(file.version)
                .unwrap_or_else(|| DEFAULT_VERSION.to_string()),
            context_lines: args
                .context_lines
                .or(file.context_lines)
                .unwrap_or(DEFAULT_CONTEXT_LINES),
            mode,
            catalog: args.catalog.clone().or(file.catalog),
            ignore_file: args
                .ignore_file
                .clone()
                .or(file.ignore_file)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_FILE)),
            excludes: file.exclude,
        })
    }
}
