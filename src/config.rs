//! Runtime configuration.
//!
//! Values come from three layers, lowest first: built-in defaults, the TOML
//! file (only with the `config` feature) and command-line overrides.

use crate::cache::DEFAULT_CACHE_LIMIT;
use crate::error::{LoglessError, Result};
use crate::search::DEFAULT_QUERY_LIMIT;
use crate::stream::InputFormat;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagerConfig {
    /// Resident commit body bytes before eviction kicks in
    pub cache_limit: usize,
    pub input_format: InputFormat,
    /// Command printing one commit; the id is appended
    pub show_command: Vec<String>,
    /// Command listing commit ids when stdin is a terminal
    pub log_command: Vec<String>,
    pub query_limit: usize,
    pub log_file: Option<PathBuf>,
    pub monochrome: bool,
}

impl Default for PagerConfig {
    fn default() -> Self {
        Self {
            cache_limit: DEFAULT_CACHE_LIMIT,
            input_format: InputFormat::Auto,
            show_command: vec!["git".to_string(), "show".to_string()],
            log_command: vec![
                "git".to_string(),
                "log".to_string(),
                "--pretty=format:%H".to_string(),
            ],
            query_limit: DEFAULT_QUERY_LIMIT,
            log_file: None,
            monochrome: false,
        }
    }
}

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub cache_limit: Option<usize>,
    pub input_format: Option<InputFormat>,
    pub show_command: Option<Vec<String>>,
    pub log_command: Option<Vec<String>>,
    pub query_limit: Option<usize>,
    pub log_file: Option<PathBuf>,
    pub monochrome: bool,
}

impl PagerConfig {
    /// Load the file layer and apply `overrides` on top.
    pub fn resolve(path: Option<&Path>, overrides: ConfigOverrides) -> Result<Self> {
        let config = Self::load(path)?.with_overrides(overrides);
        config.validate()?;
        Ok(config)
    }

    /// Read the config file.
    ///
    /// An explicit `path` must exist; the default location is optional.
    #[cfg(feature = "config")]
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) if path.is_file() => path,
                _ => return Ok(Self::default()),
            },
        };
        let text = std::fs::read_to_string(&path).map_err(|err| {
            LoglessError::config(format!("cannot read {}: {err}", path.display()))
        })?;
        let config = Self::from_toml(&text)
            .map_err(|err| LoglessError::config(format!("{}: {err}", path.display())))?;
        log::debug!("loaded configuration from {}", path.display());
        Ok(config)
    }

    #[cfg(not(feature = "config"))]
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Err(LoglessError::config(format!(
                "cannot read {}: built without the `config` feature",
                path.display()
            ))),
            None => Ok(Self::default()),
        }
    }

    /// `$CONFIG_DIR/logless/config.toml`
    #[cfg(feature = "config")]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("logless").join("config.toml"))
    }

    #[cfg(feature = "config")]
    pub fn from_toml(text: &str) -> Result<Self> {
        let file: file::ConfigFile =
            toml::from_str(text).map_err(|err| LoglessError::config(err.to_string()))?;
        Ok(file.into_config())
    }

    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(limit) = overrides.cache_limit {
            self.cache_limit = limit;
        }
        if let Some(format) = overrides.input_format {
            self.input_format = format;
        }
        if let Some(command) = overrides.show_command {
            self.show_command = command;
        }
        if let Some(command) = overrides.log_command {
            self.log_command = command;
        }
        if let Some(limit) = overrides.query_limit {
            self.query_limit = limit;
        }
        if overrides.log_file.is_some() {
            self.log_file = overrides.log_file;
        }
        self.monochrome |= overrides.monochrome;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.cache_limit == 0 {
            return Err(LoglessError::config("cache_limit must be positive"));
        }
        if self.query_limit < 2 {
            return Err(LoglessError::config("query_limit must be at least 2"));
        }
        if self.show_command.is_empty() {
            return Err(LoglessError::config("show_command must not be empty"));
        }
        if self.log_command.is_empty() {
            return Err(LoglessError::config("log_command must not be empty"));
        }
        Ok(())
    }
}

#[cfg(feature = "config")]
mod file {
    use super::PagerConfig;
    use crate::stream::InputFormat;
    use serde::Deserialize;
    use std::path::PathBuf;

    /// On-disk layout; every key is optional.
    #[derive(Debug, Default, Deserialize)]
    #[serde(default, deny_unknown_fields)]
    pub(super) struct ConfigFile {
        cache_limit: Option<usize>,
        input_format: Option<InputFormat>,
        show_command: Option<Vec<String>>,
        log_command: Option<Vec<String>>,
        query_limit: Option<usize>,
        log_file: Option<PathBuf>,
        monochrome: Option<bool>,
    }

    impl ConfigFile {
        pub(super) fn into_config(self) -> PagerConfig {
            let defaults = PagerConfig::default();
            PagerConfig {
                cache_limit: self.cache_limit.unwrap_or(defaults.cache_limit),
                input_format: self.input_format.unwrap_or(defaults.input_format),
                show_command: self.show_command.unwrap_or(defaults.show_command),
                log_command: self.log_command.unwrap_or(defaults.log_command),
                query_limit: self.query_limit.unwrap_or(defaults.query_limit),
                log_file: self.log_file.or(defaults.log_file),
                monochrome: self.monochrome.unwrap_or(defaults.monochrome),
            }
        }
    }
}
