//! Configuration from `~/.taskify/rc`
//!
//! The file holds `key=value` lines; `#` starts a comment. Relative paths are
//! resolved against the directory holding the rc file.

use anyhow::{anyhow, bail, Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::models::FilterSelection;
use crate::parser::{DEFAULT_REMINDER_HOUR, remote::DEFAULT_EXTRACTION_TIMEOUT};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserStrategy {
    Local,
    Remote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemindersBackend {
    Notifications,
    None,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Shared database file
    pub data_location: PathBuf,
    pub parser_strategy: ParserStrategy,
    /// Extraction command for the remote strategy
    pub parser_command: Option<String>,
    pub parser_timeout: Duration,
    pub reminders_backend: RemindersBackend,
    pub default_hour: u32,
    pub notifications_permitted: bool,
    pub filters: FilterSelection,
}

impl Config {
    /// Settings used when no rc file exists
    pub fn defaults(base_dir: &Path) -> Self {
        Self {
            data_location: base_dir.join("taskify.db"),
            parser_strategy: ParserStrategy::Local,
            parser_command: None,
            parser_timeout: DEFAULT_EXTRACTION_TIMEOUT,
            reminders_backend: RemindersBackend::Notifications,
            default_hour: DEFAULT_REMINDER_HOUR,
            notifications_permitted: true,
            filters: FilterSelection::default(),
        }
    }

    /// Home directory. `HOME` wins so tests and scripts can redirect it.
    pub fn home_dir() -> Result<PathBuf> {
        std::env::var_os("HOME")
            .filter(|home| !home.is_empty())
            .map(PathBuf::from)
            .or_else(dirs::home_dir)
            .ok_or_else(|| anyhow!("Could not determine home directory; set HOME"))
    }

    pub fn base_dir() -> Result<PathBuf> {
        Ok(Self::home_dir()?.join(".taskify"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("rc"))
    }

    /// Load the rc file, falling back to defaults when it does not exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        let base_dir = Self::base_dir()?;
        if !config_path.exists() {
            return Ok(Self::defaults(&base_dir));
        }
        let contents = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config: {}", config_path.display()))?;
        Self::parse(&contents, &base_dir)
            .with_context(|| format!("Invalid config: {}", config_path.display()))
    }

    pub fn parse(contents: &str, base_dir: &Path) -> Result<Self> {
        let mut config = Self::defaults(base_dir);
        for (number, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                bail!("line {}: expected key=value, got '{}'", number + 1, line);
            };
            let (key, value) = (key.trim(), value.trim());
            config
                .apply(key, value, base_dir)
                .with_context(|| format!("line {}: {}", number + 1, key))?;
        }
        Ok(config)
    }

    fn apply(&mut self, key: &str, value: &str, base_dir: &Path) -> Result<()> {
        match key {
            "data.location" => {
                let path = PathBuf::from(value);
                self.data_location = if path.is_relative() {
                    base_dir.join(path)
                } else {
                    path
                };
            }
            "parser.strategy" => {
                self.parser_strategy = match value.to_lowercase().as_str() {
                    "local" => ParserStrategy::Local,
                    "remote" => ParserStrategy::Remote,
                    _ => bail!("expected 'local' or 'remote', got '{}'", value),
                };
            }
            "parser.command" => {
                self.parser_command = (!value.is_empty()).then(|| value.to_string());
            }
            "parser.timeout" => {
                let seconds: u64 = value
                    .trim_end_matches('s')
                    .parse()
                    .map_err(|_| anyhow!("expected seconds, got '{}'", value))?;
                if seconds == 0 {
                    bail!("timeout must be positive");
                }
                self.parser_timeout = Duration::from_secs(seconds);
            }
            "reminders.backend" => {
                self.reminders_backend = match value.to_lowercase().as_str() {
                    "notifications" => RemindersBackend::Notifications,
                    "none" | "off" => RemindersBackend::None,
                    _ => bail!("expected 'notifications' or 'none', got '{}'", value),
                };
            }
            "reminders.default_hour" => {
                let hour: u32 = value
                    .parse()
                    .map_err(|_| anyhow!("expected an hour, got '{}'", value))?;
                if hour > 23 {
                    bail!("hour must be between 0 and 23, got {}", hour);
                }
                self.default_hour = hour;
            }
            "notifications.permission" => {
                self.notifications_permitted = match value.to_lowercase().as_str() {
                    "granted" => true,
                    "denied" => false,
                    _ => bail!("expected 'granted' or 'denied', got '{}'", value),
                };
            }
            "filters" => {
                self.filters = FilterSelection::parse(value).map_err(|e| anyhow!(e))?;
            }
            _ => log::warn!("Ignoring unknown config key '{}'", key),
        }
        Ok(())
    }

    /// Where widget stamps and caches live
    pub fn widget_dir(&self) -> PathBuf {
        self.data_location
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default()
            .join("widgets")
    }
}
