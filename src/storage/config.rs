//! Configuration handling for the PFD analyzer
//!
//! Configuration is stored in `.pfd/config.toml` (project) and
//! `~/.config/pfd-analyzer/config.toml` (global). An explicit `--config`
//! file replaces the project file.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cli::OutputFormat;
use crate::domain::WorkCalendar;

/// Name of the per-project directory holding `config.toml`
pub const PROJECT_DIR: &str = ".pfd";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Project-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct ProjectConfig {
    /// Working calendar used to place business time on the wall clock
    pub calendar: WorkCalendar,

    /// First calendar day of the project; business time 0 opens the first
    /// business day on or after it
    pub project_start: Option<NaiveDate>,
}

impl ProjectConfig {
    /// Rejects calendars under which no business time can be placed
    pub fn validate(&self) -> Result<(), ConfigError> {
        let calendar = &self.calendar;
        if calendar.workdays.is_empty() {
            return Err(ConfigError::Invalid(
                "calendar.workdays must name at least one weekday".to_string(),
            ));
        }
        if calendar.close <= calendar.open {
            return Err(ConfigError::Invalid(format!(
                "calendar.close ({}) must be after calendar.open ({})",
                calendar.close, calendar.open
            )));
        }
        Ok(())
    }

    /// Business hours as `open-close`, for display
    pub fn hours_label(&self) -> String {
        format!("{}-{}", self.calendar.open, self.calendar.close)
    }
}

/// Global user configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct GlobalConfig {
    /// Output format used when `--format` is not given
    pub default_format: OutputFormat,
}

/// Combined configuration (global + project)
#[derive(Debug, Clone)]
pub struct Config {
    pub project: ProjectConfig,
    pub global: GlobalConfig,

    /// File the project configuration came from, if any
    pub project_file: Option<PathBuf>,
}

impl Config {
    /// Loads configuration from default locations, or from `explicit` in
    /// place of the project file
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let global = Self::load_global()?;

        let project_file = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => std::env::current_dir()
                .ok()
                .and_then(|cwd| Self::find_project_root(&cwd))
                .map(|root| root.join(PROJECT_DIR).join("config.toml"))
                .filter(|path| path.exists()),
        };

        let project = match &project_file {
            Some(path) => Self::load_project_file(path)?,
            None => ProjectConfig::default(),
        };

        Ok(Self {
            project,
            global,
            project_file,
        })
    }

    /// Returns the global config directory
    pub fn global_config_dir() -> Option<PathBuf> {
        ProjectDirs::from("dev", "pfd", "pfd-analyzer").map(|dirs| dirs.config_dir().to_path_buf())
    }

    fn load_global() -> Result<GlobalConfig> {
        let config_dir = match Self::global_config_dir() {
            Some(dir) => dir,
            None => return Ok(GlobalConfig::default()),
        };

        let config_path = config_dir.join("config.toml");
        if !config_path.exists() {
            return Ok(GlobalConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read global config: {}", config_path.display()))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .context("Failed to parse global config")
    }

    /// Reads and validates one project configuration file
    pub fn load_project_file(path: &Path) -> Result<ProjectConfig> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read project config: {}", path.display()))?;

        let config: ProjectConfig = toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .with_context(|| format!("Failed to parse project config: {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("Invalid project config: {}", path.display()))?;

        log::debug!("loaded project config from {}", path.display());
        Ok(config)
    }

    /// Finds the project root by looking for a `.pfd/` directory in `start`
    /// or any of its ancestors
    pub fn find_project_root(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();

        loop {
            if current.join(PROJECT_DIR).is_dir() {
                return Some(current);
            }

            if !current.pop() {
                return None;
            }
        }
    }

    /// Project start date, or an error naming how to set it
    pub fn require_project_start(&self) -> Result<NaiveDate> {
        self.project.project_start.ok_or_else(|| {
            anyhow::anyhow!("No project start date. Pass --start or set project_start in .pfd/config.toml")
        })
    }
}
