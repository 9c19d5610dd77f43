//! # Storage Layer
//!
//! Reads analyzer inputs and configuration from disk.
//!
//! ## Formats
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Plan | JSON | any path given on the command line |
//! | Milestone table | JSON array or JSONL | any path |
//! | Precondition table | JSON array or JSONL | any path |
//! | Config | TOML | `.pfd/config.toml`, global config dir, or `--config` |
//!
//! ## Key Types
//!
//! - [`Config`] - Project and global configuration
//! - [`load_plan`], [`load_milestones`], [`load_preconditions`] - input loaders

mod config;
mod files;

pub use config::{Config, ConfigError, GlobalConfig, ProjectConfig, PROJECT_DIR};
pub use files::{load_milestones, load_plan, load_preconditions, read_json, read_rows};
