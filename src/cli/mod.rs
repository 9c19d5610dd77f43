//! # Command-Line Interface
//!
//! User-facing CLI commands and output formatting.
//!
//! ## Commands
//!
//! | Command | Purpose |
//! |---------|---------|
//! | `parse` | Parse one precondition expression |
//! | `check` | Validate a precondition table, report cyclic references |
//! | `timeline` | Milestone start/end per group in business time |
//! | `schedule` | Milestone start/end per group on the calendar |
//!
//! ## Output Formats
//!
//! All commands support the `--format` flag:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! ## Verbose Mode
//!
//! Use `--verbose` (or `-v`) for debug logging:
//! ```bash
//! pfd --verbose check preconditions.json
//! ```
//!
//! ## Entry Point
//!
//! Parse a [`Cli`] and pass it to [`run()`].

mod app;
mod output;
mod precondition;
mod timeline;

pub use app::{run, Cli, Commands, InputArgs};
pub use output::{Output, OutputFormat};
