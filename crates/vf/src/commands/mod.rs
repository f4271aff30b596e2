//! Command implementations for the vf CLI.
//!
//! This module contains the actual command handlers that are invoked by the CLI.

pub mod check;
pub mod completions;
pub mod config;
pub mod parse;
pub mod render;
pub mod tokens;

use std::env;
use std::io::{self, Read};
use std::path::PathBuf;

use vecfilter::filter::{Diagnostic, Expr, FilterParser};

use crate::cli::Cli;

/// Error type for command execution.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// The filter expression is invalid.
    #[error("{}", .0.message)]
    Filter(Box<Diagnostic>),

    /// The filter cannot be expressed by the chosen backend.
    #[error("render error: {0}")]
    Render(#[from] vecfilter::render::RenderError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for command execution.
pub type Result<T> = std::result::Result<T, CommandError>;

/// Context for command execution, containing common dependencies.
pub struct CommandContext {
    /// Whether to output JSON.
    pub json_output: bool,
    /// Whether to use colors.
    pub use_colors: bool,
    /// Whether to be quiet (errors only).
    pub quiet: bool,
    /// Whether to be verbose.
    pub verbose: bool,
    /// Config file given with `--config` or `VF_CONFIG`.
    pub config_path: Option<PathBuf>,
}

impl CommandContext {
    /// Creates a new command context from CLI arguments.
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            json_output: cli.json,
            use_colors: !cli.no_color && env::var_os("NO_COLOR").is_none(),
            quiet: cli.quiet,
            verbose: cli.verbose,
            config_path: cli.config.clone(),
        }
    }
}

/// Returns the filter text, reading stdin when the argument is `-`.
pub fn read_expression(argument: &str) -> Result<String> {
    if argument != "-" {
        return Ok(argument.to_string());
    }
    let mut input = String::new();
    io::stdin().read_to_string(&mut input)?;
    Ok(input.trim_end_matches(['\n', '\r']).to_string())
}

/// Parses `input`, turning a failure into a diagnostic error.
pub fn parse_filter(input: &str) -> Result<Expr> {
    FilterParser::parse(input)
        .map_err(|e| CommandError::Filter(Box::new(Diagnostic::from_error(&e, input))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_expression_passes_arguments_through() {
        assert_eq!(read_expression("a == 1").unwrap(), "a == 1");
    }

    #[test]
    fn test_parse_filter_error_carries_diagnostic() {
        let err = parse_filter("country == NL").unwrap_err();
        let CommandError::Filter(diagnostic) = &err else {
            panic!("expected filter error, got {err:?}");
        };
        assert_eq!(diagnostic.source_line.as_deref(), Some("WHERE country == NL"));
        assert_eq!(
            err.to_string(),
            "Line: 1:17, Error: no viable alternative at input 'NL'"
        );
    }
}
