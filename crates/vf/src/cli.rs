//! CLI argument parsing using clap derive macros.
//!
//! This module defines the command-line interface for the vf CLI.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use vecfilter::render::BackendKind;

/// vf - Parse, check and render metadata filter expressions
#[derive(Parser, Debug)]
#[command(name = "vf")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbose output (show debug information)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colors in output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Config file to use (default: ~/.config/vf/config.toml)
    #[arg(long, global = true, env = "VF_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse a filter and print its syntax tree
    #[command(alias = "p")]
    Parse {
        /// Filter expression ("-" reads from stdin)
        expression: String,
    },

    /// Compile a filter into a backend's native filter syntax
    #[command(alias = "r")]
    Render {
        /// Filter expression ("-" reads from stdin)
        expression: String,

        /// Target backend (default: from config, else pgvector)
        #[arg(short, long, value_enum)]
        backend: Option<Backend>,

        /// Map a filter field to a backend field, as name=backend_name (repeatable)
        #[arg(short, long = "field", value_name = "NAME=FIELD", action = clap::ArgAction::Append)]
        fields: Vec<String>,

        /// JSONB metadata column (sql, pgvector) or property prefix (neo4j)
        #[arg(long)]
        metadata_column: Option<String>,

        /// Cypher node variable (neo4j)
        #[arg(long)]
        node_alias: Option<String>,
    },

    /// Validate a filter and explain the first error
    #[command(alias = "c")]
    Check {
        /// Filter expression ("-" reads from stdin)
        expression: String,
    },

    /// Print the token stream of a filter
    Tokens {
        /// Filter expression ("-" reads from stdin)
        expression: String,
    },

    /// View and edit configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Render backends
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
    Text,
    Sql,
    Pgvector,
    Neo4j,
    Mongo,
    Chroma,
}

impl From<Backend> for BackendKind {
    fn from(backend: Backend) -> Self {
        match backend {
            Backend::Text => BackendKind::Text,
            Backend::Sql => BackendKind::Sql,
            Backend::Pgvector => BackendKind::PgVector,
            Backend::Neo4j => BackendKind::Neo4j,
            Backend::Mongo => BackendKind::Mongo,
            Backend::Chroma => BackendKind::Chroma,
        }
    }
}

/// Shell types for completions
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    Powershell,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Write a commented default config file
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (backend, render.metadata_column, render.node_alias, field_map.<name>)
        key: String,

        /// Configuration value
        value: String,
    },

    /// Print config file path
    Path,
}
