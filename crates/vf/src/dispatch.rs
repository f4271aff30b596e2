//! Command dispatch module for routing CLI commands to their handlers.

use crate::cli::{Cli, Commands, ConfigCommands, Shell};
use crate::commands::{self, CommandContext, CommandError, Result};
use crate::commands::render::RenderOptions;

/// A command that can be executed.
pub trait Command {
    /// Executes the command.
    fn execute(&self, ctx: &CommandContext) -> Result<()>;
}

/// A parsed command line, borrowed from [`Cli`].
pub enum Dispatch<'a> {
    Parse(&'a str),
    Render(RenderOptions),
    Check(&'a str),
    Tokens(&'a str),
    Config(&'a Option<ConfigCommands>),
    Completions(Shell),
    Help,
}

impl<'a> Dispatch<'a> {
    /// Creates a dispatch from the CLI command.
    pub fn from_cli(cli: &'a Cli) -> Self {
        match &cli.command {
            Some(Commands::Parse { expression }) => Self::Parse(expression),
            Some(Commands::Render {
                expression,
                backend,
                fields,
                metadata_column,
                node_alias,
            }) => Self::Render(RenderOptions {
                expression: expression.clone(),
                backend: backend.map(Into::into),
                fields: fields.clone(),
                metadata_column: metadata_column.clone(),
                node_alias: node_alias.clone(),
            }),
            Some(Commands::Check { expression }) => Self::Check(expression),
            Some(Commands::Tokens { expression }) => Self::Tokens(expression),
            Some(Commands::Config { command }) => Self::Config(command),
            Some(Commands::Completions { shell }) => Self::Completions(*shell),
            None => Self::Help,
        }
    }
}

impl Command for Dispatch<'_> {
    fn execute(&self, ctx: &CommandContext) -> Result<()> {
        match self {
            Self::Parse(expression) => commands::parse::execute(ctx, expression),
            Self::Render(opts) => commands::render::execute(ctx, opts),
            Self::Check(expression) => commands::check::execute(ctx, expression),
            Self::Tokens(expression) => commands::tokens::execute(ctx, expression),
            Self::Config(command) => dispatch_config(ctx, command),
            Self::Completions(shell) => {
                commands::completions::execute(*shell).map_err(CommandError::Io)
            }
            Self::Help => {
                if !ctx.quiet {
                    println!("vf - filter expression compiler for vector stores");
                    println!("Use --help for usage information");
                }
                Ok(())
            }
        }
    }
}

/// Dispatch config subcommands.
fn dispatch_config(ctx: &CommandContext, command: &Option<ConfigCommands>) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::execute_show(ctx),
        Some(ConfigCommands::Init { force }) => commands::config::execute_init(ctx, *force),
        Some(ConfigCommands::Set { key, value }) => {
            let opts = commands::config::ConfigSetOptions {
                key: key.clone(),
                value: value.clone(),
            };
            commands::config::execute_set(ctx, &opts)
        }
        Some(ConfigCommands::Path) => commands::config::execute_path(ctx),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use vecfilter::BackendKind;

    #[test]
    fn test_render_options_from_cli() {
        let cli = Cli::parse_from([
            "vf", "render", "a == 1", "-b", "sql", "-f", "a=b", "--metadata-column", "attrs",
        ]);
        match Dispatch::from_cli(&cli) {
            Dispatch::Render(opts) => {
                assert_eq!(opts.expression, "a == 1");
                assert_eq!(opts.backend, Some(BackendKind::Sql));
                assert_eq!(opts.fields, vec!["a=b"]);
                assert_eq!(opts.metadata_column.as_deref(), Some("attrs"));
                assert_eq!(opts.node_alias, None);
            }
            _ => panic!("Expected Render dispatch"),
        }
    }

    #[test]
    fn test_no_command_is_help() {
        let cli = Cli::parse_from(["vf"]);
        assert!(matches!(Dispatch::from_cli(&cli), Dispatch::Help));
    }

    #[test]
    fn test_config_without_subcommand() {
        let cli = Cli::parse_from(["vf", "config"]);
        assert!(matches!(Dispatch::from_cli(&cli), Dispatch::Config(None)));
    }
}
