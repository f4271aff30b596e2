use clap::Parser;
use std::process::ExitCode;

mod cli;
mod commands;
mod dispatch;
mod output;

use cli::Cli;
use commands::{CommandContext, CommandError};
use dispatch::{Command, Dispatch};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_error(&cli, &e);
            error_exit_code(&e)
        }
    }
}

/// Routes log output to stderr. `RUST_LOG` overrides the level chosen by
/// `--verbose` and `--quiet`.
fn init_logging(cli: &Cli) {
    let level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn run(cli: &Cli) -> commands::Result<()> {
    let ctx = CommandContext::from_cli(cli);
    Dispatch::from_cli(cli).execute(&ctx)
}

fn report_error(cli: &Cli, e: &CommandError) {
    if cli.json {
        let mut error_json = serde_json::json!({
            "error": {
                "code": error_code(e),
                "message": e.to_string(),
            }
        });
        if let CommandError::Filter(diagnostic) = e {
            if let Ok(value) = serde_json::to_value(diagnostic) {
                error_json["error"]["diagnostic"] = value;
            }
        }
        match serde_json::to_string_pretty(&error_json) {
            Ok(text) => eprintln!("{text}"),
            Err(_) => eprintln!("{error_json}"),
        }
        return;
    }

    let use_colors = !cli.no_color && std::env::var_os("NO_COLOR").is_none();
    match e {
        CommandError::Filter(diagnostic) => {
            eprintln!("{}", output::format_diagnostic(diagnostic, use_colors));
        }
        _ => eprintln!("Error: {e}"),
    }
}

/// Returns the error code string for JSON output.
fn error_code(e: &CommandError) -> &'static str {
    match e {
        CommandError::Filter(_) => "FILTER_ERROR",
        CommandError::Render(_) => "RENDER_ERROR",
        CommandError::Config(_) => "CONFIG_ERROR",
        CommandError::Io(_) => "IO_ERROR",
        CommandError::Json(_) => "JSON_ERROR",
    }
}

/// Returns the exit code for an error.
fn error_exit_code(e: &CommandError) -> ExitCode {
    match e {
        CommandError::Filter(_) => ExitCode::from(1),
        CommandError::Json(_) => ExitCode::from(1),
        CommandError::Io(_) => ExitCode::from(3),
        CommandError::Render(_) => ExitCode::from(4),
        CommandError::Config(_) => ExitCode::from(5),
    }
}
