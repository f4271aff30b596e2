//! Check command implementation.
//!
//! Validates a filter expression. Failures are reported by `main` with the
//! full diagnostic and exit code 1.

use owo_colors::OwoColorize;

use super::{parse_filter, read_expression, CommandContext, Result};

/// Executes the check command.
pub fn execute(ctx: &CommandContext, expression: &str) -> Result<()> {
    let input = read_expression(expression)?;
    let expr = parse_filter(&input)?;
    let canonical = vecfilter::render(&expr, vecfilter::BackendKind::Text, None)?;

    if ctx.json_output {
        let output = serde_json::json!({
            "valid": true,
            "canonical": canonical,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if !ctx.quiet {
        let mark = if ctx.use_colors {
            "✓ valid".green().to_string()
        } else {
            "valid".to_string()
        };
        println!("{mark}: {canonical}");
    }

    Ok(())
}
