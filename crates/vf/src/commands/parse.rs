//! Parse command implementation.
//!
//! Prints the syntax tree of a filter expression.

use super::{parse_filter, read_expression, CommandContext, Result};
use crate::output::{format_ast_json, format_ast_tree};

/// Executes the parse command.
///
/// # Errors
///
/// Returns `CommandError::Filter` if the expression does not parse.
pub fn execute(ctx: &CommandContext, expression: &str) -> Result<()> {
    let input = read_expression(expression)?;
    let expr = parse_filter(&input)?;

    if ctx.json_output {
        println!("{}", format_ast_json(&expr)?);
    } else if !ctx.quiet {
        print!("{}", format_ast_tree(&expr, ctx.use_colors)?);
    }

    Ok(())
}
