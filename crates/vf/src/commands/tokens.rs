//! Tokens command implementation.
//!
//! Prints the token stream the parser sees, including the implicit end of input.

use vecfilter::filter::{tokenize, Diagnostic, LexError, Token};

use super::{read_expression, CommandContext, CommandError, Result};
use crate::output::{format_tokens_json, format_tokens_table};

/// Tokenizes `input`, stopping at the first invalid character.
fn collect_tokens(input: &str) -> Result<Vec<Token>> {
    tokenize(input)
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| CommandError::Filter(Box::new(lex_diagnostic(&e, input))))
}

/// Reports a lexer error against the raw input rather than the `WHERE`-prefixed text.
fn lex_diagnostic(error: &LexError, input: &str) -> Diagnostic {
    let position = error.position();
    Diagnostic {
        message: error.to_string(),
        position: Some(position),
        source_line: input.lines().nth(position.line - 1).map(str::to_string),
        expected: Vec::new(),
        hint: None,
    }
}

/// Executes the tokens command.
///
/// Positions refer to the expression exactly as given, without the implied
/// leading `WHERE`.
pub fn execute(ctx: &CommandContext, expression: &str) -> Result<()> {
    let input = read_expression(expression)?;
    let tokens = collect_tokens(&input)?;
    log::debug!("{} tokens", tokens.len());

    if ctx.json_output {
        println!("{}", format_tokens_json(&tokens)?);
    } else if !ctx.quiet {
        print!("{}", format_tokens_table(&tokens, ctx.use_colors));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use vecfilter::filter::TokenKind;

    #[test]
    fn test_collect_tokens_ends_with_eof() {
        let tokens = collect_tokens("a == 1").unwrap();
        assert_eq!(tokens.len(), 4);
        assert_eq!(tokens[3].kind, TokenKind::Eof);
    }

    #[test]
    fn test_collect_tokens_reports_bad_character() {
        let err = collect_tokens("a == 1 ; b").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Line: 1:7, Error: token recognition error at: ';'"
        );
        match err {
            CommandError::Filter(d) => {
                assert_eq!(d.source_line.as_deref(), Some("a == 1 ; b"));
                assert_eq!(d.caret().as_deref(), Some("       ^"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
