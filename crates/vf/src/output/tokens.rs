//! Token stream output formatting.

use owo_colors::OwoColorize;
use serde::Serialize;
use vecfilter::filter::Token;

/// JSON output structure for a single token.
#[derive(Serialize)]
pub struct TokenOutput<'a> {
    pub kind: &'static str,
    pub text: &'a str,
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

/// Formats tokens as JSON.
pub fn format_tokens_json(tokens: &[Token]) -> Result<String, serde_json::Error> {
    let output: Vec<TokenOutput> = tokens
        .iter()
        .map(|t| TokenOutput {
            kind: t.kind.display_name(),
            text: t.text(),
            line: t.position.line,
            column: t.position.column,
            offset: t.position.offset,
        })
        .collect();
    serde_json::to_string_pretty(&output)
}

/// Formats tokens as a table.
pub fn format_tokens_table(tokens: &[Token], use_colors: bool) -> String {
    let mut output = String::new();

    let header = format!("{:<8} {:<16} {}", "Pos", "Kind", "Text");
    if use_colors {
        output.push_str(&format!("{}\n", header.dimmed()));
    } else {
        output.push_str(&header);
        output.push('\n');
    }

    for token in tokens {
        let kind = format!("{:<16}", token.kind.display_name());
        let kind = if use_colors {
            kind.cyan().to_string()
        } else {
            kind
        };
        output.push_str(&format!(
            "{:<8} {} {}\n",
            token.position.to_string(),
            kind,
            token.text()
        ));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use vecfilter::filter::tokenize;

    fn tokens(input: &str) -> Vec<Token> {
        tokenize(input).collect::<Result<_, _>>().unwrap()
    }

    #[test]
    fn test_tokens_table() {
        let table = format_tokens_table(&tokens("year >= 2020"), false);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[1], "1:0      IDENTIFIER       year");
        assert_eq!(lines[2], "1:5      '>='             >=");
        assert_eq!(lines[4], "1:12     <EOF>            <EOF>");
    }

    #[test]
    fn test_tokens_json() {
        let json: serde_json::Value =
            serde_json::from_str(&format_tokens_json(&tokens("a IN ['x']")).unwrap()).unwrap();
        assert_eq!(json[1]["kind"], "IN");
        assert_eq!(json[3]["kind"], "QUOTED_STRING");
        assert_eq!(json[3]["text"], "'x'");
        assert_eq!(json[3]["column"], 6);
    }
}
