//! Syntax tree output formatting.

use owo_colors::OwoColorize;
use serde::Serialize;
use vecfilter::filter::Expr;
use vecfilter::render::{BackendKind, RenderResult};

/// JSON output structure for the parse command.
#[derive(Serialize)]
pub struct ParseOutput<'a> {
    /// Canonical spelling of the filter.
    pub canonical: String,
    pub ast: &'a Expr,
}

/// Formats a parsed filter as JSON.
pub fn format_ast_json(expr: &Expr) -> Result<String, serde_json::Error> {
    let canonical = vecfilter::render(expr, BackendKind::Text, None)
        .unwrap_or_else(|e| e.to_string());
    serde_json::to_string_pretty(&ParseOutput {
        canonical,
        ast: expr,
    })
}

/// Formats a parsed filter as an indented tree, one node per line.
///
/// ```text
/// OR
/// ├── AND
/// │   ├── country == 'BG'
/// │   └── year == 2020
/// └── country == 'NL'
/// ```
pub fn format_ast_tree(expr: &Expr, use_colors: bool) -> RenderResult<String> {
    let mut output = String::new();
    write_node(&mut output, expr, "", None, use_colors)?;
    Ok(output)
}

/// Writes `expr` and its children. `last` is `None` for the root.
fn write_node(
    output: &mut String,
    expr: &Expr,
    prefix: &str,
    last: Option<bool>,
    use_colors: bool,
) -> RenderResult<()> {
    let (branch, child_prefix) = match last {
        None => ("", String::new()),
        Some(true) => ("└── ", format!("{prefix}    ")),
        Some(false) => ("├── ", format!("{prefix}│   ")),
    };
    output.push_str(&format!("{prefix}{branch}{}\n", label(expr, use_colors)?));

    let children: Vec<&Expr> = match expr {
        Expr::And { left, right } | Expr::Or { left, right } => vec![&**left, &**right],
        Expr::Group { inner } => vec![&**inner],
        Expr::Comparison { .. } | Expr::Membership { .. } => Vec::new(),
    };
    let count = children.len();
    for (i, child) in children.into_iter().enumerate() {
        write_node(output, child, &child_prefix, Some(i + 1 == count), use_colors)?;
    }
    Ok(())
}

fn label(expr: &Expr, use_colors: bool) -> RenderResult<String> {
    let operator = match expr {
        Expr::And { .. } => "AND",
        Expr::Or { .. } => "OR",
        Expr::Group { .. } => {
            return Ok(if use_colors {
                "( )".dimmed().to_string()
            } else {
                "( )".to_string()
            });
        }
        Expr::Comparison { .. } | Expr::Membership { .. } => {
            return vecfilter::render(expr, BackendKind::Text, None);
        }
    };
    Ok(if use_colors {
        operator.cyan().bold().to_string()
    } else {
        operator.to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use vecfilter::filter::FilterParser;

    #[test]
    fn test_tree_layout() {
        let expr = FilterParser::parse("(country == 'BG' && year == 2020) || (country == 'NL')")
            .unwrap();
        let tree = format_ast_tree(&expr, false).unwrap();
        let expected = "\
OR
├── ( )
│   └── AND
│       ├── country == 'BG'
│       └── year == 2020
└── ( )
    └── country == 'NL'
";
        assert_eq!(tree, expected);
    }

    #[test]
    fn test_single_predicate() {
        let expr = FilterParser::parse("x NIN [1, 2]").unwrap();
        assert_eq!(format_ast_tree(&expr, false).unwrap(), "x NOT IN [1, 2]\n");
    }

    #[test]
    fn test_json_includes_canonical_text() {
        let expr = FilterParser::parse("a == 1 && b == 'x'").unwrap();
        let json: serde_json::Value = serde_json::from_str(&format_ast_json(&expr).unwrap()).unwrap();
        assert_eq!(json["canonical"], "a == 1 AND b == 'x'");
        assert_eq!(json["ast"]["type"], "and");
        assert_eq!(json["ast"]["left"]["key"]["name"], "a");
    }
}
