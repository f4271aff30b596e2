//! Filter error output formatting.

use owo_colors::OwoColorize;
use vecfilter::filter::Diagnostic;

/// Formats a diagnostic report for the terminal.
pub fn format_diagnostic(diagnostic: &Diagnostic, use_colors: bool) -> String {
    if !use_colors {
        return format!("error: {diagnostic}");
    }

    let mut output = format!("{} {}", "error:".red().bold(), diagnostic.message.bold());
    if let (Some(line), Some(caret)) = (&diagnostic.source_line, diagnostic.caret()) {
        output.push_str(&format!("\n  {}\n  {}", line, caret.red().bold()));
    }
    if !diagnostic.expected.is_empty() {
        output.push_str(&format!(
            "\n  {} {}",
            "expected one of:".dimmed(),
            diagnostic.expected.join(", ")
        ));
    }
    if let Some(hint) = &diagnostic.hint {
        output.push_str(&format!("\n  {} {}", "hint:".cyan().bold(), hint));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use vecfilter::filter::FilterParser;

    fn diagnose(input: &str) -> Diagnostic {
        let err = FilterParser::parse(input).unwrap_err();
        Diagnostic::from_error(&err, input)
    }

    #[test]
    fn test_plain_report() {
        let report = format_diagnostic(&diagnose("country == NL"), false);
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(
            lines[0],
            "error: Line: 1:17, Error: no viable alternative at input 'NL'"
        );
        assert_eq!(lines[1], "  WHERE country == NL");
        assert_eq!(lines[2], "                   ^");
        assert_eq!(lines.last().copied(), Some("  hint: string values must be quoted, e.g. 'NL'"));
    }

    #[test]
    fn test_colored_report_keeps_text() {
        let report = format_diagnostic(&diagnose("country == NL"), true);
        assert!(report.contains("\u{1b}["));
        assert!(report.contains("no viable alternative at input 'NL'"));
        assert!(report.contains("WHERE country == NL"));
    }
}
