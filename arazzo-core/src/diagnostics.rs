use lsp_types::{Diagnostic, DiagnosticSeverity, Position, Range};

use crate::config::schema::DiagnosticsConfig;
use crate::error::Error;
use crate::validation::{Finding, Severity};

fn line_range(line: usize, column: usize, end_column: u32) -> Range {
    let line = u32::try_from(line).unwrap_or(u32::MAX);
    let column = u32::try_from(column).unwrap_or(u32::MAX);
    Range::new(
        Position::new(line, column),
        Position::new(line, end_column.max(column)),
    )
}

/// A document that failed to parse gets one error pinned to its first line.
pub fn parse_failure(error: &Error, config: &DiagnosticsConfig) -> Diagnostic {
    Diagnostic {
        range: line_range(0, 0, config.end_column),
        severity: Some(DiagnosticSeverity::ERROR),
        source: Some(config.source.clone()),
        message: error.to_string(),
        ..Diagnostic::default()
    }
}

pub fn from_finding(finding: &Finding, config: &DiagnosticsConfig) -> Diagnostic {
    let severity = match finding.severity {
        Severity::Error => DiagnosticSeverity::ERROR,
        Severity::Warning => DiagnosticSeverity::WARNING,
    };

    Diagnostic {
        range: line_range(finding.line, finding.column, config.end_column),
        severity: Some(severity),
        source: Some(config.source.clone()),
        message: finding.message.clone(),
        ..Diagnostic::default()
    }
}

pub fn from_findings(findings: &[Finding], config: &DiagnosticsConfig) -> Vec<Diagnostic> {
    findings
        .iter()
        .map(|finding| from_finding(finding, config))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{from_findings, parse_failure};
    use crate::config::schema::DiagnosticsConfig;
    use crate::error::Error;
    use crate::validation::Finding;
    use lsp_types::{DiagnosticSeverity, Position};

    #[test]
    fn findings_map_one_to_one_with_widened_ranges() {
        let config = DiagnosticsConfig::default();
        let findings = vec![
            Finding::error(3, "Duplicate workflowId 'a'"),
            Finding::warning(7, "Operation 'x' used by step 's' was not found"),
        ];

        let diagnostics = from_findings(&findings, &config);
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics[0].range.start, Position::new(3, 0));
        assert_eq!(diagnostics[0].range.end, Position::new(3, 100));
        assert_eq!(diagnostics[0].severity, Some(DiagnosticSeverity::ERROR));
        assert_eq!(diagnostics[1].severity, Some(DiagnosticSeverity::WARNING));
        assert_eq!(diagnostics[1].source.as_deref(), Some("arazzo-lsp"));
    }

    #[test]
    fn parse_failure_sits_on_the_first_line() {
        let config = DiagnosticsConfig {
            end_column: 40,
            ..DiagnosticsConfig::default()
        };
        let diagnostic = parse_failure(&Error::Parse("invalid YAML: bad".to_owned()), &config);

        assert_eq!(diagnostic.range.start, Position::new(0, 0));
        assert_eq!(diagnostic.range.end, Position::new(0, 40));
        assert!(diagnostic.message.contains("invalid YAML"));
    }
}
