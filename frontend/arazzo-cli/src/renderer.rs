use arazzo_core::navigation::IndexReport;
use arazzo_core::{Finding, OperationRecord, Severity};
use serde::Serialize;

use crate::cli::OutputFormat;

pub struct Renderer {
    output_format: OutputFormat,
}

#[derive(Serialize)]
struct FindingsOutput<'a> {
    file: &'a str,
    errors: usize,
    warnings: usize,
    findings: &'a [Finding],
}

#[derive(Serialize)]
struct IndexOutput<'a> {
    report: &'a IndexReport,
    operations: &'a [OperationRecord],
}

impl Renderer {
    pub fn new(output_format: OutputFormat) -> Self {
        Self { output_format }
    }

    pub fn render_findings(&self, file: &str, findings: &[Finding]) -> arazzo_core::Result<()> {
        let errors = findings.iter().filter(|finding| finding.is_error()).count();
        let warnings = findings.len() - errors;

        match self.output_format {
            OutputFormat::Json => {
                let output = FindingsOutput {
                    file,
                    errors,
                    warnings,
                    findings,
                };
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Text => {
                for finding in findings {
                    let label = match finding.severity {
                        Severity::Error => "error",
                        Severity::Warning => "warning",
                    };
                    // Editors count lines from one.
                    println!("{file}:{}: {label}: {}", finding.line + 1, finding.message);
                }
                println!("{errors} error(s), {warnings} warning(s)");
            }
        }
        Ok(())
    }

    pub fn render_index(
        &self,
        report: &IndexReport,
        operations: &[OperationRecord],
    ) -> arazzo_core::Result<()> {
        match self.output_format {
            OutputFormat::Json => {
                let output = IndexOutput { report, operations };
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Text => {
                println!(
                    "Indexed {} of {} API description(s), {} failed, {} operation(s).",
                    report.indexed, report.discovered, report.failed, report.operations
                );
                for record in operations {
                    self.render_record_line(record);
                }
            }
        }
        Ok(())
    }

    pub fn render_record(&self, record: &OperationRecord) -> arazzo_core::Result<()> {
        match self.output_format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(record)?),
            OutputFormat::Text => {
                self.render_record_line(record);
                if !record.summary.is_empty() {
                    println!("  summary: {}", record.summary);
                }
                if !record.tags.is_empty() {
                    println!("  tags: {}", record.tags.join(", "));
                }
            }
        }
        Ok(())
    }

    fn render_record_line(&self, record: &OperationRecord) {
        println!(
            "- {} {} {} ({}:{})",
            record.operation_id,
            record.method,
            record.path,
            record.file_name,
            record.line + 1
        );
    }
}
