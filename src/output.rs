//! @ai:module:intent Format scan reports as colored text or JSON
//! @ai:module:layer infrastructure
//! @ai:module:public_api OutputFormat, format_file_report, format_project_report, to_json
//! @ai:module:depends_on annotation, report
//! @ai:module:stateless true

use crate::annotation::{CodeFile, FileStatus, ScopeMarker};
use crate::report::ProjectReport;
use colored::Colorize;
use serde::Serialize;
use std::fmt::Write;

/// @ai:intent Output format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    JsonPretty,
}

/// @ai:intent Format any serializable value as JSON
/// @ai:effects pure
pub fn to_json<T: Serialize>(value: &T, pretty: bool) -> String {
    if pretty {
        serde_json::to_string_pretty(value).unwrap_or_default()
    } else {
        serde_json::to_string(value).unwrap_or_default()
    }
}

/// @ai:intent Format a project report as a string
/// @ai:effects pure
pub fn format_project_report(report: &ProjectReport, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => to_json(report, false),
        OutputFormat::JsonPretty => to_json(report, true),
        OutputFormat::Text => format_project_report_text(report),
    }
}

/// @ai:intent Format a single file report, scope tree included
/// @ai:effects pure
pub fn format_file_report(file: &CodeFile, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => to_json(file, false),
        OutputFormat::JsonPretty => to_json(file, true),
        OutputFormat::Text => format_file_report_text(file),
    }
}

fn status_label(status: FileStatus) -> colored::ColoredString {
    match status {
        FileStatus::Pass => "PASS".green().bold(),
        FileStatus::Fail => "FAIL".red().bold(),
    }
}

/// Lists only the findings; passing files are summarized by the counters.
fn format_project_report_text(report: &ProjectReport) -> String {
    let mut output = String::new();

    for file in report.files.iter().filter(|f| !f.passed()) {
        write_findings(&mut output, file);
    }

    for failure in &report.failures {
        let _ = writeln!(
            output,
            "{} {} - {}",
            "ERROR".red().bold(),
            failure.path.display().to_string().dimmed(),
            failure.message
        );
    }

    for gap in &report.coverage_gaps {
        let _ = writeln!(
            output,
            "{} {} has no scope in any scanned file",
            "WARN".yellow().bold(),
            gap.to_string().cyan()
        );
    }

    let summary = &report.summary;
    output.push('\n');
    let _ = writeln!(
        output,
        "Scanned {} files, {} scopes, {} standalone markers",
        summary.files_scanned, summary.scopes, summary.standalone
    );
    let _ = writeln!(
        output,
        "{} valid, {} unknown references; {} structural, {} parse errors; {} coverage gaps",
        summary.valid_references,
        summary.unknown_references,
        summary.structural_errors,
        summary.parse_errors,
        summary.coverage_gaps
    );
    let _ = writeln!(output, "{}", status_label(report.status));

    output
}

fn write_findings(output: &mut String, file: &CodeFile) {
    let path = file.path.display().to_string();

    for error in &file.parse_errors {
        let _ = writeln!(
            output,
            "{} {} - {} ({})",
            "ERROR".red().bold(),
            format!("{path}:{}", error.line).dimmed(),
            error.message,
            "PARSE".dimmed()
        );
    }

    for error in &file.structural_errors {
        let _ = writeln!(
            output,
            "{} {} - {} ({})",
            "ERROR".red().bold(),
            format!("{path}:{}", error.line).dimmed(),
            error.message,
            error.kind.status().as_str().dimmed()
        );
    }

    for reference in file.references.iter().filter(|r| r.status.is_error()) {
        let _ = writeln!(
            output,
            "{} {} - `{}` is not in the registry ({})",
            "ERROR".red().bold(),
            format!("{path}:{}", reference.line).dimmed(),
            reference.key,
            reference.status.as_str().dimmed()
        );
    }
}

fn format_file_report_text(file: &CodeFile) -> String {
    let mut output = String::new();

    let _ = writeln!(
        output,
        "{} ({}) {}",
        file.path.display().to_string().bold(),
        file.language,
        status_label(file.status)
    );

    let _ = writeln!(output, "\n  Scopes ({}):", file.scope_count());
    for scope in &file.scopes {
        write_scope(&mut output, scope);
    }

    if !file.standalone.is_empty() {
        let _ = writeln!(output, "\n  Standalone ({}):", file.standalone.len());
        for marker in &file.standalone {
            let _ = writeln!(output, "    {} (line {})", marker.key.to_string().cyan(), marker.line);
        }
    }

    if !file.excluded.is_empty() {
        let _ = writeln!(output, "\n  Excluded ({}):", file.excluded.len());
        for region in &file.excluded {
            let _ = writeln!(
                output,
                "    lines {}-{}{}",
                region.start_line,
                region.end_line,
                region
                    .reason
                    .as_deref()
                    .map(|r| format!(": {r}"))
                    .unwrap_or_default()
            );
        }
    }

    if file.error_count() > 0 {
        output.push('\n');
        write_findings(&mut output, file);
    }

    output
}

fn write_scope(output: &mut String, scope: &ScopeMarker) {
    let indent = "  ".repeat(scope.depth + 2);
    let _ = writeln!(
        output,
        "{indent}{} (lines {}-{})",
        scope.key.to_string().cyan(),
        scope.start_line,
        scope.end_line
    );
    for child in &scope.children {
        write_scope(output, child);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::RegistryKey;
    use crate::language::{MarkerSyntax, ProfileTable};
    use crate::registry::Registry;
    use crate::scanner::{scan_source, ScanContext};
    use std::path::Path;

    fn scanned(source: &str) -> CodeFile {
        let registry = Registry::from_keys([RegistryKey::new("algo", "foo", "p1")]);
        let ctx = ScanContext::new(ProfileTable::builtin(), MarkerSyntax::default(), registry).unwrap();
        scan_source(Path::new("lib.rs"), source, &ctx).unwrap()
    }

    #[test]
    fn test_text_lists_scope_tree() {
        colored::control::set_override(false);
        let file = scanned(
            "// @begin:algo:foo:p1\n// @begin:algo:foo:p1:inner\n// @end:algo:foo:p1:inner\n// @end:algo:foo:p1\n",
        );
        let text = format_file_report(&file, OutputFormat::Text);

        assert!(text.contains("lib.rs (rust) PASS"));
        assert!(text.contains("    algo:foo:p1 (lines 1-4)"));
        assert!(text.contains("      algo:foo:p1:inner (lines 2-3)"));
    }

    #[test]
    fn test_project_text_reports_findings() {
        colored::control::set_override(false);
        let file = scanned("// @end:algo:bar:p1\n");
        let report = ProjectReport::new(vec![file], vec![], vec![], false);
        let text = format_project_report(&report, OutputFormat::Text);

        assert!(text.contains("lib.rs:1"));
        assert!(text.contains("ORPHAN_END"));
        assert!(text.contains("FAIL"));
    }

    #[test]
    fn test_json_is_machine_readable() {
        let file = scanned("// @begin:algo:foo:p1\n// @end:algo:foo:p1\n");
        let json = format_file_report(&file, OutputFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["status"], "PASS");
        assert_eq!(value["references"][0]["status"], "VALID");
        assert_eq!(value["scopes"][0]["start_line"], 1);
    }
}
