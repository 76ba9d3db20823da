//! @ai:module:intent Merge per-file findings and summarize multi-file scans
//! @ai:module:layer application
//! @ai:module:public_api aggregate, ProjectReport, ProjectSummary, ScanFailure, FileCoverage
//! @ai:module:depends_on annotation, matcher, language
//! @ai:module:stateless true

use crate::annotation::{
    CodeFile, CodeReference, FileStatus, ParseError, RegistryKey, ScopeMarker,
};
use crate::language::LanguageProfile;
use crate::matcher::MatchOutcome;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// @ai:intent Combine lexer, matcher and validator results into one file report
/// @ai:post status is FAIL iff any parse error, structural error or non-VALID reference exists
/// @ai:post parse errors are ordered by line
/// @ai:effects pure
pub fn aggregate(
    path: &Path,
    profile: &LanguageProfile,
    line_count: usize,
    outcome: MatchOutcome,
    references: Vec<CodeReference>,
    mut parse_errors: Vec<ParseError>,
) -> CodeFile {
    parse_errors.extend(outcome.exclusion_errors);
    parse_errors.sort_by_key(|e| e.line);

    let failed = !parse_errors.is_empty()
        || !outcome.errors.is_empty()
        || references.iter().any(|r| r.status.is_error());

    CodeFile {
        path: path.to_path_buf(),
        language: profile.name.clone(),
        status: if failed {
            FileStatus::Fail
        } else {
            FileStatus::Pass
        },
        line_count,
        scopes: outcome.scopes,
        standalone: outcome.standalone,
        excluded: outcome.excluded,
        references,
        structural_errors: outcome.errors,
        parse_errors,
    }
}

/// @ai:intent A file that could not be read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanFailure {
    pub path: PathBuf,
    pub message: String,
}

/// @ai:intent Line coverage of one file by traceability scopes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileCoverage {
    pub path: PathBuf,
    pub total_lines: usize,
    pub covered_lines: usize,
    pub excluded_lines: usize,
    /// Lines neither inside a scope nor inside an excluded region.
    pub uncovered_lines: usize,
}

impl FileCoverage {
    /// @ai:intent Compute line coverage from a file report
    /// @ai:post covered + excluded-only + uncovered == total
    /// @ai:effects pure
    pub fn from_file(file: &CodeFile) -> Self {
        let total = file.line_count;
        let scope_ranges: Vec<(usize, usize)> = file
            .scopes
            .iter()
            .map(|s: &ScopeMarker| (s.start_line, s.end_line))
            .collect();
        let excluded_ranges: Vec<(usize, usize)> = file
            .excluded
            .iter()
            .map(|r| (r.start_line, r.end_line))
            .collect();

        let mut covered = 0;
        let mut excluded = 0;
        let mut uncovered = 0;
        for line in 1..=total {
            let in_scope = scope_ranges.iter().any(|&(s, e)| (s..=e).contains(&line));
            let in_exclusion = excluded_ranges.iter().any(|&(s, e)| (s..=e).contains(&line));
            if in_exclusion {
                excluded += 1;
            }
            if in_scope {
                covered += 1;
            } else if !in_exclusion {
                uncovered += 1;
            }
        }

        Self {
            path: file.path.clone(),
            total_lines: total,
            covered_lines: covered,
            excluded_lines: excluded,
            uncovered_lines: uncovered,
        }
    }
}

/// @ai:intent Counters over a whole project scan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub files_scanned: usize,
    pub files_failed: usize,
    pub files_unreadable: usize,
    pub scopes: usize,
    pub standalone: usize,
    pub valid_references: usize,
    pub unknown_references: usize,
    pub structural_errors: usize,
    pub parse_errors: usize,
    pub coverage_gaps: usize,
}

/// @ai:intent Result of scanning many files against one registry
///
/// Files are sorted by path regardless of the order in which parallel scans
/// completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectReport {
    pub status: FileStatus,
    pub summary: ProjectSummary,
    pub files: Vec<CodeFile>,
    pub failures: Vec<ScanFailure>,
    pub coverage: Vec<FileCoverage>,
    pub coverage_gaps: Vec<RegistryKey>,
}

impl ProjectReport {
    /// @ai:intent Assemble the project report and compute its verdict
    /// @ai:post files and failures are sorted by path
    /// @ai:effects pure
    pub fn new(
        mut files: Vec<CodeFile>,
        mut failures: Vec<ScanFailure>,
        coverage_gaps: Vec<RegistryKey>,
        fail_on_gaps: bool,
    ) -> Self {
        files.sort_by(|a, b| a.path.cmp(&b.path));
        failures.sort_by(|a, b| a.path.cmp(&b.path));

        let mut summary = ProjectSummary {
            files_scanned: files.len(),
            files_unreadable: failures.len(),
            coverage_gaps: coverage_gaps.len(),
            ..Default::default()
        };
        for file in &files {
            if !file.passed() {
                summary.files_failed += 1;
            }
            summary.scopes += file.scope_count();
            summary.standalone += file.standalone.len();
            summary.structural_errors += file.structural_errors.len();
            summary.parse_errors += file.parse_errors.len();
            for reference in &file.references {
                if reference.status.is_error() {
                    summary.unknown_references += 1;
                } else {
                    summary.valid_references += 1;
                }
            }
        }

        let failed = summary.files_failed > 0
            || !failures.is_empty()
            || (fail_on_gaps && !coverage_gaps.is_empty());

        Self {
            status: if failed {
                FileStatus::Fail
            } else {
                FileStatus::Pass
            },
            summary,
            coverage: files.iter().map(FileCoverage::from_file).collect(),
            files,
            failures,
            coverage_gaps,
        }
    }

    pub fn passed(&self) -> bool {
        self.status == FileStatus::Pass
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{
        ExcludedRegion, ReferenceStatus, ScopeKey, StructuralError, StructuralErrorKind,
    };

    fn key() -> ScopeKey {
        ScopeKey {
            marker_type: "algo".to_string(),
            scope_id: "foo".to_string(),
            phase: "p1".to_string(),
            instance_id: None,
        }
    }

    fn scope(start: usize, end: usize) -> ScopeMarker {
        ScopeMarker {
            key: key(),
            start_line: start,
            end_line: end,
            depth: 0,
            children: vec![],
        }
    }

    fn reference(status: ReferenceStatus) -> CodeReference {
        CodeReference {
            key: key(),
            status,
            path: PathBuf::from("a.rs"),
            line: 1,
        }
    }

    fn file_with(outcome: MatchOutcome, refs: Vec<CodeReference>, errors: Vec<ParseError>) -> CodeFile {
        aggregate(
            Path::new("a.rs"),
            &LanguageProfile::fallback(),
            10,
            outcome,
            refs,
            errors,
        )
    }

    #[test]
    fn test_clean_file_passes() {
        let outcome = MatchOutcome {
            scopes: vec![scope(1, 3)],
            ..Default::default()
        };
        let file = file_with(outcome, vec![reference(ReferenceStatus::Valid)], vec![]);
        assert!(file.passed());
        assert_eq!(file.error_count(), 0);
        assert_eq!(file.language, "default");
    }

    #[test]
    fn test_each_error_category_fails() {
        let unknown = file_with(
            MatchOutcome::default(),
            vec![reference(ReferenceStatus::UnknownId)],
            vec![],
        );
        assert!(!unknown.passed());

        let parse = file_with(MatchOutcome::default(), vec![], vec![ParseError::new(2, "bad")]);
        assert!(!parse.passed());

        let structural = file_with(
            MatchOutcome {
                errors: vec![StructuralError {
                    kind: StructuralErrorKind::OrphanEnd,
                    key: key(),
                    line: 4,
                    message: "orphan".to_string(),
                }],
                ..Default::default()
            },
            vec![],
            vec![],
        );
        assert!(!structural.passed());
        assert_eq!(structural.error_count(), 1);
    }

    #[test]
    fn test_exclusion_errors_merge_into_parse_errors_in_line_order() {
        let outcome = MatchOutcome {
            exclusion_errors: vec![ParseError::new(2, "exclusion")],
            ..Default::default()
        };
        let file = file_with(outcome, vec![], vec![ParseError::new(5, "lexer")]);
        let lines: Vec<_> = file.parse_errors.iter().map(|e| e.line).collect();
        assert_eq!(lines, vec![2, 5]);
    }

    #[test]
    fn test_file_coverage_counts_exclusions_separately() {
        let outcome = MatchOutcome {
            scopes: vec![scope(1, 3)],
            excluded: vec![ExcludedRegion {
                start_line: 3,
                end_line: 6,
                reason: None,
            }],
            ..Default::default()
        };
        let coverage = FileCoverage::from_file(&file_with(outcome, vec![], vec![]));

        assert_eq!(coverage.total_lines, 10);
        assert_eq!(coverage.covered_lines, 3);
        assert_eq!(coverage.excluded_lines, 4);
        assert_eq!(coverage.uncovered_lines, 4);
    }

    #[test]
    fn test_project_report_sorts_and_fails_on_gaps_when_asked() {
        let mut b = file_with(MatchOutcome::default(), vec![], vec![]);
        b.path = PathBuf::from("b.rs");
        let a = file_with(MatchOutcome::default(), vec![], vec![]);
        let gaps = vec![RegistryKey::new("algo", "foo", "p1")];

        let lenient = ProjectReport::new(vec![b.clone(), a.clone()], vec![], gaps.clone(), false);
        assert!(lenient.passed());
        assert_eq!(lenient.files[0].path, PathBuf::from("a.rs"));
        assert_eq!(lenient.summary.coverage_gaps, 1);

        let strict = ProjectReport::new(vec![b, a], vec![], gaps, true);
        assert!(!strict.passed());
    }

    #[test]
    fn test_unreadable_file_fails_project() {
        let report = ProjectReport::new(
            vec![],
            vec![ScanFailure {
                path: PathBuf::from("x.rs"),
                message: "denied".to_string(),
            }],
            vec![],
            false,
        );
        assert!(!report.passed());
        assert_eq!(report.summary.files_unreadable, 1);
    }
}
