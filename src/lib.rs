//! @ai:module:intent Traceability scope engine linking annotated code to specification entries
//! @ai:module:layer infrastructure
//! @ai:module:public_api annotation, config, coverage, error, language, lexer, matcher, output, project, registry, report, scanner, validator
//! @ai:module:stateless true
//!
//! # scopetrace
//!
//! Scans source files for `@begin` / `@end` / `@mark` markers written inside
//! comments, rebuilds the nested scope tree of each file and checks every
//! marker key against a registry of known specification entries.
//!
//! ## Example
//!
//! ```rust,no_run
//! use scopetrace::{output, scan_paths, ProfileTable, MarkerSyntax, Registry, ScanContext, ScanOptions};
//! use std::path::{Path, PathBuf};
//!
//! let registry = Registry::load(Path::new("spec/registry.json")).unwrap();
//! let ctx = ScanContext::new(ProfileTable::builtin(), MarkerSyntax::default(), registry).unwrap();
//!
//! let report = scan_paths(&[PathBuf::from("src")], &ScanOptions::default(), &ctx).unwrap();
//! println!("{}", output::format_project_report(&report, output::OutputFormat::Text));
//! ```

pub mod annotation;
pub mod config;
pub mod coverage;
pub mod error;
pub mod language;
pub mod lexer;
pub mod matcher;
pub mod output;
pub mod project;
pub mod registry;
pub mod report;
pub mod scanner;
pub mod validator;

pub use annotation::{
    BlockMarker, CodeFile, CodeReference, ExcludedRegion, FileStatus, MarkerEvent, ParseError,
    ReferenceStatus, RegistryKey, ScopeKey, ScopeMarker, StructuralError, StructuralErrorKind,
};
pub use config::{LanguageOverride, ScanConfig};
pub use coverage::coverage_gaps;
pub use error::{Error, Result};
pub use language::{build_marker_pattern, count_marker_shapes, Language, LanguageProfile, MarkerKind, MarkerSyntax, ProfileTable};
pub use lexer::{LexedSource, MarkerLexer};
pub use matcher::{match_events, MatchOutcome};
pub use output::{format_file_report, format_project_report, to_json, OutputFormat};
pub use project::{collect_files, scan_paths, FileSet, ScanOptions};
pub use registry::{Registry, RegistryEntry};
pub use report::{aggregate, FileCoverage, ProjectReport, ProjectSummary, ScanFailure};
pub use scanner::{scan_file, scan_source, ScanContext};
pub use validator::cross_validate;
