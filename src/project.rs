//! @ai:module:intent Discover files under the given paths and scan them in parallel
//! @ai:module:layer application
//! @ai:module:public_api scan_paths, collect_files, FileSet, ScanOptions
//! @ai:module:depends_on scanner, coverage, report, language, error
//! @ai:module:stateless true

use crate::annotation::CodeFile;
use crate::coverage::coverage_gaps;
use crate::error::{Error, Result};
use crate::language::ProfileTable;
use crate::report::{ProjectReport, ScanFailure};
use crate::scanner::{scan_file, ScanContext};
use rayon::prelude::*;
use std::path::PathBuf;
use walkdir::{DirEntry, WalkDir};

/// @ai:intent File discovery and verdict options for a project scan
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// File or directory names skipped during the walk.
    pub exclude: Vec<String>,
    pub fail_on_gaps: bool,
}

/// @ai:intent Files found under the scan roots plus entries the walk could not read
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSet {
    pub files: Vec<PathBuf>,
    pub failures: Vec<ScanFailure>,
}

/// @ai:intent List files to scan, sorted and deduplicated
/// @ai:pre every path exists
/// @ai:post explicit file paths are kept even with an unknown extension
/// @ai:post directory entries are kept only for registered extensions
/// @ai:post entries the walk fails on (unreadable directories, symlink loops) land in `failures`
/// @ai:effects fs:read
pub fn collect_files(
    paths: &[PathBuf],
    exclude: &[String],
    profiles: &ProfileTable,
) -> Result<FileSet> {
    let mut set = FileSet::default();

    for path in paths {
        if !path.exists() {
            return Err(Error::Config(format!(
                "path does not exist: {}",
                path.display()
            )));
        }

        if path.is_file() {
            set.files.push(path.clone());
            continue;
        }

        for entry in WalkDir::new(path)
            .follow_links(true)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_excluded(e, exclude))
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let failed = e.path().unwrap_or(path.as_path()).to_path_buf();
                    tracing::warn!("Cannot walk {}: {}", failed.display(), e);
                    set.failures.push(ScanFailure {
                        path: failed,
                        message: e.to_string(),
                    });
                    continue;
                }
            };

            if entry.file_type().is_file() && profiles.is_known(entry.path()) {
                set.files.push(entry.into_path());
            }
        }
    }

    set.files.sort();
    set.files.dedup();
    Ok(set)
}

fn is_excluded(entry: &DirEntry, exclude: &[String]) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| exclude.iter().any(|x| x == name))
}

/// @ai:intent Scan every discovered file and build the project report
/// @ai:pre ctx is fully built; it is only read during the scan
/// @ai:post report files are sorted by path regardless of completion order
/// @ai:post unreadable files become ScanFailure entries instead of aborting the run
/// @ai:effects fs:read
pub fn scan_paths(
    paths: &[PathBuf],
    options: &ScanOptions,
    ctx: &ScanContext,
) -> Result<ProjectReport> {
    let FileSet { files, mut failures } = collect_files(paths, &options.exclude, ctx.profiles())?;
    tracing::info!("Scanning {} files", files.len());

    let results: Vec<(PathBuf, Result<CodeFile>)> = files
        .par_iter()
        .map(|path| (path.clone(), scan_file(path, ctx)))
        .collect();

    let mut scanned = Vec::with_capacity(results.len());
    for (path, result) in results {
        match result {
            Ok(file) => scanned.push(file),
            Err(e) => {
                tracing::warn!("Skipping unreadable file {}: {}", path.display(), e);
                failures.push(ScanFailure {
                    path,
                    message: e.to_string(),
                });
            }
        }
    }

    let gaps = coverage_gaps(ctx.registry(), &scanned);
    let report = ProjectReport::new(scanned, failures, gaps, options.fail_on_gaps);
    tracing::info!(
        "Scanned {} files: {} failed, {} coverage gaps",
        report.summary.files_scanned,
        report.summary.files_failed,
        report.summary.coverage_gaps
    );
    Ok(report)
}
