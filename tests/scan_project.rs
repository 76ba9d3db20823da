//! Integration tests for `scopetrace::scan_paths` and the per-file pipeline.

use pretty_assertions::assert_eq;
use scopetrace::{
    scan_paths, scan_source, FileStatus, MarkerSyntax, ProfileTable, ReferenceStatus, Registry,
    RegistryKey, ScanConfig, ScanContext, ScanOptions, ScopeMarker, StructuralErrorKind,
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn context(keys: &[(&str, &str, &str)]) -> ScanContext {
    let registry = Registry::from_keys(
        keys.iter()
            .map(|(t, s, p)| RegistryKey::new(t, s, p)),
    );
    ScanContext::new(ProfileTable::builtin(), MarkerSyntax::default(), registry).unwrap()
}

fn flatten(scopes: &[ScopeMarker]) -> Vec<(usize, usize)> {
    let mut out = Vec::new();
    for scope in scopes {
        scope.walk(&mut |s| out.push((s.start_line, s.end_line)));
    }
    out
}

#[test]
fn test_well_nested_tree_round_trips_to_marker_lines() {
    let source = "\
// @begin:algo:a:p1
fn a() {
    // @begin:algo:b:p1
    b();
    // @begin:algo:c:p1
    c();
    // @end:algo:c:p1
    // @end:algo:b:p1
}
// @end:algo:a:p1
// @begin:algo:d:p1
// @end:algo:d:p1
";
    let ctx = context(&[("algo", "a", "p1"), ("algo", "b", "p1"), ("algo", "c", "p1"), ("algo", "d", "p1")]);
    let file = scan_source(Path::new("tree.rs"), source, &ctx).unwrap();

    assert_eq!(file.status, FileStatus::Pass);
    assert_eq!(file.scope_count(), 4);
    assert_eq!(flatten(&file.scopes), vec![(1, 10), (3, 8), (5, 7), (11, 12)]);
    let lines: Vec<_> = file.references.iter().map(|r| r.line).collect();
    assert_eq!(lines, vec![1, 3, 5, 11]);
}

#[test]
fn test_interleaved_scopes_yield_single_crossing_error() {
    let source = "\
# @begin:algo:a:p1
# @begin:algo:b:p1
# @end:algo:a:p1
# @end:algo:b:p1
";
    let ctx = context(&[("algo", "a", "p1"), ("algo", "b", "p1")]);
    let file = scan_source(Path::new("cross.py"), source, &ctx).unwrap();

    assert_eq!(file.status, FileStatus::Fail);
    assert_eq!(file.structural_errors.len(), 1);
    assert_eq!(file.structural_errors[0].kind, StructuralErrorKind::Crossing);
    assert_eq!(file.structural_errors[0].line, 3);
    assert_eq!(flatten(&file.scopes), vec![(2, 4)]);
}

#[test]
fn test_orphan_and_unclosed_localization() {
    let ctx = context(&[("algo", "x", "p1")]);

    let orphan = scan_source(Path::new("o.go"), "package x\n// @end:algo:x:p1\n", &ctx).unwrap();
    assert!(orphan.scopes.is_empty());
    assert_eq!(orphan.structural_errors.len(), 1);
    assert_eq!(orphan.structural_errors[0].kind, StructuralErrorKind::OrphanEnd);
    assert_eq!(orphan.structural_errors[0].line, 2);

    let unclosed = scan_source(Path::new("u.go"), "// @begin:algo:x:p1\nfunc f() {}\n", &ctx).unwrap();
    assert_eq!(unclosed.structural_errors.len(), 1);
    assert_eq!(unclosed.structural_errors[0].kind, StructuralErrorKind::Unclosed);
    assert_eq!(unclosed.structural_errors[0].line, 1);
}

#[test]
fn test_registry_example_pass_and_fail() {
    let source = "// @begin:algo:foo:p1:inst-a\ncode\n// @end:algo:foo:p1:inst-a\n";

    let known = scan_source(Path::new("f.ts"), source, &context(&[("algo", "foo", "p1")])).unwrap();
    assert_eq!(known.status, FileStatus::Pass);
    assert_eq!(flatten(&known.scopes), vec![(1, 3)]);
    assert_eq!(known.references.len(), 1);
    assert_eq!(known.references[0].status, ReferenceStatus::Valid);

    let unknown = scan_source(Path::new("f.ts"), source, &context(&[])).unwrap();
    assert_eq!(unknown.status, FileStatus::Fail);
    assert!(unknown.structural_errors.is_empty());
    assert_eq!(unknown.references.len(), 1);
    assert_eq!(unknown.references[0].status, ReferenceStatus::UnknownId);
    assert_eq!(unknown.references[0].line, 1);
}

#[test]
fn test_marker_text_in_strings_is_ignored() {
    let source = r#"let doc = "// @begin:algo:foo:p1";
let other = "@end:algo:foo:p1";
"#;
    let file = scan_source(Path::new("s.rs"), source, &context(&[])).unwrap();
    assert_eq!(file.status, FileStatus::Pass);
    assert!(file.references.is_empty());
}

#[test]
fn test_scan_paths_sorts_reports_and_finds_gaps() {
    let tmp = TempDir::new().unwrap();
    fs::create_dir_all(tmp.path().join("src/nested")).unwrap();
    fs::create_dir_all(tmp.path().join("target")).unwrap();
    fs::write(
        tmp.path().join("src/nested/z.rs"),
        "// @begin:algo:login:p1\n// @end:algo:login:p1\n",
    )
    .unwrap();
    fs::write(tmp.path().join("src/a.py"), "# @mark:state:session:p1\n").unwrap();
    fs::write(
        tmp.path().join("target/ignored.rs"),
        "// @end:algo:broken:p1\n",
    )
    .unwrap();

    let ctx = context(&[
        ("algo", "login", "p1"),
        ("state", "session", "p1"),
        ("algo", "logout", "p1"),
    ]);
    let options = ScanOptions {
        exclude: vec!["target".to_string()],
        fail_on_gaps: false,
    };

    let report = scan_paths(&[tmp.path().to_path_buf()], &options, &ctx).unwrap();

    let paths: Vec<_> = report.files.iter().map(|f| f.path.clone()).collect();
    assert_eq!(
        paths,
        vec![tmp.path().join("src/a.py"), tmp.path().join("src/nested/z.rs")]
    );
    assert!(report.passed());
    assert_eq!(report.summary.scopes, 1);
    assert_eq!(report.summary.standalone, 1);
    assert_eq!(report.coverage_gaps, vec![RegistryKey::new("algo", "logout", "p1")]);

    let strict = ScanOptions {
        fail_on_gaps: true,
        ..options
    };
    let report = scan_paths(&[tmp.path().to_path_buf()], &strict, &ctx).unwrap();
    assert!(!report.passed());
}

#[test]
fn test_config_driven_scan_with_namespace_and_override() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("registry.toml"),
        "[[entries]]\nmarker_type = \"dod\"\nscope_id = \"infra:net\"\nphase = \"p2\"\ntitle = \"Network\"\n",
    )
    .unwrap();
    fs::write(
        tmp.path().join("scopetrace.toml"),
        "registry = \"registry.toml\"\n\n[markers]\nnamespace = \"cpt\"\n\n[languages.tf]\nline = [\"#\"]\n",
    )
    .unwrap();
    fs::write(
        tmp.path().join("main.tf"),
        "# @cpt-begin:dod:infra:net:p2\nresource \"x\" {}\n# @cpt-end:dod:infra:net:p2\n",
    )
    .unwrap();

    let config = ScanConfig::load(&tmp.path().join("scopetrace.toml")).unwrap();
    let registry = Registry::load(config.registry.as_deref().unwrap()).unwrap();
    let ctx = ScanContext::new(config.profile_table().unwrap(), config.marker_syntax(), registry).unwrap();

    let report = scan_paths(&[tmp.path().to_path_buf()], &ScanOptions::default(), &ctx).unwrap();

    assert_eq!(report.files.len(), 1);
    let file = &report.files[0];
    assert_eq!(file.language, "tf (override)");
    assert!(file.passed());
    assert_eq!(file.scopes[0].key.scope_id, "infra:net");
    assert!(report.coverage_gaps.is_empty());
}

#[test]
fn test_excluded_region_reduces_uncovered_lines() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("gen.rs"),
        "// @begin:algo:core:p1\nfn core() {}\n// @end:algo:core:p1\n// @no-begin generated\nfn a() {}\nfn b() {}\n// @no-end\nfn tail() {}\n",
    )
    .unwrap();

    let ctx = context(&[("algo", "core", "p1")]);
    let report = scan_paths(&[tmp.path().to_path_buf()], &ScanOptions::default(), &ctx).unwrap();

    let coverage = &report.coverage[0];
    assert_eq!(coverage.total_lines, 8);
    assert_eq!(coverage.covered_lines, 3);
    assert_eq!(coverage.excluded_lines, 4);
    assert_eq!(coverage.uncovered_lines, 1);
    assert_eq!(report.files[0].excluded[0].reason.as_deref(), Some("generated"));
}
