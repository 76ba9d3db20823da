//! @ai:module:intent Define data structures for traceability markers, scopes and reports
//! @ai:module:layer domain
//! @ai:module:public_api ScopeKey, RegistryKey, MarkerEvent, ScopeMarker, BlockMarker, ExcludedRegion, CodeReference, ReferenceStatus, ParseError, StructuralError, StructuralErrorKind, CodeFile, FileStatus
//! @ai:module:stateless true

use crate::language::MarkerKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// @ai:intent Identity of a specification entry: `(markerType, scopeId, phase)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegistryKey {
    pub marker_type: String,
    pub scope_id: String,
    pub phase: String,
}

impl RegistryKey {
    pub fn new(marker_type: &str, scope_id: &str, phase: &str) -> Self {
        Self {
            marker_type: marker_type.to_string(),
            scope_id: scope_id.to_string(),
            phase: phase.to_string(),
        }
    }
}

impl fmt::Display for RegistryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.marker_type, self.scope_id, self.phase)
    }
}

/// @ai:intent Full identity of a scope: registry key plus optional instance id
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScopeKey {
    pub marker_type: String,
    pub scope_id: String,
    pub phase: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<String>,
}

impl ScopeKey {
    /// @ai:intent Drop the instance id to get the key looked up in the registry
    /// @ai:effects pure
    pub fn registry_key(&self) -> RegistryKey {
        RegistryKey::new(&self.marker_type, &self.scope_id, &self.phase)
    }
}

impl fmt::Display for ScopeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.marker_type, self.scope_id, self.phase)?;
        if let Some(instance) = &self.instance_id {
            write!(f, ":{instance}")?;
        }
        Ok(())
    }
}

/// @ai:intent One recognized marker on one line, in file order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerEvent {
    pub kind: MarkerKind,
    /// Absent for exclusion markers, which carry no key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<ScopeKey>,
    pub line: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// @ai:intent A matched begin/end pair and the scopes nested inside it
///
/// Invariants: `start_line < end_line`, children lie within the range and
/// siblings never overlap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeMarker {
    pub key: ScopeKey,
    pub start_line: usize,
    pub end_line: usize,
    pub depth: usize,
    pub children: Vec<ScopeMarker>,
}

impl ScopeMarker {
    /// @ai:intent Visit this scope and its descendants, parents before children
    /// @ai:effects pure
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a ScopeMarker)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }

    /// @ai:intent Number of scopes in this subtree, self included
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(ScopeMarker::count).sum::<usize>()
    }
}

/// @ai:intent A standalone marker asserting something about a single line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockMarker {
    pub key: ScopeKey,
    pub line: usize,
}

/// @ai:intent A region deliberately left without traceability coverage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcludedRegion {
    pub start_line: usize,
    pub end_line: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ExcludedRegion {
    pub fn contains(&self, line: usize) -> bool {
        (self.start_line..=self.end_line).contains(&line)
    }
}

/// @ai:intent Outcome attached to a marker after validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReferenceStatus {
    Valid,
    UnknownId,
    Duplicate,
    Unclosed,
    OrphanEnd,
    Crossing,
}

impl ReferenceStatus {
    pub fn is_error(&self) -> bool {
        !matches!(self, ReferenceStatus::Valid)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceStatus::Valid => "VALID",
            ReferenceStatus::UnknownId => "UNKNOWN_ID",
            ReferenceStatus::Duplicate => "DUPLICATE",
            ReferenceStatus::Unclosed => "UNCLOSED",
            ReferenceStatus::OrphanEnd => "ORPHAN_END",
            ReferenceStatus::Crossing => "CROSSING",
        }
    }
}

/// @ai:intent Registry lookup result for one scope or standalone marker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeReference {
    pub key: ScopeKey,
    pub status: ReferenceStatus,
    pub path: PathBuf,
    pub line: usize,
}

/// @ai:intent Malformed marker syntax on one line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseError {
    pub line: usize,
    pub message: String,
}

impl ParseError {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// @ai:intent Kinds of begin/end pairing failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StructuralErrorKind {
    Unclosed,
    OrphanEnd,
    Duplicate,
    Crossing,
}

impl StructuralErrorKind {
    pub fn status(&self) -> ReferenceStatus {
        match self {
            StructuralErrorKind::Unclosed => ReferenceStatus::Unclosed,
            StructuralErrorKind::OrphanEnd => ReferenceStatus::OrphanEnd,
            StructuralErrorKind::Duplicate => ReferenceStatus::Duplicate,
            StructuralErrorKind::Crossing => ReferenceStatus::Crossing,
        }
    }
}

/// @ai:intent A pairing failure localized to the line that exposes it
///
/// `UNCLOSED` points at the begin line; the other kinds point at the
/// offending marker itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuralError {
    pub kind: StructuralErrorKind,
    pub key: ScopeKey,
    pub line: usize,
    pub message: String,
}

/// @ai:intent Overall verdict for one file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FileStatus {
    Pass,
    Fail,
}

/// @ai:intent Complete scan result for one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeFile {
    pub path: PathBuf,
    pub language: String,
    pub status: FileStatus,
    pub line_count: usize,
    pub scopes: Vec<ScopeMarker>,
    pub standalone: Vec<BlockMarker>,
    pub excluded: Vec<ExcludedRegion>,
    pub references: Vec<CodeReference>,
    pub structural_errors: Vec<StructuralError>,
    pub parse_errors: Vec<ParseError>,
}

impl CodeFile {
    pub fn passed(&self) -> bool {
        self.status == FileStatus::Pass
    }

    /// @ai:intent Total scopes in the file, nested ones included
    pub fn scope_count(&self) -> usize {
        self.scopes.iter().map(ScopeMarker::count).sum()
    }

    /// @ai:intent Number of findings that make the file fail
    pub fn error_count(&self) -> usize {
        self.parse_errors.len()
            + self.structural_errors.len()
            + self
                .references
                .iter()
                .filter(|r| r.status.is_error())
                .count()
    }

    /// @ai:intent Check whether a line sits inside an excluded region
    pub fn is_excluded(&self, line: usize) -> bool {
        self.excluded.iter().any(|region| region.contains(line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(scope: &str, instance: Option<&str>) -> ScopeKey {
        ScopeKey {
            marker_type: "algo".to_string(),
            scope_id: scope.to_string(),
            phase: "p1".to_string(),
            instance_id: instance.map(str::to_string),
        }
    }

    #[test]
    fn test_scope_key_display() {
        assert_eq!(key("a:b", Some("inst-1")).to_string(), "algo:a:b:p1:inst-1");
        assert_eq!(key("a", None).to_string(), "algo:a:p1");
    }

    #[test]
    fn test_registry_key_drops_instance() {
        assert_eq!(
            key("foo", Some("x")).registry_key(),
            RegistryKey::new("algo", "foo", "p1")
        );
    }

    #[test]
    fn test_walk_is_parent_first() {
        let tree = ScopeMarker {
            key: key("outer", None),
            start_line: 1,
            end_line: 10,
            depth: 0,
            children: vec![ScopeMarker {
                key: key("inner", None),
                start_line: 2,
                end_line: 3,
                depth: 1,
                children: vec![],
            }],
        };

        let mut seen = Vec::new();
        tree.walk(&mut |s| seen.push(s.start_line));
        assert_eq!(seen, vec![1, 2]);
        assert_eq!(tree.count(), 2);
    }

    #[test]
    fn test_status_serializes_screaming_case() {
        let json = serde_json::to_string(&ReferenceStatus::UnknownId).unwrap();
        assert_eq!(json, "\"UNKNOWN_ID\"");
        assert_eq!(ReferenceStatus::OrphanEnd.as_str(), "ORPHAN_END");
    }
}
