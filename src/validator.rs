//! @ai:module:intent Cross-check scopes and standalone markers against the registry
//! @ai:module:layer application
//! @ai:module:public_api cross_validate
//! @ai:module:depends_on annotation, registry
//! @ai:module:stateless true

use crate::annotation::{BlockMarker, CodeReference, ReferenceStatus, ScopeKey, ScopeMarker};
use crate::registry::Registry;
use std::path::Path;

/// @ai:intent Produce one reference per scope and per standalone marker
/// @ai:pre registry is fully loaded and no longer mutated
/// @ai:post references.len() == total scopes + standalone.len()
/// @ai:post scopes come first in depth-first order, then standalone markers
/// @ai:example (scope algo:foo:p1 at 1, registry {algo:foo:p1}) -> [VALID at 1]
/// @ai:example (scope algo:foo:p1 at 1, empty registry) -> [UNKNOWN_ID at 1]
/// @ai:effects pure
pub fn cross_validate(
    path: &Path,
    scopes: &[ScopeMarker],
    standalone: &[BlockMarker],
    registry: &Registry,
) -> Vec<CodeReference> {
    let mut references = Vec::new();

    for scope in scopes {
        scope.walk(&mut |s| {
            references.push(reference(path, &s.key, s.start_line, registry));
        });
    }

    references.extend(
        standalone
            .iter()
            .map(|marker| reference(path, &marker.key, marker.line, registry)),
    );

    references
}

fn reference(path: &Path, key: &ScopeKey, line: usize, registry: &Registry) -> CodeReference {
    let status = if registry.contains(&key.registry_key()) {
        ReferenceStatus::Valid
    } else {
        ReferenceStatus::UnknownId
    };

    CodeReference {
        key: key.clone(),
        status,
        path: path.to_path_buf(),
        line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::RegistryKey;

    fn key(scope: &str) -> ScopeKey {
        ScopeKey {
            marker_type: "algo".to_string(),
            scope_id: scope.to_string(),
            phase: "p1".to_string(),
            instance_id: Some("inst-a".to_string()),
        }
    }

    fn scope(name: &str, start: usize, end: usize, depth: usize, children: Vec<ScopeMarker>) -> ScopeMarker {
        ScopeMarker {
            key: key(name),
            start_line: start,
            end_line: end,
            depth,
            children,
        }
    }

    #[test]
    fn test_valid_reference_ignores_instance_id() {
        let registry = Registry::from_keys([RegistryKey::new("algo", "foo", "p1")]);
        let refs = cross_validate(
            Path::new("a.rs"),
            &[scope("foo", 1, 3, 0, vec![])],
            &[],
            &registry,
        );

        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].status, ReferenceStatus::Valid);
        assert_eq!(refs[0].line, 1);
        assert_eq!(refs[0].path, Path::new("a.rs"));
    }

    #[test]
    fn test_unknown_id_at_any_depth() {
        let registry = Registry::from_keys([RegistryKey::new("algo", "outer", "p1")]);
        let tree = scope(
            "outer",
            1,
            10,
            0,
            vec![scope("mid", 2, 9, 1, vec![scope("missing", 3, 4, 2, vec![])])],
        );
        let refs = cross_validate(Path::new("a.rs"), &[tree], &[], &registry);

        let statuses: Vec<_> = refs.iter().map(|r| (r.line, r.status)).collect();
        assert_eq!(
            statuses,
            vec![
                (1, ReferenceStatus::Valid),
                (2, ReferenceStatus::UnknownId),
                (3, ReferenceStatus::UnknownId)
            ]
        );
    }

    #[test]
    fn test_standalone_markers_follow_scopes() {
        let registry = Registry::default();
        let marker = BlockMarker {
            key: ScopeKey {
                instance_id: None,
                ..key("state")
            },
            line: 7,
        };
        let refs = cross_validate(
            Path::new("a.rs"),
            &[scope("foo", 1, 3, 0, vec![])],
            &[marker],
            &registry,
        );

        assert_eq!(refs.len(), 2);
        assert_eq!(refs[1].line, 7);
        assert_eq!(refs[1].status, ReferenceStatus::UnknownId);
    }
}
