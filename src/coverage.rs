//! @ai:module:intent Find registry entries that no scanned file references
//! @ai:module:layer application
//! @ai:module:public_api coverage_gaps
//! @ai:module:depends_on annotation, registry
//! @ai:module:stateless true

use crate::annotation::{CodeFile, ReferenceStatus, RegistryKey};
use crate::registry::Registry;
use std::collections::BTreeSet;

/// @ai:intent List registry keys not exercised by any scope or standalone marker
/// @ai:post result is sorted and contains only registry keys
/// @ai:example (registry {a, b}, files referencing a) -> [b]
/// @ai:effects pure
pub fn coverage_gaps(registry: &Registry, files: &[CodeFile]) -> Vec<RegistryKey> {
    let referenced: BTreeSet<RegistryKey> = files
        .iter()
        .flat_map(|file| &file.references)
        .filter(|r| r.status == ReferenceStatus::Valid)
        .map(|r| r.key.registry_key())
        .collect();

    registry
        .keys()
        .filter(|key| !referenced.contains(*key))
        .cloned()
        .collect()
}
