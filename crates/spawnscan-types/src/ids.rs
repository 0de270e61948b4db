//! Spawn point identifiers and the sighting deduplication key.

use serde::{Deserialize, Serialize};

/// Stable identifier of a location capable of producing sightings.
///
/// Opaque to this service; the location client reports it as a string.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpawnPointId(pub String);

impl SpawnPointId {
    /// Wrap a raw spawn point identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for SpawnPointId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of a sighting: the pair (spawn point, entity type id).
///
/// Two sightings with the same key are the same sighting regardless of
/// which cell scan reported them.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SightingKey {
    /// Spawn point the entity appeared at.
    pub spawn_point: SpawnPointId,
    /// Entity type identifier.
    pub entity_id: u32,
}

impl SightingKey {
    /// Build a key from its two halves.
    pub const fn new(spawn_point: SpawnPointId, entity_id: u32) -> Self {
        Self {
            spawn_point,
            entity_id,
        }
    }
}

impl core::fmt::Display for SightingKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}:{}", self.spawn_point, self.entity_id)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn key_display_joins_halves() {
        let key = SightingKey::new(SpawnPointId::new("47c3a1"), 16);
        assert_eq!(key.to_string(), "47c3a1:16");
    }

    #[test]
    fn keys_differ_by_entity_type() {
        let mut seen = HashSet::new();
        assert!(seen.insert(SightingKey::new(SpawnPointId::new("a"), 1)));
        assert!(seen.insert(SightingKey::new(SpawnPointId::new("a"), 2)));
        assert!(!seen.insert(SightingKey::new(SpawnPointId::new("a"), 1)));
    }

    #[test]
    fn spawn_point_serializes_as_plain_string() {
        let json = serde_json::to_string(&SpawnPointId::new("abc")).unwrap_or_default();
        assert_eq!(json, "\"abc\"");
    }
}
