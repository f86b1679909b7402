//! Data structures shared across the tag subsystems.
//!
//! The directory types are plain data: a [`DirectorySnapshot`] is built once
//! by a successful refresh and never touched again, so readers can hold on to
//! it without locking.  The entity and handle types describe the host
//! engine's world as seen through the [`crate::host::HostEngine`] trait.

use std::collections::HashMap;

/// One entry of the remote trust directory.
///
/// Parsed from a single `id;name[;...;role]` line.  When the source line
/// carries no role field the role falls back to [`TrustRecord::DEFAULT_ROLE`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustRecord {
    pub display_name: String,
    pub role: String,
}

impl TrustRecord {
    pub const DEFAULT_ROLE: &'static str = "TRUSTED";
}

/// An immutable view of the trust directory.
///
/// Published atomically by the [`crate::directory::DirectoryCache`]; `version`
/// strictly increases across successful refreshes.  Version 0 is the empty
/// snapshot used before the first refresh ever succeeds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectorySnapshot {
    pub records: HashMap<String, TrustRecord>,
    pub version: u64,
}

impl DirectorySnapshot {
    pub fn get(&self, player_id: &str) -> Option<&TrustRecord> {
        self.records.get(player_id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Stable identity of a live avatar, issued by the host engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityKey(pub u64);

/// Handle to an overlay root resource owned by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OverlayHandle(pub u64);

/// Handle to one text slot under an overlay root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotHandle(pub u64);

/// World-space position, host engine units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn distance(self, other: Vec3) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// Identity of the player driving an avatar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerInfo {
    pub id: String,
    pub display_name: String,
}

/// Per-tick view of one live avatar, as reported by the host engine.
///
/// `frame_rate` is an explicit optional accessor: hosts that do not expose a
/// frame-rate sample report `None` and the renderer simply omits that
/// segment.  `offline` marks disconnected placeholder rigs that must never be
/// tracked.
#[derive(Debug, Clone)]
pub struct EntitySnapshot {
    pub key: EntityKey,
    pub offline: bool,
    pub owner: Option<OwnerInfo>,
    pub cosmetics: String,
    pub frame_rate: Option<u32>,
    pub session_props: String,
    pub head_position: Vec3,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_default_is_empty_version_zero() {
        let snap = DirectorySnapshot::default();
        assert!(snap.is_empty());
        assert_eq!(snap.version, 0);
        assert!(snap.get("anyone").is_none());
    }

    #[test]
    fn vec3_distance() {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(3.0, 4.0, 0.0);
        assert!((a.distance(b) - 5.0).abs() < f32::EPSILON);
    }
}
