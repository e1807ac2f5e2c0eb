//! Core type definitions shared by every keyfob crate.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Identity Types
// ---------------------------------------------------------------------------

/// Network-wide identifier of a replicated entity.
///
/// Stable across clients, unlike [`EntityHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NetworkId(pub u32);

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Client-local engine handle of an entity (ped, vehicle, object).
///
/// Only meaningful inside the client that obtained it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityHandle(pub i32);

impl fmt::Display for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Persistent identity of a player character.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CitizenId(pub String);

impl CitizenId {
    /// Create a citizen id from anything string-like.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for CitizenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Id of a persisted vehicle record. Temporary vehicles have none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VehicleRecordId(pub u64);

impl fmt::Display for VehicleRecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Engine model hash (Jenkins one-at-a-time over the lower-cased name).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelHash(pub u32);

impl ModelHash {
    /// Hash a model name the way the engine does.
    #[must_use]
    pub const fn from_name(name: &str) -> Self {
        let bytes = name.as_bytes();
        let mut hash: u32 = 0;
        let mut i = 0;
        while i < bytes.len() {
            hash = hash.wrapping_add(bytes[i].to_ascii_lowercase() as u32);
            hash = hash.wrapping_add(hash << 10);
            hash ^= hash >> 6;
            i += 1;
        }
        hash = hash.wrapping_add(hash << 3);
        hash ^= hash >> 11;
        hash = hash.wrapping_add(hash << 15);
        Self(hash)
    }
}

// ---------------------------------------------------------------------------
// Spatial
// ---------------------------------------------------------------------------

/// A 3D position or extent in world units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    /// X coordinate.
    pub x: f32,
    /// Y coordinate.
    pub y: f32,
    /// Z coordinate.
    pub z: f32,
}

impl Vec3 {
    /// Construct a vector from components.
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance to `other`.
    #[must_use]
    pub fn distance(&self, other: &Self) -> f32 {
        let (dx, dy, dz) = (self.x - other.x, self.y - other.y, self.z - other.z);
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1}, {:.1})", self.x, self.y, self.z)
    }
}

// ---------------------------------------------------------------------------
// Actor
// ---------------------------------------------------------------------------

/// The slice of local player metadata that access decisions depend on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorProfile {
    /// Who the actor is.
    pub citizen_id: CitizenId,
    /// Staff override: every vehicle is accessible.
    #[serde(default)]
    pub godmode: bool,
    /// Actor is dead or in last stand.
    #[serde(default)]
    pub is_dead: bool,
    /// Actor is handcuffed.
    #[serde(default)]
    pub is_handcuffed: bool,
}

impl ActorProfile {
    /// An alive, unrestrained actor without godmode.
    #[must_use]
    pub fn new(citizen_id: impl Into<String>) -> Self {
        Self {
            citizen_id: CitizenId::new(citizen_id),
            godmode: false,
            is_dead: false,
            is_handcuffed: false,
        }
    }

    /// Dead or handcuffed.
    #[must_use]
    pub fn is_incapacitated(&self) -> bool {
        self.is_dead || self.is_handcuffed
    }
}

/// Severity of a transient user notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    /// Informational.
    Info,
    /// Something went wrong but nothing was lost.
    Warning,
    /// The requested action was refused.
    Error,
}
