//! Trunk container kinds and the descriptor sent with inventory requests.

use serde::{Deserialize, Serialize};

use crate::types::{ModelHash, NetworkId};

/// Container kind of an ordinary trunk.
pub const DEFAULT_TRUNK_KIND: &str = "trunk";

/// Models whose cargo space is not an ordinary trunk.
const TRUNK_KINDS: &[(ModelHash, &str)] = &[
    (ModelHash::from_name("tanker"), "tanker"),
    (ModelHash::from_name("tanker2"), "tanker"),
    (ModelHash::from_name("trailerlogs"), "trailerlogs"),
    (ModelHash::from_name("brickade"), "brickade"),
    (ModelHash::from_name("brickade1"), "brickade"),
    (ModelHash::from_name("trash"), "trash"),
];

/// Inventory container kind for a vehicle model.
#[must_use]
pub fn trunk_kind(model: ModelHash) -> &'static str {
    TRUNK_KINDS
        .iter()
        .find(|(hash, _)| *hash == model)
        .map_or(DEFAULT_TRUNK_KIND, |&(_, kind)| kind)
}

/// Vehicle details the inventory server needs to size and label a trunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleDescriptor {
    /// Model hash.
    pub model: ModelHash,
    /// Engine vehicle class (compacts, sedans, ...).
    pub class: i32,
    /// Network id of the vehicle.
    pub entity: NetworkId,
}
