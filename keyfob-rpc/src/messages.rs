//! Messages sent to the server.

use serde::{Deserialize, Serialize};

use keyfob_core::headwear::HeadwearSnapshot;
use keyfob_core::inventory::VehicleDescriptor;
use keyfob_core::types::{NetworkId, VehicleRecordId};

/// Fire-and-forget notifications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "args")]
pub enum ServerEvent {
    /// Lock (`false`) or unlock (`true`) a vehicle.
    #[serde(rename = "vehicle:set-open")]
    SetOpen {
        /// Target vehicle.
        network_id: NetworkId,
        /// New value of the `open` flag.
        open: bool,
    },

    /// Mark a vehicle's trunk as open or shut for every client.
    #[serde(rename = "vehicle:set-trunk-state")]
    SetTrunkState {
        /// Target vehicle.
        network_id: NetworkId,
        /// Trunk open.
        open: bool,
    },

    /// The hat the actor wears inside the vehicle changed.
    #[serde(rename = "player:update-hat-vehicle")]
    UpdateHatVehicle(HeadwearSnapshot),

    /// Open a vehicle container in the inventory.
    #[serde(rename = "inventory:open")]
    OpenInventory {
        /// Container kind (`trunk`, `tanker`, ...).
        kind: String,
        /// Plate, which keys the container.
        plate: String,
        /// Vehicle details for sizing the container.
        vehicle: VehicleDescriptor,
    },
}

impl ServerEvent {
    /// Wire name of the event.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::SetOpen { .. } => "vehicle:set-open",
            Self::SetTrunkState { .. } => "vehicle:set-trunk-state",
            Self::UpdateHatVehicle(_) => "player:update-hat-vehicle",
            Self::OpenInventory { .. } => "inventory:open",
        }
    }
}

/// Questions with an answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "call", content = "args")]
pub enum RpcRequest {
    /// Does the local player hold a key for this persisted vehicle? Answers a bool.
    #[serde(rename = "vehicle:has-key")]
    HasKey {
        /// Persisted vehicle record.
        vehicle: VehicleRecordId,
    },
}

impl RpcRequest {
    /// Wire name of the call.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::HasKey { .. } => "vehicle:has-key",
        }
    }
}
