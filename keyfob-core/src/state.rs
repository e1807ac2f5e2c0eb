//! Replicated per-vehicle access state.
//!
//! The network layer replicates each vehicle's lock state as a set of
//! string-keyed values (`"open:42" = true`). This module parses those keys,
//! folds updates into a typed [`VehicleAccessState`] per vehicle, and hands
//! out read-only copies. Mutation of the authoritative state happens on the
//! server; the store only mirrors what was replicated.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{KeyfobError, Result};
use crate::types::{ActorProfile, CitizenId, EntityHandle, NetworkId, VehicleRecordId};

// ---------------------------------------------------------------------------
// Access state
// ---------------------------------------------------------------------------

/// Lock-relevant state of one vehicle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleAccessState {
    /// Unlocked by the owner or a key holder.
    #[serde(default)]
    pub open: bool,
    /// Unlocked by a break-in. Independent of `open`.
    #[serde(default)]
    pub forced: bool,
    /// Owning character, if any.
    #[serde(default)]
    pub owner: Option<CitizenId>,
    /// Persistent record id. `None` marks a temporary vehicle.
    #[serde(default)]
    pub id: Option<VehicleRecordId>,
    /// Cached plate text.
    #[serde(default)]
    pub plate: Option<String>,
}

impl VehicleAccessState {
    /// Neither flag set: the doors must be physically locked.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        !self.open && !self.forced
    }

    /// Whether `actor` may enter or open the trunk.
    #[must_use]
    pub fn is_accessible_by(&self, actor: &ActorProfile) -> bool {
        self.open || self.forced || actor.godmode
    }

    /// No persistent record backs this vehicle.
    #[must_use]
    pub fn is_temporary(&self) -> bool {
        self.id.is_none()
    }

    /// Whether `actor` is the recorded owner.
    #[must_use]
    pub fn is_owned_by(&self, actor: &ActorProfile) -> bool {
        self.owner.as_ref() == Some(&actor.citizen_id)
    }
}

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

/// The replicated fields a vehicle carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateField {
    /// `open`
    Open,
    /// `forced`
    Forced,
    /// `owner`
    Owner,
    /// `id`
    Id,
    /// `plate`
    Plate,
}

impl StateField {
    /// Wire name of the field.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Forced => "forced",
            Self::Owner => "owner",
            Self::Id => "id",
            Self::Plate => "plate",
        }
    }

    /// Fields whose change can lock or unlock the vehicle.
    #[must_use]
    pub fn affects_lock(self) -> bool {
        matches!(self, Self::Open | Self::Forced)
    }
}

impl FromStr for StateField {
    type Err = KeyfobError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "open" => Ok(Self::Open),
            "forced" => Ok(Self::Forced),
            "owner" => Ok(Self::Owner),
            "id" => Ok(Self::Id),
            "plate" => Ok(Self::Plate),
            _ => Err(KeyfobError::InvalidStateKey(s.to_string())),
        }
    }
}

/// A parsed `"<field>:<networkId>"` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateBagKey {
    /// Which field.
    pub field: StateField,
    /// Which vehicle.
    pub network_id: NetworkId,
}

impl StateBagKey {
    /// Build a key.
    #[must_use]
    pub fn new(field: StateField, network_id: NetworkId) -> Self {
        Self { field, network_id }
    }
}

impl FromStr for StateBagKey {
    type Err = KeyfobError;

    /// Network id `0` is never assigned to a live entity and is rejected.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || KeyfobError::InvalidStateKey(s.to_string());
        let (field, id) = s.split_once(':').ok_or_else(invalid)?;
        let field = field.parse::<StateField>().map_err(|_| invalid())?;
        let id = id.parse::<u32>().map_err(|_| invalid())?;
        if id == 0 {
            return Err(invalid());
        }
        Ok(Self::new(field, NetworkId(id)))
    }
}

impl fmt::Display for StateBagKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.field.as_str(), self.network_id)
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Mirror of the replicated access state of every known vehicle.
///
/// Network ids are recycled once a vehicle is deleted. Each entry remembers
/// the local entity it was first seen on, and [`VehicleStateStore::bind`]
/// drops the entry when the id resolves to a different entity.
#[derive(Debug, Clone, Default)]
pub struct VehicleStateStore {
    vehicles: HashMap<NetworkId, VehicleAccessState>,
    bound: HashMap<NetworkId, EntityHandle>,
}

impl VehicleStateStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state of a vehicle. Unknown vehicles read as locked,
    /// ownerless and temporary.
    #[must_use]
    pub fn get(&self, network_id: NetworkId) -> VehicleAccessState {
        self.vehicles.get(&network_id).cloned().unwrap_or_default()
    }

    /// Fold one replicated update into the store.
    ///
    /// # Errors
    /// Returns `KeyfobError::InvalidStateKey` for a malformed key and
    /// `KeyfobError::InvalidStateValue` when the value has the wrong type.
    /// The store is left untouched in both cases.
    pub fn apply(&mut self, key: &str, value: &Value) -> Result<StateBagKey> {
        let key: StateBagKey = key.parse()?;
        self.apply_field(key, value)?;
        Ok(key)
    }

    /// Fold an already-parsed update into the store.
    ///
    /// # Errors
    /// Returns `KeyfobError::InvalidStateValue` when the value has the wrong type.
    pub fn apply_field(&mut self, key: StateBagKey, value: &Value) -> Result<()> {
        let invalid = || KeyfobError::InvalidStateValue {
            field: key.field.as_str(),
            value: value.clone(),
        };

        // Validate before touching the map so a bad value cannot create an entry.
        let flag = || match value {
            Value::Bool(flag) => Ok(*flag),
            Value::Null => Ok(false),
            _ => Err(invalid()),
        };
        let update = match key.field {
            StateField::Open => Update::Open(flag()?),
            StateField::Forced => Update::Forced(flag()?),
            StateField::Owner => match value {
                Value::String(owner) => Update::Owner(Some(CitizenId::new(owner.clone()))),
                Value::Null => Update::Owner(None),
                _ => return Err(invalid()),
            },
            StateField::Id => match value {
                Value::Number(id) => {
                    Update::Id(Some(VehicleRecordId(id.as_u64().ok_or_else(invalid)?)))
                }
                Value::Null => Update::Id(None),
                _ => return Err(invalid()),
            },
            StateField::Plate => match value {
                Value::String(plate) => Update::Plate(Some(plate.clone())),
                Value::Null => Update::Plate(None),
                _ => return Err(invalid()),
            },
        };

        let state = self.vehicles.entry(key.network_id).or_default();
        match update {
            Update::Open(open) => state.open = open,
            Update::Forced(forced) => state.forced = forced,
            Update::Owner(owner) => state.owner = owner,
            Update::Id(id) => state.id = id,
            Update::Plate(plate) => state.plate = plate,
        }

        debug!(key = %key, "Replicated vehicle state updated");
        Ok(())
    }

    /// Record that `network_id` currently resolves to `entity`.
    ///
    /// Returns `true` when the id was bound to another entity before; the
    /// state replicated for that entity is dropped. State replicated before
    /// the vehicle streamed in is kept and bound.
    pub fn bind(&mut self, network_id: NetworkId, entity: EntityHandle) -> bool {
        let previous = self.bound.insert(network_id, entity);
        let recycled = previous.is_some_and(|previous| previous != entity);
        if recycled {
            self.vehicles.remove(&network_id);
            debug!(network_id = %network_id, entity = %entity, "Network id recycled, dropped stale state");
        }
        recycled
    }

    /// Forget a vehicle that left scope.
    pub fn remove(&mut self, network_id: NetworkId) -> Option<VehicleAccessState> {
        self.bound.remove(&network_id);
        self.vehicles.remove(&network_id)
    }

    /// Number of vehicles with replicated state.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    /// Whether no vehicle has replicated state.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }
}

enum Update {
    Open(bool),
    Forced(bool),
    Owner(Option<CitizenId>),
    Id(Option<VehicleRecordId>),
    Plate(Option<String>),
}
