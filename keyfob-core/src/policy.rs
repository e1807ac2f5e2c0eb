//! Access decisions: who may enter a vehicle, open its trunk, or toggle its lock.
//!
//! Everything here is a pure decision. Callers apply the consequences
//! (locking doors, notifying the player, emitting server events).

use std::future::Future;

use thiserror::Error;
use tracing::{debug, warn};

use crate::config::LockConfig;
use crate::state::VehicleAccessState;
use crate::types::{ActorProfile, NotificationLevel, VehicleRecordId};

/// Meters per second to kilometers per hour.
pub const MS_TO_KMH: f32 = 3.6;

/// Why an action was refused.
///
/// The display text is what the player sees; silent refusals are never shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AccessDenied {
    /// The local player is not loaded yet.
    #[error("Player not loaded.")]
    NoPlayer,
    /// The phone overlay owns the input.
    #[error("Phone is open.")]
    PhoneVisible,
    /// Dead or handcuffed.
    #[error("You cannot do that right now.")]
    Incapacitated,
    /// The actor is sitting in a vehicle.
    #[error("You cannot do that from a vehicle.")]
    InVehicle,
    /// No vehicle in range.
    #[error("No vehicle nearby.")]
    NoVehicleNearby,
    /// The vehicle moves faster than the lock threshold.
    #[error("You are going too fast to do that.")]
    TooFast,
    /// The actor holds no key for the vehicle.
    #[error("You don't have the keys.")]
    NoKey,
    /// The actor is outside the trunk zone.
    #[error("You must be next to the vehicle.")]
    NotNextToVehicle,
    /// Neither open nor forced, and no godmode.
    #[error("Vehicle locked.")]
    VehicleLocked,
    /// Another inventory session is running.
    #[error("Inventory already in use.")]
    InventoryBusy,
}

impl AccessDenied {
    /// Refusals the player is not told about.
    #[must_use]
    pub fn is_silent(self) -> bool {
        matches!(
            self,
            Self::NoPlayer | Self::PhoneVisible | Self::Incapacitated | Self::InVehicle
        )
    }

    /// Notification severity.
    #[must_use]
    pub fn level(self) -> NotificationLevel {
        match self {
            Self::InventoryBusy => NotificationLevel::Warning,
            _ => NotificationLevel::Error,
        }
    }
}

/// Authoritative key registry, usually a server round-trip.
pub trait KeyAuthority {
    /// Failure of the round-trip itself.
    type Error: std::fmt::Display;

    /// Whether the local actor holds a key for the persisted vehicle `vehicle`.
    fn check_key(&self, vehicle: VehicleRecordId) -> impl Future<Output = Result<bool, Self::Error>>;
}

/// Inputs of the lock toggle decision that come from the engine and UI.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LockToggleContext {
    /// Vehicle speed in m/s.
    pub speed_ms: f32,
    /// Phone overlay visible.
    pub phone_visible: bool,
}

/// Decision engine parameterised by the lock speed threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccessPolicy {
    max_speed_kmh: f32,
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self::new(&LockConfig::default())
    }
}

impl AccessPolicy {
    /// Build a policy from the lock settings.
    #[must_use]
    pub fn new(config: &LockConfig) -> Self {
        Self {
            max_speed_kmh: config.max_speed_kmh,
        }
    }

    /// Whether the actor may get in.
    #[must_use]
    pub fn can_enter(&self, actor: &ActorProfile, state: &VehicleAccessState) -> bool {
        state.is_accessible_by(actor)
    }

    /// Whether the actor may open the trunk.
    ///
    /// # Errors
    /// `AccessDenied::VehicleLocked` when the vehicle is not accessible.
    pub fn can_open_trunk(&self, actor: &ActorProfile, state: &VehicleAccessState) -> Result<(), AccessDenied> {
        if state.is_accessible_by(actor) {
            Ok(())
        } else {
            Err(AccessDenied::VehicleLocked)
        }
    }

    /// Actor-side preconditions of the lock toggle and the trunk command.
    ///
    /// # Errors
    /// `PhoneVisible` or `Incapacitated`.
    pub fn check_actor_can_toggle(&self, actor: &ActorProfile, phone_visible: bool) -> Result<(), AccessDenied> {
        if phone_visible {
            return Err(AccessDenied::PhoneVisible);
        }
        if actor.is_incapacitated() {
            return Err(AccessDenied::Incapacitated);
        }
        Ok(())
    }

    /// Vehicle-side precondition of the lock toggle.
    ///
    /// # Errors
    /// `TooFast` above the configured threshold.
    pub fn check_speed(&self, speed_ms: f32) -> Result<(), AccessDenied> {
        if speed_ms * MS_TO_KMH > self.max_speed_kmh {
            Err(AccessDenied::TooFast)
        } else {
            Ok(())
        }
    }

    /// All synchronous lock toggle preconditions. The key check is separate
    /// because it may need a round-trip.
    ///
    /// # Errors
    /// The first failing precondition.
    pub fn can_lock_toggle(&self, actor: &ActorProfile, context: &LockToggleContext) -> Result<(), AccessDenied> {
        self.check_actor_can_toggle(actor, context.phone_visible)?;
        self.check_speed(context.speed_ms)
    }

    /// Whether the actor holds a key for the vehicle.
    ///
    /// Temporary vehicles (no record id) only open for their recorded owner
    /// and never reach the authority. Owners of persisted vehicles hold an
    /// implicit key. Everyone else is asked of `keys`; a failed round-trip
    /// counts as no key.
    pub async fn has_key<K: KeyAuthority>(
        &self,
        actor: &ActorProfile,
        state: &VehicleAccessState,
        keys: &K,
    ) -> bool {
        let Some(record) = state.id else {
            return state.is_owned_by(actor);
        };

        if state.is_owned_by(actor) {
            return true;
        }

        match keys.check_key(record).await {
            Ok(has_key) => {
                debug!(vehicle = %record, has_key, "Key check answered");
                has_key
            }
            Err(e) => {
                warn!(vehicle = %record, "Key check failed, treating as no key: {e}");
                false
            }
        }
    }
}
