//! The game engine as seen by the vehicle access logic.
//!
//! Only the natives this crate calls are listed. A host implements
//! [`Engine`] over its scripting runtime; tests implement it over plain data.

use keyfob_core::headwear::HeadwearSnapshot;
use keyfob_core::proximity::{SeatOccupant, VehicleSeating};
use keyfob_core::types::{EntityHandle, ModelHash, NetworkId, Vec3};

/// Door index of the trunk/boot.
pub const TRUNK_DOOR: i32 = 5;

/// Physical door lock applied by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorLockStatus {
    /// Anyone can open the doors.
    Unlocked,
    /// Doors stay shut; entry attempts fail.
    Locked,
}

/// Headlight override.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightState {
    /// Back to the vehicle's own logic.
    Default,
    /// Forced off.
    Off,
    /// Forced on.
    On,
}

/// An animation request.
#[derive(Debug, Clone, PartialEq)]
pub struct Animation {
    /// Animation dictionary.
    pub dictionary: &'static str,
    /// Clip name inside the dictionary.
    pub name: &'static str,
    /// Blend-in speed.
    pub blend_in: f32,
    /// Blend-out speed.
    pub blend_out: f32,
    /// Duration in milliseconds.
    pub duration_ms: u64,
    /// Loop until the duration elapses.
    pub repeat: bool,
    /// Play on the upper body only, leaving legs to the player.
    pub upper_body_only: bool,
    /// Player keeps control while it plays.
    pub player_control: bool,
}

/// Engine natives used by the vehicle access logic.
pub trait Engine {
    /// The local player's ped.
    fn player_ped(&self) -> EntityHandle;
    /// Vehicle the ped sits in.
    fn vehicle_ped_is_in(&self, ped: EntityHandle) -> Option<EntityHandle>;
    /// Vehicle the ped has been asked to enter.
    fn vehicle_ped_is_trying_to_enter(&self, ped: EntityHandle) -> Option<EntityHandle>;
    /// Vehicle the ped is in the middle of entering.
    fn vehicle_ped_is_entering(&self, ped: EntityHandle) -> Option<EntityHandle>;
    /// Ped sitting in `seat`.
    fn ped_in_seat(&self, vehicle: EntityHandle, seat: i32) -> Option<EntityHandle>;
    /// Whether a ped is controlled by a player.
    fn is_ped_a_player(&self, ped: EntityHandle) -> bool;
    /// Passenger seat count, driver excluded.
    fn max_passengers(&self, vehicle: EntityHandle) -> i32;

    /// Whether the handle still points at a live entity.
    fn entity_exists(&self, entity: EntityHandle) -> bool;
    /// Whether the entity is a vehicle.
    fn is_vehicle(&self, entity: EntityHandle) -> bool;
    /// Whether the entity is dead.
    fn is_dead(&self, entity: EntityHandle) -> bool;
    /// World position.
    fn coords(&self, entity: EntityHandle) -> Vec3;
    /// Heading in degrees.
    fn heading(&self, entity: EntityHandle) -> f32;
    /// Speed in m/s.
    fn speed(&self, entity: EntityHandle) -> f32;
    /// Model hash.
    fn model(&self, entity: EntityHandle) -> ModelHash;
    /// Model-space bounding box `(min, max)`.
    fn model_dimensions(&self, model: ModelHash) -> (Vec3, Vec3);
    /// World position of a named bone, `None` when the model lacks it.
    fn bone_position(&self, entity: EntityHandle, bone: &str) -> Option<Vec3>;

    /// Plate text as displayed.
    fn plate_text(&self, vehicle: EntityHandle) -> String;
    /// Vehicle class.
    fn vehicle_class(&self, vehicle: EntityHandle) -> i32;
    /// Closest vehicle to the player within `max_distance`.
    fn closest_vehicle(&self, max_distance: f32) -> Option<EntityHandle>;

    /// Network id of a networked entity.
    fn network_id(&self, entity: EntityHandle) -> NetworkId;
    /// Local handle of a networked entity, `None` when out of scope.
    fn entity_from_network_id(&self, network_id: NetworkId) -> Option<EntityHandle>;

    /// Apply a physical door lock.
    fn set_doors_locked(&self, vehicle: EntityHandle, status: DoorLockStatus);
    /// Start or stop the engine, instantly.
    fn set_engine_on(&self, vehicle: EntityHandle, on: bool);
    /// Override the headlights.
    fn set_lights(&self, vehicle: EntityHandle, state: LightState);
    /// Swing a door open.
    fn set_door_open(&self, vehicle: EntityHandle, door: i32);
    /// Shut a door.
    fn set_door_shut(&self, vehicle: EntityHandle, door: i32);

    /// Walk to and enter `seat`.
    fn task_enter_vehicle(&self, ped: EntityHandle, vehicle: EntityHandle, seat: i32);
    /// Get out.
    fn task_leave_vehicle(&self, ped: EntityHandle, vehicle: EntityHandle);
    /// Abort every task.
    fn clear_tasks_immediately(&self, ped: EntityHandle);
    /// Start an animation; returns immediately.
    fn play_animation(&self, ped: EntityHandle, animation: &Animation);

    /// The "exit vehicle" control is held this frame.
    fn is_exit_pressed(&self) -> bool;
    /// Ignore the "exit vehicle" control for this frame.
    fn disable_exit_control(&self);

    /// Hat currently worn.
    fn hat(&self, ped: EntityHandle) -> HeadwearSnapshot;
    /// Put a hat on.
    fn set_hat(&self, ped: EntityHandle, hat: HeadwearSnapshot);
    /// Let the engine put a helmet on a bare head again.
    fn allow_helmet(&self, ped: EntityHandle);
}

/// [`VehicleSeating`] over a live vehicle.
pub struct EngineSeating<'a> {
    engine: &'a dyn Engine,
    vehicle: EntityHandle,
}

impl<'a> EngineSeating<'a> {
    /// Seating view of `vehicle`.
    pub fn new(engine: &'a dyn Engine, vehicle: EntityHandle) -> Self {
        Self { engine, vehicle }
    }
}

impl VehicleSeating for EngineSeating<'_> {
    fn occupant(&self, seat: i32) -> SeatOccupant {
        match self.engine.ped_in_seat(self.vehicle, seat) {
            None => SeatOccupant::Empty,
            Some(ped) if self.engine.is_ped_a_player(ped) => SeatOccupant::Player,
            Some(_) => SeatOccupant::Npc,
        }
    }

    fn bone_position(&self, bone: &str) -> Option<Vec3> {
        self.engine.bone_position(self.vehicle, bone)
    }
}
