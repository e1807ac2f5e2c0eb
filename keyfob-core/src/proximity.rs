//! Closest-door search for an actor trying to enter a vehicle.
//!
//! The engine's own entry logic picks doors poorly on crowded vehicles, so
//! the client picks the seat itself: walk a fixed door table, keep the doors
//! whose seat is free, and take the nearest one.
//!
//! Rear "wheel" bones stand in for the extra seats of buses and vans; they
//! map to several seat indices and claim the first empty one.

use serde::{Deserialize, Serialize};

use crate::types::Vec3;

/// Seat index of the driver.
pub const DRIVER_SEAT: i32 = -1;

/// Default reach for the first accepted door.
pub const DEFAULT_DOOR_DISTANCE: f32 = 2.0;

/// Who sits in a seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeatOccupant {
    /// Nobody.
    Empty,
    /// A non-player ped; may be pulled out.
    Npc,
    /// Another player; never displaced.
    Player,
}

/// Seat indices reachable from one door bone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorSeats {
    /// Exactly one seat.
    Single(i32),
    /// Several seats, claimed in order.
    Any(&'static [i32]),
}

/// Door bones in evaluation order. Order matters: ties keep the earlier entry.
pub const DOOR_TABLE: &[(&str, DoorSeats)] = &[
    ("seat_dside_f", DoorSeats::Single(-1)),
    ("seat_pside_f", DoorSeats::Single(0)),
    ("seat_dside_r", DoorSeats::Single(1)),
    ("seat_pside_r", DoorSeats::Single(2)),
    ("door_dside_f", DoorSeats::Single(-1)),
    ("door_pside_f", DoorSeats::Single(0)),
    ("door_dside_r", DoorSeats::Single(1)),
    ("door_pside_r", DoorSeats::Single(2)),
    ("wheel_lr", DoorSeats::Any(&[3, 5])),
    ("wheel_rr", DoorSeats::Any(&[4, 6])),
];

/// What the search needs to know about a vehicle.
pub trait VehicleSeating {
    /// Occupant of `seat`.
    fn occupant(&self, seat: i32) -> SeatOccupant;

    /// World position of a bone, or `None` when the model lacks it.
    fn bone_position(&self, bone: &str) -> Option<Vec3>;
}

/// A door the actor could use right now.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProximityCandidate {
    /// Bone name of the door.
    pub door: String,
    /// Seat to enter through that door.
    pub seat_index: i32,
    /// Distance from the actor to the door.
    pub distance: f32,
    /// World position of the door.
    pub position: Vec3,
}

/// Seat a door would put the actor in, or `None` when it is taken.
///
/// `max_seats` is the passenger count reported by the engine (driver excluded).
/// Passenger indices run `0..max_seats` with the driver at [`DRIVER_SEAT`],
/// so an index is out of range only when it is greater than `max_seats - 1`.
#[must_use]
pub fn available_seat(vehicle: &impl VehicleSeating, seats: DoorSeats, max_seats: i32) -> Option<i32> {
    let (usable, index) = match seats {
        DoorSeats::Single(seat) => (vehicle.occupant(seat) != SeatOccupant::Player, seat),
        DoorSeats::Any(candidates) => candidates
            .iter()
            .copied()
            .find(|&seat| vehicle.occupant(seat) == SeatOccupant::Empty)
            .map_or((false, max_seats), |seat| (true, seat)),
    };

    // The table lists more seats than small vehicles have.
    if !usable || index > max_seats - 1 {
        return None;
    }
    Some(index)
}

/// Closest usable door within [`DEFAULT_DOOR_DISTANCE`].
#[must_use]
pub fn find_closest_door(
    vehicle: &impl VehicleSeating,
    actor_position: Vec3,
    max_seats: i32,
) -> Option<ProximityCandidate> {
    find_closest_door_within(vehicle, actor_position, max_seats, DEFAULT_DOOR_DISTANCE)
}

/// Closest usable door.
///
/// `max_distance` only gates the first accepted door; once one is held, any
/// strictly closer door replaces it.
#[must_use]
pub fn find_closest_door_within(
    vehicle: &impl VehicleSeating,
    actor_position: Vec3,
    max_seats: i32,
    max_distance: f32,
) -> Option<ProximityCandidate> {
    let mut closest: Option<ProximityCandidate> = None;

    for &(door, seats) in DOOR_TABLE {
        let Some(seat_index) = available_seat(vehicle, seats, max_seats) else {
            continue;
        };
        let Some(position) = vehicle.bone_position(door) else {
            continue;
        };
        let distance = actor_position.distance(&position);

        let replace = match &closest {
            None => distance <= max_distance,
            Some(best) => distance < best.distance,
        };
        if replace {
            closest = Some(ProximityCandidate {
                door: door.to_string(),
                seat_index,
                distance,
                position,
            });
        }
    }

    closest
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Default)]
    struct Car {
        seats: HashMap<i32, SeatOccupant>,
        bones: HashMap<&'static str, Vec3>,
    }

    impl VehicleSeating for Car {
        fn occupant(&self, seat: i32) -> SeatOccupant {
            self.seats.get(&seat).copied().unwrap_or(SeatOccupant::Empty)
        }

        fn bone_position(&self, bone: &str) -> Option<Vec3> {
            self.bones.get(bone).copied()
        }
    }

    fn four_door() -> Car {
        let mut car = Car::default();
        car.bones.insert("door_dside_f", Vec3::new(-1.0, 0.5, 0.0));
        car.bones.insert("door_pside_f", Vec3::new(1.0, 0.5, 0.0));
        car.bones.insert("door_dside_r", Vec3::new(-1.0, -0.8, 0.0));
        car.bones.insert("door_pside_r", Vec3::new(1.0, -0.8, 0.0));
        car
    }

    #[test]
    fn picks_nearest_free_door() {
        let car = four_door();
        let found = find_closest_door(&car, Vec3::new(2.0, -0.8, 0.0), 3).expect("door in reach");
        assert_eq!(found.door, "door_pside_r");
        assert_eq!(found.seat_index, 2);
        assert!((found.distance - 1.0).abs() < 1e-5);
    }

    #[test]
    fn skips_seats_held_by_players_but_not_npcs() {
        let mut car = four_door();
        car.seats.insert(2, SeatOccupant::Player);
        car.seats.insert(0, SeatOccupant::Npc);
        let found = find_closest_door(&car, Vec3::new(2.0, -0.8, 0.0), 3).expect("front door");
        assert_eq!(found.door, "door_pside_f");
        assert_eq!(found.seat_index, 0);
    }

    #[test]
    fn nothing_beyond_first_gate() {
        let car = four_door();
        assert!(find_closest_door(&car, Vec3::new(10.0, 0.0, 0.0), 3).is_none());
    }

    #[test]
    fn later_doors_ignore_the_gate() {
        // Front door just inside the gate is found first; the rear door is
        // closer still and replaces it.
        let mut car = Car::default();
        car.bones.insert("door_dside_f", Vec3::new(0.0, 1.9, 0.0));
        car.bones.insert("door_dside_r", Vec3::new(0.0, 1.0, 0.0));
        let found = find_closest_door(&car, Vec3::default(), 3).expect("rear door");
        assert_eq!(found.door, "door_dside_r");

        // A door outside the gate is not held, so the next door is gated
        // on its own.
        let mut far_first = Car::default();
        far_first.bones.insert("seat_dside_f", Vec3::new(0.0, 5.0, 0.0));
        far_first.bones.insert("door_dside_f", Vec3::new(0.0, 1.5, 0.0));
        let found = find_closest_door(&far_first, Vec3::default(), 3).expect("second door");
        assert_eq!(found.door, "door_dside_f");
    }

    #[test]
    fn ties_keep_table_order() {
        let mut car = Car::default();
        car.bones.insert("seat_dside_f", Vec3::new(1.0, 0.0, 0.0));
        car.bones.insert("door_dside_f", Vec3::new(-1.0, 0.0, 0.0));
        let found = find_closest_door(&car, Vec3::default(), 3).expect("door");
        assert_eq!(found.door, "seat_dside_f");
    }

    #[test]
    fn multi_seat_door_claims_first_empty_index() {
        let mut bus = Car::default();
        bus.bones.insert("wheel_lr", Vec3::new(-1.0, -3.0, 0.0));
        bus.seats.insert(3, SeatOccupant::Npc);
        let found = find_closest_door(&bus, Vec3::new(-1.5, -3.0, 0.0), 10).expect("bus seat");
        assert_eq!(found.seat_index, 5);

        bus.seats.insert(5, SeatOccupant::Player);
        assert!(find_closest_door(&bus, Vec3::new(-1.5, -3.0, 0.0), 10).is_none());
    }

    #[test]
    fn seats_beyond_capacity_are_excluded() {
        let car = four_door();
        // Two passenger seats: indices 0 and 1 exist, 2 does not.
        let found = find_closest_door(&car, Vec3::new(2.0, -0.8, 0.0), 2).expect("other door");
        assert_ne!(found.seat_index, 2);
        assert_eq!(available_seat(&car, DoorSeats::Single(2), 2), None);
        assert_eq!(available_seat(&car, DoorSeats::Single(1), 2), Some(1));
        assert_eq!(available_seat(&car, DoorSeats::Any(&[3, 5]), 4), Some(3));
        assert_eq!(available_seat(&car, DoorSeats::Any(&[4, 6]), 4), None);
    }

    #[test]
    fn last_passenger_seat_and_driver_seat_are_in_range() {
        let car = four_door();
        assert_eq!(available_seat(&car, DoorSeats::Single(2), 3), Some(2));
        assert_eq!(available_seat(&car, DoorSeats::Single(3), 3), None);
        // A single-seater reports no passengers but keeps its driver seat.
        assert_eq!(available_seat(&car, DoorSeats::Single(DRIVER_SEAT), 0), Some(DRIVER_SEAT));
    }

    #[test]
    fn missing_bones_are_skipped() {
        let car = Car::default();
        assert!(find_closest_door(&car, Vec3::default(), 3).is_none());
    }
}
