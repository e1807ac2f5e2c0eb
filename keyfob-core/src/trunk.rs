//! The trunk-inventory session of the local actor.
//!
//! At most one trunk is open per actor. The session remembers which vehicle
//! it belongs to and the zone both actor and vehicle must stay in; every
//! transition out of `Open` hands the closed session back so the caller can
//! tell the server and shut the inventory UI.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::types::{EntityHandle, NetworkId, Vec3};
use crate::zone::BoxZone;

/// An open trunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrunkSession {
    /// Local handle of the vehicle.
    pub vehicle: EntityHandle,
    /// Network id of the vehicle, for server events.
    pub network_id: NetworkId,
    /// Where actor and vehicle must stay.
    pub zone: BoxZone,
}

/// Observable state of the manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrunkState {
    /// No trunk open.
    Closed,
    /// A trunk session is active.
    Open,
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The player or the inventory asked for it.
    Explicit,
    /// Actor or vehicle left the zone, or the vehicle vanished.
    OutOfBounds,
    /// The vehicle got locked.
    Locked,
    /// Another trunk was opened.
    Superseded,
}

/// Owner of the single active trunk session.
#[derive(Debug, Clone, Default)]
pub struct TrunkSessionManager {
    active: Option<TrunkSession>,
}

impl TrunkSessionManager {
    /// No session open.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> TrunkState {
        if self.active.is_some() {
            TrunkState::Open
        } else {
            TrunkState::Closed
        }
    }

    /// The active session, if any.
    #[must_use]
    pub fn active(&self) -> Option<&TrunkSession> {
        self.active.as_ref()
    }

    /// Start a session. Returns the session it replaced, if any.
    pub fn open(&mut self, session: TrunkSession) -> Option<TrunkSession> {
        info!(vehicle = %session.vehicle, network_id = %session.network_id, "Trunk session opened");
        let previous = self.active.replace(session);
        if let Some(previous) = &previous {
            info!(
                vehicle = %previous.vehicle,
                reason = ?CloseReason::Superseded,
                "Trunk session closed"
            );
        }
        previous
    }

    /// End the session on request.
    pub fn close(&mut self) -> Option<TrunkSession> {
        self.end(CloseReason::Explicit)
    }

    /// Verify the session bounds.
    ///
    /// `vehicle_position` is `None` when the vehicle no longer exists.
    /// Returns the closed session when a bound was violated.
    pub fn check_bounds(&mut self, actor_position: Vec3, vehicle_position: Option<Vec3>) -> Option<TrunkSession> {
        let session = self.active.as_ref()?;
        let inside = vehicle_position.is_some_and(|vehicle| {
            session.zone.contains(&actor_position) && session.zone.contains(&vehicle)
        });
        if inside {
            return None;
        }
        self.end(CloseReason::OutOfBounds)
    }

    /// End the session if it belongs to `vehicle`, which just got locked.
    pub fn invalidate(&mut self, vehicle: EntityHandle) -> Option<TrunkSession> {
        if self.active.as_ref().is_some_and(|s| s.vehicle == vehicle) {
            self.end(CloseReason::Locked)
        } else {
            None
        }
    }

    fn end(&mut self, reason: CloseReason) -> Option<TrunkSession> {
        let session = self.active.take()?;
        info!(vehicle = %session.vehicle, ?reason, "Trunk session closed");
        Some(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(handle: i32) -> TrunkSession {
        TrunkSession {
            vehicle: EntityHandle(handle),
            network_id: NetworkId(handle as u32 + 1000),
            zone: BoxZone::around_vehicle(
                Vec3::default(),
                0.0,
                Vec3::new(-1.0, -2.5, -0.7),
                Vec3::new(1.0, 2.5, 0.9),
                3.0,
            ),
        }
    }

    #[test]
    fn open_close_cycle() {
        let mut trunks = TrunkSessionManager::new();
        assert_eq!(trunks.state(), TrunkState::Closed);
        assert!(trunks.close().is_none());

        assert!(trunks.open(session(1)).is_none());
        assert_eq!(trunks.state(), TrunkState::Open);

        let closed = trunks.close().expect("session was open");
        assert_eq!(closed.vehicle, EntityHandle(1));
        assert_eq!(trunks.state(), TrunkState::Closed);
    }

    #[test]
    fn opening_over_a_session_returns_the_old_one() {
        let mut trunks = TrunkSessionManager::new();
        trunks.open(session(1));
        let previous = trunks.open(session(2)).expect("first session superseded");
        assert_eq!(previous.vehicle, EntityHandle(1));
        assert_eq!(trunks.active().map(|s| s.vehicle), Some(EntityHandle(2)));
    }

    #[test]
    fn bounds_check_closes_when_anyone_leaves() {
        let mut trunks = TrunkSessionManager::new();
        let here = Vec3::new(0.0, -3.0, 0.0);

        trunks.open(session(1));
        assert!(trunks.check_bounds(here, Some(Vec3::default())).is_none());
        assert_eq!(trunks.state(), TrunkState::Open);

        // Actor walks away.
        assert!(trunks.check_bounds(Vec3::new(50.0, 0.0, 0.0), Some(Vec3::default())).is_some());
        assert_eq!(trunks.state(), TrunkState::Closed);

        // Vehicle drives away.
        trunks.open(session(1));
        assert!(trunks.check_bounds(here, Some(Vec3::new(0.0, 30.0, 0.0))).is_some());

        // Vehicle deleted.
        trunks.open(session(1));
        assert!(trunks.check_bounds(here, None).is_some());

        // Nothing to check.
        assert!(trunks.check_bounds(here, None).is_none());
    }

    #[test]
    fn invalidation_only_hits_the_same_vehicle() {
        let mut trunks = TrunkSessionManager::new();
        trunks.open(session(1));
        assert!(trunks.invalidate(EntityHandle(2)).is_none());
        assert_eq!(trunks.state(), TrunkState::Open);
        assert!(trunks.invalidate(EntityHandle(1)).is_some());
        assert_eq!(trunks.state(), TrunkState::Closed);
    }
}
