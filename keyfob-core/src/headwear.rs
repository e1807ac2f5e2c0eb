//! Hat change detection.
//!
//! The engine drops a ped's hat when it enters or leaves some vehicles. The
//! client samples the worn hat once per second, replicates changes made
//! while seated, and restores the last sample on every enter/leave.

use serde::{Deserialize, Serialize};

/// Prop index meaning "no hat".
pub const NO_HAT: i32 = -1;

/// Worn hat and its texture variation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadwearSnapshot {
    /// Hat prop index, [`NO_HAT`] when bare-headed.
    pub hat: i32,
    /// Texture variation of the hat.
    pub texture: i32,
}

impl HeadwearSnapshot {
    /// Bare-headed. The engine may then put a helmet on, which callers
    /// re-allow explicitly.
    #[must_use]
    pub fn is_bare(&self) -> bool {
        self.hat == NO_HAT
    }
}

/// Last sampled headwear.
#[derive(Debug, Clone, Default)]
pub struct HeadwearTracker {
    current: Option<HeadwearSnapshot>,
}

impl HeadwearTracker {
    /// Nothing sampled yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Last sample, if any.
    #[must_use]
    pub fn current(&self) -> Option<HeadwearSnapshot> {
        self.current
    }

    /// Record a sample. Returns it when it should be replicated: the actor
    /// is in a vehicle and it differs from the previous sample.
    pub fn sample(&mut self, snapshot: HeadwearSnapshot, in_vehicle: bool) -> Option<HeadwearSnapshot> {
        let previous = self.current.replace(snapshot);
        match previous {
            Some(previous) if in_vehicle && previous != snapshot => Some(snapshot),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CAP: HeadwearSnapshot = HeadwearSnapshot { hat: 12, texture: 0 };
    const CAP_RED: HeadwearSnapshot = HeadwearSnapshot { hat: 12, texture: 3 };

    #[test]
    fn first_sample_is_never_replicated() {
        let mut tracker = HeadwearTracker::new();
        assert_eq!(tracker.sample(CAP, true), None);
        assert_eq!(tracker.current(), Some(CAP));
    }

    #[test]
    fn changes_replicate_only_in_vehicles() {
        let mut tracker = HeadwearTracker::new();
        tracker.sample(CAP, false);
        assert_eq!(tracker.sample(CAP_RED, false), None);
        assert_eq!(tracker.sample(CAP, true), Some(CAP));
        assert_eq!(tracker.sample(CAP, true), None);
    }

    #[test]
    fn bare_head() {
        assert!(HeadwearSnapshot { hat: NO_HAT, texture: 0 }.is_bare());
        assert!(!CAP.is_bare());
    }
}
