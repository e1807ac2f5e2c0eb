//! # keyfob Core Library
//!
//! Engine-agnostic decision logic for vehicle access in a role-play game
//! client. Nothing in this crate talks to the game engine or the server
//! directly: callers feed it replicated state, positions and seat occupancy,
//! and it answers with decisions.
//!
//! - [`state`]: replicated per-vehicle lock state (`open`, `forced`, `owner`, ...)
//! - [`proximity`]: closest eligible door/seat for an actor trying to enter
//! - [`policy`]: who may enter, open the trunk, or toggle the lock
//! - [`trunk`]: the single trunk-inventory session owned by the local actor
//! - [`zone`]: oriented box geometry used to bound trunk sessions
//! - [`headwear`]: once-per-second hat change detection
//! - [`inventory`]: vehicle model → trunk container kind
//!
//! ## Invariant
//!
//! A vehicle is accessible iff `open || forced || actor.godmode`; whenever
//! neither flag is set the doors must be physically locked.

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod headwear;
pub mod inventory;
pub mod policy;
pub mod proximity;
pub mod state;
pub mod trunk;
pub mod types;
pub mod zone;

pub use config::KeyfobConfig;
pub use error::KeyfobError;
pub use policy::AccessDenied;
pub use state::{VehicleAccessState, VehicleStateStore};
pub use types::*;
