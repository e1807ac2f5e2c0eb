//! # keyfob-client
//!
//! Client-side controller for vehicle access in a role-play game: physical
//! lock enforcement, assisted entry through the closest free door, forced
//! exit, the key fob lock toggle and trunk-inventory sessions.
//!
//! The engine and the other host overlays are reached through the traits
//! of [`engine`] and [`services`]; the server through a
//! [`keyfob_rpc::ServerBridge`]. A host builds a [`VehicleLockProvider`],
//! registers it on a [`Scheduler`], runs the tick loops on a
//! `tokio::task::LocalSet` and feeds events and commands in.

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod engine;
pub mod logging;
pub mod provider;
pub mod scheduler;
pub mod services;

pub use engine::Engine;
pub use provider::VehicleLockProvider;
pub use scheduler::{ClientEvent, Scheduler};
pub use services::Services;
