//! Host services the provider depends on, passed in explicitly.

use std::sync::Arc;

use keyfob_core::types::{ActorProfile, NotificationLevel};

use crate::engine::Engine;

/// Transient on-screen notifications.
pub trait Notifier {
    /// Show `message`.
    fn notify(&self, message: &str, level: NotificationLevel);
}

/// Positional sounds.
pub trait SoundPlayer {
    /// Play `sound` around the player for everyone within `radius`.
    fn play_around(&self, sound: &str, radius: f32, volume: f32);
}

/// Overlays owned by other resources.
pub trait CompanionUi {
    /// The phone is open and owns the input.
    fn phone_visible(&self) -> bool;
    /// An inventory session is running.
    fn inventory_busy(&self) -> bool;
    /// Close whatever inventory is open.
    fn close_inventory(&self);
}

/// Local player data.
pub trait PlayerSource {
    /// Current player, `None` until the character is loaded.
    fn player(&self) -> Option<ActorProfile>;
    /// The player's seatbelt is fastened.
    fn seatbelt_on(&self) -> bool;
}

/// Everything the provider talks to besides the server.
#[derive(Clone)]
pub struct Services {
    /// Engine natives.
    pub engine: Arc<dyn Engine>,
    /// Notifications.
    pub notifier: Arc<dyn Notifier>,
    /// Sounds.
    pub sounds: Arc<dyn SoundPlayer>,
    /// Phone and inventory overlays.
    pub ui: Arc<dyn CompanionUi>,
    /// Local player.
    pub players: Arc<dyn PlayerSource>,
}
