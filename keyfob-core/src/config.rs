//! Configuration for the vehicle access system.
//!
//! Maps directly to `keyfob.toml`. Every field has a default, so an empty
//! file (or no file at all) yields the stock behavior.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level configuration, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeyfobConfig {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Door and vehicle search distances.
    #[serde(default)]
    pub proximity: ProximityConfig,
    /// Lock toggle action.
    #[serde(default)]
    pub lock: LockConfig,
    /// Trunk sessions.
    #[serde(default)]
    pub trunk: TrunkConfig,
    /// Entering and leaving vehicles.
    #[serde(default)]
    pub entry: EntryConfig,
    /// Server round-trips.
    #[serde(default)]
    pub rpc: RpcConfig,
    /// Default key bindings of the user commands.
    #[serde(default)]
    pub keybinds: KeybindConfig,
}

impl KeyfobConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `KeyfobError::Config` if the TOML is invalid.
    pub fn from_toml(toml_str: &str) -> crate::error::Result<Self> {
        toml::from_str(toml_str).map_err(|e| crate::KeyfobError::Config(e.to_string()))
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// General system settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Whether the system reacts to ticks and commands at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Log filter: trace, debug, info, warn, error, or a full `EnvFilter` directive.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Emit logs as JSON lines instead of human-readable text.
    #[serde(default)]
    pub json_logs: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

/// Search distances, in world units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProximityConfig {
    /// Reach of the first door accepted by the closest-door search.
    #[serde(default = "default_2_0")]
    pub door_max_distance: f32,
    /// How far the lock toggle looks for a vehicle.
    #[serde(default = "default_10_0")]
    pub lock_search_radius: f32,
    /// How far the trunk command looks for a vehicle.
    #[serde(default = "default_15_0")]
    pub trunk_search_radius: f32,
}

impl Default for ProximityConfig {
    fn default() -> Self {
        Self {
            door_max_distance: 2.0,
            lock_search_radius: 10.0,
            trunk_search_radius: 15.0,
        }
    }
}

/// Lock toggle action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockConfig {
    /// Above this speed (km/h) the lock cannot be toggled.
    #[serde(default = "default_75_0")]
    pub max_speed_kmh: f32,
    /// Duration of the key fob gesture.
    #[serde(default = "default_750")]
    pub gesture_ms: u64,
    /// Full-beam phase of the light flash.
    #[serde(default = "default_250")]
    pub flash_on_ms: u64,
    /// Forced-off phase of the light flash.
    #[serde(default = "default_200")]
    pub flash_off_ms: u64,
    /// Radius of the lock/unlock chirp.
    #[serde(default = "default_5_0")]
    pub sound_radius: f32,
    /// Volume of the lock/unlock chirp.
    #[serde(default = "default_0_1")]
    pub sound_volume: f32,
}

impl LockConfig {
    /// Gesture duration.
    #[must_use]
    pub fn gesture(&self) -> Duration {
        Duration::from_millis(self.gesture_ms)
    }

    /// Full-beam phase duration.
    #[must_use]
    pub fn flash_on(&self) -> Duration {
        Duration::from_millis(self.flash_on_ms)
    }

    /// Forced-off phase duration.
    #[must_use]
    pub fn flash_off(&self) -> Duration {
        Duration::from_millis(self.flash_off_ms)
    }
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            max_speed_kmh: 75.0,
            gesture_ms: 750,
            flash_on_ms: 250,
            flash_off_ms: 200,
            sound_radius: 5.0,
            sound_volume: 0.1,
        }
    }
}

/// Trunk sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrunkConfig {
    /// Growth of the vehicle bounding box on every side.
    #[serde(default = "default_3_0")]
    pub zone_margin: f32,
    /// Period of the bounds check. Tick loops never run faster than a frame,
    /// so `0` means every frame.
    #[serde(default = "default_1000")]
    pub check_interval_ms: u64,
    /// When a new trunk is opened over an active session, tell the server
    /// the superseded trunk is shut. Off keeps the server flag of the
    /// abandoned vehicle set.
    #[serde(default)]
    pub release_superseded: bool,
}

impl TrunkConfig {
    /// Bounds check period.
    #[must_use]
    pub fn check_interval(&self) -> Duration {
        Duration::from_millis(self.check_interval_ms)
    }
}

impl Default for TrunkConfig {
    fn default() -> Self {
        Self {
            zone_margin: 3.0,
            check_interval_ms: 1000,
            release_superseded: false,
        }
    }
}

/// Entering and leaving vehicles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryConfig {
    /// How long the exit control must stay held to leave with the engine running.
    #[serde(default = "default_150")]
    pub exit_confirm_ms: u64,
    /// Poll period while the actor walks to the chosen door.
    #[serde(default = "default_200")]
    pub enter_poll_ms: u64,
    /// Give up on an entry attempt after this long.
    #[serde(default = "default_10000")]
    pub enter_timeout_ms: u64,
}

impl EntryConfig {
    /// Exit confirmation window.
    #[must_use]
    pub fn exit_confirm(&self) -> Duration {
        Duration::from_millis(self.exit_confirm_ms)
    }

    /// Entry poll period.
    #[must_use]
    pub fn enter_poll(&self) -> Duration {
        Duration::from_millis(self.enter_poll_ms)
    }

    /// Entry give-up time.
    #[must_use]
    pub fn enter_timeout(&self) -> Duration {
        Duration::from_millis(self.enter_timeout_ms)
    }
}

impl Default for EntryConfig {
    fn default() -> Self {
        Self {
            exit_confirm_ms: 150,
            enter_poll_ms: 200,
            enter_timeout_ms: 10_000,
        }
    }
}

/// Server round-trips.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    /// Hard timeout for the key check. Expiry counts as "no key".
    #[serde(default = "default_5000")]
    pub key_check_timeout_ms: u64,
}

impl RpcConfig {
    /// Key check timeout.
    #[must_use]
    pub fn key_check_timeout(&self) -> Duration {
        Duration::from_millis(self.key_check_timeout_ms)
    }
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            key_check_timeout_ms: 5000,
        }
    }
}

/// Default key bindings. Players can rebind in the game's settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeybindConfig {
    /// Lock/unlock the nearest vehicle.
    #[serde(default = "default_key_u")]
    pub toggle_lock: String,
    /// Open the nearest trunk.
    #[serde(default = "default_key_g")]
    pub toggle_trunk: String,
}

impl Default for KeybindConfig {
    fn default() -> Self {
        Self {
            toggle_lock: "U".to_string(),
            toggle_trunk: "G".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Serde default helpers
// ---------------------------------------------------------------------------

fn default_true() -> bool { true }
fn default_log_level() -> String { "info".to_string() }
fn default_key_u() -> String { "U".to_string() }
fn default_key_g() -> String { "G".to_string() }
fn default_0_1() -> f32 { 0.1 }
fn default_2_0() -> f32 { 2.0 }
fn default_3_0() -> f32 { 3.0 }
fn default_5_0() -> f32 { 5.0 }
fn default_10_0() -> f32 { 10.0 }
fn default_15_0() -> f32 { 15.0 }
fn default_75_0() -> f32 { 75.0 }
fn default_150() -> u64 { 150 }
fn default_200() -> u64 { 200 }
fn default_250() -> u64 { 250 }
fn default_750() -> u64 { 750 }
fn default_1000() -> u64 { 1000 }
fn default_5000() -> u64 { 5000 }
fn default_10000() -> u64 { 10_000 }
