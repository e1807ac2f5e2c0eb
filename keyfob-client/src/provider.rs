//! Vehicle lock provider: client-side orchestration of vehicle access.
//!
//! One provider exists per local player session. It owns the replicated
//! lock-state mirror, the trunk session and the headwear cache, and turns
//! ticks, inbound events and user commands into engine calls and server
//! events.
//!
//! ## Handlers
//!
//! | Handler                          | Trigger                         |
//! |----------------------------------|---------------------------------|
//! | `check_vehicle_leave`            | every frame                     |
//! | `check_player_can_enter_vehicle` | every frame                     |
//! | `save_current_ped_hat`           | every second                    |
//! | `check_keep_vehicle_trunk_open`  | every trunk check interval      |
//! | `on_enter_leave_vehicle`         | vehicle entered / left          |
//! | `on_state_change`                | replicated `open`/`forced`/...  |
//! | `forget_vehicle`                 | vehicle left scope              |
//! | `close_vehicle_trunk`            | trunk close request             |
//! | `set_vehicle_trunk_state`        | trunk state broadcast           |
//! | `open_vehicle_trunk`             | command, default `G`            |
//! | `toggle_vehicle_lock`            | command, default `U`            |
//!
//! No lock is held across an await, so overlapping invocations of the same
//! handler interleave only at their sleeps.

use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::time::{Instant, sleep};
use tracing::{debug, info};

use keyfob_core::config::KeyfobConfig;
use keyfob_core::headwear::HeadwearTracker;
use keyfob_core::inventory::{VehicleDescriptor, trunk_kind};
use keyfob_core::policy::{AccessDenied, AccessPolicy, LockToggleContext};
use keyfob_core::proximity::{DRIVER_SEAT, find_closest_door_within};
use keyfob_core::state::{StateBagKey, VehicleAccessState, VehicleStateStore};
use keyfob_core::trunk::{TrunkSession, TrunkSessionManager};
use keyfob_core::types::{EntityHandle, NetworkId, NotificationLevel};
use keyfob_core::zone::BoxZone;
use keyfob_rpc::{ServerBridge, ServerEvent};

use crate::engine::{Animation, DoorLockStatus, EngineSeating, LightState, TRUNK_DOOR};
use crate::scheduler::{ClientEvent, Command, CommandAction, EventKind, Scheduler, TickInterval, TickTask};
use crate::services::Services;

/// Sound played when the doors lock.
pub const LOCK_SOUND: &str = "vehicle/lock";
/// Sound played when the doors unlock.
pub const UNLOCK_SOUND: &str = "vehicle/unlock";
/// Warning shown when a trunk session ends because someone moved away.
pub const TRUNK_TOO_FAR: &str = "The trunk is too far.";
/// Command name of the lock toggle.
pub const TOGGLE_LOCK_COMMAND: &str = "toggle_vehicle_lock";
/// Command name of the trunk opener.
pub const TOGGLE_TRUNK_COMMAND: &str = "toggle_vehicle_trunk";

/// Key fob click, upper body only.
fn key_fob_animation(duration_ms: u64) -> Animation {
    Animation {
        dictionary: "anim@mp_player_intmenu@key_fob@",
        name: "fob_click",
        blend_in: 3.0,
        blend_out: 3.0,
        duration_ms,
        repeat: true,
        upper_body_only: true,
        player_control: true,
    }
}

/// Client-side vehicle access controller.
pub struct VehicleLockProvider {
    services: Services,
    bridge: ServerBridge,
    config: KeyfobConfig,
    policy: AccessPolicy,
    states: Mutex<VehicleStateStore>,
    trunk: Mutex<TrunkSessionManager>,
    headwear: Mutex<HeadwearTracker>,
}

impl VehicleLockProvider {
    /// Create a provider for one player session.
    #[must_use]
    pub fn new(services: Services, bridge: ServerBridge, config: KeyfobConfig) -> Self {
        Self {
            policy: AccessPolicy::new(&config.lock),
            services,
            bridge,
            config,
            states: Mutex::new(VehicleStateStore::new()),
            trunk: Mutex::new(TrunkSessionManager::new()),
            headwear: Mutex::new(HeadwearTracker::new()),
        }
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &KeyfobConfig {
        &self.config
    }

    /// Replicated state of a vehicle. State left behind by an earlier
    /// vehicle with the same network id is dropped first.
    #[must_use]
    pub fn vehicle_state(&self, vehicle: EntityHandle) -> VehicleAccessState {
        let network_id = self.services.engine.network_id(vehicle);
        let mut states = self.states.lock();
        states.bind(network_id, vehicle);
        states.get(network_id)
    }

    /// The open trunk session, if any.
    #[must_use]
    pub fn trunk_session(&self) -> Option<TrunkSession> {
        self.trunk.lock().active().cloned()
    }

    /// Show a refusal to the player unless it is a silent one.
    pub fn report(&self, denied: AccessDenied) {
        if denied.is_silent() {
            debug!(?denied, "Action refused silently");
            return;
        }
        self.services.notifier.notify(&denied.to_string(), denied.level());
    }

    // -----------------------------------------------------------------------
    // Dispatch
    // -----------------------------------------------------------------------

    /// Register every tick, event and command of the provider. A disabled
    /// configuration registers nothing.
    pub fn register(&self, scheduler: &mut Scheduler) {
        if !self.config.general.enabled {
            info!("Vehicle access disabled by configuration");
            return;
        }

        scheduler.on_tick(TickInterval::EveryFrame, TickTask::VehicleLeave);
        scheduler.on_tick(TickInterval::EveryFrame, TickTask::EntryAssist);
        scheduler.on_tick(TickInterval::Every(Duration::from_secs(1)), TickTask::HeadwearSample);
        scheduler.on_tick(
            TickInterval::Every(self.config.trunk.check_interval()),
            TickTask::TrunkBounds,
        );

        for kind in [
            EventKind::EnteredVehicle,
            EventKind::LeftVehicle,
            EventKind::StateChanged,
            EventKind::CloseTrunk,
            EventKind::TrunkStateChanged,
            EventKind::VehicleLeftScope,
        ] {
            scheduler.on_event(kind);
        }

        scheduler.command(Command {
            name: TOGGLE_LOCK_COMMAND,
            description: "Lock or unlock the vehicle",
            default_key: self.config.keybinds.toggle_lock.clone(),
            action: CommandAction::ToggleLock,
        });
        scheduler.command(Command {
            name: TOGGLE_TRUNK_COMMAND,
            description: "Open the vehicle trunk",
            default_key: self.config.keybinds.toggle_trunk.clone(),
            action: CommandAction::ToggleTrunk,
        });
    }

    /// Run one iteration of a tick task.
    pub async fn run_tick(&self, task: TickTask) {
        match task {
            TickTask::VehicleLeave => self.check_vehicle_leave().await,
            TickTask::EntryAssist => self.check_player_can_enter_vehicle().await,
            TickTask::HeadwearSample => self.save_current_ped_hat(),
            TickTask::TrunkBounds => self.check_keep_vehicle_trunk_open(),
        }
    }

    /// React to an inbound notification.
    pub fn handle_event(&self, event: &ClientEvent) {
        match event {
            ClientEvent::EnteredVehicle | ClientEvent::LeftVehicle => self.on_enter_leave_vehicle(),
            ClientEvent::StateChanged { key, value } => self.on_state_change(key, value),
            ClientEvent::CloseTrunk => self.close_vehicle_trunk(),
            ClientEvent::TrunkStateChanged { network_id, open } => {
                self.set_vehicle_trunk_state(*network_id, *open);
            }
            ClientEvent::VehicleLeftScope { network_id } => self.forget_vehicle(*network_id),
        }
    }

    /// Run a user command, notifying the player of a refusal.
    ///
    /// # Errors
    /// The refusal, after it was reported.
    pub async fn run_command(&self, action: CommandAction) -> Result<(), AccessDenied> {
        let outcome = match action {
            CommandAction::ToggleLock => self.toggle_vehicle_lock().await,
            CommandAction::ToggleTrunk => self.open_vehicle_trunk(),
        };
        if let Err(denied) = outcome {
            self.report(denied);
        }
        outcome
    }

    // -----------------------------------------------------------------------
    // Headwear
    // -----------------------------------------------------------------------

    /// Put the last sampled hat back on after entering or leaving a vehicle.
    pub fn on_enter_leave_vehicle(&self) {
        let Some(hat) = self.headwear.lock().current() else {
            return;
        };

        let engine = &self.services.engine;
        let ped = engine.player_ped();
        if hat.is_bare() {
            engine.allow_helmet(ped);
        }
        engine.set_hat(ped, hat);
        self.bridge.emit(ServerEvent::UpdateHatVehicle(hat));
    }

    /// Sample the worn hat; replicate changes made while seated.
    pub fn save_current_ped_hat(&self) {
        let engine = &self.services.engine;
        let ped = engine.player_ped();
        let in_vehicle = engine.vehicle_ped_is_in(ped).is_some();
        let snapshot = engine.hat(ped);

        let changed = self.headwear.lock().sample(snapshot, in_vehicle);
        if let Some(hat) = changed {
            debug!(hat = hat.hat, texture = hat.texture, "Hat changed in vehicle");
            self.bridge.emit(ServerEvent::UpdateHatVehicle(hat));
        }
    }

    // -----------------------------------------------------------------------
    // Leaving
    // -----------------------------------------------------------------------

    /// Driver holding the exit control leaves with the engine running;
    /// a short press only stops the engine.
    pub async fn check_vehicle_leave(&self) {
        let engine = &self.services.engine;
        let ped = engine.player_ped();

        if self.services.players.seatbelt_on() {
            engine.disable_exit_control();
            return;
        }

        let Some(vehicle) = engine.vehicle_ped_is_in(ped) else {
            return;
        };
        if engine.ped_in_seat(vehicle, DRIVER_SEAT) != Some(ped) {
            return;
        }
        if !self.holding_exit(ped) {
            return;
        }

        engine.set_engine_on(vehicle, true);
        sleep(self.config.entry.exit_confirm()).await;

        if engine.entity_exists(vehicle) && self.holding_exit(ped) {
            engine.set_engine_on(vehicle, true);
            engine.task_leave_vehicle(ped, vehicle);
        } else {
            engine.set_engine_on(vehicle, false);
        }
    }

    fn holding_exit(&self, ped: EntityHandle) -> bool {
        self.services.engine.is_exit_pressed() && !self.services.engine.is_dead(ped)
    }

    // -----------------------------------------------------------------------
    // Lock state
    // -----------------------------------------------------------------------

    /// Fold a replicated update and, for `open`/`forced`, reapply the
    /// physical lock. Malformed updates are ignored.
    pub fn on_state_change(&self, key: &str, value: &Value) {
        let key = match key.parse::<StateBagKey>() {
            Ok(key) => key,
            Err(e) => {
                debug!(key, "Ignoring replicated update: {e}");
                return;
            }
        };

        let vehicle = self.resolve_vehicle(key.network_id);
        let applied = {
            let mut states = self.states.lock();
            if let Some(vehicle) = vehicle {
                states.bind(key.network_id, vehicle);
            }
            states.apply_field(key, value)
        };
        if let Err(e) = applied {
            debug!(key = %key, "Ignoring replicated update: {e}");
            return;
        }

        if let Some(vehicle) = vehicle.filter(|_| key.field.affects_lock()) {
            self.apply_lock(vehicle, key.network_id);
        }
    }

    /// Drop the replicated state of a vehicle that was deleted or streamed
    /// out, so a vehicle reusing its network id starts locked.
    pub fn forget_vehicle(&self, network_id: NetworkId) {
        let mut states = self.states.lock();
        if states.remove(network_id).is_some() {
            debug!(network_id = %network_id, remaining = states.len(), "Vehicle left scope");
        }
    }

    fn resolve_vehicle(&self, network_id: NetworkId) -> Option<EntityHandle> {
        let engine = &self.services.engine;
        engine
            .entity_from_network_id(network_id)
            .filter(|&vehicle| engine.entity_exists(vehicle) && engine.is_vehicle(vehicle))
    }

    fn apply_lock(&self, vehicle: EntityHandle, network_id: NetworkId) {
        let engine = &self.services.engine;
        let state = self.states.lock().get(network_id);
        if !state.is_locked() {
            engine.set_doors_locked(vehicle, DoorLockStatus::Unlocked);
            return;
        }

        engine.set_doors_locked(vehicle, DoorLockStatus::Locked);
        let invalidated = self.trunk.lock().invalidate(vehicle);
        if let Some(session) = invalidated {
            self.release_trunk(&session);
        }
    }

    // -----------------------------------------------------------------------
    // Entering
    // -----------------------------------------------------------------------

    /// Lock inaccessible vehicles the actor tries to enter; otherwise walk
    /// the actor to the closest free door.
    pub async fn check_player_can_enter_vehicle(&self) {
        let Some(player) = self.services.players.player() else {
            return;
        };

        let engine = &self.services.engine;
        let ped = engine.player_ped();
        let Some(vehicle) = engine.vehicle_ped_is_trying_to_enter(ped) else {
            return;
        };

        let state = self.vehicle_state(vehicle);
        if !self.policy.can_enter(&player, &state) {
            engine.set_doors_locked(vehicle, DoorLockStatus::Locked);
            return;
        }

        let door = {
            let seating = EngineSeating::new(engine.as_ref(), vehicle);
            find_closest_door_within(
                &seating,
                engine.coords(ped),
                engine.max_passengers(vehicle),
                self.config.proximity.door_max_distance,
            )
        };
        let Some(door) = door else {
            return;
        };

        debug!(vehicle = %vehicle, door = %door.door, seat = door.seat_index, "Entering through closest door");
        engine.task_enter_vehicle(ped, vehicle, door.seat_index);

        let started = Instant::now();
        let poll = self.config.entry.enter_poll();
        sleep(poll).await;
        while self.is_entering(ped) && started.elapsed() < self.config.entry.enter_timeout() {
            sleep(poll).await;
        }

        if self.is_entering(ped) {
            debug!(vehicle = %vehicle, "Entry attempt timed out");
            engine.clear_tasks_immediately(ped);
        }
    }

    fn is_entering(&self, ped: EntityHandle) -> bool {
        let engine = &self.services.engine;
        engine
            .vehicle_ped_is_entering(ped)
            .or_else(|| engine.vehicle_ped_is_trying_to_enter(ped))
            .is_some()
    }

    // -----------------------------------------------------------------------
    // Trunk
    // -----------------------------------------------------------------------

    /// Zone a trunk session of `vehicle` is bound to.
    #[must_use]
    pub fn trunk_zone(&self, vehicle: EntityHandle) -> BoxZone {
        let engine = &self.services.engine;
        let (min, max) = engine.model_dimensions(engine.model(vehicle));
        BoxZone::around_vehicle(
            engine.coords(vehicle),
            engine.heading(vehicle),
            min,
            max,
            self.config.trunk.zone_margin,
        )
    }

    /// Open the trunk of the closest vehicle.
    ///
    /// # Errors
    /// The first failed precondition; nothing is emitted in that case.
    pub fn open_vehicle_trunk(&self) -> Result<(), AccessDenied> {
        let engine = &self.services.engine;
        let ped = engine.player_ped();

        let player = self.services.players.player().ok_or(AccessDenied::NoPlayer)?;
        self.policy
            .check_actor_can_toggle(&player, self.services.ui.phone_visible())?;
        if engine.vehicle_ped_is_in(ped).is_some() {
            return Err(AccessDenied::InVehicle);
        }

        let vehicle = engine
            .closest_vehicle(self.config.proximity.trunk_search_radius)
            .filter(|&vehicle| engine.is_vehicle(vehicle))
            .ok_or(AccessDenied::NoVehicleNearby)?;

        let zone = self.trunk_zone(vehicle);
        if !zone.contains(&engine.coords(ped)) {
            return Err(AccessDenied::NotNextToVehicle);
        }

        let state = self.vehicle_state(vehicle);
        self.policy.can_open_trunk(&player, &state)?;

        if self.services.ui.inventory_busy() {
            return Err(AccessDenied::InventoryBusy);
        }

        let model = engine.model(vehicle);
        let network_id = engine.network_id(vehicle);
        let plate = state.plate.unwrap_or_else(|| engine.plate_text(vehicle));

        self.bridge.emit(ServerEvent::OpenInventory {
            kind: trunk_kind(model).to_string(),
            plate,
            vehicle: VehicleDescriptor {
                model,
                class: engine.vehicle_class(vehicle),
                entity: network_id,
            },
        });
        self.bridge.emit(ServerEvent::SetTrunkState {
            network_id,
            open: true,
        });

        let superseded = self.trunk.lock().open(TrunkSession {
            vehicle,
            network_id,
            zone,
        });
        if let Some(previous) = superseded.filter(|previous| previous.network_id != network_id) {
            if self.config.trunk.release_superseded {
                self.bridge.emit(ServerEvent::SetTrunkState {
                    network_id: previous.network_id,
                    open: false,
                });
            } else {
                debug!(network_id = %previous.network_id, "Superseded trunk left open on the server");
            }
        }

        Ok(())
    }

    /// Close the trunk session once actor or vehicle left its zone.
    pub fn check_keep_vehicle_trunk_open(&self) {
        let Some(vehicle) = self.trunk.lock().active().map(|session| session.vehicle) else {
            return;
        };

        let engine = &self.services.engine;
        let vehicle_position = engine.entity_exists(vehicle).then(|| engine.coords(vehicle));
        let actor_position = engine.coords(engine.player_ped());

        let closed = self.trunk.lock().check_bounds(actor_position, vehicle_position);
        if let Some(session) = closed {
            self.release_trunk(&session);
            self.services.notifier.notify(TRUNK_TOO_FAR, NotificationLevel::Warning);
        }
    }

    /// Close the trunk session on request.
    pub fn close_vehicle_trunk(&self) {
        let closed = self.trunk.lock().close();
        if let Some(session) = closed {
            self.release_trunk(&session);
        }
    }

    /// Mirror a trunk state broadcast on the local copy of the vehicle.
    pub fn set_vehicle_trunk_state(&self, network_id: NetworkId, open: bool) {
        let engine = &self.services.engine;
        let Some(vehicle) = engine.entity_from_network_id(network_id) else {
            return;
        };
        if !engine.entity_exists(vehicle) {
            return;
        }

        if open {
            engine.set_door_open(vehicle, TRUNK_DOOR);
        } else {
            engine.set_door_shut(vehicle, TRUNK_DOOR);
        }
    }

    fn release_trunk(&self, session: &TrunkSession) {
        self.bridge.emit(ServerEvent::SetTrunkState {
            network_id: session.network_id,
            open: false,
        });
        self.services.ui.close_inventory();
    }

    // -----------------------------------------------------------------------
    // Lock toggle
    // -----------------------------------------------------------------------

    /// Lock or unlock the closest vehicle with the key fob.
    ///
    /// # Errors
    /// The first failed precondition; the lock state is untouched then.
    pub async fn toggle_vehicle_lock(&self) -> Result<(), AccessDenied> {
        let player = self.services.players.player().ok_or(AccessDenied::NoPlayer)?;
        let phone_visible = self.services.ui.phone_visible();
        // Actor refusals are silent and win over a missing vehicle.
        self.policy.check_actor_can_toggle(&player, phone_visible)?;

        let engine = &self.services.engine;
        let vehicle = engine
            .closest_vehicle(self.config.proximity.lock_search_radius)
            .ok_or(AccessDenied::NoVehicleNearby)?;
        let context = LockToggleContext {
            speed_ms: engine.speed(vehicle),
            phone_visible,
        };
        self.policy.can_lock_toggle(&player, &context)?;

        let state = self.vehicle_state(vehicle);
        if !self.policy.has_key(&player, &state, &self.bridge).await {
            return Err(AccessDenied::NoKey);
        }

        let lock = &self.config.lock;
        engine.play_animation(engine.player_ped(), &key_fob_animation(lock.gesture_ms));
        sleep(lock.gesture()).await;

        if !engine.entity_exists(vehicle) {
            debug!(vehicle = %vehicle, "Vehicle vanished during the key fob gesture");
            return Ok(());
        }

        let network_id = engine.network_id(vehicle);
        let (sound, open) = if state.open {
            (LOCK_SOUND, false)
        } else {
            (UNLOCK_SOUND, true)
        };
        self.services.sounds.play_around(sound, lock.sound_radius, lock.sound_volume);
        self.bridge.emit(ServerEvent::SetOpen { network_id, open });
        info!(network_id = %network_id, open, "Vehicle lock toggled");

        engine.set_lights(vehicle, LightState::On);
        sleep(lock.flash_on()).await;
        engine.set_lights(vehicle, LightState::Off);
        sleep(lock.flash_off()).await;
        engine.set_lights(vehicle, LightState::Default);

        Ok(())
    }
}
