//! In-memory engine, host services and server for provider tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::oneshot;
use tokio::time::Instant;

use keyfob_client::engine::{Animation, DoorLockStatus, Engine, LightState};
use keyfob_client::services::{CompanionUi, Notifier, PlayerSource, Services, SoundPlayer};
use keyfob_client::VehicleLockProvider;
use keyfob_core::config::KeyfobConfig;
use keyfob_core::headwear::{HeadwearSnapshot, NO_HAT};
use keyfob_core::types::{ActorProfile, EntityHandle, ModelHash, NetworkId, NotificationLevel, Vec3};
use keyfob_rpc::{BridgeReceiver, Outbound, RpcRequest, ServerBridge, ServerEvent};

pub const PED: EntityHandle = EntityHandle(1);

/// A sedan-sized vehicle.
#[derive(Debug, Clone)]
pub struct FakeVehicle {
    pub network_id: NetworkId,
    pub position: Vec3,
    pub heading: f32,
    pub speed: f32,
    pub model: ModelHash,
    pub plate: String,
    pub class: i32,
    pub max_passengers: i32,
    pub seats: HashMap<i32, EntityHandle>,
    pub bones: HashMap<&'static str, Vec3>,
}

impl FakeVehicle {
    pub fn sedan(network_id: u32, position: Vec3) -> Self {
        let at = |dx: f32, dy: f32| Vec3::new(position.x + dx, position.y + dy, position.z);
        let bones = HashMap::from([
            ("seat_dside_f", at(-0.5, 0.5)),
            ("seat_pside_f", at(0.5, 0.5)),
            ("seat_dside_r", at(-0.5, -0.5)),
            ("seat_pside_r", at(0.5, -0.5)),
            ("door_dside_f", at(-1.0, 0.6)),
            ("door_pside_f", at(1.0, 0.6)),
            ("door_dside_r", at(-1.0, -0.6)),
            ("door_pside_r", at(1.0, -0.6)),
        ]);
        Self {
            network_id: NetworkId(network_id),
            position,
            heading: 0.0,
            speed: 0.0,
            model: ModelHash::from_name("sultan"),
            plate: format!("PLATE{network_id:03}"),
            class: 4,
            max_passengers: 3,
            seats: HashMap::new(),
            bones,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Task {
    Enter { vehicle: EntityHandle, seat: i32 },
    Leave { vehicle: EntityHandle },
    Clear,
}

/// World state plus a log of every effect the provider applied.
#[derive(Debug)]
pub struct World {
    pub ped_position: Vec3,
    pub ped_dead: bool,
    pub in_vehicle: Option<EntityHandle>,
    pub trying_to_enter: Option<EntityHandle>,
    pub entering: Option<EntityHandle>,
    pub vehicles: HashMap<EntityHandle, FakeVehicle>,
    pub players: Vec<EntityHandle>,
    pub exit_pressed: bool,
    pub hat: HeadwearSnapshot,

    pub locks: Vec<(EntityHandle, DoorLockStatus)>,
    pub engine_on: Vec<(EntityHandle, bool)>,
    pub lights: Vec<(Instant, LightState)>,
    pub doors: Vec<(EntityHandle, i32, bool)>,
    pub tasks: Vec<Task>,
    pub animations: Vec<Animation>,
    pub exit_disabled: usize,
    pub hats_set: Vec<HeadwearSnapshot>,
    pub helmet_allowed: usize,
}

impl Default for World {
    fn default() -> Self {
        Self {
            ped_position: Vec3::default(),
            ped_dead: false,
            in_vehicle: None,
            trying_to_enter: None,
            entering: None,
            vehicles: HashMap::new(),
            players: vec![PED],
            exit_pressed: false,
            hat: HeadwearSnapshot { hat: NO_HAT, texture: 0 },
            locks: Vec::new(),
            engine_on: Vec::new(),
            lights: Vec::new(),
            doors: Vec::new(),
            tasks: Vec::new(),
            animations: Vec::new(),
            exit_disabled: 0,
            hats_set: Vec::new(),
            helmet_allowed: 0,
        }
    }
}

#[derive(Default)]
pub struct FakeEngine {
    pub world: Mutex<World>,
}

impl FakeEngine {
    fn vehicle<T>(&self, handle: EntityHandle, read: impl FnOnce(&FakeVehicle) -> T) -> Option<T> {
        self.world.lock().vehicles.get(&handle).map(read)
    }
}

impl Engine for FakeEngine {
    fn player_ped(&self) -> EntityHandle {
        PED
    }

    fn vehicle_ped_is_in(&self, _ped: EntityHandle) -> Option<EntityHandle> {
        self.world.lock().in_vehicle
    }

    fn vehicle_ped_is_trying_to_enter(&self, _ped: EntityHandle) -> Option<EntityHandle> {
        self.world.lock().trying_to_enter
    }

    fn vehicle_ped_is_entering(&self, _ped: EntityHandle) -> Option<EntityHandle> {
        self.world.lock().entering
    }

    fn ped_in_seat(&self, vehicle: EntityHandle, seat: i32) -> Option<EntityHandle> {
        self.vehicle(vehicle, |v| v.seats.get(&seat).copied()).flatten()
    }

    fn is_ped_a_player(&self, ped: EntityHandle) -> bool {
        self.world.lock().players.contains(&ped)
    }

    fn max_passengers(&self, vehicle: EntityHandle) -> i32 {
        self.vehicle(vehicle, |v| v.max_passengers).unwrap_or(0)
    }

    fn entity_exists(&self, entity: EntityHandle) -> bool {
        entity == PED || self.world.lock().vehicles.contains_key(&entity)
    }

    fn is_vehicle(&self, entity: EntityHandle) -> bool {
        self.world.lock().vehicles.contains_key(&entity)
    }

    fn is_dead(&self, entity: EntityHandle) -> bool {
        entity == PED && self.world.lock().ped_dead
    }

    fn coords(&self, entity: EntityHandle) -> Vec3 {
        if entity == PED {
            return self.world.lock().ped_position;
        }
        self.vehicle(entity, |v| v.position).unwrap_or_default()
    }

    fn heading(&self, entity: EntityHandle) -> f32 {
        self.vehicle(entity, |v| v.heading).unwrap_or_default()
    }

    fn speed(&self, entity: EntityHandle) -> f32 {
        self.vehicle(entity, |v| v.speed).unwrap_or_default()
    }

    fn model(&self, entity: EntityHandle) -> ModelHash {
        self.vehicle(entity, |v| v.model).unwrap_or(ModelHash(0))
    }

    fn model_dimensions(&self, _model: ModelHash) -> (Vec3, Vec3) {
        (Vec3::new(-1.0, -2.5, -0.5), Vec3::new(1.0, 2.5, 1.0))
    }

    fn bone_position(&self, entity: EntityHandle, bone: &str) -> Option<Vec3> {
        self.vehicle(entity, |v| v.bones.get(bone).copied()).flatten()
    }

    fn plate_text(&self, vehicle: EntityHandle) -> String {
        self.vehicle(vehicle, |v| v.plate.clone()).unwrap_or_default()
    }

    fn vehicle_class(&self, vehicle: EntityHandle) -> i32 {
        self.vehicle(vehicle, |v| v.class).unwrap_or_default()
    }

    fn closest_vehicle(&self, max_distance: f32) -> Option<EntityHandle> {
        let world = self.world.lock();
        world
            .vehicles
            .iter()
            .map(|(&handle, v)| (handle, world.ped_position.distance(&v.position)))
            .filter(|&(_, distance)| distance <= max_distance)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(handle, _)| handle)
    }

    fn network_id(&self, entity: EntityHandle) -> NetworkId {
        self.vehicle(entity, |v| v.network_id).unwrap_or(NetworkId(0))
    }

    fn entity_from_network_id(&self, network_id: NetworkId) -> Option<EntityHandle> {
        self.world
            .lock()
            .vehicles
            .iter()
            .find(|(_, v)| v.network_id == network_id)
            .map(|(&handle, _)| handle)
    }

    fn set_doors_locked(&self, vehicle: EntityHandle, status: DoorLockStatus) {
        self.world.lock().locks.push((vehicle, status));
    }

    fn set_engine_on(&self, vehicle: EntityHandle, on: bool) {
        self.world.lock().engine_on.push((vehicle, on));
    }

    fn set_lights(&self, _vehicle: EntityHandle, state: LightState) {
        self.world.lock().lights.push((Instant::now(), state));
    }

    fn set_door_open(&self, vehicle: EntityHandle, door: i32) {
        self.world.lock().doors.push((vehicle, door, true));
    }

    fn set_door_shut(&self, vehicle: EntityHandle, door: i32) {
        self.world.lock().doors.push((vehicle, door, false));
    }

    fn task_enter_vehicle(&self, _ped: EntityHandle, vehicle: EntityHandle, seat: i32) {
        self.world.lock().tasks.push(Task::Enter { vehicle, seat });
    }

    fn task_leave_vehicle(&self, _ped: EntityHandle, vehicle: EntityHandle) {
        self.world.lock().tasks.push(Task::Leave { vehicle });
    }

    fn clear_tasks_immediately(&self, _ped: EntityHandle) {
        let mut world = self.world.lock();
        world.tasks.push(Task::Clear);
        world.trying_to_enter = None;
        world.entering = None;
    }

    fn play_animation(&self, _ped: EntityHandle, animation: &Animation) {
        self.world.lock().animations.push(animation.clone());
    }

    fn is_exit_pressed(&self) -> bool {
        self.world.lock().exit_pressed
    }

    fn disable_exit_control(&self) {
        self.world.lock().exit_disabled += 1;
    }

    fn hat(&self, _ped: EntityHandle) -> HeadwearSnapshot {
        self.world.lock().hat
    }

    fn set_hat(&self, _ped: EntityHandle, hat: HeadwearSnapshot) {
        let mut world = self.world.lock();
        world.hat = hat;
        world.hats_set.push(hat);
    }

    fn allow_helmet(&self, _ped: EntityHandle) {
        self.world.lock().helmet_allowed += 1;
    }
}

/// Notifier, sound player, overlays and player data in one.
pub struct FakeHost {
    pub player: Mutex<Option<ActorProfile>>,
    pub seatbelt: Mutex<bool>,
    pub phone_visible: Mutex<bool>,
    pub inventory_busy: Mutex<bool>,
    pub inventory_closes: Mutex<usize>,
    pub notifications: Mutex<Vec<(String, NotificationLevel)>>,
    pub sounds: Mutex<Vec<String>>,
}

impl FakeHost {
    pub fn new(player: ActorProfile) -> Self {
        Self {
            player: Mutex::new(Some(player)),
            seatbelt: Mutex::new(false),
            phone_visible: Mutex::new(false),
            inventory_busy: Mutex::new(false),
            inventory_closes: Mutex::new(0),
            notifications: Mutex::new(Vec::new()),
            sounds: Mutex::new(Vec::new()),
        }
    }

    pub fn messages(&self) -> Vec<String> {
        self.notifications.lock().iter().map(|(m, _)| m.clone()).collect()
    }
}

impl Notifier for FakeHost {
    fn notify(&self, message: &str, level: NotificationLevel) {
        self.notifications.lock().push((message.to_string(), level));
    }
}

impl SoundPlayer for FakeHost {
    fn play_around(&self, sound: &str, _radius: f32, _volume: f32) {
        self.sounds.lock().push(sound.to_string());
    }
}

impl CompanionUi for FakeHost {
    fn phone_visible(&self) -> bool {
        *self.phone_visible.lock()
    }

    fn inventory_busy(&self) -> bool {
        *self.inventory_busy.lock()
    }

    fn close_inventory(&self) {
        *self.inventory_closes.lock() += 1;
    }
}

impl PlayerSource for FakeHost {
    fn player(&self) -> Option<ActorProfile> {
        self.player.lock().clone()
    }

    fn seatbelt_on(&self) -> bool {
        *self.seatbelt.lock()
    }
}

/// How the fake server answers key checks.
#[derive(Debug, Clone, Copy)]
pub enum KeyAnswer {
    Grant,
    Deny,
    Never,
}

/// Host end of the bridge: records events and answers calls.
#[derive(Default)]
pub struct FakeServer {
    pub events: Mutex<Vec<ServerEvent>>,
    pub calls: Mutex<Vec<RpcRequest>>,
    pending: Mutex<Vec<oneshot::Sender<Value>>>,
}

impl FakeServer {
    pub fn spawn(mut rx: BridgeReceiver, answer: KeyAnswer) -> Arc<Self> {
        let server = Arc::new(Self::default());
        let host = Arc::clone(&server);
        tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                match message {
                    Outbound::Event(event) => host.events.lock().push(event),
                    Outbound::Call { request, reply } => {
                        host.calls.lock().push(request);
                        match answer {
                            KeyAnswer::Grant => drop(reply.send(Value::Bool(true))),
                            KeyAnswer::Deny => drop(reply.send(Value::Bool(false))),
                            KeyAnswer::Never => host.pending.lock().push(reply),
                        }
                    }
                }
            }
        });
        server
    }

    pub fn events(&self) -> Vec<ServerEvent> {
        self.events.lock().clone()
    }
}

/// Everything a provider test needs.
pub struct Harness {
    pub provider: Rc<VehicleLockProvider>,
    pub engine: Arc<FakeEngine>,
    pub host: Arc<FakeHost>,
    pub server: Arc<FakeServer>,
}

impl Harness {
    pub fn new(player: ActorProfile, answer: KeyAnswer) -> Self {
        Self::with_config(player, answer, KeyfobConfig::default())
    }

    pub fn with_config(player: ActorProfile, answer: KeyAnswer, config: KeyfobConfig) -> Self {
        let engine = Arc::new(FakeEngine::default());
        let host = Arc::new(FakeHost::new(player));
        let (bridge, rx) = ServerBridge::channel(config.rpc.key_check_timeout());
        let server = FakeServer::spawn(rx, answer);

        let services = Services {
            engine: engine.clone(),
            notifier: host.clone(),
            sounds: host.clone(),
            ui: host.clone(),
            players: host.clone(),
        };

        Self {
            provider: Rc::new(VehicleLockProvider::new(services, bridge, config)),
            engine,
            host,
            server,
        }
    }

    /// Add a vehicle and return its handle.
    pub fn spawn_vehicle(&self, handle: i32, vehicle: FakeVehicle) -> EntityHandle {
        let handle = EntityHandle(handle);
        self.engine.world.lock().vehicles.insert(handle, vehicle);
        handle
    }

    /// Feed a replicated field update.
    pub fn replicate(&self, field: &str, network_id: u32, value: Value) {
        self.provider.on_state_change(&format!("{field}:{network_id}"), &value);
    }

    pub fn world(&self) -> parking_lot::MutexGuard<'_, World> {
        self.engine.world.lock()
    }

    /// Let the fake server drain the bridge.
    pub async fn settle(&self) {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }
}

/// Default delay a test advances past the whole lock toggle sequence.
pub const TOGGLE_SEQUENCE: Duration = Duration::from_millis(750 + 250 + 200);
