//! Explicit registry of tick tasks, inbound events and user commands.
//!
//! The provider registers what it reacts to; the host feeds events and
//! commands in and runs the tick loops on a `LocalSet`.

use std::rc::Rc;
use std::time::Duration;

use serde_json::Value;
use tokio::task::JoinSet;
use tokio::time::sleep;
use tracing::debug;

use keyfob_core::policy::AccessDenied;
use keyfob_core::types::NetworkId;

use crate::provider::VehicleLockProvider;

/// Period of an every-frame tick, about 60 Hz.
pub const FRAME: Duration = Duration::from_millis(16);

/// How often a tick task runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickInterval {
    /// Once per frame.
    EveryFrame,
    /// At a fixed period.
    Every(Duration),
}

impl TickInterval {
    /// Delay between two runs, never shorter than a frame.
    #[must_use]
    pub fn period(self) -> Duration {
        match self {
            Self::EveryFrame => FRAME,
            Self::Every(period) => period.max(FRAME),
        }
    }
}

/// Periodic work of the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickTask {
    /// Forced exit while driving.
    VehicleLeave,
    /// Lock enforcement and door assist on entry attempts.
    EntryAssist,
    /// Hat sampling.
    HeadwearSample,
    /// Trunk session bounds.
    TrunkBounds,
}

/// Inbound notification kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// See [`ClientEvent::EnteredVehicle`].
    EnteredVehicle,
    /// See [`ClientEvent::LeftVehicle`].
    LeftVehicle,
    /// See [`ClientEvent::StateChanged`].
    StateChanged,
    /// See [`ClientEvent::CloseTrunk`].
    CloseTrunk,
    /// See [`ClientEvent::TrunkStateChanged`].
    TrunkStateChanged,
    /// See [`ClientEvent::VehicleLeftScope`].
    VehicleLeftScope,
}

/// An inbound notification from the engine or the server.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// The local player got into a vehicle.
    EnteredVehicle,
    /// The local player got out of a vehicle.
    LeftVehicle,
    /// A replicated vehicle field changed.
    StateChanged {
        /// Composite key, `"<field>:<networkId>"`.
        key: String,
        /// New value, `null` when cleared.
        value: Value,
    },
    /// The inventory asked to end the trunk session.
    CloseTrunk,
    /// Someone opened or shut a trunk.
    TrunkStateChanged {
        /// Vehicle concerned.
        network_id: NetworkId,
        /// Open or shut.
        open: bool,
    },
    /// A vehicle was deleted or streamed out; its network id may be reused.
    VehicleLeftScope {
        /// Vehicle concerned.
        network_id: NetworkId,
    },
}

impl ClientEvent {
    /// Kind used for subscription lookup.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Self::EnteredVehicle => EventKind::EnteredVehicle,
            Self::LeftVehicle => EventKind::LeftVehicle,
            Self::StateChanged { .. } => EventKind::StateChanged,
            Self::CloseTrunk => EventKind::CloseTrunk,
            Self::TrunkStateChanged { .. } => EventKind::TrunkStateChanged,
            Self::VehicleLeftScope { .. } => EventKind::VehicleLeftScope,
        }
    }
}

/// What a user command does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandAction {
    /// Lock or unlock the closest vehicle.
    ToggleLock,
    /// Open the closest trunk.
    ToggleTrunk,
}

/// A user command with its default key binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Command name, as typed in the console.
    pub name: &'static str,
    /// Shown in the key binding settings.
    pub description: &'static str,
    /// Default key.
    pub default_key: String,
    /// Behavior.
    pub action: CommandAction,
}

/// Registered ticks, event subscriptions and commands.
#[derive(Debug, Default)]
pub struct Scheduler {
    ticks: Vec<(TickInterval, TickTask)>,
    events: Vec<EventKind>,
    commands: Vec<Command>,
}

impl Scheduler {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `task` every `interval`.
    pub fn on_tick(&mut self, interval: TickInterval, task: TickTask) {
        self.ticks.push((interval, task));
    }

    /// Subscribe to an event kind.
    pub fn on_event(&mut self, kind: EventKind) {
        if !self.events.contains(&kind) {
            self.events.push(kind);
        }
    }

    /// Register a user command.
    pub fn command(&mut self, command: Command) {
        self.commands.push(command);
    }

    /// Registered ticks, in registration order.
    #[must_use]
    pub fn ticks(&self) -> &[(TickInterval, TickTask)] {
        &self.ticks
    }

    /// Registered commands, in registration order.
    #[must_use]
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Whether events of `kind` are handled.
    #[must_use]
    pub fn handles(&self, kind: EventKind) -> bool {
        self.events.contains(&kind)
    }

    /// Deliver an event. Returns `false` when nothing subscribed to it.
    pub fn dispatch_event(&self, provider: &VehicleLockProvider, event: &ClientEvent) -> bool {
        if !self.handles(event.kind()) {
            debug!(kind = ?event.kind(), "No handler for event");
            return false;
        }
        provider.handle_event(event);
        true
    }

    /// Run a command by name. `None` when no such command is registered.
    pub async fn dispatch_command(
        &self,
        provider: &VehicleLockProvider,
        name: &str,
    ) -> Option<Result<(), AccessDenied>> {
        let command = self.commands.iter().find(|command| command.name == name)?;
        Some(provider.run_command(command.action).await)
    }

    /// Start one loop per registered tick.
    ///
    /// Must be called from within a [`tokio::task::LocalSet`]. Dropping the
    /// returned set aborts the loops.
    #[must_use]
    pub fn spawn_ticks(&self, provider: &Rc<VehicleLockProvider>) -> JoinSet<()> {
        let mut set = JoinSet::new();
        for &(interval, task) in &self.ticks {
            let provider = Rc::clone(provider);
            set.spawn_local(async move {
                loop {
                    provider.run_tick(task).await;
                    sleep(interval.period()).await;
                }
            });
        }
        set
    }
}
