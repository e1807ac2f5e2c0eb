//! Channel-backed server bridge.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use keyfob_core::policy::KeyAuthority;
use keyfob_core::types::VehicleRecordId;

use crate::error::RpcError;
use crate::messages::{RpcRequest, ServerEvent};

/// What travels from the client logic to the host transport.
#[derive(Debug)]
pub enum Outbound {
    /// Fire-and-forget event.
    Event(ServerEvent),
    /// A call awaiting one reply on `reply`.
    Call {
        /// The question.
        request: RpcRequest,
        /// Where the host puts the answer.
        reply: oneshot::Sender<Value>,
    },
}

/// Host side of the bridge.
pub type BridgeReceiver = mpsc::UnboundedReceiver<Outbound>;

/// Client side of the bridge. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ServerBridge {
    tx: mpsc::UnboundedSender<Outbound>,
    call_timeout: Duration,
}

impl ServerBridge {
    /// Create a bridge and the receiver the host drains.
    #[must_use]
    pub fn channel(call_timeout: Duration) -> (Self, BridgeReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx, call_timeout }, rx)
    }

    /// Send an event. A closed bridge drops it; events are never retried.
    pub fn emit(&self, event: ServerEvent) {
        let name = event.name();
        if self.tx.send(Outbound::Event(event)).is_err() {
            debug!(event = name, "Server bridge closed, event dropped");
        }
    }

    /// Ask the server and wait for the reply, at most the call timeout.
    ///
    /// # Errors
    /// `Timeout` when no reply arrives in time, `Closed` when the host side
    /// is gone, `Malformed` when the reply is not a `T`.
    pub async fn call<T: DeserializeOwned>(&self, request: RpcRequest) -> Result<T, RpcError> {
        let call = request.name();
        let (reply, answer) = oneshot::channel();
        self.tx
            .send(Outbound::Call { request, reply })
            .map_err(|_| RpcError::Closed)?;

        let value = tokio::time::timeout(self.call_timeout, answer)
            .await
            .map_err(|_| RpcError::Timeout {
                call,
                timeout_ms: u64::try_from(self.call_timeout.as_millis()).unwrap_or(u64::MAX),
            })?
            .map_err(|_| RpcError::Closed)?;

        serde_json::from_value(value).map_err(|e| RpcError::Malformed {
            call,
            reason: e.to_string(),
        })
    }
}

impl KeyAuthority for ServerBridge {
    type Error = RpcError;

    async fn check_key(&self, vehicle: VehicleRecordId) -> Result<bool, RpcError> {
        let result = self.call(RpcRequest::HasKey { vehicle }).await;
        if let Err(e) = &result {
            warn!(vehicle = %vehicle, "Key check round-trip failed: {e}");
        }
        result
    }
}
