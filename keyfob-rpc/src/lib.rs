//! # keyfob-rpc: Server Bridge
//!
//! Everything the client tells the server, and the few questions it asks,
//! go through a [`ServerBridge`]:
//!   - **Events** are fire-and-forget (`vehicle:set-open`, `vehicle:set-trunk-state`, ...)
//!   - **Calls** are single-shot request/response bounded by a timeout,
//!     with no retry
//!
//! The host owns the other end of the channel ([`BridgeReceiver`]) and
//! forwards messages to the real network transport.
//!
//! ```text
//! client logic ──emit/call──▶ ServerBridge ══mpsc══▶ BridgeReceiver ──▶ network
//!                  ▲                                      │
//!                  └───────────── oneshot reply ──────────┘
//! ```

pub mod bridge;
pub mod error;
pub mod messages;

pub use bridge::{BridgeReceiver, Outbound, ServerBridge};
pub use error::RpcError;
pub use messages::{RpcRequest, ServerEvent};
