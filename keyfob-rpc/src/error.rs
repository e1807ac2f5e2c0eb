//! Bridge error types.

use thiserror::Error;

/// Errors of a server round-trip.
#[derive(Debug, Error)]
pub enum RpcError {
    /// No reply before the deadline.
    #[error("RPC `{call}` timed out after {timeout_ms}ms")]
    Timeout {
        /// Wire name of the call.
        call: &'static str,
        /// Deadline that expired.
        timeout_ms: u64,
    },

    /// The host side of the bridge is gone, or dropped the reply handle.
    #[error("Server bridge closed")]
    Closed,

    /// The reply did not deserialize into the expected type.
    #[error("Malformed reply to `{call}`: {reason}")]
    Malformed {
        /// Wire name of the call.
        call: &'static str,
        /// Deserializer message.
        reason: String,
    },
}
