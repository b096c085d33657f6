//! Externally observable transmitter events
//!
//! The host ledger is expected to publish these; the engine appends them to
//! an in-memory log that the embedding runtime reads out after each atomic
//! unit of work. Payloads are serde-serializable so hosts can ship them in
//! whatever envelope their event stream uses.

use alloy_primitives::{Bytes, FixedBytes};
use serde::Serialize;

/// An event emitted by the message transmitter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TransmitterEvent {
    /// Emitted on every successful send or replace. The payload is the full
    /// encoded message; off-chain attesters observe and sign its digest.
    MessageSent {
        /// Encoded message bytes, per the wire layout in [`crate::Message`]
        message: Bytes,
    },

    /// Emitted exactly once per successfully completed receive handshake.
    MessageReceived {
        /// Address that delivered the message
        caller: FixedBytes<32>,
        /// Domain the message originated on
        source_domain: u32,
        /// The now permanently consumed nonce
        nonce: u64,
        /// Identifier of the sending module
        sender: FixedBytes<32>,
        /// Opaque payload that was handed to the recipient module
        message_body: Bytes,
    },
}
