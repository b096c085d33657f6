//! Span helpers for transmitter operations
//!
//! Orthogonal span instrumentation: static span names, structured
//! attributes, and separation from the protocol logic. These are used
//! internally by [`MessageTransmitter`](crate::MessageTransmitter) but are
//! exposed for hosts that wrap the engine and want their own calls to show
//! up under the same span names.

use alloy_primitives::FixedBytes;
use tracing::Span;

/// Create span for the outbound send path (both restricted and
/// unrestricted-caller variants).
#[inline]
pub fn send_message(local_domain: u32, destination_domain: u32) -> Span {
    tracing::info_span!(
        "cctp_transmitter.send_message",
        local_domain,
        destination_domain,
        otel.status_code = "OK",
    )
}

/// Create span for replacing a previously attested message.
#[inline]
pub fn replace_message(local_domain: u32) -> Span {
    tracing::info_span!(
        "cctp_transmitter.replace_message",
        local_domain,
        otel.status_code = "OK",
    )
}

/// Create span for the inbound receive path.
///
/// Covers validation, nonce consumption, and receipt minting; the stamp
/// and complete phases run under the host's enclosing span.
#[inline]
pub fn receive_message(local_domain: u32, caller: &FixedBytes<32>) -> Span {
    tracing::info_span!(
        "cctp_transmitter.receive_message",
        local_domain,
        caller = %caller,
        otel.status_code = "OK",
    )
}
