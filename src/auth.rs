//! Capability-based module identity
//!
//! Senders and recipients are identified by the keccak256 hash of the
//! fully-qualified type name of a capability value only their module can
//! construct. Binding identity to a type rather than a key means the
//! transmitter needs no registry of allowed senders: possession of the
//! capability type *is* the credential. The same derivation is used on both
//! sides of a transfer, to stamp `sender` into outbound messages and to
//! prove recipient identity when acknowledging an inbound receipt.

use alloy_primitives::{keccak256, FixedBytes};
use crate::error::{Result, TransmitterError};

/// Marker for types that act as a module's transmitter capability.
///
/// Implement this on a private unit struct inside the module that sends or
/// receives messages, and keep its constructor private. Any code able to
/// produce a value of the type can speak for the module.
///
/// # Example
///
/// ```rust
/// use cctp_transmitter::{auth_caller_identifier, MessageAuthenticator};
///
/// struct TreasuryAuth;
/// impl MessageAuthenticator for TreasuryAuth {}
///
/// let id = auth_caller_identifier::<TreasuryAuth>().unwrap();
/// assert_ne!(id, alloy_primitives::FixedBytes::ZERO);
/// ```
pub trait MessageAuthenticator {}

/// Derives the 32-byte module identifier for an authenticator type.
///
/// # Errors
///
/// Returns [`TransmitterError::InvalidAuth`] when the type name does not
/// resolve to a module-qualified path, i.e. the type is not declared inside
/// a module that can vouch for it.
pub fn auth_caller_identifier<A: MessageAuthenticator>() -> Result<FixedBytes<32>> {
    let type_name = std::any::type_name::<A>();
    if !type_name.contains("::") {
        return Err(TransmitterError::InvalidAuth);
    }
    Ok(keccak256(type_name.as_bytes()))
}
