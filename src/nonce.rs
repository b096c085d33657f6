//! Per-domain nonce issuance and replay ledger
//!
//! Outbound nonces are a strictly increasing local counter. Inbound nonces
//! are whatever the sending domain assigned; they are tracked per source
//! domain in a monotone used set that only ever grows. The single
//! `consume` entry point performs the check-then-mark as one logical step,
//! which is the receive pipeline's sole replay serialization point.

use std::collections::HashSet;

use tracing::debug;

use crate::error::{Result, TransmitterError};

/// Replay-prevention ledger for one transmitter instance.
#[derive(Debug, Clone, Default)]
pub struct NonceRegistry {
    next_available: u64,
    used: HashSet<(u32, u64)>,
}

impl NonceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current outbound nonce and advances the counter.
    ///
    /// Never returns the same value twice for the life of the registry.
    pub fn reserve_and_increment(&mut self) -> u64 {
        let nonce = self.next_available;
        self.next_available += 1;
        nonce
    }

    /// The nonce the next outbound message will be assigned.
    pub fn next_available(&self) -> u64 {
        self.next_available
    }

    /// Whether an inbound `(source_domain, nonce)` pair has been consumed.
    pub fn is_used(&self, source_domain: u32, nonce: u64) -> bool {
        self.used.contains(&(source_domain, nonce))
    }

    /// Marks an inbound nonce as used, failing if it already is.
    ///
    /// Check and mark happen inside one `&mut self` call, so two receives
    /// of the same nonce cannot both pass the check. Marks are permanent.
    ///
    /// # Errors
    ///
    /// Returns [`TransmitterError::NonceAlreadyUsed`] without mutating the
    /// ledger when the pair was consumed before.
    pub fn consume(&mut self, source_domain: u32, nonce: u64) -> Result<()> {
        if !self.used.insert((source_domain, nonce)) {
            return Err(TransmitterError::NonceAlreadyUsed {
                source_domain,
                nonce,
            });
        }
        debug!(source_domain, nonce, event = "nonce_consumed");
        Ok(())
    }
}
