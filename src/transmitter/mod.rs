//! The message transmitter engine
//!
//! [`MessageTransmitter`] owns all shared protocol state: the domain and
//! version constants, the pause flag, the enabled-attester set and
//! signature threshold, the nonce registry, and the emitted-event log. The
//! host ledger serializes calls into the engine, so mutating operations
//! simply take `&mut self`; there is no internal locking.
//!
//! The send pipeline lives in [`send`], the receive pipeline and its
//! receipt handshake in [`receive`].

mod receive;
mod send;

pub use receive::{Receipt, StampedReceipt};

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};

use alloy_primitives::Address;
use bon::Builder;
use tracing::info;

use crate::error::{Result, TransmitterError};
use crate::events::TransmitterEvent;
use crate::nonce::NonceRegistry;

/// Default cap on the opaque message body, in bytes.
pub const DEFAULT_MAX_MESSAGE_BODY_SIZE: usize = 8192;

/// Source of per-instance identities; see [`MessageTransmitter::new`].
static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(0);

/// Initial configuration for a [`MessageTransmitter`].
///
/// # Example
///
/// ```rust
/// use cctp_transmitter::TransmitterConfig;
/// use alloy_primitives::Address;
///
/// let config = TransmitterConfig::builder()
///     .local_domain(0)
///     .signature_threshold(1)
///     .attesters(vec![Address::from([1u8; 20])])
///     .build();
/// assert_eq!(config.message_version, 0);
/// ```
#[derive(Builder, Clone, Debug)]
pub struct TransmitterConfig {
    /// Domain identifier of the chain this transmitter runs on
    pub local_domain: u32,
    /// Version stamped into outbound messages and required of inbound ones
    #[builder(default = 0)]
    pub message_version: u32,
    /// Maximum accepted `message_body` length in bytes
    #[builder(default = DEFAULT_MAX_MESSAGE_BODY_SIZE)]
    pub max_message_body_size: usize,
    /// Number of attester signatures an attestation must carry
    pub signature_threshold: u32,
    /// Initially enabled attesters (duplicates are collapsed)
    pub attesters: Vec<Address>,
}

/// The attested cross-chain message transmission engine.
///
/// One instance per (chain, deployment). All protocol operations go through
/// this type; nothing mutates the registry or configuration directly.
#[derive(Debug)]
pub struct MessageTransmitter {
    /// Unforgeable identity of this instance, snapshotted into every
    /// receipt it mints so no other engine can stamp or complete them
    instance_id: u64,
    local_domain: u32,
    message_version: u32,
    max_message_body_size: usize,
    signature_threshold: u32,
    attesters: BTreeSet<Address>,
    paused: bool,
    version: u32,
    compatible_versions: BTreeSet<u32>,
    nonces: NonceRegistry,
    events: Vec<TransmitterEvent>,
}

impl MessageTransmitter {
    /// Protocol version of this engine build. New instances start active at
    /// this version with a compatible set of exactly `{VERSION}`; staged
    /// upgrades widen the set before migrating the active version.
    pub const VERSION: u32 = 1;

    /// Creates an engine from its initial configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TransmitterError::InvalidSignatureThreshold`] when the
    /// threshold is zero or exceeds the number of distinct attesters.
    pub fn new(config: TransmitterConfig) -> Result<Self> {
        let attesters: BTreeSet<Address> = config.attesters.into_iter().collect();
        if config.signature_threshold == 0
            || config.signature_threshold as usize > attesters.len()
        {
            return Err(TransmitterError::InvalidSignatureThreshold {
                threshold: config.signature_threshold,
                enabled: attesters.len(),
            });
        }

        info!(
            local_domain = config.local_domain,
            message_version = config.message_version,
            attesters = attesters.len(),
            signature_threshold = config.signature_threshold,
            event = "transmitter_initialized"
        );

        Ok(Self {
            instance_id: NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed),
            local_domain: config.local_domain,
            message_version: config.message_version,
            max_message_body_size: config.max_message_body_size,
            signature_threshold: config.signature_threshold,
            attesters,
            paused: false,
            version: Self::VERSION,
            compatible_versions: BTreeSet::from([Self::VERSION]),
            nonces: NonceRegistry::new(),
            events: Vec::new(),
        })
    }

    /// Domain identifier of the chain this transmitter runs on
    pub fn local_domain(&self) -> u32 {
        self.local_domain
    }

    /// Version stamped into outbound messages
    pub fn message_version(&self) -> u32 {
        self.message_version
    }

    /// Maximum accepted message body length in bytes
    pub fn max_message_body_size(&self) -> usize {
        self.max_message_body_size
    }

    /// Current signature threshold
    pub fn signature_threshold(&self) -> u32 {
        self.signature_threshold
    }

    /// Currently enabled attesters, in address order
    pub fn attesters(&self) -> &BTreeSet<Address> {
        &self.attesters
    }

    /// Whether the transmitter is paused
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Active protocol version of this instance
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Protocol versions currently allowed to operate
    pub fn compatible_versions(&self) -> &BTreeSet<u32> {
        &self.compatible_versions
    }

    /// Nonce the next outbound message will be assigned
    pub fn next_available_nonce(&self) -> u64 {
        self.nonces.next_available()
    }

    /// Whether an inbound `(source_domain, nonce)` pair has been consumed
    pub fn is_nonce_used(&self, source_domain: u32, nonce: u64) -> bool {
        self.nonces.is_used(source_domain, nonce)
    }

    /// Events emitted since construction or the last [`Self::drain_events`]
    pub fn events(&self) -> &[TransmitterEvent] {
        &self.events
    }

    /// Removes and returns all pending events, oldest first
    pub fn drain_events(&mut self) -> Vec<TransmitterEvent> {
        std::mem::take(&mut self.events)
    }

    // ------------------------------------------------------------------
    // Administrative operations
    // ------------------------------------------------------------------

    /// Pauses all send and receive traffic.
    pub fn pause(&mut self) {
        self.paused = true;
        info!(event = "transmitter_paused");
    }

    /// Resumes send and receive traffic.
    pub fn unpause(&mut self) {
        self.paused = false;
        info!(event = "transmitter_unpaused");
    }

    /// Adds an attester to the enabled set.
    ///
    /// # Errors
    ///
    /// Returns [`TransmitterError::AttesterAlreadyEnabled`] on duplicates.
    pub fn enable_attester(&mut self, attester: Address) -> Result<()> {
        if !self.attesters.insert(attester) {
            return Err(TransmitterError::AttesterAlreadyEnabled { address: attester });
        }
        info!(attester = %attester, event = "attester_enabled");
        Ok(())
    }

    /// Removes an attester from the enabled set.
    ///
    /// # Errors
    ///
    /// Returns [`TransmitterError::AttesterNotFound`] when the address is
    /// not enabled, and [`TransmitterError::TooFewEnabledAttesters`] when
    /// removal would leave fewer attesters than the signature threshold.
    pub fn disable_attester(&mut self, attester: Address) -> Result<()> {
        if !self.attesters.contains(&attester) {
            return Err(TransmitterError::AttesterNotFound { address: attester });
        }
        let remaining = self.attesters.len() - 1;
        if remaining < self.signature_threshold as usize {
            return Err(TransmitterError::TooFewEnabledAttesters {
                remaining,
                threshold: self.signature_threshold,
            });
        }
        self.attesters.remove(&attester);
        info!(attester = %attester, event = "attester_disabled");
        Ok(())
    }

    /// Changes the signature threshold.
    ///
    /// In-flight attestations signed under the previous threshold become
    /// invalid immediately; verification never snapshots.
    ///
    /// # Errors
    ///
    /// Returns [`TransmitterError::InvalidSignatureThreshold`] when the new
    /// threshold is zero or exceeds the enabled-attester count.
    pub fn set_signature_threshold(&mut self, threshold: u32) -> Result<()> {
        if threshold == 0 || threshold as usize > self.attesters.len() {
            return Err(TransmitterError::InvalidSignatureThreshold {
                threshold,
                enabled: self.attesters.len(),
            });
        }
        self.signature_threshold = threshold;
        info!(threshold, event = "signature_threshold_updated");
        Ok(())
    }

    /// Changes the maximum accepted message body length.
    pub fn set_max_message_body_size(&mut self, size: usize) {
        self.max_message_body_size = size;
        info!(size, event = "max_message_body_size_updated");
    }

    /// Marks a protocol version as compatible, the first step of a staged
    /// upgrade.
    pub fn add_compatible_version(&mut self, version: u32) {
        self.compatible_versions.insert(version);
        info!(version, event = "compatible_version_added");
    }

    /// Withdraws compatibility from a protocol version.
    ///
    /// # Errors
    ///
    /// Returns [`TransmitterError::CannotRemoveLastVersion`] when the set
    /// would become empty.
    pub fn remove_compatible_version(&mut self, version: u32) -> Result<()> {
        if self.compatible_versions.len() == 1 && self.compatible_versions.contains(&version) {
            return Err(TransmitterError::CannotRemoveLastVersion);
        }
        self.compatible_versions.remove(&version);
        info!(version, event = "compatible_version_removed");
        Ok(())
    }

    /// Moves the active protocol version, completing a staged upgrade.
    ///
    /// Receipts minted under the previous version can no longer be stamped
    /// or completed afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`TransmitterError::IncompatibleVersion`] when the target
    /// version is not in the compatible set.
    pub fn migrate_to_version(&mut self, version: u32) -> Result<()> {
        if !self.compatible_versions.contains(&version) {
            return Err(TransmitterError::IncompatibleVersion { version });
        }
        let previous = self.version;
        self.version = version;
        info!(previous, version, event = "protocol_version_migrated");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Shared operation guards
    // ------------------------------------------------------------------

    pub(crate) fn instance_id(&self) -> u64 {
        self.instance_id
    }

    pub(crate) fn ensure_not_paused(&self) -> Result<()> {
        if self.paused {
            return Err(TransmitterError::Paused);
        }
        Ok(())
    }

    pub(crate) fn ensure_version_compatible(&self) -> Result<()> {
        if !self.compatible_versions.contains(&self.version) {
            return Err(TransmitterError::IncompatibleVersion {
                version: self.version,
            });
        }
        Ok(())
    }

    pub(crate) fn reserve_nonce(&mut self) -> u64 {
        self.nonces.reserve_and_increment()
    }

    pub(crate) fn consume_nonce(&mut self, source_domain: u32, nonce: u64) -> Result<()> {
        self.nonces.consume(source_domain, nonce)
    }

    pub(crate) fn emit(&mut self, event: TransmitterEvent) {
        self.events.push(event);
    }
}
