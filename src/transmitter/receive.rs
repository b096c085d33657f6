//! Inbound message pipeline and the receipt handshake
//!
//! Receiving is split into three phases so the transmitter can delegate
//! value-specific work (minting) to an arbitrary recipient module while
//! still guaranteeing authenticated, single-recipient, exactly-once
//! completion:
//!
//! 1. [`MessageTransmitter::receive_message`] validates the message and
//!    attestation, consumes the nonce, and mints an unstamped [`Receipt`].
//! 2. [`MessageTransmitter::stamp_receipt`] lets the designated recipient
//!    module, and only it, acknowledge the receipt after acting on the
//!    body.
//! 3. [`MessageTransmitter::complete_receive_message`] emits the single
//!    `MessageReceived` event and destroys the tokens.
//!
//! Receipts are deliberately neither `Clone` nor `Copy` and every phase
//! takes them by value, so the type system enforces the consume-exactly-
//! once ("hot potato") discipline. The nonce is consumed in phase 1; a
//! handshake abandoned after that point wastes the nonce but can never
//! double-trigger the recipient's side effect.

use alloy_primitives::{Bytes, FixedBytes};
use tracing::info;

use crate::auth::{auth_caller_identifier, MessageAuthenticator};
use crate::error::{Result, TransmitterError};
use crate::events::TransmitterEvent;
use crate::message::Message;
use crate::{attestation, spans};

use super::MessageTransmitter;

/// Unstamped proof that a message was authentically delivered.
///
/// Only valid for the remainder of the current atomic unit of work; it
/// cannot be cloned or stored and must be passed to
/// [`MessageTransmitter::stamp_receipt`] exactly once, on the same engine
/// that minted it.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a receipt must be stamped and completed within the same atomic unit"]
pub struct Receipt {
    caller: FixedBytes<32>,
    recipient: FixedBytes<32>,
    source_domain: u32,
    sender: FixedBytes<32>,
    nonce: u64,
    message_body: Bytes,
    /// Engine protocol version at mint time; stamping and completion
    /// reject receipts that straddle a version migration.
    version: u32,
    /// Identity of the engine instance that minted this receipt; no other
    /// engine can stamp or complete it.
    engine: u64,
}

impl Receipt {
    /// Address that delivered the message
    pub fn caller(&self) -> FixedBytes<32> {
        self.caller
    }

    /// Identifier of the module that must acknowledge this receipt
    pub fn recipient(&self) -> FixedBytes<32> {
        self.recipient
    }

    /// Domain the message originated on
    pub fn source_domain(&self) -> u32 {
        self.source_domain
    }

    /// Identifier of the sending module
    pub fn sender(&self) -> FixedBytes<32> {
        self.sender
    }

    /// The consumed `(source_domain, nonce)` pair's nonce
    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    /// Opaque payload for the recipient module to act on
    pub fn message_body(&self) -> &Bytes {
        &self.message_body
    }

    /// Protocol version snapshotted when the receipt was minted
    pub fn version(&self) -> u32 {
        self.version
    }
}

/// A [`Receipt`] acknowledged by its designated recipient module.
///
/// Produced only by [`MessageTransmitter::stamp_receipt`]; consumed only by
/// [`MessageTransmitter::complete_receive_message`].
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a stamped receipt must be completed within the same atomic unit"]
pub struct StampedReceipt {
    receipt: Receipt,
}

impl StampedReceipt {
    /// The acknowledged receipt
    pub fn receipt(&self) -> &Receipt {
        &self.receipt
    }
}

impl MessageTransmitter {
    /// Validates an inbound message and mints an unstamped [`Receipt`].
    ///
    /// All validations run before the nonce is touched: a failed call
    /// never consumes a nonce, so external relayers may retry freely.
    ///
    /// `caller` is the host-provided identity of whoever invoked delivery;
    /// it is checked against the message's `destination_caller` when that
    /// field is non-zero.
    ///
    /// # Errors
    ///
    /// Fails when paused or version-incompatible, on codec or attestation
    /// errors, on destination domain / caller / message version mismatch,
    /// and with [`TransmitterError::NonceAlreadyUsed`] on replay.
    pub fn receive_message(
        &mut self,
        message: &[u8],
        attestation: &[u8],
        caller: FixedBytes<32>,
    ) -> Result<Receipt> {
        let span = spans::receive_message(self.local_domain(), &caller);
        let _guard = span.enter();

        self.ensure_not_paused()?;
        self.ensure_version_compatible()?;

        let decoded = Message::decode(message)?;
        attestation::verify_attestation_signatures(
            message,
            attestation,
            self.attesters(),
            self.signature_threshold(),
        )?;
        let message = decoded;
        if message.destination_domain != self.local_domain() {
            return Err(TransmitterError::InvalidDestinationDomain {
                expected: self.local_domain(),
                actual: message.destination_domain,
            });
        }
        if !message.is_caller_unrestricted() && message.destination_caller != caller {
            return Err(TransmitterError::InvalidDestinationCaller);
        }
        if message.version != self.message_version() {
            return Err(TransmitterError::InvalidMessageVersion {
                expected: self.message_version(),
                actual: message.version,
            });
        }

        // Sole replay guard. Everything before this line is pure.
        self.consume_nonce(message.source_domain, message.nonce)?;

        info!(
            source_domain = message.source_domain,
            nonce = message.nonce,
            event = "message_received_unstamped"
        );

        Ok(Receipt {
            caller,
            recipient: message.recipient,
            source_domain: message.source_domain,
            sender: message.sender,
            nonce: message.nonce,
            message_body: message.message_body,
            version: self.version(),
            engine: self.instance_id(),
        })
    }

    /// Acknowledges a receipt on behalf of its designated recipient module.
    ///
    /// The identity proof is the recipient module's capability type; its
    /// derived identifier must equal the `recipient` the sender designated.
    /// The recipient module is expected to have performed its own
    /// value-specific side effect (and bookkeeping) before stamping.
    ///
    /// # Errors
    ///
    /// Returns [`TransmitterError::ForeignReceipt`] when the receipt was
    /// minted by a different engine instance,
    /// [`TransmitterError::InvalidReceiptVersion`] when it predates a
    /// version migration, and
    /// [`TransmitterError::RecipientNotAuthorized`] when the proof's
    /// identity is not the designated recipient.
    pub fn stamp_receipt<A: MessageAuthenticator>(
        &self,
        receipt: Receipt,
        _recipient_proof: &A,
    ) -> Result<StampedReceipt> {
        self.ensure_version_compatible()?;
        self.ensure_receipt_origin(&receipt)?;
        self.ensure_receipt_version(&receipt)?;

        let identity = auth_caller_identifier::<A>()?;
        if identity != receipt.recipient {
            return Err(TransmitterError::RecipientNotAuthorized);
        }

        Ok(StampedReceipt { receipt })
    }

    /// Finalizes the handshake, emitting exactly one
    /// [`TransmitterEvent::MessageReceived`] event and destroying the
    /// receipt tokens.
    ///
    /// # Errors
    ///
    /// Returns [`TransmitterError::ForeignReceipt`] when the receipt was
    /// minted by a different engine instance, and
    /// [`TransmitterError::InvalidReceiptVersion`] when a version
    /// migration happened since it was minted.
    pub fn complete_receive_message(&mut self, stamped: StampedReceipt) -> Result<()> {
        self.ensure_version_compatible()?;
        self.ensure_receipt_origin(&stamped.receipt)?;
        self.ensure_receipt_version(&stamped.receipt)?;

        let Receipt {
            caller,
            source_domain,
            nonce,
            sender,
            message_body,
            ..
        } = stamped.receipt;

        info!(source_domain, nonce, event = "message_receive_completed");
        self.emit(TransmitterEvent::MessageReceived {
            caller,
            source_domain,
            nonce,
            sender,
            message_body,
        });

        Ok(())
    }

    fn ensure_receipt_origin(&self, receipt: &Receipt) -> Result<()> {
        if receipt.engine != self.instance_id() {
            return Err(TransmitterError::ForeignReceipt);
        }
        Ok(())
    }

    fn ensure_receipt_version(&self, receipt: &Receipt) -> Result<()> {
        if receipt.version != self.version() {
            return Err(TransmitterError::InvalidReceiptVersion {
                receipt: receipt.version,
                current: self.version(),
            });
        }
        Ok(())
    }
}
