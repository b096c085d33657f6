//! # cctp-transmitter
//!
//! The message transmission and attestation-verification engine for a
//! CCTP-style cross-chain burn-and-mint bridge.
//!
//! A value-bearing asset is burned on a source chain and minted on a
//! destination chain, backed by an attested message relay. This crate
//! implements the protocol core of that relay: the fixed-layout message
//! codec, threshold-signature attestation verification, per-domain replay
//! protection, and the two-phase receipt handshake that guarantees a
//! received message is authenticated and acknowledged by exactly the
//! intended recipient module before any side effect occurs. Token
//! accounting (treasuries, allowances, deny lists) belongs to recipient
//! modules and is deliberately outside this crate.
//!
//! ## Quick Start
//!
//! ```rust
//! use cctp_transmitter::{
//!     MessageAuthenticator, MessageTransmitter, TransmitterConfig,
//! };
//! use alloy_primitives::{Address, Bytes, FixedBytes};
//!
//! // The capability type of the module sending messages. Keep its
//! // constructor private in real code: possession is the credential.
//! struct TreasuryAuth;
//! impl MessageAuthenticator for TreasuryAuth {}
//!
//! # fn main() -> Result<(), cctp_transmitter::TransmitterError> {
//! let config = TransmitterConfig::builder()
//!     .local_domain(0)
//!     .signature_threshold(1)
//!     .attesters(vec![Address::from([1u8; 20])])
//!     .build();
//! let mut transmitter = MessageTransmitter::new(config)?;
//!
//! let message = transmitter.send_message(
//!     &TreasuryAuth,
//!     1,                                // destination domain
//!     FixedBytes::from([0x22u8; 32]),   // recipient module identifier
//!     Bytes::from(vec![0x12, 0x34]),    // opaque body
//! )?;
//! assert_eq!(message.nonce, 0);
//!
//! // The encoded message is also in the event log for off-chain attesters.
//! assert_eq!(transmitter.events().len(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Receive handshake
//!
//! Delivery on the destination domain is a three-step handshake invoked as
//! one atomic batch: [`MessageTransmitter::receive_message`] (validates,
//! consumes the nonce, mints a [`Receipt`]), then
//! [`MessageTransmitter::stamp_receipt`] (the designated recipient module
//! acknowledges with its capability type), then
//! [`MessageTransmitter::complete_receive_message`] (emits the single
//! completion event). Receipts are move-only values that each step consumes,
//! so a handshake cannot be forked or replayed.
//!
//! ## Public API
//!
//! - [`Message`] - the cross-chain envelope and its binary codec
//! - [`verify_attestation_signatures`] - threshold attestation checking
//! - [`MessageTransmitter`] and [`TransmitterConfig`] - the engine
//! - [`Receipt`] and [`StampedReceipt`] - the handshake tokens
//! - [`MessageAuthenticator`] and [`auth_caller_identifier`] - capability
//!   identity for senders and recipients
//! - [`TransmitterEvent`] - externally observable events
//! - [`TransmitterError`] and [`Result`] - error taxonomy

mod attestation;
mod auth;
mod error;
mod events;
mod message;
mod nonce;
mod transmitter;

pub use attestation::{verify_attestation_signatures, SIGNATURE_LENGTH};
pub use auth::{auth_caller_identifier, MessageAuthenticator};
pub use error::{Result, TransmitterError};
pub use events::TransmitterEvent;
pub use message::Message;
pub use nonce::NonceRegistry;
pub use transmitter::{
    MessageTransmitter, Receipt, StampedReceipt, TransmitterConfig,
    DEFAULT_MAX_MESSAGE_BODY_SIZE,
};

// Public module for hosts that need custom instrumentation
pub mod spans;
