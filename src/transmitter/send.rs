//! Outbound message pipeline
//!
//! Builds, validates, and emits messages. The sender identifier is derived
//! from the calling module's capability type, never from a user key, so the
//! transmitter needs no allow-list of senders. Replacement re-verifies the
//! original attestation and reuses the original nonce: delivery of any one
//! variant permanently invalidates all others.

use alloy_primitives::{Bytes, FixedBytes};
use tracing::info;

use crate::auth::{auth_caller_identifier, MessageAuthenticator};
use crate::error::{Result, TransmitterError};
use crate::events::TransmitterEvent;
use crate::message::Message;
use crate::{attestation, spans};

use super::MessageTransmitter;

impl MessageTransmitter {
    /// Sends a message deliverable by any caller on the destination domain.
    ///
    /// The returned [`Message`] is also emitted as a
    /// [`TransmitterEvent::MessageSent`] event for off-chain attesters.
    ///
    /// # Errors
    ///
    /// Fails when the transmitter is paused, the active version is
    /// incompatible, the authenticator has no module identity, the body
    /// exceeds the configured maximum, or the recipient is zero.
    pub fn send_message<A: MessageAuthenticator>(
        &mut self,
        _auth: &A,
        destination_domain: u32,
        recipient: FixedBytes<32>,
        message_body: Bytes,
    ) -> Result<Message> {
        let span = spans::send_message(self.local_domain(), destination_domain);
        let _guard = span.enter();

        self.ensure_not_paused()?;
        self.ensure_version_compatible()?;

        let sender = auth_caller_identifier::<A>()?;
        self.emit_outbound(
            sender,
            destination_domain,
            recipient,
            FixedBytes::ZERO,
            message_body,
            None,
        )
    }

    /// Sends a message only `destination_caller` may deliver.
    ///
    /// # Errors
    ///
    /// Like [`Self::send_message`], plus
    /// [`TransmitterError::InvalidDestinationCaller`] when the caller
    /// restriction is zero (use [`Self::send_message`] for unrestricted
    /// delivery).
    pub fn send_message_with_caller<A: MessageAuthenticator>(
        &mut self,
        _auth: &A,
        destination_domain: u32,
        recipient: FixedBytes<32>,
        destination_caller: FixedBytes<32>,
        message_body: Bytes,
    ) -> Result<Message> {
        let span = spans::send_message(self.local_domain(), destination_domain);
        let _guard = span.enter();

        self.ensure_not_paused()?;
        self.ensure_version_compatible()?;

        if destination_caller == FixedBytes::ZERO {
            return Err(TransmitterError::InvalidDestinationCaller);
        }

        let sender = auth_caller_identifier::<A>()?;
        self.emit_outbound(
            sender,
            destination_domain,
            recipient,
            destination_caller,
            message_body,
            None,
        )
    }

    /// Replaces a previously sent, attested message.
    ///
    /// The original attestation is re-verified against the *current*
    /// attester configuration; this proves the original was legitimately
    /// attested, not that it was delivered. The replacement reuses the
    /// original nonce and is stamped with the current message version.
    /// `None` overrides default to the original's values. Both original and
    /// replacement stay deliverable until one of them is received.
    ///
    /// # Errors
    ///
    /// Fails when paused or version-incompatible, when the original does
    /// not verify or decode, with
    /// [`TransmitterError::IncorrectSourceDomain`] when the original was
    /// not sent from this domain, and with
    /// [`TransmitterError::NotOriginalSender`] when the authenticator's
    /// identity differs from the original `sender`.
    pub fn replace_message<A: MessageAuthenticator>(
        &mut self,
        _auth: &A,
        original_message: &[u8],
        original_attestation: &[u8],
        new_message_body: Option<Bytes>,
        new_destination_caller: Option<FixedBytes<32>>,
    ) -> Result<Message> {
        let span = spans::replace_message(self.local_domain());
        let _guard = span.enter();

        self.ensure_not_paused()?;
        self.ensure_version_compatible()?;

        attestation::verify_attestation_signatures(
            original_message,
            original_attestation,
            self.attesters(),
            self.signature_threshold(),
        )?;

        let original = Message::decode(original_message)?;
        if original.source_domain != self.local_domain() {
            return Err(TransmitterError::IncorrectSourceDomain {
                expected: self.local_domain(),
                actual: original.source_domain,
            });
        }

        let sender = auth_caller_identifier::<A>()?;
        if sender != original.sender {
            return Err(TransmitterError::NotOriginalSender);
        }

        let message_body = new_message_body.unwrap_or(original.message_body);
        let destination_caller = new_destination_caller.unwrap_or(original.destination_caller);

        self.emit_outbound(
            sender,
            original.destination_domain,
            original.recipient,
            destination_caller,
            message_body,
            Some(original.nonce),
        )
    }

    /// Shared tail of the send paths: validates the envelope, assigns the
    /// nonce, emits the event, returns the message.
    fn emit_outbound(
        &mut self,
        sender: FixedBytes<32>,
        destination_domain: u32,
        recipient: FixedBytes<32>,
        destination_caller: FixedBytes<32>,
        message_body: Bytes,
        reuse_nonce: Option<u64>,
    ) -> Result<Message> {
        if message_body.len() > self.max_message_body_size() {
            return Err(TransmitterError::MessageBodyTooLarge {
                len: message_body.len(),
                max: self.max_message_body_size(),
            });
        }
        if recipient == FixedBytes::ZERO {
            return Err(TransmitterError::InvalidRecipient);
        }

        let nonce = match reuse_nonce {
            Some(nonce) => nonce,
            None => self.reserve_nonce(),
        };

        let message = Message::new(
            self.message_version(),
            self.local_domain(),
            destination_domain,
            nonce,
            sender,
            recipient,
            destination_caller,
            message_body,
        );

        let encoded = message.encode();
        info!(
            nonce,
            destination_domain,
            replacement = reuse_nonce.is_some(),
            message_length_bytes = encoded.len(),
            event = "message_sent"
        );
        self.emit(TransmitterEvent::MessageSent { message: encoded });

        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transmitter::TransmitterConfig;
    use alloy_primitives::{keccak256, B256};
    use alloy_signer::SignerSync;
    use alloy_signer_local::PrivateKeySigner;

    struct SourceModuleAuth;
    impl MessageAuthenticator for SourceModuleAuth {}

    struct OtherModuleAuth;
    impl MessageAuthenticator for OtherModuleAuth {}

    fn attester() -> PrivateKeySigner {
        PrivateKeySigner::from_bytes(&B256::from([1u8; 32])).unwrap()
    }

    fn transmitter(local_domain: u32) -> MessageTransmitter {
        let config = TransmitterConfig::builder()
            .local_domain(local_domain)
            .signature_threshold(1)
            .attesters(vec![attester().address()])
            .build();
        MessageTransmitter::new(config).unwrap()
    }

    fn attest(message: &[u8]) -> Vec<u8> {
        attester()
            .sign_hash_sync(&keccak256(message))
            .unwrap()
            .as_bytes()
            .to_vec()
    }

    fn recipient() -> FixedBytes<32> {
        FixedBytes::from([0x22u8; 32])
    }

    #[test]
    fn test_send_assigns_increasing_nonces() {
        let mut transmitter = transmitter(0);
        let body = Bytes::from(vec![0x12, 0x34]);

        let first = transmitter
            .send_message(&SourceModuleAuth, 1, recipient(), body.clone())
            .unwrap();
        let second = transmitter
            .send_message(&SourceModuleAuth, 1, recipient(), body)
            .unwrap();

        assert_eq!(first.nonce, 0);
        assert_eq!(second.nonce, 1);
        assert_eq!(transmitter.next_available_nonce(), 2);
    }

    #[test]
    fn test_send_stamps_sender_identity_and_emits() {
        let mut transmitter = transmitter(0);
        let message = transmitter
            .send_message(&SourceModuleAuth, 1, recipient(), Bytes::from(vec![0x12]))
            .unwrap();

        assert_eq!(
            message.sender,
            auth_caller_identifier::<SourceModuleAuth>().unwrap()
        );
        assert_eq!(message.destination_caller, FixedBytes::ZERO);

        let events = transmitter.events();
        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0],
            TransmitterEvent::MessageSent {
                message: message.encode()
            }
        );
    }

    #[test]
    fn test_send_rejects_oversized_body() {
        let mut transmitter = transmitter(0);
        transmitter.set_max_message_body_size(4);

        let err = transmitter
            .send_message(
                &SourceModuleAuth,
                1,
                recipient(),
                Bytes::from(vec![0u8; 5]),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            TransmitterError::MessageBodyTooLarge { len: 5, max: 4 }
        ));
        // Failed sends must not burn a nonce.
        assert_eq!(transmitter.next_available_nonce(), 0);
    }

    #[test]
    fn test_send_rejects_zero_recipient() {
        let mut transmitter = transmitter(0);
        let err = transmitter
            .send_message(&SourceModuleAuth, 1, FixedBytes::ZERO, Bytes::new())
            .unwrap_err();
        assert!(matches!(err, TransmitterError::InvalidRecipient));
    }

    #[test]
    fn test_send_rejected_while_paused() {
        let mut transmitter = transmitter(0);
        transmitter.pause();
        let err = transmitter
            .send_message(&SourceModuleAuth, 1, recipient(), Bytes::new())
            .unwrap_err();
        assert!(matches!(err, TransmitterError::Paused));
    }

    #[test]
    fn test_send_with_caller_rejects_zero_restriction() {
        let mut transmitter = transmitter(0);
        let err = transmitter
            .send_message_with_caller(
                &SourceModuleAuth,
                1,
                recipient(),
                FixedBytes::ZERO,
                Bytes::new(),
            )
            .unwrap_err();
        assert!(matches!(err, TransmitterError::InvalidDestinationCaller));
    }

    #[test]
    fn test_send_with_caller_sets_restriction() {
        let mut transmitter = transmitter(0);
        let caller = FixedBytes::from([0xAAu8; 32]);
        let message = transmitter
            .send_message_with_caller(&SourceModuleAuth, 1, recipient(), caller, Bytes::new())
            .unwrap();
        assert_eq!(message.destination_caller, caller);
    }

    #[test]
    fn test_replace_reuses_nonce_with_overrides() {
        let mut transmitter = transmitter(0);
        let original = transmitter
            .send_message(&SourceModuleAuth, 1, recipient(), Bytes::from(vec![0x01]))
            .unwrap();
        let original_bytes = original.encode();

        let replacement = transmitter
            .replace_message(
                &SourceModuleAuth,
                &original_bytes,
                &attest(&original_bytes),
                Some(Bytes::from(vec![0x02, 0x03])),
                None,
            )
            .unwrap();

        assert_eq!(replacement.nonce, original.nonce);
        assert_eq!(replacement.message_body, Bytes::from(vec![0x02, 0x03]));
        assert_eq!(replacement.destination_caller, original.destination_caller);
        assert_eq!(replacement.recipient, original.recipient);
        // The replacement did not advance the outbound counter.
        assert_eq!(transmitter.next_available_nonce(), 1);
    }

    #[test]
    fn test_replace_defaults_to_original_values() {
        let mut transmitter = transmitter(0);
        let original = transmitter
            .send_message(&SourceModuleAuth, 1, recipient(), Bytes::from(vec![0x01]))
            .unwrap();
        let original_bytes = original.encode();

        let replacement = transmitter
            .replace_message(
                &SourceModuleAuth,
                &original_bytes,
                &attest(&original_bytes),
                None,
                None,
            )
            .unwrap();

        assert_eq!(replacement, original);
    }

    #[test]
    fn test_replace_rejects_foreign_sender() {
        let mut transmitter = transmitter(0);
        let original = transmitter
            .send_message(&SourceModuleAuth, 1, recipient(), Bytes::new())
            .unwrap();
        let original_bytes = original.encode();

        let err = transmitter
            .replace_message(
                &OtherModuleAuth,
                &original_bytes,
                &attest(&original_bytes),
                None,
                None,
            )
            .unwrap_err();
        assert!(matches!(err, TransmitterError::NotOriginalSender));
    }

    #[test]
    fn test_replace_rejects_foreign_source_domain() {
        let mut source = transmitter(0);
        let original = source
            .send_message(&SourceModuleAuth, 1, recipient(), Bytes::new())
            .unwrap();
        let original_bytes = original.encode();

        // A transmitter on a different domain cannot replace it.
        let mut other = transmitter(5);
        let err = other
            .replace_message(
                &SourceModuleAuth,
                &original_bytes,
                &attest(&original_bytes),
                None,
                None,
            )
            .unwrap_err();
        assert!(matches!(
            err,
            TransmitterError::IncorrectSourceDomain {
                expected: 5,
                actual: 0
            }
        ));
    }

    #[test]
    fn test_replace_rejects_unattested_original() {
        let mut transmitter = transmitter(0);
        let original = transmitter
            .send_message(&SourceModuleAuth, 1, recipient(), Bytes::new())
            .unwrap();
        let original_bytes = original.encode();

        let mut forged = attest(&original_bytes);
        forged[3] ^= 0xFF;

        let result = transmitter.replace_message(
            &SourceModuleAuth,
            &original_bytes,
            &forged,
            None,
            None,
        );
        assert!(result.is_err());
    }
}
