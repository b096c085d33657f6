//! Cross-chain message envelope and its fixed-layout binary codec
//!
//! Every message exchanged between domains is a fixed 116-byte header
//! followed by an opaque, variable-length body. The encoding carries no
//! internal length prefix for the body: the body is everything after the
//! header, which is unambiguous because all header fields are fixed-width.
//!
//! # Format
//!
//! - version: uint32 (4 bytes)
//! - sourceDomain: uint32 (4 bytes)
//! - destinationDomain: uint32 (4 bytes)
//! - nonce: uint64 (8 bytes)
//! - sender: bytes32 (32 bytes) - module identifier of the sender
//! - recipient: bytes32 (32 bytes) - module identifier of the recipient
//! - destinationCaller: bytes32 (32 bytes) - authorized caller (0 = anyone)
//! - messageBody: dynamic bytes - remainder of the input
//!
//! Total fixed size: 4 + 4 + 4 + 8 + 32 + 32 + 32 = 116 bytes

use alloy_primitives::{keccak256, Bytes, FixedBytes, B256};

use crate::error::{Result, TransmitterError};

/// A cross-chain message envelope.
///
/// Messages are immutable once emitted; the only sanctioned mutation is the
/// send pipeline's replace operation, which produces a *new* message reusing
/// the original nonce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Message format version stamped by the sending transmitter
    pub version: u32,
    /// Domain the message was emitted on
    pub source_domain: u32,
    /// Domain the message must be delivered to
    pub destination_domain: u32,
    /// Per-source-domain unique nonce
    pub nonce: u64,
    /// Identifier of the sending module (derived from its type, not a key)
    pub sender: FixedBytes<32>,
    /// Identifier of the module that must acknowledge the message
    pub recipient: FixedBytes<32>,
    /// Address allowed to deliver the message (zero = anyone)
    pub destination_caller: FixedBytes<32>,
    /// Opaque payload interpreted only by the recipient module
    pub message_body: Bytes,
}

impl Message {
    /// Size of the fixed message header in bytes
    pub const HEADER_SIZE: usize = 116;

    /// Creates a new message envelope
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        version: u32,
        source_domain: u32,
        destination_domain: u32,
        nonce: u64,
        sender: FixedBytes<32>,
        recipient: FixedBytes<32>,
        destination_caller: FixedBytes<32>,
        message_body: Bytes,
    ) -> Self {
        Self {
            version,
            source_domain,
            destination_domain,
            nonce,
            sender,
            recipient,
            destination_caller,
            message_body,
        }
    }

    /// Encodes the message to its deterministic wire layout
    pub fn encode(&self) -> Bytes {
        let mut bytes = Vec::with_capacity(Self::HEADER_SIZE + self.message_body.len());

        // version (4 bytes)
        bytes.extend_from_slice(&self.version.to_be_bytes());
        // sourceDomain (4 bytes)
        bytes.extend_from_slice(&self.source_domain.to_be_bytes());
        // destinationDomain (4 bytes)
        bytes.extend_from_slice(&self.destination_domain.to_be_bytes());
        // nonce (8 bytes)
        bytes.extend_from_slice(&self.nonce.to_be_bytes());
        // sender (32 bytes)
        bytes.extend_from_slice(self.sender.as_slice());
        // recipient (32 bytes)
        bytes.extend_from_slice(self.recipient.as_slice());
        // destinationCaller (32 bytes)
        bytes.extend_from_slice(self.destination_caller.as_slice());
        // messageBody (remainder)
        bytes.extend_from_slice(&self.message_body);

        Bytes::from(bytes)
    }

    /// Decodes a message from its wire layout
    ///
    /// # Errors
    ///
    /// Returns [`TransmitterError::InvalidMessageLength`] if the input is
    /// shorter than [`Message::HEADER_SIZE`].
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < Self::HEADER_SIZE {
            return Err(TransmitterError::InvalidMessageLength {
                len: bytes.len(),
                expected: Self::HEADER_SIZE,
            });
        }

        let version = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let source_domain = u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        let destination_domain = u32::from_be_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
        let nonce = u64::from_be_bytes([
            bytes[12], bytes[13], bytes[14], bytes[15], bytes[16], bytes[17], bytes[18], bytes[19],
        ]);
        let sender = FixedBytes::from_slice(&bytes[20..52]);
        let recipient = FixedBytes::from_slice(&bytes[52..84]);
        let destination_caller = FixedBytes::from_slice(&bytes[84..116]);

        Ok(Self {
            version,
            source_domain,
            destination_domain,
            nonce,
            sender,
            recipient,
            destination_caller,
            message_body: Bytes::copy_from_slice(&bytes[Self::HEADER_SIZE..]),
        })
    }

    /// The keccak256 digest of the encoded message, i.e. the value attesters
    /// sign.
    pub fn digest(&self) -> B256 {
        keccak256(self.encode())
    }

    /// Returns true when any caller may deliver this message on the
    /// destination domain.
    pub fn is_caller_unrestricted(&self) -> bool {
        self.destination_caller == FixedBytes::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn sample(body: &[u8]) -> Message {
        Message::new(
            0,
            0,
            1,
            42,
            FixedBytes::from([0x11u8; 32]),
            FixedBytes::from([0x22u8; 32]),
            FixedBytes::ZERO,
            Bytes::copy_from_slice(body),
        )
    }

    #[test]
    fn test_header_size() {
        assert_eq!(Message::HEADER_SIZE, 116);
        let encoded = sample(&[]).encode();
        assert_eq!(encoded.len(), Message::HEADER_SIZE);
    }

    #[rstest]
    #[case::empty(&[])]
    #[case::short(&[0x12, 0x34])]
    #[case::longer(&[0xde; 300])]
    fn test_encode_decode_roundtrip(#[case] body: &[u8]) {
        let message = sample(body);
        let decoded = Message::decode(&message.encode()).expect("should decode");
        assert_eq!(message, decoded);
    }

    #[test]
    fn test_decode_too_short() {
        let err = Message::decode(&[0u8; 115]).unwrap_err();
        assert!(matches!(
            err,
            TransmitterError::InvalidMessageLength {
                len: 115,
                expected: 116
            }
        ));
    }

    #[test]
    fn test_field_layout() {
        let message = sample(&[0x12, 0x34]);
        let encoded = message.encode();

        assert_eq!(&encoded[0..4], &0u32.to_be_bytes()[..]);
        assert_eq!(&encoded[8..12], &1u32.to_be_bytes()[..]);
        assert_eq!(&encoded[12..20], &42u64.to_be_bytes()[..]);
        assert_eq!(&encoded[20..52], &[0x11u8; 32][..]);
        assert_eq!(&encoded[52..84], &[0x22u8; 32][..]);
        assert_eq!(&encoded[84..116], &[0u8; 32][..]);
        assert_eq!(&encoded[116..], &[0x12, 0x34][..]);
    }

    #[test]
    fn test_digest_matches_keccak_of_encoding() {
        let message = sample(&[1, 2, 3]);
        assert_eq!(message.digest(), keccak256(message.encode()));
    }

    #[test]
    fn test_caller_restriction() {
        let mut message = sample(&[]);
        assert!(message.is_caller_unrestricted());
        message.destination_caller = FixedBytes::from([0xAAu8; 32]);
        assert!(!message.is_caller_unrestricted());
    }
}
