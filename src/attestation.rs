//! Threshold attestation verification
//!
//! An attestation is the concatenation of exactly `signature_threshold`
//! 65-byte ECDSA signatures over the keccak256 digest of the encoded
//! message. Signatures must be ordered by strictly increasing recovered
//! signer address, which rules out duplicates and makes verification
//! independent of how the relayer assembled the blob.

use std::collections::BTreeSet;

use alloy_primitives::{keccak256, Address, Signature, SignatureError, B256, U256};
use tracing::debug;

use crate::error::{Result, TransmitterError};

/// Length in bytes of a single `r || s || v` signature
pub const SIGNATURE_LENGTH: usize = 65;

/// Verifies a threshold attestation over raw message bytes.
///
/// Succeeds only when the attestation carries exactly
/// `signature_threshold` signatures, each recovers to an enabled attester,
/// and recovered addresses are strictly increasing.
///
/// Verification always runs against the *current* attester set and
/// threshold. A threshold or attester change after signing invalidates
/// in-flight attestations; there is deliberately no snapshotting.
///
/// # Errors
///
/// - [`TransmitterError::InvalidAttestationLength`] when the threshold is
///   zero or the blob is not `65 * signature_threshold` bytes
/// - [`TransmitterError::SignatureRecovery`] when a chunk is not a valid
///   recoverable signature
/// - [`TransmitterError::InvalidSignatureOrder`] on out-of-order or
///   duplicate signers
/// - [`TransmitterError::InvalidAttesterAddress`] when a signer is not
///   enabled
pub fn verify_attestation_signatures(
    message: &[u8],
    attestation: &[u8],
    attesters: &BTreeSet<Address>,
    signature_threshold: u32,
) -> Result<()> {
    let expected = SIGNATURE_LENGTH * signature_threshold as usize;
    if signature_threshold == 0 || attestation.len() != expected {
        return Err(TransmitterError::InvalidAttestationLength {
            len: attestation.len(),
            expected,
            threshold: signature_threshold,
        });
    }

    let digest = keccak256(message);
    let mut previous: Option<Address> = None;

    for chunk in attestation.chunks_exact(SIGNATURE_LENGTH) {
        let signer = recover_signer(&digest, chunk)?;

        // Strict ordering doubles as duplicate rejection.
        if previous.is_some_and(|prev| prev >= signer) {
            return Err(TransmitterError::InvalidSignatureOrder);
        }
        if !attesters.contains(&signer) {
            return Err(TransmitterError::InvalidAttesterAddress { address: signer });
        }
        previous = Some(signer);
    }

    debug!(
        digest = %digest,
        signatures = signature_threshold,
        event = "attestation_verified"
    );
    Ok(())
}

/// Recovers the signer address from one 65-byte `r || s || v` chunk.
///
/// `v` is accepted in both raw parity (0/1) and Ethereum (27/28) form.
fn recover_signer(digest: &B256, chunk: &[u8]) -> Result<Address> {
    let r = U256::from_be_slice(&chunk[..32]);
    let s = U256::from_be_slice(&chunk[32..64]);
    let parity = match chunk[64] {
        0 | 27 => false,
        1 | 28 => true,
        v => {
            return Err(TransmitterError::SignatureRecovery(
                SignatureError::InvalidParity(v as u64),
            ))
        }
    };

    let signature = Signature::new(r, s, parity);
    Ok(signature.recover_address_from_prehash(digest)?)
}
