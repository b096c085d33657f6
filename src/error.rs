use alloy_primitives::Address;
use thiserror::Error;

/// Errors surfaced by the message transmission engine.
///
/// Every failure is fatal for the operation that raised it: no state mutated
/// before the failure point survives, and nothing is retried internally. The
/// host execution environment is expected to turn a returned error into a
/// full abort of the surrounding atomic unit.
#[derive(Error, Debug)]
pub enum TransmitterError {
    #[error("message transmitter is paused")]
    Paused,

    #[error("protocol version {version} is not in the compatible-version set")]
    IncompatibleVersion { version: u32 },

    #[error("message is {len} bytes, the fixed header requires {expected}")]
    InvalidMessageLength { len: usize, expected: usize },

    #[error("message body is {len} bytes, maximum is {max}")]
    MessageBodyTooLarge { len: usize, max: usize },

    #[error("message recipient must be non-zero")]
    InvalidRecipient,

    #[error("invalid destination caller for this message")]
    InvalidDestinationCaller,

    #[error("message destined for domain {actual}, local domain is {expected}")]
    InvalidDestinationDomain { expected: u32, actual: u32 },

    #[error("message version {actual} does not match configured version {expected}")]
    InvalidMessageVersion { expected: u32, actual: u32 },

    #[error(
        "attestation is {len} bytes, expected {expected} for signature threshold {threshold}"
    )]
    InvalidAttestationLength {
        len: usize,
        expected: usize,
        threshold: u32,
    },

    #[error("attestation signatures are not in strictly increasing signer order")]
    InvalidSignatureOrder,

    #[error("recovered signer {address} is not an enabled attester")]
    InvalidAttesterAddress { address: Address },

    #[error("signature recovery failed: {0}")]
    SignatureRecovery(#[from] alloy_primitives::SignatureError),

    #[error("authenticator does not resolve to a module-qualified identity")]
    InvalidAuth,

    #[error("authenticator is not the original sender of the message")]
    NotOriginalSender,

    #[error("message originated on domain {actual}, local domain is {expected}")]
    IncorrectSourceDomain { expected: u32, actual: u32 },

    #[error("nonce {nonce} from source domain {source_domain} has already been used")]
    NonceAlreadyUsed { source_domain: u32, nonce: u64 },

    #[error("receipt was minted under protocol version {receipt}, engine is at {current}")]
    InvalidReceiptVersion { receipt: u32, current: u32 },

    #[error("receipt was minted by a different transmitter instance")]
    ForeignReceipt,

    #[error("identity proof does not match the designated recipient")]
    RecipientNotAuthorized,

    #[error("attester {address} is already enabled")]
    AttesterAlreadyEnabled { address: Address },

    #[error("attester {address} is not enabled")]
    AttesterNotFound { address: Address },

    #[error("disabling would leave {remaining} attesters, signature threshold is {threshold}")]
    TooFewEnabledAttesters { remaining: usize, threshold: u32 },

    #[error("invalid signature threshold {threshold} for {enabled} enabled attesters")]
    InvalidSignatureThreshold { threshold: u32, enabled: usize },

    #[error("compatible-version set cannot be emptied")]
    CannotRemoveLastVersion,
}

pub type Result<T> = std::result::Result<T, TransmitterError>;
