use picopay_core::ProofError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VendorError {
    #[error("unknown or closed channel")]
    UnknownOrClosedChannel,

    #[error(transparent)]
    Proof(#[from] ProofError),

    #[error("cumulative owed amount {owed} exceeds channel amount {amount}")]
    Overspend { owed: u64, amount: u64 },

    #[error("payment index must be increasing: got {index}, latest accepted {latest}")]
    NonMonotonic { index: u64, latest: u64 },

    #[error("duplicate payment for index {index} with a different proof")]
    DuplicateConflict { index: u64 },

    #[error("no payments received on this channel")]
    NoPaymentsReceived,

    #[error("issuer rejected the request: {0}")]
    IssuerRejected(String),

    #[error("issuer unreachable: {0}")]
    Transport(String),

    #[error("channel metadata from issuer is unusable: {0}")]
    BadChannelMetadata(String),

    #[error("stored payment state is corrupt: {0}")]
    CorruptState(String),
}
