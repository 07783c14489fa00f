use picopay_core::ProofError;
use picopay_store::StoreError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IssuerError {
    #[error(transparent)]
    Proof(#[from] ProofError),

    #[error("insufficient funds: balance {balance}, requested {amount}")]
    InsufficientFunds { balance: u64, amount: u64 },

    #[error("account not found")]
    AccountNotFound,

    #[error("channel not found")]
    ChannelNotFound,

    #[error("channel id collision, retry the open request")]
    DuplicateChannel,

    #[error("invalid settlement proof: {0}")]
    InvalidSettlementProof(String),

    #[error("invalid request: {0}")]
    Validation(String),
}

impl From<StoreError> for IssuerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::AccountNotFound => IssuerError::AccountNotFound,
            StoreError::ChannelNotFound => IssuerError::ChannelNotFound,
            StoreError::DuplicateChannel => IssuerError::DuplicateChannel,
            StoreError::InsufficientFunds { balance, amount } => {
                IssuerError::InsufficientFunds { balance, amount }
            }
            StoreError::SettlementOutOfBounds { owed, amount } => {
                IssuerError::InvalidSettlementProof(format!(
                    "settled amount {owed} outside (0, {amount}]"
                ))
            }
        }
    }
}
