use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("account not found")]
    AccountNotFound,

    #[error("channel not found")]
    ChannelNotFound,

    #[error("channel id already exists")]
    DuplicateChannel,

    #[error("insufficient funds: balance {balance}, requested {amount}")]
    InsufficientFunds { balance: u64, amount: u64 },

    #[error("settlement amount {owed} outside (0, {amount}]")]
    SettlementOutOfBounds { owed: u64, amount: u64 },
}
