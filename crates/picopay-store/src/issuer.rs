//! Issuer-side store: the authoritative ledger.
//!
//! Accounts, channels and two channel indices (all / open-only) in
//! creation order. The balance-moving transitions — open and settle —
//! are single critical sections so a failure at any sub-step leaves
//! balances untouched.

use std::collections::HashMap;

use picopay_core::Commitment;
use tokio::sync::RwLock;

use crate::error::StoreError;

/// The issuer's record of a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelRecord {
    pub channel_id: String,
    pub client_public_key_der_b64: String,
    pub vendor_public_key_der_b64: String,
    pub amount: u64,
    pub commitment: Commitment,
    pub is_closed: bool,
    /// Settled amount credited to the vendor; 0 while open.
    pub balance: u64,
    pub salt_hex: String,
}

/// What a settlement moved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseRecord {
    pub channel_id: String,
    pub settled_balance: u64,
    pub vendor_credit: u64,
    pub client_refund: u64,
}

/// Result of a settle call distinguishing a fresh close from the
/// idempotent replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettleOutcome {
    Settled(CloseRecord),
    AlreadyClosed(CloseRecord),
}

impl SettleOutcome {
    pub fn into_record(self) -> CloseRecord {
        match self {
            SettleOutcome::Settled(record) | SettleOutcome::AlreadyClosed(record) => record,
        }
    }
}

#[derive(Default)]
struct IssuerInner {
    /// balance by public key
    accounts: HashMap<String, u64>,
    channels: HashMap<String, ChannelRecord>,
    settlements: HashMap<String, CloseRecord>,
    /// channel ids in creation order (logical sequence, not wall time)
    all_index: Vec<String>,
    open_index: Vec<String>,
}

#[derive(Default)]
pub struct IssuerStore {
    inner: RwLock<IssuerInner>,
}

impl IssuerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotent registration: create the account with
    /// `initial_balance` or return the existing balance unchanged.
    pub async fn register_account(&self, public_key: &str, initial_balance: u64) -> u64 {
        let mut inner = self.inner.write().await;
        *inner
            .accounts
            .entry(public_key.to_string())
            .or_insert(initial_balance)
    }

    pub async fn account_balance(&self, public_key: &str) -> Option<u64> {
        self.inner.read().await.accounts.get(public_key).copied()
    }

    /// Atomic open: duplicate-id check, funds check, debit, channel
    /// create and index writes commit together or not at all.
    pub async fn open_channel(&self, record: ChannelRecord) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;

        if inner.channels.contains_key(&record.channel_id) {
            return Err(StoreError::DuplicateChannel);
        }
        let balance = inner
            .accounts
            .get_mut(&record.client_public_key_der_b64)
            .ok_or(StoreError::AccountNotFound)?;
        if *balance < record.amount {
            return Err(StoreError::InsufficientFunds {
                balance: *balance,
                amount: record.amount,
            });
        }

        *balance -= record.amount;
        inner.all_index.push(record.channel_id.clone());
        inner.open_index.push(record.channel_id.clone());
        inner.channels.insert(record.channel_id.clone(), record);
        Ok(())
    }

    pub async fn get_channel(&self, channel_id: &str) -> Option<ChannelRecord> {
        self.inner.read().await.channels.get(channel_id).cloned()
    }

    /// Channels newest first, optionally open-only.
    pub async fn list_channels(&self, open_only: bool) -> Vec<ChannelRecord> {
        let inner = self.inner.read().await;
        let index = if open_only {
            &inner.open_index
        } else {
            &inner.all_index
        };
        index
            .iter()
            .rev()
            .filter_map(|id| inner.channels.get(id).cloned())
            .collect()
    }

    /// Atomic settlement, idempotent by channel id. Credits the vendor
    /// `owed`, refunds the client the remainder and closes the channel
    /// in one critical section.
    pub async fn settle_channel(
        &self,
        channel_id: &str,
        owed: u64,
    ) -> Result<SettleOutcome, StoreError> {
        let mut inner = self.inner.write().await;

        let channel = inner
            .channels
            .get(channel_id)
            .ok_or(StoreError::ChannelNotFound)?;
        if channel.is_closed {
            return inner
                .settlements
                .get(channel_id)
                .cloned()
                .map(SettleOutcome::AlreadyClosed)
                .ok_or(StoreError::ChannelNotFound);
        }
        if owed == 0 || owed > channel.amount {
            return Err(StoreError::SettlementOutOfBounds {
                owed,
                amount: channel.amount,
            });
        }

        let client = channel.client_public_key_der_b64.clone();
        let vendor = channel.vendor_public_key_der_b64.clone();
        let refund = channel.amount - owed;

        *inner.accounts.entry(vendor).or_insert(0) += owed;
        *inner.accounts.entry(client).or_insert(0) += refund;
        if let Some(channel) = inner.channels.get_mut(channel_id) {
            channel.is_closed = true;
            channel.balance = owed;
        }
        inner.open_index.retain(|id| id != channel_id);

        let record = CloseRecord {
            channel_id: channel_id.to_string(),
            settled_balance: owed,
            vendor_credit: owed,
            client_refund: refund,
        };
        inner
            .settlements
            .insert(channel_id.to_string(), record.clone());
        Ok(SettleOutcome::Settled(record))
    }
}
