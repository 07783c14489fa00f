//! Vendor-side store: channel cache plus the monotonic payment CAS.

use std::collections::HashMap;

use picopay_core::Commitment;
use tokio::sync::RwLock;

/// Channel metadata mirrored from the issuer. Advisory and rebuildable;
/// re-fetched whenever a payment arrives for an unknown channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedChannel {
    pub channel_id: String,
    pub client_public_key_der_b64: String,
    pub amount: u64,
    pub commitment: Commitment,
    pub is_closed: bool,
}

/// The latest accepted payment for a channel: the scheme index plus the
/// canonical proof bytes, kept verbatim for duplicate detection and
/// settlement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPayment {
    pub index: u64,
    pub payload: Vec<u8>,
}

/// Outcome of the atomic compare-and-set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// New or advanced; the state was written.
    Accepted,
    /// Index not greater than the stored one; stored state returned,
    /// nothing changed. The caller decides between idempotent duplicate
    /// and conflict by comparing proof bytes.
    NotNewer(StoredPayment),
    /// No such channel cached, or it is closed.
    ChannelMissing,
    /// Index exceeds the channel's bound (amount or max index).
    OutOfRange,
}

#[derive(Default)]
struct VendorInner {
    channels: HashMap<String, CachedChannel>,
    payments: HashMap<String, StoredPayment>,
}

/// In-memory vendor store. All mutating operations take the write lock
/// for their whole check-then-write sequence.
#[derive(Default)]
pub struct VendorStore {
    inner: RwLock<VendorInner>,
}

impl VendorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn cache_channel(&self, channel: CachedChannel) {
        let mut inner = self.inner.write().await;
        inner.channels.insert(channel.channel_id.clone(), channel);
    }

    pub async fn get_channel(&self, channel_id: &str) -> Option<CachedChannel> {
        self.inner.read().await.channels.get(channel_id).cloned()
    }

    pub async fn mark_closed(&self, channel_id: &str) {
        let mut inner = self.inner.write().await;
        if let Some(channel) = inner.channels.get_mut(channel_id) {
            channel.is_closed = true;
        }
    }

    pub async fn latest_payment(&self, channel_id: &str) -> Option<StoredPayment> {
        self.inner.read().await.payments.get(channel_id).cloned()
    }

    /// The monotonic compare-and-set.
    ///
    /// Exists-check, bounds-check, monotonic-check and write happen
    /// under one write lock: no interleaving receive can observe a
    /// partial decision.
    pub async fn save_payment(
        &self,
        channel_id: &str,
        new_index: u64,
        payload: Vec<u8>,
    ) -> SaveOutcome {
        let mut inner = self.inner.write().await;

        let Some(channel) = inner.channels.get(channel_id) else {
            return SaveOutcome::ChannelMissing;
        };
        if channel.is_closed {
            return SaveOutcome::ChannelMissing;
        }
        let bound = channel.commitment.max_index(channel.amount);
        if new_index == 0 || new_index > bound {
            return SaveOutcome::OutOfRange;
        }

        match inner.payments.get(channel_id).cloned() {
            None => {
                inner
                    .payments
                    .insert(channel_id.to_string(), StoredPayment { index: new_index, payload });
                SaveOutcome::Accepted
            }
            Some(current) if new_index > current.index => {
                inner
                    .payments
                    .insert(channel_id.to_string(), StoredPayment { index: new_index, payload });
                SaveOutcome::Accepted
            }
            Some(current) => SaveOutcome::NotNewer(current),
        }
    }
}
