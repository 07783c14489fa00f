//! Test doubles shared by the unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use picopay_core::{ProofDto, Scheme};

use crate::error::VendorError;
use crate::issuer_api::IssuerApi;
use crate::types::{ChannelSnapshot, CloseSummary};

/// Scriptable in-memory issuer.
#[derive(Default)]
pub(crate) struct StubIssuer {
    channels: Mutex<HashMap<String, ChannelSnapshot>>,
    settlements: Mutex<Vec<(String, ProofDto)>>,
    reject_settlement: Mutex<Option<String>>,
}

impl StubIssuer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_channel(&self, snapshot: ChannelSnapshot) {
        self.channels
            .lock()
            .unwrap()
            .insert(snapshot.channel_id.clone(), snapshot);
    }

    pub fn remove_channel(&self, channel_id: &str) {
        self.channels.lock().unwrap().remove(channel_id);
    }

    pub fn reject_settlements(&self, detail: &str) {
        *self.reject_settlement.lock().unwrap() = Some(detail.to_string());
    }

    pub fn settlement_count(&self) -> usize {
        self.settlements.lock().unwrap().len()
    }

    pub fn last_settlement(&self) -> Option<(String, ProofDto)> {
        self.settlements.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl IssuerApi for StubIssuer {
    async fn get_channel(&self, channel_id: &str) -> Result<Option<ChannelSnapshot>, VendorError> {
        Ok(self.channels.lock().unwrap().get(channel_id).cloned())
    }

    async fn settle_channel(
        &self,
        channel_id: &str,
        proof: ProofDto,
    ) -> Result<CloseSummary, VendorError> {
        if let Some(detail) = self.reject_settlement.lock().unwrap().clone() {
            return Err(VendorError::IssuerRejected(detail));
        }
        self.settlements
            .lock()
            .unwrap()
            .push((channel_id.to_string(), proof));
        Ok(CloseSummary {
            channel_id: channel_id.to_string(),
            settled_balance: 0,
            vendor_credit: 0,
            client_refund: 0,
        })
    }
}

fn base_snapshot(channel_id: &str, client_pk: &str, amount: u64, scheme: Scheme) -> ChannelSnapshot {
    ChannelSnapshot {
        channel_id: channel_id.to_string(),
        scheme,
        client_public_key_der_b64: client_pk.to_string(),
        vendor_public_key_der_b64: "vendor-key".to_string(),
        amount,
        is_closed: false,
        payword_root_b64: None,
        payword_unit_value: None,
        payword_max_k: None,
        paytree_root_b64: None,
        paytree_unit_value: None,
        paytree_max_i: None,
    }
}

pub(crate) fn signature_snapshot(channel_id: &str, client_pk: &str, amount: u64) -> ChannelSnapshot {
    base_snapshot(channel_id, client_pk, amount, Scheme::Signature)
}

pub(crate) fn payword_snapshot(
    channel_id: &str,
    client_pk: &str,
    amount: u64,
    unit_value: u64,
    root_b64: String,
    max_k: u64,
) -> ChannelSnapshot {
    let mut snapshot = base_snapshot(channel_id, client_pk, amount, Scheme::Payword);
    snapshot.payword_root_b64 = Some(root_b64);
    snapshot.payword_unit_value = Some(unit_value);
    snapshot.payword_max_k = Some(max_k);
    snapshot
}

pub(crate) fn paytree_snapshot(
    channel_id: &str,
    client_pk: &str,
    amount: u64,
    unit_value: u64,
    root_b64: String,
    max_i: u64,
) -> ChannelSnapshot {
    let mut snapshot = base_snapshot(channel_id, client_pk, amount, Scheme::Paytree);
    snapshot.paytree_root_b64 = Some(root_b64);
    snapshot.paytree_unit_value = Some(unit_value);
    snapshot.paytree_max_i = Some(max_i);
    snapshot
}
