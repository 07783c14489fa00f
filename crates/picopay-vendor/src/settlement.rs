//! Vendor-initiated settlement.

use std::sync::Arc;

use picopay_store::vendor::VendorStore;
use tracing::info;

use crate::error::VendorError;
use crate::issuer_api::IssuerApi;
use crate::types::PaymentStateDto;

pub struct SettlementService {
    store: Arc<VendorStore>,
    issuer: Arc<dyn IssuerApi>,
}

impl SettlementService {
    pub fn new(store: Arc<VendorStore>, issuer: Arc<dyn IssuerApi>) -> Self {
        Self { store, issuer }
    }

    /// Submit the channel's best proof to the issuer and close it
    /// locally. Retrying is safe: a locally closed channel is a no-op
    /// and the issuer itself is idempotent by channel id.
    pub async fn request_settlement(&self, channel_id: &str) -> Result<(), VendorError> {
        if let Some(channel) = self.store.get_channel(channel_id).await {
            if channel.is_closed {
                return Ok(());
            }
        }

        let stored = self
            .store
            .latest_payment(channel_id)
            .await
            .ok_or(VendorError::NoPaymentsReceived)?;
        let state: PaymentStateDto = serde_json::from_slice(&stored.payload)
            .map_err(|err| VendorError::CorruptState(err.to_string()))?;
        let proof = state.to_proof()?;

        let summary = self.issuer.settle_channel(channel_id, proof).await?;
        self.store.mark_closed(channel_id).await;
        info!(
            channel_id,
            vendor_credit = summary.vendor_credit,
            client_refund = summary.client_refund,
            "channel settled"
        );
        Ok(())
    }
}
