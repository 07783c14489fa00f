//! The vendor payment state machine.
//!
//! One mutator: [`PaymentService::receive_payment`]. It resolves the
//! channel (lazily from the issuer on first contact), checks the proof
//! and advances the per-channel state through the store's monotonic
//! compare-and-set. A rejected payment never changes stored state.

use std::sync::Arc;

use picopay_core::ProofError;
use picopay_store::vendor::{CachedChannel, SaveOutcome, StoredPayment, VendorStore};
use tracing::{debug, info};

use crate::error::VendorError;
use crate::issuer_api::IssuerApi;
use crate::types::{PaymentAccepted, PaymentDto, PaymentStateDto};

pub struct PaymentService {
    store: Arc<VendorStore>,
    issuer: Arc<dyn IssuerApi>,
}

impl PaymentService {
    pub fn new(store: Arc<VendorStore>, issuer: Arc<dyn IssuerApi>) -> Self {
        Self { store, issuer }
    }

    pub async fn receive_payment(
        &self,
        channel_id: &str,
        payment: &PaymentDto,
    ) -> Result<PaymentAccepted, VendorError> {
        let channel = self.resolve_channel(channel_id).await?;
        if payment.scheme() != channel.commitment.scheme() {
            return Err(ProofError::MalformedProof(format!(
                "{} payment submitted to a {} channel",
                payment.scheme(),
                channel.commitment.scheme()
            ))
            .into());
        }

        let state = PaymentStateDto::from_payment(channel_id, payment);
        let index = state.index();
        if index == 0 {
            return Err(ProofError::NonPositiveIndex.into());
        }
        let payload = state.canonical_bytes()?;

        // A resubmission of the already-accepted index is classified
        // before verification: byte-identical means idempotent replay,
        // anything else is a conflict. Neither touches state.
        if let Some(stored) = self.store.latest_payment(channel_id).await {
            if stored.index == index {
                return self.classify_equal(channel_id, &channel, index, &payload, &stored);
            }
        }

        let proof = state.to_proof()?;
        let owed = picopay_core::verify(
            channel_id,
            &channel.client_public_key_der_b64,
            &channel.commitment,
            &proof,
        )?;
        if owed > channel.amount {
            return Err(VendorError::Overspend {
                owed,
                amount: channel.amount,
            });
        }

        match self
            .store
            .save_payment(channel_id, index, payload.clone())
            .await
        {
            SaveOutcome::Accepted => {
                info!(
                    channel_id,
                    scheme = %channel.commitment.scheme(),
                    index,
                    owed,
                    "payment accepted"
                );
                Ok(PaymentAccepted {
                    channel_id: channel_id.to_string(),
                    scheme: channel.commitment.scheme(),
                    index,
                    cumulative_owed_amount: owed,
                    duplicate: false,
                })
            }
            SaveOutcome::NotNewer(stored) if stored.index == index => {
                self.classify_equal(channel_id, &channel, index, &payload, &stored)
            }
            SaveOutcome::NotNewer(stored) => Err(VendorError::NonMonotonic {
                index,
                latest: stored.index,
            }),
            SaveOutcome::ChannelMissing => Err(VendorError::UnknownOrClosedChannel),
            SaveOutcome::OutOfRange => Err(VendorError::Overspend {
                owed,
                amount: channel.amount,
            }),
        }
    }

    fn classify_equal(
        &self,
        channel_id: &str,
        channel: &CachedChannel,
        index: u64,
        payload: &[u8],
        stored: &StoredPayment,
    ) -> Result<PaymentAccepted, VendorError> {
        if stored.payload == payload {
            let owed = channel.commitment.owed_at(index).ok_or_else(|| {
                ProofError::MalformedProof("owed amount overflows u64".into())
            })?;
            Ok(PaymentAccepted {
                channel_id: channel_id.to_string(),
                scheme: channel.commitment.scheme(),
                index,
                cumulative_owed_amount: owed,
                duplicate: true,
            })
        } else {
            Err(VendorError::DuplicateConflict { index })
        }
    }

    /// Resolve the channel from the local cache, falling back to the
    /// issuer and caching the answer.
    async fn resolve_channel(&self, channel_id: &str) -> Result<CachedChannel, VendorError> {
        if let Some(channel) = self.store.get_channel(channel_id).await {
            if channel.is_closed {
                return Err(VendorError::UnknownOrClosedChannel);
            }
            return Ok(channel);
        }

        let snapshot = self
            .issuer
            .get_channel(channel_id)
            .await?
            .ok_or(VendorError::UnknownOrClosedChannel)?;
        if snapshot.is_closed {
            return Err(VendorError::UnknownOrClosedChannel);
        }
        let cached = snapshot.to_cached()?;
        self.store.cache_channel(cached.clone()).await;
        debug!(channel_id, "channel cached from issuer");
        Ok(cached)
    }
}
