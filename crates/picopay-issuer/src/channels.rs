//! Channel lifecycle: open, lookup, settlement.

use std::sync::Arc;

use picopay_core::payload::{check_positive, HASH_ALG_SHA256};
use picopay_core::{
    b64_decode, derive_channel_id, keys, random_salt, Commitment, Envelope, PaytreeOpenPayload,
    PaywordOpenPayload, ProofError, Scheme, SignatureOpenPayload,
};
use picopay_store::issuer::{ChannelRecord, IssuerStore};
use tracing::info;

use crate::error::IssuerError;
use crate::types::{
    ChannelResponse, CloseChannelResponse, OpenChannelRequest, SettlementRequest,
};

pub struct ChannelService {
    store: Arc<IssuerStore>,
}

/// The fields every open payload shares once parsed, with the
/// scheme-specific commitment already assembled.
struct OpenFields {
    client_public_key_der_b64: String,
    vendor_public_key_der_b64: String,
    amount: u64,
    commitment: Commitment,
}

impl OpenFields {
    fn parse(scheme: Scheme, payload_bytes: &[u8]) -> Result<Self, IssuerError> {
        let invalid = |err: serde_json::Error| IssuerError::Validation(err.to_string());
        match scheme {
            Scheme::Signature => {
                let payload: SignatureOpenPayload =
                    serde_json::from_slice(payload_bytes).map_err(invalid)?;
                check_positive("amount", payload.amount)?;
                Ok(Self {
                    client_public_key_der_b64: payload.client_public_key_der_b64,
                    vendor_public_key_der_b64: payload.vendor_public_key_der_b64,
                    amount: payload.amount,
                    commitment: Commitment::Signature,
                })
            }
            Scheme::Payword => {
                let payload: PaywordOpenPayload =
                    serde_json::from_slice(payload_bytes).map_err(invalid)?;
                check_positive("amount", payload.amount)?;
                check_positive("payword_unit_value", payload.payword_unit_value)?;
                check_positive("payword_max_k", payload.payword_max_k)?;
                check_hash_alg(&payload.payword_hash_alg)?;
                check_root(&payload.payword_root_b64)?;
                Ok(Self {
                    client_public_key_der_b64: payload.client_public_key_der_b64,
                    vendor_public_key_der_b64: payload.vendor_public_key_der_b64,
                    amount: payload.amount,
                    commitment: Commitment::Payword {
                        root_b64: payload.payword_root_b64,
                        unit_value: payload.payword_unit_value,
                        max_k: payload.payword_max_k,
                    },
                })
            }
            Scheme::Paytree => {
                let payload: PaytreeOpenPayload =
                    serde_json::from_slice(payload_bytes).map_err(invalid)?;
                check_positive("amount", payload.amount)?;
                check_positive("paytree_unit_value", payload.paytree_unit_value)?;
                check_positive("paytree_max_i", payload.paytree_max_i)?;
                check_hash_alg(&payload.paytree_hash_alg)?;
                check_root(&payload.paytree_root_b64)?;
                Ok(Self {
                    client_public_key_der_b64: payload.client_public_key_der_b64,
                    vendor_public_key_der_b64: payload.vendor_public_key_der_b64,
                    amount: payload.amount,
                    commitment: Commitment::Paytree {
                        root_b64: payload.paytree_root_b64,
                        unit_value: payload.paytree_unit_value,
                        max_i: payload.paytree_max_i,
                    },
                })
            }
        }
    }
}

fn check_hash_alg(alg: &str) -> Result<(), IssuerError> {
    if alg != HASH_ALG_SHA256 {
        return Err(IssuerError::Validation(format!(
            "unsupported hash algorithm {alg:?}"
        )));
    }
    Ok(())
}

fn check_root(root_b64: &str) -> Result<(), IssuerError> {
    let bytes = b64_decode(root_b64).map_err(|err| IssuerError::Validation(err.to_string()))?;
    if bytes.len() != 32 {
        return Err(IssuerError::Validation(
            "commitment root must be 32 bytes".to_string(),
        ));
    }
    Ok(())
}

impl ChannelService {
    pub fn new(store: Arc<IssuerStore>) -> Self {
        Self { store }
    }

    /// Open a channel: verify the client-signed payload, debit the
    /// client and persist the record in one atomic store step.
    pub async fn open_channel(
        &self,
        request: &OpenChannelRequest,
    ) -> Result<ChannelResponse, IssuerError> {
        let envelope = Envelope {
            payload_b64: request.open_payload_b64.clone(),
            signature_b64: request.open_signature_b64.clone(),
        };
        let payload_bytes = envelope.payload_bytes()?;
        let fields = OpenFields::parse(request.scheme, &payload_bytes)?;

        // The key inside the signed payload must byte-match the declared
        // one before the signature is even checked.
        if fields.client_public_key_der_b64 != request.client_public_key_der_b64 {
            return Err(ProofError::MismatchedPublicKey.into());
        }
        keys::verify_signature(
            &request.client_public_key_der_b64,
            &payload_bytes,
            &request.open_signature_b64,
        )?;

        let salt = random_salt();
        let record = ChannelRecord {
            channel_id: derive_channel_id(&payload_bytes, &salt),
            client_public_key_der_b64: fields.client_public_key_der_b64,
            vendor_public_key_der_b64: fields.vendor_public_key_der_b64,
            amount: fields.amount,
            commitment: fields.commitment,
            is_closed: false,
            balance: 0,
            salt_hex: hex::encode(salt),
        };
        self.store.open_channel(record.clone()).await?;

        info!(
            channel_id = %record.channel_id,
            scheme = %record.commitment.scheme(),
            amount = record.amount,
            "channel opened"
        );
        Ok(ChannelResponse::from_record(&record))
    }

    pub async fn get_channel(&self, channel_id: &str) -> Result<ChannelResponse, IssuerError> {
        let record = self
            .store
            .get_channel(channel_id)
            .await
            .ok_or(IssuerError::ChannelNotFound)?;
        Ok(ChannelResponse::from_record(&record))
    }

    pub async fn list_channels(&self, open_only: bool) -> Vec<ChannelResponse> {
        self.store
            .list_channels(open_only)
            .await
            .iter()
            .map(ChannelResponse::from_record)
            .collect()
    }

    /// Settle a channel, idempotently by channel id.
    ///
    /// The proof is re-verified here against the issuer's own record;
    /// nothing the vendor claims is taken on trust.
    pub async fn settle_channel(
        &self,
        request: &SettlementRequest,
    ) -> Result<CloseChannelResponse, IssuerError> {
        let record = self
            .store
            .get_channel(&request.channel_id)
            .await
            .ok_or(IssuerError::ChannelNotFound)?;

        let owed = if record.is_closed {
            // Idempotent replay; the stored settled balance short-circuits
            // inside the store, so the proof is not re-checked.
            record.balance
        } else {
            let owed = picopay_core::verify(
                &request.channel_id,
                &record.client_public_key_der_b64,
                &record.commitment,
                &request.proof,
            )
            .map_err(|err| IssuerError::InvalidSettlementProof(err.to_string()))?;
            if owed == 0 || owed > record.amount {
                return Err(IssuerError::InvalidSettlementProof(format!(
                    "settled amount {owed} outside (0, {}]",
                    record.amount
                )));
            }
            owed
        };

        let outcome = self.store.settle_channel(&request.channel_id, owed).await?;
        let close = outcome.into_record();
        info!(
            channel_id = %close.channel_id,
            vendor_credit = close.vendor_credit,
            client_refund = close.client_refund,
            "channel settled"
        );
        Ok(CloseChannelResponse::from_record(&close))
    }
}
