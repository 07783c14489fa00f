//! Wire DTOs for the vendor's operations and its mirror of the
//! issuer's channel record.

use picopay_core::{
    canonical_json, Commitment, PaymentPayload, ProofDto, ProofError, Scheme,
};
use picopay_store::vendor::CachedChannel;
use serde::{Deserialize, Serialize};

use crate::error::VendorError;

/// A payment as submitted to the vendor, tagged by scheme. The channel
/// id arrives out of band (URL path or call argument).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scheme", rename_all = "lowercase")]
pub enum PaymentDto {
    Signature {
        cumulative_owed_amount: u64,
        signature_b64: String,
    },
    Payword {
        k: u64,
        token_b64: String,
    },
    Paytree {
        i: u64,
        leaf_b64: String,
        siblings_b64: Vec<String>,
    },
}

impl PaymentDto {
    pub fn scheme(&self) -> Scheme {
        match self {
            PaymentDto::Signature { .. } => Scheme::Signature,
            PaymentDto::Payword { .. } => Scheme::Payword,
            PaymentDto::Paytree { .. } => Scheme::Paytree,
        }
    }
}

/// The vendor's accepted state for a channel, serialized canonically
/// into the store. These bytes double as the duplicate-detection key
/// and the settlement proof source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scheme", rename_all = "lowercase")]
pub enum PaymentStateDto {
    Signature {
        channel_id: String,
        cumulative_owed_amount: u64,
        signature_b64: String,
    },
    Payword {
        k: u64,
        token_b64: String,
    },
    Paytree {
        i: u64,
        leaf_b64: String,
        siblings_b64: Vec<String>,
    },
}

impl PaymentStateDto {
    pub fn from_payment(channel_id: &str, payment: &PaymentDto) -> Self {
        match payment {
            PaymentDto::Signature {
                cumulative_owed_amount,
                signature_b64,
            } => PaymentStateDto::Signature {
                channel_id: channel_id.to_string(),
                cumulative_owed_amount: *cumulative_owed_amount,
                signature_b64: signature_b64.clone(),
            },
            PaymentDto::Payword { k, token_b64 } => PaymentStateDto::Payword {
                k: *k,
                token_b64: token_b64.clone(),
            },
            PaymentDto::Paytree {
                i,
                leaf_b64,
                siblings_b64,
            } => PaymentStateDto::Paytree {
                i: *i,
                leaf_b64: leaf_b64.clone(),
                siblings_b64: siblings_b64.clone(),
            },
        }
    }

    /// The scheme's monotonic index.
    pub fn index(&self) -> u64 {
        match self {
            PaymentStateDto::Signature {
                cumulative_owed_amount,
                ..
            } => *cumulative_owed_amount,
            PaymentStateDto::Payword { k, .. } => *k,
            PaymentStateDto::Paytree { i, .. } => *i,
        }
    }

    pub fn scheme(&self) -> Scheme {
        match self {
            PaymentStateDto::Signature { .. } => Scheme::Signature,
            PaymentStateDto::Payword { .. } => Scheme::Payword,
            PaymentStateDto::Paytree { .. } => Scheme::Paytree,
        }
    }

    pub fn canonical_bytes(&self) -> Result<Vec<u8>, ProofError> {
        canonical_json(self)
    }

    /// Rebuild the verifiable proof. For the signature scheme the
    /// canonical payment payload is reconstructed from the stored
    /// claim, which is why the claim's byte encoding must be
    /// reproducible.
    pub fn to_proof(&self) -> Result<ProofDto, ProofError> {
        match self {
            PaymentStateDto::Signature {
                channel_id,
                cumulative_owed_amount,
                signature_b64,
            } => {
                let payload = PaymentPayload {
                    channel_id: channel_id.clone(),
                    cumulative_owed_amount: *cumulative_owed_amount,
                };
                let bytes = canonical_json(&payload)?;
                Ok(ProofDto::Signature {
                    payload_b64: picopay_core::b64_encode(&bytes),
                    signature_b64: signature_b64.clone(),
                })
            }
            PaymentStateDto::Payword { k, token_b64 } => Ok(ProofDto::Payword {
                k: *k,
                token_b64: token_b64.clone(),
            }),
            PaymentStateDto::Paytree {
                i,
                leaf_b64,
                siblings_b64,
            } => Ok(ProofDto::Paytree {
                i: *i,
                leaf_b64: leaf_b64.clone(),
                siblings_b64: siblings_b64.clone(),
            }),
        }
    }
}

/// Response for an accepted payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentAccepted {
    pub channel_id: String,
    pub scheme: Scheme,
    pub index: u64,
    pub cumulative_owed_amount: u64,
    /// True when this was an exact replay of the already-accepted proof.
    pub duplicate: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicKeyResponse {
    pub public_key_der_b64: String,
}

/// The vendor's view of an issuer channel record; field names mirror
/// the issuer's response so the JSON maps directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelSnapshot {
    pub channel_id: String,
    pub scheme: Scheme,
    pub client_public_key_der_b64: String,
    pub vendor_public_key_der_b64: String,
    pub amount: u64,
    pub is_closed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payword_root_b64: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payword_unit_value: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payword_max_k: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paytree_root_b64: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paytree_unit_value: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paytree_max_i: Option<u64>,
}

impl ChannelSnapshot {
    pub fn commitment(&self) -> Result<Commitment, VendorError> {
        let missing =
            |what: &str| VendorError::BadChannelMetadata(format!("missing {what} field"));
        match self.scheme {
            Scheme::Signature => Ok(Commitment::Signature),
            Scheme::Payword => Ok(Commitment::Payword {
                root_b64: self
                    .payword_root_b64
                    .clone()
                    .ok_or_else(|| missing("payword_root_b64"))?,
                unit_value: self
                    .payword_unit_value
                    .ok_or_else(|| missing("payword_unit_value"))?,
                max_k: self.payword_max_k.ok_or_else(|| missing("payword_max_k"))?,
            }),
            Scheme::Paytree => Ok(Commitment::Paytree {
                root_b64: self
                    .paytree_root_b64
                    .clone()
                    .ok_or_else(|| missing("paytree_root_b64"))?,
                unit_value: self
                    .paytree_unit_value
                    .ok_or_else(|| missing("paytree_unit_value"))?,
                max_i: self.paytree_max_i.ok_or_else(|| missing("paytree_max_i"))?,
            }),
        }
    }

    pub fn to_cached(&self) -> Result<CachedChannel, VendorError> {
        Ok(CachedChannel {
            channel_id: self.channel_id.clone(),
            client_public_key_der_b64: self.client_public_key_der_b64.clone(),
            amount: self.amount,
            commitment: self.commitment()?,
            is_closed: self.is_closed,
        })
    }
}

/// What the issuer reports back for a settled channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloseSummary {
    pub channel_id: String,
    pub settled_balance: u64,
    pub vendor_credit: u64,
    pub client_refund: u64,
}
