//! Wire DTOs for the issuer's operations.

use picopay_core::{ProofDto, Scheme};
use picopay_store::issuer::{ChannelRecord, CloseRecord};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationRequest {
    pub client_public_key_der_b64: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountResponse {
    pub client_public_key_der_b64: String,
    pub balance: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountLookupRequest {
    pub public_key_der_b64: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicKeyResponse {
    pub public_key_der_b64: String,
}

/// An open request: the scheme tag, the declared client key and the
/// client-signed open payload envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenChannelRequest {
    pub scheme: Scheme,
    pub client_public_key_der_b64: String,
    pub open_payload_b64: String,
    pub open_signature_b64: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelResponse {
    pub channel_id: String,
    pub scheme: Scheme,
    pub client_public_key_der_b64: String,
    pub vendor_public_key_der_b64: String,
    pub amount: u64,
    /// Settled amount; 0 while the channel is open.
    pub balance: u64,
    pub is_closed: bool,
    pub salt: String,
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

impl ChannelResponse {
    pub fn from_record(record: &ChannelRecord) -> Self {
        let mut response = Self {
            channel_id: record.channel_id.clone(),
            scheme: record.commitment.scheme(),
            client_public_key_der_b64: record.client_public_key_der_b64.clone(),
            vendor_public_key_der_b64: record.vendor_public_key_der_b64.clone(),
            amount: record.amount,
            balance: record.balance,
            is_closed: record.is_closed,
            salt: record.salt_hex.clone(),
            payword_root_b64: None,
            payword_unit_value: None,
            payword_max_k: None,
            paytree_root_b64: None,
            paytree_unit_value: None,
            paytree_max_i: None,
        };
        match &record.commitment {
            picopay_core::Commitment::Signature => {}
            picopay_core::Commitment::Payword {
                root_b64,
                unit_value,
                max_k,
            } => {
                response.payword_root_b64 = Some(root_b64.clone());
                response.payword_unit_value = Some(*unit_value);
                response.payword_max_k = Some(*max_k);
            }
            picopay_core::Commitment::Paytree {
                root_b64,
                unit_value,
                max_i,
            } => {
                response.paytree_root_b64 = Some(root_b64.clone());
                response.paytree_unit_value = Some(*unit_value);
                response.paytree_max_i = Some(*max_i);
            }
        }
        response
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelListResponse {
    pub channels: Vec<ChannelResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementRequest {
    pub channel_id: String,
    pub proof: ProofDto,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloseChannelResponse {
    pub channel_id: String,
    pub settled_balance: u64,
    pub vendor_credit: u64,
    pub client_refund: u64,
    pub is_closed: bool,
}

impl CloseChannelResponse {
    pub fn from_record(record: &CloseRecord) -> Self {
        Self {
            channel_id: record.channel_id.clone(),
            settled_balance: record.settled_balance,
            vendor_credit: record.vendor_credit,
            client_refund: record.client_refund,
            is_closed: true,
        }
    }
}
