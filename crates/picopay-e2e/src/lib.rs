//! In-process wiring of the issuer and vendor services for end-to-end
//! tests, plus a client actor that plays the key-holding side of the
//! protocol.
//!
//! The vendor talks to the issuer through [`InProcessIssuerApi`], which
//! calls the issuer services directly instead of HTTP, so the full
//! open → pay → settle flow runs in one process.

use std::sync::Arc;

use async_trait::async_trait;
use picopay_core::payload::HASH_ALG_SHA256;
use picopay_core::paytree::Paytree;
use picopay_core::payword::PaywordChain;
use picopay_core::{
    b64_decode, b64_encode, canonical_json, Envelope, KeyPair, PaymentPayload,
    PaytreeOpenPayload, PaywordOpenPayload, ProofDto, Scheme, SignatureOpenPayload,
};
use picopay_issuer::types::{
    OpenChannelRequest, RegistrationRequest, SettlementRequest,
};
use picopay_issuer::{ChannelService, IssuerError, RegistrationService};
use picopay_store::issuer::IssuerStore;
use picopay_store::vendor::VendorStore;
use picopay_vendor::types::{ChannelSnapshot, CloseSummary, PaymentDto};
use picopay_vendor::{IssuerApi, PaymentService, SettlementService, VendorError};

/// Larger than any amount the tests open.
pub const INITIAL_BALANCE: u64 = 1_000_000;

/// Issuer adapter that skips HTTP and calls the services directly.
pub struct InProcessIssuerApi {
    channels: Arc<ChannelService>,
}

#[async_trait]
impl IssuerApi for InProcessIssuerApi {
    async fn get_channel(&self, channel_id: &str) -> Result<Option<ChannelSnapshot>, VendorError> {
        match self.channels.get_channel(channel_id).await {
            Ok(response) => {
                // the vendor's snapshot mirrors the issuer's response
                // field for field, so route through serde
                let value = serde_json::to_value(&response)
                    .map_err(|err| VendorError::Transport(err.to_string()))?;
                let snapshot = serde_json::from_value(value)
                    .map_err(|err| VendorError::Transport(err.to_string()))?;
                Ok(Some(snapshot))
            }
            Err(IssuerError::ChannelNotFound) => Ok(None),
            Err(err) => Err(VendorError::IssuerRejected(err.to_string())),
        }
    }

    async fn settle_channel(
        &self,
        channel_id: &str,
        proof: ProofDto,
    ) -> Result<CloseSummary, VendorError> {
        let request = SettlementRequest {
            channel_id: channel_id.to_string(),
            proof,
        };
        match self.channels.settle_channel(&request).await {
            Ok(close) => Ok(CloseSummary {
                channel_id: close.channel_id,
                settled_balance: close.settled_balance,
                vendor_credit: close.vendor_credit,
                client_refund: close.client_refund,
            }),
            Err(err) => Err(VendorError::IssuerRejected(err.to_string())),
        }
    }
}

/// Both services wired together over shared in-memory stores.
pub struct TestNet {
    pub registration: Arc<RegistrationService>,
    pub channels: Arc<ChannelService>,
    pub payments: Arc<PaymentService>,
    pub settlement: Arc<SettlementService>,
    pub vendor_store: Arc<VendorStore>,
    pub vendor_keys: KeyPair,
}

impl TestNet {
    pub fn new() -> Self {
        let issuer_store = Arc::new(IssuerStore::new());
        let issuer_keys = Arc::new(KeyPair::generate());
        let registration = Arc::new(RegistrationService::new(
            Arc::clone(&issuer_store),
            issuer_keys,
            INITIAL_BALANCE,
        ));
        let channels = Arc::new(ChannelService::new(issuer_store));

        let vendor_store = Arc::new(VendorStore::new());
        let issuer_api: Arc<dyn IssuerApi> = Arc::new(InProcessIssuerApi {
            channels: Arc::clone(&channels),
        });
        let payments = Arc::new(PaymentService::new(
            Arc::clone(&vendor_store),
            Arc::clone(&issuer_api),
        ));
        let settlement = Arc::new(SettlementService::new(
            Arc::clone(&vendor_store),
            issuer_api,
        ));

        Self {
            registration,
            channels,
            payments,
            settlement,
            vendor_store,
            vendor_keys: KeyPair::generate(),
        }
    }

    pub fn vendor_public_key(&self) -> &str {
        self.vendor_keys.public_key_der_b64()
    }

    /// Register an account, returning its balance.
    pub async fn register(&self, public_key_der_b64: &str) -> u64 {
        self.registration
            .register(&RegistrationRequest {
                client_public_key_der_b64: public_key_der_b64.to_string(),
            })
            .await
            .expect("registration")
            .balance
    }

    pub async fn balance(&self, public_key_der_b64: &str) -> u64 {
        self.registration
            .get_account(public_key_der_b64)
            .await
            .expect("account")
            .balance
    }
}

impl Default for TestNet {
    fn default() -> Self {
        Self::new()
    }
}

/// Client-side actor: key pair plus the signing and commitment
/// generation the protocol expects of a client.
pub struct ClientActor {
    pub keys: KeyPair,
}

impl ClientActor {
    pub fn new() -> Self {
        Self {
            keys: KeyPair::generate(),
        }
    }

    pub fn public_key_der_b64(&self) -> &str {
        self.keys.public_key_der_b64()
    }

    pub fn open_signature_channel(&self, vendor_pk: &str, amount: u64) -> OpenChannelRequest {
        let payload = SignatureOpenPayload {
            client_public_key_der_b64: self.public_key_der_b64().to_string(),
            vendor_public_key_der_b64: vendor_pk.to_string(),
            amount,
        };
        self.wrap(Scheme::Signature, &payload)
    }

    pub fn open_payword_channel(
        &self,
        vendor_pk: &str,
        amount: u64,
        unit_value: u64,
        max_k: u64,
        pebble_count: usize,
    ) -> (OpenChannelRequest, PaywordChain) {
        let chain = PaywordChain::generate(max_k, pebble_count).expect("payword chain");
        let payload = PaywordOpenPayload {
            client_public_key_der_b64: self.public_key_der_b64().to_string(),
            vendor_public_key_der_b64: vendor_pk.to_string(),
            amount,
            payword_root_b64: chain.root_b64(),
            payword_unit_value: unit_value,
            payword_max_k: max_k,
            payword_hash_alg: HASH_ALG_SHA256.to_string(),
        };
        (self.wrap(Scheme::Payword, &payload), chain)
    }

    pub fn open_paytree_channel(
        &self,
        vendor_pk: &str,
        amount: u64,
        unit_value: u64,
        max_i: u64,
    ) -> (OpenChannelRequest, Paytree) {
        let tree = Paytree::generate(max_i).expect("paytree");
        let payload = PaytreeOpenPayload {
            client_public_key_der_b64: self.public_key_der_b64().to_string(),
            vendor_public_key_der_b64: vendor_pk.to_string(),
            amount,
            paytree_root_b64: tree.root_b64(),
            paytree_unit_value: unit_value,
            paytree_max_i: max_i,
            paytree_hash_alg: HASH_ALG_SHA256.to_string(),
        };
        (self.wrap(Scheme::Paytree, &payload), tree)
    }

    fn wrap<T: serde::Serialize>(&self, scheme: Scheme, payload: &T) -> OpenChannelRequest {
        let envelope = Envelope::seal(&self.keys, payload).expect("envelope");
        OpenChannelRequest {
            scheme,
            client_public_key_der_b64: self.public_key_der_b64().to_string(),
            open_payload_b64: envelope.payload_b64,
            open_signature_b64: envelope.signature_b64,
        }
    }

    pub fn signature_payment(&self, channel_id: &str, owed: u64) -> PaymentDto {
        let payload = PaymentPayload {
            channel_id: channel_id.to_string(),
            cumulative_owed_amount: owed,
        };
        let bytes = canonical_json(&payload).expect("payment payload");
        PaymentDto::Signature {
            cumulative_owed_amount: owed,
            signature_b64: self.keys.sign_b64(&bytes),
        }
    }
}

impl Default for ClientActor {
    fn default() -> Self {
        Self::new()
    }
}

pub fn payword_payment(chain: &PaywordChain, k: u64) -> PaymentDto {
    PaymentDto::Payword {
        k,
        token_b64: chain.token_b64(k).expect("token"),
    }
}

pub fn paytree_payment(tree: &Paytree, i: u64) -> PaymentDto {
    let (leaf, siblings) = tree.proof(i).expect("proof");
    PaymentDto::Paytree {
        i,
        leaf_b64: b64_encode(&leaf),
        siblings_b64: siblings.iter().map(|s| b64_encode(s)).collect(),
    }
}

/// Flip one bit inside a base64 string while keeping it valid base64.
pub fn tamper_b64(b64: &str) -> String {
    let mut bytes = b64_decode(b64).expect("valid base64");
    if let Some(first) = bytes.first_mut() {
        *first ^= 1;
    }
    b64_encode(&bytes)
}
