//! Account registration and lookup.

use std::sync::Arc;

use picopay_core::{keys, KeyPair};
use picopay_store::issuer::IssuerStore;
use tracing::info;

use crate::error::IssuerError;
use crate::types::{AccountResponse, PublicKeyResponse, RegistrationRequest};

pub struct RegistrationService {
    store: Arc<IssuerStore>,
    keys: Arc<KeyPair>,
    initial_balance: u64,
}

impl RegistrationService {
    pub fn new(store: Arc<IssuerStore>, keys: Arc<KeyPair>, initial_balance: u64) -> Self {
        Self {
            store,
            keys,
            initial_balance,
        }
    }

    /// Idempotent: first call creates the account with the configured
    /// initial balance, later calls return it unchanged.
    pub async fn register(&self, request: &RegistrationRequest) -> Result<AccountResponse, IssuerError> {
        keys::decode_verifying_key(&request.client_public_key_der_b64)
            .map_err(|err| IssuerError::Validation(err.to_string()))?;

        let balance = self
            .store
            .register_account(&request.client_public_key_der_b64, self.initial_balance)
            .await;
        info!(balance, "account registered");

        Ok(AccountResponse {
            client_public_key_der_b64: request.client_public_key_der_b64.clone(),
            balance,
        })
    }

    pub async fn get_account(&self, public_key_der_b64: &str) -> Result<AccountResponse, IssuerError> {
        let balance = self
            .store
            .account_balance(public_key_der_b64)
            .await
            .ok_or(IssuerError::AccountNotFound)?;
        Ok(AccountResponse {
            client_public_key_der_b64: public_key_der_b64.to_string(),
            balance,
        })
    }

    pub fn public_key(&self) -> PublicKeyResponse {
        PublicKeyResponse {
            public_key_der_b64: self.keys.public_key_der_b64().to_string(),
        }
    }
}
