//! The vendor's view of the issuer.
//!
//! A trait seam so tests and in-process deployments can wire the
//! issuer directly; the HTTP implementation is what the binary uses.

use async_trait::async_trait;
use picopay_core::ProofDto;

use crate::error::VendorError;
use crate::types::{ChannelSnapshot, CloseSummary};

#[async_trait]
pub trait IssuerApi: Send + Sync {
    /// Fetch channel metadata. `Ok(None)` when the issuer has no such
    /// channel.
    async fn get_channel(&self, channel_id: &str) -> Result<Option<ChannelSnapshot>, VendorError>;

    /// Submit the best proof for settlement. The issuer is idempotent
    /// by channel id, so retries are safe.
    async fn settle_channel(
        &self,
        channel_id: &str,
        proof: ProofDto,
    ) -> Result<CloseSummary, VendorError>;
}

/// reqwest-backed issuer client.
pub struct HttpIssuerApi {
    base_url: String,
    client: reqwest::Client,
}

impl HttpIssuerApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }
}

fn transport(err: reqwest::Error) -> VendorError {
    VendorError::Transport(err.to_string())
}

/// Best-effort extraction of the issuer's `{"detail": ...}` body.
async fn read_detail(response: reqwest::Response) -> String {
    let status = response.status();
    match response.json::<serde_json::Value>().await {
        Ok(body) => body
            .get("detail")
            .and_then(|detail| detail.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| status.to_string()),
        Err(_) => status.to_string(),
    }
}

#[async_trait]
impl IssuerApi for HttpIssuerApi {
    async fn get_channel(&self, channel_id: &str) -> Result<Option<ChannelSnapshot>, VendorError> {
        let url = format!("{}/channels/{}", self.base_url, channel_id);
        let response = self.client.get(&url).send().await.map_err(transport)?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(VendorError::IssuerRejected(read_detail(response).await));
        }
        let snapshot = response
            .json::<ChannelSnapshot>()
            .await
            .map_err(transport)?;
        Ok(Some(snapshot))
    }

    async fn settle_channel(
        &self,
        channel_id: &str,
        proof: ProofDto,
    ) -> Result<CloseSummary, VendorError> {
        let url = format!("{}/channels/{}/settle", self.base_url, channel_id);
        let response = self
            .client
            .post(&url)
            .json(&proof)
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            return Err(VendorError::IssuerRejected(read_detail(response).await));
        }
        response.json::<CloseSummary>().await.map_err(transport)
    }
}
