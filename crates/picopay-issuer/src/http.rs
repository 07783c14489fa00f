//! HTTP bindings for the issuer operations.
//!
//! Thin adapters only: parse the request, call the service, map the
//! domain error onto a status code with a `{"detail": ...}` body.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::error::IssuerError;
use crate::types::{
    AccountLookupRequest, ChannelListResponse, OpenChannelRequest, RegistrationRequest,
    SettlementRequest,
};
use crate::{ChannelService, RegistrationService};

#[derive(Clone)]
pub struct AppState {
    pub registration: Arc<RegistrationService>,
    pub channels: Arc<ChannelService>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/public-key", get(get_public_key))
        .route("/accounts", post(register))
        .route("/accounts/lookup", post(lookup_account))
        .route("/channels", post(open_channel).get(list_channels))
        .route("/channels/:channel_id", get(get_channel))
        .route("/channels/:channel_id/settle", post(settle_channel))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn error_response(err: IssuerError) -> Response {
    let status = match &err {
        IssuerError::AccountNotFound | IssuerError::ChannelNotFound => StatusCode::NOT_FOUND,
        _ => StatusCode::BAD_REQUEST,
    };
    warn!(%err, "request rejected");
    (status, Json(serde_json::json!({ "detail": err.to_string() }))).into_response()
}

async fn get_public_key(State(state): State<AppState>) -> Response {
    Json(state.registration.public_key()).into_response()
}

async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegistrationRequest>,
) -> Response {
    match state.registration.register(&request).await {
        Ok(account) => (StatusCode::CREATED, Json(account)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn lookup_account(
    State(state): State<AppState>,
    Json(request): Json<AccountLookupRequest>,
) -> Response {
    match state
        .registration
        .get_account(&request.public_key_der_b64)
        .await
    {
        Ok(account) => Json(account).into_response(),
        Err(err) => error_response(err),
    }
}

async fn open_channel(
    State(state): State<AppState>,
    Json(request): Json<OpenChannelRequest>,
) -> Response {
    match state.channels.open_channel(&request).await {
        Ok(channel) => (StatusCode::CREATED, Json(channel)).into_response(),
        Err(err) => error_response(err),
    }
}

#[derive(Deserialize)]
struct ListQuery {
    #[serde(default)]
    open: bool,
}

async fn list_channels(State(state): State<AppState>, Query(query): Query<ListQuery>) -> Response {
    let channels = state.channels.list_channels(query.open).await;
    Json(ChannelListResponse { channels }).into_response()
}

async fn get_channel(State(state): State<AppState>, Path(channel_id): Path<String>) -> Response {
    match state.channels.get_channel(&channel_id).await {
        Ok(channel) => Json(channel).into_response(),
        Err(err) => error_response(err),
    }
}

async fn settle_channel(
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
    Json(proof): Json<picopay_core::ProofDto>,
) -> Response {
    let request = SettlementRequest { channel_id, proof };
    match state.channels.settle_channel(&request).await {
        Ok(close) => Json(close).into_response(),
        Err(err) => error_response(err),
    }
}
