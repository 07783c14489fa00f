//! HTTP bindings for the vendor operations.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::error::VendorError;
use crate::types::{PaymentDto, PublicKeyResponse};
use crate::{PaymentService, SettlementService};

#[derive(Clone)]
pub struct AppState {
    pub payments: Arc<PaymentService>,
    pub settlement: Arc<SettlementService>,
    pub public_key_der_b64: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/public-key", get(get_public_key))
        .route("/channels/:channel_id/payments", post(receive_payment))
        .route("/channels/:channel_id/settlement", post(request_settlement))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn error_response(err: VendorError) -> Response {
    let status = match &err {
        VendorError::UnknownOrClosedChannel => StatusCode::NOT_FOUND,
        VendorError::Transport(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::BAD_REQUEST,
    };
    warn!(%err, "request rejected");
    (status, Json(serde_json::json!({ "detail": err.to_string() }))).into_response()
}

async fn get_public_key(State(state): State<AppState>) -> Response {
    Json(PublicKeyResponse {
        public_key_der_b64: state.public_key_der_b64.clone(),
    })
    .into_response()
}

async fn receive_payment(
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
    Json(payment): Json<PaymentDto>,
) -> Response {
    match state.payments.receive_payment(&channel_id, &payment).await {
        Ok(accepted) => Json(accepted).into_response(),
        Err(err) => error_response(err),
    }
}

async fn request_settlement(
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
) -> Response {
    match state.settlement.request_settlement(&channel_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err),
    }
}
