use crate::Tracking;
use crate::feed::split_envelope;
use crate::models::{BatchReport, IngestEnvelope};
use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use fhub_domain::constants::{API_TOKEN_HEADER, INGEST_TAG};
use fhub_kernel::auth::key_matches;
use fhub_kernel::prelude::*;
use serde_json::Value;
use tracing::debug;

/// Carrier feed. The token may come from the `x-api-token` header or the body's `apiToken`.
#[api_handler(
    post,
    path = "/api/ingest/packages",
    request_body = IngestEnvelope,
    responses(
        (status = OK, description = "Per-record results", body = BatchReport),
        (status = BAD_REQUEST, description = "Malformed body", body = ErrorResponse),
        (status = UNAUTHORIZED, description = "Missing or invalid token", body = ErrorResponse),
    ),
    tag = INGEST_TAG,
)]
pub(super) async fn ingest_packages(
    State(state): State<ApiState>,
    headers: HeaderMap,
    ApiJson(body): ApiJson<Value>,
) -> Result<Json<BatchReport>, ApiError> {
    let (body_token, records) = split_envelope(body).map_err(ApiError::validation)?;

    let tokens = &state.config.security.ingest_tokens;
    let header_token = headers.get(API_TOKEN_HEADER).and_then(|v| v.to_str().ok());
    let authorized = header_token.is_some_and(|t| key_matches(tokens, t))
        || body_token.as_deref().is_some_and(|t| key_matches(tokens, t));
    if !authorized {
        debug!("Rejected carrier feed without a valid token");
        return Err(ApiError::unauthorized("Invalid or missing API token"));
    }

    let tracking = state.try_get_slice::<Tracking>()?;
    Ok(Json(tracking.ingest(records).await))
}
