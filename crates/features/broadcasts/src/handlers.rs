use crate::Broadcasts;
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use fhub_domain::broadcast::Broadcast;
use fhub_domain::constants::BROADCASTS_TAG;
use fhub_kernel::prelude::*;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

#[api_model]
pub struct BroadcastRequest {
    pub title: String,
    pub message: String,
    /// Target branch; omit to reach every customer.
    pub branch: Option<String>,
}

/// Routes of the broadcasts slice.
pub fn router() -> OpenApiRouter<ApiState> {
    OpenApiRouter::new().routes(routes!(create_broadcast)).routes(routes!(list_broadcasts))
}

#[api_handler(
    post,
    path = "/api/admin/broadcasts",
    request_body = BroadcastRequest,
    responses(
        (status = CREATED, description = "Broadcast stored and queued for mailing", body = Broadcast),
        (status = BAD_REQUEST, description = "Invalid input", body = ErrorResponse),
        (status = FORBIDDEN, description = "Admin role required", body = ErrorResponse),
    ),
    tag = BROADCASTS_TAG,
)]
async fn create_broadcast(
    caller: Caller,
    State(state): State<ApiState>,
    ApiJson(req): ApiJson<BroadcastRequest>,
) -> Result<(StatusCode, Json<Broadcast>), ApiError> {
    let admin = caller.require_admin()?;
    let broadcasts = state.try_get_slice::<Broadcasts>()?;
    let broadcast = broadcasts.publish(&admin.user_code, req).await?;
    Ok((StatusCode::CREATED, Json(broadcast)))
}

#[api_handler(
    get,
    path = "/api/broadcasts",
    responses(
        (status = OK, description = "Broadcasts for the caller, newest first", body = Vec<Broadcast>),
        (status = FORBIDDEN, description = "Session required", body = ErrorResponse),
    ),
    tag = BROADCASTS_TAG,
)]
async fn list_broadcasts(caller: Caller, State(state): State<ApiState>) -> Result<Json<Vec<Broadcast>>, ApiError> {
    let session = caller.require_session()?;
    let broadcasts = state.try_get_slice::<Broadcasts>()?;

    let audience = (!session.role.is_staff()).then_some(session.user_code.as_str());
    Ok(Json(broadcasts.visible_to(audience).await?))
}
