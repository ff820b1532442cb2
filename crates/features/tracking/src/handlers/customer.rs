use super::requested_status;
use crate::Tracking;
use crate::lifecycle::{PackagePatch, StatusUpdate};
use crate::models::{PackageList, PackageListQuery, PackageView, PreAlertRequest, WriteResponse};
use axum::Json;
use axum::extract::{Path, State};
use fhub_domain::constants::TRACKING_TAG;
use fhub_domain::package::UpdateSource;
use fhub_domain::ports::PackageQuery;
use fhub_kernel::prelude::*;

#[api_handler(
    post,
    path = "/api/prealerts",
    request_body = PreAlertRequest,
    responses(
        (status = OK, description = "Package declared", body = WriteResponse),
        (status = CONFLICT, description = "Package belongs to another customer", body = ErrorResponse),
        (status = FORBIDDEN, description = "Not a customer session", body = ErrorResponse),
    ),
    tag = TRACKING_TAG,
)]
pub(super) async fn prealert(
    caller: Caller,
    State(state): State<ApiState>,
    ApiJson(req): ApiJson<PreAlertRequest>,
) -> Result<Json<WriteResponse>, ApiError> {
    let user_code = caller.require_customer()?;
    let tracking = state.try_get_slice::<Tracking>()?;

    let update = StatusUpdate::new(UpdateSource::PreAlert).note(req.note).patch(PackagePatch {
        shipper: req.shipper,
        description: req.description,
        weight: req.weight,
        ..PackagePatch::default()
    });
    let applied = tracking.prealert(user_code, &req.tracking_number, update).await?;

    Ok(Json(applied.into()))
}

/// Customers see their own packages; staff see all.
#[api_handler(
    get,
    path = "/api/packages",
    params(PackageListQuery),
    responses(
        (status = OK, description = "Packages, newest first", body = PackageList),
        (status = UNAUTHORIZED, description = "Missing credentials", body = ErrorResponse),
    ),
    tag = TRACKING_TAG,
)]
pub(super) async fn list_packages(
    caller: Caller,
    State(state): State<ApiState>,
    ApiQuery(filter): ApiQuery<PackageListQuery>,
) -> Result<Json<PackageList>, ApiError> {
    let tracking = state.try_get_slice::<Tracking>()?;

    let mut query = PackageQuery {
        status: filter.status.as_deref().map(requested_status).transpose()?,
        ..PackageQuery::default()
    };
    if !caller.is_staff() {
        query.user_code = caller.user_code().map(str::to_owned);
    }

    Ok(Json(tracking.list(&query).await?.into()))
}

#[api_handler(
    get,
    path = "/api/packages/{tracking_number}",
    params(("tracking_number" = String, Path, description = "Tracking number")),
    responses(
        (status = OK, description = "Package with its history", body = PackageView),
        (status = NOT_FOUND, description = "Unknown package or not visible to the caller", body = ErrorResponse),
    ),
    tag = TRACKING_TAG,
)]
pub(super) async fn get_package(
    caller: Caller,
    State(state): State<ApiState>,
    Path(tracking_number): Path<String>,
) -> Result<Json<PackageView>, ApiError> {
    let tracking = state.try_get_slice::<Tracking>()?;

    let owner = if caller.is_staff() { None } else { caller.user_code() };
    let package = tracking.find_visible(&tracking_number, owner).await?;

    Ok(Json(package.into()))
}
