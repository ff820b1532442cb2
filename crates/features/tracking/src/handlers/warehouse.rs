use super::requested_status;
use crate::Tracking;
use crate::lifecycle::StatusUpdate;
use crate::models::{BatchReport, BulkStatusRequest, PackageList, WarehousePackageRequest, WarehouseReportQuery, WriteResponse};
use axum::Json;
use axum::extract::State;
use fhub_domain::constants::WAREHOUSE_TAG;
use fhub_domain::package::UpdateSource;
use fhub_domain::ports::PackageQuery;
use fhub_kernel::prelude::*;

#[api_handler(
    post,
    path = "/api/warehouse/packages",
    request_body = WarehousePackageRequest,
    responses(
        (status = OK, description = "Package created or updated", body = WriteResponse),
        (status = BAD_REQUEST, description = "Invalid input", body = ErrorResponse),
        (status = UNAUTHORIZED, description = "Missing or invalid credentials", body = ErrorResponse),
    ),
    tag = WAREHOUSE_TAG,
)]
pub(super) async fn upsert_package(
    caller: Caller,
    State(state): State<ApiState>,
    ApiJson(req): ApiJson<WarehousePackageRequest>,
) -> Result<Json<WriteResponse>, ApiError> {
    caller.require_staff()?;
    let tracking = state.try_get_slice::<Tracking>()?;

    let status = requested_status(&req.status)?;
    let mut patch = req.patch();
    if patch.entry_staff.is_none() {
        patch.entry_staff = Some(caller.actor().to_owned());
    }

    let update = StatusUpdate::new(UpdateSource::Warehouse).status(status).note(req.note).patch(patch);
    let applied = tracking.record(&req.tracking_number, update).await?;

    Ok(Json(applied.into()))
}

#[api_handler(
    post,
    path = "/api/warehouse/packages/bulk-status",
    request_body = BulkStatusRequest,
    responses(
        (status = OK, description = "Per-package results", body = BatchReport),
        (status = BAD_REQUEST, description = "Unknown status", body = ErrorResponse),
        (status = UNAUTHORIZED, description = "Missing or invalid credentials", body = ErrorResponse),
    ),
    tag = WAREHOUSE_TAG,
)]
pub(super) async fn bulk_status(
    caller: Caller,
    State(state): State<ApiState>,
    ApiJson(req): ApiJson<BulkStatusRequest>,
) -> Result<Json<BatchReport>, ApiError> {
    caller.require_staff()?;
    let tracking = state.try_get_slice::<Tracking>()?;

    let status = requested_status(&req.status)?;
    let report =
        tracking.bulk_status(&req.tracking_numbers, status, req.note, req.location, caller.actor()).await;

    Ok(Json(report))
}

#[api_handler(
    get,
    path = "/api/warehouse/packages",
    params(WarehouseReportQuery),
    responses(
        (status = OK, description = "Matching packages, newest first", body = PackageList),
        (status = BAD_REQUEST, description = "Invalid filter", body = ErrorResponse),
        (status = UNAUTHORIZED, description = "Missing or invalid credentials", body = ErrorResponse),
    ),
    tag = WAREHOUSE_TAG,
)]
pub(super) async fn report(
    caller: Caller,
    State(state): State<ApiState>,
    ApiQuery(filter): ApiQuery<WarehouseReportQuery>,
) -> Result<Json<PackageList>, ApiError> {
    caller.require_staff()?;
    let tracking = state.try_get_slice::<Tracking>()?;

    let query = PackageQuery {
        user_code: filter.user_code.filter(|c| !c.trim().is_empty()),
        status: filter.status.as_deref().map(requested_status).transpose()?,
        branch: filter.branch.filter(|b| !b.trim().is_empty()),
        ..PackageQuery::default()
    }
    .created_between(filter.from, filter.to);

    Ok(Json(tracking.list(&query).await?.into()))
}
