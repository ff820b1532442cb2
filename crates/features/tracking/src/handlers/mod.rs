mod customer;
mod ingest;
mod warehouse;

use crate::TrackingError;
use fhub_domain::status::PackageStatus;
use fhub_kernel::server::ApiState;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

/// Routes of the tracking slice.
pub fn router() -> OpenApiRouter<ApiState> {
    OpenApiRouter::new()
        .routes(routes!(warehouse::upsert_package, warehouse::report))
        .routes(routes!(warehouse::bulk_status))
        .routes(routes!(ingest::ingest_packages))
        .routes(routes!(customer::prealert))
        .routes(routes!(customer::list_packages))
        .routes(routes!(customer::get_package))
}

/// Strict status parsing for endpoints that reject unknown values.
fn requested_status(input: &str) -> Result<PackageStatus, TrackingError> {
    PackageStatus::parse_requested(input)
        .ok_or_else(|| TrackingError::validation(format!("Unknown status value: {input}")))
}
