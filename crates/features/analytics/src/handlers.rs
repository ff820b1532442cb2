use crate::Analytics;
use crate::reports::{ReportKind, ReportRow, UiStatusCount};
use axum::Json;
use axum::extract::State;
use chrono::NaiveDate;
use fhub_domain::constants::ANALYTICS_TAG;
use fhub_kernel::prelude::*;
use serde::Deserialize;
use utoipa::IntoParams;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct AnalyticsQuery {
    /// `status`, `branch`, `customers` or `daily`.
    #[serde(default)]
    pub report: ReportKind,
    /// First creation day, inclusive (`YYYY-MM-DD`).
    pub from: Option<NaiveDate>,
    /// Last creation day, inclusive.
    pub to: Option<NaiveDate>,
    /// Rows on the customers report.
    pub limit: Option<usize>,
}

#[api_model]
pub struct Report {
    pub report: ReportKind,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    /// Packages in range; the percentage denominator.
    pub total: usize,
    pub rows: Vec<ReportRow>,
}

#[api_model]
pub struct AdminOverview {
    pub total_packages: usize,
    pub total_customers: usize,
    pub unassigned_packages: usize,
    pub by_status: Vec<ReportRow>,
    pub with_discrepancy: usize,
    pub invoices_awaiting_review: usize,
    pub delivered_percentage: f64,
}

#[api_model]
pub struct CustomerDashboard {
    pub total: usize,
    pub by_status: Vec<UiStatusCount>,
    pub invoices_awaiting_review: usize,
}

/// Routes of the analytics slice.
pub fn router() -> OpenApiRouter<ApiState> {
    OpenApiRouter::new()
        .routes(routes!(analytics_report))
        .routes(routes!(admin_dashboard))
        .routes(routes!(customer_dashboard))
}

#[api_handler(
    get,
    path = "/api/admin/analytics",
    params(AnalyticsQuery),
    responses(
        (status = OK, description = "Aggregated report", body = Report),
        (status = BAD_REQUEST, description = "Unknown report or invalid range", body = ErrorResponse),
        (status = FORBIDDEN, description = "Admin role required", body = ErrorResponse),
    ),
    tag = ANALYTICS_TAG,
)]
async fn analytics_report(
    caller: Caller,
    State(state): State<ApiState>,
    ApiQuery(query): ApiQuery<AnalyticsQuery>,
) -> Result<Json<Report>, ApiError> {
    caller.require_admin()?;
    let analytics = state.try_get_slice::<Analytics>()?;
    Ok(Json(analytics.report(&query).await?))
}

#[api_handler(
    get,
    path = "/api/admin/dashboard",
    responses(
        (status = OK, description = "Back-office headline numbers", body = AdminOverview),
        (status = FORBIDDEN, description = "Admin role required", body = ErrorResponse),
    ),
    tag = ANALYTICS_TAG,
)]
async fn admin_dashboard(caller: Caller, State(state): State<ApiState>) -> Result<Json<AdminOverview>, ApiError> {
    caller.require_admin()?;
    let analytics = state.try_get_slice::<Analytics>()?;
    Ok(Json(analytics.overview().await?))
}

#[api_handler(
    get,
    path = "/api/dashboard",
    responses(
        (status = OK, description = "The caller's packages per status", body = CustomerDashboard),
        (status = FORBIDDEN, description = "Not a customer session", body = ErrorResponse),
    ),
    tag = ANALYTICS_TAG,
)]
async fn customer_dashboard(
    caller: Caller,
    State(state): State<ApiState>,
) -> Result<Json<CustomerDashboard>, ApiError> {
    let user_code = caller.require_customer()?;
    let analytics = state.try_get_slice::<Analytics>()?;
    Ok(Json(analytics.dashboard(user_code).await?))
}
