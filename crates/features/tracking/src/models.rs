//! Request and response bodies of the tracking endpoints.

use crate::lifecycle::{Applied, PackagePatch};
use chrono::NaiveDate;
use fhub_derive::api_model;
use fhub_domain::package::Package;
use fhub_domain::status::UiStatus;
use serde::Deserialize;
use utoipa::IntoParams;

/// A package as customers and staff see it.
#[api_model(deny_unknown_fields = false)]
pub struct PackageView {
    #[serde(flatten)]
    pub package: Package,
    /// Customer-facing status derived from `status`.
    pub ui_status: UiStatus,
}

impl From<Package> for PackageView {
    fn from(package: Package) -> Self {
        let ui_status = package.ui_status();
        Self { package, ui_status }
    }
}

/// Result of a single-package write.
#[api_model]
pub struct WriteResponse {
    pub created: bool,
    /// Created, or moved to a different status.
    pub status_changed: bool,
    pub package: PackageView,
}

impl From<Applied> for WriteResponse {
    fn from(applied: Applied) -> Self {
        Self { created: applied.created, status_changed: applied.status_changed, package: applied.package.into() }
    }
}

/// Warehouse create/update of one package.
#[api_model]
pub struct WarehousePackageRequest {
    pub tracking_number: String,
    /// Internal (`At Warehouse`) or UI (`ready_for_pickup`) status.
    pub status: String,
    pub note: Option<String>,
    pub user_code: Option<String>,
    pub weight: Option<f64>,
    pub shipper: Option<String>,
    pub description: Option<String>,
    pub length: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub branch: Option<String>,
    pub service_type_id: Option<String>,
    pub hazmat_code_id: Option<String>,
    pub location: Option<String>,
    pub entry_staff: Option<String>,
    pub external_status: Option<String>,
    pub customs_required: Option<bool>,
    pub discrepancy: Option<bool>,
    pub hazardous: Option<bool>,
    pub fragile: Option<bool>,
    pub discrepancy_description: Option<String>,
}

impl WarehousePackageRequest {
    pub(crate) fn patch(&self) -> PackagePatch {
        PackagePatch {
            user_code: self.user_code.clone(),
            weight: self.weight,
            shipper: self.shipper.clone(),
            description: self.description.clone(),
            length: self.length,
            width: self.width,
            height: self.height,
            branch: self.branch.clone(),
            service_type_id: self.service_type_id.clone(),
            hazmat_code_id: self.hazmat_code_id.clone(),
            location: self.location.clone(),
            entry_staff: self.entry_staff.clone(),
            external_status: self.external_status.clone(),
            customs_required: self.customs_required,
            discrepancy: self.discrepancy,
            hazardous: self.hazardous,
            fragile: self.fragile,
            discrepancy_description: self.discrepancy_description.clone(),
        }
    }
}

/// One status applied to many packages (manifest dispatch).
#[api_model]
pub struct BulkStatusRequest {
    pub tracking_numbers: Vec<String>,
    pub status: String,
    pub note: Option<String>,
    pub location: Option<String>,
}

/// Customer declaration of an incoming package.
#[api_model]
pub struct PreAlertRequest {
    pub tracking_number: String,
    pub shipper: Option<String>,
    pub description: Option<String>,
    pub weight: Option<f64>,
    pub note: Option<String>,
}

/// Carrier feed body. A bare array of records is accepted too.
#[api_model]
pub struct IngestEnvelope {
    /// Legacy alternative to the `x-api-token` header.
    pub api_token: Option<String>,
    #[schema(value_type = Vec<Object>)]
    pub packages: Vec<serde_json::Value>,
}

#[api_model]
pub struct BatchItemResult {
    pub tracking_number: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchItemResult {
    pub(crate) fn ok(tracking_number: String) -> Self {
        Self { tracking_number, ok: true, error: None }
    }

    pub(crate) fn failed(tracking_number: String, error: impl Into<String>) -> Self {
        Self { tracking_number, ok: false, error: Some(error.into()) }
    }
}

/// Per-item outcome of a batch. `processed` always equals the input length.
#[api_model]
pub struct BatchReport {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub results: Vec<BatchItemResult>,
}

impl From<Vec<BatchItemResult>> for BatchReport {
    fn from(results: Vec<BatchItemResult>) -> Self {
        let succeeded = results.iter().filter(|r| r.ok).count();
        Self { processed: results.len(), succeeded, failed: results.len() - succeeded, results }
    }
}

#[api_model]
pub struct PackageList {
    pub total: usize,
    pub packages: Vec<PackageView>,
}

impl From<Vec<Package>> for PackageList {
    fn from(packages: Vec<Package>) -> Self {
        Self { total: packages.len(), packages: packages.into_iter().map(PackageView::from).collect() }
    }
}

/// Warehouse report filters.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct WarehouseReportQuery {
    /// Internal or UI status.
    pub status: Option<String>,
    pub branch: Option<String>,
    pub user_code: Option<String>,
    /// First creation day, inclusive (`YYYY-MM-DD`).
    pub from: Option<NaiveDate>,
    /// Last creation day, inclusive.
    pub to: Option<NaiveDate>,
}

/// Customer listing filters.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PackageListQuery {
    pub status: Option<String>,
}
