//! Pure aggregations. Percentages divide by the row total, or by 1 when it is zero.

use fhub_derive::api_model;
use fhub_domain::customer::Customer;
use fhub_domain::package::{Package, PackageFlags};
use fhub_domain::status::{PackageStatus, UiStatus};
use fxhash::FxHashMap;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use utoipa::ToSchema;

/// Label for packages without a branch.
pub const UNASSIGNED: &str = "Unassigned";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    #[default]
    Status,
    Branch,
    Customers,
    Daily,
}

#[api_model]
#[derive(Clone, PartialEq)]
pub struct ReportRow {
    pub key: String,
    /// Human-readable label when `key` is a code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub count: usize,
    pub percentage: f64,
    /// Total weight, on the customers report.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

#[api_model]
#[derive(Clone, PartialEq)]
pub struct UiStatusCount {
    pub status: UiStatus,
    pub count: usize,
    pub percentage: f64,
}

/// `part / whole` as a percentage with two decimals.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn percentage(part: usize, whole: usize) -> f64 {
    let whole = whole.max(1) as f64;
    (part as f64 * 10_000.0 / whole).round() / 100.0
}

fn row(key: impl Into<String>, count: usize, total: usize) -> ReportRow {
    ReportRow { key: key.into(), label: None, count, percentage: percentage(count, total), weight: None }
}

/// Every internal status, zero counts included, in lifecycle order.
#[must_use]
pub fn by_status(packages: &[Package]) -> Vec<ReportRow> {
    PackageStatus::iter()
        .map(|status| row(status.as_str(), packages.iter().filter(|p| p.status == status).count(), packages.len()))
        .collect()
}

/// Per branch, largest first.
#[must_use]
pub fn by_branch(packages: &[Package]) -> Vec<ReportRow> {
    let mut counts: FxHashMap<&str, usize> = FxHashMap::default();
    for package in packages {
        *counts.entry(package.branch.as_deref().unwrap_or(UNASSIGNED)).or_default() += 1;
    }

    let mut rows: Vec<_> = counts.into_iter().map(|(key, count)| row(key, count, packages.len())).collect();
    rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));
    rows
}

/// Top `limit` owners by package count, with their total weight. Unowned packages are skipped.
#[must_use]
pub fn top_customers(packages: &[Package], customers: &[Customer], limit: usize) -> Vec<ReportRow> {
    let mut totals: FxHashMap<&str, (usize, f64)> = FxHashMap::default();
    for package in packages {
        if let Some(owner) = package.user_code.as_deref() {
            let entry = totals.entry(owner).or_default();
            entry.0 += 1;
            entry.1 += package.weight.unwrap_or_default();
        }
    }

    let mut rows: Vec<_> = totals
        .into_iter()
        .map(|(code, (count, weight))| ReportRow {
            label: customers.iter().find(|c| c.user_code == code).map(Customer::display_name),
            weight: Some((weight * 100.0).round() / 100.0),
            ..row(code, count, packages.len())
        })
        .collect();
    rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));
    rows.truncate(limit);
    rows
}

/// Per creation day (UTC), oldest first.
#[must_use]
pub fn daily(packages: &[Package]) -> Vec<ReportRow> {
    let mut counts: FxHashMap<String, usize> = FxHashMap::default();
    for package in packages {
        *counts.entry(package.created_at.date_naive().to_string()).or_default() += 1;
    }

    let mut rows: Vec<_> = counts.into_iter().map(|(key, count)| row(key, count, packages.len())).collect();
    rows.sort_by(|a, b| a.key.cmp(&b.key));
    rows
}

/// Every UI status, zero counts included.
#[must_use]
pub fn by_ui_status(packages: &[Package]) -> Vec<UiStatusCount> {
    UiStatus::iter()
        .map(|status| {
            let count = packages.iter().filter(|p| p.ui_status() == status).count();
            UiStatusCount { status, count, percentage: percentage(count, packages.len()) }
        })
        .collect()
}

#[must_use]
pub fn with_discrepancy(packages: &[Package]) -> usize {
    packages.iter().filter(|p| p.flags.contains(PackageFlags::DISCREPANCY)).count()
}

#[must_use]
pub fn invoices_awaiting_review(packages: &[Package]) -> usize {
    packages.iter().map(Package::pending_invoices).sum()
}
