//! Analytics slice: read-only reports and dashboards over the package collection.

mod error;
mod handlers;
pub mod reports;

pub use crate::error::{AnalyticsError, AnalyticsErrorExt};
pub use crate::handlers::{AdminOverview, AnalyticsQuery, CustomerDashboard, Report, router};

use crate::reports::ReportKind;
use fhub_domain::ports::{CustomerRepository, PackageQuery, PackageRepository};
use fhub_domain::status::PackageStatus;
use fhub_kernel::domain::registry::InitializedSlice;
use std::sync::Arc;

pub const DEFAULT_TOP_CUSTOMERS: usize = 10;
pub const MAX_TOP_CUSTOMERS: usize = 100;

/// Analytics feature state
#[fhub_derive::fhub_slice]
pub struct Analytics {
    packages: Arc<dyn PackageRepository>,
    customers: Arc<dyn CustomerRepository>,
}

impl AnalyticsInner {
    /// Builds one report over packages created within the query's date range.
    ///
    /// # Errors
    /// [`AnalyticsError::Validation`] when `from` is after `to` or `limit` is zero.
    pub async fn report(&self, query: &AnalyticsQuery) -> Result<Report, AnalyticsError> {
        if let (Some(from), Some(to)) = (query.from, query.to)
            && from > to
        {
            return Err(AnalyticsError::Validation { message: "from must not be after to".into(), context: None });
        }
        let limit = query.limit.unwrap_or(DEFAULT_TOP_CUSTOMERS);
        if limit == 0 {
            return Err(AnalyticsError::Validation { message: "limit must be positive".into(), context: None });
        }

        let packages = self.packages.list(&PackageQuery::default().created_between(query.from, query.to)).await?;
        let rows = match query.report {
            ReportKind::Status => reports::by_status(&packages),
            ReportKind::Branch => reports::by_branch(&packages),
            ReportKind::Customers => {
                let customers = self.customers.list().await?;
                reports::top_customers(&packages, &customers, limit.min(MAX_TOP_CUSTOMERS))
            },
            ReportKind::Daily => reports::daily(&packages),
        };

        Ok(Report { report: query.report, from: query.from, to: query.to, total: packages.len(), rows })
    }

    /// Back-office headline numbers over every package.
    ///
    /// # Errors
    /// [`AnalyticsError::Store`] when a repository fails.
    pub async fn overview(&self) -> Result<AdminOverview, AnalyticsError> {
        let packages = self.packages.list(&PackageQuery::default()).await?;
        let customers = self.customers.list().await?;
        let delivered = packages.iter().filter(|p| p.status == PackageStatus::Delivered).count();

        Ok(AdminOverview {
            total_packages: packages.len(),
            total_customers: customers.len(),
            unassigned_packages: packages.iter().filter(|p| p.user_code.is_none()).count(),
            by_status: reports::by_status(&packages),
            with_discrepancy: reports::with_discrepancy(&packages),
            invoices_awaiting_review: reports::invoices_awaiting_review(&packages),
            delivered_percentage: reports::percentage(delivered, packages.len()),
        })
    }

    /// The customer's own packages, counted per UI status.
    ///
    /// # Errors
    /// [`AnalyticsError::Store`] when the repository fails.
    pub async fn dashboard(&self, user_code: &str) -> Result<CustomerDashboard, AnalyticsError> {
        let packages = self.packages.list(&PackageQuery::for_user(user_code)).await?;

        Ok(CustomerDashboard {
            total: packages.len(),
            by_status: reports::by_ui_status(&packages),
            invoices_awaiting_review: reports::invoices_awaiting_review(&packages),
        })
    }
}

/// Creates the slice handle without registering it.
#[must_use]
pub fn service(packages: Arc<dyn PackageRepository>, customers: Arc<dyn CustomerRepository>) -> Analytics {
    Analytics::new(AnalyticsInner { packages, customers })
}

/// Initialize the analytics feature.
///
/// # Errors
/// Currently infallible; the signature matches the other slices.
pub fn init(
    packages: Arc<dyn PackageRepository>,
    customers: Arc<dyn CustomerRepository>,
) -> Result<InitializedSlice, AnalyticsError> {
    tracing::info!("Analytics slice initialized");
    Ok(InitializedSlice::new(service(packages, customers)))
}
