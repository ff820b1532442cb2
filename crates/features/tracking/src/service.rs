use crate::error::TrackingError;
use crate::feed::{ExternalRecord, RecordRejection};
use crate::lifecycle::{self, Applied, PackagePatch, StatusUpdate};
use crate::models::{BatchItemResult, BatchReport};
use crate::TrackingInner;
use chrono::Utc;
use fhub_domain::package::{Package, UpdateSource};
use fhub_domain::ports::{PackageQuery, StoreError};
use fhub_domain::status::PackageStatus;
use serde_json::Value;
use tracing::{debug, info, warn};

/// Longest accepted tracking number.
pub const MAX_TRACKING_NUMBER_LEN: usize = 64;

const CUSTOMER_NOT_FOUND: &str = "Customer not found";

impl TrackingInner {
    /// Find-or-create, apply, persist, then announce the status change.
    ///
    /// # Errors
    /// [`TrackingError::Validation`] for a malformed tracking number, [`TrackingError::Store`]
    /// when the repository fails.
    pub async fn record(&self, tracking_number: &str, update: StatusUpdate) -> Result<Applied, TrackingError> {
        let tracking_number = normalize_tracking_number(tracking_number)?;
        let existing = self.packages.find(&tracking_number).await?;
        self.write(existing, &tracking_number, update).await
    }

    async fn write(
        &self,
        existing: Option<Package>,
        tracking_number: &str,
        update: StatusUpdate,
    ) -> Result<Applied, TrackingError> {
        let applied = lifecycle::apply(existing, tracking_number, update, Utc::now());
        self.packages.upsert_fields(&applied.package).await?;
        if let Some(entry) = applied.package.history.last().filter(|_| applied.appended)
            && !self.packages.append_history(tracking_number, entry).await?
        {
            return Err(StoreError::from(format!("Package {tracking_number} vanished mid-write")).into());
        }

        debug!(
            tracking_number,
            status = %applied.package.status,
            created = applied.created,
            status_changed = applied.status_changed,
            appended = applied.appended,
            "Package written"
        );

        if let Some(event) = applied.event() {
            match self.events.publish(event) {
                Ok(listeners) => debug!(tracking_number, listeners, "Status change published"),
                Err(e) => warn!(tracking_number, error = %e, "Failed to publish status change"),
            }
        }

        Ok(applied)
    }

    /// Applies one status to every listed package. Failures are isolated per item.
    pub async fn bulk_status(
        &self,
        tracking_numbers: &[String],
        status: PackageStatus,
        note: Option<String>,
        location: Option<String>,
        actor: &str,
    ) -> BatchReport {
        let mut results = Vec::with_capacity(tracking_numbers.len());

        for tracking_number in tracking_numbers {
            let update = StatusUpdate::new(UpdateSource::BulkUpdate).status(status).note(note.clone()).patch(
                PackagePatch {
                    location: location.clone(),
                    entry_staff: Some(actor.to_owned()),
                    ..PackagePatch::default()
                },
            );

            results.push(match self.record(tracking_number, update).await {
                Ok(_) => BatchItemResult::ok(tracking_number.trim().to_owned()),
                Err(e) => BatchItemResult::failed(tracking_number.clone(), item_error(&e)),
            });
        }

        let report = BatchReport::from(results);
        info!(processed = report.processed, failed = report.failed, %status, "Bulk status update applied");
        report
    }

    /// Upserts carrier records. A bad record never aborts the batch.
    pub async fn ingest(&self, records: Vec<Value>) -> BatchReport {
        let mut results = Vec::with_capacity(records.len());

        for value in records {
            results.push(self.ingest_one(&value).await);
        }

        let report = BatchReport::from(results);
        info!(
            processed = report.processed,
            succeeded = report.succeeded,
            failed = report.failed,
            "Carrier feed ingested"
        );
        report
    }

    async fn ingest_one(&self, value: &Value) -> BatchItemResult {
        let record = match ExternalRecord::parse(value) {
            Ok(record) => record,
            Err(rejection) => return BatchItemResult::failed(raw_tracking_number(value, rejection), rejection.message()),
        };

        match self.customers.find(&record.user_code).await {
            Ok(Some(_)) => {},
            Ok(None) => return BatchItemResult::failed(record.tracking_number, CUSTOMER_NOT_FOUND),
            Err(e) => {
                warn!(user_code = %record.user_code, error = %e, "Customer lookup failed");
                return BatchItemResult::failed(record.tracking_number, "Customer lookup failed");
            },
        }

        match self.record(&record.tracking_number, record.update).await {
            Ok(_) => BatchItemResult::ok(record.tracking_number),
            Err(e) => BatchItemResult::failed(record.tracking_number, item_error(&e)),
        }
    }

    /// Declares an incoming package for `user_code`, claiming it if unowned.
    ///
    /// # Errors
    /// [`TrackingError::Conflict`] when another customer owns the package.
    pub async fn prealert(
        &self,
        user_code: &str,
        tracking_number: &str,
        update: StatusUpdate,
    ) -> Result<Applied, TrackingError> {
        let tracking_number = normalize_tracking_number(tracking_number)?;
        let existing = self.packages.find(&tracking_number).await?;

        if let Some(owner) = existing.as_ref().and_then(|p| p.user_code.as_deref())
            && owner != user_code
        {
            return Err(TrackingError::Conflict {
                message: format!("Package {tracking_number} belongs to another customer").into(),
                context: None,
            });
        }

        let mut update = update;
        update.patch.user_code = Some(user_code.to_owned());
        self.write(existing, &tracking_number, update).await
    }

    /// Fetches a package visible to `owner` (`None` for staff).
    ///
    /// Packages of other customers are reported as missing.
    ///
    /// # Errors
    /// [`TrackingError::NotFound`] or [`TrackingError::Store`].
    pub async fn find_visible(&self, tracking_number: &str, owner: Option<&str>) -> Result<Package, TrackingError> {
        let tracking_number = tracking_number.trim();
        self.packages
            .find(tracking_number)
            .await?
            .filter(|package| owner.is_none_or(|code| package.is_owned_by(code)))
            .ok_or_else(|| TrackingError::not_found(tracking_number))
    }

    /// # Errors
    /// [`TrackingError::Store`] when the repository fails.
    pub async fn list(&self, query: &PackageQuery) -> Result<Vec<Package>, TrackingError> {
        Ok(self.packages.list(query).await?)
    }
}

/// Trims and validates a tracking number.
///
/// # Errors
/// [`TrackingError::Validation`] when empty, too long or containing whitespace/control chars.
pub fn normalize_tracking_number(input: &str) -> Result<String, TrackingError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(TrackingError::validation("Tracking number is required"));
    }
    if trimmed.len() > MAX_TRACKING_NUMBER_LEN {
        return Err(TrackingError::validation(format!(
            "Tracking number exceeds {MAX_TRACKING_NUMBER_LEN} characters"
        )));
    }
    if trimmed.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(TrackingError::validation("Tracking number must not contain whitespace"));
    }
    Ok(trimmed.to_owned())
}

/// Store failures are logged, not echoed into batch results.
fn item_error(err: &TrackingError) -> String {
    match err {
        TrackingError::Store { .. } | TrackingError::Internal { .. } => {
            warn!(error = %err, "Batch item failed");
            "Internal error".to_owned()
        },
        _ => err.to_string(),
    }
}

fn raw_tracking_number(value: &Value, rejection: RecordRejection) -> String {
    match rejection {
        RecordRejection::MissingCustomerCode => ExternalRecord::tracking_number_of(value).unwrap_or_default(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracking_numbers_are_trimmed_and_checked() {
        assert_eq!(normalize_tracking_number("  TAS999 ").unwrap(), "TAS999");
        assert!(normalize_tracking_number("   ").is_err());
        assert!(normalize_tracking_number("TAS 999").is_err());
        assert!(normalize_tracking_number(&"X".repeat(MAX_TRACKING_NUMBER_LEN + 1)).is_err());
    }
}
