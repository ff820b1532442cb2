//! Invoice slice.
//!
//! Customers attach invoice files (PDF, JPEG, PNG, WebP) to their own packages. Every file is
//! validated before any is written; files land atomically under
//! `<userCode>/<trackingNumber>/<id>-<name>` in the upload storage and are removed again if
//! the package update fails. Admins review each submitted record independently of the
//! package's shipping status.

mod error;
mod handlers;
pub mod validate;

pub use crate::error::{InvoiceError, InvoiceErrorExt};
pub use crate::handlers::{InvoiceReceipt, ReviewRequest, router};
pub use crate::validate::UploadedFile;

use chrono::Utc;
use fhub_domain::config::UploadsConfig;
use fhub_domain::package::{InvoiceDocument, InvoiceRecord, InvoiceStatus};
use fhub_domain::ports::PackageRepository;
use fhub_kernel::domain::registry::InitializedSlice;
use fhub_kernel::safe_nanoid;
use fhub_storage::{Storage, sanitize_file_name};
use std::sync::Arc;
use tracing::{info, warn};

/// An invoice submission before validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvoiceUpload {
    pub tracking_number: String,
    pub amount: Option<f64>,
    pub note: Option<String>,
    pub files: Vec<UploadedFile>,
}

/// Invoices feature state
#[fhub_derive::fhub_slice]
pub struct Invoices {
    packages: Arc<dyn PackageRepository>,
    storage: Storage,
    limits: UploadsConfig,
}

impl InvoicesInner {
    #[must_use]
    pub const fn limits(&self) -> &UploadsConfig {
        &self.limits
    }

    /// Validates, stores and records an invoice for a package the customer owns.
    ///
    /// # Errors
    /// Validation errors leave no trace. [`InvoiceError::NotFound`] when the package is missing
    /// or owned by someone else.
    pub async fn submit(&self, user_code: &str, upload: InvoiceUpload) -> Result<InvoiceReceipt, InvoiceError> {
        let tracking_number = upload.tracking_number.trim().to_owned();
        if tracking_number.is_empty() {
            return Err(InvoiceError::validation("trackingNumber is required"));
        }
        if upload.files.is_empty() {
            return Err(InvoiceError::validation("At least one file is required"));
        }
        if upload.files.len() > self.limits.max_files {
            return Err(InvoiceError::validation(format!(
                "At most {} files may be uploaded at once",
                self.limits.max_files
            )));
        }
        if let Some(amount) = upload.amount
            && (!amount.is_finite() || amount < 0.0)
        {
            return Err(InvoiceError::validation("amount must be a non-negative number"));
        }
        for file in &upload.files {
            validate::check_file(file, self.limits.max_file_bytes)?;
        }

        self.packages
            .find(&tracking_number)
            .await?
            .filter(|p| p.is_owned_by(user_code))
            .ok_or_else(|| not_found(format!("Package {tracking_number} not found")))?;

        let now = Utc::now();
        let documents = self.store_files(user_code, &tracking_number, upload.files, now).await?;

        let record = InvoiceRecord {
            id: safe_nanoid!(),
            document_ids: documents.iter().map(|d| d.id.clone()).collect(),
            amount: upload.amount,
            note: upload.note.map(|n| n.trim().to_owned()).filter(|n| !n.is_empty()),
            status: InvoiceStatus::Submitted,
            submitted_at: now,
            reviewed_at: None,
            review_note: None,
        };
        let recorded = match self.packages.append_invoice(&tracking_number, &record, &documents, now).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(not_found(format!("Package {tracking_number} not found"))),
            Err(e) => Err(e.into()),
        };
        if let Err(e) = recorded {
            let paths: Vec<_> = documents.iter().map(|d| d.stored_path.as_str()).collect();
            self.storage.delete_all(&paths).await;
            return Err(e);
        }

        info!(%tracking_number, invoice = %record.id, files = documents.len(), "Invoice submitted");
        Ok(InvoiceReceipt { tracking_number, record, documents })
    }

    async fn store_files(
        &self,
        user_code: &str,
        tracking_number: &str,
        files: Vec<UploadedFile>,
        now: chrono::DateTime<Utc>,
    ) -> Result<Vec<InvoiceDocument>, InvoiceError> {
        let folder = format!("{}/{}", sanitize_file_name(user_code), sanitize_file_name(tracking_number));
        let mut documents: Vec<InvoiceDocument> = Vec::with_capacity(files.len());

        for file in files {
            let id = safe_nanoid!();
            let file_name = sanitize_file_name(&file.file_name);
            let stored_path = format!("{folder}/{id}-{file_name}");

            if let Err(e) = self.storage.write(&stored_path, &file.bytes).await {
                warn!(path = %stored_path, error = %e, "Invoice file write failed, rolling back");
                let written: Vec<_> = documents.iter().map(|d| d.stored_path.as_str()).collect();
                self.storage.delete_all(&written).await;
                return Err(e.into());
            }

            documents.push(InvoiceDocument {
                id,
                file_name,
                content_type: validate::essence(&file.content_type),
                size_bytes: file.bytes.len() as u64,
                stored_path,
                uploaded_at: now,
            });
        }
        Ok(documents)
    }

    /// Marks an invoice record reviewed or rejected.
    ///
    /// # Errors
    /// [`InvoiceError::Validation`] when `status` is `submitted`, [`InvoiceError::NotFound`]
    /// for an unknown package or record.
    pub async fn review(
        &self,
        tracking_number: &str,
        invoice_id: &str,
        status: InvoiceStatus,
        note: Option<String>,
    ) -> Result<InvoiceRecord, InvoiceError> {
        if status == InvoiceStatus::Submitted {
            return Err(InvoiceError::validation("Review status must be `reviewed` or `rejected`"));
        }

        let tracking_number = tracking_number.trim();
        let package = self
            .packages
            .find(tracking_number)
            .await?
            .ok_or_else(|| not_found(format!("Package {tracking_number} not found")))?;

        let mut record = package
            .invoice_records
            .into_iter()
            .find(|r| r.id == invoice_id)
            .ok_or_else(|| not_found(format!("Invoice {invoice_id} not found")))?;

        let now = Utc::now();
        record.status = status;
        record.reviewed_at = Some(now);
        record.review_note = note.map(|n| n.trim().to_owned()).filter(|n| !n.is_empty());

        if !self.packages.update_invoice(tracking_number, &record, now).await? {
            return Err(not_found(format!("Invoice {invoice_id} not found")));
        }

        info!(tracking_number, invoice = invoice_id, %status, "Invoice reviewed");
        Ok(record)
    }
}

fn not_found(message: String) -> InvoiceError {
    InvoiceError::NotFound { message: message.into(), context: None }
}

/// Creates the slice handle without registering it.
#[must_use]
pub fn service(packages: Arc<dyn PackageRepository>, storage: Storage, limits: UploadsConfig) -> Invoices {
    Invoices::new(InvoicesInner { packages, storage, limits })
}

/// Initialize the invoices feature.
///
/// # Errors
/// Currently infallible; the signature matches the other slices.
pub fn init(
    packages: Arc<dyn PackageRepository>,
    storage: Storage,
    limits: UploadsConfig,
) -> Result<InitializedSlice, InvoiceError> {
    tracing::info!(root = %storage.root().display(), "Invoices slice initialized");
    Ok(InitializedSlice::new(service(packages, storage, limits)))
}
