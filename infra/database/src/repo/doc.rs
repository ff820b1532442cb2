//! Storage shapes of the domain models.
//!
//! Documents keep timestamps as epoch milliseconds and enums as their wire strings so the
//! stored form stays stable when the Rust types evolve.

use crate::error::DatabaseError;
use chrono::{DateTime, Utc};
use fhub_domain::broadcast::Broadcast;
use fhub_domain::customer::Customer;
use fhub_domain::package::{
    HistoryEntry, InvoiceDocument, InvoiceRecord, InvoiceStatus, Package, PackageFlags,
    UpdateSource,
};
use fhub_domain::status::PackageStatus;
use std::str::FromStr;
use surrealdb::types::SurrealValue;

#[derive(Debug, Clone, SurrealValue)]
pub(crate) struct PackageDoc {
    pub tracking_number: String,
    pub user_code: Option<String>,
    pub status: String,
    pub history: Vec<HistoryDoc>,
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
    pub flags: i64,
    pub discrepancy_description: Option<String>,
    pub invoice_documents: Vec<InvoiceDocumentDoc>,
    pub invoice_records: Vec<InvoiceRecordDoc>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// The scalar columns of [`PackageDoc`]. Merged over a stored package on every write; the
/// entry collections and `created_at` are never part of it.
#[derive(Debug, Clone, SurrealValue)]
pub(crate) struct PackageFieldsDoc {
    pub tracking_number: String,
    pub user_code: Option<String>,
    pub status: String,
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
    pub flags: i64,
    pub discrepancy_description: Option<String>,
    pub updated_at: i64,
}

#[derive(Debug, Clone, SurrealValue)]
pub(crate) struct HistoryDoc {
    pub status: String,
    pub at: i64,
    pub note: Option<String>,
    pub location: Option<String>,
    pub source: String,
}

#[derive(Debug, Clone, SurrealValue)]
pub(crate) struct InvoiceDocumentDoc {
    pub id: String,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub stored_path: String,
    pub uploaded_at: i64,
}

#[derive(Debug, Clone, SurrealValue)]
pub(crate) struct InvoiceRecordDoc {
    pub id: String,
    pub document_ids: Vec<String>,
    pub amount: Option<f64>,
    pub note: Option<String>,
    pub status: String,
    pub submitted_at: i64,
    pub reviewed_at: Option<i64>,
    pub review_note: Option<String>,
}

#[derive(Debug, Clone, SurrealValue)]
pub(crate) struct CustomerDoc {
    pub user_code: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub branch: Option<String>,
    pub updated_at: i64,
}

#[derive(Debug, Clone, SurrealValue)]
pub(crate) struct BroadcastDoc {
    pub broadcast_id: String,
    pub title: String,
    pub message: String,
    pub branch: Option<String>,
    pub created_by: String,
    pub created_at: i64,
}

// --- domain -> document ---

impl From<&Package> for PackageDoc {
    fn from(p: &Package) -> Self {
        Self {
            tracking_number: p.tracking_number.clone(),
            user_code: p.user_code.clone(),
            status: p.status.as_str().to_owned(),
            history: p.history.iter().map(HistoryDoc::from).collect(),
            weight: p.weight,
            shipper: p.shipper.clone(),
            description: p.description.clone(),
            length: p.length,
            width: p.width,
            height: p.height,
            branch: p.branch.clone(),
            service_type_id: p.service_type_id.clone(),
            hazmat_code_id: p.hazmat_code_id.clone(),
            location: p.location.clone(),
            entry_staff: p.entry_staff.clone(),
            external_status: p.external_status.clone(),
            flags: i64::from(p.flags.bits()),
            discrepancy_description: p.discrepancy_description.clone(),
            invoice_documents: p.invoice_documents.iter().map(InvoiceDocumentDoc::from).collect(),
            invoice_records: p.invoice_records.iter().map(InvoiceRecordDoc::from).collect(),
            created_at: p.created_at.timestamp_millis(),
            updated_at: p.updated_at.timestamp_millis(),
        }
    }
}

impl From<&Package> for PackageFieldsDoc {
    fn from(p: &Package) -> Self {
        Self {
            tracking_number: p.tracking_number.clone(),
            user_code: p.user_code.clone(),
            status: p.status.as_str().to_owned(),
            weight: p.weight,
            shipper: p.shipper.clone(),
            description: p.description.clone(),
            length: p.length,
            width: p.width,
            height: p.height,
            branch: p.branch.clone(),
            service_type_id: p.service_type_id.clone(),
            hazmat_code_id: p.hazmat_code_id.clone(),
            location: p.location.clone(),
            entry_staff: p.entry_staff.clone(),
            external_status: p.external_status.clone(),
            flags: i64::from(p.flags.bits()),
            discrepancy_description: p.discrepancy_description.clone(),
            updated_at: p.updated_at.timestamp_millis(),
        }
    }
}

impl From<&HistoryEntry> for HistoryDoc {
    fn from(h: &HistoryEntry) -> Self {
        Self {
            status: h.status.as_str().to_owned(),
            at: h.at.timestamp_millis(),
            note: h.note.clone(),
            location: h.location.clone(),
            source: h.source.as_ref().to_owned(),
        }
    }
}

impl From<&InvoiceDocument> for InvoiceDocumentDoc {
    fn from(d: &InvoiceDocument) -> Self {
        Self {
            id: d.id.clone(),
            file_name: d.file_name.clone(),
            content_type: d.content_type.clone(),
            size_bytes: i64::try_from(d.size_bytes).unwrap_or(i64::MAX),
            stored_path: d.stored_path.clone(),
            uploaded_at: d.uploaded_at.timestamp_millis(),
        }
    }
}

impl From<&InvoiceRecord> for InvoiceRecordDoc {
    fn from(r: &InvoiceRecord) -> Self {
        Self {
            id: r.id.clone(),
            document_ids: r.document_ids.clone(),
            amount: r.amount,
            note: r.note.clone(),
            status: r.status.as_ref().to_owned(),
            submitted_at: r.submitted_at.timestamp_millis(),
            reviewed_at: r.reviewed_at.map(|t| t.timestamp_millis()),
            review_note: r.review_note.clone(),
        }
    }
}

impl From<&Customer> for CustomerDoc {
    fn from(c: &Customer) -> Self {
        Self {
            user_code: c.user_code.clone(),
            email: c.email.clone(),
            first_name: c.first_name.clone(),
            last_name: c.last_name.clone(),
            branch: c.branch.clone(),
            updated_at: c.updated_at.timestamp_millis(),
        }
    }
}

impl From<&Broadcast> for BroadcastDoc {
    fn from(b: &Broadcast) -> Self {
        Self {
            broadcast_id: b.id.clone(),
            title: b.title.clone(),
            message: b.message.clone(),
            branch: b.branch.clone(),
            created_by: b.created_by.clone(),
            created_at: b.created_at.timestamp_millis(),
        }
    }
}

// --- document -> domain ---

fn millis(value: i64, field: &'static str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::from_timestamp_millis(value).ok_or_else(|| DatabaseError::Corrupted {
        message: format!("timestamp out of range: {value}").into(),
        context: Some(field.into()),
    })
}

fn parse<T: FromStr>(value: &str, field: &'static str) -> Result<T, DatabaseError> {
    value.parse().map_err(|_| DatabaseError::Corrupted {
        message: format!("unrecognized value '{value}'").into(),
        context: Some(field.into()),
    })
}

impl TryFrom<PackageDoc> for Package {
    type Error = DatabaseError;

    fn try_from(d: PackageDoc) -> Result<Self, Self::Error> {
        let flags = u32::try_from(d.flags).map_or_else(|_| PackageFlags::empty(), PackageFlags::from);
        Ok(Self {
            status: parse::<PackageStatus>(&d.status, "package.status")?,
            history: d.history.into_iter().map(HistoryEntry::try_from).collect::<Result<_, _>>()?,
            invoice_documents: d
                .invoice_documents
                .into_iter()
                .map(InvoiceDocument::try_from)
                .collect::<Result<_, _>>()?,
            invoice_records: d
                .invoice_records
                .into_iter()
                .map(InvoiceRecord::try_from)
                .collect::<Result<_, _>>()?,
            created_at: millis(d.created_at, "package.created_at")?,
            updated_at: millis(d.updated_at, "package.updated_at")?,
            tracking_number: d.tracking_number,
            user_code: d.user_code,
            weight: d.weight,
            shipper: d.shipper,
            description: d.description,
            length: d.length,
            width: d.width,
            height: d.height,
            branch: d.branch,
            service_type_id: d.service_type_id,
            hazmat_code_id: d.hazmat_code_id,
            location: d.location,
            entry_staff: d.entry_staff,
            external_status: d.external_status,
            flags,
            discrepancy_description: d.discrepancy_description,
        })
    }
}

impl TryFrom<HistoryDoc> for HistoryEntry {
    type Error = DatabaseError;

    fn try_from(d: HistoryDoc) -> Result<Self, Self::Error> {
        Ok(Self {
            status: parse::<PackageStatus>(&d.status, "history.status")?,
            at: millis(d.at, "history.at")?,
            source: parse::<UpdateSource>(&d.source, "history.source")?,
            note: d.note,
            location: d.location,
        })
    }
}

impl TryFrom<InvoiceDocumentDoc> for InvoiceDocument {
    type Error = DatabaseError;

    fn try_from(d: InvoiceDocumentDoc) -> Result<Self, Self::Error> {
        Ok(Self {
            uploaded_at: millis(d.uploaded_at, "invoice_document.uploaded_at")?,
            size_bytes: u64::try_from(d.size_bytes).unwrap_or_default(),
            id: d.id,
            file_name: d.file_name,
            content_type: d.content_type,
            stored_path: d.stored_path,
        })
    }
}

impl TryFrom<InvoiceRecordDoc> for InvoiceRecord {
    type Error = DatabaseError;

    fn try_from(d: InvoiceRecordDoc) -> Result<Self, Self::Error> {
        Ok(Self {
            status: parse::<InvoiceStatus>(&d.status, "invoice_record.status")?,
            submitted_at: millis(d.submitted_at, "invoice_record.submitted_at")?,
            reviewed_at: d
                .reviewed_at
                .map(|t| millis(t, "invoice_record.reviewed_at"))
                .transpose()?,
            id: d.id,
            document_ids: d.document_ids,
            amount: d.amount,
            note: d.note,
            review_note: d.review_note,
        })
    }
}

impl TryFrom<CustomerDoc> for Customer {
    type Error = DatabaseError;

    fn try_from(d: CustomerDoc) -> Result<Self, Self::Error> {
        Ok(Self {
            updated_at: millis(d.updated_at, "customer.updated_at")?,
            user_code: d.user_code,
            email: d.email,
            first_name: d.first_name,
            last_name: d.last_name,
            branch: d.branch,
        })
    }
}

impl TryFrom<BroadcastDoc> for Broadcast {
    type Error = DatabaseError;

    fn try_from(d: BroadcastDoc) -> Result<Self, Self::Error> {
        Ok(Self {
            created_at: millis(d.created_at, "broadcast.created_at")?,
            id: d.broadcast_id,
            title: d.title,
            message: d.message,
            branch: d.branch,
            created_by: d.created_by,
        })
    }
}
