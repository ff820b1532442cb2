use crate::status::{PackageStatus, UiStatus};
use bitflags::bitflags;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

/// A tracked shipment. `tracking_number` is its only identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Package {
    pub tracking_number: String,
    /// Owning customer; absent for unclaimed packages.
    pub user_code: Option<String>,
    pub status: PackageStatus,
    /// Oldest first. Only ever appended to.
    pub history: Vec<HistoryEntry>,
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
    /// Raw label last reported by an external carrier.
    pub external_status: Option<String>,
    #[schema(value_type = u32)]
    pub flags: PackageFlags,
    pub discrepancy_description: Option<String>,
    pub invoice_documents: Vec<InvoiceDocument>,
    pub invoice_records: Vec<InvoiceRecord>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Package {
    /// A package with no history yet. Callers append the creation entry themselves.
    #[must_use]
    pub fn new(tracking_number: impl Into<String>, status: PackageStatus, now: DateTime<Utc>) -> Self {
        Self {
            tracking_number: tracking_number.into(),
            user_code: None,
            status,
            history: Vec::new(),
            weight: None,
            shipper: None,
            description: None,
            length: None,
            width: None,
            height: None,
            branch: None,
            service_type_id: None,
            hazmat_code_id: None,
            location: None,
            entry_staff: None,
            external_status: None,
            flags: PackageFlags::empty(),
            discrepancy_description: None,
            invoice_documents: Vec::new(),
            invoice_records: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[must_use]
    pub const fn ui_status(&self) -> UiStatus {
        self.status.to_ui()
    }

    #[must_use]
    pub fn is_owned_by(&self, user_code: &str) -> bool {
        self.user_code.as_deref() == Some(user_code)
    }

    #[must_use]
    pub fn pending_invoices(&self) -> usize {
        self.invoice_records.iter().filter(|r| r.status == InvoiceStatus::Submitted).count()
    }
}

/// One applied transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub status: PackageStatus,
    pub at: DateTime<Utc>,
    pub note: Option<String>,
    pub location: Option<String>,
    pub source: UpdateSource,
}

/// Which ingestion path produced a write.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum UpdateSource {
    Warehouse,
    ExternalFeed,
    PreAlert,
    BulkUpdate,
}

impl UpdateSource {
    /// Status used when a package is first created without an explicit one.
    #[must_use]
    pub const fn initial_status(self) -> PackageStatus {
        match self {
            Self::PreAlert => PackageStatus::Unknown,
            Self::Warehouse | Self::ExternalFeed | Self::BulkUpdate => PackageStatus::DEFAULT,
        }
    }
}

bitflags! {
    /// Handling flags reported by staff or carriers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
    pub struct PackageFlags: u32 {
        const CUSTOMS_REQUIRED = 1 << 0;
        const DISCREPANCY = 1 << 1;
        const HAZARDOUS = 1 << 2;
        const FRAGILE = 1 << 3;
    }
}

impl PackageFlags {
    /// Sets or clears `flag` depending on `value`; `None` leaves it untouched.
    pub fn apply(&mut self, flag: Self, value: Option<bool>) {
        if let Some(enabled) = value {
            self.set(flag, enabled);
        }
    }
}

impl From<u32> for PackageFlags {
    fn from(bits: u32) -> Self {
        Self::from_bits_truncate(bits)
    }
}

impl Serialize for PackageFlags {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u32(self.bits())
    }
}

impl<'de> Deserialize<'de> for PackageFlags {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = u32::deserialize(deserializer)?;
        Ok(Self::from_bits_truncate(bits))
    }
}

/// A stored invoice file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDocument {
    pub id: String,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: u64,
    /// Path relative to the upload root.
    pub stored_path: String,
    pub uploaded_at: DateTime<Utc>,
}

/// A submitted invoice, reviewed independently of the shipping status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceRecord {
    pub id: String,
    pub document_ids: Vec<String>,
    pub amount: Option<f64>,
    pub note: Option<String>,
    pub status: InvoiceStatus,
    pub submitted_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub review_note: Option<String>,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InvoiceStatus {
    Submitted,
    Reviewed,
    Rejected,
}
