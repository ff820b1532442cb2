//! Repository ports implemented by the infrastructure layer.

use crate::broadcast::Broadcast;
use crate::customer::Customer;
use crate::package::{HistoryEntry, InvoiceDocument, InvoiceRecord, Package};
use crate::status::PackageStatus;
use async_trait::async_trait;
use chrono::{DateTime, Days, NaiveDate, Utc};
use std::borrow::Cow;
use std::fmt::Debug;

/// Errors surfaced by any repository implementation.
#[fhub_derive::fhub_error]
pub enum StoreError {
    /// The storage backend rejected or failed the operation.
    #[error("Store backend error{}: {message}", format_context(.context))]
    Backend { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A stored document could not be mapped back to the domain model.
    #[error("Corrupted record{}: {message}", format_context(.context))]
    Corrupted { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Internal store error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

/// Filters for package listings. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PackageQuery {
    pub user_code: Option<String>,
    pub status: Option<PackageStatus>,
    pub branch: Option<String>,
    /// Inclusive lower bound on `created_at`.
    pub created_from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `created_at`.
    pub created_to: Option<DateTime<Utc>>,
}

impl PackageQuery {
    #[must_use]
    pub fn for_user(user_code: impl Into<String>) -> Self {
        Self { user_code: Some(user_code.into()), ..Self::default() }
    }

    /// Restricts creation dates to `from..=to`, both calendar days in UTC.
    #[must_use]
    pub fn created_between(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.created_from = from.map(|day| day.and_time(chrono::NaiveTime::MIN).and_utc());
        self.created_to = to
            .and_then(|day| day.checked_add_days(Days::new(1)))
            .map(|day| day.and_time(chrono::NaiveTime::MIN).and_utc());
        self
    }

    #[must_use]
    pub fn matches(&self, package: &Package) -> bool {
        self.user_code.as_deref().is_none_or(|code| package.is_owned_by(code))
            && self.status.is_none_or(|status| package.status == status)
            && self.branch.as_deref().is_none_or(|branch| package.branch.as_deref() == Some(branch))
            && self.created_from.is_none_or(|from| package.created_at >= from)
            && self.created_to.is_none_or(|to| package.created_at < to)
    }
}

/// Package documents keyed by tracking number.
///
/// History and invoice entries only ever grow: writers add to them through the append
/// operations and never rewrite the collections, so concurrent writers keep each other's
/// entries. Scalar fields are last-writer-wins.
#[async_trait]
pub trait PackageRepository: Debug + Send + Sync {
    async fn find(&self, tracking_number: &str) -> Result<Option<Package>, StoreError>;

    /// Creates the document when absent, otherwise overwrites its scalar fields.
    ///
    /// `created_at` keeps its first stored value. The history and invoice collections of
    /// `package` are ignored; a new document starts with them empty.
    async fn upsert_fields(&self, package: &Package) -> Result<(), StoreError>;

    /// Appends one history entry. `false` when no document exists.
    async fn append_history(&self, tracking_number: &str, entry: &HistoryEntry) -> Result<bool, StoreError>;

    /// Appends an invoice record with its files and sets `updated_at`. `false` when no
    /// document exists.
    async fn append_invoice(
        &self,
        tracking_number: &str,
        record: &InvoiceRecord,
        documents: &[InvoiceDocument],
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    /// Replaces the stored invoice record carrying `record.id` and sets `updated_at`.
    /// `false` when the document or the record is missing.
    async fn update_invoice(
        &self,
        tracking_number: &str,
        record: &InvoiceRecord,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    /// Newest first.
    async fn list(&self, query: &PackageQuery) -> Result<Vec<Package>, StoreError>;
}

#[async_trait]
pub trait CustomerRepository: Debug + Send + Sync {
    async fn find(&self, user_code: &str) -> Result<Option<Customer>, StoreError>;

    async fn save(&self, customer: &Customer) -> Result<(), StoreError>;

    /// Ordered by user code.
    async fn list(&self) -> Result<Vec<Customer>, StoreError>;
}

#[async_trait]
pub trait BroadcastRepository: Debug + Send + Sync {
    async fn create(&self, broadcast: &Broadcast) -> Result<(), StoreError>;

    /// Newest first.
    async fn list(&self) -> Result<Vec<Broadcast>, StoreError>;
}
