use crate::Database;
use crate::error::{DatabaseError, DatabaseErrorExt};
use crate::repo::doc::{
    BroadcastDoc, CustomerDoc, HistoryDoc, InvoiceDocumentDoc, InvoiceRecordDoc, PackageDoc,
    PackageFieldsDoc,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fhub_domain::broadcast::Broadcast;
use fhub_domain::constants::{BROADCAST_TABLE, CUSTOMER_TABLE, PACKAGE_TABLE};
use fhub_domain::customer::Customer;
use fhub_domain::package::{HistoryEntry, InvoiceDocument, InvoiceRecord, Package};
use fhub_domain::ports::{
    BroadcastRepository, CustomerRepository, PackageQuery, PackageRepository, StoreError,
};

/// Packages are keyed by tracking number, `package:⟨tn⟩`; queries bind `$tb` and `$tn`.
const PACKAGE_RECORD: &str = "type::record($tb, $tn)";

#[derive(Debug, Clone)]
pub struct SurrealPackageRepository {
    db: Database,
}

impl SurrealPackageRepository {
    #[must_use]
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    async fn find_doc(&self, tracking_number: &str) -> Result<Option<Package>, DatabaseError> {
        let docs = self
            .db
            .query(format!("SELECT * OMIT id FROM {PACKAGE_RECORD}"))
            .bind(("tb", PACKAGE_TABLE.to_owned()))
            .bind(("tn", tracking_number.to_owned()))
            .await
            .context("Loading package")?
            .take::<Vec<PackageDoc>>(0)?;

        docs.into_iter().next().map(Package::try_from).transpose()
    }

    /// Merges the scalar columns, then fills what a fresh record lacks.
    async fn merge_fields(&self, package: &Package) -> Result<(), DatabaseError> {
        self.db
            .query(format!(
                "BEGIN TRANSACTION;
                UPSERT {PACKAGE_RECORD} MERGE $fields RETURN NONE;
                UPDATE {PACKAGE_RECORD} SET
                    created_at = created_at ?? $created_at,
                    history = history ?? [],
                    invoice_documents = invoice_documents ?? [],
                    invoice_records = invoice_records ?? []
                    RETURN NONE;
                COMMIT TRANSACTION;"
            ))
            .bind(("tb", PACKAGE_TABLE.to_owned()))
            .bind(("tn", package.tracking_number.clone()))
            .bind(("fields", PackageFieldsDoc::from(package)))
            .bind(("created_at", package.created_at.timestamp_millis()))
            .await
            .context("Saving package")?
            .check()
            .map_err(surrealdb::Error::from)
            .context(format!("Package {} rejected", package.tracking_number))?;
        Ok(())
    }

    async fn push_history(&self, tracking_number: &str, entry: &HistoryEntry) -> Result<bool, DatabaseError> {
        let updated = self
            .db
            .query(format!("UPDATE {PACKAGE_RECORD} SET history += $entry RETURN VALUE tracking_number"))
            .bind(("tb", PACKAGE_TABLE.to_owned()))
            .bind(("tn", tracking_number.to_owned()))
            .bind(("entry", HistoryDoc::from(entry)))
            .await
            .context("Appending package history")?
            .take::<Vec<String>>(0)?;
        Ok(!updated.is_empty())
    }

    async fn push_invoice(
        &self,
        tracking_number: &str,
        record: &InvoiceRecord,
        documents: &[InvoiceDocument],
        at: DateTime<Utc>,
    ) -> Result<bool, DatabaseError> {
        let documents: Vec<InvoiceDocumentDoc> = documents.iter().map(InvoiceDocumentDoc::from).collect();
        let updated = self
            .db
            .query(format!(
                "UPDATE {PACKAGE_RECORD} SET
                    invoice_documents += $documents,
                    invoice_records += $record,
                    updated_at = $at
                RETURN VALUE tracking_number"
            ))
            .bind(("tb", PACKAGE_TABLE.to_owned()))
            .bind(("tn", tracking_number.to_owned()))
            .bind(("documents", documents))
            .bind(("record", InvoiceRecordDoc::from(record)))
            .bind(("at", at.timestamp_millis()))
            .await
            .context("Appending invoice")?
            .take::<Vec<String>>(0)?;
        Ok(!updated.is_empty())
    }

    async fn replace_invoice(
        &self,
        tracking_number: &str,
        record: &InvoiceRecord,
        at: DateTime<Utc>,
    ) -> Result<bool, DatabaseError> {
        let updated = self
            .db
            .query(format!(
                "UPDATE {PACKAGE_RECORD} SET
                    invoice_records = invoice_records.map(|$r| IF $r.id = $record.id {{ $record }} ELSE {{ $r }}),
                    updated_at = $at
                WHERE invoice_records.id CONTAINS $record.id
                RETURN VALUE tracking_number"
            ))
            .bind(("tb", PACKAGE_TABLE.to_owned()))
            .bind(("tn", tracking_number.to_owned()))
            .bind(("record", InvoiceRecordDoc::from(record)))
            .bind(("at", at.timestamp_millis()))
            .await
            .context("Updating invoice")?
            .take::<Vec<String>>(0)?;
        Ok(!updated.is_empty())
    }

    async fn select(&self, query: &PackageQuery) -> Result<Vec<Package>, DatabaseError> {
        let mut conditions = Vec::new();
        if query.user_code.is_some() {
            conditions.push("user_code = $user_code");
        }
        if query.status.is_some() {
            conditions.push("status = $status");
        }
        if query.branch.is_some() {
            conditions.push("branch = $branch");
        }
        if query.created_from.is_some() {
            conditions.push("created_at >= $from");
        }
        if query.created_to.is_some() {
            conditions.push("created_at < $to");
        }
        let filter = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };

        let mut request = self
            .db
            .query(format!("SELECT * OMIT id FROM {PACKAGE_TABLE}{filter} ORDER BY created_at DESC"));
        if let Some(user_code) = &query.user_code {
            request = request.bind(("user_code", user_code.clone()));
        }
        if let Some(status) = query.status {
            request = request.bind(("status", status.as_str().to_owned()));
        }
        if let Some(branch) = &query.branch {
            request = request.bind(("branch", branch.clone()));
        }
        if let Some(from) = query.created_from {
            request = request.bind(("from", from.timestamp_millis()));
        }
        if let Some(to) = query.created_to {
            request = request.bind(("to", to.timestamp_millis()));
        }

        request
            .await
            .context("Listing packages")?
            .take::<Vec<PackageDoc>>(0)?
            .into_iter()
            .map(Package::try_from)
            .collect()
    }
}

#[async_trait]
impl PackageRepository for SurrealPackageRepository {
    async fn find(&self, tracking_number: &str) -> Result<Option<Package>, StoreError> {
        Ok(self.find_doc(tracking_number).await?)
    }

    async fn upsert_fields(&self, package: &Package) -> Result<(), StoreError> {
        Ok(self.merge_fields(package).await?)
    }

    async fn append_history(&self, tracking_number: &str, entry: &HistoryEntry) -> Result<bool, StoreError> {
        Ok(self.push_history(tracking_number, entry).await?)
    }

    async fn append_invoice(
        &self,
        tracking_number: &str,
        record: &InvoiceRecord,
        documents: &[InvoiceDocument],
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        Ok(self.push_invoice(tracking_number, record, documents, at).await?)
    }

    async fn update_invoice(
        &self,
        tracking_number: &str,
        record: &InvoiceRecord,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        Ok(self.replace_invoice(tracking_number, record, at).await?)
    }

    async fn list(&self, query: &PackageQuery) -> Result<Vec<Package>, StoreError> {
        Ok(self.select(query).await?)
    }
}

#[derive(Debug, Clone)]
pub struct SurrealCustomerRepository {
    db: Database,
}

impl SurrealCustomerRepository {
    #[must_use]
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    async fn select(&self, user_code: Option<&str>) -> Result<Vec<Customer>, DatabaseError> {
        let mut request = match user_code {
            Some(code) => self
                .db
                .query(format!("SELECT * OMIT id FROM {CUSTOMER_TABLE} WHERE user_code = $code"))
                .bind(("code", code.to_owned())),
            None => {
                self.db.query(format!("SELECT * OMIT id FROM {CUSTOMER_TABLE} ORDER BY user_code"))
            },
        }
        .await
        .context("Loading customers")?;

        request.take::<Vec<CustomerDoc>>(0)?.into_iter().map(Customer::try_from).collect()
    }

    async fn upsert(&self, customer: &Customer) -> Result<(), DatabaseError> {
        self.db
            .query(format!(
                "BEGIN TRANSACTION;
                DELETE {CUSTOMER_TABLE} WHERE user_code = $code;
                CREATE {CUSTOMER_TABLE} CONTENT $doc;
                COMMIT TRANSACTION;"
            ))
            .bind(("code", customer.user_code.clone()))
            .bind(("doc", CustomerDoc::from(customer)))
            .await
            .context("Saving customer")?
            .check()
            .map_err(surrealdb::Error::from)?;
        Ok(())
    }
}

#[async_trait]
impl CustomerRepository for SurrealCustomerRepository {
    async fn find(&self, user_code: &str) -> Result<Option<Customer>, StoreError> {
        Ok(self.select(Some(user_code)).await?.into_iter().next())
    }

    async fn save(&self, customer: &Customer) -> Result<(), StoreError> {
        Ok(self.upsert(customer).await?)
    }

    async fn list(&self) -> Result<Vec<Customer>, StoreError> {
        Ok(self.select(None).await?)
    }
}

#[derive(Debug, Clone)]
pub struct SurrealBroadcastRepository {
    db: Database,
}

impl SurrealBroadcastRepository {
    #[must_use]
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    async fn insert(&self, broadcast: &Broadcast) -> Result<(), DatabaseError> {
        self.db
            .query(format!("CREATE {BROADCAST_TABLE} CONTENT $doc"))
            .bind(("doc", BroadcastDoc::from(broadcast)))
            .await
            .context("Saving broadcast")?
            .check()
            .map_err(surrealdb::Error::from)?;
        Ok(())
    }

    async fn select(&self) -> Result<Vec<Broadcast>, DatabaseError> {
        self.db
            .query(format!("SELECT * OMIT id FROM {BROADCAST_TABLE} ORDER BY created_at DESC"))
            .await
            .context("Listing broadcasts")?
            .take::<Vec<BroadcastDoc>>(0)?
            .into_iter()
            .map(Broadcast::try_from)
            .collect()
    }
}

#[async_trait]
impl BroadcastRepository for SurrealBroadcastRepository {
    async fn create(&self, broadcast: &Broadcast) -> Result<(), StoreError> {
        Ok(self.insert(broadcast).await?)
    }

    async fn list(&self) -> Result<Vec<Broadcast>, StoreError> {
        Ok(self.select().await?)
    }
}
