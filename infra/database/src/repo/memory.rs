//! Process-local repositories for tests and the `memory` backend.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fhub_domain::broadcast::Broadcast;
use fhub_domain::customer::Customer;
use fhub_domain::package::{HistoryEntry, InvoiceDocument, InvoiceRecord, Package};
use fhub_domain::ports::{
    BroadcastRepository, CustomerRepository, PackageQuery, PackageRepository, StoreError,
};
use fxhash::FxHashMap;
use parking_lot::RwLock;
use std::cmp::Reverse;
use std::mem;

#[derive(Debug, Default)]
pub struct MemoryPackageRepository {
    packages: RwLock<FxHashMap<String, Package>>,
}

#[async_trait]
impl PackageRepository for MemoryPackageRepository {
    async fn find(&self, tracking_number: &str) -> Result<Option<Package>, StoreError> {
        Ok(self.packages.read().get(tracking_number).cloned())
    }

    async fn upsert_fields(&self, package: &Package) -> Result<(), StoreError> {
        let mut packages = self.packages.write();
        let mut next = package.clone();
        match packages.get_mut(&package.tracking_number) {
            Some(stored) => {
                next.created_at = stored.created_at;
                next.history = mem::take(&mut stored.history);
                next.invoice_documents = mem::take(&mut stored.invoice_documents);
                next.invoice_records = mem::take(&mut stored.invoice_records);
                *stored = next;
            },
            None => {
                next.history.clear();
                next.invoice_documents.clear();
                next.invoice_records.clear();
                packages.insert(next.tracking_number.clone(), next);
            },
        }
        Ok(())
    }

    async fn append_history(&self, tracking_number: &str, entry: &HistoryEntry) -> Result<bool, StoreError> {
        let mut packages = self.packages.write();
        let Some(stored) = packages.get_mut(tracking_number) else {
            return Ok(false);
        };
        stored.history.push(entry.clone());
        Ok(true)
    }

    async fn append_invoice(
        &self,
        tracking_number: &str,
        record: &InvoiceRecord,
        documents: &[InvoiceDocument],
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut packages = self.packages.write();
        let Some(stored) = packages.get_mut(tracking_number) else {
            return Ok(false);
        };
        stored.invoice_documents.extend_from_slice(documents);
        stored.invoice_records.push(record.clone());
        stored.updated_at = at;
        Ok(true)
    }

    async fn update_invoice(
        &self,
        tracking_number: &str,
        record: &InvoiceRecord,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut packages = self.packages.write();
        let Some(stored) = packages.get_mut(tracking_number) else {
            return Ok(false);
        };
        let Some(slot) = stored.invoice_records.iter_mut().find(|r| r.id == record.id) else {
            return Ok(false);
        };
        *slot = record.clone();
        stored.updated_at = at;
        Ok(true)
    }

    async fn list(&self, query: &PackageQuery) -> Result<Vec<Package>, StoreError> {
        let mut found: Vec<Package> =
            self.packages.read().values().filter(|p| query.matches(p)).cloned().collect();
        found.sort_by_key(|p| (Reverse(p.created_at), p.tracking_number.clone()));
        Ok(found)
    }
}

#[derive(Debug, Default)]
pub struct MemoryCustomerRepository {
    customers: RwLock<FxHashMap<String, Customer>>,
}

#[async_trait]
impl CustomerRepository for MemoryCustomerRepository {
    async fn find(&self, user_code: &str) -> Result<Option<Customer>, StoreError> {
        Ok(self.customers.read().get(user_code).cloned())
    }

    async fn save(&self, customer: &Customer) -> Result<(), StoreError> {
        self.customers.write().insert(customer.user_code.clone(), customer.clone());
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Customer>, StoreError> {
        let mut all: Vec<Customer> = self.customers.read().values().cloned().collect();
        all.sort_by(|a, b| a.user_code.cmp(&b.user_code));
        Ok(all)
    }
}

#[derive(Debug, Default)]
pub struct MemoryBroadcastRepository {
    broadcasts: RwLock<Vec<Broadcast>>,
}

#[async_trait]
impl BroadcastRepository for MemoryBroadcastRepository {
    async fn create(&self, broadcast: &Broadcast) -> Result<(), StoreError> {
        self.broadcasts.write().push(broadcast.clone());
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Broadcast>, StoreError> {
        let mut all = self.broadcasts.read().clone();
        all.sort_by_key(|b| Reverse(b.created_at));
        Ok(all)
    }
}
