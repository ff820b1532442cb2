mod doc;
mod memory;
mod surreal;

pub use memory::{MemoryBroadcastRepository, MemoryCustomerRepository, MemoryPackageRepository};
pub use surreal::{SurrealBroadcastRepository, SurrealCustomerRepository, SurrealPackageRepository};

use crate::Database;
use fhub_domain::ports::{BroadcastRepository, CustomerRepository, PackageRepository};
use std::sync::Arc;

/// The set of repositories every slice draws from.
#[derive(Debug, Clone)]
pub struct Repositories {
    pub packages: Arc<dyn PackageRepository>,
    pub customers: Arc<dyn CustomerRepository>,
    pub broadcasts: Arc<dyn BroadcastRepository>,
}

impl Repositories {
    #[must_use]
    pub fn surreal(db: &Database) -> Self {
        Self {
            packages: Arc::new(SurrealPackageRepository::new(db.clone())),
            customers: Arc::new(SurrealCustomerRepository::new(db.clone())),
            broadcasts: Arc::new(SurrealBroadcastRepository::new(db.clone())),
        }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            packages: Arc::new(MemoryPackageRepository::default()),
            customers: Arc::new(MemoryCustomerRepository::default()),
            broadcasts: Arc::new(MemoryBroadcastRepository::default()),
        }
    }
}
