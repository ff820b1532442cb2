//! Package tracking slice.
//!
//! Owns every write to the package collection (warehouse entry, bulk manifest updates, the
//! carrier feed and customer pre-alerts) and the customer-facing tracking views. Each write
//! goes through [`lifecycle::apply`] and announces status changes on the event bus as
//! [`fhub_domain::events::PackageStatusChanged`].

mod error;
pub mod feed;
mod handlers;
pub mod lifecycle;
pub mod models;
mod service;

pub use crate::error::{TrackingError, TrackingErrorExt};
pub use crate::handlers::router;
pub use crate::service::{MAX_TRACKING_NUMBER_LEN, normalize_tracking_number};

use fhub_domain::ports::{CustomerRepository, PackageRepository};
use fhub_event_bus::EventBus;
use fhub_kernel::domain::registry::InitializedSlice;
use std::sync::Arc;

/// Tracking feature state
#[fhub_derive::fhub_slice]
pub struct Tracking {
    packages: Arc<dyn PackageRepository>,
    customers: Arc<dyn CustomerRepository>,
    events: EventBus,
}

/// Creates the slice handle without registering it.
#[must_use]
pub fn service(
    packages: Arc<dyn PackageRepository>,
    customers: Arc<dyn CustomerRepository>,
    events: EventBus,
) -> Tracking {
    Tracking::new(TrackingInner { packages, customers, events })
}

/// Initialize the tracking feature.
///
/// # Errors
/// Currently infallible; the signature matches the other slices.
pub fn init(
    packages: Arc<dyn PackageRepository>,
    customers: Arc<dyn CustomerRepository>,
    events: EventBus,
) -> Result<InitializedSlice, TrackingError> {
    let slice = service(packages, customers, events);
    tracing::info!("Tracking slice initialized");
    Ok(InitializedSlice::new(slice))
}
