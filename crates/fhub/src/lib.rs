//! Facade crate for the forwarder hub slices and shared modules.
//! Re-exports domain/kernel primitives and aggregates slice initialization and routing.
//! Keep this crate thin: it should compose other crates, not implement business logic.

pub use fhub_domain as domain;
pub use fhub_kernel as kernel;

use fhub_database::Repositories;
use fhub_domain::config::ApiConfig;
use fhub_domain::registry::InitializedSlice;
use fhub_event_bus::EventBus;
use fhub_kernel::server::{ApiState, system_router};
use fhub_notifications::Mailer;
use fhub_storage::Storage;
use std::sync::Arc;
use utoipa_axum::router::OpenApiRouter;

/// The feature slice crates, in start-up order.
pub mod features {
    pub use fhub_analytics as analytics;
    pub use fhub_broadcasts as broadcasts;
    pub use fhub_customers as customers;
    pub use fhub_invoices as invoices;
    pub use fhub_notifications as notifications;
    pub use fhub_tracking as tracking;
}

/// Initialize every slice.
///
/// Notifications subscribe first so no event published by another slice is missed.
/// Must run inside a Tokio runtime.
///
/// # Errors
/// Returns an error if any slice initialization fails.
pub fn init(
    config: &ApiConfig,
    repositories: &Repositories,
    events: &EventBus,
    storage: Storage,
    mailer: Arc<dyn Mailer>,
) -> Result<Vec<InitializedSlice>, Box<dyn std::error::Error + Send + Sync>> {
    let Repositories { packages, customers, broadcasts } = repositories.clone();

    Ok(vec![
        features::notifications::init(mailer, customers.clone(), events)?,
        features::tracking::init(packages.clone(), customers.clone(), events.clone())?,
        features::customers::init(customers.clone())?,
        features::invoices::init(packages.clone(), storage, config.uploads.clone())?,
        features::broadcasts::init(broadcasts, customers.clone(), events.clone())?,
        features::analytics::init(packages, customers)?,
    ])
}

/// Every slice's routes plus the system routes.
#[must_use]
pub fn router(config: &ApiConfig) -> OpenApiRouter<ApiState> {
    OpenApiRouter::new()
        .merge(system_router())
        .merge(features::tracking::router())
        .merge(features::customers::router())
        .merge(features::invoices::router(&config.uploads))
        .merge(features::broadcasts::router())
        .merge(features::analytics::router())
}
