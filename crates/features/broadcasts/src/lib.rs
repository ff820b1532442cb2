//! Broadcasts: admin announcements, stored and mailed to their audience.
//!
//! Creating a broadcast publishes [`BroadcastPublished`]; the notifications slice does the
//! mailing. Customers read the broadcasts addressed to everyone or to their branch.

mod error;
mod handlers;

pub use crate::error::{BroadcastError, BroadcastErrorExt};
pub use crate::handlers::{BroadcastRequest, router};

use chrono::Utc;
use fhub_domain::broadcast::Broadcast;
use fhub_domain::events::BroadcastPublished;
use fhub_domain::ports::{BroadcastRepository, CustomerRepository};
use fhub_event_bus::EventBus;
use fhub_kernel::domain::registry::InitializedSlice;
use fhub_kernel::safe_nanoid;
use std::sync::Arc;
use tracing::{info, warn};

pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_MESSAGE_LEN: usize = 5000;

/// Broadcasts feature state
#[fhub_derive::fhub_slice]
pub struct Broadcasts {
    broadcasts: Arc<dyn BroadcastRepository>,
    customers: Arc<dyn CustomerRepository>,
    events: EventBus,
}

impl BroadcastsInner {
    /// Stores a broadcast and announces it.
    ///
    /// # Errors
    /// [`BroadcastError::Validation`] for a blank or oversized title/message.
    pub async fn publish(&self, created_by: &str, req: BroadcastRequest) -> Result<Broadcast, BroadcastError> {
        let title = bounded(&req.title, "title", MAX_TITLE_LEN)?;
        let message = bounded(&req.message, "message", MAX_MESSAGE_LEN)?;

        let broadcast = Broadcast {
            id: safe_nanoid!(),
            title,
            message,
            branch: req.branch.map(|b| b.trim().to_owned()).filter(|b| !b.is_empty()),
            created_by: created_by.to_owned(),
            created_at: Utc::now(),
        };
        self.broadcasts.create(&broadcast).await?;
        info!(id = %broadcast.id, branch = ?broadcast.branch, "Broadcast created");

        if let Err(e) = self.events.publish(BroadcastPublished { broadcast: broadcast.clone() }) {
            warn!(id = %broadcast.id, error = %e, "Failed to announce broadcast");
        }
        Ok(broadcast)
    }

    /// Broadcasts visible to a customer (`Some(user_code)`) or to staff (`None`), newest first.
    ///
    /// # Errors
    /// [`BroadcastError::Store`] when a repository fails.
    pub async fn visible_to(&self, user_code: Option<&str>) -> Result<Vec<Broadcast>, BroadcastError> {
        let all = self.broadcasts.list().await?;
        let Some(user_code) = user_code else {
            return Ok(all);
        };

        let branch = self.customers.find(user_code).await?.and_then(|c| c.branch);
        Ok(all.into_iter().filter(|b| b.reaches(branch.as_deref())).collect())
    }
}

fn bounded(value: &str, field: &'static str, max: usize) -> Result<String, BroadcastError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(BroadcastError::Validation { message: format!("{field} is required").into(), context: None });
    }
    if trimmed.chars().count() > max {
        return Err(BroadcastError::Validation {
            message: format!("{field} exceeds {max} characters").into(),
            context: None,
        });
    }
    Ok(trimmed.to_owned())
}

/// Creates the slice handle without registering it.
#[must_use]
pub fn service(
    broadcasts: Arc<dyn BroadcastRepository>,
    customers: Arc<dyn CustomerRepository>,
    events: EventBus,
) -> Broadcasts {
    Broadcasts::new(BroadcastsInner { broadcasts, customers, events })
}

/// Initialize the broadcasts feature.
///
/// # Errors
/// Currently infallible; the signature matches the other slices.
pub fn init(
    broadcasts: Arc<dyn BroadcastRepository>,
    customers: Arc<dyn CustomerRepository>,
    events: EventBus,
) -> Result<InitializedSlice, BroadcastError> {
    tracing::info!("Broadcasts slice initialized");
    Ok(InitializedSlice::new(service(broadcasts, customers, events)))
}
