//! Email notifications.
//!
//! Listens on the event bus and mails customers when a package moves to `In Transit` or
//! `Delivered`, and when a broadcast reaches them. Delivery is fire-and-forget: failures are
//! logged and dropped, never retried, and never surface to the request that caused them.

mod error;
mod listener;
mod mailer;
mod templates;

pub use crate::error::{NotificationError, NotificationErrorExt};
pub use crate::listener::NOTIFY_ON;
pub use crate::mailer::{Email, LogMailer, Mailer, SmtpMailer};

use fhub_domain::config::MailConfig;
use fhub_domain::events::{BroadcastPublished, PackageStatusChanged};
use fhub_domain::ports::CustomerRepository;
use fhub_event_bus::EventBus;
use fhub_kernel::domain::registry::InitializedSlice;
use std::sync::Arc;
use tokio::runtime::Handle;

/// Notifications feature state
#[fhub_derive::fhub_slice]
pub struct Notifications {
    mailer: Arc<dyn Mailer>,
}

/// Picks SMTP when mail is enabled, the log otherwise.
///
/// # Errors
/// [`NotificationError::Config`] when SMTP settings are unusable.
pub fn mailer_from_config(config: &MailConfig) -> Result<Arc<dyn Mailer>, NotificationError> {
    if config.enabled {
        tracing::info!(host = %config.host, port = config.port, "SMTP delivery enabled");
        Ok(Arc::new(SmtpMailer::from_config(config)?))
    } else {
        tracing::info!("SMTP delivery disabled, mail goes to the log");
        Ok(Arc::new(LogMailer))
    }
}

/// Initialize the notifications feature and start its listeners.
///
/// Must run inside a Tokio runtime, before any slice publishes.
///
/// # Errors
/// [`NotificationError::Runtime`] outside a runtime, [`NotificationError::Events`] if the
/// subscriptions fail.
pub fn init(
    mailer: Arc<dyn Mailer>,
    customers: Arc<dyn CustomerRepository>,
    events: &EventBus,
) -> Result<InitializedSlice, NotificationError> {
    let runtime = Handle::try_current().map_err(|e| NotificationError::Runtime {
        message: e.to_string().into(),
        context: Some("notification listeners".into()),
    })?;

    let status_rx = events.subscribe::<PackageStatusChanged>().context("status changes")?;
    let broadcast_rx = events.subscribe::<BroadcastPublished>().context("broadcasts")?;

    let slice = Notifications::new(NotificationsInner { mailer });
    runtime.spawn(listener::status_changes(status_rx, Arc::clone(&customers), Arc::clone(&slice.mailer)));
    runtime.spawn(listener::broadcasts(broadcast_rx, customers, Arc::clone(&slice.mailer)));

    tracing::info!("Notifications slice initialized");
    Ok(InitializedSlice::new(slice))
}
