use crate::mailer::Mailer;
use crate::templates;
use fhub_domain::broadcast::Broadcast;
use fhub_domain::events::{BroadcastPublished, PackageStatusChanged};
use fhub_domain::ports::CustomerRepository;
use fhub_domain::status::PackageStatus;
use fhub_event_bus::EventReceiverExt;
use std::sync::Arc;
use tokio::sync::broadcast::Receiver;
use tracing::{debug, info, warn};

/// Statuses that trigger a customer email.
pub const NOTIFY_ON: [PackageStatus; 2] = [PackageStatus::InTransit, PackageStatus::Delivered];

pub(crate) async fn status_changes(
    mut rx: Receiver<Arc<PackageStatusChanged>>,
    customers: Arc<dyn CustomerRepository>,
    mailer: Arc<dyn Mailer>,
) {
    while let Some(event) = rx.next_event().await {
        if !NOTIFY_ON.contains(&event.current) {
            continue;
        }
        let Some(user_code) = event.user_code.clone() else {
            debug!(tracking_number = %event.tracking_number, "No owner to notify");
            continue;
        };

        // Detached so a slow relay never holds up the next event.
        let customers = Arc::clone(&customers);
        let mailer = Arc::clone(&mailer);
        tokio::spawn(async move {
            match customers.find(&user_code).await {
                Ok(Some(customer)) => {
                    let email = templates::status_changed(&customer, &event);
                    match mailer.send(email).await {
                        Ok(()) => info!(
                            tracking_number = %event.tracking_number,
                            status = %event.current,
                            "Status notification sent"
                        ),
                        Err(e) => warn!(tracking_number = %event.tracking_number, error = %e, "Status notification failed"),
                    }
                },
                Ok(None) => warn!(%user_code, "Status notification skipped: customer not found"),
                Err(e) => warn!(%user_code, error = %e, "Status notification skipped: customer lookup failed"),
            }
        });
    }
    debug!("Status change listener stopped");
}

pub(crate) async fn broadcasts(
    mut rx: Receiver<Arc<BroadcastPublished>>,
    customers: Arc<dyn CustomerRepository>,
    mailer: Arc<dyn Mailer>,
) {
    while let Some(event) = rx.next_event().await {
        let customers = Arc::clone(&customers);
        let mailer = Arc::clone(&mailer);
        tokio::spawn(async move { fan_out(&event.broadcast, customers.as_ref(), mailer.as_ref()).await });
    }
    debug!("Broadcast listener stopped");
}

async fn fan_out(broadcast: &Broadcast, customers: &dyn CustomerRepository, mailer: &dyn Mailer) {
    let recipients = match customers.list().await {
        Ok(all) => all.into_iter().filter(|c| broadcast.reaches(c.branch.as_deref())),
        Err(e) => {
            warn!(broadcast = %broadcast.id, error = %e, "Broadcast mail skipped: customer listing failed");
            return;
        },
    };

    let (mut sent, mut failed) = (0usize, 0usize);
    for customer in recipients {
        match mailer.send(templates::broadcast(&customer, broadcast)).await {
            Ok(()) => sent += 1,
            Err(e) => {
                failed += 1;
                warn!(broadcast = %broadcast.id, user_code = %customer.user_code, error = %e, "Broadcast mail failed");
            },
        }
    }
    info!(broadcast = %broadcast.id, sent, failed, "Broadcast mailed");
}
