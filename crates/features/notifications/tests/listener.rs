use async_trait::async_trait;
use chrono::Utc;
use fhub_database::Repositories;
use fhub_domain::broadcast::Broadcast;
use fhub_domain::customer::Customer;
use fhub_domain::events::{BroadcastPublished, PackageStatusChanged};
use fhub_domain::status::PackageStatus;
use fhub_event_bus::EventBus;
use fhub_notifications::{Email, Mailer, NotificationError, Notifications};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Default)]
struct RecordingMailer {
    sent: Mutex<Vec<Email>>,
    fail: bool,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: Email) -> Result<(), NotificationError> {
        self.sent.lock().push(email);
        if self.fail { Err(NotificationError::from("relay down")) } else { Ok(()) }
    }
}

impl RecordingMailer {
    async fn wait_for(&self, count: usize) -> Vec<Email> {
        for _ in 0..100 {
            if self.sent.lock().len() >= count {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.sent.lock().clone()
    }
}

fn customer(user_code: &str, branch: Option<&str>) -> Customer {
    Customer {
        user_code: user_code.to_owned(),
        email: format!("{}@example.com", user_code.to_lowercase()),
        first_name: "Kim".to_owned(),
        last_name: user_code.to_owned(),
        branch: branch.map(str::to_owned),
        updated_at: Utc::now(),
    }
}

fn status_event(current: PackageStatus, owner: Option<&str>) -> PackageStatusChanged {
    PackageStatusChanged {
        tracking_number: "TAS999".to_owned(),
        user_code: owner.map(str::to_owned),
        previous: Some(PackageStatus::AtWarehouse),
        current,
        note: None,
        at: Utc::now(),
    }
}

async fn setup(mailer: Arc<RecordingMailer>) -> (EventBus, Repositories) {
    let repos = Repositories::in_memory();
    repos.customers.save(&customer("C100", Some("Kingston"))).await.unwrap();
    repos.customers.save(&customer("C200", Some("Montego Bay"))).await.unwrap();

    let events = EventBus::new();
    let slice = fhub_notifications::init(mailer, repos.customers.clone(), &events).unwrap();
    assert_eq!(slice.id, std::any::TypeId::of::<Notifications>());
    (events, repos)
}

#[tokio::test]
async fn in_transit_mails_the_owner() {
    let mailer = Arc::new(RecordingMailer::default());
    let (events, _repos) = setup(mailer.clone()).await;

    events.publish(status_event(PackageStatus::InTransit, Some("C100"))).unwrap();

    let sent = mailer.wait_for(1).await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "c100@example.com");
    assert!(sent[0].subject.contains("In Transit"));
}

#[tokio::test]
async fn other_statuses_and_unowned_packages_are_silent() {
    let mailer = Arc::new(RecordingMailer::default());
    let (events, _repos) = setup(mailer.clone()).await;

    events.publish(status_event(PackageStatus::AtLocalPort, Some("C100"))).unwrap();
    events.publish(status_event(PackageStatus::Delivered, None)).unwrap();
    events.publish(status_event(PackageStatus::Delivered, Some("GHOST"))).unwrap();
    events.publish(status_event(PackageStatus::Delivered, Some("C200"))).unwrap();

    let sent = mailer.wait_for(1).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(mailer.sent.lock().len(), 1);
    assert_eq!(sent[0].to, "c200@example.com");
}

#[tokio::test]
async fn failed_delivery_does_not_stop_the_listener() {
    let mailer = Arc::new(RecordingMailer { fail: true, ..RecordingMailer::default() });
    let (events, _repos) = setup(mailer.clone()).await;

    events.publish(status_event(PackageStatus::InTransit, Some("C100"))).unwrap();
    mailer.wait_for(1).await;
    events.publish(status_event(PackageStatus::Delivered, Some("C100"))).unwrap();

    assert_eq!(mailer.wait_for(2).await.len(), 2);
}

#[tokio::test]
async fn branch_broadcast_reaches_only_that_branch() {
    let mailer = Arc::new(RecordingMailer::default());
    let (events, _repos) = setup(mailer.clone()).await;

    let broadcast = Broadcast {
        id: "B1".to_owned(),
        title: "Holiday hours".to_owned(),
        message: "Closed on Monday.".to_owned(),
        branch: Some("kingston".to_owned()),
        created_by: "A1".to_owned(),
        created_at: Utc::now(),
    };
    events.publish(BroadcastPublished { broadcast }).unwrap();

    let sent = mailer.wait_for(1).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(mailer.sent.lock().len(), 1);
    assert_eq!(sent[0].to, "c100@example.com");
    assert_eq!(sent[0].subject, "Holiday hours");
}

#[test]
fn init_requires_a_runtime() {
    let repos = Repositories::in_memory();
    let err = fhub_notifications::init(Arc::new(RecordingMailer::default()), repos.customers, &EventBus::new())
        .unwrap_err();
    assert_eq!(err.code(), "runtime");
}
