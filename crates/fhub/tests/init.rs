use fhub::domain::config::ApiConfig;
use fhub::features::{analytics, broadcasts, customers, invoices, notifications, tracking};
use fhub_database::Repositories;
use fhub_event_bus::EventBus;
use fhub_notifications::LogMailer;
use fhub_storage::Storage;
use std::any::TypeId;
use std::sync::Arc;

#[tokio::test]
async fn init_registers_every_slice_once() {
    let dir = tempfile::tempdir().unwrap();
    let storage = Storage::builder(dir.path()).connect().await.unwrap();
    let config = ApiConfig::default();

    let slices =
        fhub::init(&config, &Repositories::in_memory(), &EventBus::new(), storage, Arc::new(LogMailer)).unwrap();

    let ids: Vec<TypeId> = slices.iter().map(|slice| slice.id).collect();
    assert_eq!(
        ids,
        [
            TypeId::of::<notifications::Notifications>(),
            TypeId::of::<tracking::Tracking>(),
            TypeId::of::<customers::Customers>(),
            TypeId::of::<invoices::Invoices>(),
            TypeId::of::<broadcasts::Broadcasts>(),
            TypeId::of::<analytics::Analytics>(),
        ]
    );
}
