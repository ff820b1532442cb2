use fhub_event_bus::{EventBus, EventBusError, EventReceiverExt};
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Eq)]
struct StatusChanged(pub usize);

#[derive(Clone, Debug, PartialEq, Eq)]
struct BroadcastPosted(pub usize);

#[tokio::test]
async fn delivers_to_subscriber() {
    let bus = EventBus::new();
    let mut rx = bus.subscribe::<StatusChanged>().unwrap();

    assert_eq!(bus.publish(StatusChanged(42)).unwrap(), 1);
    assert_eq!(*rx.next_event().await.unwrap(), StatusChanged(42));
}

#[tokio::test]
async fn publish_without_subscribers_is_not_an_error() {
    let bus = EventBus::new();
    assert_eq!(bus.publish(StatusChanged(1)).unwrap(), 0);
}

#[tokio::test]
async fn lagging_listener_skips_to_retained_tail() {
    let bus = EventBus::new();
    let capacity = 2;
    let mut rx = bus.subscribe_with_capacity::<StatusChanged>(capacity).unwrap();

    for i in 0..100 {
        bus.publish(StatusChanged(i)).unwrap();
    }

    let first = rx.next_event().await.unwrap();
    assert!(first.0 >= 100 - capacity, "expected tail of buffer, got {}", first.0);
    let second = rx.next_event().await.unwrap();
    assert_eq!(second.0, first.0 + 1);
}

#[tokio::test]
async fn every_subscriber_receives_a_copy() {
    let bus = EventBus::new();
    let mut rx1 = bus.subscribe::<StatusChanged>().unwrap();
    let mut rx2 = bus.subscribe::<StatusChanged>().unwrap();

    bus.publish(StatusChanged(100)).unwrap();

    assert_eq!(rx1.next_event().await.unwrap().0, 100);
    assert_eq!(rx2.next_event().await.unwrap().0, 100);
}

#[tokio::test]
async fn event_types_are_isolated() {
    let bus = EventBus::new();
    let mut status = bus.subscribe::<StatusChanged>().unwrap();
    let mut posted = bus.subscribe::<BroadcastPosted>().unwrap();

    bus.publish(BroadcastPosted(13)).unwrap();
    bus.publish(StatusChanged(7)).unwrap();

    assert_eq!(status.next_event().await.unwrap().0, 7);
    assert_eq!(posted.next_event().await.unwrap().0, 13);
}

#[tokio::test]
async fn shutdown_closes_receivers() {
    let bus = EventBus::new();
    let mut rx = bus.subscribe::<StatusChanged>().unwrap();

    assert_eq!(bus.shutdown(), 1);
    assert!(rx.next_event().await.is_none());
}

#[tokio::test]
async fn dropping_the_last_bus_handle_closes_receivers() {
    let bus = EventBus::new();
    let mut rx = bus.subscribe::<StatusChanged>().unwrap();
    drop(bus);

    assert!(rx.next_event().await.is_none());
}

#[tokio::test]
async fn ordering_is_preserved_across_shared_events() {
    let bus = EventBus::new();
    let mut rx = bus.subscribe::<StatusChanged>().unwrap();

    for i in 0..50 {
        bus.publish_arc(Arc::new(StatusChanged(i))).unwrap();
    }
    for i in 0..50 {
        assert_eq!(rx.next_event().await.unwrap().0, i);
    }
}

#[tokio::test]
async fn concurrent_publishers_all_arrive() {
    let bus = EventBus::new();
    let mut rx = bus.subscribe::<StatusChanged>().unwrap();

    let handles: Vec<_> = (0..2)
        .map(|n| {
            let bus = bus.clone();
            tokio::spawn(async move {
                for i in 0..50 {
                    bus.publish(StatusChanged(n * 50 + i)).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap();
    }

    let mut received = 0;
    while tokio::time::timeout(Duration::from_millis(100), rx.next_event()).await.is_ok() {
        received += 1;
    }
    assert_eq!(received, 100);
}

#[test]
fn zero_capacity_is_rejected() {
    let bus = EventBus::new();
    let result = bus.subscribe_with_capacity::<StatusChanged>(0);
    assert!(matches!(result, Err(EventBusError::InvalidCapacity { .. })));
}
