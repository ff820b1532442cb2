//! # Event Bus
//!
//! An in-process, typed fan-out bus. Slices publish domain events (a package status change,
//! a new broadcast) and any number of listeners receive them without knowing the publisher.
//!
//! Delivery is best effort: a publish with no subscribers is not an error, and a slow
//! listener that falls behind skips to the oldest retained event instead of failing.
//!
//! ```rust
//! use fhub_event_bus::{EventBus, EventBusError, EventReceiverExt};
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct Delivered { tracking_number: String }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), EventBusError> {
//!     let bus = EventBus::new();
//!     let mut rx = bus.subscribe::<Delivered>()?;
//!     bus.publish(Delivered { tracking_number: "TAS1".into() })?;
//!
//!     let event = rx.next_event().await.expect("bus open");
//!     assert_eq!(event.tracking_number, "TAS1");
//!     Ok(())
//! }
//! ```

mod bus;
mod error;
mod receiver;

pub use bus::{Event, EventBus};
pub use error::{EventBusError, EventBusErrorExt};
pub use receiver::EventReceiverExt;
