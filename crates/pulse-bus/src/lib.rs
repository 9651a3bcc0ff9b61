//! Typed publish/subscribe event bus for the pulse toolkit.
//!
//! An [`EventBus`] routes typed payload tuples to handlers under
//! caller-chosen keys. Handler signatures are erased at registration
//! and re-verified at publish time, so one bus instance carries
//! events of every shape side by side.
//!
//! # Message flow
//!
//! ```text
//! publish(key, (a, b))          subscribe(key, |a, b| ..)
//!        │                                │
//!        ▼                                ▼
//! ┌──────────────┐  signature Σ    ┌──────────────┐
//! │   Payload    │ ──── match ───► │   handlers   │
//! │ (erased args)│                 │ (typed `&mut`│
//! └──────────────┘                 │  callbacks)  │
//!                                  └──────────────┘
//! ```
//!
//! # Subscription modes
//!
//! - **Multicast** (default): any number of handlers per key,
//!   visited in registration order.
//! - **Unicast**: one handler slot per key; a later
//!   [`EventBus::subscribe_unicast`] evicts the earlier handler.
//!
//! `*_once` variants auto-remove the handler after its first
//! successful delivery.
//!
//! # Matching
//!
//! A publish and a handler match when their arity and element types
//! agree exactly; there are no implicit conversions. A handler registered for
//! `(i16,)` is not invoked by `publish(key, (10_i32,))`; mismatches
//! are counted in the [`PublishResult`] with the handler's expected
//! signature.
//!
//! # Example
//!
//! ```
//! use pulse_bus::{EventBus, SubscriptionMode};
//!
//! let bus: EventBus<String> = EventBus::new();
//!
//! bus.subscribe("damage".to_string(), |amount: &mut i32, source: &mut String| {
//!     println!("{source} dealt {amount}");
//! }, "combat log");
//!
//! let result = bus.publish(&"damage".to_string(), (12, "trap".to_string()));
//! assert!(result.success);
//! assert_eq!(result.mode, SubscriptionMode::Multicast);
//! ```

mod bus;
mod error;
mod result;
mod token;

pub use bus::EventBus;
pub use error::BusError;
pub use result::{PublishResult, SubscriptionMode};
pub use token::SubscriberId;
