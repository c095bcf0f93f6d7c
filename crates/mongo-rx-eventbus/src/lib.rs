//! # mongo-rx event bus
//!
//! Reach a [`DocumentService`](mongo_rx_core::DocumentService) by address.
//!
//! - **[`EventBus`]**: in-process registry of addresses and their consumers
//! - **[`ServiceBinder`]**: serves requests arriving at an address with a local service
//! - **[`ProxyService`]**: a `DocumentService` forwarding every operation to an address
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use mongo_rx_core::{handler, DocumentService};
//! use mongo_rx_eventbus::{EventBus, ProxyService, ServiceBinder};
//! use mongo_rx_test::RecordingService;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let bus = EventBus::new();
//! let runtime = tokio::runtime::Handle::current();
//! let _binder = ServiceBinder::bind(
//!     &bus,
//!     "mongo.users",
//!     Arc::new(RecordingService::new()),
//!     &runtime,
//! )
//! .unwrap();
//!
//! let proxy = ProxyService::new(bus, "mongo.users", runtime);
//! let (tx, rx) = tokio::sync::oneshot::channel();
//! proxy.get_collections(handler(move |result| {
//!     let _ = tx.send(result);
//! }));
//! assert_eq!(rx.await.unwrap().unwrap(), Vec::<String>::new());
//! # }
//! ```

pub mod binder;
pub mod bus;
pub mod proxy;

pub use binder::ServiceBinder;
pub use bus::{Envelope, EventBus};
pub use proxy::ProxyService;
