//! # mongo-rx service
//!
//! [`MongoService`] exposes a document database service in two forms:
//! callbacks for direct use and cold single-value streams for composition.
//!
//! - **[`MongoService::create`]**: MongoDB-backed service
//! - **`MongoService::create_event_bus_proxy`** (`eventbus` feature, default): service reached through an event bus address
//! - **[`ServiceContext`]**: runtime handle and event bus the services live in

pub mod context;
pub mod service;

pub use context::ServiceContext;
pub use service::MongoService;
