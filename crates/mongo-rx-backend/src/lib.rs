//! # mongo-rx backend
//!
//! MongoDB implementation of [`DocumentService`](mongo_rx_core::DocumentService).
//!
//! ## Features
//!
//! - **[`MongoConfig`]**: JSON-parsable connection settings
//! - **[`MongoDocumentService`]**: driver-backed callback service with a lazily created client
//! - **[`write_concern`]**: mapping from `WriteOption` to the driver's write concern

pub mod config;
pub mod service;
pub mod write_concern;

pub use config::MongoConfig;
pub use service::MongoDocumentService;
pub use write_concern::write_concern;
