//! Testing utilities for mongo-rx
//!
//! - [`RecordingService`]: a scripted [`DocumentService`](mongo_rx_core::DocumentService)
//!   that records every invocation
//! - [`logging::init_test_logging`]: one-time tracing setup for tests
//! - rstest fixtures in [`fixtures`]

pub mod fixtures;
pub mod logging;
pub mod recording;

pub use fixtures::recording_service;
pub use logging::init_test_logging;
pub use recording::{Delivery, RecordingService};
