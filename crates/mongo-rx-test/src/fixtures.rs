use std::sync::Arc;

use rstest::*;

use crate::logging::init_test_logging;
use crate::recording::RecordingService;

/// Fixture providing a fresh recording service with test logging enabled
///
/// The service answers every operation with its empty default outcome until
/// replies are queued.
///
/// Note: Doctests cannot use rstest fixtures directly. See the unit tests
/// below for usage.
#[fixture]
pub fn recording_service() -> Arc<RecordingService> {
	init_test_logging();
	Arc::new(RecordingService::new())
}
