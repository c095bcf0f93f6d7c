//! Runtime context shared by services

use mongo_rx_core::{NoSQLError, Result};
#[cfg(feature = "eventbus")]
use mongo_rx_eventbus::EventBus;
use tokio::runtime::Handle;

/// The tokio runtime and event bus services are created in
///
/// Services spawn their work on the runtime handle; proxies and binders
/// created from the same context share its event bus. Without the
/// `eventbus` feature the context carries the runtime handle only.
#[derive(Debug, Clone)]
pub struct ServiceContext {
	runtime: Handle,
	#[cfg(feature = "eventbus")]
	event_bus: EventBus,
}

impl ServiceContext {
	/// Create a context on `runtime` with a fresh event bus
	pub fn new(runtime: Handle) -> Self {
		Self {
			runtime,
			#[cfg(feature = "eventbus")]
			event_bus: EventBus::new(),
		}
	}

	/// Create a context on the runtime the caller is running in
	///
	/// # Panics
	///
	/// Panics when called outside of a tokio runtime, like
	/// [`Handle::current`].
	pub fn current() -> Self {
		Self::new(Handle::current())
	}

	/// Like [`current`](Self::current), but fails instead of panicking
	pub fn try_current() -> Result<Self> {
		Handle::try_current()
			.map(Self::new)
			.map_err(|e| NoSQLError::InvalidOperation(e.to_string()))
	}

	/// Replace the event bus, e.g. to share one between contexts
	#[cfg(feature = "eventbus")]
	pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
		self.event_bus = event_bus;
		self
	}

	pub fn runtime(&self) -> &Handle {
		&self.runtime
	}

	#[cfg(feature = "eventbus")]
	pub fn event_bus(&self) -> &EventBus {
		&self.event_bus
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[cfg(feature = "eventbus")]
	#[rstest]
	#[tokio::test]
	async fn test_current_uses_a_fresh_event_bus() {
		let context = ServiceContext::current();

		assert!(context.event_bus().addresses().is_empty());
	}

	#[cfg(feature = "eventbus")]
	#[rstest]
	#[tokio::test]
	async fn test_with_event_bus_shares_registrations() {
		// Arrange
		let bus = EventBus::new();
		let _receiver = bus.consumer("mongo.users").unwrap();

		// Act
		let context = ServiceContext::current().with_event_bus(bus);

		// Assert
		assert!(context.event_bus().is_registered("mongo.users"));
	}

	#[rstest]
	#[tokio::test]
	async fn test_try_current_uses_the_calling_runtime() {
		let context = ServiceContext::try_current().unwrap();

		assert_eq!(context.runtime().id(), Handle::current().id());
	}

	#[rstest]
	fn test_try_current_outside_runtime_fails() {
		let result = ServiceContext::try_current();

		assert!(matches!(result, Err(NoSQLError::InvalidOperation(_))));
	}
}
