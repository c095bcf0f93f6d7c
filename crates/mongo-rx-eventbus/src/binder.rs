//! Serving a document service at an event bus address

use std::sync::Arc;

use mongo_rx_core::{DocumentService, Result};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::bus::{Envelope, EventBus};

/// Consumer dispatching requests at an address to a local service
///
/// Requests are applied in arrival order; their replies are sent whenever the
/// service resolves the handler. Dropping the binder, or calling
/// [`unbind`](ServiceBinder::unbind), unregisters the address. Requests
/// still queued at that point fail on the sending side.
pub struct ServiceBinder {
	bus: EventBus,
	address: String,
	sender: mpsc::UnboundedSender<Envelope>,
	task: JoinHandle<()>,
}

impl ServiceBinder {
	/// Registers `address` on `bus` and starts serving it with `service`
	///
	/// Fails with [`NoSQLError::InvalidOperation`](mongo_rx_core::NoSQLError::InvalidOperation)
	/// if the address is already served.
	pub fn bind(
		bus: &EventBus,
		address: impl Into<String>,
		service: Arc<dyn DocumentService>,
		runtime: &Handle,
	) -> Result<Self> {
		let address = address.into();
		let (sender, mut receiver) = bus.register(address.clone())?;

		let task_address = address.clone();
		let task = runtime.spawn(async move {
			while let Some(Envelope { invocation, reply }) = receiver.recv().await {
				tracing::debug!(
					address = %task_address,
					action = invocation.action(),
					"dispatching event bus request"
				);
				invocation.apply(
					service.as_ref(),
					Box::new(move |result| {
						if reply.send(result).is_err() {
							tracing::trace!("requester went away before the reply was sent");
						}
					}),
				);
			}
		});

		Ok(Self {
			bus: bus.clone(),
			address,
			sender,
			task,
		})
	}

	/// Returns the address served by this binder
	pub fn address(&self) -> &str {
		&self.address
	}

	/// Stops serving the address
	pub fn unbind(self) {}
}

impl Drop for ServiceBinder {
	fn drop(&mut self) {
		self.bus.unregister_sender(&self.address, &self.sender);
		self.task.abort();
	}
}

impl std::fmt::Debug for ServiceBinder {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ServiceBinder")
			.field("address", &self.address)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use mongo_rx_core::{Invocation, NoSQLError, Outcome};
	use mongo_rx_test::RecordingService;
	use rstest::rstest;
	use tokio::sync::oneshot;

	#[rstest]
	#[tokio::test]
	async fn test_bind_serves_requests() {
		// Arrange
		let bus = EventBus::new();
		let service = Arc::new(RecordingService::new());
		service.succeed_with(Outcome::Count(7));
		let _binder =
			ServiceBinder::bind(&bus, "mongo.users", service.clone(), &Handle::current()).unwrap();
		let (reply, response) = oneshot::channel();

		// Act
		bus.send(
			"mongo.users",
			Envelope {
				invocation: Invocation::Count {
					collection: "users".to_string(),
					query: bson::doc! {},
				},
				reply,
			},
		)
		.unwrap();

		// Assert
		assert_eq!(response.await.unwrap(), Ok(Outcome::Count(7)));
		assert_eq!(service.call_count(), 1);
	}

	#[rstest]
	#[tokio::test]
	async fn test_bind_twice_fails() {
		let bus = EventBus::new();
		let service = Arc::new(RecordingService::new());
		let _binder =
			ServiceBinder::bind(&bus, "mongo.users", service.clone(), &Handle::current()).unwrap();

		let result = ServiceBinder::bind(&bus, "mongo.users", service, &Handle::current());

		assert!(matches!(result, Err(NoSQLError::InvalidOperation(_))));
	}

	#[rstest]
	#[tokio::test]
	async fn test_unbind_unregisters_address() {
		// Arrange
		let bus = EventBus::new();
		let binder = ServiceBinder::bind(
			&bus,
			"mongo.users",
			Arc::new(RecordingService::new()),
			&Handle::current(),
		)
		.unwrap();
		assert_eq!(binder.address(), "mongo.users");

		// Act
		binder.unbind();

		// Assert
		assert!(!bus.is_registered("mongo.users"));
		let rebound = ServiceBinder::bind(
			&bus,
			"mongo.users",
			Arc::new(RecordingService::new()),
			&Handle::current(),
		);
		assert!(rebound.is_ok());
	}
}
