//! Document service forwarding to an event bus address

use mongo_rx_core::{
	Document, DocumentService, FindOptions, Handler, Invocation, NoSQLError, Outcome, Result,
	UpdateOptions, WriteOption,
};
use tokio::runtime::Handle;
use tokio::sync::oneshot;

use crate::bus::{Envelope, EventBus};

/// [`DocumentService`] that sends every operation to an event bus address
///
/// Failures reported by the remote service are passed through unchanged.
/// Besides those, an operation fails with:
///
/// - [`NoSQLError::NoHandlers`] when nothing serves the address,
/// - [`NoSQLError::ConnectionError`] when the request is dropped unanswered,
/// - [`NoSQLError::ExecutionError`] when the reply does not fit the operation.
///
/// `start` and `stop` do nothing; the served service owns its lifecycle.
#[derive(Debug, Clone)]
pub struct ProxyService {
	bus: EventBus,
	address: String,
	runtime: Handle,
}

impl ProxyService {
	pub fn new(bus: EventBus, address: impl Into<String>, runtime: Handle) -> Self {
		Self {
			bus,
			address: address.into(),
			runtime,
		}
	}

	/// Returns the address requests are sent to
	pub fn address(&self) -> &str {
		&self.address
	}

	fn dispatch<T>(&self, invocation: Invocation, into: fn(Outcome) -> Result<T>, handler: Handler<T>)
	where
		T: Send + 'static,
	{
		let action = invocation.action();
		let (reply, response) = oneshot::channel();
		if let Err(e) = self.bus.send(&self.address, Envelope { invocation, reply }) {
			tracing::debug!(address = %self.address, action, "no consumer for event bus request");
			handler(Err(e));
			return;
		}

		let address = self.address.clone();
		self.runtime.spawn(async move {
			let result = match response.await {
				Ok(reply) => reply.and_then(|outcome| {
					let kind = outcome.kind();
					into(outcome).inspect_err(|e| {
						tracing::warn!(
							address = %address,
							action,
							kind,
							error = %e,
							"unexpected event bus reply"
						);
					})
				}),
				Err(_) => Err(NoSQLError::ConnectionError(format!(
					"no reply from {} for {}",
					address, action
				))),
			};
			handler(result);
		});
	}
}

impl DocumentService for ProxyService {
	fn save(&self, collection: String, document: Document, handler: Handler<Option<String>>) {
		let invocation = Invocation::Save {
			collection,
			document,
			write_option: None,
		};
		self.dispatch(invocation, Outcome::into_id, handler);
	}

	fn save_with_options(
		&self,
		collection: String,
		document: Document,
		write_option: WriteOption,
		handler: Handler<Option<String>>,
	) {
		let invocation = Invocation::Save {
			collection,
			document,
			write_option: Some(write_option),
		};
		self.dispatch(invocation, Outcome::into_id, handler);
	}

	fn insert(&self, collection: String, document: Document, handler: Handler<Option<String>>) {
		let invocation = Invocation::Insert {
			collection,
			document,
			write_option: None,
		};
		self.dispatch(invocation, Outcome::into_id, handler);
	}

	fn insert_with_options(
		&self,
		collection: String,
		document: Document,
		write_option: WriteOption,
		handler: Handler<Option<String>>,
	) {
		let invocation = Invocation::Insert {
			collection,
			document,
			write_option: Some(write_option),
		};
		self.dispatch(invocation, Outcome::into_id, handler);
	}

	fn update(&self, collection: String, query: Document, update: Document, handler: Handler<()>) {
		let invocation = Invocation::Update {
			collection,
			query,
			update,
			options: None,
		};
		self.dispatch(invocation, Outcome::into_done, handler);
	}

	fn update_with_options(
		&self,
		collection: String,
		query: Document,
		update: Document,
		options: UpdateOptions,
		handler: Handler<()>,
	) {
		let invocation = Invocation::Update {
			collection,
			query,
			update,
			options: Some(options),
		};
		self.dispatch(invocation, Outcome::into_done, handler);
	}

	fn replace(&self, collection: String, query: Document, replace: Document, handler: Handler<()>) {
		let invocation = Invocation::Replace {
			collection,
			query,
			replace,
			options: None,
		};
		self.dispatch(invocation, Outcome::into_done, handler);
	}

	fn replace_with_options(
		&self,
		collection: String,
		query: Document,
		replace: Document,
		options: UpdateOptions,
		handler: Handler<()>,
	) {
		let invocation = Invocation::Replace {
			collection,
			query,
			replace,
			options: Some(options),
		};
		self.dispatch(invocation, Outcome::into_done, handler);
	}

	fn find(&self, collection: String, query: Document, handler: Handler<Vec<Document>>) {
		let invocation = Invocation::Find {
			collection,
			query,
			options: None,
		};
		self.dispatch(invocation, Outcome::into_documents, handler);
	}

	fn find_with_options(
		&self,
		collection: String,
		query: Document,
		options: FindOptions,
		handler: Handler<Vec<Document>>,
	) {
		let invocation = Invocation::Find {
			collection,
			query,
			options: Some(options),
		};
		self.dispatch(invocation, Outcome::into_documents, handler);
	}

	fn find_one(
		&self,
		collection: String,
		query: Document,
		fields: Document,
		handler: Handler<Option<Document>>,
	) {
		let invocation = Invocation::FindOne {
			collection,
			query,
			fields,
		};
		self.dispatch(invocation, Outcome::into_document, handler);
	}

	fn count(&self, collection: String, query: Document, handler: Handler<u64>) {
		self.dispatch(
			Invocation::Count { collection, query },
			Outcome::into_count,
			handler,
		);
	}

	fn remove(&self, collection: String, query: Document, handler: Handler<()>) {
		let invocation = Invocation::Remove {
			collection,
			query,
			write_option: None,
		};
		self.dispatch(invocation, Outcome::into_done, handler);
	}

	fn remove_with_options(
		&self,
		collection: String,
		query: Document,
		write_option: WriteOption,
		handler: Handler<()>,
	) {
		let invocation = Invocation::Remove {
			collection,
			query,
			write_option: Some(write_option),
		};
		self.dispatch(invocation, Outcome::into_done, handler);
	}

	fn remove_one(&self, collection: String, query: Document, handler: Handler<()>) {
		let invocation = Invocation::RemoveOne {
			collection,
			query,
			write_option: None,
		};
		self.dispatch(invocation, Outcome::into_done, handler);
	}

	fn remove_one_with_options(
		&self,
		collection: String,
		query: Document,
		write_option: WriteOption,
		handler: Handler<()>,
	) {
		let invocation = Invocation::RemoveOne {
			collection,
			query,
			write_option: Some(write_option),
		};
		self.dispatch(invocation, Outcome::into_done, handler);
	}

	fn create_collection(&self, collection_name: String, handler: Handler<()>) {
		self.dispatch(
			Invocation::CreateCollection { collection_name },
			Outcome::into_done,
			handler,
		);
	}

	fn get_collections(&self, handler: Handler<Vec<String>>) {
		self.dispatch(Invocation::GetCollections, Outcome::into_names, handler);
	}

	fn drop_collection(&self, collection: String, handler: Handler<()>) {
		self.dispatch(
			Invocation::DropCollection { collection },
			Outcome::into_done,
			handler,
		);
	}

	fn run_command(&self, command: Document, handler: Handler<Document>) {
		self.dispatch(Invocation::RunCommand { command }, Outcome::into_command, handler);
	}

	fn start(&self) {}

	fn stop(&self) {}
}
