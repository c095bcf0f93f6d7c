//! Scripted document service
//!
//! [`RecordingService`] records every operation as an [`Invocation`] and
//! answers from a queue of scripted replies. When the queue is empty each
//! operation succeeds with its empty default: no generated id, no documents,
//! a zero count and so on.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use bson::doc;
use mongo_rx_core::{
	Document, DocumentService, FindOptions, Handler, Invocation, NoSQLError, Outcome, Result,
	UpdateOptions, WriteOption,
};
use parking_lot::Mutex;

/// How a [`RecordingService`] resolves handlers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Delivery {
	/// Call the handler before the operation returns
	#[default]
	Immediate,
	/// Call the handler from a newly spawned thread
	Thread,
	/// Drop the handler without calling it
	Drop,
}

/// Document service stub recording invocations and replaying scripted replies
///
/// # Examples
///
/// ```
/// use mongo_rx_core::{handler, DocumentService, Invocation, Outcome};
/// use mongo_rx_test::RecordingService;
/// use bson::doc;
///
/// let service = RecordingService::new();
/// service.succeed_with(Outcome::Count(3));
///
/// service.count("users".to_string(), doc! {}, handler(|result| {
///     assert_eq!(result.unwrap(), 3);
/// }));
///
/// assert_eq!(
///     service.calls(),
///     vec![Invocation::Count { collection: "users".to_string(), query: doc! {} }]
/// );
/// ```
#[derive(Debug, Default)]
pub struct RecordingService {
	calls: Mutex<Vec<Invocation>>,
	replies: Mutex<VecDeque<Result<Outcome>>>,
	delivery: Mutex<Delivery>,
	starts: AtomicUsize,
	stops: AtomicUsize,
}

impl RecordingService {
	/// Create a service that answers immediately
	pub fn new() -> Self {
		Self::default()
	}

	/// Create a service resolving handlers with the given delivery
	pub fn with_delivery(delivery: Delivery) -> Self {
		let service = Self::new();
		service.set_delivery(delivery);
		service
	}

	/// Change how subsequent operations resolve their handlers
	pub fn set_delivery(&self, delivery: Delivery) {
		*self.delivery.lock() = delivery;
	}

	/// Queue a successful reply for the next operation
	pub fn succeed_with(&self, outcome: Outcome) {
		self.replies.lock().push_back(Ok(outcome));
	}

	/// Queue a failure for the next operation
	pub fn fail_with(&self, error: NoSQLError) {
		self.replies.lock().push_back(Err(error));
	}

	/// Returns every recorded invocation in call order
	pub fn calls(&self) -> Vec<Invocation> {
		self.calls.lock().clone()
	}

	/// Returns the number of recorded invocations
	pub fn call_count(&self) -> usize {
		self.calls.lock().len()
	}

	/// Returns the most recent invocation
	pub fn last_call(&self) -> Option<Invocation> {
		self.calls.lock().last().cloned()
	}

	/// Returns how often `start` was called
	pub fn start_count(&self) -> usize {
		self.starts.load(Ordering::SeqCst)
	}

	/// Returns how often `stop` was called
	pub fn stop_count(&self) -> usize {
		self.stops.load(Ordering::SeqCst)
	}

	fn respond<T>(
		&self,
		invocation: Invocation,
		default: Outcome,
		into: fn(Outcome) -> Result<T>,
		handler: Handler<T>,
	) where
		T: Send + 'static,
	{
		tracing::debug!(action = invocation.action(), "recording invocation");
		self.calls.lock().push(invocation);
		let reply = self.replies.lock().pop_front().unwrap_or(Ok(default));
		let result = reply.and_then(into);

		// Handlers may call back into this service.
		let delivery = *self.delivery.lock();
		match delivery {
			Delivery::Immediate => handler(result),
			Delivery::Thread => {
				std::thread::spawn(move || handler(result));
			}
			Delivery::Drop => drop(handler),
		}
	}

	fn respond_done(&self, invocation: Invocation, handler: Handler<()>) {
		self.respond(invocation, Outcome::Done, Outcome::into_done, handler);
	}
}

impl DocumentService for RecordingService {
	fn save(&self, collection: String, document: Document, handler: Handler<Option<String>>) {
		let invocation = Invocation::Save {
			collection,
			document,
			write_option: None,
		};
		self.respond(invocation, Outcome::Id(None), Outcome::into_id, handler);
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
		self.respond(invocation, Outcome::Id(None), Outcome::into_id, handler);
	}

	fn insert(&self, collection: String, document: Document, handler: Handler<Option<String>>) {
		let invocation = Invocation::Insert {
			collection,
			document,
			write_option: None,
		};
		self.respond(invocation, Outcome::Id(None), Outcome::into_id, handler);
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
		self.respond(invocation, Outcome::Id(None), Outcome::into_id, handler);
	}

	fn update(&self, collection: String, query: Document, update: Document, handler: Handler<()>) {
		let invocation = Invocation::Update {
			collection,
			query,
			update,
			options: None,
		};
		self.respond_done(invocation, handler);
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
		self.respond_done(invocation, handler);
	}

	fn replace(&self, collection: String, query: Document, replace: Document, handler: Handler<()>) {
		let invocation = Invocation::Replace {
			collection,
			query,
			replace,
			options: None,
		};
		self.respond_done(invocation, handler);
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
		self.respond_done(invocation, handler);
	}

	fn find(&self, collection: String, query: Document, handler: Handler<Vec<Document>>) {
		let invocation = Invocation::Find {
			collection,
			query,
			options: None,
		};
		self.respond(
			invocation,
			Outcome::Documents(Vec::new()),
			Outcome::into_documents,
			handler,
		);
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
		self.respond(
			invocation,
			Outcome::Documents(Vec::new()),
			Outcome::into_documents,
			handler,
		);
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
		self.respond(
			invocation,
			Outcome::Document(None),
			Outcome::into_document,
			handler,
		);
	}

	fn count(&self, collection: String, query: Document, handler: Handler<u64>) {
		let invocation = Invocation::Count { collection, query };
		self.respond(invocation, Outcome::Count(0), Outcome::into_count, handler);
	}

	fn remove(&self, collection: String, query: Document, handler: Handler<()>) {
		let invocation = Invocation::Remove {
			collection,
			query,
			write_option: None,
		};
		self.respond_done(invocation, handler);
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
		self.respond_done(invocation, handler);
	}

	fn remove_one(&self, collection: String, query: Document, handler: Handler<()>) {
		let invocation = Invocation::RemoveOne {
			collection,
			query,
			write_option: None,
		};
		self.respond_done(invocation, handler);
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
		self.respond_done(invocation, handler);
	}

	fn create_collection(&self, collection_name: String, handler: Handler<()>) {
		self.respond_done(Invocation::CreateCollection { collection_name }, handler);
	}

	fn get_collections(&self, handler: Handler<Vec<String>>) {
		self.respond(
			Invocation::GetCollections,
			Outcome::Names(Vec::new()),
			Outcome::into_names,
			handler,
		);
	}

	fn drop_collection(&self, collection: String, handler: Handler<()>) {
		self.respond_done(Invocation::DropCollection { collection }, handler);
	}

	fn run_command(&self, command: Document, handler: Handler<Document>) {
		self.respond(
			Invocation::RunCommand { command },
			Outcome::Command(doc! { "ok": 1 }),
			Outcome::into_command,
			handler,
		);
	}

	fn start(&self) {
		self.starts.fetch_add(1, Ordering::SeqCst);
	}

	fn stop(&self) {
		self.stops.fetch_add(1, Ordering::SeqCst);
	}
}
