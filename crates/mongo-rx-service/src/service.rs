//! Stream-returning MongoDB service
//!
//! [`MongoService`] wraps a [`DocumentService`] delegate. Every operation is
//! offered twice:
//!
//! - a callback form forwarding to the delegate unchanged and returning
//!   `&Self` for chaining, and
//! - a `_stream` form returning a cold [`Single`] or [`Completable`] that calls
//!   the delegate once, on first poll.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use bson::doc;
//! use futures::StreamExt;
//! use mongo_rx_core::Outcome;
//! use mongo_rx_service::MongoService;
//! use mongo_rx_test::RecordingService;
//!
//! # tokio_test::block_on(async {
//! let stub = Arc::new(RecordingService::new());
//! stub.succeed_with(Outcome::Id(Some("123".to_string())));
//! let service = MongoService::new(stub.clone());
//!
//! let ids: Vec<_> = service
//!     .insert_stream("users", doc! { "name": "a" })
//!     .collect()
//!     .await;
//!
//! assert_eq!(ids, vec![Ok("123".to_string())]);
//! assert_eq!(stub.call_count(), 1);
//! # });
//! ```

use std::fmt;
use std::sync::Arc;

use mongo_rx_backend::{MongoConfig, MongoDocumentService};
use mongo_rx_core::{
	Completable, Document, DocumentService, FindOptions, Result, Single, UpdateOptions,
	WriteOption,
};
#[cfg(feature = "eventbus")]
use mongo_rx_eventbus::ProxyService;

use crate::context::ServiceContext;

/// Document database service with callback and stream forms of every operation
///
/// Failures from the delegate reach the handler or the stream unchanged.
/// Cloning is cheap; clones share the delegate.
#[derive(Clone)]
pub struct MongoService {
	delegate: Arc<dyn DocumentService>,
}

impl MongoService {
	/// Wrap an existing delegate
	pub fn new(delegate: Arc<dyn DocumentService>) -> Self {
		Self { delegate }
	}

	/// Create a service backed by MongoDB
	///
	/// The service is stopped; call [`start`](Self::start) before issuing
	/// operations.
	pub fn create(context: &ServiceContext, config: MongoConfig) -> Self {
		tracing::debug!(db_name = %config.db_name, "creating MongoDB service");
		Self::new(Arc::new(MongoDocumentService::new(
			context.runtime().clone(),
			config,
		)))
	}

	/// Create a service backed by MongoDB from a JSON config document
	pub fn create_from_json(context: &ServiceContext, config: &serde_json::Value) -> Result<Self> {
		Ok(Self::create(context, MongoConfig::from_json(config)?))
	}

	/// Create a service forwarding every operation to an event bus address
	#[cfg(feature = "eventbus")]
	pub fn create_event_bus_proxy(context: &ServiceContext, address: impl Into<String>) -> Self {
		let address = address.into();
		tracing::debug!(address = %address, "creating event bus proxy");
		Self::new(Arc::new(ProxyService::new(
			context.event_bus().clone(),
			address,
			context.runtime().clone(),
		)))
	}

	/// Returns the wrapped delegate
	pub fn delegate(&self) -> &Arc<dyn DocumentService> {
		&self.delegate
	}

	/// Saves a document, replacing any document with the same `_id`
	pub fn save<F>(&self, collection: impl Into<String>, document: Document, handler: F) -> &Self
	where
		F: FnOnce(Result<Option<String>>) + Send + 'static,
	{
		self.delegate
			.save(collection.into(), document, Box::new(handler));
		self
	}

	/// Emits the generated id, or completes empty when the document had an `_id`
	pub fn save_stream(&self, collection: impl Into<String>, document: Document) -> Single<String> {
		let delegate = Arc::clone(&self.delegate);
		let collection = collection.into();
		Single::from_optional_handler(move |handler| delegate.save(collection, document, handler))
	}

	/// Saves a document with the given write option
	pub fn save_with_options<F>(
		&self,
		collection: impl Into<String>,
		document: Document,
		write_option: WriteOption,
		handler: F,
	) -> &Self
	where
		F: FnOnce(Result<Option<String>>) + Send + 'static,
	{
		self.delegate.save_with_options(
			collection.into(),
			document,
			write_option,
			Box::new(handler),
		);
		self
	}

	/// Stream form of [`save_with_options`](Self::save_with_options)
	pub fn save_with_options_stream(
		&self,
		collection: impl Into<String>,
		document: Document,
		write_option: WriteOption,
	) -> Single<String> {
		let delegate = Arc::clone(&self.delegate);
		let collection = collection.into();
		Single::from_optional_handler(move |handler| {
			delegate.save_with_options(collection, document, write_option, handler)
		})
	}

	/// Inserts a document; the handler receives the generated id, if any
	pub fn insert<F>(&self, collection: impl Into<String>, document: Document, handler: F) -> &Self
	where
		F: FnOnce(Result<Option<String>>) + Send + 'static,
	{
		self.delegate
			.insert(collection.into(), document, Box::new(handler));
		self
	}

	/// Emits the generated id, or completes empty when the document had an `_id`
	pub fn insert_stream(&self, collection: impl Into<String>, document: Document) -> Single<String> {
		let delegate = Arc::clone(&self.delegate);
		let collection = collection.into();
		Single::from_optional_handler(move |handler| delegate.insert(collection, document, handler))
	}

	/// Inserts a document with the given write option
	pub fn insert_with_options<F>(
		&self,
		collection: impl Into<String>,
		document: Document,
		write_option: WriteOption,
		handler: F,
	) -> &Self
	where
		F: FnOnce(Result<Option<String>>) + Send + 'static,
	{
		self.delegate.insert_with_options(
			collection.into(),
			document,
			write_option,
			Box::new(handler),
		);
		self
	}

	/// Stream form of [`insert_with_options`](Self::insert_with_options)
	pub fn insert_with_options_stream(
		&self,
		collection: impl Into<String>,
		document: Document,
		write_option: WriteOption,
	) -> Single<String> {
		let delegate = Arc::clone(&self.delegate);
		let collection = collection.into();
		Single::from_optional_handler(move |handler| {
			delegate.insert_with_options(collection, document, write_option, handler)
		})
	}

	/// Applies `update` to the first document matching `query`
	pub fn update<F>(
		&self,
		collection: impl Into<String>,
		query: Document,
		update: Document,
		handler: F,
	) -> &Self
	where
		F: FnOnce(Result<()>) + Send + 'static,
	{
		self.delegate
			.update(collection.into(), query, update, Box::new(handler));
		self
	}

	/// Stream form of [`update`](Self::update)
	pub fn update_stream(
		&self,
		collection: impl Into<String>,
		query: Document,
		update: Document,
	) -> Completable {
		let delegate = Arc::clone(&self.delegate);
		let collection = collection.into();
		Completable::from_completion(move |handler| {
			delegate.update(collection, query, update, handler)
		})
	}

	/// Applies `update` with explicit upsert, multi and write options
	pub fn update_with_options<F>(
		&self,
		collection: impl Into<String>,
		query: Document,
		update: Document,
		options: UpdateOptions,
		handler: F,
	) -> &Self
	where
		F: FnOnce(Result<()>) + Send + 'static,
	{
		self.delegate.update_with_options(
			collection.into(),
			query,
			update,
			options,
			Box::new(handler),
		);
		self
	}

	/// Stream form of [`update_with_options`](Self::update_with_options)
	pub fn update_with_options_stream(
		&self,
		collection: impl Into<String>,
		query: Document,
		update: Document,
		options: UpdateOptions,
	) -> Completable {
		let delegate = Arc::clone(&self.delegate);
		let collection = collection.into();
		Completable::from_completion(move |handler| {
			delegate.update_with_options(collection, query, update, options, handler)
		})
	}

	/// Replaces the document matching `query`
	pub fn replace<F>(
		&self,
		collection: impl Into<String>,
		query: Document,
		replace: Document,
		handler: F,
	) -> &Self
	where
		F: FnOnce(Result<()>) + Send + 'static,
	{
		self.delegate
			.replace(collection.into(), query, replace, Box::new(handler));
		self
	}

	/// Stream form of [`replace`](Self::replace)
	pub fn replace_stream(
		&self,
		collection: impl Into<String>,
		query: Document,
		replace: Document,
	) -> Completable {
		let delegate = Arc::clone(&self.delegate);
		let collection = collection.into();
		Completable::from_completion(move |handler| {
			delegate.replace(collection, query, replace, handler)
		})
	}

	/// Replaces the document matching `query` with explicit options
	pub fn replace_with_options<F>(
		&self,
		collection: impl Into<String>,
		query: Document,
		replace: Document,
		options: UpdateOptions,
		handler: F,
	) -> &Self
	where
		F: FnOnce(Result<()>) + Send + 'static,
	{
		self.delegate.replace_with_options(
			collection.into(),
			query,
			replace,
			options,
			Box::new(handler),
		);
		self
	}

	/// Stream form of [`replace_with_options`](Self::replace_with_options)
	pub fn replace_with_options_stream(
		&self,
		collection: impl Into<String>,
		query: Document,
		replace: Document,
		options: UpdateOptions,
	) -> Completable {
		let delegate = Arc::clone(&self.delegate);
		let collection = collection.into();
		Completable::from_completion(move |handler| {
			delegate.replace_with_options(collection, query, replace, options, handler)
		})
	}

	/// Finds every document matching `query`
	pub fn find<F>(&self, collection: impl Into<String>, query: Document, handler: F) -> &Self
	where
		F: FnOnce(Result<Vec<Document>>) + Send + 'static,
	{
		self.delegate
			.find(collection.into(), query, Box::new(handler));
		self
	}

	/// Emits every matching document as one list
	pub fn find_stream(&self, collection: impl Into<String>, query: Document) -> Single<Vec<Document>> {
		let delegate = Arc::clone(&self.delegate);
		let collection = collection.into();
		Single::from_handler(move |handler| delegate.find(collection, query, handler))
	}

	/// Finds documents with projection, sort, limit and skip
	pub fn find_with_options<F>(
		&self,
		collection: impl Into<String>,
		query: Document,
		options: FindOptions,
		handler: F,
	) -> &Self
	where
		F: FnOnce(Result<Vec<Document>>) + Send + 'static,
	{
		self.delegate
			.find_with_options(collection.into(), query, options, Box::new(handler));
		self
	}

	/// Stream form of [`find_with_options`](Self::find_with_options)
	pub fn find_with_options_stream(
		&self,
		collection: impl Into<String>,
		query: Document,
		options: FindOptions,
	) -> Single<Vec<Document>> {
		let delegate = Arc::clone(&self.delegate);
		let collection = collection.into();
		Single::from_handler(move |handler| {
			delegate.find_with_options(collection, query, options, handler)
		})
	}

	/// Finds the first document matching `query`, projected to `fields`
	pub fn find_one<F>(
		&self,
		collection: impl Into<String>,
		query: Document,
		fields: Document,
		handler: F,
	) -> &Self
	where
		F: FnOnce(Result<Option<Document>>) + Send + 'static,
	{
		self.delegate
			.find_one(collection.into(), query, fields, Box::new(handler));
		self
	}

	/// Emits the first matching document, or completes empty when none matches
	pub fn find_one_stream(
		&self,
		collection: impl Into<String>,
		query: Document,
		fields: Document,
	) -> Single<Document> {
		let delegate = Arc::clone(&self.delegate);
		let collection = collection.into();
		Single::from_optional_handler(move |handler| {
			delegate.find_one(collection, query, fields, handler)
		})
	}

	/// Counts the documents matching `query`
	pub fn count<F>(&self, collection: impl Into<String>, query: Document, handler: F) -> &Self
	where
		F: FnOnce(Result<u64>) + Send + 'static,
	{
		self.delegate
			.count(collection.into(), query, Box::new(handler));
		self
	}

	/// Emits the number of documents matching `query`
	pub fn count_stream(&self, collection: impl Into<String>, query: Document) -> Single<u64> {
		let delegate = Arc::clone(&self.delegate);
		let collection = collection.into();
		Single::from_handler(move |handler| delegate.count(collection, query, handler))
	}

	/// Removes every document matching `query`
	pub fn remove<F>(&self, collection: impl Into<String>, query: Document, handler: F) -> &Self
	where
		F: FnOnce(Result<()>) + Send + 'static,
	{
		self.delegate
			.remove(collection.into(), query, Box::new(handler));
		self
	}

	/// Stream form of [`remove`](Self::remove)
	pub fn remove_stream(&self, collection: impl Into<String>, query: Document) -> Completable {
		let delegate = Arc::clone(&self.delegate);
		let collection = collection.into();
		Completable::from_completion(move |handler| delegate.remove(collection, query, handler))
	}

	/// Removes every matching document with the given write option
	pub fn remove_with_options<F>(
		&self,
		collection: impl Into<String>,
		query: Document,
		write_option: WriteOption,
		handler: F,
	) -> &Self
	where
		F: FnOnce(Result<()>) + Send + 'static,
	{
		self.delegate.remove_with_options(
			collection.into(),
			query,
			write_option,
			Box::new(handler),
		);
		self
	}

	/// Stream form of [`remove_with_options`](Self::remove_with_options)
	pub fn remove_with_options_stream(
		&self,
		collection: impl Into<String>,
		query: Document,
		write_option: WriteOption,
	) -> Completable {
		let delegate = Arc::clone(&self.delegate);
		let collection = collection.into();
		Completable::from_completion(move |handler| {
			delegate.remove_with_options(collection, query, write_option, handler)
		})
	}

	/// Removes the first document matching `query`
	pub fn remove_one<F>(&self, collection: impl Into<String>, query: Document, handler: F) -> &Self
	where
		F: FnOnce(Result<()>) + Send + 'static,
	{
		self.delegate
			.remove_one(collection.into(), query, Box::new(handler));
		self
	}

	/// Stream form of [`remove_one`](Self::remove_one)
	pub fn remove_one_stream(&self, collection: impl Into<String>, query: Document) -> Completable {
		let delegate = Arc::clone(&self.delegate);
		let collection = collection.into();
		Completable::from_completion(move |handler| delegate.remove_one(collection, query, handler))
	}

	/// Removes the first matching document with the given write option
	pub fn remove_one_with_options<F>(
		&self,
		collection: impl Into<String>,
		query: Document,
		write_option: WriteOption,
		handler: F,
	) -> &Self
	where
		F: FnOnce(Result<()>) + Send + 'static,
	{
		self.delegate.remove_one_with_options(
			collection.into(),
			query,
			write_option,
			Box::new(handler),
		);
		self
	}

	/// Stream form of [`remove_one_with_options`](Self::remove_one_with_options)
	pub fn remove_one_with_options_stream(
		&self,
		collection: impl Into<String>,
		query: Document,
		write_option: WriteOption,
	) -> Completable {
		let delegate = Arc::clone(&self.delegate);
		let collection = collection.into();
		Completable::from_completion(move |handler| {
			delegate.remove_one_with_options(collection, query, write_option, handler)
		})
	}

	/// Creates a collection
	pub fn create_collection<F>(&self, collection_name: impl Into<String>, handler: F) -> &Self
	where
		F: FnOnce(Result<()>) + Send + 'static,
	{
		self.delegate
			.create_collection(collection_name.into(), Box::new(handler));
		self
	}

	/// Completes once the collection exists
	pub fn create_collection_stream(&self, collection_name: impl Into<String>) -> Completable {
		let delegate = Arc::clone(&self.delegate);
		let collection_name = collection_name.into();
		Completable::from_completion(move |handler| {
			delegate.create_collection(collection_name, handler)
		})
	}

	/// Lists the collection names of the database
	pub fn get_collections<F>(&self, handler: F) -> &Self
	where
		F: FnOnce(Result<Vec<String>>) + Send + 'static,
	{
		self.delegate.get_collections(Box::new(handler));
		self
	}

	/// Emits the collection names as one list
	pub fn get_collections_stream(&self) -> Single<Vec<String>> {
		let delegate = Arc::clone(&self.delegate);
		Single::from_handler(move |handler| delegate.get_collections(handler))
	}

	/// Drops a collection
	pub fn drop_collection<F>(&self, collection: impl Into<String>, handler: F) -> &Self
	where
		F: FnOnce(Result<()>) + Send + 'static,
	{
		self.delegate
			.drop_collection(collection.into(), Box::new(handler));
		self
	}

	/// Stream form of [`drop_collection`](Self::drop_collection)
	pub fn drop_collection_stream(&self, collection: impl Into<String>) -> Completable {
		let delegate = Arc::clone(&self.delegate);
		let collection = collection.into();
		Completable::from_completion(move |handler| delegate.drop_collection(collection, handler))
	}

	/// Runs a database command
	pub fn run_command<F>(&self, command: Document, handler: F) -> &Self
	where
		F: FnOnce(Result<Document>) + Send + 'static,
	{
		self.delegate.run_command(command, Box::new(handler));
		self
	}

	/// Emits the reply of a database command
	pub fn run_command_stream(&self, command: Document) -> Single<Document> {
		let delegate = Arc::clone(&self.delegate);
		Single::from_handler(move |handler| delegate.run_command(command, handler))
	}

	/// Starts the delegate
	pub fn start(&self) {
		self.delegate.start();
	}

	/// Stops the delegate
	pub fn stop(&self) {
		self.delegate.stop();
	}
}

impl fmt::Debug for MongoService {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("MongoService").finish_non_exhaustive()
	}
}
