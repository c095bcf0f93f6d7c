//! Callback-style document service contract
//!
//! A [`DocumentService`] is the delegate behind every adapter. Each
//! asynchronous operation receives its arguments by value together with a
//! [`Handler`] that the service must call at most once, from any thread,
//! when the operation finishes.

use crate::error::Result;
use crate::types::{Document, FindOptions, UpdateOptions, WriteOption};

/// Completion continuation for an asynchronous operation
///
/// Being `FnOnce`, a handler can be resolved at most once.
pub type Handler<T> = Box<dyn FnOnce(Result<T>) + Send + 'static>;

/// Boxes a closure into a [`Handler`]
///
/// # Example
///
/// ```rust
/// use mongo_rx_core::{handler, Handler};
///
/// let h: Handler<u64> = handler(|result| assert_eq!(result.unwrap(), 3));
/// h(Ok(3));
/// ```
pub fn handler<T, F>(f: F) -> Handler<T>
where
	F: FnOnce(Result<T>) + Send + 'static,
{
	Box::new(f)
}

/// Trait for callback-based document database services
///
/// Implementations perform the actual work (network I/O, query execution).
/// Callers never block: every operation returns immediately and reports
/// through its handler.
pub trait DocumentService: Send + Sync {
	/// Saves a document, replacing any document with the same `_id`
	///
	/// The handler receives the generated id when the document had none.
	fn save(&self, collection: String, document: Document, handler: Handler<Option<String>>);

	/// Saves a document with the given write option
	fn save_with_options(
		&self,
		collection: String,
		document: Document,
		write_option: WriteOption,
		handler: Handler<Option<String>>,
	);

	/// Inserts a document
	///
	/// The handler receives the generated id when the document had none.
	fn insert(&self, collection: String, document: Document, handler: Handler<Option<String>>);

	/// Inserts a document with the given write option
	fn insert_with_options(
		&self,
		collection: String,
		document: Document,
		write_option: WriteOption,
		handler: Handler<Option<String>>,
	);

	/// Applies an update document to the documents matching `query`
	fn update(&self, collection: String, query: Document, update: Document, handler: Handler<()>);

	/// Applies an update document with explicit options
	fn update_with_options(
		&self,
		collection: String,
		query: Document,
		update: Document,
		options: UpdateOptions,
		handler: Handler<()>,
	);

	/// Replaces the document matching `query`
	fn replace(&self, collection: String, query: Document, replace: Document, handler: Handler<()>);

	/// Replaces the document matching `query` with explicit options
	fn replace_with_options(
		&self,
		collection: String,
		query: Document,
		replace: Document,
		options: UpdateOptions,
		handler: Handler<()>,
	);

	/// Finds every document matching `query`
	fn find(&self, collection: String, query: Document, handler: Handler<Vec<Document>>);

	/// Finds documents matching `query` with projection, sort, limit and skip
	fn find_with_options(
		&self,
		collection: String,
		query: Document,
		options: FindOptions,
		handler: Handler<Vec<Document>>,
	);

	/// Finds the first document matching `query`, projected to `fields`
	fn find_one(
		&self,
		collection: String,
		query: Document,
		fields: Document,
		handler: Handler<Option<Document>>,
	);

	/// Counts the documents matching `query`
	fn count(&self, collection: String, query: Document, handler: Handler<u64>);

	/// Removes every document matching `query`
	fn remove(&self, collection: String, query: Document, handler: Handler<()>);

	/// Removes every document matching `query` with the given write option
	fn remove_with_options(
		&self,
		collection: String,
		query: Document,
		write_option: WriteOption,
		handler: Handler<()>,
	);

	/// Removes the first document matching `query`
	fn remove_one(&self, collection: String, query: Document, handler: Handler<()>);

	/// Removes the first document matching `query` with the given write option
	fn remove_one_with_options(
		&self,
		collection: String,
		query: Document,
		write_option: WriteOption,
		handler: Handler<()>,
	);

	/// Creates a collection
	fn create_collection(&self, collection_name: String, handler: Handler<()>);

	/// Lists the collection names of the database
	fn get_collections(&self, handler: Handler<Vec<String>>);

	/// Drops a collection
	fn drop_collection(&self, collection: String, handler: Handler<()>);

	/// Runs an arbitrary database command
	fn run_command(&self, command: Document, handler: Handler<Document>);

	/// Starts the service
	fn start(&self);

	/// Stops the service
	fn stop(&self);
}
