//! MongoDB document service
//!
//! [`MongoDocumentService`] implements the callback-style
//! [`DocumentService`] on top of the official driver. Every operation is
//! spawned on the tokio runtime handle given at construction; its handler
//! fires from that task.
//!
//! # Example
//!
//! ```rust,no_run
//! use mongo_rx_backend::{MongoConfig, MongoDocumentService};
//! use mongo_rx_core::DocumentService;
//! use bson::doc;
//!
//! # async fn example() {
//! let service = MongoDocumentService::new(
//!     tokio::runtime::Handle::current(),
//!     MongoConfig::new().db_name("myapp"),
//! );
//! service.start();
//!
//! service.insert(
//!     "users".to_string(),
//!     doc! { "name": "Alice" },
//!     Box::new(|result| println!("inserted: {:?}", result)),
//! );
//! # }
//! ```

use std::future::Future;
use std::sync::Arc;

use bson::{Document, doc, oid::ObjectId};
use futures::stream::TryStreamExt;
use mongo_rx_core::{
	DocumentService, FindOptions, Handler, NoSQLError, Result, UpdateOptions, WriteOption,
};
use mongodb::options::{
	DeleteOptions, FindOneOptions, InsertOneOptions, ReplaceOptions, WriteConcern,
};
use mongodb::{Client, Database};
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::OnceCell;

use crate::config::MongoConfig;
use crate::write_concern::write_concern;

type ClientCell = Arc<OnceCell<Client>>;

/// MongoDB-backed [`DocumentService`]
///
/// The service is inert until [`start`](DocumentService::start) is called.
/// The driver client is created on the first operation after `start` and
/// shared by later operations; [`stop`](DocumentService::stop) shuts it down
/// in the background. Operations issued while stopped fail with
/// [`NoSQLError::ConnectionError`].
pub struct MongoDocumentService {
	runtime: Handle,
	config: Arc<MongoConfig>,
	client: Mutex<Option<ClientCell>>,
}

impl MongoDocumentService {
	/// Create a stopped service
	pub fn new(runtime: Handle, config: MongoConfig) -> Self {
		Self {
			runtime,
			config: Arc::new(config),
			client: Mutex::new(None),
		}
	}

	/// Returns the configuration of this service
	pub fn config(&self) -> &MongoConfig {
		&self.config
	}

	/// Returns true between `start` and `stop`
	pub fn is_started(&self) -> bool {
		self.client.lock().is_some()
	}

	/// Runs `operation` against the configured database and reports to `handler`
	fn execute<T, F, Fut>(&self, action: &'static str, handler: Handler<T>, operation: F)
	where
		T: Send + 'static,
		F: FnOnce(Database, Arc<MongoConfig>) -> Fut + Send + 'static,
		Fut: Future<Output = Result<T>> + Send + 'static,
	{
		let Some(cell) = self.client.lock().clone() else {
			handler(Err(NoSQLError::ConnectionError(
				"MongoDB service is not started".to_string(),
			)));
			return;
		};

		tracing::debug!(action, db_name = %self.config.db_name, "executing MongoDB operation");
		let config = Arc::clone(&self.config);
		self.runtime.spawn(async move {
			let result = match cell.get_or_try_init(|| config.connect()).await {
				Ok(client) => operation(client.database(&config.db_name), config).await,
				Err(e) => Err(e),
			};
			if let Err(e) = &result {
				tracing::debug!(action, error = %e, "MongoDB operation failed");
			}
			handler(result);
		});
	}

	fn insert_document(
		&self,
		action: &'static str,
		collection: String,
		document: Document,
		write_option: Option<WriteOption>,
		handler: Handler<Option<String>>,
	) {
		self.execute(action, handler, move |db, config| {
			insert_one(db, collection, document, resolve_write_concern(write_option, &config))
		});
	}

	fn save_document(
		&self,
		action: &'static str,
		collection: String,
		document: Document,
		write_option: Option<WriteOption>,
		handler: Handler<Option<String>>,
	) {
		match save_route(document, write_option) {
			SaveRoute::Insert(document) => {
				self.insert_document(action, collection, document, write_option, handler);
			}
			SaveRoute::Replace {
				filter,
				document,
				options,
			} => {
				self.execute(action, handler, move |db, config| async move {
					replace_one(db, collection, filter, document, options, &config)
						.await
						.map(|()| None)
				});
			}
		}
	}
}

/// How a `save` reaches the driver
#[derive(Debug, PartialEq)]
enum SaveRoute {
	/// The document has no `_id` yet
	Insert(Document),
	/// Upsert keyed on the document's `_id`
	Replace {
		filter: Document,
		document: Document,
		options: UpdateOptions,
	},
}

fn save_route(document: Document, write_option: Option<WriteOption>) -> SaveRoute {
	let Some(id) = document.get("_id").cloned() else {
		return SaveRoute::Insert(document);
	};
	SaveRoute::Replace {
		filter: doc! { "_id": id },
		document,
		options: UpdateOptions {
			write_option,
			upsert: true,
			multi: false,
		},
	}
}

/// Whether a write touches the first match or every match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
	One,
	Many,
}

impl Scope {
	fn of_update(options: &UpdateOptions) -> Self {
		if options.multi {
			Scope::Many
		} else {
			Scope::One
		}
	}
}

/// Gives `document` a fresh ObjectId hex `_id` unless it already has one
///
/// Returns the generated id.
fn assign_id(document: &mut Document) -> Option<String> {
	if document.contains_key("_id") {
		return None;
	}
	let id = ObjectId::new().to_hex();
	document.insert("_id", id.clone());
	Some(id)
}

fn update_options(options: &UpdateOptions, config: &MongoConfig) -> mongodb::options::UpdateOptions {
	let mut mongo_options = mongodb::options::UpdateOptions::default();
	mongo_options.upsert = Some(options.upsert);
	mongo_options.write_concern = resolve_write_concern(options.write_option, config);
	mongo_options
}

fn replace_options(options: &UpdateOptions, config: &MongoConfig) -> ReplaceOptions {
	let mut mongo_options = ReplaceOptions::default();
	mongo_options.upsert = Some(options.upsert);
	mongo_options.write_concern = resolve_write_concern(options.write_option, config);
	mongo_options
}

fn find_options(options: FindOptions) -> mongodb::options::FindOptions {
	let mut mongo_options = mongodb::options::FindOptions::default();
	mongo_options.limit = options.effective_limit();
	mongo_options.skip = options.effective_skip();
	mongo_options.sort = non_empty(options.sort);
	mongo_options.projection = non_empty(options.fields);
	mongo_options
}

fn resolve_write_concern(
	write_option: Option<WriteOption>,
	config: &MongoConfig,
) -> Option<WriteConcern> {
	write_option.or(config.write_option).map(write_concern)
}

fn non_empty(document: Document) -> Option<Document> {
	(!document.is_empty()).then_some(document)
}

async fn insert_one(
	db: Database,
	collection: String,
	mut document: Document,
	write_concern: Option<WriteConcern>,
) -> Result<Option<String>> {
	let generated = assign_id(&mut document);

	let mut options = InsertOneOptions::default();
	options.write_concern = write_concern;

	db.collection::<Document>(&collection)
		.insert_one(document)
		.with_options(options)
		.await?;

	Ok(generated)
}

async fn update(
	db: Database,
	collection: String,
	query: Document,
	update: Document,
	options: UpdateOptions,
	config: Arc<MongoConfig>,
) -> Result<()> {
	let mongo_options = update_options(&options, &config);

	let coll = db.collection::<Document>(&collection);
	let result = match Scope::of_update(&options) {
		Scope::Many => {
			coll.update_many(query, update)
				.with_options(mongo_options)
				.await?
		}
		Scope::One => {
			coll.update_one(query, update)
				.with_options(mongo_options)
				.await?
		}
	};
	tracing::trace!(
		matched = result.matched_count,
		modified = result.modified_count,
		"updated documents"
	);
	Ok(())
}

async fn replace_one(
	db: Database,
	collection: String,
	query: Document,
	replace: Document,
	options: UpdateOptions,
	config: &MongoConfig,
) -> Result<()> {
	db.collection::<Document>(&collection)
		.replace_one(query, replace)
		.with_options(replace_options(&options, config))
		.await?;
	Ok(())
}

async fn find(
	db: Database,
	collection: String,
	query: Document,
	options: FindOptions,
) -> Result<Vec<Document>> {
	let cursor = db
		.collection::<Document>(&collection)
		.find(query)
		.with_options(find_options(options))
		.await?;

	let documents: Vec<Document> = cursor.try_collect().await?;
	Ok(documents)
}

async fn find_one(
	db: Database,
	collection: String,
	query: Document,
	fields: Document,
) -> Result<Option<Document>> {
	let mut options = FindOneOptions::default();
	options.projection = non_empty(fields);

	let document = db
		.collection::<Document>(&collection)
		.find_one(query)
		.with_options(options)
		.await?;
	Ok(document)
}

async fn count(db: Database, collection: String, query: Document) -> Result<u64> {
	let count = db
		.collection::<Document>(&collection)
		.count_documents(query)
		.await?;
	Ok(count)
}

async fn remove(
	db: Database,
	collection: String,
	query: Document,
	write_concern: Option<WriteConcern>,
	scope: Scope,
) -> Result<()> {
	let mut options = DeleteOptions::default();
	options.write_concern = write_concern;

	let coll = db.collection::<Document>(&collection);
	let result = match scope {
		Scope::One => coll.delete_one(query).with_options(options).await?,
		Scope::Many => coll.delete_many(query).with_options(options).await?,
	};
	tracing::trace!(deleted = result.deleted_count, "removed documents");
	Ok(())
}

async fn create_collection(db: Database, collection_name: String) -> Result<()> {
	db.create_collection(&collection_name).await?;
	Ok(())
}

async fn get_collections(db: Database) -> Result<Vec<String>> {
	let names = db.list_collection_names().await?;
	Ok(names)
}

async fn drop_collection(db: Database, collection: String) -> Result<()> {
	db.collection::<Document>(&collection).drop().await?;
	Ok(())
}

async fn run_command(db: Database, command: Document) -> Result<Document> {
	let reply = db.run_command(command).await?;
	Ok(reply)
}

impl DocumentService for MongoDocumentService {
	fn save(&self, collection: String, document: Document, handler: Handler<Option<String>>) {
		self.save_document("save", collection, document, None, handler);
	}

	fn save_with_options(
		&self,
		collection: String,
		document: Document,
		write_option: WriteOption,
		handler: Handler<Option<String>>,
	) {
		self.save_document(
			"saveWithOptions",
			collection,
			document,
			Some(write_option),
			handler,
		);
	}

	fn insert(&self, collection: String, document: Document, handler: Handler<Option<String>>) {
		self.insert_document("insert", collection, document, None, handler);
	}

	fn insert_with_options(
		&self,
		collection: String,
		document: Document,
		write_option: WriteOption,
		handler: Handler<Option<String>>,
	) {
		self.insert_document(
			"insertWithOptions",
			collection,
			document,
			Some(write_option),
			handler,
		);
	}

	fn update(&self, collection: String, query: Document, update: Document, handler: Handler<()>) {
		self.update_with_options(collection, query, update, UpdateOptions::default(), handler);
	}

	fn update_with_options(
		&self,
		collection: String,
		query: Document,
		update: Document,
		options: UpdateOptions,
		handler: Handler<()>,
	) {
		self.execute("update", handler, move |db, config| {
			self::update(db, collection, query, update, options, config)
		});
	}

	fn replace(&self, collection: String, query: Document, replace: Document, handler: Handler<()>) {
		self.replace_with_options(collection, query, replace, UpdateOptions::default(), handler);
	}

	fn replace_with_options(
		&self,
		collection: String,
		query: Document,
		replace: Document,
		options: UpdateOptions,
		handler: Handler<()>,
	) {
		self.execute("replace", handler, move |db, config| async move {
			replace_one(db, collection, query, replace, options, &config).await
		});
	}

	fn find(&self, collection: String, query: Document, handler: Handler<Vec<Document>>) {
		self.find_with_options(collection, query, FindOptions::default(), handler);
	}

	fn find_with_options(
		&self,
		collection: String,
		query: Document,
		options: FindOptions,
		handler: Handler<Vec<Document>>,
	) {
		self.execute("find", handler, move |db, _| {
			self::find(db, collection, query, options)
		});
	}

	fn find_one(
		&self,
		collection: String,
		query: Document,
		fields: Document,
		handler: Handler<Option<Document>>,
	) {
		self.execute("findOne", handler, move |db, _| {
			self::find_one(db, collection, query, fields)
		});
	}

	fn count(&self, collection: String, query: Document, handler: Handler<u64>) {
		self.execute("count", handler, move |db, _| {
			self::count(db, collection, query)
		});
	}

	fn remove(&self, collection: String, query: Document, handler: Handler<()>) {
		self.execute("remove", handler, move |db, config| {
			self::remove(db, collection, query, resolve_write_concern(None, &config), Scope::Many)
		});
	}

	fn remove_with_options(
		&self,
		collection: String,
		query: Document,
		write_option: WriteOption,
		handler: Handler<()>,
	) {
		self.execute("removeWithOptions", handler, move |db, config| {
			let write_concern = resolve_write_concern(Some(write_option), &config);
			self::remove(db, collection, query, write_concern, Scope::Many)
		});
	}

	fn remove_one(&self, collection: String, query: Document, handler: Handler<()>) {
		self.execute("removeOne", handler, move |db, config| {
			self::remove(db, collection, query, resolve_write_concern(None, &config), Scope::One)
		});
	}

	fn remove_one_with_options(
		&self,
		collection: String,
		query: Document,
		write_option: WriteOption,
		handler: Handler<()>,
	) {
		self.execute("removeOneWithOptions", handler, move |db, config| {
			let write_concern = resolve_write_concern(Some(write_option), &config);
			self::remove(db, collection, query, write_concern, Scope::One)
		});
	}

	fn create_collection(&self, collection_name: String, handler: Handler<()>) {
		self.execute("createCollection", handler, move |db, _| {
			self::create_collection(db, collection_name)
		});
	}

	fn get_collections(&self, handler: Handler<Vec<String>>) {
		self.execute("getCollections", handler, move |db, _| self::get_collections(db));
	}

	fn drop_collection(&self, collection: String, handler: Handler<()>) {
		self.execute("dropCollection", handler, move |db, _| {
			self::drop_collection(db, collection)
		});
	}

	fn run_command(&self, command: Document, handler: Handler<Document>) {
		self.execute("runCommand", handler, move |db, _| self::run_command(db, command));
	}

	fn start(&self) {
		let mut client = self.client.lock();
		if client.is_none() {
			tracing::debug!(db_name = %self.config.db_name, "starting MongoDB service");
			*client = Some(Arc::new(OnceCell::new()));
		}
	}

	fn stop(&self) {
		let cell = self.client.lock().take();
		if let Some(cell) = cell {
			tracing::debug!(db_name = %self.config.db_name, "stopping MongoDB service");
			self.shutdown(cell);
		}
	}
}

impl MongoDocumentService {
	// Operations already running keep their own clone of the client.
	fn shutdown(&self, cell: ClientCell) {
		if let Some(client) = cell.get().cloned() {
			self.runtime.spawn(async move {
				client.shutdown().await;
			});
		}
	}
}

impl Drop for MongoDocumentService {
	fn drop(&mut self) {
		if let Some(cell) = self.client.get_mut().take() {
			self.shutdown(cell);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use std::sync::mpsc;

	fn service() -> MongoDocumentService {
		MongoDocumentService::new(Handle::current(), MongoConfig::new().db_name("test_db"))
	}

	#[rstest]
	#[tokio::test]
	async fn test_new_service_is_stopped() {
		let service = service();

		assert!(!service.is_started());
		assert_eq!(service.config().db_name, "test_db");
	}

	#[rstest]
	#[tokio::test]
	async fn test_start_and_stop_toggle_state() {
		// Arrange
		let service = service();

		// Act & Assert
		service.start();
		assert!(service.is_started());
		service.start();
		assert!(service.is_started());
		service.stop();
		assert!(!service.is_started());
		service.stop();
		assert!(!service.is_started());
	}

	#[rstest]
	#[tokio::test]
	async fn test_operation_before_start_fails_with_connection_error() {
		// Arrange
		let service = service();
		let (tx, rx) = mpsc::channel();

		// Act
		service.count(
			"users".to_string(),
			doc! {},
			Box::new(move |result| tx.send(result).unwrap()),
		);

		// Assert
		let result = rx.recv().unwrap();
		assert_eq!(
			result,
			Err(NoSQLError::ConnectionError(
				"MongoDB service is not started".to_string()
			))
		);
	}

	#[rstest]
	#[tokio::test]
	async fn test_operation_after_stop_fails() {
		let service = service();
		service.start();
		service.stop();
		let (tx, rx) = mpsc::channel();

		service.drop_collection(
			"users".to_string(),
			Box::new(move |result| tx.send(result).unwrap()),
		);

		assert!(matches!(
			rx.recv().unwrap(),
			Err(NoSQLError::ConnectionError(_))
		));
	}

	#[rstest]
	fn test_resolve_write_concern_prefers_explicit_option() {
		// Arrange
		let config = MongoConfig::new().write_option(WriteOption::Majority);

		// Act
		let explicit = resolve_write_concern(Some(WriteOption::Unacknowledged), &config);
		let fallback = resolve_write_concern(None, &config);
		let none = resolve_write_concern(None, &MongoConfig::new());

		// Assert
		assert_eq!(explicit, Some(write_concern(WriteOption::Unacknowledged)));
		assert_eq!(fallback, Some(write_concern(WriteOption::Majority)));
		assert_eq!(none, None);
	}

	#[rstest]
	fn test_assign_id_generates_object_id_hex() {
		// Arrange
		let mut document = doc! { "name": "a" };

		// Act
		let id = assign_id(&mut document).unwrap();

		// Assert
		assert!(ObjectId::parse_str(&id).is_ok());
		assert_eq!(document.get_str("_id").unwrap(), id);
		assert_eq!(document.get_str("name").unwrap(), "a");
	}

	#[rstest]
	fn test_assign_id_keeps_existing_id() {
		let mut document = doc! { "_id": "u1", "name": "a" };

		let id = assign_id(&mut document);

		assert_eq!(id, None);
		assert_eq!(document, doc! { "_id": "u1", "name": "a" });
	}

	#[rstest]
	fn test_save_without_id_is_an_insert() {
		let route = save_route(doc! { "name": "a" }, None);

		assert_eq!(route, SaveRoute::Insert(doc! { "name": "a" }));
	}

	#[rstest]
	fn test_save_with_id_is_an_upsert_keyed_on_id() {
		// Act
		let route = save_route(
			doc! { "_id": "u1", "name": "a" },
			Some(WriteOption::Journaled),
		);

		// Assert
		assert_eq!(
			route,
			SaveRoute::Replace {
				filter: doc! { "_id": "u1" },
				document: doc! { "_id": "u1", "name": "a" },
				options: UpdateOptions::new()
					.upsert(true)
					.write_option(WriteOption::Journaled),
			}
		);
	}

	#[rstest]
	#[case(UpdateOptions::new(), Scope::One)]
	#[case(UpdateOptions::new().multi(true), Scope::Many)]
	#[case(UpdateOptions::new().upsert(true), Scope::One)]
	fn test_update_scope_follows_multi(#[case] options: UpdateOptions, #[case] expected: Scope) {
		assert_eq!(Scope::of_update(&options), expected);
	}

	#[rstest]
	fn test_update_options_carry_upsert_and_write_concern() {
		// Arrange
		let config = MongoConfig::new().write_option(WriteOption::Majority);
		let explicit = UpdateOptions::new()
			.upsert(true)
			.write_option(WriteOption::Unacknowledged);

		// Act
		let with_explicit = update_options(&explicit, &config);
		let with_default = update_options(&UpdateOptions::new(), &config);

		// Assert
		assert_eq!(with_explicit.upsert, Some(true));
		assert_eq!(
			with_explicit.write_concern,
			Some(write_concern(WriteOption::Unacknowledged))
		);
		assert_eq!(with_default.upsert, Some(false));
		assert_eq!(
			with_default.write_concern,
			Some(write_concern(WriteOption::Majority))
		);
	}

	#[rstest]
	fn test_replace_options_carry_upsert() {
		let options = replace_options(&UpdateOptions::new().upsert(true), &MongoConfig::new());

		assert_eq!(options.upsert, Some(true));
		assert_eq!(options.write_concern, None);
	}

	#[rstest]
	fn test_find_options_mapping() {
		// Arrange
		let options = FindOptions::new()
			.fields(doc! { "name": 1 })
			.limit(10)
			.skip(5);

		// Act
		let mapped = find_options(options);

		// Assert
		assert_eq!(mapped.projection, Some(doc! { "name": 1 }));
		assert_eq!(mapped.sort, None);
		assert_eq!(mapped.limit, Some(10));
		assert_eq!(mapped.skip, Some(5));
	}

	#[rstest]
	fn test_find_options_negative_limit_means_no_limit() {
		let mapped = find_options(FindOptions::new().sort(doc! { "age": -1 }).limit(-1));

		assert_eq!(mapped.limit, None);
		assert_eq!(mapped.skip, None);
		assert_eq!(mapped.sort, Some(doc! { "age": -1 }));
		assert_eq!(mapped.projection, None);
	}

	#[rstest]
	fn test_non_empty_drops_empty_documents() {
		assert_eq!(non_empty(doc! {}), None);
		assert_eq!(non_empty(doc! { "a": 1 }), Some(doc! { "a": 1 }));
	}
}
