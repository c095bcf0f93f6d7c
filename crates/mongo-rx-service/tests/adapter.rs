//! Behaviour of the stream and callback forms against a scripted delegate

use std::sync::Arc;
use std::sync::mpsc;

use bson::doc;
use futures::StreamExt;
use futures::stream::FusedStream;
use mongo_rx_core::{FindOptions, Invocation, NoSQLError, Outcome, UpdateOptions, WriteOption};
use mongo_rx_service::MongoService;
use mongo_rx_test::{Delivery, RecordingService, recording_service};
use rstest::*;

fn service_over(stub: &Arc<RecordingService>) -> MongoService {
	MongoService::new(stub.clone())
}

#[rstest]
#[tokio::test]
async fn test_insert_stream_emits_id_then_completes(recording_service: Arc<RecordingService>) {
	// Arrange
	recording_service.succeed_with(Outcome::Id(Some("123".to_string())));
	let service = service_over(&recording_service);

	// Act
	let events: Vec<_> = service
		.insert_stream("users", doc! { "name": "a" })
		.collect()
		.await;

	// Assert
	assert_eq!(events, vec![Ok("123".to_string())]);
	assert_eq!(
		recording_service.calls(),
		vec![Invocation::Insert {
			collection: "users".to_string(),
			document: doc! { "name": "a" },
			write_option: None,
		}]
	);
}

#[rstest]
#[tokio::test]
async fn test_count_stream_yields_only_the_failure(recording_service: Arc<RecordingService>) {
	// Arrange
	recording_service.fail_with(NoSQLError::Timeout("timeout".to_string()));
	let service = service_over(&recording_service);

	// Act
	let events: Vec<_> = service.count_stream("users", doc! {}).collect().await;

	// Assert
	assert_eq!(
		events,
		vec![Err(NoSQLError::Timeout("timeout".to_string()))]
	);
}

#[rstest]
#[tokio::test]
async fn test_remove_stream_completes_without_values(recording_service: Arc<RecordingService>) {
	// Arrange
	let service = service_over(&recording_service);

	// Act
	let events: Vec<_> = service
		.remove_stream("users", doc! { "name": "a" })
		.collect()
		.await;

	// Assert
	assert!(events.is_empty());
	assert_eq!(
		recording_service.calls(),
		vec![Invocation::Remove {
			collection: "users".to_string(),
			query: doc! { "name": "a" },
			write_option: None,
		}]
	);
}

#[rstest]
#[tokio::test]
async fn test_streams_are_cold(recording_service: Arc<RecordingService>) {
	// Arrange
	let service = service_over(&recording_service);

	// Act
	let insert = service.insert_stream("users", doc! { "name": "a" });
	let find = service.find_stream("users", doc! {});
	let drop_collection = service.drop_collection_stream("users");

	// Assert
	assert_eq!(recording_service.call_count(), 0);
	assert!(!insert.is_activated());
	drop((insert, find, drop_collection));
	assert_eq!(recording_service.call_count(), 0);
}

#[rstest]
#[tokio::test]
async fn test_each_stream_form_call_is_independent(recording_service: Arc<RecordingService>) {
	// Arrange
	recording_service.succeed_with(Outcome::Count(1));
	recording_service.succeed_with(Outcome::Count(2));
	let service = service_over(&recording_service);

	// Act
	let first = service.count_stream("users", doc! {}).into_value().await;
	let second = service.count_stream("users", doc! {}).into_value().await;

	// Assert
	assert_eq!(first, Ok(Some(1)));
	assert_eq!(second, Ok(Some(2)));
	assert_eq!(recording_service.call_count(), 2);
}

#[rstest]
#[tokio::test]
async fn test_stream_is_fused_after_terminal_event(recording_service: Arc<RecordingService>) {
	let service = service_over(&recording_service);
	let mut stream = service.get_collections_stream();

	assert_eq!(stream.next().await, Some(Ok(Vec::new())));
	assert!(stream.is_terminated());
	assert_eq!(stream.next().await, None);
	assert_eq!(recording_service.call_count(), 1);
}

#[rstest]
fn test_callback_forms_chain(recording_service: Arc<RecordingService>) {
	// Arrange
	let service = service_over(&recording_service);
	let (tx, rx) = mpsc::channel();
	let save_tx = tx.clone();

	// Act
	service
		.save("users", doc! { "name": "a" }, move |result| {
			save_tx.send(("save", result)).unwrap();
		})
		.insert("users", doc! { "name": "b" }, move |result| {
			tx.send(("insert", result)).unwrap();
		});

	// Assert
	let replies: Vec<_> = rx.iter().collect();
	assert_eq!(replies, vec![("save", Ok(None)), ("insert", Ok(None))]);
	let actions: Vec<_> = recording_service
		.calls()
		.iter()
		.map(Invocation::action)
		.collect();
	assert_eq!(actions, vec!["save", "insert"]);
}

#[rstest]
#[tokio::test]
async fn test_handler_fired_from_another_thread_resolves_the_stream() {
	// Arrange
	let stub = Arc::new(RecordingService::with_delivery(Delivery::Thread));
	stub.succeed_with(Outcome::Command(doc! { "ok": 1, "n": 3 }));
	let service = service_over(&stub);

	// Act
	let reply = service
		.run_command_stream(doc! { "ping": 1 })
		.into_value()
		.await;

	// Assert
	assert_eq!(reply, Ok(Some(doc! { "ok": 1, "n": 3 })));
}

#[rstest]
#[tokio::test]
async fn test_dropped_handler_completes_empty() {
	let stub = Arc::new(RecordingService::with_delivery(Delivery::Drop));
	let service = service_over(&stub);

	let events: Vec<_> = service.count_stream("users", doc! {}).collect().await;

	assert!(events.is_empty());
	assert_eq!(stub.call_count(), 1);
}

#[rstest]
#[tokio::test]
async fn test_find_one_stream_handles_present_and_absent_documents(
	recording_service: Arc<RecordingService>,
) {
	// Arrange
	recording_service.succeed_with(Outcome::Document(Some(doc! { "name": "a" })));
	recording_service.succeed_with(Outcome::Document(None));
	let service = service_over(&recording_service);

	// Act
	let found = service
		.find_one_stream("users", doc! { "name": "a" }, doc! { "name": 1 })
		.into_value()
		.await;
	let missing = service
		.find_one_stream("users", doc! { "name": "z" }, doc! {})
		.into_value()
		.await;

	// Assert
	assert_eq!(found, Ok(Some(doc! { "name": "a" })));
	assert_eq!(missing, Ok(None));
	assert_eq!(
		recording_service.calls()[0],
		Invocation::FindOne {
			collection: "users".to_string(),
			query: doc! { "name": "a" },
			fields: doc! { "name": 1 },
		}
	);
}

#[rstest]
#[tokio::test]
async fn test_find_stream_emits_the_whole_list_once(recording_service: Arc<RecordingService>) {
	// Arrange
	let documents = vec![doc! { "n": 1 }, doc! { "n": 2 }, doc! { "n": 3 }];
	recording_service.succeed_with(Outcome::Documents(documents.clone()));
	let service = service_over(&recording_service);
	let options = FindOptions::new().skip(1).limit(3);

	// Act
	let events: Vec<_> = service
		.find_with_options_stream("items", doc! {}, options.clone())
		.collect()
		.await;

	// Assert
	assert_eq!(events, vec![Ok(documents)]);
	assert_eq!(
		recording_service.last_call(),
		Some(Invocation::Find {
			collection: "items".to_string(),
			query: doc! {},
			options: Some(options),
		})
	);
}

#[rstest]
#[tokio::test]
async fn test_write_operations_forward_their_options(recording_service: Arc<RecordingService>) {
	// Arrange
	let service = service_over(&recording_service);
	let options = UpdateOptions::new().upsert(true).multi(true);

	// Act
	service
		.save_with_options_stream("users", doc! { "_id": "u1" }, WriteOption::Journaled)
		.into_value()
		.await
		.unwrap();
	service
		.insert_with_options_stream("users", doc! { "name": "b" }, WriteOption::Unacknowledged)
		.into_value()
		.await
		.unwrap();
	service
		.update_with_options_stream(
			"users",
			doc! {},
			doc! { "$set": { "active": true } },
			options.clone(),
		)
		.into_completion()
		.await
		.unwrap();
	service
		.replace_with_options_stream("users", doc! { "_id": "u1" }, doc! { "name": "c" }, options.clone())
		.into_completion()
		.await
		.unwrap();
	service
		.remove_with_options_stream("users", doc! { "name": "c" }, WriteOption::Majority)
		.into_completion()
		.await
		.unwrap();
	service
		.remove_one_with_options_stream("users", doc! { "name": "b" }, WriteOption::Fsynced)
		.into_completion()
		.await
		.unwrap();

	// Assert
	let actions: Vec<_> = recording_service
		.calls()
		.iter()
		.map(Invocation::action)
		.collect();
	assert_eq!(
		actions,
		vec![
			"saveWithOptions",
			"insertWithOptions",
			"updateWithOptions",
			"replaceWithOptions",
			"removeWithOptions",
			"removeOneWithOptions",
		]
	);
	assert_eq!(
		recording_service.calls()[2],
		Invocation::Update {
			collection: "users".to_string(),
			query: doc! {},
			update: doc! { "$set": { "active": true } },
			options: Some(options),
		}
	);
}

#[rstest]
#[tokio::test]
async fn test_void_operations_complete_without_values(recording_service: Arc<RecordingService>) {
	// Arrange
	let service = service_over(&recording_service);

	// Act
	let results = vec![
		service
			.update_stream("users", doc! {}, doc! { "$inc": { "n": 1 } })
			.into_completion()
			.await,
		service
			.replace_stream("users", doc! {}, doc! { "n": 0 })
			.into_completion()
			.await,
		service
			.remove_one_stream("users", doc! {})
			.into_completion()
			.await,
		service
			.create_collection_stream("logs")
			.into_completion()
			.await,
		service
			.drop_collection_stream("logs")
			.into_completion()
			.await,
	];

	// Assert
	assert!(results.iter().all(Result::is_ok));
	let actions: Vec<_> = recording_service
		.calls()
		.iter()
		.map(Invocation::action)
		.collect();
	assert_eq!(
		actions,
		vec![
			"update",
			"replace",
			"removeOne",
			"createCollection",
			"dropCollection"
		]
	);
}

#[rstest]
#[tokio::test]
async fn test_void_operation_failure_is_forwarded(recording_service: Arc<RecordingService>) {
	recording_service.fail_with(NoSQLError::PermissionDenied("read-only".to_string()));
	let service = service_over(&recording_service);

	let result = service.drop_collection_stream("users").into_completion().await;

	assert_eq!(
		result,
		Err(NoSQLError::PermissionDenied("read-only".to_string()))
	);
}

#[rstest]
#[tokio::test]
async fn test_save_stream_completes_empty_without_generated_id(
	recording_service: Arc<RecordingService>,
) {
	let service = service_over(&recording_service);

	let events: Vec<_> = service
		.save_stream("users", doc! { "_id": "u1", "name": "a" })
		.collect()
		.await;

	assert!(events.is_empty());
	assert_eq!(recording_service.call_count(), 1);
}

#[rstest]
#[tokio::test]
async fn test_get_collections_stream_emits_names(recording_service: Arc<RecordingService>) {
	recording_service.succeed_with(Outcome::Names(vec![
		"logs".to_string(),
		"users".to_string(),
	]));
	let service = service_over(&recording_service);

	let names = service.get_collections_stream().into_value().await;

	assert_eq!(
		names,
		Ok(Some(vec!["logs".to_string(), "users".to_string()]))
	);
}
