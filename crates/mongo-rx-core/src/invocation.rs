//! Operations as data
//!
//! An [`Invocation`] is one call of a [`DocumentService`] operation with owned
//! arguments; an [`Outcome`] is its untyped success value. They let an
//! operation cross a channel (event bus proxies) or be recorded (test stubs)
//! and later be applied to a concrete service.

use crate::error::{NoSQLError, Result};
use crate::service::{DocumentService, Handler};
use crate::types::{Document, FindOptions, UpdateOptions, WriteOption};

/// A single document service operation and its arguments
#[derive(Debug, Clone, PartialEq)]
pub enum Invocation {
	Save {
		collection: String,
		document: Document,
		write_option: Option<WriteOption>,
	},
	Insert {
		collection: String,
		document: Document,
		write_option: Option<WriteOption>,
	},
	Update {
		collection: String,
		query: Document,
		update: Document,
		options: Option<UpdateOptions>,
	},
	Replace {
		collection: String,
		query: Document,
		replace: Document,
		options: Option<UpdateOptions>,
	},
	Find {
		collection: String,
		query: Document,
		options: Option<FindOptions>,
	},
	FindOne {
		collection: String,
		query: Document,
		fields: Document,
	},
	Count {
		collection: String,
		query: Document,
	},
	Remove {
		collection: String,
		query: Document,
		write_option: Option<WriteOption>,
	},
	RemoveOne {
		collection: String,
		query: Document,
		write_option: Option<WriteOption>,
	},
	CreateCollection {
		collection_name: String,
	},
	GetCollections,
	DropCollection {
		collection: String,
	},
	RunCommand {
		command: Document,
	},
}

impl Invocation {
	/// Returns the action name used in logs and event bus headers
	pub fn action(&self) -> &'static str {
		match self {
			Invocation::Save { write_option: None, .. } => "save",
			Invocation::Save { .. } => "saveWithOptions",
			Invocation::Insert { write_option: None, .. } => "insert",
			Invocation::Insert { .. } => "insertWithOptions",
			Invocation::Update { options: None, .. } => "update",
			Invocation::Update { .. } => "updateWithOptions",
			Invocation::Replace { options: None, .. } => "replace",
			Invocation::Replace { .. } => "replaceWithOptions",
			Invocation::Find { options: None, .. } => "find",
			Invocation::Find { .. } => "findWithOptions",
			Invocation::FindOne { .. } => "findOne",
			Invocation::Count { .. } => "count",
			Invocation::Remove { write_option: None, .. } => "remove",
			Invocation::Remove { .. } => "removeWithOptions",
			Invocation::RemoveOne { write_option: None, .. } => "removeOne",
			Invocation::RemoveOne { .. } => "removeOneWithOptions",
			Invocation::CreateCollection { .. } => "createCollection",
			Invocation::GetCollections => "getCollections",
			Invocation::DropCollection { .. } => "dropCollection",
			Invocation::RunCommand { .. } => "runCommand",
		}
	}

	/// Applies this invocation to `service`, reporting through `handler`
	///
	/// The typed result of the operation is wrapped in the matching
	/// [`Outcome`] variant.
	pub fn apply(self, service: &dyn DocumentService, handler: Handler<Outcome>) {
		match self {
			Invocation::Save {
				collection,
				document,
				write_option,
			} => {
				let handler = wrap(handler, Outcome::Id);
				match write_option {
					Some(write_option) => {
						service.save_with_options(collection, document, write_option, handler)
					}
					None => service.save(collection, document, handler),
				}
			}
			Invocation::Insert {
				collection,
				document,
				write_option,
			} => {
				let handler = wrap(handler, Outcome::Id);
				match write_option {
					Some(write_option) => {
						service.insert_with_options(collection, document, write_option, handler)
					}
					None => service.insert(collection, document, handler),
				}
			}
			Invocation::Update {
				collection,
				query,
				update,
				options,
			} => {
				let handler = wrap(handler, |()| Outcome::Done);
				match options {
					Some(options) => {
						service.update_with_options(collection, query, update, options, handler)
					}
					None => service.update(collection, query, update, handler),
				}
			}
			Invocation::Replace {
				collection,
				query,
				replace,
				options,
			} => {
				let handler = wrap(handler, |()| Outcome::Done);
				match options {
					Some(options) => {
						service.replace_with_options(collection, query, replace, options, handler)
					}
					None => service.replace(collection, query, replace, handler),
				}
			}
			Invocation::Find {
				collection,
				query,
				options,
			} => {
				let handler = wrap(handler, Outcome::Documents);
				match options {
					Some(options) => service.find_with_options(collection, query, options, handler),
					None => service.find(collection, query, handler),
				}
			}
			Invocation::FindOne {
				collection,
				query,
				fields,
			} => service.find_one(collection, query, fields, wrap(handler, Outcome::Document)),
			Invocation::Count { collection, query } => {
				service.count(collection, query, wrap(handler, Outcome::Count))
			}
			Invocation::Remove {
				collection,
				query,
				write_option,
			} => {
				let handler = wrap(handler, |()| Outcome::Done);
				match write_option {
					Some(write_option) => {
						service.remove_with_options(collection, query, write_option, handler)
					}
					None => service.remove(collection, query, handler),
				}
			}
			Invocation::RemoveOne {
				collection,
				query,
				write_option,
			} => {
				let handler = wrap(handler, |()| Outcome::Done);
				match write_option {
					Some(write_option) => {
						service.remove_one_with_options(collection, query, write_option, handler)
					}
					None => service.remove_one(collection, query, handler),
				}
			}
			Invocation::CreateCollection { collection_name } => {
				service.create_collection(collection_name, wrap(handler, |()| Outcome::Done))
			}
			Invocation::GetCollections => service.get_collections(wrap(handler, Outcome::Names)),
			Invocation::DropCollection { collection } => {
				service.drop_collection(collection, wrap(handler, |()| Outcome::Done))
			}
			Invocation::RunCommand { command } => {
				service.run_command(command, wrap(handler, Outcome::Command))
			}
		}
	}
}

fn wrap<T: Send + 'static>(handler: Handler<Outcome>, into: fn(T) -> Outcome) -> Handler<T> {
	Box::new(move |result: Result<T>| handler(result.map(into)))
}

/// Untyped success value of an [`Invocation`]
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
	/// Generated id of a save or insert, if any
	Id(Option<String>),
	/// Completion of an operation without a result
	Done,
	/// Documents returned by a find
	Documents(Vec<Document>),
	/// Document returned by a find one, if any
	Document(Option<Document>),
	/// Reply of a database command
	Command(Document),
	/// Number of matching documents
	Count(u64),
	/// Collection names
	Names(Vec<String>),
}

impl Outcome {
	/// Returns the variant name, for diagnostics
	pub fn kind(&self) -> &'static str {
		match self {
			Outcome::Id(_) => "id",
			Outcome::Done => "done",
			Outcome::Documents(_) => "documents",
			Outcome::Document(_) => "document",
			Outcome::Command(_) => "command",
			Outcome::Count(_) => "count",
			Outcome::Names(_) => "names",
		}
	}

	pub fn into_id(self) -> Result<Option<String>> {
		match self {
			Outcome::Id(id) => Ok(id),
			other => Err(mismatch("id", &other)),
		}
	}

	pub fn into_done(self) -> Result<()> {
		match self {
			Outcome::Done => Ok(()),
			other => Err(mismatch("done", &other)),
		}
	}

	pub fn into_documents(self) -> Result<Vec<Document>> {
		match self {
			Outcome::Documents(documents) => Ok(documents),
			other => Err(mismatch("documents", &other)),
		}
	}

	pub fn into_document(self) -> Result<Option<Document>> {
		match self {
			Outcome::Document(document) => Ok(document),
			other => Err(mismatch("document", &other)),
		}
	}

	pub fn into_command(self) -> Result<Document> {
		match self {
			Outcome::Command(reply) => Ok(reply),
			other => Err(mismatch("command", &other)),
		}
	}

	pub fn into_count(self) -> Result<u64> {
		match self {
			Outcome::Count(count) => Ok(count),
			other => Err(mismatch("count", &other)),
		}
	}

	pub fn into_names(self) -> Result<Vec<String>> {
		match self {
			Outcome::Names(names) => Ok(names),
			other => Err(mismatch("names", &other)),
		}
	}
}

fn mismatch(expected: &str, actual: &Outcome) -> NoSQLError {
	NoSQLError::ExecutionError(format!(
		"expected a {} reply, got {}",
		expected,
		actual.kind()
	))
}

#[cfg(test)]
mod tests {
	use super::*;
	use bson::doc;
	use rstest::rstest;

	#[rstest]
	#[case(
		Invocation::Save { collection: "c".into(), document: doc! {}, write_option: None },
		"save"
	)]
	#[case(
		Invocation::Save {
			collection: "c".into(),
			document: doc! {},
			write_option: Some(WriteOption::Majority),
		},
		"saveWithOptions"
	)]
	#[case(
		Invocation::Find {
			collection: "c".into(),
			query: doc! {},
			options: Some(FindOptions::default()),
		},
		"findWithOptions"
	)]
	#[case(Invocation::GetCollections, "getCollections")]
	fn test_action_names(#[case] invocation: Invocation, #[case] expected: &str) {
		assert_eq!(invocation.action(), expected);
	}

	#[rstest]
	fn test_outcome_extraction() {
		assert_eq!(Outcome::Count(4).into_count().unwrap(), 4);
		assert_eq!(
			Outcome::Id(Some("abc".into())).into_id().unwrap(),
			Some("abc".to_string())
		);
		assert!(Outcome::Done.into_done().is_ok());
	}

	#[rstest]
	fn test_outcome_shape_mismatch_is_execution_error() {
		// Act
		let result = Outcome::Done.into_count();

		// Assert
		assert_eq!(
			result,
			Err(NoSQLError::ExecutionError(
				"expected a count reply, got done".to_string()
			))
		);
	}
}
