//! Value types passed through the document service
//!
//! These types are opaque to the stream adapter; only delegates interpret them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::NoSQLError;

pub use bson::Document;

/// Acknowledgment and durability level requested for a write
///
/// Parses from and displays as the upper-case names used in JSON configs
/// (`"ACKNOWLEDGED"`, `"REPLICA_ACKNOWLEDGED"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WriteOption {
	/// The primary acknowledged the write
	#[default]
	Acknowledged,
	/// Fire and forget
	Unacknowledged,
	/// The write was flushed to disk
	Fsynced,
	/// The write was committed to the journal
	Journaled,
	/// At least two members acknowledged the write
	ReplicaAcknowledged,
	/// A majority of voting members acknowledged the write
	Majority,
}

impl WriteOption {
	/// All write options, in declaration order
	pub const ALL: [WriteOption; 6] = [
		WriteOption::Acknowledged,
		WriteOption::Unacknowledged,
		WriteOption::Fsynced,
		WriteOption::Journaled,
		WriteOption::ReplicaAcknowledged,
		WriteOption::Majority,
	];

	/// Returns the configuration name of this option
	pub fn as_str(&self) -> &'static str {
		match self {
			WriteOption::Acknowledged => "ACKNOWLEDGED",
			WriteOption::Unacknowledged => "UNACKNOWLEDGED",
			WriteOption::Fsynced => "FSYNCED",
			WriteOption::Journaled => "JOURNALED",
			WriteOption::ReplicaAcknowledged => "REPLICA_ACKNOWLEDGED",
			WriteOption::Majority => "MAJORITY",
		}
	}
}

impl fmt::Display for WriteOption {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for WriteOption {
	type Err = NoSQLError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		WriteOption::ALL
			.into_iter()
			.find(|option| option.as_str().eq_ignore_ascii_case(s))
			.ok_or_else(|| NoSQLError::ConfigError(format!("unknown write option: {}", s)))
	}
}

/// Options for update and replace operations
///
/// # Example
///
/// ```rust
/// use mongo_rx_core::{UpdateOptions, WriteOption};
///
/// let options = UpdateOptions::new()
///     .upsert(true)
///     .write_option(WriteOption::Majority);
/// assert!(options.upsert);
/// assert!(!options.multi);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateOptions {
	/// Write option for this update; the service default applies when `None`
	pub write_option: Option<WriteOption>,
	/// Insert a new document when nothing matches the query
	pub upsert: bool,
	/// Update every matching document instead of the first one
	pub multi: bool,
}

impl UpdateOptions {
	/// Options with no upsert, no multi and the service write option
	pub fn new() -> Self {
		Self::default()
	}

	/// Overrides the write option for this update
	pub fn write_option(mut self, write_option: WriteOption) -> Self {
		self.write_option = Some(write_option);
		self
	}

	/// Sets whether an unmatched query inserts a new document
	pub fn upsert(mut self, upsert: bool) -> Self {
		self.upsert = upsert;
		self
	}

	/// Sets whether every match is updated
	pub fn multi(mut self, multi: bool) -> Self {
		self.multi = multi;
		self
	}
}

/// Options for find operations
///
/// `limit` uses `-1` for "no limit", matching the service's JSON form.
#[derive(Debug, Clone, PartialEq)]
pub struct FindOptions {
	/// Projection of the returned fields; empty returns whole documents
	pub fields: Document,
	/// Sort specification; empty keeps natural order
	pub sort: Document,
	/// Maximum number of documents, or `-1` for no limit
	pub limit: i64,
	/// Number of documents to skip
	pub skip: i64,
}

impl Default for FindOptions {
	fn default() -> Self {
		Self {
			fields: Document::new(),
			sort: Document::new(),
			limit: -1,
			skip: 0,
		}
	}
}

impl FindOptions {
	/// Whole documents in natural order, unlimited
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the field projection
	pub fn fields(mut self, fields: Document) -> Self {
		self.fields = fields;
		self
	}

	/// Sets the sort specification
	pub fn sort(mut self, sort: Document) -> Self {
		self.sort = sort;
		self
	}

	/// Sets the limit; negative means no limit
	pub fn limit(mut self, limit: i64) -> Self {
		self.limit = limit;
		self
	}

	/// Sets how many documents to skip
	pub fn skip(mut self, skip: i64) -> Self {
		self.skip = skip;
		self
	}

	/// Returns the limit, or `None` when no limit applies
	pub fn effective_limit(&self) -> Option<i64> {
		(self.limit >= 0).then_some(self.limit)
	}

	/// Returns the skip count, or `None` when nothing is skipped
	pub fn effective_skip(&self) -> Option<u64> {
		(self.skip > 0).then_some(self.skip as u64)
	}
}
