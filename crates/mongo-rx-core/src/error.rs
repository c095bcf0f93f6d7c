//! Document service error types
//!
//! This module provides the single error type shared by delegates, proxies
//! and the stream adapter. The adapter never creates errors of its own: it
//! forwards whatever the delegate reported.

/// Result type for document service operations
pub type Result<T> = std::result::Result<T, NoSQLError>;

/// Unified error type for document service operations
///
/// The type is `Clone + PartialEq` so a failure observed through the
/// callback form can be compared with the one observed through the stream
/// form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NoSQLError {
	/// Connection error
	#[error("Connection error: {0}")]
	ConnectionError(String),

	/// Query/operation execution error
	#[error("Execution error: {0}")]
	ExecutionError(String),

	/// Document/data not found
	#[error("Not found: {0}")]
	NotFound(String),

	/// Serialization/deserialization error
	#[error("Serialization error: {0}")]
	SerializationError(String),

	/// Invalid operation for the current service
	#[error("Invalid operation: {0}")]
	InvalidOperation(String),

	/// Configuration error
	#[error("Configuration error: {0}")]
	ConfigError(String),

	/// Timeout error
	#[error("Timeout: {0}")]
	Timeout(String),

	/// Authentication error
	#[error("Authentication error: {0}")]
	AuthenticationError(String),

	/// Permission denied error
	#[error("Permission denied: {0}")]
	PermissionDenied(String),

	/// Database-specific error (contains the original error message)
	#[error("Database error: {0}")]
	DatabaseError(String),

	/// Feature not supported by this service
	#[error("Unsupported feature: {0}")]
	UnsupportedFeature(String),

	/// Nothing is registered on the event bus address
	#[error("No handlers for address: {0}")]
	NoHandlers(String),
}

impl From<serde_json::Error> for NoSQLError {
	fn from(err: serde_json::Error) -> Self {
		NoSQLError::SerializationError(err.to_string())
	}
}

// In bson v3.x, both ser::Error and de::Error are type aliases for bson::error::Error
impl From<bson::error::Error> for NoSQLError {
	fn from(err: bson::error::Error) -> Self {
		NoSQLError::SerializationError(err.to_string())
	}
}

#[cfg(feature = "mongodb")]
impl From<mongodb::error::Error> for NoSQLError {
	fn from(err: mongodb::error::Error) -> Self {
		use mongodb::error::ErrorKind;

		match *err.kind {
			ErrorKind::Authentication { .. } => NoSQLError::AuthenticationError(err.to_string()),
			ErrorKind::InvalidArgument { .. } => NoSQLError::InvalidOperation(err.to_string()),
			ErrorKind::Io(_) => NoSQLError::ConnectionError(err.to_string()),
			ErrorKind::ServerSelection { .. } => NoSQLError::Timeout(err.to_string()),
			_ => NoSQLError::DatabaseError(err.to_string()),
		}
	}
}
