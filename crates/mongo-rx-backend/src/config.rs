//! MongoDB service configuration
//!
//! A [`MongoConfig`] is usually parsed from the JSON config document handed
//! to `MongoService::create`, but it can also be assembled with the fluent
//! setters.
//!
//! # Example
//!
//! ```rust
//! use mongo_rx_backend::MongoConfig;
//! use serde_json::json;
//!
//! let config = MongoConfig::from_json(&json!({
//!     "host": "db.internal",
//!     "port": 27018,
//!     "db_name": "app",
//!     "max_pool_size": 50
//! }))
//! .unwrap();
//!
//! assert_eq!(config.host, "db.internal");
//! assert_eq!(config.max_pool_size, Some(50));
//! ```

use std::time::Duration;

use mongo_rx_core::{NoSQLError, Result, WriteOption};
use mongodb::Client;
use mongodb::options::{ClientOptions, Credential, ServerAddress};
use serde::{Deserialize, Serialize};

use crate::write_concern::write_concern;

/// Connection settings for [`MongoDocumentService`](crate::MongoDocumentService)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MongoConfig {
	/// Full connection string; takes precedence over `host` and `port`
	pub connection_string: Option<String>,
	pub host: String,
	pub port: u16,
	/// Database every operation runs against
	pub db_name: String,
	pub username: Option<String>,
	pub password: Option<String>,
	/// Database holding the user's credentials
	pub auth_source: Option<String>,
	pub max_pool_size: Option<u32>,
	pub min_pool_size: Option<u32>,
	pub max_idle_time_ms: Option<u64>,
	pub connect_timeout_ms: Option<u64>,
	pub server_selection_timeout_ms: Option<u64>,
	/// Default write option for writes issued without one
	pub write_option: Option<WriteOption>,
}

impl Default for MongoConfig {
	fn default() -> Self {
		Self {
			connection_string: None,
			host: "localhost".to_string(),
			port: 27017,
			db_name: "default_db".to_string(),
			username: None,
			password: None,
			auth_source: None,
			max_pool_size: None,
			min_pool_size: None,
			max_idle_time_ms: None,
			connect_timeout_ms: None,
			server_selection_timeout_ms: None,
			write_option: None,
		}
	}
}

impl MongoConfig {
	/// Create a configuration with default settings
	///
	/// # Example
	///
	/// ```rust
	/// # use mongo_rx_backend::MongoConfig;
	/// let config = MongoConfig::new();
	/// assert_eq!(config.port, 27017);
	/// ```
	pub fn new() -> Self {
		Self::default()
	}

	/// Parse and validate a configuration from a JSON config document
	///
	/// Missing keys take their default values.
	pub fn from_json(value: &serde_json::Value) -> Result<Self> {
		let config: MongoConfig = serde_json::from_value(value.clone())
			.map_err(|e| NoSQLError::ConfigError(e.to_string()))?;
		config.validate()?;
		Ok(config)
	}

	/// Set the connection string
	pub fn connection_string(mut self, connection_string: impl Into<String>) -> Self {
		self.connection_string = Some(connection_string.into());
		self
	}

	/// Set the host
	pub fn host(mut self, host: impl Into<String>) -> Self {
		self.host = host.into();
		self
	}

	/// Set the port
	pub fn port(mut self, port: u16) -> Self {
		self.port = port;
		self
	}

	/// Set the database name
	///
	/// # Example
	///
	/// ```rust
	/// # use mongo_rx_backend::MongoConfig;
	/// let config = MongoConfig::new().db_name("mydb");
	/// assert_eq!(config.db_name, "mydb");
	/// ```
	pub fn db_name(mut self, db_name: impl Into<String>) -> Self {
		self.db_name = db_name.into();
		self
	}

	/// Set username and password
	pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
		self.username = Some(username.into());
		self.password = Some(password.into());
		self
	}

	/// Set the authentication database
	pub fn auth_source(mut self, auth_source: impl Into<String>) -> Self {
		self.auth_source = Some(auth_source.into());
		self
	}

	/// Set the maximum connection pool size
	pub fn max_pool_size(mut self, size: u32) -> Self {
		self.max_pool_size = Some(size);
		self
	}

	/// Set the minimum connection pool size
	pub fn min_pool_size(mut self, size: u32) -> Self {
		self.min_pool_size = Some(size);
		self
	}

	/// Set the maximum idle time for pooled connections in milliseconds
	pub fn max_idle_time_ms(mut self, ms: u64) -> Self {
		self.max_idle_time_ms = Some(ms);
		self
	}

	/// Set the connect timeout in milliseconds
	pub fn connect_timeout_ms(mut self, ms: u64) -> Self {
		self.connect_timeout_ms = Some(ms);
		self
	}

	/// Set the server selection timeout in milliseconds
	pub fn server_selection_timeout_ms(mut self, ms: u64) -> Self {
		self.server_selection_timeout_ms = Some(ms);
		self
	}

	/// Set the default write option
	pub fn write_option(mut self, write_option: WriteOption) -> Self {
		self.write_option = Some(write_option);
		self
	}

	/// Check the configuration for contradictory settings
	pub fn validate(&self) -> Result<()> {
		if self.connection_string.is_none() && self.port == 0 {
			return Err(NoSQLError::ConfigError("port must not be 0".to_string()));
		}
		if self.db_name.is_empty() {
			return Err(NoSQLError::ConfigError("db_name must not be empty".to_string()));
		}
		if let (Some(min), Some(max)) = (self.min_pool_size, self.max_pool_size)
			&& min > max
		{
			return Err(NoSQLError::ConfigError(format!(
				"min_pool_size ({}) exceeds max_pool_size ({})",
				min, max
			)));
		}
		if self.password.is_some() && self.username.is_none() {
			return Err(NoSQLError::ConfigError(
				"password given without username".to_string(),
			));
		}
		Ok(())
	}

	/// Build driver client options from this configuration
	pub async fn client_options(&self) -> Result<ClientOptions> {
		self.validate()?;

		let mut options = match &self.connection_string {
			Some(uri) => ClientOptions::parse(uri)
				.await
				.map_err(|e| NoSQLError::ConnectionError(e.to_string()))?,
			None => ClientOptions::builder()
				.hosts(vec![ServerAddress::Tcp {
					host: self.host.clone(),
					port: Some(self.port),
				}])
				.build(),
		};

		// Configure connection pool
		if let Some(max_size) = self.max_pool_size {
			options.max_pool_size = Some(max_size);
		}

		if let Some(min_size) = self.min_pool_size {
			options.min_pool_size = Some(min_size);
		}

		if let Some(idle_time) = self.max_idle_time_ms {
			options.max_idle_time = Some(Duration::from_millis(idle_time));
		}

		if let Some(timeout) = self.connect_timeout_ms {
			options.connect_timeout = Some(Duration::from_millis(timeout));
		}

		if let Some(timeout) = self.server_selection_timeout_ms {
			options.server_selection_timeout = Some(Duration::from_millis(timeout));
		}

		if let Some(username) = &self.username {
			options.credential = Some(
				Credential::builder()
					.username(username.clone())
					.password(self.password.clone())
					.source(self.auth_source.clone())
					.build(),
			);
		}

		if let Some(write_option) = self.write_option {
			options.write_concern = Some(write_concern(write_option));
		}

		Ok(options)
	}

	/// Create a driver client
	///
	/// The driver connects lazily; no I/O happens until the first operation.
	pub async fn connect(&self) -> Result<Client> {
		let options = self.client_options().await?;
		tracing::debug!(db_name = %self.db_name, "creating MongoDB client");
		Client::with_options(options).map_err(|e| NoSQLError::ConnectionError(e.to_string()))
	}
}
