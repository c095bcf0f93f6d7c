//! # mongo-rx
//!
//! Reactive access to a MongoDB document service.
//!
//! Every operation of the callback-style [`DocumentService`] is also offered
//! as a cold stream carrying exactly one terminal event: one value then
//! completion, completion alone, or one failure. Nothing runs until the
//! stream is first polled.
//!
//! ## Crates
//!
//! - `mongo-rx-core`: the delegate contract, value types, [`Single`] and [`Completable`]
//! - `mongo-rx-backend`: MongoDB delegate and its configuration
//! - `mongo-rx-eventbus`: in-process event bus, service binder and proxy
//! - `mongo-rx-service`: [`MongoService`] with callback and stream forms
//!
//! ## Feature Flags
//!
//! - `full` (default): everything below
//! - `backend`: MongoDB delegate and [`MongoService`]
//! - `eventbus`: event bus, binder and proxy; with `backend` also
//!   `MongoService::create_event_bus_proxy`
//!
//! ## Quick Example
//!
//! ```rust,no_run
//! use mongo_rx::bson::doc;
//! use mongo_rx::prelude::*;
//!
//! # async fn example() -> Result<()> {
//! let context = ServiceContext::current();
//! let service = MongoService::create(&context, MongoConfig::new().db_name("app"));
//! service.start();
//!
//! let id = service
//!     .insert_stream("users", doc! { "name": "Alice" })
//!     .into_value()
//!     .await?;
//! println!("generated id: {:?}", id);
//!
//! let adults = service
//!     .count_stream("users", doc! { "age": { "$gte": 18 } })
//!     .into_value()
//!     .await?;
//! println!("adults: {:?}", adults);
//!
//! service.stop();
//! # Ok(())
//! # }
//! ```

pub use bson;
pub use mongo_rx_core as core;

#[cfg(feature = "backend")]
pub use mongo_rx_backend as backend;

#[cfg(feature = "eventbus")]
pub use mongo_rx_eventbus as eventbus;

pub use mongo_rx_core::{
	Completable, Document, DocumentService, FindOptions, Handler, Invocation, NoSQLError, Outcome,
	Result, Single, UpdateOptions, WriteOption, handler,
};

#[cfg(feature = "backend")]
pub use mongo_rx_backend::{MongoConfig, MongoDocumentService};

#[cfg(feature = "backend")]
pub use mongo_rx_service::{MongoService, ServiceContext};

#[cfg(feature = "eventbus")]
pub use mongo_rx_eventbus::{Envelope, EventBus, ProxyService, ServiceBinder};

/// Commonly used types
pub mod prelude {
	pub use crate::{
		Completable, Document, DocumentService, FindOptions, NoSQLError, Result, Single,
		UpdateOptions, WriteOption,
	};

	#[cfg(feature = "backend")]
	pub use crate::{MongoConfig, MongoService, ServiceContext};

	#[cfg(feature = "eventbus")]
	pub use crate::{EventBus, ServiceBinder};

	pub use futures::StreamExt;
}
