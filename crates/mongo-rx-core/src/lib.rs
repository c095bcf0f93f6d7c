//! # mongo-rx core
//!
//! Building blocks shared by every mongo-rx crate:
//!
//! - **[`DocumentService`]**: the callback-style delegate contract
//! - **[`Single`] / [`Completable`]**: cold streams with exactly one terminal event
//! - **[`Invocation`] / [`Outcome`]**: operations and results as plain data
//! - **[`NoSQLError`]**: the error passed through unchanged from delegates
//!
//! ## Feature Flags
//!
//! - `mongodb`: `From<mongodb::error::Error>` for [`NoSQLError`]

pub mod error;
pub mod invocation;
pub mod service;
pub mod single;
pub mod types;

pub use error::{NoSQLError, Result};
pub use invocation::{Invocation, Outcome};
pub use service::{DocumentService, Handler, handler};
pub use single::{Completable, Single};
pub use types::{Document, FindOptions, UpdateOptions, WriteOption};
