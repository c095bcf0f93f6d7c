//! Cold single-value streams over callback operations
//!
//! [`Single`] turns an operation of the shape `op(args.., handler)` into a
//! [`Stream`] with exactly one terminal event:
//!
//! - one value followed by completion,
//! - completion without a value (void or absent results), or
//! - one failure.
//!
//! The stream is cold: building it runs nothing. The operation is invoked
//! on the first poll, exactly once, and its handler may fire on any thread.
//! A `Single` is never re-activated; call the stream-form operation again for
//! a fresh, independent invocation.
//!
//! Dropping a `Single` after activation does not cancel the operation. The
//! delegate still runs it to completion and its result is discarded.
//!
//! # Example
//!
//! ```rust
//! use futures::StreamExt;
//! use mongo_rx_core::Single;
//!
//! # tokio_test::block_on(async {
//! let single = Single::from_handler(|handler| handler(Ok(42_u64)));
//! let events: Vec<_> = single.collect().await;
//! assert_eq!(events, vec![Ok(42)]);
//! # });
//! ```

use std::convert::Infallible;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::stream::{FusedStream, Stream, StreamExt};
use tokio::sync::oneshot;

use crate::error::Result;
use crate::service::Handler;

type Completion<T> = oneshot::Sender<Result<Option<T>>>;
type Activation<T> = Box<dyn FnOnce(Completion<T>) + Send + 'static>;

enum State<T> {
	Created(Activation<T>),
	Activated(oneshot::Receiver<Result<Option<T>>>),
	Terminated,
}

/// Lazy stream yielding at most one value or exactly one error
#[must_use = "a Single does nothing until it is polled"]
pub struct Single<T> {
	state: State<T>,
}

/// A [`Single`] that never yields a value, only completion or failure
pub type Completable = Single<Infallible>;

impl<T: Send + 'static> Single<T> {
	fn with_activation(activation: Activation<T>) -> Self {
		Self {
			state: State::Created(activation),
		}
	}

	/// Wraps an operation whose handler always carries a value on success
	pub fn from_handler<F>(operation: F) -> Self
	where
		F: FnOnce(Handler<T>) + Send + 'static,
	{
		Self::with_activation(Box::new(move |completion: Completion<T>| {
			operation(Box::new(move |result: Result<T>| {
				deliver(completion, result.map(Some));
			}))
		}))
	}

	/// Wraps an operation whose success value may be absent
	///
	/// `Ok(None)` completes the stream without emitting anything.
	pub fn from_optional_handler<F>(operation: F) -> Self
	where
		F: FnOnce(Handler<Option<T>>) + Send + 'static,
	{
		Self::with_activation(Box::new(move |completion: Completion<T>| {
			operation(Box::new(move |result: Result<Option<T>>| {
				deliver(completion, result);
			}))
		}))
	}

	/// Returns true once the operation has been invoked
	pub fn is_activated(&self) -> bool {
		!matches!(self.state, State::Created(_))
	}

	/// Activates the stream and waits for its terminal event
	///
	/// Returns `Ok(Some(value))`, `Ok(None)` for an empty completion, or the
	/// failure.
	pub async fn into_value(mut self) -> Result<Option<T>> {
		self.next().await.transpose()
	}
}

impl Completable {
	/// Wraps an operation whose handler carries no value
	pub fn from_completion<F>(operation: F) -> Self
	where
		F: FnOnce(Handler<()>) + Send + 'static,
	{
		Self::with_activation(Box::new(move |completion: Completion<Infallible>| {
			operation(Box::new(move |result: Result<()>| {
				deliver(completion, result.map(|()| None));
			}))
		}))
	}

	/// Activates the stream and waits for completion or failure
	pub async fn into_completion(self) -> Result<()> {
		match self.into_value().await? {
			Some(never) => match never {},
			None => Ok(()),
		}
	}
}

fn deliver<T>(completion: Completion<T>, result: Result<Option<T>>) {
	if completion.send(result).is_err() {
		tracing::trace!("stream dropped before its operation completed, discarding result");
	}
}

impl<T> Stream for Single<T> {
	type Item = Result<T>;

	fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
		let this = self.get_mut();
		loop {
			match std::mem::replace(&mut this.state, State::Terminated) {
				State::Created(activate) => {
					let (completion, receiver) = oneshot::channel();
					this.state = State::Activated(receiver);
					// The handler may fire synchronously; the receiver is polled next.
					activate(completion);
				}
				State::Activated(mut receiver) => {
					return match Pin::new(&mut receiver).poll(cx) {
						Poll::Pending => {
							this.state = State::Activated(receiver);
							Poll::Pending
						}
						Poll::Ready(Ok(Ok(Some(value)))) => Poll::Ready(Some(Ok(value))),
						Poll::Ready(Ok(Ok(None))) => Poll::Ready(None),
						Poll::Ready(Ok(Err(error))) => Poll::Ready(Some(Err(error))),
						Poll::Ready(Err(_)) => {
							tracing::warn!("operation handler dropped without being invoked");
							Poll::Ready(None)
						}
					};
				}
				State::Terminated => return Poll::Ready(None),
			}
		}
	}

	fn size_hint(&self) -> (usize, Option<usize>) {
		match self.state {
			State::Terminated => (0, Some(0)),
			_ => (0, Some(1)),
		}
	}
}

impl<T> FusedStream for Single<T> {
	fn is_terminated(&self) -> bool {
		matches!(self.state, State::Terminated)
	}
}

impl<T> fmt::Debug for Single<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let state = match self.state {
			State::Created(_) => "created",
			State::Activated(_) => "activated",
			State::Terminated => "terminated",
		};
		f.debug_struct("Single").field("state", &state).finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::NoSQLError;
	use rstest::rstest;
	use std::sync::Arc;
	use std::sync::atomic::{AtomicUsize, Ordering};

	#[rstest]
	#[tokio::test]
	async fn test_construction_does_not_invoke_operation() {
		// Arrange
		let calls = Arc::new(AtomicUsize::new(0));
		let calls_clone = calls.clone();

		// Act
		let single = Single::from_handler(move |handler: Handler<u64>| {
			calls_clone.fetch_add(1, Ordering::SeqCst);
			handler(Ok(1));
		});

		// Assert
		assert_eq!(calls.load(Ordering::SeqCst), 0);
		assert!(!single.is_activated());

		let events: Vec<_> = single.collect().await;
		assert_eq!(events, vec![Ok(1)]);
		assert_eq!(calls.load(Ordering::SeqCst), 1);
	}

	#[rstest]
	#[tokio::test]
	async fn test_value_then_completion() {
		// Arrange
		let mut single = Single::from_handler(|handler| handler(Ok("123".to_string())));

		// Act
		let first = single.next().await;
		let second = single.next().await;

		// Assert
		assert_eq!(first, Some(Ok("123".to_string())));
		assert_eq!(second, None);
		assert!(single.is_terminated());
	}

	#[rstest]
	#[tokio::test]
	async fn test_failure_is_the_only_event() {
		// Arrange
		let single: Single<u64> =
			Single::from_handler(|handler| handler(Err(NoSQLError::Timeout("timeout".into()))));

		// Act
		let events: Vec<_> = single.collect().await;

		// Assert
		assert_eq!(events, vec![Err(NoSQLError::Timeout("timeout".into()))]);
	}

	#[rstest]
	#[tokio::test]
	async fn test_completable_emits_nothing_on_success() {
		// Arrange
		let completable = Completable::from_completion(|handler| handler(Ok(())));

		// Act
		let events: Vec<_> = completable.collect().await;

		// Assert
		assert!(events.is_empty());
	}

	#[rstest]
	#[tokio::test]
	async fn test_completable_failure() {
		let completable = Completable::from_completion(|handler| {
			handler(Err(NoSQLError::DatabaseError("boom".into())))
		});

		let result = completable.into_completion().await;

		assert_eq!(result, Err(NoSQLError::DatabaseError("boom".into())));
	}

	#[rstest]
	#[tokio::test]
	async fn test_absent_optional_value_completes_empty() {
		let single: Single<String> = Single::from_optional_handler(|handler| handler(Ok(None)));

		assert_eq!(single.into_value().await, Ok(None));
	}

	#[rstest]
	#[tokio::test]
	async fn test_handler_fired_from_another_thread() {
		// Arrange
		let single = Single::from_handler(|handler: Handler<u64>| {
			std::thread::spawn(move || {
				std::thread::sleep(std::time::Duration::from_millis(10));
				handler(Ok(7));
			});
		});

		// Act
		let value = single.into_value().await;

		// Assert
		assert_eq!(value, Ok(Some(7)));
	}

	#[rstest]
	#[tokio::test]
	async fn test_dropped_handler_completes_empty() {
		let single = Single::from_handler(|handler: Handler<u64>| drop(handler));

		let events: Vec<_> = single.collect().await;

		assert!(events.is_empty());
	}

	#[rstest]
	#[tokio::test]
	async fn test_terminated_single_is_not_reactivated() {
		// Arrange
		let calls = Arc::new(AtomicUsize::new(0));
		let calls_clone = calls.clone();
		let mut single = Single::from_handler(move |handler: Handler<u64>| {
			calls_clone.fetch_add(1, Ordering::SeqCst);
			handler(Ok(1));
		});

		// Act
		while single.next().await.is_some() {}
		let after = single.next().await;

		// Assert
		assert_eq!(after, None);
		assert_eq!(calls.load(Ordering::SeqCst), 1);
	}

	#[rstest]
	#[tokio::test]
	async fn test_dropping_activated_single_discards_late_result() {
		// Arrange
		let (release, released) = std::sync::mpsc::channel::<Handler<u64>>();
		let mut single = Single::from_handler(move |handler: Handler<u64>| {
			release.send(handler).unwrap();
		});

		// Act: activate, then drop before the handler fires
		let poll = futures::poll!(single.next());
		assert!(poll.is_pending());
		assert!(single.is_activated());
		drop(single);

		// Assert: late delivery is a no-op
		let handler = released.recv().unwrap();
		handler(Ok(1));
	}
}
