//! Address registry

use std::collections::HashMap;
use std::sync::Arc;

use mongo_rx_core::{Invocation, NoSQLError, Outcome, Result};
use parking_lot::RwLock;
use tokio::sync::{mpsc, oneshot};

/// A request travelling over the bus together with its reply channel
#[derive(Debug)]
pub struct Envelope {
	pub invocation: Invocation,
	pub reply: oneshot::Sender<Result<Outcome>>,
}

type Consumers = HashMap<String, mpsc::UnboundedSender<Envelope>>;

/// In-process event bus
///
/// Each address has at most one live consumer. Cloning the bus is cheap;
/// clones share the same registry.
#[derive(Debug, Clone, Default)]
pub struct EventBus {
	consumers: Arc<RwLock<Consumers>>,
}

impl EventBus {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers a consumer at `address` and returns its receiving end
	///
	/// Fails with [`NoSQLError::InvalidOperation`] while another consumer is
	/// alive at the same address. An address whose receiver was dropped is
	/// taken over.
	pub fn consumer(
		&self,
		address: impl Into<String>,
	) -> Result<mpsc::UnboundedReceiver<Envelope>> {
		self.register(address.into()).map(|(_, receiver)| receiver)
	}

	pub(crate) fn register(
		&self,
		address: String,
	) -> Result<(
		mpsc::UnboundedSender<Envelope>,
		mpsc::UnboundedReceiver<Envelope>,
	)> {
		let mut consumers = self.consumers.write();
		if let Some(existing) = consumers.get(&address)
			&& !existing.is_closed()
		{
			return Err(NoSQLError::InvalidOperation(format!(
				"address already has a consumer: {}",
				address
			)));
		}

		let (sender, receiver) = mpsc::unbounded_channel();
		tracing::debug!(address = %address, "registered event bus consumer");
		consumers.insert(address, sender.clone());
		Ok((sender, receiver))
	}

	/// Removes the consumer at `address`, returning whether one was registered
	pub fn unregister(&self, address: &str) -> bool {
		let removed = self.consumers.write().remove(address).is_some();
		if removed {
			tracing::debug!(address, "unregistered event bus consumer");
		}
		removed
	}

	// Leaves the address alone when it was re-registered in the meantime.
	pub(crate) fn unregister_sender(&self, address: &str, sender: &mpsc::UnboundedSender<Envelope>) {
		let mut consumers = self.consumers.write();
		if consumers
			.get(address)
			.is_some_and(|current| current.same_channel(sender))
		{
			consumers.remove(address);
			tracing::debug!(address, "unregistered event bus consumer");
		}
	}

	/// Returns true if a live consumer is registered at `address`
	pub fn is_registered(&self, address: &str) -> bool {
		self.consumers
			.read()
			.get(address)
			.is_some_and(|sender| !sender.is_closed())
	}

	/// Returns the addresses with a live consumer, sorted
	pub fn addresses(&self) -> Vec<String> {
		let mut addresses: Vec<String> = self
			.consumers
			.read()
			.iter()
			.filter(|(_, sender)| !sender.is_closed())
			.map(|(address, _)| address.clone())
			.collect();
		addresses.sort();
		addresses
	}

	/// Delivers `envelope` to the consumer at `address`
	///
	/// Fails with [`NoSQLError::NoHandlers`] when no live consumer is
	/// registered there; the envelope is dropped.
	pub fn send(&self, address: &str, envelope: Envelope) -> Result<()> {
		let consumers = self.consumers.read();
		let Some(sender) = consumers.get(address) else {
			return Err(NoSQLError::NoHandlers(address.to_string()));
		};
		sender
			.send(envelope)
			.map_err(|_| NoSQLError::NoHandlers(address.to_string()))
	}
}
