//! Live order views.
//!
//! A subscription delivers the full current snapshot of matching orders
//! on every relevant change, never a diff. Each delivery is derived
//! fresh from the store, re-filtered and re-sorted, so consuming the
//! same snapshot twice always yields the same view and duplicate change
//! notifications are harmless. One open stream per subscription,
//! released by dropping it or calling `unsubscribe`.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use storefront_order::views;
use storefront_storage::StorageService;
use storefront_types::{Collection, Order};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::Stream;

/// Spawns and tracks live order subscriptions.
pub struct OrderObserver {
	storage: Arc<StorageService>,
}

impl OrderObserver {
	pub fn new(storage: Arc<StorageService>) -> Self {
		Self { storage }
	}

	/// Live customer view: the customer's own orders, newest first.
	///
	/// The first snapshot arrives immediately; afterwards one arrives
	/// for every change to the orders collection.
	pub fn subscribe_customer(&self, customer_id: &str) -> OrderSubscription {
		let customer_id = customer_id.to_string();
		self.spawn(move |documents| views::customer_view(documents, &customer_id))
	}

	/// Live vendor view: orders projected down to the vendor's own
	/// sub-orders, newest first.
	pub fn subscribe_vendor(&self, vendor_id: &str) -> OrderSubscription {
		let vendor_id = vendor_id.to_string();
		self.spawn(move |documents| views::vendor_view(documents, &vendor_id))
	}

	fn spawn<F>(&self, derive: F) -> OrderSubscription
	where
		F: Fn(Vec<(String, Order)>) -> Vec<Order> + Send + 'static,
	{
		let storage = Arc::clone(&self.storage);
		let (tx, rx) = mpsc::unbounded_channel();

		let task = tokio::spawn(async move {
			let mut changes = storage.watch();
			loop {
				match storage.retrieve_all::<Order>(Collection::Orders).await {
					Ok(documents) => {
						if tx.send(derive(documents)).is_err() {
							// Subscriber went away.
							break;
						}
					}
					Err(e) => {
						tracing::warn!(error = %e, "Live order query failed; will retry on next change");
					}
				}

				// Wait for the next relevant change. Lagging behind the
				// broadcast just means we re-derive from a fresh scan,
				// which the loop does anyway.
				loop {
					match changes.recv().await {
						Ok(change) if change.collection == Collection::Orders => break,
						Ok(_) => continue,
						Err(RecvError::Lagged(_)) => break,
						Err(RecvError::Closed) => return,
					}
				}
			}
		});

		OrderSubscription {
			receiver: rx,
			guard: TeardownGuard(task),
		}
	}
}

/// Aborts the subscription task when the last handle goes away.
struct TeardownGuard(JoinHandle<()>);

impl Drop for TeardownGuard {
	fn drop(&mut self) {
		self.0.abort();
	}
}

/// One live order stream. Dropping it tears the stream down.
pub struct OrderSubscription {
	receiver: mpsc::UnboundedReceiver<Vec<Order>>,
	guard: TeardownGuard,
}

impl OrderSubscription {
	/// Receives the next snapshot. `None` once the stream is torn down.
	pub async fn recv(&mut self) -> Option<Vec<Order>> {
		self.receiver.recv().await
	}

	/// Explicitly releases the subscription.
	pub fn unsubscribe(self) {
		// Drop does the work.
	}

	/// Converts the subscription into a `Stream` of snapshots, keeping
	/// the teardown-on-drop behavior.
	pub fn into_stream(self) -> OrderSnapshotStream {
		OrderSnapshotStream {
			inner: UnboundedReceiverStream::new(self.receiver),
			_guard: self.guard,
		}
	}
}

/// Stream adapter over a live order subscription.
pub struct OrderSnapshotStream {
	inner: UnboundedReceiverStream<Vec<Order>>,
	_guard: TeardownGuard,
}

impl Stream for OrderSnapshotStream {
	type Item = Vec<Order>;

	fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
		Pin::new(&mut self.inner).poll_next(cx)
	}
}
