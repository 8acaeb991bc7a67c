//! Sub-order state machine implementation.
//!
//! Manages status transitions of vendor sub-orders with validation:
//! the linear path is `pending -> accepted -> preparing -> ready ->
//! completed`, with `cancelled` reachable from any non-terminal state.
//! Only the immediate successor (or `cancelled`) is accepted; skipping
//! ahead or moving backward is rejected at the point of mutation.

use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use storefront_storage::{StorageError, StorageService};
use storefront_types::{current_timestamp, truncate_id, Collection, Order, OrderStatus};
use thiserror::Error;

/// Errors that can occur during sub-order state management.
#[derive(Debug, Error)]
pub enum OrderStateError {
	#[error("Storage error: {0}")]
	Storage(String),
	#[error("Invalid state transition from {from} to {to}")]
	InvalidTransition { from: OrderStatus, to: OrderStatus },
	#[error("Order not found: {0}")]
	OrderNotFound(String),
	#[error("Order {order_id} has no sub-order for vendor {vendor_id}")]
	SubOrderNotFound { order_id: String, vendor_id: String },
}

// Static transition table - each state maps to its allowed next states.
static TRANSITIONS: Lazy<HashMap<OrderStatus, HashSet<OrderStatus>>> = Lazy::new(|| {
	let mut m = HashMap::new();
	for status in OrderStatus::LINEAR {
		let mut allowed = HashSet::new();
		if let Some(next) = status.successor() {
			allowed.insert(next);
		}
		if !status.is_terminal() {
			allowed.insert(OrderStatus::Cancelled);
		}
		m.insert(status, allowed);
	}
	m.insert(OrderStatus::Cancelled, HashSet::new()); // terminal
	m
});

/// The set of statuses a sub-order may move to from `current`.
pub fn next_allowed(current: OrderStatus) -> &'static HashSet<OrderStatus> {
	static EMPTY: Lazy<HashSet<OrderStatus>> = Lazy::new(HashSet::new);
	TRANSITIONS.get(&current).unwrap_or(&EMPTY)
}

/// Checks if a state transition is valid.
pub fn is_valid_transition(from: OrderStatus, to: OrderStatus) -> bool {
	next_allowed(from).contains(&to)
}

/// Manages sub-order state transitions and persistence.
///
/// A transition touches exactly one sub-order inside one order: its
/// `status` and `updated_at`. Sibling sub-orders are carried through the
/// document write untouched.
pub struct OrderStateMachine {
	storage: Arc<StorageService>,
}

impl OrderStateMachine {
	pub fn new(storage: Arc<StorageService>) -> Self {
		Self { storage }
	}

	/// Gets an order by id, with the document id attached.
	pub async fn get_order(&self, order_id: &str) -> Result<Order, OrderStateError> {
		match self
			.storage
			.retrieve::<Order>(Collection::Orders, order_id)
			.await
		{
			Ok(mut order) => {
				order.id = order_id.to_string();
				Ok(order)
			}
			Err(StorageError::NotFound) => Err(OrderStateError::OrderNotFound(order_id.to_string())),
			Err(e) => Err(OrderStateError::Storage(e.to_string())),
		}
	}

	/// Transitions one vendor sub-order to a new status, with
	/// validation, and persists the order.
	pub async fn transition_sub_order(
		&self,
		order_id: &str,
		vendor_id: &str,
		new_status: OrderStatus,
	) -> Result<Order, OrderStateError> {
		let mut order = self.get_order(order_id).await?;

		let sub_order =
			order
				.sub_order_mut(vendor_id)
				.ok_or_else(|| OrderStateError::SubOrderNotFound {
					order_id: order_id.to_string(),
					vendor_id: vendor_id.to_string(),
				})?;

		if !is_valid_transition(sub_order.status, new_status) {
			return Err(OrderStateError::InvalidTransition {
				from: sub_order.status,
				to: new_status,
			});
		}

		sub_order.status = new_status;
		sub_order.updated_at = current_timestamp();

		self.storage
			.update(Collection::Orders, order_id, &order)
			.await
			.map_err(|e| OrderStateError::Storage(e.to_string()))?;

		tracing::info!(
			order_id = %truncate_id(order_id),
			vendor_id = %truncate_id(vendor_id),
			status = %new_status,
			"Sub-order status changed"
		);
		Ok(order)
	}

	/// Cancels one vendor sub-order from any non-terminal state.
	pub async fn cancel_sub_order(
		&self,
		order_id: &str,
		vendor_id: &str,
	) -> Result<Order, OrderStateError> {
		self.transition_sub_order(order_id, vendor_id, OrderStatus::Cancelled)
			.await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use storefront_storage::implementations::memory::MemoryStorage;
	use storefront_types::{LineItem, VendorSubOrder, PAYMENT_CASH_ON_DELIVERY};

	fn sub_order(vendor_id: &str) -> VendorSubOrder {
		VendorSubOrder {
			vendor_id: vendor_id.into(),
			vendor_name: format!("Shop {}", vendor_id),
			items: vec![LineItem {
				item_id: "i1".into(),
				name: "Item".into(),
				unit_price: 100,
				quantity: 1,
				category: "Mains".into(),
			}],
			subtotal: 100,
			status: OrderStatus::Pending,
			created_at: 1,
			updated_at: 1,
		}
	}

	async fn machine_with_order(vendors: &[&str]) -> (OrderStateMachine, Arc<StorageService>) {
		let storage = Arc::new(StorageService::new(Box::new(MemoryStorage::new())));
		let order = Order {
			id: String::new(),
			customer_id: "cust".into(),
			customer_name: "C".into(),
			customer_phone: "0300".into(),
			customer_address: "Addr".into(),
			vendor_orders: vendors.iter().map(|v| sub_order(v)).collect(),
			total_price: 100 * vendors.len() as u64,
			placed_at: Some(1),
			created_at: None,
			payment_method: PAYMENT_CASH_ON_DELIVERY.into(),
		};
		storage
			.store(Collection::Orders, "order-1", &order)
			.await
			.unwrap();
		(OrderStateMachine::new(Arc::clone(&storage)), storage)
	}

	#[test]
	fn transition_table_follows_the_linear_path() {
		assert!(is_valid_transition(OrderStatus::Pending, OrderStatus::Accepted));
		assert!(is_valid_transition(OrderStatus::Accepted, OrderStatus::Preparing));
		assert!(is_valid_transition(OrderStatus::Preparing, OrderStatus::Ready));
		assert!(is_valid_transition(OrderStatus::Ready, OrderStatus::Completed));

		// No skipping, no going backward.
		assert!(!is_valid_transition(OrderStatus::Pending, OrderStatus::Preparing));
		assert!(!is_valid_transition(OrderStatus::Accepted, OrderStatus::Pending));
		assert!(!is_valid_transition(OrderStatus::Pending, OrderStatus::Completed));
	}

	#[test]
	fn cancelled_is_reachable_from_every_non_terminal_state() {
		for status in OrderStatus::LINEAR {
			if status.is_terminal() {
				assert!(!is_valid_transition(status, OrderStatus::Cancelled));
			} else {
				assert!(is_valid_transition(status, OrderStatus::Cancelled));
			}
		}
	}

	#[test]
	fn terminal_states_have_no_outgoing_transitions() {
		assert!(next_allowed(OrderStatus::Completed).is_empty());
		assert!(next_allowed(OrderStatus::Cancelled).is_empty());
	}

	#[tokio::test]
	async fn advancing_persists_status_and_updated_at() {
		let (machine, _) = machine_with_order(&["v1"]).await;
		let order = machine
			.transition_sub_order("order-1", "v1", OrderStatus::Accepted)
			.await
			.unwrap();
		let vo = order.sub_order("v1").unwrap();
		assert_eq!(vo.status, OrderStatus::Accepted);
		assert!(vo.updated_at >= 1);
	}

	#[tokio::test]
	async fn skipping_a_state_is_rejected() {
		let (machine, _) = machine_with_order(&["v1"]).await;
		let err = machine
			.transition_sub_order("order-1", "v1", OrderStatus::Preparing)
			.await
			.unwrap_err();
		assert!(matches!(
			err,
			OrderStateError::InvalidTransition {
				from: OrderStatus::Pending,
				to: OrderStatus::Preparing,
			}
		));
	}

	#[tokio::test]
	async fn sibling_sub_orders_are_untouched() {
		let (machine, storage) = machine_with_order(&["v1", "v2"]).await;
		let before: Order = storage
			.retrieve(Collection::Orders, "order-1")
			.await
			.unwrap();
		let v2_before = before.sub_order("v2").unwrap().clone();

		machine
			.transition_sub_order("order-1", "v1", OrderStatus::Accepted)
			.await
			.unwrap();

		let after: Order = storage
			.retrieve(Collection::Orders, "order-1")
			.await
			.unwrap();
		assert_eq!(after.sub_order("v2").unwrap(), &v2_before);
		assert_eq!(after.total_price, before.total_price);
	}

	#[tokio::test]
	async fn total_price_is_not_recomputed_on_cancellation() {
		let (machine, storage) = machine_with_order(&["v1", "v2"]).await;
		machine.cancel_sub_order("order-1", "v1").await.unwrap();
		let after: Order = storage
			.retrieve(Collection::Orders, "order-1")
			.await
			.unwrap();
		assert_eq!(after.sub_order("v1").unwrap().status, OrderStatus::Cancelled);
		// The recorded transaction total stands even with a cancelled
		// sub-order.
		assert_eq!(after.total_price, 200);
	}

	#[tokio::test]
	async fn unknown_order_and_vendor_are_distinct_errors() {
		let (machine, _) = machine_with_order(&["v1"]).await;
		assert!(matches!(
			machine
				.transition_sub_order("missing", "v1", OrderStatus::Accepted)
				.await,
			Err(OrderStateError::OrderNotFound(_))
		));
		assert!(matches!(
			machine
				.transition_sub_order("order-1", "v9", OrderStatus::Accepted)
				.await,
			Err(OrderStateError::SubOrderNotFound { .. })
		));
	}
}
