//! Customer and vendor query projections over the orders collection.
//!
//! Two query shapes exist: "all orders of customer X" (whole documents)
//! and "all orders containing a sub-order of vendor Y" (a full scan that
//! projects each document down to the vendor's own sub-orders). Sorting
//! is done here, newest first, never relying on store-side ordering.
//! Legacy documents fall back to an alternate timestamp field and then
//! to epoch zero, so undated orders land last.

use std::sync::Arc;
use storefront_storage::{StorageError, StorageService};
use storefront_types::{Collection, Order, OrderStatus};

/// Sorts orders newest first, in place.
///
/// Stable, so orders with equal timestamps keep their scan order.
pub fn sort_newest_first(orders: &mut [Order]) {
	orders.sort_by(|a, b| b.sort_timestamp().cmp(&a.sort_timestamp()));
}

/// Derives the customer view from a raw collection snapshot: the
/// customer's own orders, whole, newest first.
///
/// Pure: deriving twice from the same snapshot yields the same view.
pub fn customer_view(documents: Vec<(String, Order)>, customer_id: &str) -> Vec<Order> {
	let mut orders: Vec<Order> = documents
		.into_iter()
		.filter(|(_, order)| order.customer_id == customer_id)
		.map(|(id, mut order)| {
			order.id = id;
			order
		})
		.collect();
	sort_newest_first(&mut orders);
	orders
}

/// Derives the vendor view from a raw collection snapshot: orders that
/// contain at least one sub-order for the vendor, each projected down to
/// only that vendor's sub-orders, newest first.
///
/// The vendor-facing projection needs its own sub-orders only, never the
/// siblings. Pure, like [`customer_view`].
pub fn vendor_view(documents: Vec<(String, Order)>, vendor_id: &str) -> Vec<Order> {
	let mut orders: Vec<Order> = documents
		.into_iter()
		.filter_map(|(id, mut order)| {
			order.vendor_orders.retain(|vo| vo.vendor_id == vendor_id);
			if order.vendor_orders.is_empty() {
				None
			} else {
				order.id = id;
				Some(order)
			}
		})
		.collect();
	sort_newest_first(&mut orders);
	orders
}

/// Number of pending sub-orders across a vendor's projected orders.
/// Drives the "new orders" badge.
pub fn pending_count(orders: &[Order]) -> usize {
	orders
		.iter()
		.flat_map(|order| order.vendor_orders.iter())
		.filter(|vo| vo.status == OrderStatus::Pending)
		.count()
}

/// Query service over the orders collection.
pub struct OrderQueries {
	storage: Arc<StorageService>,
}

impl OrderQueries {
	pub fn new(storage: Arc<StorageService>) -> Self {
		Self { storage }
	}

	/// All orders placed by the customer, newest first.
	pub async fn for_customer(&self, customer_id: &str) -> Result<Vec<Order>, StorageError> {
		let documents = self.storage.retrieve_all(Collection::Orders).await?;
		Ok(customer_view(documents, customer_id))
	}

	/// All orders containing a sub-order for the vendor, projected to
	/// the vendor's own sub-orders, newest first.
	pub async fn for_vendor(&self, vendor_id: &str) -> Result<Vec<Order>, StorageError> {
		let documents = self.storage.retrieve_all(Collection::Orders).await?;
		Ok(vendor_view(documents, vendor_id))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use storefront_types::{LineItem, VendorSubOrder, PAYMENT_CASH_ON_DELIVERY};

	fn line() -> LineItem {
		LineItem {
			item_id: "i1".into(),
			name: "Item".into(),
			unit_price: 100,
			quantity: 1,
			category: "Mains".into(),
		}
	}

	fn sub_order(vendor_id: &str, status: OrderStatus) -> VendorSubOrder {
		VendorSubOrder {
			vendor_id: vendor_id.into(),
			vendor_name: format!("Shop {}", vendor_id),
			items: vec![line()],
			subtotal: 100,
			status,
			created_at: 1,
			updated_at: 1,
		}
	}

	fn order(customer: &str, vendors: &[&str], placed_at: Option<u64>) -> Order {
		Order {
			id: String::new(),
			customer_id: customer.into(),
			customer_name: "C".into(),
			customer_phone: "0300".into(),
			customer_address: "Addr".into(),
			vendor_orders: vendors
				.iter()
				.map(|v| sub_order(v, OrderStatus::Pending))
				.collect(),
			total_price: 100 * vendors.len() as u64,
			placed_at,
			created_at: None,
			payment_method: PAYMENT_CASH_ON_DELIVERY.into(),
		}
	}

	fn snapshot(orders: Vec<(&str, Order)>) -> Vec<(String, Order)> {
		orders
			.into_iter()
			.map(|(id, order)| (id.to_string(), order))
			.collect()
	}

	#[test]
	fn customer_view_filters_and_sorts_descending() {
		let docs = snapshot(vec![
			("o1", order("alice", &["v1"], Some(10))),
			("o2", order("bob", &["v1"], Some(30))),
			("o3", order("alice", &["v2"], Some(20))),
		]);
		let view = customer_view(docs, "alice");
		let ids: Vec<&str> = view.iter().map(|o| o.id.as_str()).collect();
		assert_eq!(ids, vec!["o3", "o1"]);
	}

	#[test]
	fn undated_legacy_orders_sort_last() {
		let mut legacy = order("alice", &["v1"], None);
		legacy.created_at = None;
		let mut alternate = order("alice", &["v1"], None);
		alternate.created_at = Some(5);

		let docs = snapshot(vec![
			("legacy", legacy),
			("new", order("alice", &["v1"], Some(50))),
			("alternate", alternate),
		]);
		let view = customer_view(docs, "alice");
		let ids: Vec<&str> = view.iter().map(|o| o.id.as_str()).collect();
		assert_eq!(ids, vec!["new", "alternate", "legacy"]);
	}

	#[test]
	fn vendor_view_projects_to_own_sub_orders() {
		let docs = snapshot(vec![
			("o1", order("alice", &["v1", "v2"], Some(10))),
			("o2", order("bob", &["v2"], Some(20))),
		]);
		let view = vendor_view(docs, "v1");
		assert_eq!(view.len(), 1);
		assert_eq!(view[0].id, "o1");
		assert_eq!(view[0].vendor_orders.len(), 1);
		assert_eq!(view[0].vendor_orders[0].vendor_id, "v1");
	}

	#[test]
	fn deriving_the_same_snapshot_twice_is_idempotent() {
		let docs = snapshot(vec![
			("o1", order("alice", &["v1", "v2"], Some(10))),
			("o2", order("alice", &["v1"], Some(20))),
		]);
		let first = vendor_view(docs.clone(), "v1");
		let second = vendor_view(docs, "v1");
		assert_eq!(first, second);
	}

	#[test]
	fn pending_count_spans_projected_orders() {
		let mut o1 = order("alice", &["v1"], Some(10));
		o1.vendor_orders[0].status = OrderStatus::Accepted;
		let o2 = order("bob", &["v1"], Some(20));
		let docs = snapshot(vec![("o1", o1), ("o2", o2)]);
		let view = vendor_view(docs, "v1");
		assert_eq!(pending_count(&view), 1);
	}
}
