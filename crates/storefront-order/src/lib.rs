//! Order processing module for the storefront system.
//!
//! This module owns checkout: validating the client-held cart, splitting
//! it into one sub-order per vendor, persisting the compound order
//! record, and the customer/vendor query projections over the orders
//! collection. It is written against the storage abstraction only and
//! carries no HTTP or rendering concerns.

use std::sync::Arc;
use storefront_storage::{StorageError, StorageService};
use storefront_types::{
	current_timestamp, truncate_id, Cart, Collection, LineItem, Order, OrderStatus, UserProfile,
	VendorSubOrder, PAYMENT_CASH_ON_DELIVERY,
};
use thiserror::Error;

pub mod cart_store;
pub mod views;

pub use cart_store::CartStore;
pub use views::OrderQueries;

/// Sentinel vendor id for cart items that carry none. Such items are
/// grouped rather than rejected.
pub const UNKNOWN_VENDOR_ID: &str = "unknown";
/// Display name for the sentinel vendor.
pub const UNKNOWN_VENDOR_NAME: &str = "Unknown Shop";

/// Errors that can occur during checkout.
///
/// Validation failures are rejected before any write reaches the store;
/// storage failures surface to the caller, who may retry manually (no
/// automatic retry is performed).
#[derive(Debug, Error)]
pub enum CheckoutError {
	/// The cart has no items.
	#[error("Cart is empty")]
	EmptyCart,
	/// A required delivery contact field is empty.
	#[error("Missing delivery {0}")]
	MissingContact(&'static str),
	/// The order record could not be written.
	#[error("Storage error: {0}")]
	Storage(String),
}

impl From<StorageError> for CheckoutError {
	fn from(err: StorageError) -> Self {
		CheckoutError::Storage(err.to_string())
	}
}

/// Delivery contact fields collected at checkout. Both are required.
#[derive(Debug, Clone)]
pub struct CheckoutDetails {
	pub phone: String,
	pub address: String,
}

/// Partitions a cart into a compound order with one sub-order per
/// distinct vendor.
///
/// The cart is iterated once, keyed by vendor id; items missing a vendor
/// fall under the [`UNKNOWN_VENDOR_ID`] sentinel. Every line item is a
/// snapshot of the cart entry: later catalog changes never reach a
/// placed order. The order total is computed independently over the flat
/// cart and must always equal the sum of the per-vendor subtotals.
///
/// Pure function: no id, no placement timestamp, no writes. Those are
/// assigned at persistence time by [`CheckoutService::place_order`].
pub fn split_cart(
	customer: &UserProfile,
	details: &CheckoutDetails,
	cart: &Cart,
	now: u64,
) -> Result<Order, CheckoutError> {
	if cart.is_empty() {
		return Err(CheckoutError::EmptyCart);
	}
	if details.phone.trim().is_empty() {
		return Err(CheckoutError::MissingContact("phone"));
	}
	if details.address.trim().is_empty() {
		return Err(CheckoutError::MissingContact("address"));
	}

	let mut vendor_orders: Vec<VendorSubOrder> = Vec::new();
	for item in &cart.items {
		let vendor_id = item.vendor_id.as_deref().unwrap_or(UNKNOWN_VENDOR_ID);
		let position = match vendor_orders.iter().position(|vo| vo.vendor_id == vendor_id) {
			Some(position) => position,
			None => {
				vendor_orders.push(VendorSubOrder {
					vendor_id: vendor_id.to_string(),
					vendor_name: item
						.vendor_name
						.clone()
						.unwrap_or_else(|| UNKNOWN_VENDOR_NAME.to_string()),
					items: Vec::new(),
					subtotal: 0,
					status: OrderStatus::Pending,
					created_at: now,
					updated_at: now,
				});
				vendor_orders.len() - 1
			}
		};

		let sub_order = &mut vendor_orders[position];
		sub_order.items.push(LineItem {
			item_id: item.item_id.clone(),
			name: item.name.clone(),
			unit_price: item.unit_price,
			quantity: item.quantity,
			category: item.category.clone(),
		});
		sub_order.subtotal += item.line_total();
	}

	Ok(Order {
		id: String::new(),
		customer_id: customer.uid.clone(),
		customer_name: customer.display_or_email().to_string(),
		customer_phone: details.phone.clone(),
		customer_address: details.address.clone(),
		vendor_orders,
		// Computed over the flat cart, independent of the per-vendor
		// accumulation above.
		total_price: cart.total(),
		placed_at: None,
		created_at: None,
		payment_method: PAYMENT_CASH_ON_DELIVERY.to_string(),
	})
}

/// Checkout service: splits, persists, and clears the cart.
pub struct CheckoutService {
	storage: Arc<StorageService>,
}

impl CheckoutService {
	pub fn new(storage: Arc<StorageService>) -> Self {
		Self { storage }
	}

	/// Places an order from the given cart.
	///
	/// On success the order record exists in the store, the returned
	/// order carries its assigned id and placement timestamp, and the
	/// cart has been cleared. On a store failure the cart is left
	/// untouched (no partial clear) and the error surfaces to the
	/// caller for a manual retry.
	pub async fn place_order(
		&self,
		customer: &UserProfile,
		details: &CheckoutDetails,
		cart: &mut Cart,
	) -> Result<Order, CheckoutError> {
		let now = current_timestamp();
		let mut order = split_cart(customer, details, cart, now)?;
		order.placed_at = Some(now);

		let id = self.storage.create(Collection::Orders, &order).await?;
		order.id = id;
		cart.clear();

		tracing::info!(
			order_id = %truncate_id(&order.id),
			customer = %truncate_id(&order.customer_id),
			vendors = order.vendor_orders.len(),
			total = order.total_price,
			"Order placed"
		);
		Ok(order)
	}
}
