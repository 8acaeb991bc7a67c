//! Order types for the storefront system.
//!
//! This module defines the compound order record produced at checkout,
//! its per-vendor sub-orders, the immutable line-item snapshots they
//! carry, and the fulfillment status enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Payment method recorded on every order. The storefront is
/// cash-on-delivery only; no payment processing exists.
pub const PAYMENT_CASH_ON_DELIVERY: &str = "Cash on Delivery";

/// The compound, persisted order record.
///
/// An order captures one checkout transaction, possibly spanning multiple
/// vendors. It is created exactly once and never deleted; only the status
/// and `updated_at` fields of its sub-orders change afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
	/// Document id assigned by the store on creation. Not part of the
	/// persisted body; readers attach it from the document key.
	#[serde(default)]
	pub id: String,
	/// Identity of the customer who placed the order.
	pub customer_id: String,
	/// Customer display name captured at checkout.
	pub customer_name: String,
	/// Delivery phone captured at checkout.
	pub customer_phone: String,
	/// Delivery address captured at checkout.
	pub customer_address: String,
	/// One sub-order per distinct vendor present in the cart.
	pub vendor_orders: Vec<VendorSubOrder>,
	/// Sum of all sub-order subtotals at creation time. A recorded fact
	/// about the transaction; never recomputed, even if sub-orders are
	/// later cancelled.
	pub total_price: u64,
	/// Server-assigned creation timestamp (unix seconds).
	#[serde(skip_serializing_if = "Option::is_none")]
	pub placed_at: Option<u64>,
	/// Alternate timestamp carried by legacy order documents.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub created_at: Option<u64>,
	/// Always [`PAYMENT_CASH_ON_DELIVERY`] for orders placed here.
	pub payment_method: String,
}

impl Order {
	/// Timestamp used for newest-first sorting: the server-assigned
	/// `placed_at`, falling back to the legacy `created_at`, then to
	/// epoch zero so undated legacy orders sort last.
	pub fn sort_timestamp(&self) -> u64 {
		self.placed_at.or(self.created_at).unwrap_or(0)
	}

	/// Short human-facing reference: the last six characters of the
	/// document id, uppercased.
	pub fn short_reference(&self) -> String {
		let start = self.id.len().saturating_sub(6);
		self.id[start..].to_uppercase()
	}

	/// Finds the sub-order belonging to the given vendor, if any.
	pub fn sub_order(&self, vendor_id: &str) -> Option<&VendorSubOrder> {
		self.vendor_orders.iter().find(|vo| vo.vendor_id == vendor_id)
	}

	/// Mutable variant of [`Order::sub_order`].
	pub fn sub_order_mut(&mut self, vendor_id: &str) -> Option<&mut VendorSubOrder> {
		self.vendor_orders
			.iter_mut()
			.find(|vo| vo.vendor_id == vendor_id)
	}
}

/// The portion of an order belonging to one vendor, independently
/// tracked through fulfillment states.
///
/// Owned by its parent [`Order`]; never exists independently. There is
/// at most one sub-order per vendor id per order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorSubOrder {
	/// Vendor identity, or the `"unknown"` sentinel.
	pub vendor_id: String,
	/// Vendor display name captured at checkout.
	pub vendor_name: String,
	/// Line-item snapshots for this vendor.
	pub items: Vec<LineItem>,
	/// Sum of line totals, fixed at creation.
	pub subtotal: u64,
	/// Current fulfillment status.
	pub status: OrderStatus,
	/// Creation timestamp (unix seconds).
	pub created_at: u64,
	/// Timestamp of the most recent status change.
	pub updated_at: u64,
}

impl VendorSubOrder {
	/// Re-derives the subtotal from the persisted line items. Must always
	/// reproduce the stored `subtotal`; catalog price changes after
	/// checkout never drift it.
	pub fn derived_subtotal(&self) -> u64 {
		self.items.iter().map(LineItem::line_total).sum()
	}

	/// Total number of units across all line items.
	pub fn unit_count(&self) -> u64 {
		self.items.iter().map(|item| item.quantity as u64).sum()
	}
}

/// An immutable snapshot of one purchased catalog item at checkout time.
///
/// Later changes to the catalog item (price, name, image) must never
/// retroactively alter a placed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
	/// Catalog item id the snapshot was taken from.
	pub item_id: String,
	pub name: String,
	/// Price per unit at checkout time, in integer currency units.
	pub unit_price: u64,
	pub quantity: u32,
	pub category: String,
}

impl LineItem {
	/// Unit price times quantity.
	pub fn line_total(&self) -> u64 {
		self.unit_price * self.quantity as u64
	}
}

/// Fulfillment status of a single vendor sub-order.
///
/// The linear path is `pending → accepted → preparing → ready →
/// completed`; `cancelled` is an out-of-band terminal reachable from any
/// non-terminal state. `completed` and `cancelled` have no outgoing
/// transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
	/// Placed by the customer, not yet acknowledged by the vendor.
	Pending,
	/// Acknowledged by the vendor.
	Accepted,
	/// Being prepared.
	Preparing,
	/// Ready for pickup or delivery.
	Ready,
	/// Fulfilled. Terminal.
	Completed,
	/// Abandoned before fulfillment. Terminal.
	Cancelled,
}

impl OrderStatus {
	/// The linear fulfillment sequence, in order.
	pub const LINEAR: [OrderStatus; 5] = [
		OrderStatus::Pending,
		OrderStatus::Accepted,
		OrderStatus::Preparing,
		OrderStatus::Ready,
		OrderStatus::Completed,
	];

	/// The immediate successor on the linear path, or `None` for
	/// terminal states.
	pub fn successor(&self) -> Option<OrderStatus> {
		match self {
			OrderStatus::Pending => Some(OrderStatus::Accepted),
			OrderStatus::Accepted => Some(OrderStatus::Preparing),
			OrderStatus::Preparing => Some(OrderStatus::Ready),
			OrderStatus::Ready => Some(OrderStatus::Completed),
			OrderStatus::Completed | OrderStatus::Cancelled => None,
		}
	}

	/// Whether the state admits no further transitions.
	pub fn is_terminal(&self) -> bool {
		matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
	}

	/// Human-facing label.
	pub fn label(&self) -> &'static str {
		match self {
			OrderStatus::Pending => "Pending",
			OrderStatus::Accepted => "Accepted",
			OrderStatus::Preparing => "Preparing",
			OrderStatus::Ready => "Ready",
			OrderStatus::Completed => "Completed",
			OrderStatus::Cancelled => "Cancelled",
		}
	}
}

impl fmt::Display for OrderStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.label())
	}
}
