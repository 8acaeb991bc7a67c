//! Cart types for the storefront system.
//!
//! The cart is client-held, unpersisted state: a list of selected catalog
//! items with quantities. It never touches the document store; the only
//! durable copy lives in a client-local slot (see `storefront-order`).

use serde::{Deserialize, Serialize};

/// One selected catalog item with a quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
	/// Catalog item id this entry refers to.
	pub item_id: String,
	pub name: String,
	/// Price per unit in integer currency units.
	pub unit_price: u64,
	/// Always at least 1; an entry dropping to 0 is removed.
	pub quantity: u32,
	/// Owning vendor, if the catalog item carried one.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub vendor_id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub vendor_name: Option<String>,
	#[serde(default)]
	pub category: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub image_ref: Option<String>,
}

impl CartItem {
	/// Unit price times quantity.
	pub fn line_total(&self) -> u64 {
		self.unit_price * self.quantity as u64
	}
}

/// The browsing session's selection. Pure local state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
	pub items: Vec<CartItem>,
}

impl Cart {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn from_items(items: Vec<CartItem>) -> Self {
		Self { items }
	}

	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}

	pub fn len(&self) -> usize {
		self.items.len()
	}

	/// Adds an item to the cart. If an entry with the same item id is
	/// already present its quantity is increased instead of creating a
	/// duplicate entry.
	pub fn add(&mut self, item: CartItem) {
		match self.items.iter_mut().find(|i| i.item_id == item.item_id) {
			Some(existing) => existing.quantity += item.quantity,
			None => self.items.push(item),
		}
	}

	/// Adjusts the quantity of the entry with the given item id by
	/// `change` (which may be negative). The entry is removed when its
	/// quantity reaches zero. Unknown ids are ignored.
	pub fn adjust_quantity(&mut self, item_id: &str, change: i32) {
		if let Some(pos) = self.items.iter().position(|i| i.item_id == item_id) {
			let item = &mut self.items[pos];
			let updated = item.quantity as i64 + change as i64;
			if updated <= 0 {
				self.items.remove(pos);
			} else {
				item.quantity = updated as u32;
			}
		}
	}

	/// Removes the entry with the given item id, if present.
	pub fn remove(&mut self, item_id: &str) {
		self.items.retain(|i| i.item_id != item_id);
	}

	pub fn clear(&mut self) {
		self.items.clear();
	}

	/// Sum of line totals across the whole cart.
	pub fn total(&self) -> u64 {
		self.items.iter().map(CartItem::line_total).sum()
	}
}
