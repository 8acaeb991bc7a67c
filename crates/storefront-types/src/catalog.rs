//! Catalog types for vendor shops and their menu items.
//!
//! These mirror the `shops` and `items` collections produced to the
//! document store. Orders never reference these documents directly; line
//! items are snapshots taken at checkout.

use serde::{Deserialize, Serialize};

/// A vendor's shop. One per vendor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shop {
	/// Document id assigned by the store; attached by readers.
	#[serde(default)]
	pub id: String,
	pub vendor_id: String,
	pub shop_name: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub image_url: Option<String>,
	/// Menu categories. Grown automatically when an item introduces a
	/// category the shop has not seen before.
	#[serde(default)]
	pub categories: Vec<String>,
	pub created_at: u64,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub updated_at: Option<u64>,
}

/// One catalog item on a shop's menu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
	/// Document id assigned by the store; attached by readers.
	#[serde(default)]
	pub id: String,
	pub shop_id: String,
	pub vendor_id: String,
	pub name: String,
	/// Integer currency units.
	pub price: u64,
	pub category: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub image_url: Option<String>,
	pub created_at: u64,
}
