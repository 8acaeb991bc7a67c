//! Client-local cart persistence.
//!
//! The cart is the only state that survives a reload without a network
//! round trip. It is serialized as JSON into a single fixed slot in a
//! client-local directory; it never touches the document store.

use std::path::{Path, PathBuf};
use storefront_types::Cart;
use thiserror::Error;

/// Fixed name of the cart slot.
pub const CART_SLOT: &str = "storefront-cart.json";

/// Errors that can occur while persisting the cart.
#[derive(Debug, Error)]
pub enum CartStoreError {
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	#[error("Serialization error: {0}")]
	Serialization(String),
}

/// File-backed cart slot.
pub struct CartStore {
	path: PathBuf,
}

impl CartStore {
	/// Creates a cart store rooted in the given directory.
	pub fn new(dir: impl AsRef<Path>) -> Self {
		Self {
			path: dir.as_ref().join(CART_SLOT),
		}
	}

	/// Loads the persisted cart.
	///
	/// A missing or unreadable slot yields an empty cart, same as a
	/// first visit.
	pub fn load(&self) -> Cart {
		match std::fs::read(&self.path) {
			Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_default(),
			Err(_) => Cart::default(),
		}
	}

	/// Persists the cart, replacing the previous slot contents.
	pub fn save(&self, cart: &Cart) -> Result<(), CartStoreError> {
		if let Some(parent) = self.path.parent() {
			std::fs::create_dir_all(parent)?;
		}
		let bytes = serde_json::to_vec(cart)
			.map_err(|e| CartStoreError::Serialization(e.to_string()))?;
		std::fs::write(&self.path, bytes)?;
		Ok(())
	}

	/// Empties the slot.
	pub fn clear(&self) -> Result<(), CartStoreError> {
		self.save(&Cart::default())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use storefront_types::CartItem;

	fn item() -> CartItem {
		CartItem {
			item_id: "a".into(),
			name: "Item".into(),
			unit_price: 250,
			quantity: 2,
			vendor_id: Some("v1".into()),
			vendor_name: Some("Shop".into()),
			category: "Mains".into(),
			image_ref: None,
		}
	}

	#[test]
	fn round_trips_through_the_slot() {
		let dir = tempfile::tempdir().unwrap();
		let store = CartStore::new(dir.path());

		let mut cart = Cart::new();
		cart.add(item());
		store.save(&cart).unwrap();

		let loaded = store.load();
		assert_eq!(loaded, cart);
	}

	#[test]
	fn missing_slot_loads_an_empty_cart() {
		let dir = tempfile::tempdir().unwrap();
		let store = CartStore::new(dir.path());
		assert!(store.load().is_empty());
	}

	#[test]
	fn corrupt_slot_loads_an_empty_cart() {
		let dir = tempfile::tempdir().unwrap();
		std::fs::write(dir.path().join(CART_SLOT), b"{not json").unwrap();
		let store = CartStore::new(dir.path());
		assert!(store.load().is_empty());
	}

	#[test]
	fn clear_empties_the_slot() {
		let dir = tempfile::tempdir().unwrap();
		let store = CartStore::new(dir.path());
		let mut cart = Cart::new();
		cart.add(item());
		store.save(&cart).unwrap();
		store.clear().unwrap();
		assert!(store.load().is_empty());
	}
}
