//! In-memory storage backend.
//!
//! Stores documents in nested HashMaps, useful for tests and development
//! where persistence is not required.

use crate::{StorageError, StorageFactory, StorageInterface};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use storefront_types::{ConfigSchema, ImplementationRegistry, Schema, ValidationError};
use tokio::sync::RwLock;

/// In-memory storage implementation.
///
/// Documents live in a collection → id → bytes map behind a read-write
/// lock. Fast, but nothing survives a restart.
pub struct MemoryStorage {
	store: Arc<RwLock<HashMap<String, HashMap<String, Vec<u8>>>>>,
}

impl MemoryStorage {
	/// Creates a new MemoryStorage instance.
	pub fn new() -> Self {
		Self {
			store: Arc::new(RwLock::new(HashMap::new())),
		}
	}
}

impl Default for MemoryStorage {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl StorageInterface for MemoryStorage {
	async fn get_bytes(&self, collection: &str, id: &str) -> Result<Vec<u8>, StorageError> {
		let store = self.store.read().await;
		store
			.get(collection)
			.and_then(|docs| docs.get(id))
			.cloned()
			.ok_or(StorageError::NotFound)
	}

	async fn set_bytes(
		&self,
		collection: &str,
		id: &str,
		value: Vec<u8>,
	) -> Result<(), StorageError> {
		let mut store = self.store.write().await;
		store
			.entry(collection.to_string())
			.or_default()
			.insert(id.to_string(), value);
		Ok(())
	}

	async fn delete(&self, collection: &str, id: &str) -> Result<(), StorageError> {
		let mut store = self.store.write().await;
		if let Some(docs) = store.get_mut(collection) {
			docs.remove(id);
		}
		Ok(())
	}

	async fn exists(&self, collection: &str, id: &str) -> Result<bool, StorageError> {
		let store = self.store.read().await;
		Ok(store
			.get(collection)
			.is_some_and(|docs| docs.contains_key(id)))
	}

	async fn scan(&self, collection: &str) -> Result<Vec<(String, Vec<u8>)>, StorageError> {
		let store = self.store.read().await;
		Ok(store
			.get(collection)
			.map(|docs| {
				docs.iter()
					.map(|(id, bytes)| (id.clone(), bytes.clone()))
					.collect()
			})
			.unwrap_or_default())
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(MemoryStorageSchema)
	}
}

/// Configuration schema for MemoryStorage.
pub struct MemoryStorageSchema;

impl ConfigSchema for MemoryStorageSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		// Memory storage has no required configuration
		Schema::new(vec![], vec![]).validate(config)
	}
}

/// Registry entry for the memory backend.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "memory";
	type Factory = StorageFactory;

	fn factory() -> Self::Factory {
		create_storage
	}
}

impl crate::StorageRegistry for Registry {}

/// Factory function to create a memory storage backend.
///
/// Configuration parameters: none.
pub fn create_storage(_config: &toml::Value) -> Result<Box<dyn StorageInterface>, StorageError> {
	Ok(Box::new(MemoryStorage::new()))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn test_basic_operations() {
		let storage = MemoryStorage::new();

		storage
			.set_bytes("orders", "a", b"payload".to_vec())
			.await
			.unwrap();
		assert_eq!(storage.get_bytes("orders", "a").await.unwrap(), b"payload");
		assert!(storage.exists("orders", "a").await.unwrap());

		storage.delete("orders", "a").await.unwrap();
		assert!(!storage.exists("orders", "a").await.unwrap());
		let result = storage.get_bytes("orders", "a").await;
		assert!(matches!(result, Err(StorageError::NotFound)));
	}

	#[tokio::test]
	async fn test_scan_is_scoped_to_collection() {
		let storage = MemoryStorage::new();
		storage.set_bytes("orders", "a", b"1".to_vec()).await.unwrap();
		storage.set_bytes("orders", "b", b"2".to_vec()).await.unwrap();
		storage.set_bytes("users", "c", b"3".to_vec()).await.unwrap();

		let mut ids: Vec<String> = storage
			.scan("orders")
			.await
			.unwrap()
			.into_iter()
			.map(|(id, _)| id)
			.collect();
		ids.sort();
		assert_eq!(ids, vec!["a", "b"]);
		assert!(storage.scan("missing").await.unwrap().is_empty());
	}

	#[tokio::test]
	async fn test_overwrite() {
		let storage = MemoryStorage::new();
		storage.set_bytes("orders", "a", b"old".to_vec()).await.unwrap();
		storage.set_bytes("orders", "a", b"new".to_vec()).await.unwrap();
		assert_eq!(storage.get_bytes("orders", "a").await.unwrap(), b"new");
	}
}
