//! Storage module for the storefront system.
//!
//! This module provides the document-store abstraction the rest of the
//! system is written against: collection/id addressed documents, whole-
//! document writes, collection scans, and a change-notification stream
//! that live queries are built on. Backends are pluggable; in-memory and
//! file-based implementations ship here.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use storefront_types::{Collection, ConfigSchema, ImplementationRegistry};
use thiserror::Error;
use tokio::sync::broadcast;

/// Re-export implementations
pub mod implementations {
	pub mod file;
	pub mod memory;
}

/// Capacity of the change-notification channel. Slow observers that fall
/// further behind than this re-derive from a fresh scan, so lagging is
/// harmless.
const CHANGE_CHANNEL_CAPACITY: usize = 256;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
	/// A requested document does not exist.
	#[error("Not found")]
	NotFound,
	/// A document could not be serialized or deserialized.
	#[error("Serialization error: {0}")]
	Serialization(String),
	/// The storage backend failed.
	#[error("Backend error: {0}")]
	Backend(String),
	/// The backend configuration is invalid.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Trait defining the low-level interface for storage backends.
///
/// Backends store opaque bytes addressed by (collection, id) and support
/// scanning a whole collection. They know nothing about document shapes
/// or change notification; both live in [`StorageService`].
#[async_trait]
pub trait StorageInterface: Send + Sync {
	/// Retrieves the raw bytes of one document.
	async fn get_bytes(&self, collection: &str, id: &str) -> Result<Vec<u8>, StorageError>;

	/// Stores raw bytes, replacing any existing document.
	async fn set_bytes(&self, collection: &str, id: &str, value: Vec<u8>)
		-> Result<(), StorageError>;

	/// Deletes a document. Deleting a missing document is not an error.
	async fn delete(&self, collection: &str, id: &str) -> Result<(), StorageError>;

	/// Checks whether a document exists.
	async fn exists(&self, collection: &str, id: &str) -> Result<bool, StorageError>;

	/// Returns every (id, bytes) pair in a collection. Order is
	/// unspecified; callers sort on their own keys.
	async fn scan(&self, collection: &str) -> Result<Vec<(String, Vec<u8>)>, StorageError>;

	/// Returns the configuration schema for validation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;
}

/// Type alias for storage factory functions.
pub type StorageFactory = fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError>;

/// Registry trait for storage implementations.
pub trait StorageRegistry: ImplementationRegistry<Factory = StorageFactory> {}

/// Get all registered storage implementations.
///
/// Returns (name, factory) tuples for every available backend, used by
/// the builder to resolve the configured implementation by name.
pub fn get_all_implementations() -> Vec<(&'static str, StorageFactory)> {
	use implementations::{file, memory};

	vec![
		(file::Registry::NAME, file::Registry::factory()),
		(memory::Registry::NAME, memory::Registry::factory()),
	]
}

/// A change notification emitted after every successful write or delete.
///
/// Carries only the location of the change, never the data: subscribers
/// re-read the store and treat each fresh result set as authoritative
/// and total, so duplicate or coalesced notifications cannot cause
/// drift.
#[derive(Debug, Clone)]
pub struct StoreChange {
	pub collection: Collection,
	pub id: String,
}

/// High-level storage service providing typed document operations.
///
/// Wraps a low-level backend with JSON (de)serialization, store-assigned
/// document ids, and the change broadcast that live queries subscribe
/// to. All writes in the system go through this service, so the
/// broadcast sees every mutation.
pub struct StorageService {
	/// The underlying storage backend implementation.
	backend: Box<dyn StorageInterface>,
	/// Change notifications fan out to all live queries.
	changes: broadcast::Sender<StoreChange>,
}

impl StorageService {
	/// Creates a new StorageService with the specified backend.
	pub fn new(backend: Box<dyn StorageInterface>) -> Self {
		let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
		Self { backend, changes }
	}

	/// Subscribes to change notifications for all collections.
	pub fn watch(&self) -> broadcast::Receiver<StoreChange> {
		self.changes.subscribe()
	}

	fn notify(&self, collection: Collection, id: &str) {
		// No subscribers is fine; live queries come and go.
		let _ = self.changes.send(StoreChange {
			collection,
			id: id.to_string(),
		});
	}

	/// Creates a document with a store-assigned id and returns the id.
	///
	/// The id is not embedded in the stored body; readers attach it from
	/// the document key.
	pub async fn create<T: Serialize>(
		&self,
		collection: Collection,
		data: &T,
	) -> Result<String, StorageError> {
		let id = uuid::Uuid::new_v4().to_string();
		self.store(collection, &id, data).await?;
		Ok(id)
	}

	/// Stores a document under an explicit id, creating or replacing it.
	pub async fn store<T: Serialize>(
		&self,
		collection: Collection,
		id: &str,
		data: &T,
	) -> Result<(), StorageError> {
		let bytes =
			serde_json::to_vec(data).map_err(|e| StorageError::Serialization(e.to_string()))?;
		self.backend.set_bytes(collection.as_str(), id, bytes).await?;
		self.notify(collection, id);
		Ok(())
	}

	/// Retrieves and deserializes one document.
	pub async fn retrieve<T: DeserializeOwned>(
		&self,
		collection: Collection,
		id: &str,
	) -> Result<T, StorageError> {
		let bytes = self.backend.get_bytes(collection.as_str(), id).await?;
		serde_json::from_slice(&bytes).map_err(|e| StorageError::Serialization(e.to_string()))
	}

	/// Retrieves every document in a collection as (id, value) pairs.
	///
	/// Documents that fail to deserialize (legacy shapes) are skipped
	/// with a warning rather than failing the whole scan.
	pub async fn retrieve_all<T: DeserializeOwned>(
		&self,
		collection: Collection,
	) -> Result<Vec<(String, T)>, StorageError> {
		let raw = self.backend.scan(collection.as_str()).await?;
		let mut documents = Vec::with_capacity(raw.len());
		for (id, bytes) in raw {
			match serde_json::from_slice(&bytes) {
				Ok(value) => documents.push((id, value)),
				Err(e) => {
					tracing::warn!(
						collection = collection.as_str(),
						document = %id,
						error = %e,
						"Skipping undecodable document"
					);
				}
			}
		}
		Ok(documents)
	}

	/// Replaces an existing document.
	///
	/// Unlike [`StorageService::store`], this fails with
	/// [`StorageError::NotFound`] if the document does not exist.
	pub async fn update<T: Serialize>(
		&self,
		collection: Collection,
		id: &str,
		data: &T,
	) -> Result<(), StorageError> {
		if !self.backend.exists(collection.as_str(), id).await? {
			return Err(StorageError::NotFound);
		}
		self.store(collection, id, data).await
	}

	/// Removes a document.
	pub async fn remove(&self, collection: Collection, id: &str) -> Result<(), StorageError> {
		self.backend.delete(collection.as_str(), id).await?;
		self.notify(collection, id);
		Ok(())
	}

	/// Checks whether a document exists.
	pub async fn exists(&self, collection: Collection, id: &str) -> Result<bool, StorageError> {
		self.backend.exists(collection.as_str(), id).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::implementations::memory::MemoryStorage;
	use serde::Deserialize;

	#[derive(Debug, PartialEq, Serialize, Deserialize)]
	struct Doc {
		value: u32,
	}

	fn service() -> StorageService {
		StorageService::new(Box::new(MemoryStorage::new()))
	}

	#[tokio::test]
	async fn create_assigns_distinct_ids() {
		let storage = service();
		let a = storage
			.create(Collection::Orders, &Doc { value: 1 })
			.await
			.unwrap();
		let b = storage
			.create(Collection::Orders, &Doc { value: 2 })
			.await
			.unwrap();
		assert_ne!(a, b);

		let docs: Vec<(String, Doc)> = storage.retrieve_all(Collection::Orders).await.unwrap();
		assert_eq!(docs.len(), 2);
	}

	#[tokio::test]
	async fn update_requires_existing_document() {
		let storage = service();
		let err = storage
			.update(Collection::Orders, "missing", &Doc { value: 1 })
			.await
			.unwrap_err();
		assert!(matches!(err, StorageError::NotFound));
	}

	#[tokio::test]
	async fn writes_emit_change_notifications() {
		let storage = service();
		let mut changes = storage.watch();

		let id = storage
			.create(Collection::Orders, &Doc { value: 1 })
			.await
			.unwrap();
		let change = changes.recv().await.unwrap();
		assert_eq!(change.collection, Collection::Orders);
		assert_eq!(change.id, id);

		storage.remove(Collection::Orders, &id).await.unwrap();
		let change = changes.recv().await.unwrap();
		assert_eq!(change.id, id);
	}

	#[tokio::test]
	async fn undecodable_documents_are_skipped_in_scans() {
		let storage = service();
		storage
			.store(Collection::Orders, "good", &Doc { value: 7 })
			.await
			.unwrap();
		storage
			.backend
			.set_bytes("orders", "bad", b"not json".to_vec())
			.await
			.unwrap();

		let docs: Vec<(String, Doc)> = storage.retrieve_all(Collection::Orders).await.unwrap();
		assert_eq!(docs, vec![("good".to_string(), Doc { value: 7 })]);
	}
}
