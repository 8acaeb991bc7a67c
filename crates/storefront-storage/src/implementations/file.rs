//! File-based storage backend.
//!
//! Stores each document as a JSON file under `<base>/<collection>/<id>`,
//! providing simple persistence without external dependencies. Writes go
//! through a temp file plus rename so a crash never leaves a torn
//! document behind.

use crate::{StorageError, StorageFactory, StorageInterface};
use async_trait::async_trait;
use std::path::PathBuf;
use storefront_types::{ConfigSchema, Field, FieldType, ImplementationRegistry, Schema, ValidationError};
use tokio::fs;

/// Default base directory when none is configured.
const DEFAULT_STORAGE_PATH: &str = "./data/storefront";

/// File-based storage implementation.
pub struct FileStorage {
	/// Base directory; one subdirectory per collection.
	base_path: PathBuf,
}

impl FileStorage {
	/// Creates a new FileStorage instance rooted at the given path.
	pub fn new(base_path: PathBuf) -> Self {
		Self { base_path }
	}

	/// Converts a document address to a filesystem-safe path.
	fn document_path(&self, collection: &str, id: &str) -> PathBuf {
		let safe_id = id.replace(['/', ':'], "_");
		self.base_path
			.join(collection)
			.join(format!("{}.json", safe_id))
	}

	fn collection_path(&self, collection: &str) -> PathBuf {
		self.base_path.join(collection)
	}
}

#[async_trait]
impl StorageInterface for FileStorage {
	async fn get_bytes(&self, collection: &str, id: &str) -> Result<Vec<u8>, StorageError> {
		let path = self.document_path(collection, id);
		match fs::read(&path).await {
			Ok(data) => Ok(data),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StorageError::NotFound),
			Err(e) => Err(StorageError::Backend(e.to_string())),
		}
	}

	async fn set_bytes(
		&self,
		collection: &str,
		id: &str,
		value: Vec<u8>,
	) -> Result<(), StorageError> {
		let path = self.document_path(collection, id);
		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent)
				.await
				.map_err(|e| StorageError::Backend(e.to_string()))?;
		}

		// Write atomically: temp file then rename.
		let temp_path = path.with_extension("tmp");
		fs::write(&temp_path, value)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;
		fs::rename(&temp_path, &path)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;

		Ok(())
	}

	async fn delete(&self, collection: &str, id: &str) -> Result<(), StorageError> {
		let path = self.document_path(collection, id);
		match fs::remove_file(&path).await {
			Ok(_) => Ok(()),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
			Err(e) => Err(StorageError::Backend(e.to_string())),
		}
	}

	async fn exists(&self, collection: &str, id: &str) -> Result<bool, StorageError> {
		Ok(self.document_path(collection, id).exists())
	}

	async fn scan(&self, collection: &str) -> Result<Vec<(String, Vec<u8>)>, StorageError> {
		let dir = self.collection_path(collection);
		let mut entries = match fs::read_dir(&dir).await {
			Ok(entries) => entries,
			// A collection nobody has written to yet is simply empty.
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
			Err(e) => return Err(StorageError::Backend(e.to_string())),
		};

		let mut documents = Vec::new();
		while let Some(entry) = entries
			.next_entry()
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?
		{
			let path = entry.path();
			if path.extension() != Some(std::ffi::OsStr::new("json")) {
				continue;
			}
			let id = match path.file_stem().and_then(|s| s.to_str()) {
				Some(stem) => stem.to_string(),
				None => continue,
			};
			match fs::read(&path).await {
				Ok(bytes) => documents.push((id, bytes)),
				Err(e) => {
					tracing::debug!("Skipping file {:?}: could not be read: {}", path, e);
				}
			}
		}
		Ok(documents)
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(FileStorageSchema)
	}
}

/// Configuration schema for FileStorage.
pub struct FileStorageSchema;

impl ConfigSchema for FileStorageSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		Schema::new(
			vec![],
			vec![Field::new("storage_path", FieldType::String)],
		)
		.validate(config)
	}
}

/// Registry entry for the file backend.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "file";
	type Factory = StorageFactory;

	fn factory() -> Self::Factory {
		create_storage
	}
}

impl crate::StorageRegistry for Registry {}

/// Factory function to create a file storage backend from configuration.
///
/// Configuration parameters:
/// - `storage_path`: base directory for document files (default:
///   "./data/storefront")
pub fn create_storage(config: &toml::Value) -> Result<Box<dyn StorageInterface>, StorageError> {
	let storage_path = config
		.get("storage_path")
		.and_then(|v| v.as_str())
		.unwrap_or(DEFAULT_STORAGE_PATH)
		.to_string();

	Ok(Box::new(FileStorage::new(PathBuf::from(storage_path))))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn test_round_trip_and_delete() {
		let dir = tempfile::tempdir().unwrap();
		let storage = FileStorage::new(dir.path().to_path_buf());

		storage
			.set_bytes("orders", "abc", b"{\"x\":1}".to_vec())
			.await
			.unwrap();
		assert!(storage.exists("orders", "abc").await.unwrap());
		assert_eq!(
			storage.get_bytes("orders", "abc").await.unwrap(),
			b"{\"x\":1}"
		);

		storage.delete("orders", "abc").await.unwrap();
		assert!(matches!(
			storage.get_bytes("orders", "abc").await,
			Err(StorageError::NotFound)
		));
		// Idempotent delete
		storage.delete("orders", "abc").await.unwrap();
	}

	#[tokio::test]
	async fn test_scan_returns_all_documents() {
		let dir = tempfile::tempdir().unwrap();
		let storage = FileStorage::new(dir.path().to_path_buf());

		storage.set_bytes("items", "a", b"1".to_vec()).await.unwrap();
		storage.set_bytes("items", "b", b"2".to_vec()).await.unwrap();

		let mut ids: Vec<String> = storage
			.scan("items")
			.await
			.unwrap()
			.into_iter()
			.map(|(id, _)| id)
			.collect();
		ids.sort();
		assert_eq!(ids, vec!["a", "b"]);
		assert!(storage.scan("orders").await.unwrap().is_empty());
	}

	#[tokio::test]
	async fn test_data_survives_reopen() {
		let dir = tempfile::tempdir().unwrap();
		{
			let storage = FileStorage::new(dir.path().to_path_buf());
			storage
				.set_bytes("users", "u1", b"profile".to_vec())
				.await
				.unwrap();
		}
		let reopened = FileStorage::new(dir.path().to_path_buf());
		assert_eq!(reopened.get_bytes("users", "u1").await.unwrap(), b"profile");
	}
}
