//! Builder pattern for constructing storefront engines.
//!
//! Composes a [`StorefrontEngine`] from pluggable backend factories:
//! storage backends and identity backends are resolved by the names the
//! configuration references, validated against their schemas, and wired
//! together with the shared services.

use crate::engine::StorefrontEngine;
use crate::event_bus::EventBus;
use std::collections::HashMap;
use std::sync::Arc;
use storefront_auth::{AuthError, AuthInterface, AuthService};
use storefront_catalog::{CatalogService, HttpImageUploader, ImageUploader};
use storefront_config::Config;
use storefront_storage::{StorageError, StorageInterface, StorageService};
use thiserror::Error;

/// Errors that can occur during engine construction.
#[derive(Debug, Error)]
pub enum BuilderError {
	#[error("Configuration error: {0}")]
	Config(String),
	#[error("Missing required component: {0}")]
	MissingComponent(String),
}

/// Container for the factory functions needed to build an engine.
pub struct StorefrontFactories<SF, AF> {
	pub storage_factories: HashMap<String, SF>,
	pub auth_factories: HashMap<String, AF>,
}

/// Builder for constructing a StorefrontEngine with pluggable backends.
pub struct StorefrontBuilder {
	config: Config,
}

impl StorefrontBuilder {
	/// Creates a new StorefrontBuilder with the given configuration.
	pub fn new(config: Config) -> Self {
		Self { config }
	}

	/// Builds the StorefrontEngine using factories for each component.
	pub async fn build<SF, AF>(
		self,
		factories: StorefrontFactories<SF, AF>,
	) -> Result<StorefrontEngine, BuilderError>
	where
		SF: Fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError>,
		AF: Fn(&toml::Value, Arc<StorageService>) -> Result<Box<dyn AuthInterface>, AuthError>,
	{
		// Storage first; everything else hangs off it.
		let primary_storage = &self.config.storage.primary;
		let storage_config = self
			.config
			.storage
			.implementations
			.get(primary_storage)
			.ok_or_else(|| {
				BuilderError::MissingComponent(format!(
					"storage implementation '{}'",
					primary_storage
				))
			})?;
		let storage_factory = factories
			.storage_factories
			.get(primary_storage)
			.ok_or_else(|| {
				BuilderError::MissingComponent(format!("storage factory '{}'", primary_storage))
			})?;
		let backend = storage_factory(storage_config).map_err(|e| {
			BuilderError::Config(format!(
				"Failed to create storage implementation '{}': {}",
				primary_storage, e
			))
		})?;
		backend
			.config_schema()
			.validate(storage_config)
			.map_err(|e| {
				BuilderError::Config(format!(
					"Invalid configuration for storage '{}': {}",
					primary_storage, e
				))
			})?;
		tracing::info!(component = "storage", implementation = %primary_storage, "Loaded");
		let storage = Arc::new(StorageService::new(backend));

		// Identity backend.
		let primary_auth = &self.config.auth.primary;
		let auth_config = self
			.config
			.auth
			.implementations
			.get(primary_auth)
			.ok_or_else(|| {
				BuilderError::MissingComponent(format!("auth implementation '{}'", primary_auth))
			})?;
		let auth_factory = factories.auth_factories.get(primary_auth).ok_or_else(|| {
			BuilderError::MissingComponent(format!("auth factory '{}'", primary_auth))
		})?;
		let auth_backend = auth_factory(auth_config, Arc::clone(&storage)).map_err(|e| {
			BuilderError::Config(format!(
				"Failed to create auth implementation '{}': {}",
				primary_auth, e
			))
		})?;
		auth_backend.config_schema().validate(auth_config).map_err(|e| {
			BuilderError::Config(format!(
				"Invalid configuration for auth '{}': {}",
				primary_auth, e
			))
		})?;
		tracing::info!(component = "auth", implementation = %primary_auth, "Loaded");
		let auth = Arc::new(AuthService::new(auth_backend, Arc::clone(&storage)));

		let catalog = Arc::new(CatalogService::new(Arc::clone(&storage)));

		// Optional external upload endpoint.
		let uploader: Option<Arc<dyn ImageUploader>> = self.config.upload.as_ref().map(|upload| {
			tracing::info!(component = "upload", endpoint = %upload.endpoint, "Loaded");
			Arc::new(HttpImageUploader::new(
				upload.endpoint.clone(),
				upload.api_key.clone(),
			)) as Arc<dyn ImageUploader>
		});

		Ok(StorefrontEngine::new(
			self.config,
			storage,
			auth,
			catalog,
			uploader,
			EventBus::default(),
		))
	}
}
