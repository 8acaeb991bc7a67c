//! Configuration module for the storefront system.
//!
//! Loads the service configuration from a TOML file and validates that
//! the pieces reference each other consistently (e.g. the configured
//! primary storage backend actually has an implementation table).

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use storefront_types::SecretString;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// File I/O failed.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// The TOML could not be parsed.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// The parsed configuration is inconsistent.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		ConfigError::Parse(err.message().to_string())
	}
}

/// Main configuration structure for the storefront service.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	/// Identity of this storefront instance.
	pub storefront: StorefrontConfig,
	/// Storage backend configuration.
	pub storage: StorageConfig,
	/// Identity provider configuration.
	pub auth: AuthConfig,
	/// HTTP API server configuration.
	pub api: Option<ApiConfig>,
	/// External image-upload endpoint configuration.
	pub upload: Option<UploadConfig>,
}

/// Configuration specific to the storefront instance.
#[derive(Debug, Clone, Deserialize)]
pub struct StorefrontConfig {
	/// Name shown in logs and API metadata.
	pub name: String,
}

/// Configuration for the storage backend.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of backend names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

/// Configuration for the identity provider.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of backend names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

/// Configuration for the HTTP API server.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
	#[serde(default = "default_api_enabled")]
	pub enabled: bool,
	#[serde(default = "default_api_host")]
	pub host: String,
	#[serde(default = "default_api_port")]
	pub port: u16,
}

fn default_api_enabled() -> bool {
	true
}

fn default_api_host() -> String {
	"127.0.0.1".to_string()
}

fn default_api_port() -> u16 {
	8080
}

/// Configuration for the external image-upload endpoint.
///
/// The endpoint contract is: accept a multipart image, return a stable
/// URL, or fail.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
	/// Upload endpoint URL.
	pub endpoint: String,
	/// API key passed as the `key` query parameter, if the host needs
	/// one.
	pub api_key: Option<SecretString>,
}

impl Config {
	/// Loads and validates configuration from a TOML file.
	pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let raw = std::fs::read_to_string(path)?;
		Self::from_toml_str(&raw)
	}

	/// Parses and validates configuration from a TOML string.
	pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
		let config: Config = toml::from_str(raw)?;
		config.validate()?;
		Ok(config)
	}

	/// Checks cross-field consistency.
	fn validate(&self) -> Result<(), ConfigError> {
		if self.storefront.name.trim().is_empty() {
			return Err(ConfigError::Validation(
				"storefront.name must not be empty".to_string(),
			));
		}
		if !self
			.storage
			.implementations
			.contains_key(&self.storage.primary)
		{
			return Err(ConfigError::Validation(format!(
				"storage.primary '{}' has no implementation table",
				self.storage.primary
			)));
		}
		if !self.auth.implementations.contains_key(&self.auth.primary) {
			return Err(ConfigError::Validation(format!(
				"auth.primary '{}' has no implementation table",
				self.auth.primary
			)));
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	const VALID: &str = r#"
[storefront]
name = "storefront-dev"

[storage]
primary = "memory"

[storage.implementations.memory]

[auth]
primary = "local"

[auth.implementations.local]

[api]
host = "0.0.0.0"
port = 9090

[upload]
endpoint = "https://upload.example/api"
api_key = "k-123"
"#;

	#[test]
	fn loads_a_valid_config() {
		let config = Config::from_toml_str(VALID).unwrap();
		assert_eq!(config.storefront.name, "storefront-dev");
		assert_eq!(config.storage.primary, "memory");
		let api = config.api.unwrap();
		assert!(api.enabled);
		assert_eq!(api.port, 9090);
		let upload = config.upload.unwrap();
		assert_eq!(upload.api_key.unwrap().expose_secret(), "k-123");
	}

	#[test]
	fn loads_from_a_file() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		file.write_all(VALID.as_bytes()).unwrap();
		let config = Config::from_file(file.path()).unwrap();
		assert_eq!(config.auth.primary, "local");
	}

	#[test]
	fn rejects_primary_without_implementation() {
		let raw = r#"
[storefront]
name = "s"

[storage]
primary = "file"

[storage.implementations.memory]

[auth]
primary = "local"

[auth.implementations.local]
"#;
		let err = Config::from_toml_str(raw).unwrap_err();
		assert!(matches!(err, ConfigError::Validation(_)));
	}

	#[test]
	fn rejects_malformed_toml() {
		let err = Config::from_toml_str("storefront = ").unwrap_err();
		assert!(matches!(err, ConfigError::Parse(_)));
	}
}
