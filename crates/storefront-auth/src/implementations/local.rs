//! Local identity backend.
//!
//! Keeps credential records, profile documents, and bearer-token
//! sessions in the document store. Passwords are stored as salted SHA3
//! digests; tokens are random UUIDs.

use crate::{AuthError, AuthFactory, AuthInterface, AuthSession};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};
use std::sync::Arc;
use storefront_storage::{StorageError, StorageService};
use storefront_types::{
	current_timestamp, Collection, ConfigSchema, ImplementationRegistry, Role, Schema,
	SecretString, UserProfile, ValidationError,
};

/// Stored credential record, keyed by normalized email.
#[derive(Debug, Serialize, Deserialize)]
struct CredentialRecord {
	uid: String,
	email: String,
	digest: String,
	salt: String,
	created_at: u64,
}

/// Stored session record, keyed by token.
#[derive(Debug, Serialize, Deserialize)]
struct SessionRecord {
	uid: String,
	issued_at: u64,
}

/// Local identity implementation.
pub struct LocalAuth {
	storage: Arc<StorageService>,
}

impl LocalAuth {
	pub fn new(storage: Arc<StorageService>) -> Self {
		Self { storage }
	}

	fn email_key(email: &str) -> String {
		email.trim().to_lowercase()
	}

	fn digest(salt: &str, password: &SecretString) -> String {
		let mut hasher = Sha3_256::new();
		hasher.update(salt.as_bytes());
		hasher.update(password.expose_secret().as_bytes());
		hex::encode(hasher.finalize())
	}

	async fn open_session(&self, uid: &str) -> Result<String, AuthError> {
		let token = uuid::Uuid::new_v4().to_string();
		let record = SessionRecord {
			uid: uid.to_string(),
			issued_at: current_timestamp(),
		};
		self.storage
			.store(Collection::Sessions, &token, &record)
			.await?;
		Ok(token)
	}

	async fn load_profile(&self, uid: &str) -> Result<UserProfile, AuthError> {
		match self
			.storage
			.retrieve::<UserProfile>(Collection::Users, uid)
			.await
		{
			Ok(profile) => Ok(profile),
			Err(StorageError::NotFound) => Err(AuthError::ProfileNotFound(uid.to_string())),
			Err(e) => Err(e.into()),
		}
	}

	async fn set_presence(&self, uid: &str, online: bool) -> Result<UserProfile, AuthError> {
		let mut profile = self.load_profile(uid).await?;
		profile.is_online = online;
		self.storage
			.update(Collection::Users, uid, &profile)
			.await?;
		Ok(profile)
	}
}

#[async_trait]
impl AuthInterface for LocalAuth {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(LocalAuthSchema)
	}

	async fn sign_up(
		&self,
		email: &str,
		password: &SecretString,
		role: Role,
	) -> Result<AuthSession, AuthError> {
		let key = Self::email_key(email);
		if key.is_empty() || password.is_empty() {
			return Err(AuthError::InvalidCredentials);
		}
		if self.storage.exists(Collection::Credentials, &key).await? {
			return Err(AuthError::EmailTaken(email.to_string()));
		}

		let uid = uuid::Uuid::new_v4().to_string();
		let salt = uuid::Uuid::new_v4().to_string();
		let now = current_timestamp();

		let profile = UserProfile {
			uid: uid.clone(),
			email: email.trim().to_string(),
			display_name: None,
			photo_url: None,
			role,
			// Customers can buy immediately; vendors wait for admin
			// approval before their shop goes public.
			is_verified: role == Role::Customer,
			is_online: true,
			phone_number: None,
			default_address: None,
			created_at: now,
			updated_at: None,
		};
		self.storage
			.store(Collection::Users, &uid, &profile)
			.await?;

		let record = CredentialRecord {
			uid: uid.clone(),
			email: key.clone(),
			digest: Self::digest(&salt, password),
			salt,
			created_at: now,
		};
		self.storage
			.store(Collection::Credentials, &key, &record)
			.await?;

		let token = self.open_session(&uid).await?;
		tracing::info!(uid = %uid, role = %role, "Account created");
		Ok(AuthSession {
			token,
			user: profile,
		})
	}

	async fn sign_in(
		&self,
		email: &str,
		password: &SecretString,
	) -> Result<AuthSession, AuthError> {
		let key = Self::email_key(email);
		let record = match self
			.storage
			.retrieve::<CredentialRecord>(Collection::Credentials, &key)
			.await
		{
			Ok(record) => record,
			Err(StorageError::NotFound) => return Err(AuthError::InvalidCredentials),
			Err(e) => return Err(e.into()),
		};

		if Self::digest(&record.salt, password) != record.digest {
			return Err(AuthError::InvalidCredentials);
		}

		let user = self.set_presence(&record.uid, true).await?;
		let token = self.open_session(&record.uid).await?;
		tracing::info!(uid = %record.uid, "Signed in");
		Ok(AuthSession { token, user })
	}

	async fn sign_out(&self, token: &str) -> Result<(), AuthError> {
		let record = match self
			.storage
			.retrieve::<SessionRecord>(Collection::Sessions, token)
			.await
		{
			Ok(record) => record,
			// Already signed out; nothing to do.
			Err(StorageError::NotFound) => return Ok(()),
			Err(e) => return Err(e.into()),
		};

		self.set_presence(&record.uid, false).await?;
		self.storage.remove(Collection::Sessions, token).await?;
		tracing::info!(uid = %record.uid, "Signed out");
		Ok(())
	}

	async fn authenticate(&self, token: &str) -> Result<UserProfile, AuthError> {
		let record = match self
			.storage
			.retrieve::<SessionRecord>(Collection::Sessions, token)
			.await
		{
			Ok(record) => record,
			Err(StorageError::NotFound) => return Err(AuthError::InvalidToken),
			Err(e) => return Err(e.into()),
		};
		self.load_profile(&record.uid).await
	}
}

/// Configuration schema for LocalAuth.
pub struct LocalAuthSchema;

impl ConfigSchema for LocalAuthSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		// Local auth has no required configuration
		Schema::new(vec![], vec![]).validate(config)
	}
}

/// Registry entry for the local identity backend.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "local";
	type Factory = AuthFactory;

	fn factory() -> Self::Factory {
		create_auth
	}
}

impl crate::AuthRegistry for Registry {}

/// Factory function to create the local identity backend.
///
/// Configuration parameters: none.
pub fn create_auth(
	_config: &toml::Value,
	storage: Arc<StorageService>,
) -> Result<Box<dyn AuthInterface>, AuthError> {
	Ok(Box::new(LocalAuth::new(storage)))
}

#[cfg(test)]
mod tests {
	use super::*;
	use storefront_storage::implementations::memory::MemoryStorage;

	fn backend() -> (LocalAuth, Arc<StorageService>) {
		let storage = Arc::new(StorageService::new(Box::new(MemoryStorage::new())));
		(LocalAuth::new(Arc::clone(&storage)), storage)
	}

	#[tokio::test]
	async fn sign_up_then_sign_in_round_trips() {
		let (auth, _) = backend();
		let password = SecretString::from("swordfish");

		let created = auth
			.sign_up("dana@example.com", &password, Role::Customer)
			.await
			.unwrap();
		assert!(created.user.is_verified);
		assert!(created.user.is_online);

		let session = auth.sign_in("Dana@Example.com", &password).await.unwrap();
		assert_eq!(session.user.uid, created.user.uid);

		let user = auth.authenticate(&session.token).await.unwrap();
		assert_eq!(user.email, "dana@example.com");
	}

	#[tokio::test]
	async fn vendors_start_unverified() {
		let (auth, _) = backend();
		let session = auth
			.sign_up("shop@example.com", &SecretString::from("pw"), Role::Vendor)
			.await
			.unwrap();
		assert!(!session.user.is_verified);
	}

	#[tokio::test]
	async fn duplicate_email_is_rejected() {
		let (auth, _) = backend();
		let password = SecretString::from("pw");
		auth.sign_up("x@y.z", &password, Role::Customer)
			.await
			.unwrap();
		let err = auth
			.sign_up("X@Y.Z", &password, Role::Customer)
			.await
			.unwrap_err();
		assert!(matches!(err, AuthError::EmailTaken(_)));
	}

	#[tokio::test]
	async fn wrong_password_is_invalid_credentials() {
		let (auth, _) = backend();
		auth.sign_up("x@y.z", &SecretString::from("right"), Role::Customer)
			.await
			.unwrap();
		let err = auth
			.sign_in("x@y.z", &SecretString::from("wrong"))
			.await
			.unwrap_err();
		assert!(matches!(err, AuthError::InvalidCredentials));
	}

	#[tokio::test]
	async fn sign_out_clears_presence_and_invalidates_token() {
		let (auth, _) = backend();
		let session = auth
			.sign_up("x@y.z", &SecretString::from("pw"), Role::Customer)
			.await
			.unwrap();

		auth.sign_out(&session.token).await.unwrap();
		let profile = auth.load_profile(&session.user.uid).await.unwrap();
		assert!(!profile.is_online);
		assert!(matches!(
			auth.authenticate(&session.token).await,
			Err(AuthError::InvalidToken)
		));
		// Idempotent
		auth.sign_out(&session.token).await.unwrap();
	}
}
