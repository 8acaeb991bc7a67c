//! Identity module for the storefront system.
//!
//! This module abstracts the hosted identity provider the storefront
//! consumes: account creation, sign-in/out, bearer-token authentication,
//! an auth-state stream, and the `users/{uid}` profile documents (role,
//! verification flag, presence flag, contact fields). A local
//! implementation backed by the document store ships here.

use async_trait::async_trait;
use std::sync::Arc;
use storefront_storage::{StorageError, StorageService};
use storefront_types::{
	current_timestamp, Collection, ConfigSchema, ImplementationRegistry, ProfileUpdate, Role,
	SecretString, UserProfile,
};
use thiserror::Error;
use tokio::sync::watch;

/// Re-export implementations
pub mod implementations {
	pub mod local;
}

/// Errors that can occur during identity operations.
#[derive(Debug, Error)]
pub enum AuthError {
	/// Email/password pair did not match a known account.
	#[error("Invalid email or password")]
	InvalidCredentials,
	/// An account already exists for the email.
	#[error("An account already exists for {0}")]
	EmailTaken(String),
	/// The bearer token is unknown or no longer valid.
	#[error("Invalid or expired session token")]
	InvalidToken,
	/// No profile document exists for the user.
	#[error("Profile not found for user {0}")]
	ProfileNotFound(String),
	/// The acting user's role does not permit the operation. Surfaced
	/// to the caller as an explicit access-denied state.
	#[error("Access denied: requires {required}, user is {actual}")]
	AccessDenied { required: String, actual: Role },
	/// The underlying document store failed.
	#[error("Storage error: {0}")]
	Storage(String),
	/// The backend configuration is invalid.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

impl From<StorageError> for AuthError {
	fn from(err: StorageError) -> Self {
		AuthError::Storage(err.to_string())
	}
}

/// An authenticated session: the bearer token plus the signed-in user.
#[derive(Debug, Clone)]
pub struct AuthSession {
	pub token: String,
	pub user: UserProfile,
}

/// Trait defining the interface for identity backends.
#[async_trait]
pub trait AuthInterface: Send + Sync {
	/// Returns the configuration schema for this backend.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Creates an account plus its profile document and opens a session.
	///
	/// Customers are verified immediately; vendors start unverified and
	/// wait for admin approval.
	async fn sign_up(
		&self,
		email: &str,
		password: &SecretString,
		role: Role,
	) -> Result<AuthSession, AuthError>;

	/// Verifies credentials, marks the user online, and opens a session.
	async fn sign_in(&self, email: &str, password: &SecretString)
		-> Result<AuthSession, AuthError>;

	/// Closes a session and marks the user offline. Signing out an
	/// already-closed session is not an error.
	async fn sign_out(&self, token: &str) -> Result<(), AuthError>;

	/// Resolves a bearer token to the profile it belongs to.
	async fn authenticate(&self, token: &str) -> Result<UserProfile, AuthError>;
}

/// Type alias for identity factory functions.
///
/// Identity backends receive the storage service because profiles,
/// credentials, and sessions live in the document store.
pub type AuthFactory =
	fn(&toml::Value, Arc<StorageService>) -> Result<Box<dyn AuthInterface>, AuthError>;

/// Registry trait for identity implementations.
pub trait AuthRegistry: ImplementationRegistry<Factory = AuthFactory> {}

/// Get all registered identity implementations.
pub fn get_all_implementations() -> Vec<(&'static str, AuthFactory)> {
	use implementations::local;

	vec![(local::Registry::NAME, local::Registry::factory())]
}

/// High-level identity service.
///
/// Wraps an identity backend, owns the auth-state stream, and provides
/// the profile operations that do not need credentials (reads, merges,
/// admin verification).
pub struct AuthService {
	backend: Box<dyn AuthInterface>,
	storage: Arc<StorageService>,
	state: watch::Sender<Option<UserProfile>>,
}

impl AuthService {
	/// Creates a new AuthService with the specified backend.
	pub fn new(backend: Box<dyn AuthInterface>, storage: Arc<StorageService>) -> Self {
		let (state, _) = watch::channel(None);
		Self {
			backend,
			storage,
			state,
		}
	}

	/// Subscribes to auth-state changes.
	///
	/// The receiver observes the current state immediately and every
	/// sign-in/out afterwards, matching the provider's auth-state-changed
	/// notification stream.
	pub fn subscribe_state(&self) -> watch::Receiver<Option<UserProfile>> {
		self.state.subscribe()
	}

	pub async fn sign_up(
		&self,
		email: &str,
		password: &SecretString,
		role: Role,
	) -> Result<AuthSession, AuthError> {
		let session = self.backend.sign_up(email, password, role).await?;
		self.state.send_replace(Some(session.user.clone()));
		Ok(session)
	}

	pub async fn sign_in(
		&self,
		email: &str,
		password: &SecretString,
	) -> Result<AuthSession, AuthError> {
		let session = self.backend.sign_in(email, password).await?;
		self.state.send_replace(Some(session.user.clone()));
		Ok(session)
	}

	pub async fn sign_out(&self, token: &str) -> Result<(), AuthError> {
		self.backend.sign_out(token).await?;
		self.state.send_replace(None);
		Ok(())
	}

	pub async fn authenticate(&self, token: &str) -> Result<UserProfile, AuthError> {
		self.backend.authenticate(token).await
	}

	/// Reads one profile document.
	pub async fn profile(&self, uid: &str) -> Result<UserProfile, AuthError> {
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

	/// Applies a partial profile update as a merge: only the fields set
	/// in `update` change on the stored document.
	pub async fn update_profile(
		&self,
		uid: &str,
		update: ProfileUpdate,
	) -> Result<UserProfile, AuthError> {
		let mut profile = self.profile(uid).await?;
		if let Some(display_name) = update.display_name {
			profile.display_name = Some(display_name);
		}
		if let Some(phone_number) = update.phone_number {
			profile.phone_number = Some(phone_number);
		}
		if let Some(default_address) = update.default_address {
			profile.default_address = Some(default_address);
		}
		if let Some(photo_url) = update.photo_url {
			profile.photo_url = Some(photo_url);
		}
		profile.updated_at = Some(current_timestamp());
		self.storage
			.update(Collection::Users, uid, &profile)
			.await?;
		Ok(profile)
	}

	/// Lists every profile with the given role.
	pub async fn profiles_with_role(&self, role: Role) -> Result<Vec<UserProfile>, AuthError> {
		let docs = self
			.storage
			.retrieve_all::<UserProfile>(Collection::Users)
			.await?;
		Ok(docs
			.into_iter()
			.map(|(_, profile)| profile)
			.filter(|profile| profile.role == role)
			.collect())
	}

	/// Sets a vendor's verification flag. Admin-only at the call sites.
	pub async fn set_verification(&self, uid: &str, verified: bool) -> Result<UserProfile, AuthError> {
		let mut profile = self.profile(uid).await?;
		profile.is_verified = verified;
		profile.updated_at = Some(current_timestamp());
		self.storage
			.update(Collection::Users, uid, &profile)
			.await?;
		Ok(profile)
	}
}

/// Checks that the user holds one of the allowed roles.
///
/// A mismatch surfaces as [`AuthError::AccessDenied`] so the caller can
/// show why access was refused instead of silently redirecting.
pub fn require_role(user: &UserProfile, allowed: &[Role]) -> Result<(), AuthError> {
	if allowed.contains(&user.role) {
		Ok(())
	} else {
		let required = allowed
			.iter()
			.map(|r| r.to_string())
			.collect::<Vec<_>>()
			.join(" or ");
		Err(AuthError::AccessDenied {
			required,
			actual: user.role,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use storefront_storage::implementations::memory::MemoryStorage;

	fn profile(role: Role) -> UserProfile {
		UserProfile {
			uid: "u1".into(),
			email: "a@b.c".into(),
			display_name: None,
			photo_url: None,
			role,
			is_verified: true,
			is_online: false,
			phone_number: None,
			default_address: None,
			created_at: 0,
			updated_at: None,
		}
	}

	#[test]
	fn role_guard_accepts_allowed_roles() {
		assert!(require_role(&profile(Role::Vendor), &[Role::Vendor]).is_ok());
		assert!(require_role(&profile(Role::Admin), &[Role::Vendor, Role::Admin]).is_ok());
	}

	#[test]
	fn role_guard_surfaces_denials() {
		let err = require_role(&profile(Role::Customer), &[Role::Admin]).unwrap_err();
		assert!(matches!(
			err,
			AuthError::AccessDenied {
				actual: Role::Customer,
				..
			}
		));
	}

	#[tokio::test]
	async fn state_stream_fires_at_subscribe_and_on_changes() {
		let storage = Arc::new(StorageService::new(Box::new(MemoryStorage::new())));
		let backend = implementations::local::create_auth(
			&toml::Value::Table(Default::default()),
			Arc::clone(&storage),
		)
		.unwrap();
		let auth = AuthService::new(backend, storage);

		// Fires immediately with the current state.
		let mut state = auth.subscribe_state();
		assert!(state.borrow_and_update().is_none());

		let session = auth
			.sign_up(
				"dana@example.com",
				&SecretString::from("pw"),
				Role::Customer,
			)
			.await
			.unwrap();
		state.changed().await.unwrap();
		assert_eq!(
			state.borrow_and_update().as_ref().map(|u| u.uid.clone()),
			Some(session.user.uid.clone())
		);

		auth.sign_out(&session.token).await.unwrap();
		state.changed().await.unwrap();
		assert!(state.borrow_and_update().is_none());
	}

	#[tokio::test]
	async fn profile_merge_leaves_unset_fields_untouched() {
		let storage = Arc::new(StorageService::new(Box::new(MemoryStorage::new())));
		let mut stored = profile(Role::Customer);
		stored.phone_number = Some("0300".into());
		storage
			.store(Collection::Users, "u1", &stored)
			.await
			.unwrap();

		let backend = implementations::local::create_auth(
			&toml::Value::Table(Default::default()),
			Arc::clone(&storage),
		)
		.unwrap();
		let auth = AuthService::new(backend, Arc::clone(&storage));

		let updated = auth
			.update_profile(
				"u1",
				ProfileUpdate {
					display_name: Some("Dana".into()),
					..Default::default()
				},
			)
			.await
			.unwrap();
		assert_eq!(updated.display_name.as_deref(), Some("Dana"));
		assert_eq!(updated.phone_number.as_deref(), Some("0300"));
	}
}
