//! User profile and role types.
//!
//! Profiles mirror the `users/{uid}` documents produced to the document
//! store: role, verification flag, presence flag, and the contact fields
//! used to pre-fill checkout.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The three user roles of the storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
	/// A buyer. Verified by default at sign-up.
	Customer,
	/// A shop operator. Starts unverified; an admin must approve the
	/// account before its shop appears in the public browse view.
	Vendor,
	/// Platform operator.
	Admin,
}

impl fmt::Display for Role {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let label = match self {
			Role::Customer => "customer",
			Role::Vendor => "vendor",
			Role::Admin => "admin",
		};
		write!(f, "{}", label)
	}
}

/// The `users/{uid}` profile document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
	pub uid: String,
	pub email: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub display_name: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub photo_url: Option<String>,
	pub role: Role,
	/// Vendors start unverified; customers are verified on sign-up.
	pub is_verified: bool,
	/// Presence flag: set on sign-in, cleared on sign-out.
	pub is_online: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub phone_number: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub default_address: Option<String>,
	/// Unix seconds.
	pub created_at: u64,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub updated_at: Option<u64>,
}

impl UserProfile {
	/// Display name if set, otherwise the email address.
	pub fn display_or_email(&self) -> &str {
		self.display_name.as_deref().unwrap_or(&self.email)
	}
}

/// Partial profile update applied as a merge: `None` fields are left
/// untouched on the stored document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub display_name: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub phone_number: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub default_address: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub photo_url: Option<String>,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn role_serializes_lowercase() {
		assert_eq!(serde_json::to_string(&Role::Vendor).unwrap(), "\"vendor\"");
		let role: Role = serde_json::from_str("\"admin\"").unwrap();
		assert_eq!(role, Role::Admin);
	}
}
