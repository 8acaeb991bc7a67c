//! Storage-related types for the storefront system.

use std::str::FromStr;

/// Collections of the document store.
///
/// This enum provides type safety for storage operations by replacing
/// string literals with strongly typed variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
	/// Compound order records.
	Orders,
	/// User profile documents, keyed by uid.
	Users,
	/// Vendor shop documents.
	Shops,
	/// Catalog item documents.
	Items,
	/// Credential records for the local identity backend.
	Credentials,
	/// Bearer-token session records.
	Sessions,
}

impl Collection {
	/// Returns the string representation of the collection name.
	pub fn as_str(&self) -> &'static str {
		match self {
			Collection::Orders => "orders",
			Collection::Users => "users",
			Collection::Shops => "shops",
			Collection::Items => "items",
			Collection::Credentials => "credentials",
			Collection::Sessions => "sessions",
		}
	}

	/// Returns an iterator over all collection variants.
	pub fn all() -> impl Iterator<Item = Self> {
		[
			Self::Orders,
			Self::Users,
			Self::Shops,
			Self::Items,
			Self::Credentials,
			Self::Sessions,
		]
		.into_iter()
	}
}

impl FromStr for Collection {
	type Err = ();

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"orders" => Ok(Self::Orders),
			"users" => Ok(Self::Users),
			"shops" => Ok(Self::Shops),
			"items" => Ok(Self::Items),
			"credentials" => Ok(Self::Credentials),
			"sessions" => Ok(Self::Sessions),
			_ => Err(()),
		}
	}
}

impl From<Collection> for &'static str {
	fn from(collection: Collection) -> Self {
		collection.as_str()
	}
}
