//! Catalog module for the storefront system.
//!
//! Vendors maintain one shop document plus its catalog items; customers
//! browse the shops of verified vendors with items grouped by category.
//! Orders never read these documents: line items are snapshots taken at
//! checkout, so catalog edits cannot reach placed orders.

use std::collections::BTreeMap;
use std::sync::Arc;
use storefront_storage::{StorageError, StorageService};
use storefront_types::{
	current_timestamp, CatalogItem, Collection, Role, Shop, UserProfile,
};
use thiserror::Error;

pub mod upload;

pub use upload::{HttpImageUploader, ImageUploader, UploadError};

/// Errors that can occur during catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
	/// The vendor has not created a shop yet.
	#[error("No shop exists for vendor {0}")]
	ShopNotFound(String),
	/// A referenced catalog item does not exist.
	#[error("Item not found: {0}")]
	ItemNotFound(String),
	/// The item belongs to a different vendor.
	#[error("Item {0} does not belong to this vendor")]
	NotItemOwner(String),
	/// A required field is empty.
	#[error("Missing required field: {0}")]
	MissingField(&'static str),
	/// The underlying document store failed.
	#[error("Storage error: {0}")]
	Storage(String),
}

impl From<StorageError> for CatalogError {
	fn from(err: StorageError) -> Self {
		CatalogError::Storage(err.to_string())
	}
}

/// Fields a vendor can set on their shop.
#[derive(Debug, Clone, Default)]
pub struct ShopUpdate {
	pub shop_name: String,
	pub description: Option<String>,
	pub image_url: Option<String>,
}

/// Fields of a new or edited catalog item.
#[derive(Debug, Clone)]
pub struct ItemDraft {
	pub name: String,
	pub price: u64,
	pub category: String,
	pub image_url: Option<String>,
}

/// One entry of the public browse view: a shop plus its items grouped
/// by category.
#[derive(Debug, Clone)]
pub struct ShopListing {
	pub shop: Shop,
	pub items_by_category: BTreeMap<String, Vec<CatalogItem>>,
}

/// Catalog service over the shops and items collections.
pub struct CatalogService {
	storage: Arc<StorageService>,
}

impl CatalogService {
	pub fn new(storage: Arc<StorageService>) -> Self {
		Self { storage }
	}

	/// The vendor's shop, if one exists.
	pub async fn shop_for_vendor(&self, vendor_id: &str) -> Result<Option<Shop>, CatalogError> {
		let shops = self
			.storage
			.retrieve_all::<Shop>(Collection::Shops)
			.await?;
		Ok(shops
			.into_iter()
			.find(|(_, shop)| shop.vendor_id == vendor_id)
			.map(|(id, mut shop)| {
				shop.id = id;
				shop
			}))
	}

	/// Creates or updates the vendor's shop.
	pub async fn upsert_shop(
		&self,
		vendor: &UserProfile,
		update: ShopUpdate,
	) -> Result<Shop, CatalogError> {
		if update.shop_name.trim().is_empty() {
			return Err(CatalogError::MissingField("shop_name"));
		}

		let now = current_timestamp();
		match self.shop_for_vendor(&vendor.uid).await? {
			Some(mut shop) => {
				shop.shop_name = update.shop_name;
				shop.description = update.description;
				if update.image_url.is_some() {
					shop.image_url = update.image_url;
				}
				shop.updated_at = Some(now);
				self.storage
					.update(Collection::Shops, &shop.id, &shop)
					.await?;
				Ok(shop)
			}
			None => {
				let mut shop = Shop {
					id: String::new(),
					vendor_id: vendor.uid.clone(),
					shop_name: update.shop_name,
					description: update.description,
					image_url: update.image_url,
					categories: Vec::new(),
					created_at: now,
					updated_at: None,
				};
				let id = self.storage.create(Collection::Shops, &shop).await?;
				shop.id = id;
				tracing::info!(vendor = %vendor.uid, shop = %shop.id, "Shop created");
				Ok(shop)
			}
		}
	}

	/// Adds an item to the vendor's shop.
	///
	/// A category the shop has not seen before is appended to the shop's
	/// category list as a side effect.
	pub async fn add_item(
		&self,
		vendor: &UserProfile,
		draft: ItemDraft,
	) -> Result<CatalogItem, CatalogError> {
		if draft.name.trim().is_empty() {
			return Err(CatalogError::MissingField("name"));
		}
		if draft.category.trim().is_empty() {
			return Err(CatalogError::MissingField("category"));
		}
		let mut shop = self
			.shop_for_vendor(&vendor.uid)
			.await?
			.ok_or_else(|| CatalogError::ShopNotFound(vendor.uid.clone()))?;

		if !shop.categories.contains(&draft.category) {
			shop.categories.push(draft.category.clone());
			self.storage
				.update(Collection::Shops, &shop.id, &shop)
				.await?;
		}

		let mut item = CatalogItem {
			id: String::new(),
			shop_id: shop.id.clone(),
			vendor_id: vendor.uid.clone(),
			name: draft.name,
			price: draft.price,
			category: draft.category,
			image_url: draft.image_url,
			created_at: current_timestamp(),
		};
		let id = self.storage.create(Collection::Items, &item).await?;
		item.id = id;
		Ok(item)
	}

	/// Deletes one of the vendor's items.
	pub async fn delete_item(
		&self,
		vendor: &UserProfile,
		item_id: &str,
	) -> Result<(), CatalogError> {
		let item = match self
			.storage
			.retrieve::<CatalogItem>(Collection::Items, item_id)
			.await
		{
			Ok(item) => item,
			Err(StorageError::NotFound) => {
				return Err(CatalogError::ItemNotFound(item_id.to_string()))
			}
			Err(e) => return Err(e.into()),
		};
		if item.vendor_id != vendor.uid {
			return Err(CatalogError::NotItemOwner(item_id.to_string()));
		}
		self.storage.remove(Collection::Items, item_id).await?;
		Ok(())
	}

	/// All items of one shop.
	pub async fn items_for_shop(&self, shop_id: &str) -> Result<Vec<CatalogItem>, CatalogError> {
		let items = self
			.storage
			.retrieve_all::<CatalogItem>(Collection::Items)
			.await?;
		Ok(items
			.into_iter()
			.filter(|(_, item)| item.shop_id == shop_id)
			.map(|(id, mut item)| {
				item.id = id;
				item
			})
			.collect())
	}

	/// The public browse view: shops of verified vendors only, each with
	/// its items grouped by category.
	pub async fn browse(&self) -> Result<Vec<ShopListing>, CatalogError> {
		let users = self
			.storage
			.retrieve_all::<UserProfile>(Collection::Users)
			.await?;
		let verified: Vec<String> = users
			.into_iter()
			.map(|(_, profile)| profile)
			.filter(|profile| profile.role == Role::Vendor && profile.is_verified)
			.map(|profile| profile.uid)
			.collect();

		let shops = self
			.storage
			.retrieve_all::<Shop>(Collection::Shops)
			.await?;
		let items = self
			.storage
			.retrieve_all::<CatalogItem>(Collection::Items)
			.await?;

		let mut listings = Vec::new();
		for (shop_id, mut shop) in shops {
			if !verified.contains(&shop.vendor_id) {
				continue;
			}
			shop.id = shop_id;

			let mut items_by_category: BTreeMap<String, Vec<CatalogItem>> = BTreeMap::new();
			for (item_id, item) in &items {
				if item.shop_id != shop.id {
					continue;
				}
				let mut item = item.clone();
				item.id = item_id.clone();
				items_by_category
					.entry(item.category.clone())
					.or_default()
					.push(item);
			}
			listings.push(ShopListing {
				shop,
				items_by_category,
			});
		}
		// Scan order is unspecified; pin a stable presentation order.
		listings.sort_by(|a, b| a.shop.shop_name.cmp(&b.shop.shop_name));
		Ok(listings)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use storefront_storage::implementations::memory::MemoryStorage;

	fn vendor(uid: &str, verified: bool) -> UserProfile {
		UserProfile {
			uid: uid.into(),
			email: format!("{}@example.com", uid),
			display_name: None,
			photo_url: None,
			role: Role::Vendor,
			is_verified: verified,
			is_online: true,
			phone_number: None,
			default_address: None,
			created_at: 0,
			updated_at: None,
		}
	}

	async fn service_with_vendor(profile: &UserProfile) -> (CatalogService, Arc<StorageService>) {
		let storage = Arc::new(StorageService::new(Box::new(MemoryStorage::new())));
		storage
			.store(Collection::Users, &profile.uid, profile)
			.await
			.unwrap();
		(CatalogService::new(Arc::clone(&storage)), storage)
	}

	fn draft(name: &str, category: &str) -> ItemDraft {
		ItemDraft {
			name: name.into(),
			price: 450,
			category: category.into(),
			image_url: None,
		}
	}

	#[tokio::test]
	async fn upsert_creates_then_updates_one_shop() {
		let v = vendor("v1", true);
		let (catalog, _) = service_with_vendor(&v).await;

		let created = catalog
			.upsert_shop(
				&v,
				ShopUpdate {
					shop_name: "Karachi Grill".into(),
					..Default::default()
				},
			)
			.await
			.unwrap();
		let updated = catalog
			.upsert_shop(
				&v,
				ShopUpdate {
					shop_name: "Karachi Grill & BBQ".into(),
					..Default::default()
				},
			)
			.await
			.unwrap();
		assert_eq!(created.id, updated.id);
		assert_eq!(updated.shop_name, "Karachi Grill & BBQ");
	}

	#[tokio::test]
	async fn add_item_requires_a_shop_and_grows_categories() {
		let v = vendor("v1", true);
		let (catalog, _) = service_with_vendor(&v).await;

		assert!(matches!(
			catalog.add_item(&v, draft("Biryani", "Rice")).await,
			Err(CatalogError::ShopNotFound(_))
		));

		catalog
			.upsert_shop(
				&v,
				ShopUpdate {
					shop_name: "Shop".into(),
					..Default::default()
				},
			)
			.await
			.unwrap();
		catalog.add_item(&v, draft("Biryani", "Rice")).await.unwrap();
		catalog.add_item(&v, draft("Karahi", "Mains")).await.unwrap();
		catalog.add_item(&v, draft("Pulao", "Rice")).await.unwrap();

		let shop = catalog.shop_for_vendor("v1").await.unwrap().unwrap();
		assert_eq!(shop.categories, vec!["Rice".to_string(), "Mains".to_string()]);

		let items = catalog.items_for_shop(&shop.id).await.unwrap();
		assert_eq!(items.len(), 3);
	}

	#[tokio::test]
	async fn delete_item_enforces_ownership() {
		let v1 = vendor("v1", true);
		let v2 = vendor("v2", true);
		let (catalog, storage) = service_with_vendor(&v1).await;
		storage
			.store(Collection::Users, &v2.uid, &v2)
			.await
			.unwrap();

		catalog
			.upsert_shop(
				&v1,
				ShopUpdate {
					shop_name: "Shop".into(),
					..Default::default()
				},
			)
			.await
			.unwrap();
		let item = catalog.add_item(&v1, draft("Biryani", "Rice")).await.unwrap();

		assert!(matches!(
			catalog.delete_item(&v2, &item.id).await,
			Err(CatalogError::NotItemOwner(_))
		));
		catalog.delete_item(&v1, &item.id).await.unwrap();
		assert!(matches!(
			catalog.delete_item(&v1, &item.id).await,
			Err(CatalogError::ItemNotFound(_))
		));
	}

	#[tokio::test]
	async fn browse_lists_verified_vendors_only() {
		let verified = vendor("v1", true);
		let unverified = vendor("v2", false);
		let (catalog, storage) = service_with_vendor(&verified).await;
		storage
			.store(Collection::Users, &unverified.uid, &unverified)
			.await
			.unwrap();

		catalog
			.upsert_shop(
				&verified,
				ShopUpdate {
					shop_name: "Visible".into(),
					..Default::default()
				},
			)
			.await
			.unwrap();
		catalog
			.upsert_shop(
				&unverified,
				ShopUpdate {
					shop_name: "Hidden".into(),
					..Default::default()
				},
			)
			.await
			.unwrap();
		catalog
			.add_item(&verified, draft("Biryani", "Rice"))
			.await
			.unwrap();

		let listings = catalog.browse().await.unwrap();
		assert_eq!(listings.len(), 1);
		assert_eq!(listings[0].shop.shop_name, "Visible");
		assert_eq!(listings[0].items_by_category["Rice"].len(), 1);
	}
}
