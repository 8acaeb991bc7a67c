//! Catalog endpoints: public browse, vendor shop and item management,
//! and the image-upload passthrough.

use crate::server::{bearer_user, catalog_error, AppState};
use axum::{
	body::Bytes,
	extract::{Path, Query, State},
	http::HeaderMap,
	response::Json,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use storefront_auth::require_role;
use storefront_catalog::{ItemDraft, ShopUpdate};
use storefront_types::{ApiError, CatalogItem, Role, Shop, UploadResponse};

/// One entry of the public browse response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopListingResponse {
	pub shop: Shop,
	pub items_by_category: BTreeMap<String, Vec<CatalogItem>>,
}

/// Handles GET /api/shops.
///
/// Public: the shops of verified vendors, items grouped by category.
pub async fn browse(
	State(state): State<AppState>,
) -> Result<Json<Vec<ShopListingResponse>>, ApiError> {
	let listings = state
		.engine
		.catalog()
		.browse()
		.await
		.map_err(catalog_error)?;
	Ok(Json(
		listings
			.into_iter()
			.map(|listing| ShopListingResponse {
				shop: listing.shop,
				items_by_category: listing.items_by_category,
			})
			.collect(),
	))
}

/// Handles GET /api/vendor/shop. Vendor-only.
pub async fn get_shop(
	State(state): State<AppState>,
	headers: HeaderMap,
) -> Result<Json<Shop>, ApiError> {
	let user = bearer_user(&state, &headers).await?;
	require_role(&user, &[Role::Vendor]).map_err(crate::server::auth_error)?;
	let shop = state
		.engine
		.catalog()
		.shop_for_vendor(&user.uid)
		.await
		.map_err(catalog_error)?
		.ok_or_else(|| ApiError::NotFound {
			message: "No shop exists yet".to_string(),
		})?;
	Ok(Json(shop))
}

/// Body of PUT /api/vendor/shop.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopUpdateRequest {
	pub shop_name: String,
	pub description: Option<String>,
	pub image_url: Option<String>,
}

/// Handles PUT /api/vendor/shop. Vendor-only; creates the shop on first
/// use.
pub async fn upsert_shop(
	State(state): State<AppState>,
	headers: HeaderMap,
	Json(request): Json<ShopUpdateRequest>,
) -> Result<Json<Shop>, ApiError> {
	let user = bearer_user(&state, &headers).await?;
	require_role(&user, &[Role::Vendor]).map_err(crate::server::auth_error)?;
	let shop = state
		.engine
		.catalog()
		.upsert_shop(
			&user,
			ShopUpdate {
				shop_name: request.shop_name,
				description: request.description,
				image_url: request.image_url,
			},
		)
		.await
		.map_err(catalog_error)?;
	Ok(Json(shop))
}

/// Handles GET /api/vendor/items. Vendor-only.
pub async fn list_items(
	State(state): State<AppState>,
	headers: HeaderMap,
) -> Result<Json<Vec<CatalogItem>>, ApiError> {
	let user = bearer_user(&state, &headers).await?;
	require_role(&user, &[Role::Vendor]).map_err(crate::server::auth_error)?;
	let shop = state
		.engine
		.catalog()
		.shop_for_vendor(&user.uid)
		.await
		.map_err(catalog_error)?
		.ok_or_else(|| ApiError::NotFound {
			message: "No shop exists yet".to_string(),
		})?;
	let items = state
		.engine
		.catalog()
		.items_for_shop(&shop.id)
		.await
		.map_err(catalog_error)?;
	Ok(Json(items))
}

/// Body of POST /api/vendor/items.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRequest {
	pub name: String,
	pub price: u64,
	pub category: String,
	pub image_url: Option<String>,
}

/// Handles POST /api/vendor/items. Vendor-only.
pub async fn add_item(
	State(state): State<AppState>,
	headers: HeaderMap,
	Json(request): Json<ItemRequest>,
) -> Result<Json<CatalogItem>, ApiError> {
	let user = bearer_user(&state, &headers).await?;
	require_role(&user, &[Role::Vendor]).map_err(crate::server::auth_error)?;
	let item = state
		.engine
		.catalog()
		.add_item(
			&user,
			ItemDraft {
				name: request.name,
				price: request.price,
				category: request.category,
				image_url: request.image_url,
			},
		)
		.await
		.map_err(|e| {
			tracing::warn!(error = %e, "Adding item failed");
			catalog_error(e)
		})?;
	Ok(Json(item))
}

/// Handles DELETE /api/vendor/items/{item_id}. Vendor-only.
pub async fn delete_item(
	State(state): State<AppState>,
	Path(item_id): Path<String>,
	headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
	let user = bearer_user(&state, &headers).await?;
	require_role(&user, &[Role::Vendor]).map_err(crate::server::auth_error)?;
	state
		.engine
		.catalog()
		.delete_item(&user, &item_id)
		.await
		.map_err(catalog_error)?;
	Ok(Json(serde_json::json!({ "deleted": true })))
}

/// Query parameters of POST /api/uploads.
#[derive(Debug, Deserialize)]
pub struct UploadQuery {
	/// File name forwarded to the upload host.
	pub name: String,
}

/// Handles POST /api/uploads.
///
/// Forwards the raw image body to the configured external upload host
/// and returns the stable URL it answers with.
pub async fn upload_image(
	State(state): State<AppState>,
	Query(query): Query<UploadQuery>,
	headers: HeaderMap,
	body: Bytes,
) -> Result<Json<UploadResponse>, ApiError> {
	let _user = bearer_user(&state, &headers).await?;
	let uploader = state.engine.uploader().ok_or_else(|| ApiError::Unavailable {
		message: "No upload endpoint configured".to_string(),
	})?;
	let url = uploader
		.upload(&query.name, body.to_vec())
		.await
		.map_err(|e| {
			tracing::warn!(error = %e, "Image upload failed");
			ApiError::Internal {
				message: e.to_string(),
			}
		})?;
	Ok(Json(UploadResponse { url }))
}
