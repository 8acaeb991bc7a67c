//! Vendor order endpoints: the projected order list and its live
//! stream.

use crate::server::{bearer_user, engine_error, AppState};
use axum::{
	extract::State,
	http::HeaderMap,
	response::sse::{Event, Sse},
	response::Json,
};
use futures::Stream;
use serde::Serialize;
use storefront_order::views;
use storefront_types::{ApiError, Order};

/// Response of GET /api/vendor/orders.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorOrdersResponse {
	/// Orders projected down to the vendor's own sub-orders, newest
	/// first.
	pub orders: Vec<Order>,
	/// Number of pending sub-orders, for the "new orders" badge.
	pub pending_count: usize,
}

/// Handles GET /api/vendor/orders. Vendor-only.
pub async fn list_orders(
	State(state): State<AppState>,
	headers: HeaderMap,
) -> Result<Json<VendorOrdersResponse>, ApiError> {
	let user = bearer_user(&state, &headers).await?;
	let orders = state
		.engine
		.vendor_orders(&user)
		.await
		.map_err(engine_error)?;
	let pending_count = views::pending_count(&orders);
	Ok(Json(VendorOrdersResponse {
		orders,
		pending_count,
	}))
}

/// Handles GET /api/vendor/orders/stream. Vendor-only.
///
/// Server-sent events carrying the full projected snapshot on every
/// relevant change.
pub async fn stream_orders(
	State(state): State<AppState>,
	headers: HeaderMap,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, ApiError> {
	let user = bearer_user(&state, &headers).await?;
	storefront_auth::require_role(&user, &[storefront_types::Role::Vendor])
		.map_err(crate::server::auth_error)?;
	let subscription = state.engine.observer().subscribe_vendor(&user.uid);
	Ok(crate::apis::orders::snapshot_sse(subscription))
}
