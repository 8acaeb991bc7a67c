//! Customer order endpoints: checkout, order history, the live order
//! stream, and the vendor-facing status transition.

use crate::server::{bearer_user, engine_error, AppState};
use axum::{
	extract::{Path, State},
	http::HeaderMap,
	response::sse::{Event, KeepAlive, Sse},
	response::Json,
};
use futures::{Stream, StreamExt};
use storefront_types::{
	ApiError, CheckoutRequest, CheckoutResponse, Order, StatusUpdateRequest,
};

/// Handles POST /api/orders.
///
/// Splits the submitted cart into per-vendor sub-orders and persists the
/// compound order. Validation failures come back as 400 before anything
/// is written; a store failure surfaces as 500 and the client keeps its
/// cart for a manual retry.
pub async fn checkout(
	State(state): State<AppState>,
	headers: HeaderMap,
	Json(request): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>, ApiError> {
	let user = bearer_user(&state, &headers).await?;
	let order = state
		.engine
		.place_order(&user, request)
		.await
		.map_err(|e| {
			tracing::warn!(error = %e, "Checkout failed");
			engine_error(e)
		})?;
	let reference = order.short_reference();
	Ok(Json(CheckoutResponse { order, reference }))
}

/// Handles GET /api/orders.
///
/// The customer's own orders, whole, newest first.
pub async fn list_orders(
	State(state): State<AppState>,
	headers: HeaderMap,
) -> Result<Json<Vec<Order>>, ApiError> {
	let user = bearer_user(&state, &headers).await?;
	let orders = state
		.engine
		.customer_orders(&user)
		.await
		.map_err(engine_error)?;
	Ok(Json(orders))
}

/// Handles GET /api/orders/stream.
///
/// Server-sent events carrying the full current snapshot of the
/// customer's orders on every relevant change. The stream is torn down
/// when the client disconnects.
pub async fn stream_orders(
	State(state): State<AppState>,
	headers: HeaderMap,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, ApiError> {
	let user = bearer_user(&state, &headers).await?;
	let subscription = state.engine.observer().subscribe_customer(&user.uid);
	Ok(snapshot_sse(subscription))
}

/// Handles POST /api/orders/{order_id}/vendors/{vendor_id}/status.
///
/// Advances one vendor sub-order. Only the owning vendor may act, and
/// only the immediate successor of the current status (or a
/// cancellation) is accepted.
pub async fn update_status(
	State(state): State<AppState>,
	Path((order_id, vendor_id)): Path<(String, String)>,
	headers: HeaderMap,
	Json(request): Json<StatusUpdateRequest>,
) -> Result<Json<Order>, ApiError> {
	let user = bearer_user(&state, &headers).await?;
	let order = state
		.engine
		.advance_sub_order(&user, &order_id, &vendor_id, request.status)
		.await
		.map_err(|e| {
			tracing::warn!(error = %e, "Status update failed");
			engine_error(e)
		})?;
	Ok(Json(order))
}

/// Wraps a live order subscription as an SSE response.
pub(crate) fn snapshot_sse(
	subscription: storefront_core::OrderSubscription,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
	let stream = subscription
		.into_stream()
		.map(|snapshot| Event::default().event("orders").json_data(&snapshot));
	Sse::new(stream).keep_alive(KeepAlive::default())
}
