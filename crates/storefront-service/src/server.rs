//! HTTP server for the storefront API.
//!
//! Routing, shared state, the bearer-token guard, and the mapping from
//! domain errors onto HTTP error bodies. Handler logic lives in the
//! `apis` modules.

use axum::{
	http::{header, HeaderMap},
	routing::{delete, get, post},
	Router,
};
use std::sync::Arc;
use storefront_auth::AuthError;
use storefront_catalog::CatalogError;
use storefront_config::ApiConfig;
use storefront_core::{EngineError, OrderStateError, StorefrontEngine};
use storefront_order::CheckoutError;
use storefront_types::{ApiError, UserProfile};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Shared application state for the API server.
#[derive(Clone)]
pub struct AppState {
	/// Reference to the engine for processing requests.
	pub engine: Arc<StorefrontEngine>,
}

/// Starts the HTTP server for the API.
pub async fn start_server(
	api_config: ApiConfig,
	engine: Arc<StorefrontEngine>,
) -> Result<(), Box<dyn std::error::Error>> {
	let app_state = AppState { engine };

	let app = Router::new()
		.nest(
			"/api",
			Router::new()
				// Identity
				.route("/auth/signup", post(crate::apis::auth::signup))
				.route("/auth/login", post(crate::apis::auth::login))
				.route("/auth/logout", post(crate::apis::auth::logout))
				.route(
					"/profile",
					get(crate::apis::auth::get_profile).put(crate::apis::auth::update_profile),
				)
				// Customer orders
				.route(
					"/orders",
					post(crate::apis::orders::checkout).get(crate::apis::orders::list_orders),
				)
				.route("/orders/stream", get(crate::apis::orders::stream_orders))
				.route(
					"/orders/{order_id}/vendors/{vendor_id}/status",
					post(crate::apis::orders::update_status),
				)
				// Vendor orders
				.route("/vendor/orders", get(crate::apis::vendor::list_orders))
				.route(
					"/vendor/orders/stream",
					get(crate::apis::vendor::stream_orders),
				)
				// Catalog
				.route("/shops", get(crate::apis::catalog::browse))
				.route(
					"/vendor/shop",
					get(crate::apis::catalog::get_shop).put(crate::apis::catalog::upsert_shop),
				)
				.route(
					"/vendor/items",
					get(crate::apis::catalog::list_items).post(crate::apis::catalog::add_item),
				)
				.route(
					"/vendor/items/{item_id}",
					delete(crate::apis::catalog::delete_item),
				)
				.route("/uploads", post(crate::apis::catalog::upload_image))
				// Admin
				.route("/admin/vendors", get(crate::apis::admin::list_vendors))
				.route(
					"/admin/vendors/{uid}/verification",
					post(crate::apis::admin::set_verification),
				),
		)
		.layer(
			ServiceBuilder::new()
				.layer(TraceLayer::new_for_http())
				.layer(CorsLayer::permissive()),
		)
		.with_state(app_state);

	let bind_address = format!("{}:{}", api_config.host, api_config.port);
	let listener = TcpListener::bind(&bind_address).await?;

	tracing::info!("Storefront API server starting on {}", bind_address);

	axum::serve(listener, app).await?;

	Ok(())
}

/// Extracts the bearer token from an Authorization header.
pub(crate) fn parse_bearer(headers: &HeaderMap) -> Option<&str> {
	headers
		.get(header::AUTHORIZATION)
		.and_then(|value| value.to_str().ok())
		.and_then(|value| value.strip_prefix("Bearer "))
		.filter(|token| !token.is_empty())
}

/// Resolves the request's bearer token to an authenticated user.
pub(crate) async fn bearer_user(
	state: &AppState,
	headers: &HeaderMap,
) -> Result<UserProfile, ApiError> {
	let token = parse_bearer(headers).ok_or_else(|| ApiError::Unauthorized {
		message: "Missing bearer token".to_string(),
	})?;
	state
		.engine
		.auth()
		.authenticate(token)
		.await
		.map_err(auth_error)
}

/// Maps identity errors onto HTTP errors.
pub(crate) fn auth_error(err: AuthError) -> ApiError {
	match err {
		AuthError::InvalidCredentials | AuthError::InvalidToken => ApiError::Unauthorized {
			message: err.to_string(),
		},
		AuthError::EmailTaken(_) => ApiError::Conflict {
			message: err.to_string(),
		},
		AuthError::AccessDenied { .. } => ApiError::Forbidden {
			message: err.to_string(),
		},
		AuthError::ProfileNotFound(_) => ApiError::NotFound {
			message: err.to_string(),
		},
		AuthError::Storage(_) | AuthError::Configuration(_) => ApiError::Internal {
			message: err.to_string(),
		},
	}
}

/// Maps engine errors onto HTTP errors.
pub(crate) fn engine_error(err: EngineError) -> ApiError {
	match err {
		EngineError::Checkout(e) => match e {
			CheckoutError::EmptyCart | CheckoutError::MissingContact(_) => ApiError::BadRequest {
				error: "VALIDATION_FAILED".to_string(),
				message: e.to_string(),
			},
			CheckoutError::Storage(_) => ApiError::Internal {
				message: e.to_string(),
			},
		},
		EngineError::OrderState(e) => match e {
			OrderStateError::InvalidTransition { .. } => ApiError::BadRequest {
				error: "INVALID_TRANSITION".to_string(),
				message: e.to_string(),
			},
			OrderStateError::OrderNotFound(_) | OrderStateError::SubOrderNotFound { .. } => {
				ApiError::NotFound {
					message: e.to_string(),
				}
			}
			OrderStateError::Storage(_) => ApiError::Internal {
				message: e.to_string(),
			},
		},
		EngineError::Auth(e) => auth_error(e),
		EngineError::Storage(message) => ApiError::Internal { message },
	}
}

/// Maps catalog errors onto HTTP errors.
pub(crate) fn catalog_error(err: CatalogError) -> ApiError {
	match err {
		CatalogError::ShopNotFound(_) | CatalogError::ItemNotFound(_) => ApiError::NotFound {
			message: err.to_string(),
		},
		CatalogError::NotItemOwner(_) => ApiError::Forbidden {
			message: err.to_string(),
		},
		CatalogError::MissingField(_) => ApiError::BadRequest {
			error: "VALIDATION_FAILED".to_string(),
			message: err.to_string(),
		},
		CatalogError::Storage(_) => ApiError::Internal {
			message: err.to_string(),
		},
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use axum::http::HeaderValue;

	#[test]
	fn parse_bearer_extracts_token() {
		let mut headers = HeaderMap::new();
		headers.insert(
			header::AUTHORIZATION,
			HeaderValue::from_static("Bearer abc-123"),
		);
		assert_eq!(parse_bearer(&headers), Some("abc-123"));
	}

	#[test]
	fn parse_bearer_rejects_other_schemes_and_empty_tokens() {
		let mut headers = HeaderMap::new();
		headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic xyz"));
		assert_eq!(parse_bearer(&headers), None);

		headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
		assert_eq!(parse_bearer(&headers), None);

		assert_eq!(parse_bearer(&HeaderMap::new()), None);
	}
}
