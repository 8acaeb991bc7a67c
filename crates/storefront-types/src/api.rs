//! API types for HTTP endpoints and request/response structures.

use crate::{CartItem, Order, OrderStatus, Role, UserProfile};
use axum::{
	http::StatusCode,
	response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};

/// Structured error body returned by every failing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
	/// Stable machine-readable error code.
	pub error: String,
	/// Human-readable description.
	pub message: String,
}

/// HTTP-level errors with their status codes.
///
/// Every domain error is mapped onto one of these before leaving a
/// handler, so callers always receive a structured body instead of a
/// raw store-driver error.
#[derive(Debug)]
pub enum ApiError {
	/// Malformed or invalid request (400).
	BadRequest { error: String, message: String },
	/// Missing or invalid bearer token (401).
	Unauthorized { message: String },
	/// Authenticated but not allowed; role mismatch is surfaced, never
	/// silently redirected (403).
	Forbidden { message: String },
	/// Referenced document does not exist (404).
	NotFound { message: String },
	/// State conflict, e.g. an email already registered (409).
	Conflict { message: String },
	/// Unexpected failure (500).
	Internal { message: String },
	/// A required external collaborator is not configured (503).
	Unavailable { message: String },
}

impl ApiError {
	/// HTTP status code for this error.
	pub fn status_code(&self) -> StatusCode {
		match self {
			ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
			ApiError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
			ApiError::Forbidden { .. } => StatusCode::FORBIDDEN,
			ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
			ApiError::Conflict { .. } => StatusCode::CONFLICT,
			ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
			ApiError::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
		}
	}

	/// Converts to the serializable error body.
	pub fn to_error_response(&self) -> ErrorResponse {
		let (error, message) = match self {
			ApiError::BadRequest { error, message } => (error.clone(), message.clone()),
			ApiError::Unauthorized { message } => ("UNAUTHORIZED".to_string(), message.clone()),
			ApiError::Forbidden { message } => ("ACCESS_DENIED".to_string(), message.clone()),
			ApiError::NotFound { message } => ("NOT_FOUND".to_string(), message.clone()),
			ApiError::Conflict { message } => ("CONFLICT".to_string(), message.clone()),
			ApiError::Internal { message } => ("INTERNAL_ERROR".to_string(), message.clone()),
			ApiError::Unavailable { message } => ("UNAVAILABLE".to_string(), message.clone()),
		};
		ErrorResponse { error, message }
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		(self.status_code(), Json(self.to_error_response())).into_response()
	}
}

/// Body of POST /api/auth/signup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupRequest {
	pub email: String,
	pub password: String,
	pub role: Role,
}

/// Body of POST /api/auth/login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
	pub email: String,
	pub password: String,
}

/// Response of signup and login: a bearer token plus the profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
	pub token: String,
	pub user: UserProfile,
}

/// Body of POST /api/orders: the client-held cart plus the delivery
/// contact fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
	pub items: Vec<CartItem>,
	pub phone: String,
	pub address: String,
}

/// Response of POST /api/orders.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
	pub order: Order,
	/// Short human-facing reference, e.g. "A1B2C3".
	pub reference: String,
}

/// Body of POST /api/orders/{order_id}/vendors/{vendor_id}/status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdateRequest {
	pub status: OrderStatus,
}

/// Body of POST /api/admin/vendors/{uid}/verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationRequest {
	pub verified: bool,
}

/// Response of POST /api/uploads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
	/// Stable URL of the uploaded image.
	pub url: String,
}
