//! Identity endpoints: signup, login, logout, and profile management.

use crate::server::{auth_error, bearer_user, engine_error, AppState};
use axum::{
	extract::State,
	http::HeaderMap,
	response::Json,
};
use storefront_types::{
	ApiError, LoginRequest, ProfileUpdate, SecretString, SessionResponse, SignupRequest,
	UserProfile,
};

/// Handles POST /api/auth/signup.
///
/// Creates the account plus its profile document and opens a session.
pub async fn signup(
	State(state): State<AppState>,
	Json(request): Json<SignupRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
	let password = SecretString::new(request.password);
	let session = state
		.engine
		.sign_up(&request.email, &password, request.role)
		.await
		.map_err(|e| {
			tracing::warn!(error = %e, "Signup failed");
			engine_error(e)
		})?;
	Ok(Json(SessionResponse {
		token: session.token,
		user: session.user,
	}))
}

/// Handles POST /api/auth/login.
pub async fn login(
	State(state): State<AppState>,
	Json(request): Json<LoginRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
	let password = SecretString::new(request.password);
	let session = state
		.engine
		.sign_in(&request.email, &password)
		.await
		.map_err(|e| {
			tracing::warn!(error = %e, "Login failed");
			engine_error(e)
		})?;
	Ok(Json(SessionResponse {
		token: session.token,
		user: session.user,
	}))
}

/// Handles POST /api/auth/logout.
///
/// Clears the presence flag and invalidates the session token.
pub async fn logout(
	State(state): State<AppState>,
	headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
	let token = crate::server::parse_bearer(&headers).ok_or_else(|| ApiError::Unauthorized {
		message: "Missing bearer token".to_string(),
	})?;
	state
		.engine
		.sign_out(token)
		.await
		.map_err(engine_error)?;
	Ok(Json(serde_json::json!({ "signedOut": true })))
}

/// Handles GET /api/profile.
pub async fn get_profile(
	State(state): State<AppState>,
	headers: HeaderMap,
) -> Result<Json<UserProfile>, ApiError> {
	let user = bearer_user(&state, &headers).await?;
	Ok(Json(user))
}

/// Handles PUT /api/profile.
///
/// Applies a partial update; unset fields stay as they are.
pub async fn update_profile(
	State(state): State<AppState>,
	headers: HeaderMap,
	Json(update): Json<ProfileUpdate>,
) -> Result<Json<UserProfile>, ApiError> {
	let user = bearer_user(&state, &headers).await?;
	let profile = state
		.engine
		.auth()
		.update_profile(&user.uid, update)
		.await
		.map_err(|e| {
			tracing::warn!(error = %e, "Profile update failed");
			auth_error(e)
		})?;
	Ok(Json(profile))
}
