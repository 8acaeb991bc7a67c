//! Admin endpoints: vendor account management.

use crate::server::{auth_error, bearer_user, engine_error, AppState};
use axum::{
	extract::{Path, State},
	http::HeaderMap,
	response::Json,
};
use storefront_auth::require_role;
use storefront_types::{ApiError, Role, UserProfile, VerificationRequest};

/// Handles GET /api/admin/vendors. Admin-only.
///
/// Every vendor profile, verified or not, with presence flags: the
/// data behind the approval table.
pub async fn list_vendors(
	State(state): State<AppState>,
	headers: HeaderMap,
) -> Result<Json<Vec<UserProfile>>, ApiError> {
	let user = bearer_user(&state, &headers).await?;
	require_role(&user, &[Role::Admin]).map_err(auth_error)?;
	let vendors = state
		.engine
		.auth()
		.profiles_with_role(Role::Vendor)
		.await
		.map_err(auth_error)?;
	Ok(Json(vendors))
}

/// Handles POST /api/admin/vendors/{uid}/verification. Admin-only.
///
/// Approves or revokes a vendor account; only verified vendors' shops
/// appear in the public browse view.
pub async fn set_verification(
	State(state): State<AppState>,
	Path(uid): Path<String>,
	headers: HeaderMap,
	Json(request): Json<VerificationRequest>,
) -> Result<Json<UserProfile>, ApiError> {
	let user = bearer_user(&state, &headers).await?;
	let profile = state
		.engine
		.set_vendor_verification(&user, &uid, request.verified)
		.await
		.map_err(|e| {
			tracing::warn!(error = %e, "Verification update failed");
			engine_error(e)
		})?;
	Ok(Json(profile))
}
