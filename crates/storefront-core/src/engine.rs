//! Storefront engine: the seam where checkout, fulfillment, identity,
//! and catalog meet.
//!
//! The engine owns the shared services, applies role guards at the
//! point of mutation, and publishes lifecycle events to the bus. State
//! is always explicit: services are constructed and passed in, never
//! read from ambient scope.

use crate::event_bus::EventBus;
use crate::observer::OrderObserver;
use crate::state::{OrderStateError, OrderStateMachine};
use std::sync::Arc;
use storefront_auth::{require_role, AuthError, AuthService};
use storefront_catalog::{CatalogService, ImageUploader};
use storefront_config::Config;
use storefront_order::{CheckoutDetails, CheckoutError, CheckoutService, OrderQueries};
use storefront_storage::StorageService;
use storefront_types::{
	AuthEvent, Cart, CheckoutRequest, Order, OrderStatus, Role, StorefrontEvent, OrderEvent,
	UserProfile,
};
use thiserror::Error;

/// Errors that can occur during engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
	#[error(transparent)]
	Checkout(#[from] CheckoutError),
	#[error(transparent)]
	OrderState(#[from] OrderStateError),
	#[error(transparent)]
	Auth(#[from] AuthError),
	#[error("Storage error: {0}")]
	Storage(String),
}

impl From<storefront_storage::StorageError> for EngineError {
	fn from(err: storefront_storage::StorageError) -> Self {
		EngineError::Storage(err.to_string())
	}
}

/// Main engine coordinating the storefront services.
pub struct StorefrontEngine {
	config: Config,
	storage: Arc<StorageService>,
	auth: Arc<AuthService>,
	catalog: Arc<CatalogService>,
	checkout: CheckoutService,
	queries: OrderQueries,
	state: OrderStateMachine,
	observer: OrderObserver,
	uploader: Option<Arc<dyn ImageUploader>>,
	event_bus: EventBus,
}

impl std::fmt::Debug for StorefrontEngine {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("StorefrontEngine").finish_non_exhaustive()
	}
}

impl StorefrontEngine {
	pub(crate) fn new(
		config: Config,
		storage: Arc<StorageService>,
		auth: Arc<AuthService>,
		catalog: Arc<CatalogService>,
		uploader: Option<Arc<dyn ImageUploader>>,
		event_bus: EventBus,
	) -> Self {
		Self {
			checkout: CheckoutService::new(Arc::clone(&storage)),
			queries: OrderQueries::new(Arc::clone(&storage)),
			state: OrderStateMachine::new(Arc::clone(&storage)),
			observer: OrderObserver::new(Arc::clone(&storage)),
			config,
			storage,
			auth,
			catalog,
			uploader,
			event_bus,
		}
	}

	pub fn config(&self) -> &Config {
		&self.config
	}

	pub fn storage(&self) -> &Arc<StorageService> {
		&self.storage
	}

	pub fn auth(&self) -> &Arc<AuthService> {
		&self.auth
	}

	pub fn catalog(&self) -> &Arc<CatalogService> {
		&self.catalog
	}

	pub fn observer(&self) -> &OrderObserver {
		&self.observer
	}

	pub fn uploader(&self) -> Option<&Arc<dyn ImageUploader>> {
		self.uploader.as_ref()
	}

	pub fn event_bus(&self) -> &EventBus {
		&self.event_bus
	}

	/// Creates an account and publishes the sign-up event.
	pub async fn sign_up(
		&self,
		email: &str,
		password: &storefront_types::SecretString,
		role: Role,
	) -> Result<storefront_auth::AuthSession, EngineError> {
		let session = self.auth.sign_up(email, password, role).await?;
		self.event_bus
			.publish(StorefrontEvent::Auth(AuthEvent::SignedUp {
				uid: session.user.uid.clone(),
				role,
			}));
		Ok(session)
	}

	/// Signs a user in and publishes the sign-in event.
	pub async fn sign_in(
		&self,
		email: &str,
		password: &storefront_types::SecretString,
	) -> Result<storefront_auth::AuthSession, EngineError> {
		let session = self.auth.sign_in(email, password).await?;
		self.event_bus
			.publish(StorefrontEvent::Auth(AuthEvent::SignedIn {
				uid: session.user.uid.clone(),
			}));
		Ok(session)
	}

	/// Signs a session out and publishes the sign-out event.
	pub async fn sign_out(&self, token: &str) -> Result<(), EngineError> {
		// Resolve the uid for the event before the token dies; a token
		// that is already invalid still signs out cleanly.
		let uid = self.auth.authenticate(token).await.ok().map(|u| u.uid);
		self.auth.sign_out(token).await?;
		if let Some(uid) = uid {
			self.event_bus
				.publish(StorefrontEvent::Auth(AuthEvent::SignedOut { uid }));
		}
		Ok(())
	}

	/// Places an order from the submitted cart and publishes the
	/// placement event. The cart is client-held; a failed write leaves
	/// the caller's copy intact for a manual retry.
	pub async fn place_order(
		&self,
		user: &UserProfile,
		request: CheckoutRequest,
	) -> Result<Order, EngineError> {
		let mut cart = Cart::from_items(request.items);
		let details = CheckoutDetails {
			phone: request.phone,
			address: request.address,
		};
		let order = self.checkout.place_order(user, &details, &mut cart).await?;
		self.event_bus
			.publish(StorefrontEvent::Order(OrderEvent::Placed {
				order: order.clone(),
			}));
		Ok(order)
	}

	/// The customer's own orders, newest first.
	pub async fn customer_orders(&self, user: &UserProfile) -> Result<Vec<Order>, EngineError> {
		Ok(self.queries.for_customer(&user.uid).await?)
	}

	/// The vendor's projected orders, newest first. Vendor-only.
	pub async fn vendor_orders(&self, user: &UserProfile) -> Result<Vec<Order>, EngineError> {
		require_role(user, &[Role::Vendor])?;
		Ok(self.queries.for_vendor(&user.uid).await?)
	}

	/// Advances one sub-order's status. Only the vendor owning the
	/// sub-order may act, and only the next legal status is accepted.
	pub async fn advance_sub_order(
		&self,
		user: &UserProfile,
		order_id: &str,
		vendor_id: &str,
		new_status: OrderStatus,
	) -> Result<Order, EngineError> {
		require_role(user, &[Role::Vendor])?;
		if user.uid != vendor_id {
			return Err(AuthError::AccessDenied {
				required: "the owning vendor".to_string(),
				actual: user.role,
			}
			.into());
		}

		let before = self.state.get_order(order_id).await?;
		let from = before
			.sub_order(vendor_id)
			.map(|vo| vo.status)
			.ok_or_else(|| OrderStateError::SubOrderNotFound {
				order_id: order_id.to_string(),
				vendor_id: vendor_id.to_string(),
			})?;

		let order = self
			.state
			.transition_sub_order(order_id, vendor_id, new_status)
			.await?;

		self.event_bus
			.publish(StorefrontEvent::Order(OrderEvent::StatusChanged {
				order_id: order_id.to_string(),
				vendor_id: vendor_id.to_string(),
				from,
				to: new_status,
			}));
		Ok(order)
	}

	/// Sets a vendor's verification flag. Admin-only.
	pub async fn set_vendor_verification(
		&self,
		admin: &UserProfile,
		vendor_uid: &str,
		verified: bool,
	) -> Result<UserProfile, EngineError> {
		require_role(admin, &[Role::Admin])?;
		let profile = self.auth.set_verification(vendor_uid, verified).await?;
		self.event_bus
			.publish(StorefrontEvent::Auth(AuthEvent::VendorVerificationChanged {
				uid: vendor_uid.to_string(),
				verified,
			}));
		Ok(profile)
	}

	/// Main run loop: logs lifecycle events until shutdown.
	///
	/// Observers read the store directly, so this loop is diagnostic
	/// only.
	pub async fn run(&self) -> Result<(), EngineError> {
		let mut events = self.event_bus.subscribe();
		loop {
			tokio::select! {
				event = events.recv() => {
					match event {
						Ok(StorefrontEvent::Order(OrderEvent::Placed { order })) => {
							tracing::info!(
								order_id = %storefront_types::truncate_id(&order.id),
								vendors = order.vendor_orders.len(),
								total = order.total_price,
								"Order placed"
							);
						}
						Ok(StorefrontEvent::Order(OrderEvent::StatusChanged { order_id, vendor_id, from, to })) => {
							tracing::info!(
								order_id = %storefront_types::truncate_id(&order_id),
								vendor_id = %storefront_types::truncate_id(&vendor_id),
								%from,
								%to,
								"Sub-order advanced"
							);
						}
						Ok(StorefrontEvent::Auth(event)) => {
							tracing::debug!(?event, "Auth event");
						}
						Err(tokio::sync::broadcast::error::RecvError::Lagged(missed)) => {
							tracing::warn!(missed, "Event log lagged");
						}
						Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
					}
				}

				_ = tokio::signal::ctrl_c() => {
					tracing::info!("Shutting down");
					break;
				}
			}
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::builder::{StorefrontBuilder, StorefrontFactories};
	use storefront_types::{CartItem, SecretString};

	async fn engine() -> StorefrontEngine {
		let config = Config::from_toml_str(
			r#"
[storefront]
name = "test"

[storage]
primary = "memory"

[storage.implementations.memory]

[auth]
primary = "local"

[auth.implementations.local]
"#,
		)
		.unwrap();
		StorefrontBuilder::new(config)
			.build(StorefrontFactories {
				storage_factories: storefront_storage::get_all_implementations()
					.into_iter()
					.map(|(name, factory)| (name.to_string(), factory))
					.collect(),
				auth_factories: storefront_auth::get_all_implementations()
					.into_iter()
					.map(|(name, factory)| (name.to_string(), factory))
					.collect(),
			})
			.await
			.unwrap()
	}

	fn cart_item(vendor: &str, price: u64, qty: u32) -> CartItem {
		CartItem {
			item_id: format!("item-{}", vendor),
			name: "Item".into(),
			unit_price: price,
			quantity: qty,
			vendor_id: Some(vendor.into()),
			vendor_name: Some(format!("Shop {}", vendor)),
			category: "Mains".into(),
			image_ref: None,
		}
	}

	#[tokio::test]
	async fn checkout_then_vendor_advance_end_to_end() {
		let engine = engine().await;
		let customer = engine
			.auth()
			.sign_up("c@example.com", &SecretString::from("pw"), Role::Customer)
			.await
			.unwrap()
			.user;
		let vendor_session = engine
			.auth()
			.sign_up("v@example.com", &SecretString::from("pw"), Role::Vendor)
			.await
			.unwrap();
		let vendor = vendor_session.user.clone();

		// Cart items reference the vendor's uid.
		let order = engine
			.place_order(
				&customer,
				CheckoutRequest {
					items: vec![CartItem {
						vendor_id: Some(vendor.uid.clone()),
						..cart_item("x", 500, 2)
					}],
					phone: "0300".into(),
					address: "Addr".into(),
				},
			)
			.await
			.unwrap();
		assert_eq!(order.total_price, 1000);

		// Advancing straight to Preparing is rejected.
		let err = engine
			.advance_sub_order(&vendor, &order.id, &vendor.uid, OrderStatus::Preparing)
			.await
			.unwrap_err();
		assert!(matches!(
			err,
			EngineError::OrderState(OrderStateError::InvalidTransition { .. })
		));

		// The legal successor is accepted and visible in the vendor view.
		engine
			.advance_sub_order(&vendor, &order.id, &vendor.uid, OrderStatus::Accepted)
			.await
			.unwrap();
		let view = engine.vendor_orders(&vendor).await.unwrap();
		assert_eq!(view.len(), 1);
		assert_eq!(view[0].vendor_orders[0].status, OrderStatus::Accepted);
	}

	#[tokio::test]
	async fn vendor_cannot_touch_another_vendors_sub_order() {
		let engine = engine().await;
		let customer = engine
			.auth()
			.sign_up("c@example.com", &SecretString::from("pw"), Role::Customer)
			.await
			.unwrap()
			.user;
		let v1 = engine
			.auth()
			.sign_up("v1@example.com", &SecretString::from("pw"), Role::Vendor)
			.await
			.unwrap()
			.user;
		let v2 = engine
			.auth()
			.sign_up("v2@example.com", &SecretString::from("pw"), Role::Vendor)
			.await
			.unwrap()
			.user;

		let order = engine
			.place_order(
				&customer,
				CheckoutRequest {
					items: vec![CartItem {
						vendor_id: Some(v1.uid.clone()),
						..cart_item("x", 100, 1)
					}],
					phone: "0300".into(),
					address: "Addr".into(),
				},
			)
			.await
			.unwrap();

		let err = engine
			.advance_sub_order(&v2, &order.id, &v1.uid, OrderStatus::Accepted)
			.await
			.unwrap_err();
		assert!(matches!(err, EngineError::Auth(AuthError::AccessDenied { .. })));

		// Customers cannot advance anything at all.
		let err = engine
			.advance_sub_order(&customer, &order.id, &v1.uid, OrderStatus::Accepted)
			.await
			.unwrap_err();
		assert!(matches!(err, EngineError::Auth(AuthError::AccessDenied { .. })));
	}

	#[tokio::test]
	async fn verification_is_admin_only() {
		let engine = engine().await;
		let vendor = engine
			.auth()
			.sign_up("v@example.com", &SecretString::from("pw"), Role::Vendor)
			.await
			.unwrap()
			.user;
		let admin = engine
			.auth()
			.sign_up("a@example.com", &SecretString::from("pw"), Role::Admin)
			.await
			.unwrap()
			.user;

		assert!(matches!(
			engine
				.set_vendor_verification(&vendor, &vendor.uid, true)
				.await,
			Err(EngineError::Auth(AuthError::AccessDenied { .. }))
		));
		let updated = engine
			.set_vendor_verification(&admin, &vendor.uid, true)
			.await
			.unwrap();
		assert!(updated.is_verified);
	}
}
