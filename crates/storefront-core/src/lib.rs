//! Core engine for the storefront system.
//!
//! This module provides the orchestration layer: the event bus, the
//! sub-order state machine, the live order observer, and the engine
//! that wires checkout, fulfillment, identity, and catalog together
//! behind explicit role guards.

pub mod builder;
pub mod engine;
pub mod event_bus;
pub mod observer;
pub mod state;

pub use builder::{BuilderError, StorefrontBuilder, StorefrontFactories};
pub use engine::{EngineError, StorefrontEngine};
pub use event_bus::EventBus;
pub use observer::{OrderObserver, OrderSnapshotStream, OrderSubscription};
pub use state::{OrderStateError, OrderStateMachine};
