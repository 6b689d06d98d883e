//! Order ledger for the food-order webhook.
//!
//! This module durably records finalized orders. A finalized order is a
//! header, one line per resolved basket entry, and a tracking row. Backends
//! commit the header and lines as one unit; the tracking row is a separate
//! write whose failure is tolerated and reported in the outcome rather than
//! undoing the order.

use async_trait::async_trait;
use order_catalog::CatalogService;
use order_types::{
	Basket, ConfigSchema, FinalizeOutcome, ImplementationRegistry, OrderId, OrderLine, SessionId,
	TrackingState, PENDING_STATUS,
};
use thiserror::Error;
use tracing::instrument;

/// Re-export implementations
pub mod implementations {
	pub mod memory;
	pub mod sqlite;
}

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
	/// Error that occurs when the referenced order does not exist.
	#[error("Order not found: {0}")]
	NotFound(OrderId),
	/// Error that occurs in the ledger backend.
	#[error("Backend error: {0}")]
	Backend(String),
	/// Error that occurs during configuration validation.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Trait defining the interface for order-ledger backends.
#[async_trait]
pub trait LedgerInterface: Send + Sync {
	/// Inserts a header for `session_id` and all `lines` in one transaction
	/// and returns the generated order id. Nothing is written on error.
	async fn commit_order(
		&self,
		session_id: &SessionId,
		lines: &[OrderLine],
	) -> Result<OrderId, LedgerError>;

	/// Inserts the tracking row of a committed order.
	async fn insert_tracking(&self, order_id: OrderId, status: &str) -> Result<(), LedgerError>;

	/// Latest tracking status, `None` if there is no tracking row.
	async fn status_of(&self, order_id: OrderId) -> Result<Option<String>, LedgerError>;

	/// Creates or replaces the tracking row of an existing order.
	/// Fails with [`LedgerError::NotFound`] if no header has this id.
	async fn set_status(&self, order_id: OrderId, status: &str) -> Result<(), LedgerError>;

	/// Returns the configuration schema for validation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;
}

/// Type alias for ledger factory functions.
pub type LedgerFactory = fn(&toml::Value) -> Result<Box<dyn LedgerInterface>, LedgerError>;

/// Registry trait for ledger implementations.
pub trait LedgerRegistry: ImplementationRegistry<Factory = LedgerFactory> {}

/// Get all registered ledger implementations.
///
/// Returns a vector of (name, factory) tuples for all available ledger implementations.
pub fn get_all_implementations() -> Vec<(&'static str, LedgerFactory)> {
	use implementations::{memory, sqlite};

	vec![
		(memory::Registry::NAME, memory::Registry::factory()),
		(sqlite::Registry::NAME, sqlite::Registry::factory()),
	]
}

/// High-level ledger service.
///
/// Wraps a backend and implements the finalize sequence on top of it.
pub struct LedgerService {
	backend: Box<dyn LedgerInterface>,
}

impl LedgerService {
	/// Creates a new LedgerService with the specified backend.
	pub fn new(backend: Box<dyn LedgerInterface>) -> Self {
		Self { backend }
	}

	/// Persists a basket as a finalized order.
	///
	/// 1. Every entry is resolved against the catalog. Misses are skipped, and
	///    so are entries whose lookup failed, so one bad name cannot sink
	///    the order.
	/// 2. Header and resolved lines are committed together. A header is
	///    written even if every entry was skipped.
	/// 3. The tracking row is inserted with the pending status. Its failure
	///    is logged and returned as [`TrackingState::Missing`].
	///
	/// Only a failure in step 2 is an error; in that case nothing was written.
	#[instrument(skip_all, fields(session = %session_id, items = basket.len()))]
	pub async fn finalize(
		&self,
		basket: &Basket,
		session_id: &SessionId,
		catalog: &CatalogService,
	) -> Result<FinalizeOutcome, LedgerError> {
		let mut lines = Vec::with_capacity(basket.len());
		let mut skipped = Vec::new();

		for entry in basket {
			match catalog.resolve(&entry.name).await {
				Ok(Some(item)) => {
					lines.push(OrderLine::new(item.id, item.name, entry.quantity, item.price));
				},
				Ok(None) => {
					tracing::warn!(food = %entry.name, "Item not found in catalog, skipping");
					skipped.push(entry.name.clone());
				},
				Err(e) => {
					tracing::warn!(food = %entry.name, error = %e, "Catalog lookup failed, skipping");
					skipped.push(entry.name.clone());
				},
			}
		}

		let order_id = self.backend.commit_order(session_id, &lines).await?;
		tracing::info!(order_id, lines = lines.len(), skipped = skipped.len(), "Committed order");

		let tracking = match self.backend.insert_tracking(order_id, PENDING_STATUS).await {
			Ok(()) => TrackingState::Recorded,
			Err(e) => {
				tracing::error!(
					order_id,
					error = %e,
					"Failed to initialize order tracking; order is committed without a status"
				);
				TrackingState::Missing {
					reason: e.to_string(),
				}
			},
		};

		Ok(FinalizeOutcome {
			order_id,
			lines,
			skipped,
			tracking,
		})
	}

	/// Latest tracking status of an order. Absence is `Ok(None)`.
	pub async fn status_of(&self, order_id: OrderId) -> Result<Option<String>, LedgerError> {
		self.backend.status_of(order_id).await
	}

	/// Sets the tracking status of an existing order, creating the row if it
	/// was never written.
	pub async fn set_status(&self, order_id: OrderId, status: &str) -> Result<(), LedgerError> {
		self.backend.set_status(order_id, status).await?;
		tracing::info!(order_id, status, "Updated order status");
		Ok(())
	}
}
