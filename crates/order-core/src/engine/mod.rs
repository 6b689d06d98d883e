//! Order engine: routes webhook turns to intent handlers.
//!
//! The engine owns the session store and the catalog and ledger services
//! and exposes the status operations used by the auxiliary HTTP routes.

use crate::handlers::{BasketHandler, CheckoutHandler, TrackingHandler};
use crate::session::SessionStore;
use order_catalog::CatalogService;
use order_config::Config;
use order_ledger::{LedgerError, LedgerService};
use order_types::{Intent, OrderId, WebhookRequest, WebhookResponse};
use std::sync::Arc;
use thiserror::Error;
use tracing::instrument;

/// Errors returned by the engine's status operations.
#[derive(Debug, Error)]
pub enum EngineError {
	#[error("Order not found: {0}")]
	OrderNotFound(OrderId),
	#[error("Invalid input: {0}")]
	InvalidInput(String),
	#[error("Service error: {0}")]
	Service(String),
}

impl From<LedgerError> for EngineError {
	fn from(err: LedgerError) -> Self {
		match err {
			LedgerError::NotFound(order_id) => EngineError::OrderNotFound(order_id),
			other => EngineError::Service(other.to_string()),
		}
	}
}

/// Routes each webhook turn to the handler for its intent.
#[derive(Clone)]
pub struct OrderEngine {
	config: Config,
	sessions: Arc<SessionStore>,
	ledger: Arc<LedgerService>,
	basket_handler: Arc<BasketHandler>,
	checkout_handler: Arc<CheckoutHandler>,
	tracking_handler: Arc<TrackingHandler>,
}

impl OrderEngine {
	pub fn new(
		config: Config,
		sessions: Arc<SessionStore>,
		catalog: Arc<CatalogService>,
		ledger: Arc<LedgerService>,
	) -> Self {
		let basket_handler = Arc::new(BasketHandler::new(
			sessions.clone(),
			config.session.context_lifespan,
		));
		let checkout_handler = Arc::new(CheckoutHandler::new(
			sessions.clone(),
			catalog,
			ledger.clone(),
		));
		let tracking_handler = Arc::new(TrackingHandler::new(ledger.clone()));

		Self {
			config,
			sessions,
			ledger,
			basket_handler,
			checkout_handler,
			tracking_handler,
		}
	}

	/// Handles one fulfillment request. Always produces a response.
	#[instrument(skip_all, fields(intent = %request.query_result.intent.display_name))]
	pub async fn handle(&self, request: &WebhookRequest) -> WebhookResponse {
		match request.intent() {
			Intent::Add => self.basket_handler.add(request).await,
			Intent::Remove => self.basket_handler.remove(request).await,
			Intent::Complete => self.checkout_handler.complete(request).await,
			Intent::Track => self.tracking_handler.track(request).await,
			Intent::Unknown(name) => {
				tracing::warn!(intent = %name, "Unhandled intent");
				WebhookResponse::text(format!("Sorry, I don't know how to handle `{}`.", name))
			},
		}
	}

	/// Current tracking status of an order, if any.
	pub async fn order_status(&self, order_id: OrderId) -> Result<Option<String>, EngineError> {
		Ok(self.ledger.status_of(order_id).await?)
	}

	/// Sets the tracking status of an existing order.
	pub async fn update_order_status(
		&self,
		order_id: OrderId,
		status: &str,
	) -> Result<(), EngineError> {
		let status = status.trim();
		if status.is_empty() {
			return Err(EngineError::InvalidInput("status cannot be empty".into()));
		}
		Ok(self.ledger.set_status(order_id, status).await?)
	}

	pub fn config(&self) -> &Config {
		&self.config
	}

	pub fn sessions(&self) -> &Arc<SessionStore> {
		&self.sessions
	}
}
