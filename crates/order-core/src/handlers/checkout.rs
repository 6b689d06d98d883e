//! Checkout handler for the complete intent.
//!
//! Completion drains the basket and hands it to the ledger while holding the
//! session lock, so a repeated complete sees an empty basket and a
//! concurrent add waits until the order is written.

use crate::handlers::NO_SESSION_MESSAGE;
use crate::session::SessionStore;
use order_catalog::CatalogService;
use order_ledger::LedgerService;
use order_types::{FinalizeOutcome, WebhookRequest, WebhookResponse};
use std::sync::Arc;

/// Handler that turns a session's basket into a finalized order.
pub struct CheckoutHandler {
	sessions: Arc<SessionStore>,
	catalog: Arc<CatalogService>,
	ledger: Arc<LedgerService>,
}

impl CheckoutHandler {
	pub fn new(
		sessions: Arc<SessionStore>,
		catalog: Arc<CatalogService>,
		ledger: Arc<LedgerService>,
	) -> Self {
		Self {
			sessions,
			catalog,
			ledger,
		}
	}

	pub async fn complete(&self, request: &WebhookRequest) -> WebhookResponse {
		let Some(session_id) = request.session_id() else {
			tracing::warn!("Complete request without a session context");
			return WebhookResponse::text(NO_SESSION_MESSAGE);
		};

		let mut basket = self.sessions.lock(&session_id).await;
		if basket.is_empty() {
			return WebhookResponse::text("Your order was empty. Nothing to complete.");
		}

		let drained = basket.take();
		match self
			.ledger
			.finalize(&drained, basket.session_id(), &self.catalog)
			.await
		{
			Ok(outcome) => {
				if !outcome.is_fully_recorded() {
					tracing::warn!(
						order_id = outcome.order_id,
						tracking = ?outcome.tracking,
						"Order placed without tracking"
					);
				}
				tracing::info!(session = %session_id, order_id = outcome.order_id, "Order placed");
				WebhookResponse::text(confirmation(&outcome))
			},
			Err(e) => {
				tracing::error!(session = %session_id, error = %e, "Failed to place order");
				// Nothing was written; give the customer their basket back
				*basket = drained;
				WebhookResponse::text(
					"Sorry, I couldn't place your order right now. Please try again.",
				)
			},
		}
	}
}

fn confirmation(outcome: &FinalizeOutcome) -> String {
	let mut total = outcome.total();
	total.rescale(2);
	let mut text = format!(
		"Awesome. Your order has been placed! Your order ID is {}. Your total is {}.",
		outcome.order_id, total
	);
	if !outcome.skipped.is_empty() {
		text.push_str(&format!(
			" I couldn't find these items on the menu: {}.",
			outcome.skipped.join(", ")
		));
	}
	text
}

#[cfg(test)]
mod tests {
	use super::*;
	use order_types::{OrderLine, TrackingState};
	use rust_decimal::Decimal;

	#[test]
	fn test_confirmation_lists_skipped_items() {
		let outcome = FinalizeOutcome {
			order_id: 12,
			lines: vec![OrderLine::new(1, "Burger", 2, Decimal::new(850, 2))],
			skipped: vec!["Dragon Roll".into()],
			tracking: TrackingState::Recorded,
		};

		assert_eq!(
			confirmation(&outcome),
			"Awesome. Your order has been placed! Your order ID is 12. Your total is 17.00. \
			 I couldn't find these items on the menu: Dragon Roll."
		);
	}

	#[test]
	fn test_confirmation_always_shows_cents() {
		let outcome = FinalizeOutcome {
			order_id: 3,
			lines: vec![
				OrderLine::new(4, "Pav Bhaji", 2, Decimal::from(6)),
				OrderLine::new(5, "Chai", 1, Decimal::new(125, 2)),
			],
			skipped: vec![],
			tracking: TrackingState::Recorded,
		};

		assert_eq!(
			confirmation(&outcome),
			"Awesome. Your order has been placed! Your order ID is 3. Your total is 13.25."
		);

		let whole = FinalizeOutcome {
			lines: vec![OrderLine::new(4, "Pav Bhaji", 2, Decimal::from(6))],
			..outcome
		};
		assert!(confirmation(&whole).ends_with("Your total is 12.00."));
	}
}
