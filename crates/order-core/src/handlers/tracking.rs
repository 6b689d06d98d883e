//! Tracking handler for the order-status intent.

use order_ledger::LedgerService;
use order_types::{coerce_integer, SlotValues, WebhookRequest, WebhookResponse};
use std::sync::Arc;

/// Slots the order id may arrive in, in order of preference.
const ORDER_ID_SLOTS: [&str; 2] = ["number", "order_id"];

/// Handler answering "where is my order" questions.
///
/// Needs no session: the order id alone identifies the order.
pub struct TrackingHandler {
	ledger: Arc<LedgerService>,
}

impl TrackingHandler {
	pub fn new(ledger: Arc<LedgerService>) -> Self {
		Self { ledger }
	}

	pub async fn track(&self, request: &WebhookRequest) -> WebhookResponse {
		let order_id = ORDER_ID_SLOTS
			.iter()
			.map(|slot| SlotValues::from_parameters(request.parameters(), slot))
			.find(|values| !values.is_empty())
			.and_then(|values| values.first().and_then(coerce_integer));

		let Some(order_id) = order_id else {
			return WebhookResponse::text(
				"I didn't catch your order ID. Could you please repeat it?",
			);
		};

		match self.ledger.status_of(order_id).await {
			Ok(Some(status)) => {
				WebhookResponse::text(format!("Status for order {}: {}", order_id, status))
			},
			Ok(None) => WebhookResponse::text(format!(
				"No tracking information found for order ID {}",
				order_id
			)),
			Err(e) => {
				tracing::error!(order_id, error = %e, "Failed to look up order status");
				WebhookResponse::text(format!(
					"Sorry, I couldn't look up order {} right now. Please try again later.",
					order_id
				))
			},
		}
	}
}
