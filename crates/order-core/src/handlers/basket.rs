//! Basket handler for the add and remove intents.

use crate::handlers::{FOOD_SLOT, NO_SESSION_MESSAGE, QUANTITY_SLOT};
use crate::session::SessionStore;
use order_types::{OutputContext, SlotValues, WebhookRequest, WebhookResponse};
use std::sync::Arc;

/// Name of the context that keeps the conversation in ordering mode.
pub const ONGOING_ORDER_CONTEXT: &str = "ongoing-order";

/// Handler for intents that edit a session's basket.
pub struct BasketHandler {
	sessions: Arc<SessionStore>,
	context_lifespan: u32,
}

impl BasketHandler {
	pub fn new(sessions: Arc<SessionStore>, context_lifespan: u32) -> Self {
		Self {
			sessions,
			context_lifespan,
		}
	}

	/// Adds the spoken items to the basket.
	///
	/// Quantities pair with food names by position; a missing or unusable
	/// quantity counts as one.
	pub async fn add(&self, request: &WebhookRequest) -> WebhookResponse {
		let Some(session_id) = request.session_id() else {
			tracing::warn!("Add request without a session context");
			return WebhookResponse::text(NO_SESSION_MESSAGE);
		};

		let foods = SlotValues::from_parameters(request.parameters(), FOOD_SLOT).strings();
		if foods.is_empty() {
			return WebhookResponse::text("I didn't catch what you'd like to add. Can you repeat?");
		}

		let quantities = SlotValues::from_parameters(request.parameters(), QUANTITY_SLOT);
		let items: Vec<(String, u32)> = foods
			.into_iter()
			.enumerate()
			.map(|(i, name)| (name, quantities.quantity_at(i)))
			.collect();

		let basket = self.sessions.add_items(&session_id, &items).await;
		tracing::debug!(session = %session_id, basket = %basket, "Added items");

		let added = items
			.iter()
			.map(|(name, quantity)| format!("{} x {}", quantity, name))
			.collect::<Vec<_>>()
			.join(", ");
		let response = WebhookResponse::text(format!(
			"Added to your order: {}. So far you have: {}. Anything else?",
			added, basket
		));

		if request.session.trim().is_empty() {
			return response;
		}
		response.with_context(OutputContext::for_session(
			&request.session,
			ONGOING_ORDER_CONTEXT,
			self.context_lifespan,
		))
	}

	/// Deletes the named entries from the basket.
	///
	/// The reply names every item asked for, whether or not it was present.
	pub async fn remove(&self, request: &WebhookRequest) -> WebhookResponse {
		let Some(session_id) = request.session_id() else {
			tracing::warn!("Remove request without a session context");
			return WebhookResponse::text(NO_SESSION_MESSAGE);
		};

		let foods = SlotValues::from_parameters(request.parameters(), FOOD_SLOT).strings();
		if foods.is_empty() {
			return WebhookResponse::text("I didn't catch which item to remove. Please specify.");
		}

		let remaining = self.sessions.remove_items(&session_id, &foods).await;
		tracing::debug!(session = %session_id, basket = %remaining, "Removed items");

		let mut text = format!("Removed from your order: {}.", foods.join(", "));
		if remaining.is_empty() {
			text.push_str(" Your order is now empty.");
		} else {
			text.push_str(&format!(" You still have: {}.", remaining));
		}
		WebhookResponse::text(text)
	}
}
