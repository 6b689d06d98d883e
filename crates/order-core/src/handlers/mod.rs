//! Intent handlers.
//!
//! One handler per family of intents: basket edits, checkout and order
//! tracking. Handlers never fail: every branch, including backend failures,
//! ends in a [`WebhookResponse`](order_types::WebhookResponse) the customer
//! can read.

pub mod basket;
pub mod checkout;
pub mod tracking;

pub use basket::BasketHandler;
pub use checkout::CheckoutHandler;
pub use tracking::TrackingHandler;

/// Reply used by every session-scoped intent when no session id could be
/// extracted from the request.
pub const NO_SESSION_MESSAGE: &str =
	"I'm having trouble finding your order. Sorry! Can you place a new order please?";

/// Slot carrying food names.
pub(crate) const FOOD_SLOT: &str = "food";
/// Slot carrying quantities, positionally aligned with [`FOOD_SLOT`].
pub(crate) const QUANTITY_SLOT: &str = "quantity";
