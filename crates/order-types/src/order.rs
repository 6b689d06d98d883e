//! Finalized order types.
//!
//! A finalized order is persisted as a header, one line per resolved basket
//! entry, and a tracking row. The header and lines are written together; the
//! tracking row is written separately and may be missing.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Generated identifier of an order header.
pub type OrderId = i64;

/// Status every tracking row starts with.
pub const PENDING_STATUS: &str = "Pending";

/// One persisted line of a finalized order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
	pub item_id: i64,
	pub item_name: String,
	pub quantity: u32,
	pub unit_price: Decimal,
	/// `unit_price * quantity`, priced at completion time.
	pub total_price: Decimal,
}

impl OrderLine {
	pub fn new(item_id: i64, item_name: impl Into<String>, quantity: u32, unit_price: Decimal) -> Self {
		Self {
			item_id,
			item_name: item_name.into(),
			quantity,
			unit_price,
			total_price: unit_price * Decimal::from(quantity),
		}
	}
}

/// Whether the tracking row of a committed order was written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TrackingState {
	/// Tracking row exists with the initial status.
	Recorded,
	/// Header and lines are committed but the tracking insert failed.
	/// Status queries report no information until the row is repaired.
	Missing { reason: String },
}

/// Result of finalizing a basket.
///
/// Committing the header and lines is all-or-nothing; the tracking row is a
/// second write whose failure leaves `tracking` as [`TrackingState::Missing`]
/// without undoing the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalizeOutcome {
	pub order_id: OrderId,
	pub lines: Vec<OrderLine>,
	/// Basket names that matched nothing in the catalog.
	pub skipped: Vec<String>,
	pub tracking: TrackingState,
}

impl FinalizeOutcome {
	pub fn total(&self) -> Decimal {
		self.lines.iter().map(|line| line.total_price).sum()
	}

	pub fn is_fully_recorded(&self) -> bool {
		matches!(self.tracking, TrackingState::Recorded)
	}
}
