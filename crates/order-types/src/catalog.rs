//! Catalog reference types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Immutable menu entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
	pub id: i64,
	pub name: String,
	pub price: Decimal,
}

/// Tie-break policy when several catalog names contain the spoken name.
///
/// `Substring` takes the first row in the store's default ordering.
/// `ExactFirst` prefers a case-insensitive exact match and falls back to
/// `Substring`. Which one the product wants is still open, so it is
/// configurable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
	#[default]
	Substring,
	ExactFirst,
}

impl MatchStrategy {
	pub fn as_str(&self) -> &'static str {
		match self {
			MatchStrategy::Substring => "substring",
			MatchStrategy::ExactFirst => "exact_first",
		}
	}
}
