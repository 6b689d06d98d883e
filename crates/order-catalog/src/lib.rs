//! Catalog lookup for the food-order webhook.
//!
//! This module resolves the free-text food names a customer speaks to
//! canonical menu items. Backends only answer "which rows contain this
//! fragment"; the [`CatalogService`] decides which candidate wins according
//! to the configured [`MatchStrategy`].

use async_trait::async_trait;
use order_types::{CatalogItem, ConfigSchema, ImplementationRegistry, MatchStrategy};
use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod memory;
	pub mod sqlite;
}

/// Errors that can occur during catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
	/// Error that occurs in the catalog backend.
	#[error("Backend error: {0}")]
	Backend(String),
	/// Error that occurs during configuration validation.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Trait defining the interface for catalog backends.
#[async_trait]
pub trait CatalogInterface: Send + Sync {
	/// Returns every item whose name contains `fragment`, compared
	/// case-insensitively, in the backend's default ordering.
	async fn candidates(&self, fragment: &str) -> Result<Vec<CatalogItem>, CatalogError>;

	/// Returns the configuration schema for validation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;
}

/// Type alias for catalog factory functions.
pub type CatalogFactory = fn(&toml::Value) -> Result<Box<dyn CatalogInterface>, CatalogError>;

/// Registry trait for catalog implementations.
pub trait CatalogRegistry: ImplementationRegistry<Factory = CatalogFactory> {}

/// Get all registered catalog implementations.
///
/// Returns a vector of (name, factory) tuples for all available catalog implementations.
pub fn get_all_implementations() -> Vec<(&'static str, CatalogFactory)> {
	use implementations::{memory, sqlite};

	vec![
		(memory::Registry::NAME, memory::Registry::factory()),
		(sqlite::Registry::NAME, sqlite::Registry::factory()),
	]
}

/// High-level catalog service applying the match policy.
pub struct CatalogService {
	backend: Box<dyn CatalogInterface>,
	strategy: MatchStrategy,
}

impl CatalogService {
	pub fn new(backend: Box<dyn CatalogInterface>, strategy: MatchStrategy) -> Self {
		Self { backend, strategy }
	}

	/// Resolves a spoken food name to a catalog item.
	///
	/// Not-found is `Ok(None)` so callers can skip the item and carry on.
	pub async fn resolve(&self, food_name: &str) -> Result<Option<CatalogItem>, CatalogError> {
		let fragment = food_name.trim();
		if fragment.is_empty() {
			return Ok(None);
		}

		let candidates = self.backend.candidates(fragment).await?;
		let chosen = match self.strategy {
			MatchStrategy::Substring => candidates.into_iter().next(),
			MatchStrategy::ExactFirst => {
				let wanted = fragment.to_lowercase();
				let exact = candidates
					.iter()
					.position(|item| item.name.to_lowercase() == wanted)
					.unwrap_or(0);
				candidates.into_iter().nth(exact)
			},
		};

		if let Some(item) = &chosen {
			tracing::debug!(food = %fragment, item_id = item.id, item = %item.name, "Resolved catalog item");
		}
		Ok(chosen)
	}
}

/// Case-insensitive substring test every backend matches names with.
pub(crate) fn name_matches(name: &str, fragment: &str) -> bool {
	name.to_lowercase().contains(&fragment.to_lowercase())
}

/// Reads an `items = [{ id, name, price }]` array from a backend table.
///
/// Prices may be decimal strings, integers or floats.
pub(crate) fn items_from_config(config: &toml::Value) -> Result<Vec<CatalogItem>, CatalogError> {
	let Some(items) = config.get("items").and_then(|v| v.as_array()) else {
		return Ok(Vec::new());
	};

	items
		.iter()
		.enumerate()
		.map(|(i, item)| {
			let id = item
				.get("id")
				.and_then(|v| v.as_integer())
				.ok_or_else(|| CatalogError::Configuration(format!("items[{}].id is required", i)))?;
			let name = item
				.get("name")
				.and_then(|v| v.as_str())
				.ok_or_else(|| {
					CatalogError::Configuration(format!("items[{}].name is required", i))
				})?;
			let price = item
				.get("price")
				.ok_or_else(|| {
					CatalogError::Configuration(format!("items[{}].price is required", i))
				})
				.and_then(|v| parse_price(v).map_err(CatalogError::Configuration))?;

			Ok(CatalogItem {
				id,
				name: name.to_string(),
				price,
			})
		})
		.collect()
}

pub(crate) fn parse_price(value: &toml::Value) -> Result<Decimal, String> {
	let price = match value {
		toml::Value::String(s) => Decimal::from_str(s.trim()).map_err(|e| e.to_string())?,
		toml::Value::Integer(i) => Decimal::from(*i),
		toml::Value::Float(f) => Decimal::try_from(*f).map_err(|e| e.to_string())?,
		other => return Err(format!("price must be a number or string, got {}", other.type_str())),
	};
	if price.is_sign_negative() {
		return Err(format!("price cannot be negative: {}", price));
	}
	Ok(price)
}

#[cfg(test)]
mod tests {
	use super::*;
	use implementations::memory::MemoryCatalog;

	fn item(id: i64, name: &str, price: &str) -> CatalogItem {
		CatalogItem {
			id,
			name: name.into(),
			price: Decimal::from_str(price).unwrap(),
		}
	}

	fn catalog(strategy: MatchStrategy) -> CatalogService {
		let backend = MemoryCatalog::new(vec![
			item(1, "Curly Fries", "3.00"),
			item(2, "Fries", "2.50"),
			item(3, "Burger", "8.50"),
		]);
		CatalogService::new(Box::new(backend), strategy)
	}

	#[tokio::test]
	async fn test_substring_takes_first_row() {
		let service = catalog(MatchStrategy::Substring);
		let resolved = service.resolve("fries").await.unwrap().unwrap();
		assert_eq!(resolved.id, 1);
	}

	#[tokio::test]
	async fn test_exact_first_prefers_exact_name() {
		let service = catalog(MatchStrategy::ExactFirst);
		let resolved = service.resolve("FRIES").await.unwrap().unwrap();
		assert_eq!(resolved.id, 2);

		// No exact match falls back to the first candidate
		let resolved = service.resolve("urge").await.unwrap().unwrap();
		assert_eq!(resolved.id, 3);
	}

	#[tokio::test]
	async fn test_miss_is_none() {
		let service = catalog(MatchStrategy::Substring);
		assert!(service.resolve("Sushi").await.unwrap().is_none());
		assert!(service.resolve("   ").await.unwrap().is_none());
	}

	#[test]
	fn test_items_from_config() {
		let config: toml::Value = toml::from_str(
			r#"items = [
				{ id = 1, name = "Burger", price = "8.50" },
				{ id = 2, name = "Lassi", price = 3 },
				{ id = 3, name = "Samosa", price = 1.25 },
			]"#,
		)
		.unwrap();

		let items = items_from_config(&config).unwrap();
		assert_eq!(items.len(), 3);
		assert_eq!(items[0].price, Decimal::from_str("8.50").unwrap());
		assert_eq!(items[1].price, Decimal::from(3));
		assert_eq!(items[2].price, Decimal::from_str("1.25").unwrap());
	}

	#[test]
	fn test_negative_price_rejected() {
		let config: toml::Value =
			toml::from_str(r#"items = [{ id = 1, name = "Burger", price = "-1" }]"#).unwrap();
		assert!(matches!(
			items_from_config(&config),
			Err(CatalogError::Configuration(_))
		));
	}
}
