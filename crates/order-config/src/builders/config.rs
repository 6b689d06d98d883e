//! Configuration builder for creating test and development configurations.
//!
//! This module provides utilities for constructing Config instances with
//! sensible defaults, particularly useful for testing scenarios.

use crate::{ApiConfig, CatalogConfig, Config, LedgerConfig, ServiceConfig, SessionConfig};
use order_types::MatchStrategy;
use std::collections::HashMap;

/// Builder for creating `Config` instances with a fluent API.
///
/// Defaults to the in-memory catalog and ledger so a test configuration
/// needs no files or database.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
	service_id: String,
	context_lifespan: u32,
	catalog_primary: String,
	match_strategy: MatchStrategy,
	catalog_items: Vec<toml::Value>,
	ledger_primary: String,
	ledger_implementations: HashMap<String, toml::Value>,
	api: ApiConfig,
}

impl Default for ConfigBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigBuilder {
	/// Creates a new `ConfigBuilder` with default values suitable for testing.
	pub fn new() -> Self {
		Self {
			service_id: "test-webhook".to_string(),
			context_lifespan: 5,
			catalog_primary: "memory".to_string(),
			match_strategy: MatchStrategy::Substring,
			catalog_items: Vec::new(),
			ledger_primary: "memory".to_string(),
			ledger_implementations: HashMap::new(),
			api: ApiConfig::default(),
		}
	}

	/// Sets the service ID.
	pub fn service_id(mut self, id: impl Into<String>) -> Self {
		self.service_id = id.into();
		self
	}

	/// Sets the lifespan of the ongoing-order context.
	pub fn context_lifespan(mut self, lifespan: u32) -> Self {
		self.context_lifespan = lifespan;
		self
	}

	/// Sets the catalog tie-break policy.
	pub fn match_strategy(mut self, strategy: MatchStrategy) -> Self {
		self.match_strategy = strategy;
		self
	}

	/// Adds an item to the in-memory catalog. Prices are decimal strings.
	pub fn catalog_item(mut self, id: i64, name: &str, price: &str) -> Self {
		let mut item = toml::map::Map::new();
		item.insert("id".into(), toml::Value::Integer(id));
		item.insert("name".into(), toml::Value::String(name.into()));
		item.insert("price".into(), toml::Value::String(price.into()));
		self.catalog_items.push(toml::Value::Table(item));
		self
	}

	/// Uses the given ledger implementation as primary.
	pub fn ledger(mut self, primary: impl Into<String>, config: toml::Value) -> Self {
		let primary = primary.into();
		self.ledger_implementations.insert(primary.clone(), config);
		self.ledger_primary = primary;
		self
	}

	/// Sets the API configuration.
	pub fn api(mut self, api: ApiConfig) -> Self {
		self.api = api;
		self
	}

	/// Builds the `Config` with the configured values.
	pub fn build(self) -> Config {
		let mut memory_catalog = toml::map::Map::new();
		memory_catalog.insert("items".into(), toml::Value::Array(self.catalog_items));

		let mut ledger_implementations = self.ledger_implementations;
		ledger_implementations
			.entry(self.ledger_primary.clone())
			.or_insert_with(|| toml::Value::Table(toml::map::Map::new()));

		Config {
			service: ServiceConfig {
				id: self.service_id,
			},
			session: SessionConfig {
				context_lifespan: self.context_lifespan,
			},
			catalog: CatalogConfig {
				primary: self.catalog_primary,
				match_strategy: self.match_strategy,
				implementations: HashMap::from([(
					"memory".to_string(),
					toml::Value::Table(memory_catalog),
				)]),
			},
			ledger: LedgerConfig {
				primary: self.ledger_primary,
				implementations: ledger_implementations,
			},
			api: self.api,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_builder_produces_valid_config() {
		let config = ConfigBuilder::new()
			.catalog_item(1, "Burger", "8.50")
			.match_strategy(MatchStrategy::ExactFirst)
			.build();

		assert!(config.validate().is_ok());
		assert_eq!(config.ledger.primary, "memory");
		let items = config.catalog.implementations["memory"]["items"]
			.as_array()
			.unwrap();
		assert_eq!(items.len(), 1);
		assert_eq!(items[0]["name"].as_str(), Some("Burger"));
	}
}
