//! In-memory catalog backend.
//!
//! Items come straight from configuration. The default ordering is the order
//! the items were listed in.

use crate::{
	items_from_config, name_matches, CatalogError, CatalogFactory, CatalogInterface, CatalogRegistry,
};
use async_trait::async_trait;
use order_types::{
	CatalogItem, ConfigSchema, Field, FieldType, ImplementationRegistry, Schema, ValidationError,
};

/// Catalog held in a plain vector.
pub struct MemoryCatalog {
	items: Vec<CatalogItem>,
}

impl MemoryCatalog {
	pub fn new(items: Vec<CatalogItem>) -> Self {
		Self { items }
	}
}

#[async_trait]
impl CatalogInterface for MemoryCatalog {
	async fn candidates(&self, fragment: &str) -> Result<Vec<CatalogItem>, CatalogError> {
		Ok(self
			.items
			.iter()
			.filter(|item| name_matches(&item.name, fragment))
			.cloned()
			.collect())
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(MemoryCatalogSchema)
	}
}

/// Configuration schema for MemoryCatalog.
pub struct MemoryCatalogSchema;

impl MemoryCatalogSchema {
	/// Schema of one `items` entry, shared with the sqlite seed list.
	pub(crate) fn item_schema() -> Schema {
		Schema::new(
			vec![
				Field::new(
					"id",
					FieldType::Integer {
						min: Some(1),
						max: None,
					},
				),
				Field::new("name", FieldType::String).with_validator(|v| {
					match v.as_str().map(str::trim) {
						Some("") | None => Err("name cannot be empty".into()),
						Some(_) => Ok(()),
					}
				}),
			],
			// price is checked when parsed; it may be a string or a number
			vec![],
		)
	}
}

impl ConfigSchema for MemoryCatalogSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![],
			vec![Field::new(
				"items",
				FieldType::Array(Box::new(FieldType::Table(Self::item_schema()))),
			)],
		);
		schema.validate(config)
	}
}

/// Factory function to create a memory catalog from configuration.
///
/// Configuration parameters:
/// - `items`: array of `{ id, name, price }` tables (default: empty)
pub fn create_catalog(config: &toml::Value) -> Result<Box<dyn CatalogInterface>, CatalogError> {
	MemoryCatalogSchema
		.validate(config)
		.map_err(|e| CatalogError::Configuration(e.to_string()))?;

	let items = items_from_config(config)?;
	if items.is_empty() {
		tracing::warn!("Memory catalog configured without items; every lookup will miss");
	}
	Ok(Box::new(MemoryCatalog::new(items)))
}

/// Registry for the memory catalog implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "memory";
	type Factory = CatalogFactory;

	fn factory() -> Self::Factory {
		create_catalog
	}
}

impl CatalogRegistry for Registry {}
