//! Builder pattern for constructing order engines.
//!
//! Composes an OrderEngine from catalog and ledger implementations created
//! by factory functions keyed by implementation name.

use crate::engine::OrderEngine;
use crate::session::SessionStore;
use order_catalog::{CatalogError, CatalogInterface, CatalogService};
use order_config::Config;
use order_ledger::{LedgerError, LedgerInterface, LedgerService};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur during engine construction.
#[derive(Debug, Error)]
pub enum BuilderError {
	#[error("Configuration error: {0}")]
	Config(String),
}

/// Factory functions for every pluggable component of the engine.
pub struct OrderFactories<CF, LF> {
	pub catalog_factories: HashMap<String, CF>,
	pub ledger_factories: HashMap<String, LF>,
}

/// Builder for constructing an OrderEngine with pluggable implementations.
pub struct OrderEngineBuilder {
	config: Config,
}

impl OrderEngineBuilder {
	pub fn new(config: Config) -> Self {
		Self { config }
	}

	/// Builds the engine from the primary catalog and ledger.
	///
	/// Every configured implementation with a known factory is created, so
	/// a broken secondary configuration is reported at startup. Must be
	/// called from within a Tokio runtime.
	pub fn build<CF, LF>(self, factories: OrderFactories<CF, LF>) -> Result<OrderEngine, BuilderError>
	where
		CF: Fn(&toml::Value) -> Result<Box<dyn CatalogInterface>, CatalogError>,
		LF: Fn(&toml::Value) -> Result<Box<dyn LedgerInterface>, LedgerError>,
	{
		// Create catalog implementations
		let mut catalog_impls = HashMap::new();
		for (name, config) in &self.config.catalog.implementations {
			if let Some(factory) = factories.catalog_factories.get(name) {
				match factory(config) {
					Ok(implementation) => {
						catalog_impls.insert(name.clone(), implementation);
						let is_primary = &self.config.catalog.primary == name;
						tracing::info!(component = "catalog", implementation = %name, enabled = %is_primary, "Loaded");
					},
					Err(e) => {
						tracing::error!(
							component = "catalog",
							implementation = %name,
							error = %e,
							"Failed to create catalog implementation"
						);
						return Err(BuilderError::Config(format!(
							"Failed to create catalog implementation '{}': {}",
							name, e
						)));
					},
				}
			} else {
				tracing::warn!(component = "catalog", implementation = %name, "Unknown implementation, ignoring");
			}
		}

		let primary_catalog = &self.config.catalog.primary;
		let catalog_backend = catalog_impls.remove(primary_catalog).ok_or_else(|| {
			BuilderError::Config(format!(
				"Primary catalog '{}' failed to load or has invalid configuration",
				primary_catalog
			))
		})?;
		let catalog = Arc::new(CatalogService::new(
			catalog_backend,
			self.config.catalog.match_strategy,
		));

		// Create ledger implementations
		let mut ledger_impls = HashMap::new();
		for (name, config) in &self.config.ledger.implementations {
			if let Some(factory) = factories.ledger_factories.get(name) {
				match factory(config) {
					Ok(implementation) => {
						ledger_impls.insert(name.clone(), implementation);
						let is_primary = &self.config.ledger.primary == name;
						tracing::info!(component = "ledger", implementation = %name, enabled = %is_primary, "Loaded");
					},
					Err(e) => {
						tracing::error!(
							component = "ledger",
							implementation = %name,
							error = %e,
							"Failed to create ledger implementation"
						);
						return Err(BuilderError::Config(format!(
							"Failed to create ledger implementation '{}': {}",
							name, e
						)));
					},
				}
			} else {
				tracing::warn!(component = "ledger", implementation = %name, "Unknown implementation, ignoring");
			}
		}

		let primary_ledger = &self.config.ledger.primary;
		let ledger_backend = ledger_impls.remove(primary_ledger).ok_or_else(|| {
			BuilderError::Config(format!(
				"Primary ledger '{}' failed to load or has invalid configuration",
				primary_ledger
			))
		})?;
		let ledger = Arc::new(LedgerService::new(ledger_backend));

		tracing::info!(
			catalog = %primary_catalog,
			match_strategy = %self.config.catalog.match_strategy.as_str(),
			ledger = %primary_ledger,
			"Order engine assembled"
		);

		Ok(OrderEngine::new(
			self.config,
			Arc::new(SessionStore::new()),
			catalog,
			ledger,
		))
	}
}
