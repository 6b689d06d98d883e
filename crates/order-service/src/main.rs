//! Main entry point for the food-order webhook service.
//!
//! Loads configuration, assembles the order engine from the configured
//! catalog and ledger backends and serves the fulfillment webhook.

use clap::Parser;
use order_config::Config;
use order_core::{OrderEngine, OrderEngineBuilder, OrderFactories};
use std::path::PathBuf;
use std::sync::Arc;

mod apis;
mod server;

// Import implementations from individual crates
use order_catalog::implementations::memory::create_catalog as create_memory_catalog;
use order_catalog::implementations::sqlite::create_catalog as create_sqlite_catalog;
use order_ledger::implementations::memory::create_ledger as create_memory_ledger;
use order_ledger::implementations::sqlite::create_ledger as create_sqlite_ledger;

/// Command-line arguments for the webhook service.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, env = "ORDER_CONFIG", default_value = "config.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,
}

/// Main entry point for the webhook service.
///
/// This function:
/// 1. Parses command-line arguments
/// 2. Initializes logging infrastructure
/// 3. Loads configuration from file
/// 4. Builds the order engine with all implementations
/// 5. Serves HTTP until interrupted
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	// Initialize tracing with env filter
	use tracing_subscriber::{fmt, EnvFilter};

	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.init();

	tracing::info!("Started food-order webhook");

	// Load configuration
	let config_path = args
		.config
		.to_str()
		.ok_or("configuration path is not valid UTF-8")?;
	let config = Config::from_file(config_path).await?;
	tracing::info!("Loaded configuration [{}]", config.service.id);

	let engine = Arc::new(build_engine(config.clone())?);

	tokio::select! {
		result = server::start_server(config.api.clone(), engine) => {
			tracing::info!("API server finished");
			result?;
		}
		_ = tokio::signal::ctrl_c() => {
			tracing::info!("Shutdown signal received");
		}
	}

	tracing::info!("Stopped food-order webhook");
	Ok(())
}

/// Macro to create a factory HashMap with the appropriate type aliases
macro_rules! create_factory_map {
	($interface:path, $error:path, $( $name:literal => $factory:expr ),* $(,)?) => {{
		let mut factories = std::collections::HashMap::new();
		$(
			factories.insert(
				$name.to_string(),
				$factory as fn(&toml::Value) -> Result<Box<dyn $interface>, $error>
			);
		)*
		factories
	}};
}

/// Builds the order engine with all available backend implementations.
///
/// - Catalog backends: in-memory menu, SQLite `food_items` table
/// - Ledger backends: in-memory tables, SQLite database
fn build_engine(config: Config) -> Result<OrderEngine, Box<dyn std::error::Error>> {
	let catalog_factories = create_factory_map!(
		order_catalog::CatalogInterface,
		order_catalog::CatalogError,
		"memory" => create_memory_catalog,
		"sqlite" => create_sqlite_catalog,
	);

	let ledger_factories = create_factory_map!(
		order_ledger::LedgerInterface,
		order_ledger::LedgerError,
		"memory" => create_memory_ledger,
		"sqlite" => create_sqlite_ledger,
	);

	let factories = OrderFactories {
		catalog_factories,
		ledger_factories,
	};

	Ok(OrderEngineBuilder::new(config).build(factories)?)
}

#[cfg(test)]
mod tests {
	use super::*;
	use order_config::ConfigBuilder;
	use tempfile::tempdir;

	#[test]
	fn test_args_defaults() {
		let args = Args::parse_from(["food-order-webhook"]);
		assert_eq!(args.log_level, "info");
		if std::env::var_os("ORDER_CONFIG").is_none() {
			assert_eq!(args.config, PathBuf::from("config.toml"));
		}
	}

	#[test]
	fn test_args_custom_values() {
		let args =
			Args::parse_from(["food-order-webhook", "--config", "custom.toml", "-l", "debug"]);
		assert_eq!(args.config, PathBuf::from("custom.toml"));
		assert_eq!(args.log_level, "debug");
	}

	#[test]
	fn test_create_factory_map_macro() {
		let factories = create_factory_map!(
			order_ledger::LedgerInterface,
			order_ledger::LedgerError,
			"memory" => create_memory_ledger,
			"sqlite" => create_sqlite_ledger,
		);

		assert_eq!(factories.len(), 2);
		assert!(factories.contains_key("memory"));
		assert!(factories.contains_key("sqlite"));
	}

	#[tokio::test]
	async fn test_build_engine_with_minimal_config() {
		let config = ConfigBuilder::new()
			.service_id("test-webhook")
			.catalog_item(1, "Burger", "8.50")
			.build();

		let engine = build_engine(config).unwrap();
		assert_eq!(engine.config().service.id, "test-webhook");
	}

	#[tokio::test]
	async fn test_build_engine_from_file_with_sqlite_ledger() {
		let dir = tempdir().unwrap();
		let config_path = dir.path().join("config.toml");
		let db_path = dir.path().join("orders.db");

		let content = format!(
			r#"
[service]
id = "file-webhook"

[catalog]
primary = "memory"
match_strategy = "exact_first"
[catalog.implementations.memory]
items = [{{ id = 1, name = "Burger", price = "8.50" }}]

[ledger]
primary = "sqlite"
[ledger.implementations.sqlite]
database_url = "sqlite://{}"
"#,
			db_path.display()
		);
		std::fs::write(&config_path, content).unwrap();

		let config = Config::from_file(config_path.to_str().unwrap())
			.await
			.unwrap();
		let engine = build_engine(config).unwrap();
		assert_eq!(engine.config().service.id, "file-webhook");
		assert_eq!(engine.order_status(1).await.unwrap(), None);
	}
}
