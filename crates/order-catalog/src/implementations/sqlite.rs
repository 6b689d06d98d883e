//! SQLite catalog backend.
//!
//! Reads the `food_items(id, name, price)` menu table. The table is created
//! on first use if missing and can be seeded from configuration; seed rows
//! never overwrite existing ones. Prices are stored as decimal text.
//!
//! Also home of [`SqliteDatabase`], the pool wrapper the sqlite ledger uses
//! as well.

use crate::implementations::memory::MemoryCatalogSchema;
use crate::{
	items_from_config, name_matches, CatalogError, CatalogFactory, CatalogInterface, CatalogRegistry,
};
use async_trait::async_trait;
use order_types::{
	CatalogItem, ConfigSchema, Field, FieldType, ImplementationRegistry, Schema, ValidationError,
};
use rust_decimal::Decimal;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tokio::sync::OnceCell;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS food_items (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    price TEXT NOT NULL
)
"#;

/// Lazily-connecting SQLite pool.
///
/// File databases run in WAL mode with foreign keys enforced, whichever
/// backend opens them. In-memory databases are pinned to one connection that
/// never expires, otherwise each connection would see its own empty database.
#[derive(Debug, Clone)]
pub struct SqliteDatabase {
	pool: SqlitePool,
	directory: Option<PathBuf>,
}

impl SqliteDatabase {
	/// Parses `url` and builds the pool. No connection is made and nothing
	/// touches the filesystem until first use. The pool's maintenance task
	/// is spawned on the current Tokio runtime.
	pub fn open(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
		let options = SqliteConnectOptions::from_str(url)?
			.create_if_missing(true)
			.foreign_keys(true);

		if url.contains(":memory:") {
			let pool = SqlitePoolOptions::new()
				.max_connections(1)
				.idle_timeout(None)
				.max_lifetime(None)
				.connect_lazy_with(options);
			return Ok(Self {
				pool,
				directory: None,
			});
		}

		let directory = options
			.get_filename()
			.parent()
			.filter(|dir| !dir.as_os_str().is_empty())
			.map(Path::to_path_buf);
		let pool = SqlitePoolOptions::new()
			.max_connections(max_connections)
			.connect_lazy_with(options.journal_mode(SqliteJournalMode::Wal));
		Ok(Self { pool, directory })
	}

	pub fn pool(&self) -> &SqlitePool {
		&self.pool
	}

	/// Creates the directory holding the database file. Must run before the
	/// first query, since SQLite only creates the file itself.
	pub async fn create_directory(&self) -> std::io::Result<()> {
		match &self.directory {
			Some(dir) => tokio::fs::create_dir_all(dir).await,
			None => Ok(()),
		}
	}
}

/// Catalog backed by a SQLite `food_items` table.
pub struct SqliteCatalog {
	database: SqliteDatabase,
	seed: Vec<CatalogItem>,
	ready: OnceCell<()>,
}

impl SqliteCatalog {
	pub fn new(database: SqliteDatabase, seed: Vec<CatalogItem>) -> Self {
		Self {
			database,
			seed,
			ready: OnceCell::new(),
		}
	}

	/// Creates the table and inserts seed rows, once per process.
	async fn ensure_ready(&self) -> Result<(), CatalogError> {
		self.ready
			.get_or_try_init(|| async {
				self.database.create_directory().await.map_err(|e| {
					CatalogError::Backend(format!("Failed to create database directory: {e}"))
				})?;
				sqlx::query(SCHEMA)
					.execute(self.database.pool())
					.await
					.map_err(|e| CatalogError::Backend(e.to_string()))?;

				for item in &self.seed {
					sqlx::query("INSERT OR IGNORE INTO food_items (id, name, price) VALUES (?, ?, ?)")
						.bind(item.id)
						.bind(&item.name)
						.bind(item.price.to_string())
						.execute(self.database.pool())
						.await
						.map_err(|e| CatalogError::Backend(e.to_string()))?;
				}
				if !self.seed.is_empty() {
					tracing::info!(items = self.seed.len(), "Seeded catalog table");
				}
				Ok(())
			})
			.await
			.map(|_| ())
	}
}

fn item_from_row(row: &SqliteRow) -> Result<CatalogItem, CatalogError> {
	let backend = |e: sqlx::Error| CatalogError::Backend(e.to_string());
	let price: String = row.try_get("price").map_err(backend)?;
	Ok(CatalogItem {
		id: row.try_get("id").map_err(backend)?,
		name: row.try_get("name").map_err(backend)?,
		price: Decimal::from_str(price.trim())
			.map_err(|e| CatalogError::Backend(format!("Invalid price '{price}': {e}")))?,
	})
}

#[async_trait]
impl CatalogInterface for SqliteCatalog {
	async fn candidates(&self, fragment: &str) -> Result<Vec<CatalogItem>, CatalogError> {
		self.ensure_ready().await?;

		// SQLite's LOWER only folds ASCII, so names are matched here instead.
		// CAST keeps rows written with a REAL price column readable.
		let rows = sqlx::query(
			"SELECT id, name, CAST(price AS TEXT) AS price FROM food_items ORDER BY id",
		)
		.fetch_all(self.database.pool())
		.await
		.map_err(|e| CatalogError::Backend(e.to_string()))?;

		let mut found = Vec::new();
		for row in &rows {
			let name: String = row
				.try_get("name")
				.map_err(|e| CatalogError::Backend(e.to_string()))?;
			if name_matches(&name, fragment) {
				found.push(item_from_row(row)?);
			}
		}
		Ok(found)
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(SqliteCatalogSchema)
	}
}

/// Configuration schema for SqliteCatalog.
pub struct SqliteCatalogSchema;

impl ConfigSchema for SqliteCatalogSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![
				Field::new("database_url", FieldType::String).with_validator(|v| {
					match v.as_str() {
						Some(url) if url.starts_with("sqlite:") => Ok(()),
						_ => Err("database_url must start with 'sqlite:'".into()),
					}
				}),
			],
			vec![
				Field::new(
					"max_connections",
					FieldType::Integer {
						min: Some(1),
						max: Some(64),
					},
				),
				Field::new(
					"items",
					FieldType::Array(Box::new(FieldType::Table(
						MemoryCatalogSchema::item_schema(),
					))),
				),
			],
		);
		schema.validate(config)
	}
}

/// Factory function to create a sqlite catalog from configuration.
///
/// Configuration parameters:
/// - `database_url`: SQLite URL, e.g. `sqlite://data/orders.db` (required)
/// - `max_connections`: pool size (default: 5)
/// - `items`: optional seed rows, inserted if their id is not present
///
/// Must be called from within a Tokio runtime.
pub fn create_catalog(config: &toml::Value) -> Result<Box<dyn CatalogInterface>, CatalogError> {
	SqliteCatalogSchema
		.validate(config)
		.map_err(|e| CatalogError::Configuration(e.to_string()))?;

	let url = config
		.get("database_url")
		.and_then(|v| v.as_str())
		.ok_or_else(|| CatalogError::Configuration("database_url is required".into()))?;
	let max_connections = config
		.get("max_connections")
		.and_then(|v| v.as_integer())
		.unwrap_or(5) as u32;

	let database = SqliteDatabase::open(url, max_connections)
		.map_err(|e| CatalogError::Configuration(e.to_string()))?;
	let seed = items_from_config(config)?;

	Ok(Box::new(SqliteCatalog::new(database, seed)))
}

/// Registry for the sqlite catalog implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "sqlite";
	type Factory = CatalogFactory;

	fn factory() -> Self::Factory {
		create_catalog
	}
}

impl CatalogRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::CatalogService;
	use order_types::MatchStrategy;
	use tempfile::TempDir;

	fn memory_config() -> toml::Value {
		toml::from_str(
			r#"
database_url = "sqlite::memory:"
items = [
	{ id = 1, name = "Curly Fries", price = "3.00" },
	{ id = 2, name = "Fries", price = "2.50" },
	{ id = 3, name = "100% Juice", price = "4.00" },
	{ id = 4, name = "CRÈME BRÛLÉE", price = "5.75" },
	{ id = 5, name = "Pav Bhaji", price = "6.00" },
]
"#,
		)
		.unwrap()
	}

	#[tokio::test]
	async fn test_candidates_ordered_by_id() {
		let catalog = create_catalog(&memory_config()).unwrap();

		let found = catalog.candidates("FRIES").await.unwrap();
		let names: Vec<&str> = found.iter().map(|item| item.name.as_str()).collect();
		assert_eq!(names, vec!["Curly Fries", "Fries"]);
		assert_eq!(found[1].price, Decimal::from_str("2.50").unwrap());
	}

	#[tokio::test]
	async fn test_wildcards_are_literal() {
		let catalog = create_catalog(&memory_config()).unwrap();

		assert!(catalog.candidates("_").await.unwrap().is_empty());
		let found = catalog.candidates("100%").await.unwrap();
		assert_eq!(found.len(), 1);
		assert_eq!(found[0].id, 3);
	}

	#[tokio::test]
	async fn test_non_ascii_names_match_case_insensitively() {
		let catalog = create_catalog(&memory_config()).unwrap();

		let found = catalog.candidates("crème brûlée").await.unwrap();
		assert_eq!(found.len(), 1);
		assert_eq!(found[0].id, 4);
		assert_eq!(catalog.candidates("Brûlée").await.unwrap().len(), 1);
	}

	#[tokio::test]
	async fn test_prices_keep_their_scale() {
		let service = CatalogService::new(
			create_catalog(&memory_config()).unwrap(),
			MatchStrategy::Substring,
		);

		let item = service.resolve("pav bhaji").await.unwrap().unwrap();
		assert_eq!(item.price.to_string(), "6.00");
	}

	#[tokio::test]
	async fn test_creates_database_directory_on_first_use() {
		let dir = TempDir::new().unwrap();
		let db_path = dir.path().join("nested").join("menu.db");
		let config: toml::Value = toml::from_str(&format!(
			"database_url = \"sqlite://{}\"\nitems = [{{ id = 1, name = \"Lassi\", price = \"3.10\" }}]",
			db_path.display()
		))
		.unwrap();

		let catalog = create_catalog(&config).unwrap();
		assert!(!db_path.exists());

		let found = catalog.candidates("lassi").await.unwrap();
		assert_eq!(found[0].price.to_string(), "3.10");
		assert!(db_path.exists());
	}

	#[test]
	fn test_rejects_non_sqlite_url() {
		let config: toml::Value = toml::from_str(r#"database_url = "mysql://localhost/db""#).unwrap();
		assert!(SqliteCatalogSchema.validate(&config).is_err());
	}
}
