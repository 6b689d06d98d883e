//! SQLite ledger backend.
//!
//! Tables:
//! - `order_header(id, session_id, created_at)`
//! - `orders(header_id, food_id, quantity, total_price)`
//! - `order_tracking(order_id, status)`
//!
//! Tables are created on first use. Ids come from the header's rowid. Money
//! is stored as decimal text.

use crate::{LedgerError, LedgerFactory, LedgerInterface, LedgerRegistry};
use async_trait::async_trait;
use order_types::{
	ConfigSchema, Field, FieldType, ImplementationRegistry, OrderId, OrderLine, Schema, SessionId,
	ValidationError,
};
use order_catalog::implementations::sqlite::SqliteDatabase;
use sqlx::Row;
use tokio::sync::OnceCell;

const SCHEMA: [&str; 3] = [
	r#"
CREATE TABLE IF NOT EXISTS order_header (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
)
"#,
	r#"
CREATE TABLE IF NOT EXISTS orders (
    header_id INTEGER NOT NULL REFERENCES order_header(id),
    food_id INTEGER NOT NULL,
    quantity INTEGER NOT NULL,
    total_price TEXT NOT NULL
)
"#,
	r#"
CREATE TABLE IF NOT EXISTS order_tracking (
    order_id INTEGER PRIMARY KEY REFERENCES order_header(id),
    status TEXT NOT NULL
)
"#,
];

fn backend_error(context: &str) -> impl Fn(sqlx::Error) -> LedgerError + '_ {
	move |err| LedgerError::Backend(format!("{context}: {err}"))
}

/// Ledger backed by a SQLite database.
pub struct SqliteLedger {
	database: SqliteDatabase,
	ready: OnceCell<()>,
}

impl SqliteLedger {
	pub fn new(database: SqliteDatabase) -> Self {
		Self {
			database,
			ready: OnceCell::new(),
		}
	}

	async fn ensure_ready(&self) -> Result<(), LedgerError> {
		self.ready
			.get_or_try_init(|| async {
				self.database.create_directory().await.map_err(|e| {
					LedgerError::Backend(format!("Failed to create database directory: {e}"))
				})?;
				for statement in SCHEMA {
					sqlx::query(statement)
						.execute(self.database.pool())
						.await
						.map_err(backend_error("Failed to create ledger tables"))?;
				}
				Ok(())
			})
			.await
			.map(|_| ())
	}

	async fn header_exists(&self, order_id: OrderId) -> Result<bool, LedgerError> {
		let row = sqlx::query("SELECT 1 FROM order_header WHERE id = ?")
			.bind(order_id)
			.fetch_optional(self.database.pool())
			.await
			.map_err(backend_error("Failed to look up order"))?;
		Ok(row.is_some())
	}
}

#[async_trait]
impl LedgerInterface for SqliteLedger {
	async fn commit_order(
		&self,
		session_id: &SessionId,
		lines: &[OrderLine],
	) -> Result<OrderId, LedgerError> {
		self.ensure_ready().await?;

		let mut tx = self
			.database
			.pool()
			.begin()
			.await
			.map_err(backend_error("Failed to begin transaction"))?;

		let order_id = sqlx::query("INSERT INTO order_header (session_id) VALUES (?)")
			.bind(session_id.as_str())
			.execute(&mut *tx)
			.await
			.map_err(backend_error("Failed to insert order header"))?
			.last_insert_rowid();

		for line in lines {
			sqlx::query(
				r#"
INSERT INTO orders (header_id, food_id, quantity, total_price)
VALUES (?, ?, ?, ?)
"#,
			)
			.bind(order_id)
			.bind(line.item_id)
			.bind(line.quantity)
			.bind(line.total_price.to_string())
			.execute(&mut *tx)
			.await
			.map_err(backend_error("Failed to insert order line"))?;
		}

		// Dropping the transaction on an early return rolls it back
		tx.commit()
			.await
			.map_err(backend_error("Failed to commit order"))?;
		Ok(order_id)
	}

	async fn insert_tracking(&self, order_id: OrderId, status: &str) -> Result<(), LedgerError> {
		self.ensure_ready().await?;
		sqlx::query("INSERT INTO order_tracking (order_id, status) VALUES (?, ?)")
			.bind(order_id)
			.bind(status)
			.execute(self.database.pool())
			.await
			.map_err(backend_error("Failed to insert order tracking"))?;
		Ok(())
	}

	async fn status_of(&self, order_id: OrderId) -> Result<Option<String>, LedgerError> {
		self.ensure_ready().await?;
		let row = sqlx::query("SELECT status FROM order_tracking WHERE order_id = ?")
			.bind(order_id)
			.fetch_optional(self.database.pool())
			.await
			.map_err(backend_error("Failed to fetch order status"))?;

		row.map(|row| row.try_get::<String, _>("status"))
			.transpose()
			.map_err(backend_error("Failed to decode order status"))
	}

	async fn set_status(&self, order_id: OrderId, status: &str) -> Result<(), LedgerError> {
		self.ensure_ready().await?;
		if !self.header_exists(order_id).await? {
			return Err(LedgerError::NotFound(order_id));
		}

		sqlx::query(
			r#"
INSERT INTO order_tracking (order_id, status)
VALUES (?, ?)
ON CONFLICT(order_id) DO UPDATE
SET status = excluded.status
"#,
		)
		.bind(order_id)
		.bind(status)
		.execute(self.database.pool())
		.await
		.map_err(backend_error("Failed to update order status"))?;
		Ok(())
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(SqliteLedgerSchema)
	}
}

/// Configuration schema for SqliteLedger.
pub struct SqliteLedgerSchema;

impl ConfigSchema for SqliteLedgerSchema {
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
			vec![Field::new(
				"max_connections",
				FieldType::Integer {
					min: Some(1),
					max: Some(64),
				},
			)],
		);
		schema.validate(config)
	}
}

/// Factory function to create a sqlite ledger from configuration.
///
/// Configuration parameters:
/// - `database_url`: SQLite URL, e.g. `sqlite://data/orders.db` (required)
/// - `max_connections`: pool size (default: 5)
///
/// Must be called from within a Tokio runtime.
pub fn create_ledger(config: &toml::Value) -> Result<Box<dyn LedgerInterface>, LedgerError> {
	SqliteLedgerSchema
		.validate(config)
		.map_err(|e| LedgerError::Configuration(e.to_string()))?;

	let url = config
		.get("database_url")
		.and_then(|v| v.as_str())
		.ok_or_else(|| LedgerError::Configuration("database_url is required".into()))?;
	let max_connections = config
		.get("max_connections")
		.and_then(|v| v.as_integer())
		.unwrap_or(5) as u32;

	let database = SqliteDatabase::open(url, max_connections)
		.map_err(|e| LedgerError::Configuration(e.to_string()))?;
	Ok(Box::new(SqliteLedger::new(database)))
}

/// Registry for the sqlite ledger implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "sqlite";
	type Factory = LedgerFactory;

	fn factory() -> Self::Factory {
		create_ledger
	}
}

impl LedgerRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;
	use rust_decimal::Decimal;
	use std::str::FromStr;
	use tempfile::TempDir;

	fn config(url: &str) -> toml::Value {
		let mut table = toml::map::Map::new();
		table.insert("database_url".into(), toml::Value::String(url.into()));
		toml::Value::Table(table)
	}

	fn burger(quantity: u32) -> OrderLine {
		OrderLine::new(1, "Burger", quantity, Decimal::from_str("8.50").unwrap())
	}

	#[tokio::test]
	async fn test_commit_and_track() {
		let ledger = create_ledger(&config("sqlite::memory:")).unwrap();
		let session = SessionId::new("abc");

		let first = ledger.commit_order(&session, &[burger(2)]).await.unwrap();
		let second = ledger.commit_order(&session, &[]).await.unwrap();
		assert_eq!(second, first + 1);

		assert_eq!(ledger.status_of(first).await.unwrap(), None);
		ledger.insert_tracking(first, "Pending").await.unwrap();
		assert_eq!(
			ledger.status_of(first).await.unwrap().as_deref(),
			Some("Pending")
		);

		// The tracking row is unique per order
		assert!(matches!(
			ledger.insert_tracking(first, "Pending").await,
			Err(LedgerError::Backend(_))
		));
	}

	#[tokio::test]
	async fn test_set_status_upserts() {
		let ledger = create_ledger(&config("sqlite::memory:")).unwrap();
		let order_id = ledger
			.commit_order(&SessionId::new("abc"), &[burger(1)])
			.await
			.unwrap();

		ledger.set_status(order_id, "Preparing").await.unwrap();
		ledger.set_status(order_id, "Delivered").await.unwrap();
		assert_eq!(
			ledger.status_of(order_id).await.unwrap().as_deref(),
			Some("Delivered")
		);

		assert!(matches!(
			ledger.set_status(order_id + 100, "Delivered").await,
			Err(LedgerError::NotFound(_))
		));
	}

	#[tokio::test]
	async fn test_orders_survive_reopen() {
		let dir = TempDir::new().unwrap();
		let url = format!("sqlite://{}", dir.path().join("orders.db").display());

		let order_id = {
			let ledger = create_ledger(&config(&url)).unwrap();
			let order_id = ledger
				.commit_order(&SessionId::new("abc"), &[burger(3)])
				.await
				.unwrap();
			ledger.insert_tracking(order_id, "Pending").await.unwrap();
			order_id
		};

		let reopened = create_ledger(&config(&url)).unwrap();
		assert_eq!(
			reopened.status_of(order_id).await.unwrap().as_deref(),
			Some("Pending")
		);
	}

	#[tokio::test]
	async fn test_line_totals_stored_exactly() {
		let database = SqliteDatabase::open("sqlite::memory:", 1).unwrap();
		let ledger = SqliteLedger::new(database.clone());
		let fries = OrderLine::new(2, "Fries", 3, Decimal::from_str("0.10").unwrap());

		let order_id = ledger
			.commit_order(&SessionId::new("abc"), &[burger(3), fries])
			.await
			.unwrap();

		let totals: Vec<String> =
			sqlx::query("SELECT total_price FROM orders WHERE header_id = ? ORDER BY food_id")
				.bind(order_id)
				.fetch_all(database.pool())
				.await
				.unwrap()
				.iter()
				.map(|row| row.get("total_price"))
				.collect();
		assert_eq!(totals, vec!["25.50", "0.30"]);
	}

	#[tokio::test]
	async fn test_creates_database_directory_on_first_use() {
		let dir = TempDir::new().unwrap();
		let db_path = dir.path().join("data").join("orders.db");
		let ledger = create_ledger(&config(&format!("sqlite://{}", db_path.display()))).unwrap();
		assert!(!db_path.exists());

		ledger
			.commit_order(&SessionId::new("abc"), &[burger(1)])
			.await
			.unwrap();
		assert!(db_path.exists());
	}

	#[test]
	fn test_schema_requires_url() {
		let empty = toml::Value::Table(toml::map::Map::new());
		assert!(SqliteLedgerSchema.validate(&empty).is_err());
		assert!(SqliteLedgerSchema
			.validate(&config("postgres://localhost/orders"))
			.is_err());
	}
}
