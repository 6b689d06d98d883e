//! In-memory ledger backend.
//!
//! Keeps all three tables behind one lock, so a commit is atomic with
//! respect to readers. Nothing survives a restart. Clones share state.

use crate::{LedgerError, LedgerFactory, LedgerInterface, LedgerRegistry};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use order_types::{
	ConfigSchema, ImplementationRegistry, OrderId, OrderLine, Schema, SessionId, ValidationError,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Header row of a committed order.
#[derive(Debug, Clone)]
pub struct OrderHeader {
	pub session_id: SessionId,
	pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Tables {
	next_id: OrderId,
	headers: BTreeMap<OrderId, OrderHeader>,
	lines: Vec<(OrderId, OrderLine)>,
	tracking: HashMap<OrderId, String>,
}

/// In-memory ledger implementation.
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
	tables: Arc<RwLock<Tables>>,
}

impl MemoryLedger {
	/// Creates an empty ledger. The first order id is 1.
	pub fn new() -> Self {
		Self::default()
	}

	/// Number of order headers written so far.
	pub async fn order_count(&self) -> usize {
		self.tables.read().await.headers.len()
	}

	pub async fn header(&self, order_id: OrderId) -> Option<OrderHeader> {
		self.tables.read().await.headers.get(&order_id).cloned()
	}

	/// Lines stored under one order, in insertion order.
	pub async fn lines_for(&self, order_id: OrderId) -> Vec<OrderLine> {
		self.tables
			.read()
			.await
			.lines
			.iter()
			.filter(|(id, _)| *id == order_id)
			.map(|(_, line)| line.clone())
			.collect()
	}
}

#[async_trait]
impl LedgerInterface for MemoryLedger {
	async fn commit_order(
		&self,
		session_id: &SessionId,
		lines: &[OrderLine],
	) -> Result<OrderId, LedgerError> {
		let mut tables = self.tables.write().await;
		tables.next_id += 1;
		let order_id = tables.next_id;

		tables.headers.insert(
			order_id,
			OrderHeader {
				session_id: session_id.clone(),
				created_at: Utc::now(),
			},
		);
		tables
			.lines
			.extend(lines.iter().cloned().map(|line| (order_id, line)));
		Ok(order_id)
	}

	async fn insert_tracking(&self, order_id: OrderId, status: &str) -> Result<(), LedgerError> {
		let mut tables = self.tables.write().await;
		if !tables.headers.contains_key(&order_id) {
			return Err(LedgerError::NotFound(order_id));
		}
		if tables.tracking.contains_key(&order_id) {
			return Err(LedgerError::Backend(format!(
				"tracking row for order {} already exists",
				order_id
			)));
		}
		tables.tracking.insert(order_id, status.to_string());
		Ok(())
	}

	async fn status_of(&self, order_id: OrderId) -> Result<Option<String>, LedgerError> {
		Ok(self.tables.read().await.tracking.get(&order_id).cloned())
	}

	async fn set_status(&self, order_id: OrderId, status: &str) -> Result<(), LedgerError> {
		let mut tables = self.tables.write().await;
		if !tables.headers.contains_key(&order_id) {
			return Err(LedgerError::NotFound(order_id));
		}
		tables.tracking.insert(order_id, status.to_string());
		Ok(())
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(MemoryLedgerSchema)
	}
}

/// Configuration schema for MemoryLedger.
pub struct MemoryLedgerSchema;

impl ConfigSchema for MemoryLedgerSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		Schema::new(vec![], vec![]).validate(config)
	}
}

/// Factory function to create a memory ledger from configuration.
///
/// Configuration parameters:
/// - None
pub fn create_ledger(config: &toml::Value) -> Result<Box<dyn LedgerInterface>, LedgerError> {
	MemoryLedgerSchema
		.validate(config)
		.map_err(|e| LedgerError::Configuration(e.to_string()))?;
	Ok(Box::new(MemoryLedger::new()))
}

/// Registry for the memory ledger implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "memory";
	type Factory = LedgerFactory;

	fn factory() -> Self::Factory {
		create_ledger
	}
}

impl LedgerRegistry for Registry {}
