//! Core order engine for the food-order webhook.
//!
//! This crate turns decoded webhook turns into basket edits, finalized
//! orders and status answers. Per-session state lives in the
//! [`SessionStore`]; persistent state lives behind the catalog and ledger
//! services, which the [`OrderEngineBuilder`] wires up from configuration.

pub mod builder;
pub mod engine;
pub mod handlers;
pub mod session;

pub use builder::{BuilderError, OrderEngineBuilder, OrderFactories};
pub use engine::{EngineError, OrderEngine};
pub use session::{SessionGuard, SessionStore};
