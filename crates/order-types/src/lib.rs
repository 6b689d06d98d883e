//! Common types module for the food-order webhook system.
//!
//! This module defines the core data types and structures used throughout
//! the webhook backend. It provides a centralized location for shared types
//! to ensure consistency across the catalog, ledger, engine and HTTP layers.

/// API types for the auxiliary HTTP endpoints and error responses.
pub mod api;
/// Session basket types.
pub mod basket;
/// Catalog reference types and match strategies.
pub mod catalog;
/// Intent decoding from dialogue-platform display names.
pub mod intent;
/// Finalized order records and the partial-success outcome type.
pub mod order;
/// Registry trait for self-registering backend implementations.
pub mod registry;
/// Session identifiers and their extraction from context paths.
pub mod session;
/// Scalar-or-list slot normalization.
pub mod slots;
/// Configuration validation types for ensuring type-safe configurations.
pub mod validation;
/// Webhook request/response wire types.
pub mod webhook;

// Re-export all types for convenient access
pub use api::*;
pub use basket::*;
pub use catalog::*;
pub use intent::*;
pub use order::*;
pub use registry::*;
pub use session::*;
pub use slots::*;
pub use validation::*;
pub use webhook::*;
