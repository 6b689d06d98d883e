//! Registry trait for self-registering implementations.
//!
//! Catalog and ledger backends implement this trait to register themselves
//! with their configuration name and factory function.

/// Base trait for implementation registries.
///
/// Each backend module provides a Registry struct that implements this trait,
/// declaring the name it is configured under and its factory function.
pub trait ImplementationRegistry {
	/// The name used in configuration files to reference this implementation.
	///
	/// This should match the key used in the TOML configuration, for example:
	/// - "memory" for catalog.implementations.memory
	/// - "sqlite" for ledger.implementations.sqlite
	const NAME: &'static str;

	/// The factory function type this implementation provides.
	type Factory;

	/// Get the factory function for this implementation.
	fn factory() -> Self::Factory;
}
