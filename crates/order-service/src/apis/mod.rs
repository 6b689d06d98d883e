//! API implementations behind the HTTP routes.

pub mod order;
