//! Intents understood by the webhook.

use std::fmt;

/// Separator the dialogue platform uses to annotate follow-up intents,
/// e.g. `order.add - context: ongoing-order`.
const CONTEXT_ANNOTATION: &str = " - context:";

/// Intent decoded once from the platform's display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
	/// Add items to the session basket.
	Add,
	/// Remove items from the session basket.
	Remove,
	/// Drain the basket into the order ledger.
	Complete,
	/// Look up the tracking status of a finalized order.
	Track,
	/// Anything else; carries the original display name.
	Unknown(String),
}

impl Intent {
	/// Decodes a display name, ignoring any context annotation suffix.
	pub fn from_display_name(display_name: &str) -> Self {
		let base = display_name
			.split(CONTEXT_ANNOTATION)
			.next()
			.unwrap_or(display_name)
			.trim();
		match base {
			"order.add" => Intent::Add,
			"order.remove" => Intent::Remove,
			"order.complete" => Intent::Complete,
			"track.order" => Intent::Track,
			_ => Intent::Unknown(display_name.to_string()),
		}
	}

	pub fn as_str(&self) -> &str {
		match self {
			Intent::Add => "order.add",
			Intent::Remove => "order.remove",
			Intent::Complete => "order.complete",
			Intent::Track => "track.order",
			Intent::Unknown(name) => name,
		}
	}
}

impl fmt::Display for Intent {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_decodes_plain_and_annotated_names() {
		assert_eq!(Intent::from_display_name("order.add"), Intent::Add);
		assert_eq!(
			Intent::from_display_name("order.add - context: ongoing-order"),
			Intent::Add
		);
		assert_eq!(
			Intent::from_display_name("order.remove - context: ongoing-order"),
			Intent::Remove
		);
		assert_eq!(
			Intent::from_display_name("order.complete - context: ongoing-order"),
			Intent::Complete
		);
		assert_eq!(
			Intent::from_display_name("track.order - context: ongoing-tracking"),
			Intent::Track
		);
	}

	#[test]
	fn test_unknown_keeps_display_name() {
		assert_eq!(
			Intent::from_display_name("Default Welcome Intent"),
			Intent::Unknown("Default Welcome Intent".into())
		);
		assert_eq!(Intent::from_display_name("").as_str(), "");
	}
}
