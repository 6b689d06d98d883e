//! Session identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Path segment that precedes the session id in a context name.
const SESSIONS_SEGMENT: &str = "sessions";

/// Identifier correlating all turns of one ongoing conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Extracts the session id from a slash-delimited context path.
	///
	/// Context names look like
	/// `projects/{project}/agent/sessions/{session_id}/contexts/{name}`.
	/// The component immediately following the first `sessions` segment is
	/// returned; `None` if there is no such segment or nothing follows it.
	pub fn from_context_path(path: &str) -> Option<Self> {
		let mut parts = path.split('/');
		parts.find(|part| *part == SESSIONS_SEGMENT)?;
		parts
			.next()
			.filter(|id| !id.is_empty())
			.map(|id| Self(id.to_string()))
	}
}

impl fmt::Display for SessionId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for SessionId {
	fn from(id: &str) -> Self {
		Self::new(id)
	}
}

impl From<String> for SessionId {
	fn from(id: String) -> Self {
		Self(id)
	}
}
