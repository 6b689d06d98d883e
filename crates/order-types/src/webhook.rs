//! Webhook wire types.
//!
//! These mirror the fulfillment request the dialogue platform posts and the
//! response it expects back. Field names are camelCase on the wire.

use crate::{Intent, SessionId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Inbound fulfillment request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookRequest {
	/// Opaque id of this platform response.
	#[serde(default)]
	pub response_id: String,
	/// Full session path, e.g. `projects/p/agent/sessions/{id}`.
	#[serde(default)]
	pub session: String,
	pub query_result: QueryResult,
	/// Raw passthrough of the request the platform received.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub original_detect_intent_request: Option<Value>,
}

impl WebhookRequest {
	/// Decodes the intent from its display name.
	pub fn intent(&self) -> Intent {
		Intent::from_display_name(&self.query_result.intent.display_name)
	}

	/// Session id taken from the first output context whose name carries a
	/// `sessions/{id}` component.
	pub fn session_id(&self) -> Option<SessionId> {
		self.query_result
			.output_contexts
			.as_deref()
			.unwrap_or_default()
			.iter()
			.find_map(|ctx| SessionId::from_context_path(&ctx.name))
	}

	pub fn parameters(&self) -> &HashMap<String, Value> {
		&self.query_result.parameters
	}
}

/// The NLU result for one user turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
	#[serde(default)]
	pub query_text: String,
	/// Slot name to scalar or list.
	#[serde(default)]
	pub parameters: HashMap<String, Value>,
	#[serde(default)]
	pub all_required_params_present: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub output_contexts: Option<Vec<OutputContext>>,
	pub intent: IntentInfo,
	#[serde(default)]
	pub intent_detection_confidence: f64,
}

/// Matched intent descriptor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentInfo {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	#[serde(default)]
	pub display_name: String,
}

/// A conversation context, inbound or generated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputContext {
	pub name: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub lifespan_count: Option<u32>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub parameters: Option<HashMap<String, Value>>,
}

impl OutputContext {
	/// Context named `{session_path}/contexts/{name}`.
	pub fn for_session(session_path: &str, name: &str, lifespan_count: u32) -> Self {
		Self {
			name: format!("{}/contexts/{}", session_path.trim_end_matches('/'), name),
			lifespan_count: Some(lifespan_count),
			parameters: None,
		}
	}
}

/// Outbound fulfillment response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookResponse {
	pub fulfillment_text: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub output_contexts: Option<Vec<OutputContext>>,
}

impl WebhookResponse {
	pub fn text(fulfillment_text: impl Into<String>) -> Self {
		Self {
			fulfillment_text: fulfillment_text.into(),
			output_contexts: None,
		}
	}

	pub fn with_context(mut self, context: OutputContext) -> Self {
		self.output_contexts.get_or_insert_with(Vec::new).push(context);
		self
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	fn sample() -> Value {
		json!({
			"responseId": "r-1",
			"session": "projects/food-bot/agent/sessions/s-42",
			"queryResult": {
				"queryText": "two burgers please",
				"parameters": { "food": ["Burger"], "quantity": [2] },
				"allRequiredParamsPresent": true,
				"outputContexts": [
					{ "name": "projects/food-bot/agent/contexts/global" },
					{
						"name": "projects/food-bot/agent/sessions/s-42/contexts/ongoing-order",
						"lifespanCount": 5,
						"parameters": {}
					}
				],
				"intent": { "displayName": "order.add - context: ongoing-order" },
				"intentDetectionConfidence": 0.93
			}
		})
	}

	#[test]
	fn test_deserializes_platform_payload() {
		let request: WebhookRequest = serde_json::from_value(sample()).unwrap();
		assert_eq!(request.intent(), Intent::Add);
		assert_eq!(request.session_id(), Some(SessionId::new("s-42")));
		assert_eq!(request.parameters()["quantity"], json!([2]));
	}

	#[test]
	fn test_missing_contexts_yield_no_session() {
		let mut payload = sample();
		payload["queryResult"]
			.as_object_mut()
			.unwrap()
			.remove("outputContexts");
		let request: WebhookRequest = serde_json::from_value(payload).unwrap();
		assert_eq!(request.session_id(), None);
	}

	#[test]
	fn test_response_omits_absent_contexts() {
		let plain = serde_json::to_value(WebhookResponse::text("hi")).unwrap();
		assert_eq!(plain, json!({ "fulfillmentText": "hi" }));

		let with_ctx = WebhookResponse::text("hi").with_context(OutputContext::for_session(
			"projects/p/agent/sessions/s-1",
			"ongoing-order",
			5,
		));
		let value = serde_json::to_value(with_ctx).unwrap();
		assert_eq!(
			value["outputContexts"][0]["name"],
			"projects/p/agent/sessions/s-1/contexts/ongoing-order"
		);
		assert_eq!(value["outputContexts"][0]["lifespanCount"], 5);
	}
}
