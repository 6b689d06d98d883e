//! HTTP server for the fulfillment webhook.
//!
//! Routes:
//! - `POST /webhook`: fulfillment requests from the dialogue platform
//! - `GET /orders/{id}/status`, `PUT /orders/{id}/status`: order tracking
//! - `GET /health`: liveness

use axum::{
	extract::{DefaultBodyLimit, Path, State},
	http::HeaderValue,
	response::Json,
	routing::{get, post},
	Router,
};
use order_config::{ApiConfig, Config};
use order_core::OrderEngine;
use order_types::{
	APIError, OrderId, OrderStatusResponse, UpdateStatusRequest, WebhookRequest, WebhookResponse,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state for the API server.
#[derive(Clone)]
pub struct AppState {
	/// Order engine handling webhook turns and status queries.
	pub engine: Arc<OrderEngine>,
	/// Complete configuration.
	pub config: Config,
}

/// Builds the router with all routes and middleware.
pub fn router(engine: Arc<OrderEngine>) -> Router {
	let config = engine.config().clone();
	let max_request_size = config.api.max_request_size;
	let cors = cors_layer(&config.api);

	let app_state = AppState { engine, config };

	Router::new()
		.route("/webhook", post(handle_webhook))
		.route(
			"/orders/{id}/status",
			get(handle_get_status).put(handle_put_status),
		)
		.route("/health", get(handle_health))
		.layer(
			ServiceBuilder::new()
				.layer(TraceLayer::new_for_http())
				.layer(cors)
				.layer(DefaultBodyLimit::max(max_request_size)),
		)
		.with_state(app_state)
}

fn cors_layer(api_config: &ApiConfig) -> CorsLayer {
	let Some(cors) = &api_config.cors else {
		return CorsLayer::permissive();
	};

	let origins: Vec<HeaderValue> = cors
		.allowed_origins
		.iter()
		.filter_map(|origin| match origin.parse() {
			Ok(value) => Some(value),
			Err(_) => {
				tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
				None
			},
		})
		.collect();
	CorsLayer::new()
		.allow_origin(AllowOrigin::list(origins))
		.allow_methods(Any)
		.allow_headers(Any)
}

/// Starts the HTTP server for the API.
pub async fn start_server(
	api_config: ApiConfig,
	engine: Arc<OrderEngine>,
) -> Result<(), Box<dyn std::error::Error>> {
	let app = router(engine);

	let bind_address = format!("{}:{}", api_config.host, api_config.port);
	let listener = TcpListener::bind(&bind_address).await?;

	tracing::info!("Food-order webhook listening on {}", bind_address);

	axum::serve(listener, app).await?;

	Ok(())
}

/// Handles POST /webhook requests.
///
/// Always answers 200 with a fulfillment message; problems with the
/// customer's input or the backends are explained in the message itself.
async fn handle_webhook(
	State(state): State<AppState>,
	Json(request): Json<WebhookRequest>,
) -> Json<WebhookResponse> {
	Json(state.engine.handle(&request).await)
}

/// Handles GET /orders/{id}/status requests.
async fn handle_get_status(
	Path(id): Path<String>,
	State(state): State<AppState>,
) -> Result<Json<OrderStatusResponse>, APIError> {
	let order_id = parse_order_id(&id)?;
	crate::apis::order::get_order_status(order_id, &state.engine)
		.await
		.map(Json)
}

/// Handles PUT /orders/{id}/status requests.
async fn handle_put_status(
	Path(id): Path<String>,
	State(state): State<AppState>,
	Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<OrderStatusResponse>, APIError> {
	let order_id = parse_order_id(&id)?;
	crate::apis::order::update_order_status(order_id, request, &state.engine)
		.await
		.map(Json)
}

/// Handles GET /health requests.
async fn handle_health(State(state): State<AppState>) -> Json<Value> {
	Json(json!({
		"status": "ok",
		"service": state.config.service.id,
	}))
}

fn parse_order_id(raw: &str) -> Result<OrderId, APIError> {
	raw.trim().parse().map_err(|_| APIError::BadRequest {
		error_type: "INVALID_ORDER_ID".to_string(),
		message: format!("Order ID must be an integer, got '{}'", raw),
		details: None,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::build_engine;
	use axum::body::Body;
	use axum::http::{Request, StatusCode};
	use order_config::ConfigBuilder;
	use tower::ServiceExt;

	fn app() -> Router {
		let config = ConfigBuilder::new()
			.service_id("router-test")
			.catalog_item(1, "Burger", "8.50")
			.build();
		router(Arc::new(build_engine(config).unwrap()))
	}

	async fn body_json(response: axum::response::Response) -> Value {
		let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
			.await
			.unwrap();
		serde_json::from_slice(&bytes).unwrap()
	}

	fn webhook(intent: &str, parameters: Value) -> Request<Body> {
		let body = json!({
			"responseId": "r-1",
			"session": "projects/food-bot/agent/sessions/s-9",
			"queryResult": {
				"queryText": "",
				"parameters": parameters,
				"allRequiredParamsPresent": true,
				"outputContexts": [
					{ "name": "projects/food-bot/agent/sessions/s-9/contexts/ongoing-order", "lifespanCount": 5 }
				],
				"intent": { "displayName": intent },
				"intentDetectionConfidence": 0.93
			}
		});
		Request::builder()
			.method("POST")
			.uri("/webhook")
			.header("content-type", "application/json")
			.body(Body::from(body.to_string()))
			.unwrap()
	}

	#[tokio::test]
	async fn test_webhook_round_trip() {
		let app = app();

		let response = app
			.clone()
			.oneshot(webhook("order.add", json!({ "food": ["Burger"], "quantity": [2] })))
			.await
			.unwrap();
		assert_eq!(response.status(), StatusCode::OK);
		let body = body_json(response).await;
		assert_eq!(
			body["fulfillmentText"],
			"Added to your order: 2 x Burger. So far you have: 2 x Burger. Anything else?"
		);
		assert_eq!(body["outputContexts"][0]["lifespanCount"], 5);

		let response = app
			.clone()
			.oneshot(webhook("order.complete", json!({})))
			.await
			.unwrap();
		let body = body_json(response).await;
		assert_eq!(
			body["fulfillmentText"],
			"Awesome. Your order has been placed! Your order ID is 1. Your total is 17.00."
		);
		assert!(body.get("outputContexts").is_none());

		let response = app
			.oneshot(
				Request::builder()
					.uri("/orders/1/status")
					.body(Body::empty())
					.unwrap(),
			)
			.await
			.unwrap();
		assert_eq!(response.status(), StatusCode::OK);
		assert_eq!(
			body_json(response).await,
			json!({ "orderId": 1, "status": "Pending" })
		);
	}

	#[tokio::test]
	async fn test_status_routes_errors() {
		let app = app();

		let response = app
			.clone()
			.oneshot(
				Request::builder()
					.uri("/orders/77/status")
					.body(Body::empty())
					.unwrap(),
			)
			.await
			.unwrap();
		assert_eq!(response.status(), StatusCode::NOT_FOUND);
		assert_eq!(body_json(response).await["error"], "ORDER_NOT_FOUND");

		let response = app
			.clone()
			.oneshot(
				Request::builder()
					.uri("/orders/abc/status")
					.body(Body::empty())
					.unwrap(),
			)
			.await
			.unwrap();
		assert_eq!(response.status(), StatusCode::BAD_REQUEST);

		let response = app
			.oneshot(
				Request::builder()
					.method("PUT")
					.uri("/orders/77/status")
					.header("content-type", "application/json")
					.body(Body::from(r#"{"status":"Delivered"}"#))
					.unwrap(),
			)
			.await
			.unwrap();
		assert_eq!(response.status(), StatusCode::NOT_FOUND);
	}

	#[tokio::test]
	async fn test_put_status_repairs_tracking() {
		let app = app();
		app.clone()
			.oneshot(webhook("order.add", json!({ "food": "Burger" })))
			.await
			.unwrap();
		app.clone()
			.oneshot(webhook("order.complete", json!({})))
			.await
			.unwrap();

		let response = app
			.clone()
			.oneshot(
				Request::builder()
					.method("PUT")
					.uri("/orders/1/status")
					.header("content-type", "application/json")
					.body(Body::from(r#"{"status":"Out for delivery"}"#))
					.unwrap(),
			)
			.await
			.unwrap();
		assert_eq!(response.status(), StatusCode::OK);

		let response = app
			.oneshot(webhook("track.order", json!({ "number": 1 })))
			.await
			.unwrap();
		assert_eq!(
			body_json(response).await["fulfillmentText"],
			"Status for order 1: Out for delivery"
		);
	}

	#[tokio::test]
	async fn test_health() {
		let response = app()
			.oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
			.await
			.unwrap();
		assert_eq!(response.status(), StatusCode::OK);
		assert_eq!(
			body_json(response).await,
			json!({ "status": "ok", "service": "router-test" })
		);
	}
}
