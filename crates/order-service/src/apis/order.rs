//! Order status API.
//!
//! Read access to tracking rows, plus the manual update path used to repair
//! an order whose tracking row failed to insert or to move it through
//! fulfillment.

use order_core::{EngineError, OrderEngine};
use order_types::{APIError, OrderId, OrderStatusResponse, UpdateStatusRequest};
use tracing::{info, warn};

/// Returns the current tracking status of an order.
pub async fn get_order_status(
	order_id: OrderId,
	engine: &OrderEngine,
) -> Result<OrderStatusResponse, APIError> {
	match engine.order_status(order_id).await {
		Ok(Some(status)) => Ok(OrderStatusResponse { order_id, status }),
		Ok(None) => Err(not_found(order_id)),
		Err(e) => {
			warn!(order_id, error = %e, "Order status lookup failed");
			Err(to_api_error(e))
		},
	}
}

/// Sets the tracking status of an existing order.
pub async fn update_order_status(
	order_id: OrderId,
	request: UpdateStatusRequest,
	engine: &OrderEngine,
) -> Result<OrderStatusResponse, APIError> {
	engine
		.update_order_status(order_id, &request.status)
		.await
		.map_err(|e| {
			warn!(order_id, error = %e, "Order status update failed");
			to_api_error(e)
		})?;

	let status = request.status.trim().to_string();
	info!(order_id, status = %status, "Order status updated via API");
	Ok(OrderStatusResponse { order_id, status })
}

fn not_found(order_id: OrderId) -> APIError {
	APIError::NotFound {
		error_type: "ORDER_NOT_FOUND".to_string(),
		message: format!("No tracking information found for order ID {}", order_id),
	}
}

fn to_api_error(err: EngineError) -> APIError {
	match err {
		EngineError::OrderNotFound(order_id) => not_found(order_id),
		EngineError::InvalidInput(message) => APIError::BadRequest {
			error_type: "INVALID_STATUS".to_string(),
			message,
			details: None,
		},
		EngineError::Service(message) => APIError::ServiceUnavailable {
			error_type: "LEDGER_UNAVAILABLE".to_string(),
			message,
		},
	}
}
