use std::sync::Arc;

use axum::{
    Router,
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::Value;

use crate::{
    dispatch::{DispatchConfig, Dispatcher, GatewayResponse},
    error::ApiError,
    handler::ApiHandler,
};

/// HTTP API service builder.
pub struct HttpApi<H> {
    dispatcher: Arc<Dispatcher<H>>,
}

impl<H> HttpApi<H>
where
    H: ApiHandler,
{
    /// Create new HTTP API with the given handler.
    pub fn new(handler: Arc<H>, config: DispatchConfig) -> Self {
        Self {
            dispatcher: Arc::new(Dispatcher::new(handler, config)),
        }
    }

    /// Build axum router with mounted endpoints.
    ///
    /// Routes:
    /// - GET /tasks/{labeler_id}/{developer_id} - Allocate tasks
    /// - POST /tasks - Submit answers
    /// - OPTIONS on both - CORS preflight
    pub fn router(self) -> Router {
        Router::new()
            .route("/tasks", post(submit_tasks::<H>).options(preflight::<H>))
            .route(
                "/tasks/{labeler_id}/{developer_id}",
                get(allocate_tasks::<H>).options(preflight::<H>),
            )
            .with_state(self.dispatcher)
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /tasks/{labeler_id}/{developer_id}
async fn allocate_tasks<H>(
    State(dispatcher): State<Arc<Dispatcher<H>>>,
    Path((labeler_id, developer_id)): Path<(String, String)>,
) -> GatewayResponse
where
    H: ApiHandler,
{
    dispatcher.allocate(&labeler_id, &developer_id).await
}

/// POST /tasks
///
/// The body is parsed here rather than by `Json` so that malformed input
/// gets the same error envelope as every other failure.
async fn submit_tasks<H>(State(dispatcher): State<Arc<Dispatcher<H>>>, body: Bytes) -> GatewayResponse
where
    H: ApiHandler,
{
    if body.is_empty() {
        return dispatcher.submit(None).await;
    }
    match serde_json::from_slice::<Value>(&body) {
        Ok(value) => dispatcher.submit(Some(value)).await,
        Err(e) => dispatcher.error(ApiError::InvalidRequest(format!("body is not JSON: {e}"))),
    }
}

async fn preflight<H>(State(dispatcher): State<Arc<Dispatcher<H>>>) -> GatewayResponse
where
    H: ApiHandler,
{
    dispatcher.preflight()
}

// ============================================================================
// Response conversion
// ============================================================================

impl IntoResponse for GatewayResponse {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let mut headers = HeaderMap::with_capacity(self.headers.len());
        for (name, value) in &self.headers {
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                headers.insert(name, value);
            }
        }

        (status, headers, self.body).into_response()
    }
}
