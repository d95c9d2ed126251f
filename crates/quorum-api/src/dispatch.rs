use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use quorum_core::CoreError;
use quorum_model::{AssignedTask, DeveloperId, LabelerId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::error::ApiError;
use crate::handler::ApiHandler;

const SUBMIT_OK: &str = "Success.";

/// Gateway-style request event.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayRequest {
    pub http_method: String,
    #[serde(default)]
    pub path_parameters: Option<HashMap<String, String>>,
    /// A JSON object, or a string holding one.
    #[serde(default)]
    pub body: Option<Value>,
}

impl GatewayRequest {
    pub fn get(labeler_id: &str, developer_id: &str) -> Self {
        let params = HashMap::from([
            ("labelerId".to_string(), labeler_id.to_string()),
            ("developerId".to_string(), developer_id.to_string()),
        ]);
        Self {
            http_method: "GET".into(),
            path_parameters: Some(params),
            body: None,
        }
    }

    pub fn post(body: Value) -> Self {
        Self {
            http_method: "POST".into(),
            path_parameters: None,
            body: Some(body),
        }
    }
}

/// Gateway-style response envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayResponse {
    pub headers: BTreeMap<String, String>,
    pub status_code: u16,
    pub body: String,
}

impl GatewayResponse {
    fn new(status_code: u16, content_type: &str, body: String) -> Self {
        let mut headers = cors_headers();
        headers.insert("Content-Type".into(), content_type.into());
        Self {
            headers,
            status_code,
            body,
        }
    }

    fn preflight() -> Self {
        let mut headers = cors_headers();
        headers.insert(
            "Access-Control-Allow-Methods".into(),
            "GET, POST, OPTIONS".into(),
        );
        headers.insert("Access-Control-Allow-Headers".into(), "Content-Type".into());
        Self {
            headers,
            status_code: 200,
            body: String::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

fn cors_headers() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("Access-Control-Allow-Origin".to_string(), "*".to_string()),
        (
            "Access-Control-Allow-Credentials".to_string(),
            "true".to_string(),
        ),
    ])
}

/// Dispatcher configuration.
#[derive(Debug, Clone, Default)]
pub struct DispatchConfig {
    /// Map errors to 4xx/5xx instead of answering every handled error with 200.
    pub strict_status: bool,
}

#[derive(Deserialize)]
struct SubmitBody {
    results: Vec<AssignedTask>,
}

/// Routes gateway events to an [`ApiHandler`].
pub struct Dispatcher<H> {
    handler: Arc<H>,
    config: DispatchConfig,
}

impl<H> Dispatcher<H>
where
    H: ApiHandler,
{
    pub fn new(handler: Arc<H>, config: DispatchConfig) -> Self {
        Self { handler, config }
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    #[instrument(level = "debug", skip(self, request), fields(method = %request.http_method))]
    pub async fn dispatch(&self, request: GatewayRequest) -> GatewayResponse {
        match request.http_method.to_ascii_uppercase().as_str() {
            "GET" => {
                let params = request.path_parameters.unwrap_or_default();
                match (params.get("labelerId"), params.get("developerId")) {
                    (Some(labeler_id), Some(developer_id)) => {
                        self.allocate(labeler_id, developer_id).await
                    }
                    _ => self.error(ApiError::InvalidRequest(
                        "labelerId and developerId path parameters are required".into(),
                    )),
                }
            }
            "POST" => self.submit(request.body).await,
            "OPTIONS" => GatewayResponse::preflight(),
            other => self.error(ApiError::InvalidRequest(format!(
                "unsupported method: {other}"
            ))),
        }
    }

    /// Allocate tasks and answer with them as a JSON array.
    pub async fn allocate(&self, labeler_id: &str, developer_id: &str) -> GatewayResponse {
        let result = self
            .handler
            .allocate(&LabelerId::from(labeler_id), &DeveloperId::from(developer_id))
            .await
            .and_then(|tasks| {
                serde_json::to_string(&tasks)
                    .map_err(|e| ApiError::Core(CoreError::Internal(e.to_string())))
            });

        match result {
            Ok(body) => GatewayResponse::new(200, "application/json", body),
            Err(e) => self.error(e),
        }
    }

    /// Submit the answers carried by `body`.
    ///
    /// Accepts `{"results": [...]}` or a bare array, either inline or as a
    /// JSON string.
    pub async fn submit(&self, body: Option<Value>) -> GatewayResponse {
        let answers = match parse_answers(body) {
            Ok(answers) => answers,
            Err(e) => return self.error(e),
        };
        debug!(answers = answers.len(), "dispatching submission");

        match self.handler.submit(answers).await {
            Ok(report) => {
                debug!(
                    tasks = report.tasks.len(),
                    finished = report.finished(),
                    "submission applied"
                );
                GatewayResponse::new(200, "text/plain", SUBMIT_OK.into())
            }
            Err(e) => self.error(e),
        }
    }

    pub fn preflight(&self) -> GatewayResponse {
        GatewayResponse::preflight()
    }

    pub fn error(&self, err: ApiError) -> GatewayResponse {
        let status = err.status_code();
        warn!(kind = err.kind(), status, error = %err, "request failed");

        let body = serde_json::to_string(&err.body()).unwrap_or_else(|_| {
            format!(r#"{{"error":{{"kind":"{}","message":"unserializable error"}}}}"#, err.kind())
        });
        let status = if self.config.strict_status { status } else { 200 };
        GatewayResponse::new(status, "application/json", body)
    }
}

fn parse_answers(body: Option<Value>) -> Result<Vec<AssignedTask>, ApiError> {
    let body = match body {
        None | Some(Value::Null) => {
            return Err(ApiError::InvalidRequest("request body is required".into()));
        }
        Some(Value::String(raw)) => serde_json::from_str(&raw)
            .map_err(|e| ApiError::InvalidRequest(format!("body is not JSON: {e}")))?,
        Some(value) => value,
    };

    let answers = match body {
        Value::Array(_) => serde_json::from_value::<Vec<AssignedTask>>(body),
        _ => serde_json::from_value::<SubmitBody>(body).map(|b| b.results),
    };
    answers.map_err(|e| ApiError::InvalidRequest(format!("malformed answers: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use quorum_core::SubmitReport;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct StubHandler {
        submitted: Mutex<Vec<AssignedTask>>,
        fail: bool,
    }

    #[async_trait]
    impl ApiHandler for StubHandler {
        async fn allocate(
            &self,
            labeler_id: &LabelerId,
            _developer_id: &DeveloperId,
        ) -> Result<Vec<AssignedTask>, ApiError> {
            if self.fail {
                return Err(CoreError::NotFound {
                    entity: "developer profile",
                    id: labeler_id.to_string(),
                }
                .into());
            }
            Ok(Vec::new())
        }

        async fn submit(&self, answers: Vec<AssignedTask>) -> Result<SubmitReport, ApiError> {
            self.submitted.lock().unwrap().extend(answers);
            Ok(SubmitReport::default())
        }
    }

    fn answer() -> Value {
        json!({
            "taskId": "t-1",
            "type": "text",
            "data": {"text": "hello"},
            "class": {"A": true, "B": false},
            "jobId": "j-1",
            "labelerId": "l-1",
            "developerId": "d-1",
        })
    }

    fn dispatcher(handler: StubHandler, strict_status: bool) -> (Arc<StubHandler>, Dispatcher<StubHandler>) {
        let handler = Arc::new(handler);
        let d = Dispatcher::new(handler.clone(), DispatchConfig { strict_status });
        (handler, d)
    }

    #[tokio::test]
    async fn get_returns_json_array_with_cors() {
        let (_, d) = dispatcher(StubHandler::default(), false);
        let resp = d.dispatch(GatewayRequest::get("l-1", "d-1")).await;
        assert_eq!(resp.status_code, 200);
        assert_eq!(resp.body, "[]");
        assert_eq!(resp.headers["Access-Control-Allow-Origin"], "*");
        assert_eq!(resp.headers["Access-Control-Allow-Credentials"], "true");
    }

    #[tokio::test]
    async fn post_accepts_object_string_and_array_bodies() {
        let (handler, d) = dispatcher(StubHandler::default(), false);

        let inline = d.dispatch(GatewayRequest::post(json!({"results": [answer()]}))).await;
        assert_eq!(inline.body, "Success.");

        let raw = json!({"results": [answer()]}).to_string();
        let stringified = d.dispatch(GatewayRequest::post(Value::String(raw))).await;
        assert_eq!(stringified.body, "Success.");

        let bare = d.dispatch(GatewayRequest::post(json!([answer()]))).await;
        assert_eq!(bare.body, "Success.");

        assert_eq!(handler.submitted.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn handled_errors_answer_200_unless_strict() {
        let (_, lenient) = dispatcher(
            StubHandler {
                fail: true,
                ..Default::default()
            },
            false,
        );
        let resp = lenient.dispatch(GatewayRequest::get("l-1", "d-1")).await;
        assert_eq!(resp.status_code, 200);
        let body: Value = serde_json::from_str(&resp.body).unwrap();
        assert_eq!(body["error"]["kind"], "NotFound");

        let (_, strict) = dispatcher(
            StubHandler {
                fail: true,
                ..Default::default()
            },
            true,
        );
        let resp = strict.dispatch(GatewayRequest::get("l-1", "d-1")).await;
        assert_eq!(resp.status_code, 404);
    }

    #[tokio::test]
    async fn bad_requests() {
        let (_, d) = dispatcher(StubHandler::default(), true);

        let put = GatewayRequest {
            http_method: "PUT".into(),
            ..Default::default()
        };
        let resp = d.dispatch(put).await;
        assert_eq!(resp.status_code, 400);
        let body: Value = serde_json::from_str(&resp.body).unwrap();
        assert_eq!(body["error"]["kind"], "InvalidRequest");

        let no_params = GatewayRequest {
            http_method: "GET".into(),
            ..Default::default()
        };
        assert_eq!(d.dispatch(no_params).await.status_code, 400);

        let no_body = GatewayRequest {
            http_method: "POST".into(),
            ..Default::default()
        };
        assert_eq!(d.dispatch(no_body).await.status_code, 400);

        let garbage = d.dispatch(GatewayRequest::post(Value::String("{nope".into()))).await;
        assert_eq!(garbage.status_code, 400);

        let missing_results = d.dispatch(GatewayRequest::post(json!({"answers": []}))).await;
        assert_eq!(missing_results.status_code, 400);
    }

    #[tokio::test]
    async fn options_is_a_preflight() {
        let (_, d) = dispatcher(StubHandler::default(), false);
        let resp = d
            .dispatch(GatewayRequest {
                http_method: "options".into(),
                ..Default::default()
            })
            .await;
        assert_eq!(resp.status_code, 200);
        assert!(resp.body.is_empty());
        assert_eq!(resp.headers["Access-Control-Allow-Methods"], "GET, POST, OPTIONS");
    }

    #[test]
    fn gateway_event_deserializes() {
        let req: GatewayRequest = serde_json::from_value(json!({
            "httpMethod": "GET",
            "pathParameters": {"labelerId": "l", "developerId": "d"}
        }))
        .unwrap();
        assert_eq!(req.http_method, "GET");
        assert!(req.body.is_none());

        let resp = GatewayResponse::new(200, "text/plain", "Success.".into());
        let v = serde_json::to_value(&resp).unwrap();
        assert_eq!(v["statusCode"], 200);
        assert_eq!(v["body"], "Success.");
    }
}
