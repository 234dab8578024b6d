use reqwest::{header::CONTENT_TYPE, StatusCode};
use serde_json::Value;
use thiserror::Error;

use crate::{
    models::{ErrorBody, SolveRequest, Solution},
    telemetry,
};

/** \brief 后端默认地址。 */
pub const DEFAULT_API_BASE: &str = "http://localhost:8080";

const SOLVE_FALLBACK_MESSAGE: &str = "Failed to generate solution";
const PROVIDERS_FALLBACK_MESSAGE: &str = "Failed to fetch providers";

/**
 * \brief 客户端错误。`Display` 即展示给用户的单行信息。
 */
#[derive(Debug, Error)]
pub enum ClientError {
    /** \brief 未拿到任何响应（连接失败、DNS 等）。 */
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),
    /** \brief 后端返回非 2xx，消息取自响应体 `error` 字段。 */
    #[error("{message}")]
    Server { status: StatusCode, message: String },
    /** \brief Provider 列表获取失败（状态码或网络）。 */
    #[error("{}", PROVIDERS_FALLBACK_MESSAGE)]
    Fetch {
        status: Option<StatusCode>,
        #[source]
        source: Option<reqwest::Error>,
    },
    /** \brief 2xx 但响应体无法解析。 */
    #[error("invalid response body: {0}")]
    Decode(#[source] reqwest::Error),
    #[error("failed to build http client: {0}")]
    Build(#[source] reqwest::Error),
}

impl ClientError {
    /** \brief 后端返回的状态码（若有）。 */
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Server { status, .. } => Some(*status),
            ClientError::Fetch { status, .. } => *status,
            _ => None,
        }
    }
}

/**
 * \brief 解题后端客户端：每次调用恰好一次 HTTP 往返，无重试、无超时。
 */
#[derive(Debug, Clone)]
pub struct SolverClient {
    base_url: String,
    http: reqwest::Client,
}

impl SolverClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(ClientError::Build)?;
        Ok(Self::with_http(base_url, http))
    }

    /**
     * \brief 复用外部构造的 reqwest::Client。
     */
    pub fn with_http(base_url: &str, http: reqwest::Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /**
     * \brief POST /api/solve，返回后端给出的解答。
     */
    pub async fn solve(&self, request: &SolveRequest) -> Result<Solution, ClientError> {
        let url = format!("{}/api/solve", self.base_url);
        telemetry::log_event(
            "client.solve",
            &format!(
                "provider={} language={} level={} problem_len={}",
                request.provider,
                request.language,
                request.user_level,
                request.problem_text.len()
            ),
        );

        let resp = self
            .http
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                telemetry::log_error("client.solve", &format!("network failure: {}", e));
                ClientError::Network(e)
            })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let message = server_error_message(&text);
            telemetry::log_error(
                "client.solve",
                &format!("server returned {}: {}", status, message),
            );
            return Err(ClientError::Server { status, message });
        }

        let solution: Solution = resp.json().await.map_err(|e| {
            telemetry::log_error("client.solve", &format!("decode failed: {}", e));
            ClientError::Decode(e)
        })?;
        telemetry::log_event(
            "client.solve",
            &format!(
                "ok code_len={} hints={}",
                solution.code.len(),
                solution.hints.len()
            ),
        );
        Ok(solution)
    }

    /**
     * \brief GET /api/providers，响应体原样返回。
     */
    pub async fn list_providers(&self) -> Result<Value, ClientError> {
        let url = format!("{}/api/providers", self.base_url);
        let resp = self.http.get(url).send().await.map_err(|e| {
            telemetry::log_error("client.providers", &format!("network failure: {}", e));
            ClientError::Fetch {
                status: None,
                source: Some(e),
            }
        })?;

        let status = resp.status();
        if !status.is_success() {
            telemetry::log_error("client.providers", &format!("server returned {}", status));
            return Err(ClientError::Fetch {
                status: Some(status),
                source: None,
            });
        }
        resp.json().await.map_err(ClientError::Decode)
    }
}

fn server_error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .filter(|msg| !msg.is_empty())
        .unwrap_or_else(|| SOLVE_FALLBACK_MESSAGE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::StatusCode as AxumStatus,
        routing::{get, post},
        Json, Router,
    };
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    async fn spawn_backend(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve");
        });
        format!("http://{}", addr)
    }

    async fn refused_base_url() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("local addr");
        drop(listener);
        format!("http://{}", addr)
    }

    fn sample_request() -> SolveRequest {
        SolveRequest {
            problem_text: "Given an array, return indices of two numbers adding to target."
                .to_string(),
            language: "rust".to_string(),
            user_level: "advanced".to_string(),
            provider: "claude".to_string(),
            api_key: "sk-ant".to_string(),
        }
    }

    #[tokio::test]
    async fn test_solve_returns_full_solution() {
        let captured = Arc::new(Mutex::new(None::<Value>));
        let sink = captured.clone();
        let app = Router::new().route(
            "/api/solve",
            post(move |Json(body): Json<Value>| {
                let sink = sink.clone();
                async move {
                    *sink.lock().unwrap() = Some(body);
                    Json(json!({
                        "explanation": "Use a hash map.",
                        "code": "fn two_sum() {}",
                        "hints": ["Think about complements", "One pass is enough"],
                        "time_complexity": "O(n)",
                        "space_complexity": "O(n)"
                    }))
                }
            }),
        );
        let base = spawn_backend(app).await;
        let client = SolverClient::new(&base).expect("client");

        let solution = client.solve(&sample_request()).await.expect("solve");
        assert_eq!(solution.explanation, "Use a hash map.");
        assert_eq!(solution.code, "fn two_sum() {}");
        assert_eq!(
            solution.hints,
            vec!["Think about complements", "One pass is enough"]
        );
        assert_eq!(solution.time_complexity, "O(n)");
        assert_eq!(solution.space_complexity, "O(n)");

        let body = captured.lock().unwrap().clone().expect("body captured");
        assert_eq!(
            body,
            json!({
                "problem_text": "Given an array, return indices of two numbers adding to target.",
                "language": "rust",
                "user_level": "advanced",
                "provider": "claude",
                "api_key": "sk-ant"
            })
        );
    }

    #[tokio::test]
    async fn test_solve_surfaces_server_error_message() {
        let app = Router::new().route(
            "/api/solve",
            post(|| async {
                (
                    AxumStatus::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "bad key" })),
                )
            }),
        );
        let base = spawn_backend(app).await;
        let client = SolverClient::new(&base).expect("client");

        let err = client.solve(&sample_request()).await.unwrap_err();
        assert_eq!(err.to_string(), "bad key");
        assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
    }

    #[tokio::test]
    async fn test_solve_falls_back_without_error_field() {
        let app = Router::new().route(
            "/api/solve",
            post(|| async { (AxumStatus::BAD_GATEWAY, "upstream exploded") }),
        );
        let base = spawn_backend(app).await;
        let client = SolverClient::new(&base).expect("client");

        let err = client.solve(&sample_request()).await.unwrap_err();
        assert!(matches!(err, ClientError::Server { .. }));
        assert_eq!(err.to_string(), "Failed to generate solution");
    }

    #[tokio::test]
    async fn test_solve_transport_failure_is_network_error() {
        let client = SolverClient::new(&refused_base_url().await).expect("client");
        let err = client.solve(&sample_request()).await.unwrap_err();
        assert!(matches!(err, ClientError::Network(_)));
        assert!(err.to_string().starts_with("Network error"));
    }

    #[tokio::test]
    async fn test_solve_tolerates_partial_camel_case_body() {
        let app = Router::new().route(
            "/api/solve",
            post(|| async {
                Json(json!({
                    "explanation": "Sort first.",
                    "code": "x",
                    "timeComplexity": "O(n log n)"
                }))
            }),
        );
        let base = spawn_backend(app).await;
        let client = SolverClient::new(&format!("{}/", base)).expect("client");

        let solution = client.solve(&sample_request()).await.expect("solve");
        assert_eq!(solution.time_complexity, "O(n log n)");
        assert!(solution.space_complexity.is_empty());
        assert!(solution.hints.is_empty());
    }

    #[tokio::test]
    async fn test_solve_accepts_null_hints_from_backend() {
        let app = Router::new().route(
            "/api/solve",
            post(|| async {
                Json(json!({
                    "explanation": "Two pointers.",
                    "code": "y",
                    "hints": null,
                    "timeComplexity": "O(n)",
                    "spaceComplexity": null
                }))
            }),
        );
        let base = spawn_backend(app).await;
        let client = SolverClient::new(&base).expect("client");

        let solution = client.solve(&sample_request()).await.expect("solve");
        assert_eq!(solution.explanation, "Two pointers.");
        assert!(solution.hints.is_empty());
        assert_eq!(solution.time_complexity, "O(n)");
        assert!(solution.space_complexity.is_empty());
    }

    #[tokio::test]
    async fn test_list_providers_passes_json_through() {
        let app = Router::new().route(
            "/api/providers",
            get(|| async { Json(json!(["openai", "gemini", "claude", "groq"])) }),
        );
        let base = spawn_backend(app).await;
        let client = SolverClient::new(&base).expect("client");

        let providers = client.list_providers().await.expect("providers");
        assert_eq!(providers, json!(["openai", "gemini", "claude", "groq"]));
    }

    #[tokio::test]
    async fn test_list_providers_non_success_is_fetch_error() {
        let app = Router::new().route(
            "/api/providers",
            get(|| async { (AxumStatus::SERVICE_UNAVAILABLE, "down") }),
        );
        let base = spawn_backend(app).await;
        let client = SolverClient::new(&base).expect("client");

        let err = client.list_providers().await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to fetch providers");
        assert_eq!(err.status(), Some(StatusCode::SERVICE_UNAVAILABLE));
    }

    #[tokio::test]
    async fn test_list_providers_transport_failure_is_fetch_error() {
        let client = SolverClient::new(&refused_base_url().await).expect("client");
        let err = client.list_providers().await.unwrap_err();
        assert!(matches!(err, ClientError::Fetch { status: None, .. }));
        assert_eq!(err.to_string(), "Failed to fetch providers");
    }

    #[test]
    fn test_server_error_message_extraction() {
        assert_eq!(server_error_message(r#"{"error":"quota"}"#), "quota");
        assert_eq!(
            server_error_message(r#"{"error":""}"#),
            "Failed to generate solution"
        );
        assert_eq!(server_error_message("<html>"), "Failed to generate solution");
        assert_eq!(server_error_message(r#"{"error":42}"#), "Failed to generate solution");
    }

    #[test]
    fn test_base_url_trims_trailing_slash() {
        let client = SolverClient::new("http://localhost:8080/").expect("client");
        assert_eq!(client.base_url(), "http://localhost:8080");
    }
}
