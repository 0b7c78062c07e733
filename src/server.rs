#![forbid(unsafe_code)]

//! HTTP surface: `/YTdown` lookups, CORS preflight, and the usage page.
//!
//! Handlers stay thin. Extraction itself is blocking (the adapters use a
//! synchronous HTTP client), so it is pushed onto the blocking pool.

use std::sync::Arc;

use axum::{
    Router,
    extract::{Query, Request, State, rejection::QueryRejection},
    http::{HeaderMap, HeaderValue, Method, StatusCode, header},
    middleware::{self, Next},
    response::{Html, IntoResponse, Response},
    routing::any,
};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::{error::ExtractError, model::ErrorResponse, orchestrator::Extractor};

pub const MISSING_URL_MESSAGE: &str = "Missing URL parameter. Use: /YTdown?url=YOUTUBE_URL";
const EXAMPLE_VIDEO_URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

#[derive(Clone)]
pub struct AppState {
    extractor: Arc<Extractor>,
}

impl AppState {
    pub fn new(extractor: Extractor) -> Self {
        Self {
            extractor: Arc::new(extractor),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/YTdown", any(download_info))
        .route("/YTdown/", any(download_info))
        .fallback(usage_page)
        .layer(middleware::from_fn(cors))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    kind: &'static str,
    message: String,
}

impl ApiError {
    /// 400 for a request the caller has to fix.
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            kind: "invalid_input",
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            kind: "internal",
            message: message.into(),
        }
    }
}

// Extraction errors keep the 500 status the public API has always used,
// including for unrecognized URLs; `kind` tells the cases apart.
impl From<ExtractError> for ApiError {
    fn from(err: ExtractError) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        pretty_json(self.status, &ErrorResponse::new(self.kind, self.message))
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// Value of the first `url` pair; later repeats are ignored. An empty value
/// counts as missing, whitespace does not.
fn first_url_param(pairs: Vec<(String, String)>) -> Option<String> {
    pairs
        .into_iter()
        .find(|(key, _)| key == "url")
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}

async fn download_info(
    State(state): State<AppState>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> ApiResult<Response> {
    let raw_url = query
        .ok()
        .and_then(|Query(pairs)| first_url_param(pairs))
        .ok_or_else(|| ApiError::bad_request(MISSING_URL_MESSAGE))?;

    let extractor = Arc::clone(&state.extractor);
    let result = tokio::task::spawn_blocking(move || extractor.extract(&raw_url))
        .await
        .map_err(|err| ApiError::internal(format!("extraction task failed: {err}")))??;
    Ok(pretty_json(StatusCode::OK, &result))
}

async fn usage_page(headers: HeaderMap) -> Html<String> {
    let origin = request_origin(&headers);
    let origin = html_escape::encode_text(&origin);
    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head><title>YouTube Downloader API</title></head>
<body>
  <h1>YouTube Downloader API</h1>
  <p><strong>Endpoint:</strong> <code>/YTdown?url=YOUTUBE_URL</code></p>
  <p><strong>Example:</strong></p>
  <code>{origin}/YTdown?url={EXAMPLE_VIDEO_URL}</code>
</body>
</html>
"#
    ))
}

/// Answers preflight requests directly and stamps permissive CORS headers on
/// everything else.
async fn cors(request: Request, next: Next) -> Response {
    let mut response = if request.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(request).await
    };
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
    response
}

fn pretty_json<T: Serialize>(status: StatusCode, value: &T) -> Response {
    match serde_json::to_string_pretty(value) {
        Ok(body) => (
            status,
            [(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))],
            body,
        )
            .into_response(),
        Err(err) => {
            error!(error = %err, "failed to serialize response body");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn request_origin(headers: &HeaderMap) -> String {
    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("localhost");
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|value| value.to_str().ok())
        .filter(|value| matches!(*value, "http" | "https"))
        .unwrap_or("http");
    format!("{scheme}://{host}")
}
