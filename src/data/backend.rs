//! HTTP client for the forecasting/clustering backend.

use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;

use crate::domain::{ClusterPoint, ForecastData};
use crate::error::AppError;

use super::wire::{
    ClusterResponse, ForecastRequest, ForecastResponse, ValidationIssue, validate_clusters,
    validate_forecast,
};

pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:5000";
const BACKEND_URL_ENV: &str = "MECHA_BACKEND_URL";

/// Validated forecast plus the records that had to be dropped.
#[derive(Debug, Clone, Default)]
pub struct ForecastFetch {
    pub data: ForecastData,
    pub issues: Vec<ValidationIssue>,
}

#[derive(Debug, Clone, Default)]
pub struct ClusterFetch {
    pub points: Vec<ClusterPoint>,
    pub issues: Vec<ValidationIssue>,
}

/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();
        Self {
            client: Client::new(),
            base_url,
        }
    }

    /// Build a client from `explicit`, else `MECHA_BACKEND_URL` (after loading
    /// `.env`), else the local default.
    pub fn from_env(explicit: Option<&str>) -> Self {
        dotenvy::dotenv().ok();
        let base_url = explicit
            .map(str::to_string)
            .or_else(|| std::env::var(BACKEND_URL_ENV).ok())
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());
        Self::new(base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn fetch_forecast(&self, request: &ForecastRequest) -> Result<ForecastFetch, AppError> {
        let url = format!("{}/forecast", self.base_url);
        tracing::info!(
            store = %request.store_id,
            product = %request.product_name,
            start = %request.start_date,
            end = %request.end_date,
            "fetching forecast"
        );

        let body: ForecastResponse = self.send_json(self.client.post(&url).json(request), "forecast")?;
        let (data, issues) = validate_forecast(body);
        log_issues("forecast", &issues);
        tracing::info!(
            predicted = data.predicted.len(),
            actual = data.actual.len(),
            dropped = issues.len(),
            "forecast received"
        );
        Ok(ForecastFetch { data, issues })
    }

    pub fn fetch_clusters(&self) -> Result<ClusterFetch, AppError> {
        let url = format!("{}/clustering", self.base_url);
        tracing::info!("fetching clusters");

        let body: ClusterResponse = self.send_json(self.client.get(&url), "clustering")?;
        let (points, issues) = validate_clusters(body);
        log_issues("clustering", &issues);
        tracing::info!(points = points.len(), dropped = issues.len(), "clusters received");
        Ok(ClusterFetch { points, issues })
    }

    fn send_json<T: DeserializeOwned>(
        &self,
        req: reqwest::blocking::RequestBuilder,
        what: &str,
    ) -> Result<T, AppError> {
        let resp = req.send().map_err(|e| {
            tracing::warn!(error = %e, endpoint = what, "backend request failed");
            AppError::backend(format!("{what} request failed: {e}"))
        })?;

        let status = resp.status();
        let body = resp.text().map_err(|e| {
            tracing::warn!(error = %e, endpoint = what, "failed to read backend response");
            AppError::backend(format!("Failed to read {what} response: {e}"))
        })?;
        decode_response(what, status, &body)
    }
}

/// Turn a status and body into the decoded payload or a backend error.
///
/// Any non-success status is a failure; the backend's `{"error": "..."}` detail
/// is included when present.
fn decode_response<T: DeserializeOwned>(what: &str, status: StatusCode, body: &str) -> Result<T, AppError> {
    if !status.is_success() {
        let detail = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string));
        tracing::warn!(%status, endpoint = what, detail = detail.as_deref().unwrap_or(""), "backend returned failure status");
        return Err(AppError::backend(match detail {
            Some(detail) => format!("{what} request failed with status {status}: {detail}"),
            None => format!("{what} request failed with status {status}."),
        }));
    }

    serde_json::from_str(body).map_err(|e| {
        tracing::warn!(error = %e, endpoint = what, "failed to parse backend response");
        AppError::backend(format!("Failed to parse {what} response: {e}"))
    })
}

fn log_issues(what: &str, issues: &[ValidationIssue]) {
    for issue in issues {
        tracing::warn!(endpoint = what, "{issue}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalized() {
        let client = BackendClient::new(" http://localhost:5000/ ");
        assert_eq!(client.base_url(), "http://localhost:5000");
    }

    #[test]
    fn explicit_url_wins() {
        let client = BackendClient::from_env(Some("http://example.test:9000"));
        assert_eq!(client.base_url(), "http://example.test:9000");
    }

    #[test]
    fn failure_status_carries_backend_error_detail() {
        let cases = [
            (StatusCode::BAD_REQUEST, r#"{"error": "Invalid Store ID or Product Name"}"#, Some("Invalid Store ID or Product Name")),
            (StatusCode::NOT_FOUND, r#"{"error": "No data available for given store and product"}"#, Some("No data available for given store and product")),
            (StatusCode::INTERNAL_SERVER_ERROR, r#"{"error": "boom"}"#, Some("boom")),
            (StatusCode::BAD_REQUEST, "", None),
            (StatusCode::NOT_FOUND, "<html>not found</html>", None),
            (StatusCode::INTERNAL_SERVER_ERROR, r#"{"message": "boom"}"#, None),
        ];
        for (status, body, detail) in cases {
            let err = decode_response::<ForecastResponse>("forecast", status, body).unwrap_err();
            assert_eq!(err.exit_code(), 4);
            assert!(err.message().contains(&status.to_string()), "{}", err.message());
            match detail {
                Some(detail) => assert!(err.message().ends_with(detail), "{}", err.message()),
                None => assert!(err.message().ends_with('.'), "{}", err.message()),
            }
        }
    }

    #[test]
    fn success_body_is_decoded() {
        let resp: ClusterResponse =
            decode_response("clustering", StatusCode::OK, r#"{"clusters": [{"sales": 1.0}]}"#).unwrap();
        assert_eq!(resp.clusters.len(), 1);

        let err = decode_response::<ClusterResponse>("clustering", StatusCode::OK, "not json").unwrap_err();
        assert_eq!(err.exit_code(), 4);
        assert!(err.message().starts_with("Failed to parse clustering response"));
    }
}
