//! REST API handlers for attribution queries and operational endpoints.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use dealtrace_attribution::{AttributionEngine, ModelKind};
use dealtrace_core::error::DealTraceError;
use dealtrace_core::types::DateRange;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, warn};

/// Shared application state for REST handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<AttributionEngine>,
    pub node_id: String,
    pub start_time: Instant,
}

/// Query contract for `GET /attribution`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributionQuery {
    pub start_date: String,
    pub end_date: String,
    /// `summary=true` switches from the per-opportunity detail array to the
    /// per-type rollup object.
    #[serde(default)]
    pub summary: Option<bool>,
    /// Optional single-model restriction for summary mode.
    #[serde(default)]
    pub model: Option<ModelKind>,
}

/// Validate the query at the API boundary: parse the window and check the
/// model filter, before any fetch happens.
fn validate_query(query: &AttributionQuery) -> Result<DateRange, String> {
    let range = DateRange::from_iso_dates(&query.start_date, &query.end_date)
        .map_err(|e| e.to_string())?;
    if let Some(model) = query.model {
        if !model.is_aggregatable() {
            return Err(format!(
                "model filter only supports summary models, got {:?}",
                model
            ));
        }
    }
    Ok(range)
}

/// GET /attribution — detail or summary attribution over a date window.
pub async fn handle_attribution(
    State(state): State<AppState>,
    Query(query): Query<AttributionQuery>,
) -> Result<Response, (StatusCode, Json<ErrorResponse>)> {
    metrics::counter!("api.attribution_requests").increment(1);

    let range = match validate_query(&query) {
        Ok(range) => range,
        Err(msg) => {
            warn!(error = %msg, "Attribution query validation failed");
            metrics::counter!("api.validation_errors").increment(1);
            return Err((
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: "invalid_range".to_string(),
                    message: msg,
                }),
            ));
        }
    };

    let outcome = if query.summary.unwrap_or(false) {
        state
            .engine
            .summary(range, query.model)
            .await
            .map(|summary| Json(summary).into_response())
    } else {
        state
            .engine
            .detail(range)
            .await
            .map(|results| Json(results).into_response())
    };

    outcome.map_err(|e| {
        error!(error = %e, "Attribution computation failed");
        metrics::counter!("api.errors").increment(1);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "attribution_failed".to_string(),
                message: match e {
                    DealTraceError::Store(_) => "Pipeline store unavailable".to_string(),
                    _ => "Internal processing error".to_string(),
                },
            }),
        )
    })
}

/// GET /health — Health check endpoint.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        node_id: state.node_id.clone(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// GET /ready — Readiness probe for Kubernetes.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    if state.start_time.elapsed().as_secs() > 0 {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// GET /live — Liveness probe for Kubernetes.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub node_id: String,
    pub uptime_secs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(start: &str, end: &str, model: Option<ModelKind>) -> AttributionQuery {
        AttributionQuery {
            start_date: start.to_string(),
            end_date: end.to_string(),
            summary: Some(true),
            model,
        }
    }

    #[test]
    fn test_validate_accepts_iso_window() {
        let range = validate_query(&query("2024-03-01", "2024-03-31", None)).unwrap();
        assert!(range.start < range.end);
    }

    #[test]
    fn test_validate_rejects_inverted_window() {
        let err = validate_query(&query("2024-04-01", "2024-03-01", None)).unwrap_err();
        assert!(err.contains("after"));
    }

    #[test]
    fn test_validate_rejects_unparsable_dates() {
        assert!(validate_query(&query("yesterday", "2024-03-31", None)).is_err());
    }

    #[test]
    fn test_validate_rejects_detail_only_model_filter() {
        let err = validate_query(&query("2024-03-01", "2024-03-31", Some(ModelKind::FirstTouch)))
            .unwrap_err();
        assert!(err.contains("summary models"));
    }

    #[test]
    fn test_validate_accepts_summary_model_filter() {
        for model in ModelKind::SUMMARY_MODELS {
            assert!(validate_query(&query("2024-03-01", "2024-03-31", Some(model))).is_ok());
        }
    }

    #[test]
    fn test_query_deserializes_camel_case() {
        let query: AttributionQuery = serde_json::from_str(
            r#"{"startDate": "2024-03-01", "endDate": "2024-03-31", "summary": true, "model": "timeDecay"}"#,
        )
        .unwrap();
        assert_eq!(query.model, Some(ModelKind::TimeDecay));
        assert_eq!(query.summary, Some(true));
    }
}
