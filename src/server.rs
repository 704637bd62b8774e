//! HTTP request surface for profiler control and statistics
//!
//! Two resources, five operations:
//!
//! - `POST /profiler` starts the profiler (201, idempotent)
//! - `GET /profiler` reports `{running: bool}` (200)
//! - `DELETE /profiler` stops the profiler (204, idempotent)
//! - `GET /profiler/stats` returns the sorted report (200/400/404)
//! - `DELETE /profiler/stats` clears retained data (204)
//!
//! Query-parameter validation for the stats endpoint collects errors
//! rather than short-circuiting: an invalid `sort` and an unparsable
//! `count` both end up in the same 400 message.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ProfilerError;
use crate::lifecycle::ProfilerController;
use crate::stats::{self, ReportRow, SortKey};

/// Default number of report rows when `count` is not given
const DEFAULT_COUNT: usize = 20;

/// Lowercased `stripDirs` values that mean false; anything else,
/// including typos, means true
const FALSY: &[&str] = &["false", "no", "none", "null", "0", ""];

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<ProfilerController>,
}

#[derive(Debug, Serialize)]
struct RunningBody {
    running: bool,
}

#[derive(Debug, Serialize)]
struct StatisticsBody {
    statistics: Vec<ReportRow>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// Error response carrying a status code and a JSON `{error}` body
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: String) -> Self {
        ApiError {
            status: StatusCode::BAD_REQUEST,
            message,
        }
    }
}

impl From<ProfilerError> for ApiError {
    fn from(err: ProfilerError) -> Self {
        let status = match err {
            ProfilerError::NoData => StatusCode::NOT_FOUND,
            ProfilerError::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        ApiError {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}

/// Raw query parameters of `GET /profiler/stats`, before validation
#[derive(Debug, Default, Deserialize)]
pub struct StatsQuery {
    sort: Option<String>,
    count: Option<String>,
    #[serde(rename = "stripDirs")]
    strip_dirs: Option<String>,
}

/// Validated report parameters
#[derive(Debug, PartialEq, Eq)]
pub struct ReportParams {
    pub sort: SortKey,
    pub limit: Option<usize>,
    pub strip_dirs: bool,
}

/// Validate stats query parameters, collecting all errors into one
/// message rather than stopping at the first
pub fn validate_params(query: &StatsQuery) -> Result<ReportParams, String> {
    let mut error = String::new();

    let sort = match query.sort.as_deref() {
        None => SortKey::CumTime,
        Some(value) => match SortKey::parse(value) {
            Some(key) => key,
            None => {
                let names: Vec<&str> = SortKey::ALL.iter().map(|k| k.as_str()).collect();
                error.push_str(&format!(
                    "Invalid `sort` '{value}', must be in ({}).",
                    names.join(", ")
                ));
                SortKey::CumTime
            }
        },
    };

    let limit = match query.count.as_deref() {
        None => Some(DEFAULT_COUNT),
        Some(value) => match value.parse::<i64>() {
            // Zero and negative counts mean "no limit", not an error
            Ok(count) if count <= 0 => None,
            Ok(count) => Some(count as usize),
            Err(_) => {
                error.push_str(&format!("Can't cast `count` '{value}' to int."));
                Some(DEFAULT_COUNT)
            }
        },
    };

    let strip_dirs = match query.strip_dirs.as_deref() {
        None => true,
        Some(value) => !FALSY.contains(&value.to_lowercase().as_str()),
    };

    if !error.is_empty() {
        return Err(error);
    }
    Ok(ReportParams {
        sort,
        limit,
        strip_dirs,
    })
}

async fn start_profiler(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    // Starting an already-running profiler is not an error; respond 201
    // either way
    if !state.controller.is_running() {
        state.controller.start()?;
        info!("profiler started");
    }
    Ok((
        StatusCode::CREATED,
        [(header::CONTENT_TYPE, "application/json")],
    ))
}

async fn profiler_status(State(state): State<AppState>) -> Json<RunningBody> {
    Json(RunningBody {
        running: state.controller.is_running(),
    })
}

async fn stop_profiler(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    state.controller.stop()?;
    info!("profiler stopped");
    Ok((
        StatusCode::NO_CONTENT,
        [(header::CONTENT_TYPE, "application/json")],
    ))
}

async fn get_stats(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<StatisticsBody>, ApiError> {
    let params = validate_params(&query).map_err(|message| {
        warn!(%message, "rejected statistics query");
        ApiError::bad_request(message)
    })?;
    let statistics = stats::build_report(
        state.controller.backend(),
        params.sort,
        params.limit,
        params.strip_dirs,
    )?;
    Ok(Json(StatisticsBody { statistics }))
}

async fn clear_stats(State(state): State<AppState>) -> impl IntoResponse {
    state.controller.clear_stats();
    info!("profiler statistics cleared");
    (
        StatusCode::NO_CONTENT,
        [(header::CONTENT_TYPE, "application/json")],
    )
}

/// Profiler routes, ready to be nested under a caller-chosen prefix
pub fn profiler_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/profiler",
            post(start_profiler)
                .get(profiler_status)
                .delete(stop_profiler),
        )
        .route("/profiler/stats", get(get_stats).delete(clear_stats))
}

/// Build the application router, nesting the profiler routes under
/// `prefix` when one is configured
pub fn app(state: AppState, prefix: &str) -> Router {
    let routes = profiler_routes();
    let router = if prefix.is_empty() || prefix == "/" {
        routes
    } else {
        Router::new().nest(prefix, routes)
    };
    router.with_state(state)
}
