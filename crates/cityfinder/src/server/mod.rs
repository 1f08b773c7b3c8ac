//! HTTP transport for the query service.
//!
//! - `GET /city/proximity?city_id=..&top_k=..[&country_restriction=..]`
//! - `GET /city/lexicographical?city_name_match_str=..[&top_k=..][&country_restriction=..]`
//! - `GET /health`
//!
//! Failures are returned as `{"error_msg": "..."}` with 404 for an unknown city,
//! 400 for bad parameters and 500 for anything else.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::{error, info, instrument, warn};

use crate::config::ServiceConfig;
use crate::error::Result;
use crate::search::CityHit;
use crate::service::{CityService, QueryError};

#[derive(Clone)]
struct AppState {
    service: Arc<CityService>,
    request_timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct ProximityParams {
    city_id: Option<String>,
    top_k: Option<String>,
    country_restriction: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LexicographicParams {
    city_name_match_str: Option<String>,
    top_k: Option<String>,
    country_restriction: Option<String>,
}

#[derive(Debug, Serialize)]
struct ProximityResponse {
    closest_cities_by_proximity: Vec<CityHit>,
}

#[derive(Debug, Serialize)]
struct LexicographicResponse {
    closest_cities_by_lexicography: Vec<CityHit>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    cities: usize,
}

#[derive(Serialize)]
struct ErrorJson {
    error_msg: String,
}

/// A [`QueryError`] on its way out as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub QueryError);

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        Self(err)
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self(QueryError::Validation(rejection.body_text()))
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0 {
            QueryError::CityNotFound { .. } => StatusCode::NOT_FOUND,
            QueryError::Validation(_) => StatusCode::BAD_REQUEST,
            QueryError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self.0, "Request failed");
        } else {
            warn!(status = status.as_u16(), error = %self.0, "Request rejected");
        }
        let body = Json(ErrorJson {
            error_msg: self.0.to_string(),
        });
        (status, body).into_response()
    }
}

/// Builds the application router around a loaded service.
pub fn router(service: Arc<CityService>, config: &ServiceConfig) -> Router {
    let state = AppState {
        service,
        request_timeout: config.request_timeout,
    };

    Router::new()
        .route("/city/proximity", get(proximity))
        .route("/city/lexicographical", get(lexicographical))
        .route("/health", get(health))
        .with_state(state)
}

/// Binds `config.bind_addr` and serves until Ctrl-C.
pub async fn serve(config: &ServiceConfig, service: Arc<CityService>) -> Result<()> {
    let listener = TcpListener::bind(config.bind_addr).await?;
    serve_listener(listener, service, config, shutdown_signal()).await
}

/// Serves on an already bound listener until `shutdown` resolves.
pub async fn serve_listener<F>(
    listener: TcpListener,
    service: Arc<CityService>,
    config: &ServiceConfig,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    info!(addr = %listener.local_addr()?, "Listening");
    axum::serve(listener, router(service, config))
        .with_graceful_shutdown(shutdown)
        .await?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl-C, shutting down"),
        Err(e) => {
            error!(error = %e, "Could not listen for Ctrl-C, running until killed");
            std::future::pending::<()>().await;
        }
    }
}

/// Integer query parameter. Anything that does not parse counts as absent.
fn int_param(value: Option<&str>) -> Option<i64> {
    value.and_then(|v| v.trim().parse().ok())
}

fn missing(param: &str) -> QueryError {
    QueryError::Validation(format!("Could not find `{param}` parameter"))
}

/// Runs an O(n) query off the async workers, bounded by the request timeout.
async fn run_query<F>(state: &AppState, query: F) -> std::result::Result<Vec<CityHit>, QueryError>
where
    F: FnOnce(&CityService) -> std::result::Result<Vec<CityHit>, QueryError> + Send + 'static,
{
    let service = Arc::clone(&state.service);
    let task = tokio::task::spawn_blocking(move || query(&service));

    match tokio::time::timeout(state.request_timeout, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => Err(QueryError::Internal(format!("Query task failed: {e}"))),
        Err(_) => Err(QueryError::Internal(format!(
            "Query timed out after {:?}",
            state.request_timeout
        ))),
    }
}

#[instrument(name = "GET /city/proximity", skip_all, level = "info")]
async fn proximity(
    State(state): State<AppState>,
    params: std::result::Result<Query<ProximityParams>, QueryRejection>,
) -> std::result::Result<Json<ProximityResponse>, ApiError> {
    let Query(params) = params?;

    let top_k = int_param(params.top_k.as_deref()).ok_or_else(|| missing("top_k"))?;
    let city_id = int_param(params.city_id.as_deref()).ok_or_else(|| missing("city_id"))?;
    let country = params.country_restriction;

    let hits = run_query(&state, move |service| {
        service.proximity_query(city_id, top_k, country.as_deref())
    })
    .await?;

    Ok(Json(ProximityResponse {
        closest_cities_by_proximity: hits,
    }))
}

#[instrument(name = "GET /city/lexicographical", skip_all, level = "info")]
async fn lexicographical(
    State(state): State<AppState>,
    params: std::result::Result<Query<LexicographicParams>, QueryRejection>,
) -> std::result::Result<Json<LexicographicResponse>, ApiError> {
    let Query(params) = params?;

    let name_match = params
        .city_name_match_str
        .ok_or_else(|| missing("city_name_match_str"))?;
    let top_k = int_param(params.top_k.as_deref());
    let country = params.country_restriction;

    let hits = run_query(&state, move |service| {
        service.lexicographic_query(&name_match, top_k, country.as_deref())
    })
    .await?;

    Ok(Json(LexicographicResponse {
        closest_cities_by_lexicography: hits,
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        cities: state.service.stats().cities,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_param() {
        assert_eq!(int_param(Some("5")), Some(5));
        assert_eq!(int_param(Some(" -2 ")), Some(-2));
        assert_eq!(int_param(Some("five")), None);
        assert_eq!(int_param(Some("")), None);
        assert_eq!(int_param(None), None);
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError(QueryError::CityNotFound { city_id: 1 }).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(ApiError(missing("top_k")).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError(QueryError::Internal("boom".to_string())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_missing_message() {
        assert_eq!(
            missing("city_id").to_string(),
            "Could not find `city_id` parameter"
        );
    }
}
