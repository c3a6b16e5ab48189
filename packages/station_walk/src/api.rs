//! HTTP surface of the service. Handlers convert the raw query string into a
//! validated config, hand it to the planner or catalog, and wrap the outcome
//! in the JSON envelope expected by the frontend.

use std::sync::Arc;
use std::time::Duration;

use axum::BoxError;
use axum::error_handling::HandleErrorLayer;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use serde_json::json;
use tower::ServiceBuilder;
use tower::timeout::TimeoutLayer;
use tower::timeout::error::Elapsed;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::common::config::{
    PathsConfig, RouteConfig, RoutingSettings, UserPathsConfig, UserRouteConfig,
};
use crate::common::error::{InputError, RoutingFailure};
use crate::loading::overpass::GeoDataSource;
use crate::routing::catalog::catalog_paths;
use crate::routing::planner::plan_route;

/// Shared by every request. Only read from, each request builds its own
/// graph
pub struct AppState<S> {
    pub source: Arc<S>,
    pub settings: Arc<RoutingSettings>,
}

impl<S> AppState<S> {
    pub fn new(source: S, settings: RoutingSettings) -> AppState<S> {
        AppState {
            source: Arc::new(source),
            settings: Arc::new(settings),
        }
    }
}

// Derived Clone would require S: Clone
impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        AppState {
            source: Arc::clone(&self.source),
            settings: Arc::clone(&self.settings),
        }
    }
}

/// Wraps a successful response body with its status
#[derive(Serialize)]
struct Success<T> {
    status: &'static str,
    #[serde(flatten)]
    body: T,
}

impl<T> Success<T> {
    fn new(body: T) -> Success<T> {
        Success {
            status: "success",
            body,
        }
    }
}

impl RoutingFailure {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RoutingFailure::Input(_) => StatusCode::BAD_REQUEST,
            RoutingFailure::Fetch(_) => StatusCode::BAD_GATEWAY,
            RoutingFailure::NoPedestrianData { .. }
            | RoutingFailure::EmptyGraph { .. }
            | RoutingFailure::OriginUnresolved { .. }
            | RoutingFailure::DestinationUnresolved { .. }
            | RoutingFailure::Unreachable { .. } => StatusCode::NOT_FOUND,
            RoutingFailure::TimedOut { .. } => StatusCode::REQUEST_TIMEOUT,
            RoutingFailure::Service(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RoutingFailure {
    fn into_response(self) -> Response {
        warn!(error = %self, "Request failed");

        let body = json!({
            "status": "error",
            "message": self.to_string(),
            "debug": self.debug_context(),
        });

        (self.status_code(), Json(body)).into_response()
    }
}

fn query_error(rejection: QueryRejection) -> RoutingFailure {
    InputError::InvalidQuery(rejection.body_text()).into()
}

/// Convert an error raised by the middleware stack into a failure, so that it
/// is reported in the same envelope as any other
fn middleware_failure(err: BoxError, request_timeout: Duration) -> RoutingFailure {
    if err.is::<Elapsed>() {
        RoutingFailure::TimedOut {
            timeout_secs: request_timeout.as_secs_f64(),
        }
    } else {
        RoutingFailure::Service(err.to_string())
    }
}

async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "success",
        "message": "Station walk routing is running",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn get_navigation<S: GeoDataSource + 'static>(
    State(state): State<AppState<S>>,
    query: Result<Query<UserRouteConfig>, QueryRejection>,
) -> Result<impl IntoResponse, RoutingFailure> {
    let Query(query) = query.map_err(query_error)?;
    let config = RouteConfig::try_from(query)?;

    let result = plan_route(state.source.as_ref(), &config, &state.settings).await?;

    Ok(Json(Success::new(result)))
}

async fn get_paths<S: GeoDataSource + 'static>(
    State(state): State<AppState<S>>,
    query: Result<Query<UserPathsConfig>, QueryRejection>,
) -> Result<impl IntoResponse, RoutingFailure> {
    let Query(query) = query.map_err(query_error)?;
    let config = PathsConfig::try_from(query)?;

    let catalog = catalog_paths(state.source.as_ref(), &config).await?;

    Ok(Json(Success::new(catalog)))
}

/// Build the router for the service. Every request is traced, and abandoned
/// once request_timeout has elapsed
pub fn build_router<S: GeoDataSource + 'static>(
    state: AppState<S>,
    request_timeout: Duration,
) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(health_check))
        .route("/healthcheck", get(health_check))
        .route("/api/navigation", get(get_navigation::<S>))
        .route("/api/paths", get(get_paths::<S>))
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(move |err: BoxError| async move {
                    middleware_failure(err, request_timeout)
                }))
                .layer(TimeoutLayer::new(request_timeout)),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
