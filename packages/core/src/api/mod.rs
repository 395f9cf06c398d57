//! HTTP boundary: decodes requests, applies boundary-side defaults and
//! validation, calls the services and maps results to responses.
//!
//! Routes:
//! - `POST /devices`: register a device
//! - `GET /devices`: page through devices
//! - `GET /devices/:id`: fetch one device
//! - `PATCH /devices/:id` (and `PUT`): selective update of name / apiKey
//! - `DELETE /devices/:id`: remove a device
//! - `GET /devices/:id/sensor-data`: all readings for a device
//! - `POST /sensor-data`: record a reading
//! - `GET /sensor-data`: page through readings
//! - `GET /sensor-data/:id`: fetch one reading
//! - `DELETE /sensor-data/:id`: remove a reading
//! - `GET /metrics`, `GET /health`

pub mod devices;
pub mod sensor_data;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Serialize;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::metrics::{track_http, AppMetrics};
use crate::services::{DeviceService, SensorReadingService};

/// Everything the handlers need, built once in `main`.
pub struct AppState {
    pub devices: DeviceService,
    pub readings: SensorReadingService,
    pub metrics: Arc<AppMetrics>,
}

/// Shared state type for all routes.
pub type ApiState = Arc<AppState>;

/// `{message, id, status}` body returned by the create endpoints.
#[derive(Debug, Serialize)]
pub struct CreatedResponse<T: Serialize> {
    pub message: String,
    pub id: T,
    pub status: String,
}

/// Assemble the complete router. Requests running longer than
/// `request_timeout` are aborted with 408; dropping the handler future
/// cancels any store call still in flight.
pub fn create_router(state: ApiState, request_timeout: Duration) -> Router {
    Router::new()
        .route(
            "/devices",
            get(devices::list_devices).post(devices::create_device),
        )
        .route(
            "/devices/:id",
            get(devices::get_device)
                .patch(devices::update_device)
                .put(devices::update_device)
                .delete(devices::delete_device),
        )
        .route(
            "/devices/:id/sensor-data",
            get(sensor_data::list_readings_for_device),
        )
        .route(
            "/sensor-data",
            get(sensor_data::list_readings).post(sensor_data::create_reading),
        )
        .route(
            "/sensor-data/:id",
            get(sensor_data::get_reading).delete(sensor_data::delete_reading),
        )
        .route("/metrics", get(render_metrics))
        .route_layer(middleware::from_fn_with_state(
            state.metrics.clone(),
            track_http,
        ))
        .route("/health", get(health))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Resolve when `signal` fires. If the signal cannot be installed the
/// server keeps running instead of shutting down immediately.
pub async fn shutdown_on<F, E>(signal: F)
where
    F: Future<Output = Result<(), E>>,
    E: std::fmt::Display,
{
    match signal.await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(err) => {
            tracing::error!("Failed to listen for shutdown signal: {}", err);
            std::future::pending::<()>().await;
        }
    }
}

pub async fn health() -> impl IntoResponse {
    ([(header::CACHE_CONTROL, "no-store")], "ok")
}

async fn render_metrics(State(state): State<ApiState>) -> Response {
    match state.metrics.render() {
        Ok(body) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(err) => {
            tracing::error!("Failed to render metrics: {}", err);
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics error").into_response()
        }
    }
}

/// Parse an optional numeric query parameter; garbage reads as absent.
fn parse_param(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|value| value.trim().parse::<i64>().ok())
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    use axum::body::Body;
    use http_body_util::BodyExt;

    use crate::db::create_pool;
    use crate::repository::{SqliteDeviceRepository, SqliteSensorReadingRepository};

    /// Full router over a fresh in-memory database.
    pub async fn make_app() -> (Router, ApiState) {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        let device_repo = SqliteDeviceRepository::connect(pool.clone()).await.unwrap();
        let reading_repo = SqliteSensorReadingRepository::connect(pool).await.unwrap();

        let state = Arc::new(AppState {
            devices: DeviceService::new(Arc::new(device_repo)),
            readings: SensorReadingService::new(Arc::new(reading_repo)),
            metrics: Arc::new(AppMetrics::new().unwrap()),
        });

        (create_router(state.clone(), Duration::from_secs(5)), state)
    }

    pub async fn body_json(body: Body) -> serde_json::Value {
        let bytes = body.collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::test_support::make_app;

    #[test]
    fn parse_param_treats_garbage_as_absent() {
        assert_eq!(parse_param(Some("3")), Some(3));
        assert_eq!(parse_param(Some("abc")), None);
        assert_eq!(parse_param(None), None);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_signal_listener_never_triggers_shutdown() {
        let failing = async { Err::<(), _>("no signal handler") };
        let waited = tokio::time::timeout(Duration::from_secs(60), shutdown_on(failing)).await;
        assert!(waited.is_err());
    }

    #[tokio::test]
    async fn delivered_signal_triggers_shutdown() {
        let fired = async { Ok::<(), std::io::Error>(()) };
        let waited = tokio::time::timeout(Duration::from_secs(1), shutdown_on(fired)).await;
        assert!(waited.is_ok());
    }

    #[tokio::test]
    async fn health_returns_ok() {
        let (app, _) = make_app().await;
        let resp = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"ok");
    }

    #[tokio::test]
    async fn metrics_endpoint_is_prometheus_text() {
        let (app, _) = make_app().await;
        let resp = app
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let ct = resp.headers().get("content-type").unwrap().to_str().unwrap();
        assert_eq!(ct, "text/plain; version=0.0.4");
    }
}
