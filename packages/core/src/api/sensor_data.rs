//! Sensor reading endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ApiState, CreatedResponse};
use crate::error::{AppError, AppResult};
use crate::models::{
    check_storable, ReadingDraft, SensorReading, DEFAULT_PAGE, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReadingRequest {
    #[serde(default)]
    pub device_id: String,
    #[serde(default)]
    pub metric_name: String,
    pub metric_value: Option<f64>,
    /// Capture time; defaults to the moment the request arrived.
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListReadingsQuery {
    pub page: Option<String>,
    pub page_size: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListReadingsResponse {
    pub sensor_data: Vec<SensorReading>,
    pub page: i64,
    pub page_size: i64,
}

#[derive(Debug, Serialize)]
pub struct DeleteReadingResponse {
    pub message: String,
    pub status: String,
}

/// Boundary validation for a new reading. A missing or non-positive
/// metric value is rejected here even though the store would accept zero,
/// as is a capture time outside the storable year range.
pub fn reading_draft_from_request(
    request: CreateReadingRequest,
    arrived_at: DateTime<Utc>,
) -> AppResult<ReadingDraft> {
    let metric_value = request
        .metric_value
        .filter(|v| v.is_finite() && *v > 0.0);

    match metric_value {
        Some(metric_value)
            if !request.device_id.is_empty() && !request.metric_name.is_empty() =>
        {
            let captured_at = request.timestamp.unwrap_or(arrived_at);
            check_storable(&captured_at)?;

            Ok(ReadingDraft {
                device_id: request.device_id,
                metric_name: request.metric_name,
                metric_value,
                captured_at,
            })
        }
        _ => Err(AppError::validation(
            "deviceId, metricName and a positive metricValue are required",
        )),
    }
}

/// Absent → `default`; present but not a positive integer → 400.
fn strict_param(raw: Option<&str>, default: i64, name: &str) -> AppResult<i64> {
    match raw.map(str::trim) {
        None | Some("") => Ok(default),
        Some(value) => value
            .parse::<i64>()
            .ok()
            .filter(|v| *v >= 1)
            .ok_or_else(|| AppError::validation(format!("invalid {}: {}", name, value))),
    }
}

/// `POST /sensor-data`
pub async fn create_reading(
    State(state): State<ApiState>,
    Json(request): Json<CreateReadingRequest>,
) -> AppResult<(StatusCode, Json<CreatedResponse<i64>>)> {
    let draft = reading_draft_from_request(request, Utc::now())?;

    let id = state.readings.create_reading(draft).await?;
    state.metrics.readings_created_total.inc();

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            message: "Sensor data created successfully".to_string(),
            id,
            status: "success".to_string(),
        }),
    ))
}

/// `GET /sensor-data?page=&pageSize=`: an empty page is 404.
pub async fn list_readings(
    State(state): State<ApiState>,
    Query(params): Query<ListReadingsQuery>,
) -> AppResult<Json<ListReadingsResponse>> {
    let page = strict_param(params.page.as_deref(), DEFAULT_PAGE, "page number")?;
    let page_size =
        strict_param(params.page_size.as_deref(), DEFAULT_PAGE_SIZE, "page size")?.min(MAX_PAGE_SIZE);

    let sensor_data = state.readings.fetch_readings(page, page_size).await?;
    tracing::debug!(
        "Fetched {} sensor data records for page {} with page size {}",
        sensor_data.len(),
        page,
        page_size
    );

    Ok(Json(ListReadingsResponse {
        sensor_data,
        page,
        page_size,
    }))
}

/// `GET /sensor-data/:id`
pub async fn get_reading(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> AppResult<Json<SensorReading>> {
    let reading = state.readings.find_reading_by_id(id).await?;
    Ok(Json(reading))
}

/// `GET /devices/:id/sensor-data`: 404 both for an unknown device and for
/// a device with no readings.
pub async fn list_readings_for_device(
    State(state): State<ApiState>,
    Path(device_id): Path<String>,
) -> AppResult<Json<ListReadingsResponse>> {
    let sensor_data = state.readings.find_readings_by_device(&device_id).await?;
    let page_size = sensor_data.len() as i64;

    Ok(Json(ListReadingsResponse {
        sensor_data,
        page: 1,
        page_size,
    }))
}

/// `DELETE /sensor-data/:id`
pub async fn delete_reading(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> AppResult<Json<DeleteReadingResponse>> {
    state.readings.delete_reading(id).await?;

    Ok(Json(DeleteReadingResponse {
        message: "Sensor data deleted successfully".to_string(),
        status: "success".to_string(),
    }))
}
