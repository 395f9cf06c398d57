//! Device endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use super::{parse_param, ApiState, CreatedResponse};
use crate::error::{AppError, AppResult};
use crate::models::{Device, DeviceDraft, Pagination};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDevicesQuery {
    pub page: Option<String>,
    pub page_size: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDevicesResponse {
    pub devices: Vec<Device>,
    pub page: i64,
    pub page_size: i64,
}

/// `POST /devices`: name, kind and apiKey are all required.
pub async fn create_device(
    State(state): State<ApiState>,
    Json(draft): Json<DeviceDraft>,
) -> AppResult<(StatusCode, Json<CreatedResponse<String>>)> {
    if draft.name.is_empty() || draft.kind.is_empty() || draft.api_key.is_empty() {
        return Err(AppError::validation("name, kind and apiKey are required"));
    }

    let id = state.devices.create_device(draft).await?;
    state.metrics.devices_created_total.inc();

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            message: "Device created successfully".to_string(),
            id,
            status: "success".to_string(),
        }),
    ))
}

/// `GET /devices?page=&pageSize=`: bad or missing values fall back to
/// page 1, size 10.
pub async fn list_devices(
    State(state): State<ApiState>,
    Query(params): Query<ListDevicesQuery>,
) -> AppResult<Json<ListDevicesResponse>> {
    let paging = Pagination::coerce(
        parse_param(params.page.as_deref()),
        parse_param(params.page_size.as_deref()),
    );

    let devices = state
        .devices
        .fetch_devices(paging.page, paging.page_size)
        .await?;

    Ok(Json(ListDevicesResponse {
        devices,
        page: paging.page,
        page_size: paging.page_size,
    }))
}

/// `GET /devices/:id`
pub async fn get_device(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> AppResult<Json<Device>> {
    let device = state.devices.find_device_by_id(&id).await?;
    Ok(Json(device))
}

/// `PATCH /devices/:id`: only non-empty `name` / `apiKey` are applied.
pub async fn update_device(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(draft): Json<DeviceDraft>,
) -> AppResult<Json<Device>> {
    let device = state.devices.update_device(&id, draft).await?;
    Ok(Json(device))
}

/// `DELETE /devices/:id`
pub async fn delete_device(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.devices.delete_device(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Method, Request, StatusCode},
        Router,
    };
    use tower::ServiceExt;

    use crate::api::test_support::{body_json, make_app};

    async fn create(app: &Router, body: &str) -> serde_json::Value {
        let req = Request::builder()
            .method(Method::POST)
            .uri("/devices")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let resp = app.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        body_json(resp.into_body()).await
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn post_creates_device_and_get_returns_it() {
        let (app, state) = make_app().await;
        let created = create(&app, r#"{"name":"T1","kind":"sensor-hub","apiKey":"k1"}"#).await;
        let id = created["id"].as_str().unwrap().to_string();
        assert_eq!(created["status"], "success");

        let resp = app.oneshot(get(&format!("/devices/{}", id))).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp.into_body()).await;
        assert_eq!(json["name"], "T1");
        assert_eq!(json["kind"], "sensor-hub");
        assert_eq!(json["apiKey"], "k1");
        assert!(json["createdAt"].is_string());
        assert!((state.metrics.devices_created_total.get() - 1.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn post_missing_kind_returns_400() {
        let (app, _) = make_app().await;
        let req = Request::builder()
            .method(Method::POST)
            .uri("/devices")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"name":"T1","apiKey":"k1"}"#))
            .unwrap();

        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn patch_with_only_name_keeps_api_key() {
        let (app, _) = make_app().await;
        let created = create(&app, r#"{"name":"T1","kind":"sensor-hub","apiKey":"k1"}"#).await;
        let id = created["id"].as_str().unwrap();

        let req = Request::builder()
            .method(Method::PATCH)
            .uri(format!("/devices/{}", id))
            .header("content-type", "application/json")
            .body(Body::from(r#"{"name":"Renamed","kind":"gateway"}"#))
            .unwrap();
        let resp = app.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp.into_body()).await;
        assert_eq!(json["name"], "Renamed");
        assert_eq!(json["apiKey"], "k1");
        assert_eq!(json["kind"], "sensor-hub");
    }

    #[tokio::test]
    async fn patch_response_matches_stored_device() {
        let (app, _) = make_app().await;
        let created = create(&app, r#"{"name":"T1","kind":"sensor-hub","apiKey":"k1"}"#).await;
        let uri = format!("/devices/{}", created["id"].as_str().unwrap());

        let req = Request::builder()
            .method(Method::PATCH)
            .uri(&uri)
            .header("content-type", "application/json")
            .body(Body::from(r#"{"apiKey":"k2"}"#))
            .unwrap();
        let resp = app.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let patched = body_json(resp.into_body()).await;

        let resp = app.oneshot(get(&uri)).await.unwrap();
        let fetched = body_json(resp.into_body()).await;
        assert_eq!(patched, fetched);
    }

    #[tokio::test]
    async fn patch_unknown_device_returns_404() {
        let (app, _) = make_app().await;
        let req = Request::builder()
            .method(Method::PATCH)
            .uri("/devices/does-not-exist")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"name":"x"}"#))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn list_coerces_invalid_paging_to_defaults() {
        let (app, _) = make_app().await;
        create(&app, r#"{"name":"T1","kind":"sensor-hub","apiKey":"k1"}"#).await;

        let resp = app
            .oneshot(get("/devices?page=abc&pageSize=-5"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp.into_body()).await;
        assert_eq!(json["page"], 1);
        assert_eq!(json["pageSize"], 10);
        assert_eq!(json["devices"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn list_past_the_end_is_empty_not_error() {
        let (app, _) = make_app().await;
        create(&app, r#"{"name":"T1","kind":"sensor-hub","apiKey":"k1"}"#).await;

        let resp = app.oneshot(get("/devices?page=7&pageSize=10")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp.into_body()).await;
        assert!(json["devices"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_then_get_returns_404() {
        let (app, _) = make_app().await;
        let created = create(&app, r#"{"name":"T1","kind":"sensor-hub","apiKey":"k1"}"#).await;
        let uri = format!("/devices/{}", created["id"].as_str().unwrap());

        let req = Request::builder()
            .method(Method::DELETE)
            .uri(&uri)
            .body(Body::empty())
            .unwrap();
        let resp = app.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let resp = app.oneshot(get(&uri)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
