#![allow(dead_code)]

use std::sync::Arc;

use anyhow::Result;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use iiot_objects_api::config::AppConfig;
use iiot_objects_api::handlers::{router, AppState};
use iiot_objects_api::store::MemoryStore;

/// Router over a fresh in-memory store with development defaults
pub fn app() -> Router {
    app_with(AppConfig::development())
}

pub fn app_with(config: AppConfig) -> Router {
    router(state(config))
}

/// Application state over a fresh in-memory store, for tests that inspect the bus
pub fn state(config: AppConfig) -> AppState {
    AppState::new(Arc::new(MemoryStore::new()), &config)
}

/// Send one request through the router and decode the JSON body
pub async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> Result<(StatusCode, Value)> {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body)?))?,
        None => builder.body(Body::empty())?,
    };

    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };

    Ok((status, json))
}

/// Create an object and return its `data` payload
pub async fn create(app: &Router, name: &str, kind: &str, level: i32, parent_id: Option<&str>) -> Result<Value> {
    let (status, body) = send(
        app,
        "POST",
        "/api/objects",
        Some(json!({
            "name": name,
            "type": kind,
            "level": level,
            "parent_id": parent_id,
        })),
    )
    .await?;

    anyhow::ensure!(status == StatusCode::CREATED, "create {} failed with {}: {}", name, status, body);
    Ok(body["data"].clone())
}

pub fn id_of(object: &Value) -> String {
    object["id"].as_str().unwrap_or_default().to_string()
}
