mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;

use common::{app, create, id_of, send};

#[tokio::test]
async fn root_describes_service() -> Result<()> {
    let app = app();
    let (status, body) = send(&app, "GET", "/", None).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["store"], "memory", "unexpected root body: {}", body);
    Ok(())
}

#[tokio::test]
async fn health_reports_store() -> Result<()> {
    let app = app();
    let (status, body) = send(&app, "GET", "/health", None).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn create_then_get() -> Result<()> {
    let app = app();
    let plant = create(&app, "Plant North", "Organization", 0, None).await?;
    assert_eq!(plant["type"], "Organization");
    assert!(plant["parent_id"].is_null());

    let (status, body) = send(&app, "GET", &format!("/api/objects/{}", id_of(&plant)), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Plant North");
    Ok(())
}

#[tokio::test]
async fn create_returns_message() -> Result<()> {
    let app = app();
    let (status, body) = send(
        &app,
        "POST",
        "/api/objects",
        Some(json!({ "name": "Plant", "type": "Organization", "level": 0 })),
    )
    .await?;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Object created");
    Ok(())
}

#[tokio::test]
async fn listing_is_paginated_in_creation_order() -> Result<()> {
    let app = app();
    for name in ["First", "Second", "Third"] {
        create(&app, name, "Organization", 0, None).await?;
    }

    let (status, body) = send(&app, "GET", "/api/objects?page=2&page_size=2", None).await?;
    assert_eq!(status, StatusCode::OK);

    let page = &body["data"];
    assert_eq!(page["total"], 3);
    assert_eq!(page["page_count"], 2);
    assert_eq!(page["items"].as_array().map(Vec::len), Some(1));
    assert_eq!(page["items"][0]["name"], "Third");
    Ok(())
}

#[tokio::test]
async fn page_zero_is_rejected() -> Result<()> {
    let app = app();
    let (status, body) = send(&app, "GET", "/api/objects?page=0", None).await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION_ERROR");
    assert!(body["field_errors"]["page"].is_string(), "missing page field error: {}", body);
    Ok(())
}

#[tokio::test]
async fn full_listing_and_types() -> Result<()> {
    let app = app();
    let plant = create(&app, "Plant", "Organization", 0, None).await?;
    create(&app, "Line 1", "Unit", 1, Some(&id_of(&plant))).await?;
    create(&app, "Line 2", "Unit", 1, Some(&id_of(&plant))).await?;

    let (_, all) = send(&app, "GET", "/api/objects/all", None).await?;
    assert_eq!(all["data"].as_array().map(Vec::len), Some(3));

    let (_, types) = send(&app, "GET", "/api/objects/types", None).await?;
    assert_eq!(types["data"], json!(["Organization", "Unit", "Room", "Bed"]));

    let (status, units) = send(&app, "GET", "/api/objects/type/Unit", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(units["data"].as_array().map(Vec::len), Some(2));
    Ok(())
}

#[tokio::test]
async fn unknown_type_is_a_validation_error() -> Result<()> {
    let app = app();
    let (status, body) = send(&app, "GET", "/api/objects/type/Gateway", None).await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"]["type"].is_string());
    Ok(())
}

#[tokio::test]
async fn missing_and_malformed_ids() -> Result<()> {
    let app = app();

    let (status, body) = send(&app, "GET", &format!("/api/objects/{}", uuid::Uuid::new_v4()), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NOT_FOUND");

    let (status, body) = send(&app, "GET", "/api/objects/not-an-id", None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"]["id"].is_string());
    Ok(())
}

#[tokio::test]
async fn malformed_body_is_a_validation_error() -> Result<()> {
    let app = app();
    let (status, body) = send(&app, "POST", "/api/objects", Some(json!({ "name": "No type" }))).await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "VALIDATION_ERROR");
    Ok(())
}

#[tokio::test]
async fn patch_updates_and_clears_fields() -> Result<()> {
    let app = app();
    let plant = create(&app, "Plant", "Organization", 0, None).await?;
    let uri = format!("/api/objects/{}", id_of(&plant));

    let (status, body) = send(
        &app,
        "PATCH",
        &uri,
        Some(json!({ "name": "Plant South", "description": "Main site" })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Plant South");
    assert_eq!(body["data"]["description"], "Main site");

    let (_, body) = send(&app, "PATCH", &uri, Some(json!({ "description": null }))).await?;
    assert!(body["data"]["description"].is_null());
    assert_eq!(body["data"]["name"], "Plant South");
    Ok(())
}

#[tokio::test]
async fn delete_cascades_to_descendants() -> Result<()> {
    let app = app();
    let plant = create(&app, "Plant", "Organization", 0, None).await?;
    let line = create(&app, "Line", "Unit", 1, Some(&id_of(&plant))).await?;
    let room = create(&app, "Room 4", "Room", 2, Some(&id_of(&line))).await?;
    let other = create(&app, "Other", "Organization", 0, None).await?;

    let (status, body) = send(&app, "DELETE", &format!("/api/objects/{}", id_of(&plant)), None).await?;
    assert_eq!(status, StatusCode::OK);

    let removed = body["data"].as_array().cloned().unwrap_or_default();
    assert_eq!(removed.len(), 3);
    assert_eq!(removed[0], plant["id"]);
    assert!(removed.contains(&room["id"]));

    let (_, all) = send(&app, "GET", "/api/objects/all", None).await?;
    assert_eq!(all["data"].as_array().map(Vec::len), Some(1));
    assert_eq!(all["data"][0]["id"], other["id"]);
    Ok(())
}

#[tokio::test]
async fn tree_nests_children() -> Result<()> {
    let app = app();
    let plant = create(&app, "Plant", "Organization", 0, None).await?;
    create(&app, "Line", "Unit", 1, Some(&id_of(&plant))).await?;

    let (status, body) = send(&app, "GET", "/api/objects/tree", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["data"][0]["name"], "Plant");
    assert_eq!(body["data"][0]["children"][0]["name"], "Line");
    Ok(())
}

#[tokio::test]
async fn events_endpoint_streams() -> Result<()> {
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    let app = app();
    let response = app
        .oneshot(Request::builder().uri("/api/objects/events").body(Body::empty())?)
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(content_type.starts_with("text/event-stream"), "content-type was {}", content_type);
    Ok(())
}

#[tokio::test]
async fn event_stream_delivers_and_releases_subscription() -> Result<()> {
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::Request;
    use futures::StreamExt;
    use iiot_objects_api::config::AppConfig;
    use iiot_objects_api::handlers::router;
    use tower::ServiceExt;

    let state = common::state(AppConfig::development());
    let bus = state.actions.service().bus().clone();
    let app = router(state);
    let baseline = bus.listener_count();

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/api/objects/events").body(Body::empty())?)
        .await?;
    assert_eq!(bus.listener_count(), baseline + 1);

    create(&app, "Plant", "Organization", 0, None).await?;

    let mut body = response.into_body().into_data_stream();
    let mut text = String::new();
    while !text.contains("event: object_created") {
        let chunk = tokio::time::timeout(Duration::from_secs(5), body.next())
            .await?
            .ok_or_else(|| anyhow::anyhow!("event stream ended early"))??;
        text.push_str(&String::from_utf8_lossy(&chunk));
    }
    assert!(text.contains("Plant"), "frame was {}", text);

    drop(body);
    assert_eq!(bus.listener_count(), baseline);
    Ok(())
}

#[tokio::test]
async fn type_is_accepted_in_any_case() -> Result<()> {
    let app = app();
    let room = create(&app, "Room 12", "room", 2, None).await?;
    assert_eq!(room["type"], "Room");
    Ok(())
}

#[tokio::test]
async fn tree_rejects_nesting_beyond_limit() -> Result<()> {
    use iiot_objects_api::query::MAX_NESTED_DEPTH;

    let app = app();
    let mut parent: Option<String> = None;
    for level in 0..=MAX_NESTED_DEPTH as i32 {
        let node = create(&app, &format!("N{}", level), "Unit", level, parent.as_deref()).await?;
        parent = Some(id_of(&node));
    }

    let (status, body) = send(&app, "GET", "/api/objects/tree", None).await?;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "unexpected body: {}", body);

    let (status, body) = send(&app, "GET", "/api/objects/graph", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["nodes"].as_array().map(Vec::len), Some(MAX_NESTED_DEPTH + 1));
    Ok(())
}
