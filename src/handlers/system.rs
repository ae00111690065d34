use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::handlers::AppState;

/// GET / - Service information
pub async fn root(State(state): State<AppState>) -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "IIoT Objects API",
            "version": version,
            "description": "Organization, unit, room and bed hierarchy",
            "environment": state.environment,
            "store": state.actions.service().backend(),
            "endpoints": {
                "home": "/",
                "health": "/health",
                "objects": "/api/objects[/:id] (list, create, get, update, delete)",
                "listings": "/api/objects/all, /api/objects/type/:type, /api/objects/types",
                "views": "/api/objects/tree, /api/objects/table, /api/objects/graph",
                "graph_actions": "/api/objects/graph/actions",
                "parent": "/api/objects/:id/parent (reparent, detach)",
                "events": "/api/objects/events (server-sent events)",
            }
        }
    }))
}

/// GET /health - Store health
pub async fn health(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let store = state.actions.service().backend();

    if let Err(e) = state.actions.service().health().await {
        tracing::error!("Health check failed on {} store: {}", store, e);
        return Err(ApiError::service_unavailable("Object store unavailable"));
    }

    Ok(Json(json!({
        "success": true,
        "data": {
            "status": "ok",
            "timestamp": chrono::Utc::now(),
            "store": store
        }
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn unavailable_store_is_a_503_envelope() {
        let err = ApiError::service_unavailable("Object store unavailable");
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.to_json()["error"], "SERVICE_UNAVAILABLE");
        assert_eq!(err.to_json()["success"], false);
    }
}
