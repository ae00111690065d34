// HTTP handlers for the object hierarchy.
//
// Every object route funnels through ObjectActions so handlers only translate
// between HTTP and the uniform action result.

pub mod events;
pub mod objects;
pub mod system;

use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::{AppConfig, Environment};
use crate::services::{ObjectActions, ObjectService};
use crate::store::ObjectStore;

#[derive(Clone)]
pub struct AppState {
    pub actions: ObjectActions,
    pub environment: Environment,
    pub request_logging: bool,
}

impl AppState {
    pub fn new(store: Arc<dyn ObjectStore>, config: &AppConfig) -> Self {
        let service = ObjectService::new(store, config);
        Self {
            actions: ObjectActions::new(Arc::new(service)),
            environment: config.environment,
            request_logging: config.api.enable_request_logging,
        }
    }
}

pub fn router(state: AppState) -> Router {
    let app = Router::new()
        // Public
        .route("/", get(system::root))
        .route("/health", get(system::health))
        .merge(object_routes());

    // Global middleware
    let app = if state.request_logging {
        app.layer(TraceLayer::new_for_http())
    } else {
        app
    };

    app.layer(CorsLayer::permissive()).with_state(state)
}

fn object_routes() -> Router<AppState> {
    Router::new()
        // Collection and listings
        .route("/api/objects", get(objects::list).post(objects::create))
        .route("/api/objects/all", get(objects::list_all))
        .route("/api/objects/types", get(objects::types))
        .route("/api/objects/type/:kind", get(objects::list_by_type))
        .route("/api/objects/delete", post(objects::delete_selection))
        // Views
        .route("/api/objects/tree", get(objects::tree))
        .route("/api/objects/table", get(objects::table))
        .route("/api/objects/graph", get(objects::graph))
        .route("/api/objects/graph/actions", post(objects::graph_action))
        .route("/api/objects/events", get(events::stream))
        // Single object
        .route(
            "/api/objects/:id",
            get(objects::get).patch(objects::update).delete(objects::delete),
        )
        .route("/api/objects/:id/parent", put(objects::reparent).delete(objects::detach))
}
