use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;
use crate::handlers::AppState;
use crate::middleware::{respond, respond_created, ApiResult};
use crate::model::{CreateObjectInput, ObjectKind, ObjectNode, ObjectPatch};
use crate::query::{Page, TreeNode};
use crate::services::InteractionOutcome;
use crate::views::{GraphInteraction, GraphView, Selection, TableFilter, TableView};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct TableQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    /// Case-insensitive name filter
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub level: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct ReparentBody {
    pub parent_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct SelectionBody {
    pub ids: Vec<Uuid>,
}

fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::invalid_field("id", format!("Invalid object id '{}'", raw)))
}

fn parse_kind(raw: &str) -> Result<ObjectKind, ApiError> {
    raw.parse().map_err(|e: crate::model::UnknownObjectKind| ApiError::invalid_field("type", e.to_string()))
}

/// GET /api/objects - One page of objects in creation order
pub async fn list(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<Page<ObjectNode>> {
    let Query(query) = query?;
    respond(state.actions.list_objects(query.page, query.page_size).await)
}

/// GET /api/objects/all - Every object, unpaginated
pub async fn list_all(State(state): State<AppState>) -> ApiResult<Vec<ObjectNode>> {
    respond(state.actions.list_all_objects().await)
}

/// GET /api/objects/types - The fixed type enumeration for pick-lists
pub async fn types(State(state): State<AppState>) -> ApiResult<Vec<ObjectKind>> {
    respond(state.actions.object_types())
}

/// GET /api/objects/type/:type
pub async fn list_by_type(State(state): State<AppState>, Path(kind): Path<String>) -> ApiResult<Vec<ObjectNode>> {
    let kind = parse_kind(&kind)?;
    respond(state.actions.list_objects_by_type(kind).await)
}

/// GET /api/objects/tree - Forest projection
pub async fn tree(State(state): State<AppState>) -> ApiResult<Vec<TreeNode>> {
    respond(state.actions.forest().await)
}

/// GET /api/objects/table - Page rows with filter, badges and pagination state
pub async fn table(
    State(state): State<AppState>,
    query: Result<Query<TableQuery>, QueryRejection>,
) -> ApiResult<TableView> {
    let Query(query) = query?;
    let filter = TableFilter {
        name_contains: query.name,
        kind: query.kind.as_deref().map(parse_kind).transpose()?,
        level: query.level,
    };
    respond(state.actions.table(query.page, query.page_size, filter).await)
}

/// GET /api/objects/graph - Laid out graph, or the empty-state affordance
pub async fn graph(State(state): State<AppState>) -> ApiResult<GraphView> {
    respond(state.actions.graph().await)
}

/// POST /api/objects/graph/actions - Apply a graph gesture
pub async fn graph_action(
    State(state): State<AppState>,
    payload: Result<Json<GraphInteraction>, JsonRejection>,
) -> ApiResult<InteractionOutcome> {
    let Json(interaction) = payload?;
    respond(state.actions.dispatch(interaction).await)
}

/// POST /api/objects - Create an object
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<CreateObjectInput>, JsonRejection>,
) -> ApiResult<ObjectNode> {
    let Json(input) = payload?;
    respond_created(state.actions.create_object(input).await)
}

/// GET /api/objects/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<ObjectNode> {
    let id = parse_id(&id)?;
    respond(state.actions.get_object(id).await)
}

/// PATCH /api/objects/:id - Partial update; `null` clears nullable fields
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ObjectPatch>, JsonRejection>,
) -> ApiResult<ObjectNode> {
    let id = parse_id(&id)?;
    let Json(patch) = payload?;
    respond(state.actions.update_object(id, patch).await)
}

/// DELETE /api/objects/:id - Delete with all descendants
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Vec<Uuid>> {
    let id = parse_id(&id)?;
    respond(state.actions.delete_object(id).await)
}

/// POST /api/objects/delete - Delete a row selection
pub async fn delete_selection(
    State(state): State<AppState>,
    payload: Result<Json<SelectionBody>, JsonRejection>,
) -> ApiResult<Vec<Uuid>> {
    let Json(body) = payload?;
    if body.ids.is_empty() {
        return Err(ApiError::invalid_field("ids", "Select at least one object"));
    }
    let selection: Selection = body.ids.into_iter().collect();
    respond(state.actions.delete_selection(selection).await)
}

/// PUT /api/objects/:id/parent - Move under another object
pub async fn reparent(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ReparentBody>, JsonRejection>,
) -> ApiResult<ObjectNode> {
    let id = parse_id(&id)?;
    let Json(body) = payload?;
    respond(state.actions.reparent_object(id, body.parent_id).await)
}

/// DELETE /api/objects/:id/parent - Make the object a root
pub async fn detach(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<ObjectNode> {
    let id = parse_id(&id)?;
    respond(state.actions.detach_object(id).await)
}
