// Error-normalizing boundary. Every operation a caller can trigger comes back
// as an ActionResult; expected failures never surface as raw errors.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::model::{CreateObjectInput, ObjectKind, ObjectNode, ObjectPatch};
use crate::query::{Page, TreeNode};
use crate::services::error::ServiceError;
use crate::services::object_service::{InteractionOutcome, ObjectService};
use crate::views::{GraphInteraction, GraphView, Selection, TableFilter, TableView};

/// Message shown for failures whose details stay in the logs
pub const GENERIC_FAILURE: &str = "An unexpected error occurred";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    BusinessRule,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionError {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub field_errors: BTreeMap<String, String>,
}

impl ActionError {
    fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            field_errors: BTreeMap::new(),
        }
    }

    fn from_service(action: &str, err: ServiceError) -> Self {
        match err {
            ServiceError::Validation { message, field_errors } => Self {
                kind: ErrorKind::Validation,
                message,
                field_errors,
            },
            err @ (ServiceError::NotFound(_) | ServiceError::ParentNotFound(_)) => {
                Self::new(ErrorKind::NotFound, err.to_string())
            }
            ServiceError::BusinessRule(message) => Self::new(ErrorKind::BusinessRule, message),
            ServiceError::Internal(detail) => {
                tracing::error!("{} failed: {}", action, detail);
                Self::new(ErrorKind::Internal, GENERIC_FAILURE)
            }
        }
    }
}

/// Uniform result shape for every action
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ActionResult<T> {
    Success {
        data: T,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    Error {
        error: ActionError,
    },
}

impl<T> ActionResult<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, ActionResult::Success { .. })
    }

    pub fn into_result(self) -> Result<(T, Option<String>), ActionError> {
        match self {
            ActionResult::Success { data, message } => Ok((data, message)),
            ActionResult::Error { error } => Err(error),
        }
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            ActionResult::Success { data, .. } => Some(data),
            ActionResult::Error { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&ActionError> {
        match self {
            ActionResult::Success { .. } => None,
            ActionResult::Error { error } => Some(error),
        }
    }
}

async fn wrap<T, F>(action: &str, message: Option<String>, call: F) -> ActionResult<T>
where
    F: Future<Output = Result<T, ServiceError>>,
{
    match call.await {
        Ok(data) => ActionResult::Success { data, message },
        Err(err) => {
            tracing::debug!("{} rejected: {}", action, err);
            ActionResult::Error {
                error: ActionError::from_service(action, err),
            }
        }
    }
}

/// Actions offered to the dialogs, row buttons and graph controls
#[derive(Clone)]
pub struct ObjectActions {
    service: Arc<ObjectService>,
}

impl ObjectActions {
    pub fn new(service: Arc<ObjectService>) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &Arc<ObjectService> {
        &self.service
    }

    pub async fn create_object(&self, input: CreateObjectInput) -> ActionResult<ObjectNode> {
        wrap("create_object", Some("Object created".into()), self.service.create(input)).await
    }

    pub async fn update_object(&self, id: Uuid, patch: ObjectPatch) -> ActionResult<ObjectNode> {
        wrap("update_object", Some("Object updated".into()), self.service.update(id, patch)).await
    }

    pub async fn delete_object(&self, id: Uuid) -> ActionResult<Vec<Uuid>> {
        wrap("delete_object", Some("Object deleted".into()), self.service.delete(id)).await
    }

    pub async fn delete_selection(&self, selection: Selection) -> ActionResult<Vec<Uuid>> {
        let message = format!("{} selected object(s) deleted", selection.len());
        wrap("delete_selection", Some(message), async move {
            self.service.delete_selection(&selection).await
        })
        .await
    }

    pub async fn reparent_object(&self, id: Uuid, parent: Uuid) -> ActionResult<ObjectNode> {
        wrap("reparent_object", Some("Parent updated".into()), self.service.reparent(id, parent)).await
    }

    pub async fn detach_object(&self, id: Uuid) -> ActionResult<ObjectNode> {
        wrap("detach_object", Some("Connection removed".into()), self.service.detach(id)).await
    }

    pub async fn get_object(&self, id: Uuid) -> ActionResult<ObjectNode> {
        wrap("get_object", None, self.service.get(id)).await
    }

    pub async fn list_objects(&self, page: Option<u32>, page_size: Option<u32>) -> ActionResult<Page<ObjectNode>> {
        wrap("list_objects", None, self.service.list_page(page, page_size)).await
    }

    pub async fn list_all_objects(&self) -> ActionResult<Vec<ObjectNode>> {
        wrap("list_all_objects", None, self.service.list_all()).await
    }

    pub async fn list_objects_by_type(&self, kind: ObjectKind) -> ActionResult<Vec<ObjectNode>> {
        wrap("list_objects_by_type", None, self.service.list_by_kind(kind)).await
    }

    pub fn object_types(&self) -> ActionResult<Vec<ObjectKind>> {
        ActionResult::Success {
            data: ObjectKind::ALL.to_vec(),
            message: None,
        }
    }

    pub async fn table(
        &self,
        page: Option<u32>,
        page_size: Option<u32>,
        filter: TableFilter,
    ) -> ActionResult<TableView> {
        wrap("table", None, async move { self.service.table(page, page_size, &filter).await }).await
    }

    pub async fn forest(&self) -> ActionResult<Vec<TreeNode>> {
        wrap("forest", None, self.service.forest()).await
    }

    pub async fn graph(&self) -> ActionResult<GraphView> {
        wrap("graph", None, self.service.graph()).await
    }

    pub async fn dispatch(&self, interaction: GraphInteraction) -> ActionResult<InteractionOutcome> {
        wrap("dispatch", None, self.service.dispatch(interaction)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::store::MemoryStore;

    fn actions() -> ObjectActions {
        let service = ObjectService::new(Arc::new(MemoryStore::new()), &AppConfig::development());
        ObjectActions::new(Arc::new(service))
    }

    #[tokio::test]
    async fn not_found_is_an_error_result() {
        let result = actions().get_object(Uuid::new_v4()).await;
        assert_eq!(result.error().map(|e| e.kind), Some(ErrorKind::NotFound));
    }

    #[tokio::test]
    async fn validation_keeps_field_errors() {
        let result = actions()
            .create_object(CreateObjectInput::new(" ", ObjectKind::Unit, 1))
            .await;

        let error = result.error().cloned().unwrap();
        assert_eq!(error.kind, ErrorKind::Validation);
        assert!(error.field_errors.contains_key("name"));
    }

    #[test]
    fn internal_errors_hide_details() {
        let error = ActionError::from_service("graph", ServiceError::Internal("connection reset".into()));
        assert_eq!(error.message, GENERIC_FAILURE);
    }

    #[tokio::test]
    async fn success_serializes_with_state_tag() {
        let result = actions().object_types();
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["state"], "success");
        assert_eq!(value["data"][0], "Organization");
    }
}
