// Ring 1: Input Validation - field checks, reported together
use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::model::MAX_DESCRIPTION_LEN;
use crate::observer::context::ObserverContext;
use crate::observer::error::ObserverError;
use crate::observer::traits::{Observer, ObserverRing, SyncObserver};
use crate::types::Operation;

#[derive(Default)]
pub struct InputValidationObserver;

impl Observer for InputValidationObserver {
    fn name(&self) -> &'static str {
        "InputValidationObserver"
    }

    fn ring(&self) -> ObserverRing {
        ObserverRing::InputValidation
    }

    fn applies_to_operation(&self, op: Operation) -> bool {
        matches!(op, Operation::Create | Operation::Update)
    }
}

#[async_trait]
impl SyncObserver for InputValidationObserver {
    async fn execute(&self, ctx: &mut ObserverContext) -> Result<(), ObserverError> {
        let mut field_errors = BTreeMap::new();

        if let Some(input) = ctx.create.as_mut() {
            input.name = input.name.trim().to_string();
            check_name(&input.name, &mut field_errors);
            check_description(input.description.as_deref(), &mut field_errors);
            check_level(input.level, &mut field_errors);
        }

        if let Some(patch) = ctx.patch.as_mut() {
            if patch.is_empty() {
                return Err(ObserverError::ValidationError {
                    message: "No fields to update".to_string(),
                    field_errors,
                });
            }
            if let Some(name) = patch.name.as_mut() {
                *name = name.trim().to_string();
                check_name(name, &mut field_errors);
            }
            if let Some(description) = &patch.description {
                check_description(description.as_deref(), &mut field_errors);
            }
            if let Some(level) = patch.level {
                check_level(level, &mut field_errors);
            }
        }

        if field_errors.is_empty() {
            return Ok(());
        }

        let message = if field_errors.len() == 1 {
            field_errors.values().next().cloned().unwrap_or_default()
        } else {
            format!("{} fields are invalid", field_errors.len())
        };
        Err(ObserverError::ValidationError { message, field_errors })
    }
}

fn check_name(name: &str, errors: &mut BTreeMap<String, String>) {
    if name.is_empty() {
        errors.insert("name".to_string(), "Name is required".to_string());
    }
}

fn check_description(description: Option<&str>, errors: &mut BTreeMap<String, String>) {
    if let Some(description) = description {
        if description.chars().count() > MAX_DESCRIPTION_LEN {
            errors.insert(
                "description".to_string(),
                format!("Description must be at most {} characters", MAX_DESCRIPTION_LEN),
            );
        }
    }
}

fn check_level(level: i32, errors: &mut BTreeMap<String, String>) {
    if level < 0 {
        errors.insert("level".to_string(), "Level must not be negative".to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CreateObjectInput, ObjectKind, ObjectPatch};
    use crate::store::{MemoryStore, ObjectStore};
    use std::sync::Arc;
    use uuid::Uuid;

    fn store() -> Arc<dyn ObjectStore> {
        Arc::new(MemoryStore::new())
    }

    #[tokio::test]
    async fn collects_every_field_error() {
        let input = CreateObjectInput::new("   ", ObjectKind::Room, -1).with_description("x".repeat(256));
        let mut ctx = ObserverContext::for_create(store(), input);

        let err = InputValidationObserver.execute(&mut ctx).await.unwrap_err();

        match err {
            ObserverError::ValidationError { field_errors, .. } => {
                let fields: Vec<&str> = field_errors.keys().map(String::as_str).collect();
                assert_eq!(fields, vec!["description", "level", "name"]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn trims_name_in_place() {
        let mut ctx = ObserverContext::for_create(store(), CreateObjectInput::new("  Ward 3 ", ObjectKind::Unit, 1));

        InputValidationObserver.execute(&mut ctx).await.unwrap();

        assert_eq!(ctx.create.map(|input| input.name), Some("Ward 3".to_string()));
    }

    #[tokio::test]
    async fn rejects_empty_patch() {
        let mut ctx = ObserverContext::for_update(store(), Uuid::new_v4(), ObjectPatch::default());
        assert!(matches!(
            InputValidationObserver.execute(&mut ctx).await,
            Err(ObserverError::ValidationError { .. })
        ));
    }
}
