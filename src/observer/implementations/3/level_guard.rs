// Ring 3: Business - a child must sit deeper than its parent
use async_trait::async_trait;

use crate::observer::context::ObserverContext;
use crate::observer::error::ObserverError;
use crate::observer::traits::{Observer, ObserverRing, SyncObserver};
use crate::types::Operation;

pub struct LevelGuard {
    enforce_on_update: bool,
}

impl LevelGuard {
    pub fn new(enforce_on_update: bool) -> Self {
        Self { enforce_on_update }
    }
}

impl Default for LevelGuard {
    fn default() -> Self {
        Self::new(false)
    }
}

impl Observer for LevelGuard {
    fn name(&self) -> &'static str {
        "LevelGuard"
    }

    fn ring(&self) -> ObserverRing {
        ObserverRing::Business
    }

    fn applies_to_operation(&self, op: Operation) -> bool {
        match op {
            Operation::Create => true,
            Operation::Update => self.enforce_on_update,
            Operation::Delete => false,
        }
    }
}

#[async_trait]
impl SyncObserver for LevelGuard {
    async fn execute(&self, ctx: &mut ObserverContext) -> Result<(), ObserverError> {
        // Updates are only checked when they touch level or parent
        if ctx.operation == Operation::Update {
            let touches_level = ctx.patch.as_ref().is_some_and(|patch| patch.level.is_some());
            if !touches_level && !ctx.parent_changed() {
                return Ok(());
            }
        }

        let (Some(parent), Some(level)) = (ctx.parent.as_ref(), ctx.effective_level()) else {
            return Ok(());
        };

        if level <= parent.level {
            return Err(ObserverError::business(format!(
                "Level must be greater than the parent level ({})",
                parent.level
            )));
        }
        Ok(())
    }
}
