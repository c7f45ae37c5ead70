//! Handling of `DROP CONSTRAINT ;` statements for unnamed default constraints.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::{ModifierOutcome, ModifierPriority, ScriptModifier};
use crate::dac::DacAccess;
use crate::error::{LifecycleError, Result};
use crate::script::batch::rewrite_batches;
use crate::script::correlate::{correlate, dropped_unnamed_constraints, UNNAMED_DROP_STATEMENT};
use crate::script::pipeline::ScriptModificationModel;

fn comment_out(batch: &str) -> String {
    batch
        .split_inclusive('\n')
        .map(|line| {
            if line.trim().is_empty() {
                line.to_string()
            } else {
                format!("-- {}", line)
            }
        })
        .collect()
}

/// Comments out every batch that drops an unnamed default constraint.
pub struct CommentOutUnnamedDropsModifier;

#[async_trait]
impl ScriptModifier for CommentOutUnnamedDropsModifier {
    fn priority(&self) -> ModifierPriority {
        ModifierPriority::CommentOutUnnamedDefaultConstraintDrops
    }

    async fn modify(
        &self,
        script: String,
        _model: &ScriptModificationModel,
        _cancel: &CancellationToken,
    ) -> Result<ModifierOutcome> {
        let (modified, count) = rewrite_batches(&script, UNNAMED_DROP_STATEMENT, comment_out);
        if count > 0 {
            info!("Commented out {} unnamed default constraint drop batch(es)", count);
        }
        Ok(ModifierOutcome::Modified(modified))
    }
}

/// Replaces unnamed default constraint drops with catalog lookups.
pub struct ReplaceUnnamedDropsModifier {
    dac: DacAccess,
}

impl ReplaceUnnamedDropsModifier {
    pub fn new(dac: DacAccess) -> Self {
        Self { dac }
    }
}

#[async_trait]
impl ScriptModifier for ReplaceUnnamedDropsModifier {
    fn priority(&self) -> ModifierPriority {
        ModifierPriority::ReplaceUnnamedDefaultConstraintDrops
    }

    async fn modify(
        &self,
        script: String,
        model: &ScriptModificationModel,
        cancel: &CancellationToken,
    ) -> Result<ModifierOutcome> {
        if !script.contains(UNNAMED_DROP_STATEMENT) {
            return Ok(ModifierOutcome::Modified(script));
        }
        let Some(previous_dacpac_path) = model.paths.deploy_sources.previous_dacpac_path.as_deref()
        else {
            warn!("No previous dacpac; unnamed default constraint drops are kept");
            return Ok(ModifierOutcome::Modified(script));
        };

        let loaded = async {
            let old = self.dac.get_default_constraints(previous_dacpac_path).await?;
            let new = self
                .dac
                .get_default_constraints(&model.paths.deploy_sources.new_dacpac_path)
                .await?;
            Ok::<_, LifecycleError>((old, new))
        }
        .await;

        let (old, new) = match loaded {
            Ok(constraints) => constraints,
            Err(LifecycleError::Cancelled) => return Ok(ModifierOutcome::Cancelled),
            Err(e) => return Err(e),
        };
        if cancel.is_cancelled() {
            return Ok(ModifierOutcome::Cancelled);
        }

        let candidates = dropped_unnamed_constraints(&old, &new);
        let outcome = correlate(&script, &candidates);
        info!(
            "Replaced {} unnamed default constraint drop(s)",
            outcome.replaced
        );
        Ok(ModifierOutcome::Modified(outcome.script))
    }
}
