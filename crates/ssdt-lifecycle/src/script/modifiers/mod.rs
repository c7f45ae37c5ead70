//! Script modifiers applied to a generated deploy script.
//!
//! Every modifier is identified by its [`ModifierPriority`]; the registry is
//! keyed by that enum, so there is at most one modifier per priority and the
//! application order follows from the keys alone.

mod header_footer;
mod sqlcmd;
mod unnamed_drops;
mod version_tracking;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

pub use header_footer::{CustomFooterModifier, CustomHeaderModifier};
pub use sqlcmd::RemoveSqlCmdStatementsModifier;
pub use unnamed_drops::{CommentOutUnnamedDropsModifier, ReplaceUnnamedDropsModifier};
pub use version_tracking::TrackDacpacVersionModifier;

use super::pipeline::ScriptModificationModel;
use crate::config::Configuration;
use crate::dac::DacAccess;
use crate::error::Result;

/// Order key of a modifier; lower values run first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(i32)]
pub enum ModifierPriority {
    CommentOutUnnamedDefaultConstraintDrops = 100,
    ReplaceUnnamedDefaultConstraintDrops = 200,
    AddCustomHeader = 300,
    AddCustomFooter = 400,
    TrackDacpacVersion = 500,
    /// Always last, whatever is added later.
    RemoveSqlCmdStatements = i32::MAX,
}

impl ModifierPriority {
    pub const ALL: [ModifierPriority; 6] = [
        ModifierPriority::CommentOutUnnamedDefaultConstraintDrops,
        ModifierPriority::ReplaceUnnamedDefaultConstraintDrops,
        ModifierPriority::AddCustomHeader,
        ModifierPriority::AddCustomFooter,
        ModifierPriority::TrackDacpacVersion,
        ModifierPriority::RemoveSqlCmdStatements,
    ];

    pub fn value(self) -> i32 {
        self as i32
    }

    /// Whether `config` asks for this modifier.
    pub fn is_enabled(self, config: &Configuration) -> bool {
        match self {
            ModifierPriority::CommentOutUnnamedDefaultConstraintDrops => {
                config.comment_out_unnamed_default_constraint_drops
            }
            ModifierPriority::ReplaceUnnamedDefaultConstraintDrops => {
                config.replace_unnamed_default_constraint_drops
            }
            ModifierPriority::AddCustomHeader => !config.custom_header.trim().is_empty(),
            ModifierPriority::AddCustomFooter => !config.custom_footer.trim().is_empty(),
            ModifierPriority::TrackDacpacVersion => config.track_dacpac_version,
            ModifierPriority::RemoveSqlCmdStatements => true,
        }
    }

    /// Standard modifier for this priority.
    pub fn create(self, dac: &DacAccess) -> Arc<dyn ScriptModifier> {
        match self {
            ModifierPriority::CommentOutUnnamedDefaultConstraintDrops => {
                Arc::new(CommentOutUnnamedDropsModifier)
            }
            ModifierPriority::ReplaceUnnamedDefaultConstraintDrops => {
                Arc::new(ReplaceUnnamedDropsModifier::new(dac.clone()))
            }
            ModifierPriority::AddCustomHeader => Arc::new(CustomHeaderModifier),
            ModifierPriority::AddCustomFooter => Arc::new(CustomFooterModifier),
            ModifierPriority::TrackDacpacVersion => Arc::new(TrackDacpacVersionModifier),
            ModifierPriority::RemoveSqlCmdStatements => Arc::new(RemoveSqlCmdStatementsModifier),
        }
    }
}

/// Result of a single modifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModifierOutcome {
    Modified(String),
    /// The user cancelled; nothing must be written.
    Cancelled,
}

/// One text rewrite of the deploy script.
#[async_trait]
pub trait ScriptModifier: Send + Sync {
    fn priority(&self) -> ModifierPriority;

    /// Rewrite `script`. `model` holds the run's context; its
    /// `current_script` is not meaningful while the modifier runs.
    async fn modify(
        &self,
        script: String,
        model: &ScriptModificationModel,
        cancel: &CancellationToken,
    ) -> Result<ModifierOutcome>;
}

/// Modifiers keyed by priority.
#[derive(Clone, Default)]
pub struct ModifierRegistry {
    modifiers: HashMap<ModifierPriority, Arc<dyn ScriptModifier>>,
}

impl ModifierRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the standard modifier for every priority.
    pub fn standard(dac: &DacAccess) -> Self {
        ModifierPriority::ALL
            .into_iter()
            .fold(Self::new(), |registry, priority| {
                registry.with_modifier(priority.create(dac))
            })
    }

    /// Register `modifier`, replacing any with the same priority.
    pub fn with_modifier(mut self, modifier: Arc<dyn ScriptModifier>) -> Self {
        self.modifiers.insert(modifier.priority(), modifier);
        self
    }

    /// Modifiers enabled by `config`, in application order.
    pub fn select(&self, config: &Configuration) -> Vec<Arc<dyn ScriptModifier>> {
        let mut selected: Vec<_> = self
            .modifiers
            .iter()
            .filter(|(priority, _)| priority.is_enabled(config))
            .map(|(priority, modifier)| (*priority, modifier.clone()))
            .collect();
        selected.sort_by_key(|(priority, _)| *priority);
        selected.into_iter().map(|(_, modifier)| modifier).collect()
    }

    pub fn len(&self) -> usize {
        self.modifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modifiers.is_empty()
    }
}
