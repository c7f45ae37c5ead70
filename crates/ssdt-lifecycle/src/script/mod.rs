//! Deploy script post-processing.
//!
//! - [`batch`]: locating the `GO`-delimited batch enclosing a statement
//! - [`correlate`]: repairing drops of unnamed default constraints
//! - [`modifiers`]: the individual rewrites, keyed by [`ModifierPriority`]
//! - [`pipeline`]: [`ModifierPipeline`] applying them in order
//!
//! # Design
//!
//! Modifiers are pure text rewrites. The script is moved into each modifier
//! and the returned string becomes the input of the next one, so no two
//! modifiers ever observe the same buffer.

pub mod batch;
pub mod correlate;
pub mod modifiers;
pub mod pipeline;

pub use batch::{find_statement_batch, BatchMatch, BATCH_SEPARATOR};
pub use correlate::{correlate, dropped_unnamed_constraints, CorrelationOutcome, UNNAMED_DROP_STATEMENT};
pub use modifiers::{ModifierOutcome, ModifierPriority, ModifierRegistry, ScriptModifier};
pub use pipeline::{ModifierPipeline, ScriptModificationModel};
