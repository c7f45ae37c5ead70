//! Schema diff access.
//!
//! - [`engine`]: the [`SchemaCompareEngine`] seam
//! - [`sqlpackage`]: engine implementation running SqlPackage
//! - [`dacpac`]: dacpac archive and model reading
//! - [`access`]: [`DacAccess`], the front used by the pipeline

pub mod access;
pub mod dacpac;
pub mod engine;
pub mod profile;
pub mod report;
pub mod sqlpackage;

pub use access::{DacAccess, DeployFiles};
pub use engine::{CompareRequest, EngineError, EngineOutput, SchemaCompareEngine};
pub use sqlpackage::SqlPackageEngine;
