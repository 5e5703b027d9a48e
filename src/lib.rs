//! Reconcile personal library-catalog exports and a daily reading log into
//! one reading history, and derive the tables the charts are drawn from:
//! the canonical catalog, a yearly summary, and a dense daily-progress log.
//!
//! The pipeline is a batch, full-recompute transform:
//! load → normalize (+ corrections) → derive → {aggregate, daily progress} → persist.

pub mod aggregation;
pub mod config;
pub mod corrections;
pub mod derivation;
pub mod error;
pub mod loader;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub mod schema;
pub mod sink;
pub mod views;

#[cfg(feature = "python")]
mod python;

pub use config::{OutputPaths, PipelineConfig, SourcePath};
pub use corrections::{Correction, Corrections};
pub use error::LedgerError;
pub use model::{Catalog, CatalogEntry, DailyProgress, ReadingStatus, SessionEvent, YearlySummary};
pub use normalize::{MissingField, QualityIssue, QualityReport};
pub use pipeline::{process, run, run_and_persist, PipelineOutput};
pub use sink::PersistReport;
