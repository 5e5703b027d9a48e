use polars::prelude::DataFrame;
use tracing::{info, warn};

use crate::aggregation::aggregate;
use crate::config::PipelineConfig;
use crate::corrections::Corrections;
use crate::derivation::{build_daily_progress, derive, parse_sessions};
use crate::error::LedgerError;
use crate::loader::{load_sources, RawTables};
use crate::model::{catalog_frame, daily_frame, yearly_frame, Catalog, DailyProgress, YearlySummary};
use crate::normalize::{normalize, Normalized, QualityReport};
use crate::sink::{persist, PersistReport};
use crate::views;

/// Everything one run derives, held in memory until it is persisted.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub catalog: Catalog,
    pub report: QualityReport,
    pub yearly: Vec<YearlySummary>,
    pub daily: Vec<DailyProgress>,
}

/// Load every configured source and run the full transform. Nothing is written.
pub fn run(config: &PipelineConfig) -> Result<PipelineOutput, LedgerError> {
    let raw = load_sources(config)?;
    let corrections = match &config.corrections {
        Some(path) => Corrections::load(path)?,
        None => Corrections::default(),
    };
    process(&raw, &corrections)
}

/// Run, then write every output table. Fatal errors return before any write.
pub fn run_and_persist(
    config: &PipelineConfig,
    with_views: bool,
) -> Result<(PipelineOutput, PersistReport), LedgerError> {
    let output = run(config)?;
    let report = persist(&output, &config.outputs, with_views);
    Ok((output, report))
}

/// Normalize → derive → {aggregate, daily progress} over already-loaded tables.
pub fn process(raw: &RawTables, corrections: &Corrections) -> Result<PipelineOutput, LedgerError> {
    let Normalized {
        mut catalog,
        report,
    } = normalize(&raw.catalog_raw, corrections)?;
    if catalog.is_empty() {
        warn!("no catalog rows loaded; every session will be unmatched");
    }
    report.log();

    derive(&mut catalog);

    let sessions = parse_sessions(&raw.sessions_raw)?;
    let daily = build_daily_progress(&catalog, &sessions);
    let yearly = aggregate(&catalog);

    info!(
        catalog = catalog.len(),
        years = yearly.len(),
        daily = daily.len(),
        "pipeline complete"
    );
    Ok(PipelineOutput {
        catalog,
        report,
        yearly,
        daily,
    })
}

impl PipelineOutput {
    pub fn catalog_frame(&self) -> Result<DataFrame, LedgerError> {
        self.catalog.to_dataframe()
    }

    pub fn yearly_frame(&self) -> Result<DataFrame, LedgerError> {
        yearly_frame(&self.yearly)
    }

    pub fn daily_frame(&self) -> Result<DataFrame, LedgerError> {
        daily_frame(&self.daily)
    }

    pub fn completed_frame(&self, year: i32) -> Result<DataFrame, LedgerError> {
        catalog_frame(views::completed_in_year(&self.catalog, year))
    }

    pub fn calendar_frame(&self, year: i32) -> Result<DataFrame, LedgerError> {
        views::calendar_frame(&views::reading_calendar(&self.daily, year))
    }

    pub fn books_frame(&self, year: i32) -> Result<DataFrame, LedgerError> {
        views::books_frame(&views::books_read_in_year(&self.catalog, &self.daily, year))
    }
}
