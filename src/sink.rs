use std::fs::{self, File};
use std::path::{Path, PathBuf};

use polars::prelude::*;
use tracing::{error, info};

use crate::config::OutputPaths;
use crate::error::LedgerError;
use crate::pipeline::PipelineOutput;
use crate::views;

/// What a persistence pass managed to write.
#[derive(Debug, Default)]
pub struct PersistReport {
    pub written: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

impl PersistReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    fn record(&mut self, table: &str, path: &Path, result: Result<(), LedgerError>) {
        match result {
            Ok(()) => {
                info!(table, path = %path.display(), "wrote table");
                self.written.push(path.to_path_buf());
            }
            Err(err) => {
                error!(table, path = %path.display(), error = %err, "failed to write table");
                self.failed.push((path.to_path_buf(), err.to_string()));
            }
        }
    }
}

/// Write every output table. A failed write is logged and the rest still run.
pub fn persist(output: &PipelineOutput, paths: &OutputPaths, with_views: bool) -> PersistReport {
    let mut report = PersistReport::default();

    report.record(
        "catalog",
        &paths.catalog,
        output.catalog_frame().and_then(|mut df| write_csv(&mut df, &paths.catalog)),
    );
    report.record(
        "yearly",
        &paths.yearly,
        output.yearly_frame().and_then(|mut df| write_csv(&mut df, &paths.yearly)),
    );
    report.record(
        "daily",
        &paths.daily,
        output.daily_frame().and_then(|mut df| write_csv(&mut df, &paths.daily)),
    );

    if let (true, Some(dir)) = (with_views, paths.views.as_deref()) {
        persist_views(output, dir, &mut report);
    }

    report
}

fn persist_views(output: &PipelineOutput, dir: &Path, report: &mut PersistReport) {
    for year in views::active_years(&output.daily) {
        let path = dir.join(format!("completed-{year}.csv"));
        let result = output
            .completed_frame(year)
            .and_then(|mut df| write_csv(&mut df, &path));
        report.record("completed", &path, result);

        let path = dir.join(format!("calendar-{year}.csv"));
        let result = output
            .calendar_frame(year)
            .and_then(|mut df| write_csv(&mut df, &path));
        report.record("calendar", &path, result);

        let path = dir.join(format!("books-{year}.csv"));
        let result = output
            .books_frame(year)
            .and_then(|mut df| write_csv(&mut df, &path));
        report.record("books", &path, result);
    }
}

/// Overwrite `path` with `df` as CSV (header, no index). Parent directories are created.
pub fn write_csv(df: &mut DataFrame, path: &Path) -> Result<(), LedgerError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file).include_header(true).finish(df)?;
    Ok(())
}
