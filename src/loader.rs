use std::path::Path;

use polars::prelude::*;
use tracing::info;

use crate::config::{PipelineConfig, SourcePath};
use crate::error::LedgerError;
use crate::schema::{aliases, catalog};

/// The raw, untyped inputs of one pipeline run.
#[derive(Debug, Clone)]
pub struct RawTables {
    /// Every catalog source, stamped with `source_collection`, in config order.
    pub catalog_raw: DataFrame,
    /// The session log, unmerged.
    pub sessions_raw: DataFrame,
}

pub fn load_sources(config: &PipelineConfig) -> Result<RawTables, LedgerError> {
    let catalog_raw = load_catalog_raw(&config.collections)?;
    let sessions_raw = read_csv_as_strings(aliases::DAILY_SOURCE, &config.daily)?;
    info!(
        catalog_rows = catalog_raw.height(),
        session_rows = sessions_raw.height(),
        "loaded sources"
    );
    Ok(RawTables {
        catalog_raw,
        sessions_raw,
    })
}

/// Load each catalog source, stamp it with its collection name and stack them.
///
/// Row order is source order, then file order. Columns missing from one export
/// are null-filled; no deduplication happens here.
pub fn load_catalog_raw(collections: &[SourcePath]) -> Result<DataFrame, LedgerError> {
    if collections.is_empty() {
        return Ok(DataFrame::empty());
    }

    let mut frames = Vec::with_capacity(collections.len());
    for source in collections {
        let df = read_csv_as_strings(&source.name, &source.path)?;
        info!(collection = %source.name, rows = df.height(), "loaded catalog source");
        frames.push(
            df.lazy()
                .with_column(lit(source.name.as_str()).alias(catalog::SOURCE_COLLECTION)),
        );
    }

    let df = concat_lf_diagonal(frames, UnionArgs::default())?.collect()?;
    Ok(df)
}

/// Read a CSV file with all columns as String dtype.
/// Trims whitespace from column names and maps export aliases onto canonical names.
pub fn read_csv_as_strings(collection: &str, path: &Path) -> Result<DataFrame, LedgerError> {
    if !path.is_file() {
        return Err(LedgerError::SourceNotFound {
            collection: collection.to_string(),
            path: path.to_path_buf(),
        });
    }

    let mut df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0)) // all columns as String
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    let trimmed: Vec<String> = df
        .get_column_names_str()
        .iter()
        .map(|c| c.trim().to_string())
        .collect();
    df.set_column_names(trimmed.as_slice())?;

    let present = |name: &str| trimmed.iter().any(|n| n == name);
    let (old, new): (Vec<&str>, Vec<&str>) = aliases::COLUMN_ALIASES
        .iter()
        .copied()
        .filter(|&(from, to)| present(from) && !present(to))
        .unzip();
    if !old.is_empty() {
        df = df.lazy().rename(old, new, true).collect()?;
    }

    Ok(df)
}
