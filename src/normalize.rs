use chrono::NaiveDate;
use polars::prelude::*;
use tracing::{debug, info, warn};

use crate::corrections::Corrections;
use crate::error::LedgerError;
use crate::model::{Catalog, CatalogEntry, ReadingStatus};
use crate::schema::catalog;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Values that stand in for "no ISBN" in exports.
const UNSET_ISBN: [&str; 4] = ["", "nan", "NaN", "None"];

/// A normalized catalog together with its data-quality findings.
#[derive(Debug, Clone)]
pub struct Normalized {
    pub catalog: Catalog,
    pub report: QualityReport,
}

/// Clean and type-coerce the concatenated source exports, then apply corrections.
///
/// Only the catalog columns survive. Unparsable `began`/`completed` dates are
/// fatal; unparsable `publish_date`/`added` degrade to null.
pub fn normalize(catalog_raw: &DataFrame, corrections: &Corrections) -> Result<Normalized, LedgerError> {
    if catalog_raw.width() == 0 {
        return Ok(Normalized {
            catalog: Catalog::default(),
            report: QualityReport::default(),
        });
    }
    require_columns(catalog_raw, &[catalog::TITLE, catalog::SOURCE_COLLECTION])?;

    let titles = text_values(catalog_raw, catalog::TITLE)?;
    let creators = text_values(catalog_raw, catalog::CREATORS)?;
    let publishers = text_values(catalog_raw, catalog::PUBLISHER)?;
    let publish_dates = text_values(catalog_raw, catalog::PUBLISH_DATE)?;
    let isbns = text_values(catalog_raw, catalog::ISBN13)?;
    let lengths = text_values(catalog_raw, catalog::LENGTH)?;
    let statuses = text_values(catalog_raw, catalog::STATUS)?;
    let began = text_values(catalog_raw, catalog::BEGAN)?;
    let completed = text_values(catalog_raw, catalog::COMPLETED)?;
    let added = text_values(catalog_raw, catalog::ADDED)?;
    let sources = text_values(catalog_raw, catalog::SOURCE_COLLECTION)?;

    let mut entries = Vec::with_capacity(catalog_raw.height());
    for row in 0..catalog_raw.height() {
        let title = clean_text(titles[row].as_deref()).unwrap_or_default();
        let source = sources[row].clone().unwrap_or_default();
        let mut entry = CatalogEntry::new(title, source);

        entry.creators = clean_text(creators[row].as_deref());
        entry.publisher = clean_text(publishers[row].as_deref());
        entry.publish_date = lenient_date(publish_dates[row].as_deref());
        entry.isbn13 = isbns[row].as_deref().and_then(normalize_isbn13);
        entry.length = parse_length(lengths[row].as_deref());
        entry.status = statuses[row].as_deref().and_then(ReadingStatus::parse);
        entry.began = strict_date(began[row].as_deref(), catalog::BEGAN, row, &entry.title)?;
        entry.completed =
            strict_date(completed[row].as_deref(), catalog::COMPLETED, row, &entry.title)?;
        entry.added = lenient_date(added[row].as_deref());

        entries.push(entry);
    }

    let mut catalog = Catalog::new(entries);
    let corrected = apply_corrections(&mut catalog, corrections);
    let report = QualityReport::inspect(&catalog);

    info!(
        rows = catalog.len(),
        corrected,
        warnings = report.issues().len(),
        "normalized catalog"
    );
    Ok(Normalized { catalog, report })
}

/// Apply title-keyed overrides in a single pass. Returns the number of rows touched.
pub fn apply_corrections(catalog: &mut Catalog, corrections: &Corrections) -> usize {
    if corrections.is_empty() {
        return 0;
    }
    let index = corrections.by_title();
    let mut touched = 0;

    for entry in catalog.entries_mut() {
        if let Some(correction) = index.get(entry.title.as_str()) {
            correction.apply(entry);
            touched += 1;
        }
    }

    touched
}

// ── Field coercion ──────────────────────────────────────────────────────────

/// Canonical ISBN-13 string: trimmed, float artifact (`.0`) removed, sentinels unset.
pub fn normalize_isbn13(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let isbn = trimmed.strip_suffix(".0").unwrap_or(trimmed);
    if UNSET_ISBN.contains(&isbn) {
        None
    } else {
        Some(isbn.to_string())
    }
}

/// Page count. Floats are truncated; negative, missing or unparsable is 0.
pub fn parse_length(raw: Option<&str>) -> u32 {
    parse_count(raw).and_then(|n| u32::try_from(n).ok()).unwrap_or(0)
}

/// Integer that may have been exported as a float (`"300.0"`).
pub(crate) fn parse_count(raw: Option<&str>) -> Option<i64> {
    let s = raw?.trim();
    if let Ok(n) = s.parse::<i64>() {
        return Some(n);
    }
    match s.parse::<f64>() {
        Ok(f) if f.is_finite() => Some(f.trunc() as i64),
        _ => None,
    }
}

fn clean_text(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

/// Blank is `None`; anything else must be `YYYY-MM-DD`.
fn strict_date(
    raw: Option<&str>,
    column: &'static str,
    row: usize,
    title: &str,
) -> Result<Option<NaiveDate>, LedgerError> {
    let Some(value) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map(Some)
        .map_err(|_| LedgerError::InvalidDate {
            column,
            row,
            title: title.to_string(),
            value: value.to_string(),
        })
}

pub(crate) fn lenient_date(raw: Option<&str>) -> Option<NaiveDate> {
    let value = raw.map(str::trim).filter(|s| !s.is_empty())?;
    match NaiveDate::parse_from_str(value, DATE_FORMAT) {
        Ok(date) => Some(date),
        Err(_) => {
            debug!(value, "unparsable date treated as null");
            None
        }
    }
}

// ── Frame access ────────────────────────────────────────────────────────────

pub(crate) fn require_columns(df: &DataFrame, required: &[&str]) -> Result<(), LedgerError> {
    for &col_name in required {
        if df.column(col_name).is_err() {
            return Err(LedgerError::MissingColumn(col_name.to_string()));
        }
    }
    Ok(())
}

/// Read a string column row by row. An absent column reads as all-null.
pub(crate) fn text_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>, LedgerError> {
    match df.column(name) {
        Ok(column) => Ok(column
            .str()?
            .into_iter()
            .map(|v| v.map(str::to_string))
            .collect()),
        Err(_) => Ok(vec![None; df.height()]),
    }
}

// ── Data-quality report ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MissingField {
    Length,
    Creators,
    Publisher,
    PublishDate,
    Isbn13,
}

impl MissingField {
    pub const ALL: [MissingField; 5] = [
        Self::Length,
        Self::Creators,
        Self::Publisher,
        Self::PublishDate,
        Self::Isbn13,
    ];

    pub fn column(self) -> &'static str {
        match self {
            Self::Length => catalog::LENGTH,
            Self::Creators => catalog::CREATORS,
            Self::Publisher => catalog::PUBLISHER,
            Self::PublishDate => catalog::PUBLISH_DATE,
            Self::Isbn13 => catalog::ISBN13,
        }
    }

    fn is_missing(self, entry: &CatalogEntry) -> bool {
        match self {
            Self::Length => entry.length == 0,
            Self::Creators => entry.creators.is_none(),
            Self::Publisher => entry.publisher.is_none(),
            Self::PublishDate => entry.publish_date.is_none(),
            Self::Isbn13 => entry.isbn13.is_none(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QualityIssue {
    pub row: usize,
    pub title: String,
    pub source_collection: String,
    pub field: MissingField,
}

/// Non-fatal findings from normalization: rows still missing a field after corrections.
#[derive(Debug, Clone, Default)]
pub struct QualityReport {
    issues: Vec<QualityIssue>,
}

impl QualityReport {
    pub fn inspect(catalog: &Catalog) -> Self {
        let mut issues = Vec::new();
        for (row, entry) in catalog.iter().enumerate() {
            for field in MissingField::ALL {
                if field.is_missing(entry) {
                    issues.push(QualityIssue {
                        row,
                        title: entry.title.clone(),
                        source_collection: entry.source_collection.clone(),
                        field,
                    });
                }
            }
        }
        Self { issues }
    }

    pub fn issues(&self) -> &[QualityIssue] {
        &self.issues
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn missing(&self, field: MissingField) -> impl Iterator<Item = &QualityIssue> {
        self.issues.iter().filter(move |issue| issue.field == field)
    }

    /// Emit the batched report: one warning per field, row detail at debug.
    pub fn log(&self) {
        if self.is_clean() {
            info!("catalog has no missing fields");
            return;
        }
        for field in MissingField::ALL {
            let titles: Vec<&str> = self.missing(field).map(|i| i.title.as_str()).collect();
            if titles.is_empty() {
                continue;
            }
            warn!(
                field = field.column(),
                count = titles.len(),
                ?titles,
                "catalog rows missing field"
            );
            for issue in self.missing(field) {
                debug!(
                    field = field.column(),
                    row = issue.row,
                    title = %issue.title,
                    source = %issue.source_collection,
                    "missing field"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn raw_frame(rows: &[[&str; 6]]) -> DataFrame {
        let column_at = |i: usize| rows.iter().map(|r| r[i]).collect::<Vec<&str>>();
        DataFrame::new(vec![
            Column::new(catalog::TITLE.into(), &column_at(0)),
            Column::new(catalog::ISBN13.into(), &column_at(1)),
            Column::new(catalog::LENGTH.into(), &column_at(2)),
            Column::new(catalog::STATUS.into(), &column_at(3)),
            Column::new(catalog::BEGAN.into(), &column_at(4)),
            Column::new(catalog::COMPLETED.into(), &column_at(5)),
            Column::new(catalog::SOURCE_COLLECTION.into(), &vec!["kindle"; rows.len()]),
            Column::new("tags".into(), &vec!["ignored"; rows.len()]),
        ])
        .unwrap()
    }

    #[test]
    fn isbn_float_artifact_and_sentinels() {
        assert_eq!(normalize_isbn13("9780375706868.0").as_deref(), Some("9780375706868"));
        assert_eq!(normalize_isbn13(" 9780375706868 ").as_deref(), Some("9780375706868"));
        assert_eq!(normalize_isbn13("nan"), None);
        assert_eq!(normalize_isbn13(""), None);
    }

    #[test]
    fn length_coercion() {
        assert_eq!(parse_length(Some("300")), 300);
        assert_eq!(parse_length(Some("300.0")), 300);
        assert_eq!(parse_length(Some(" 12 ")), 12);
        assert_eq!(parse_length(Some("-5")), 0);
        assert_eq!(parse_length(Some("lots")), 0);
        assert_eq!(parse_length(None), 0);
    }

    #[test]
    fn normalizes_rows_and_drops_extra_columns() {
        let df = raw_frame(&[[
            "Snow",
            "9780375706868.0",
            "320.0",
            " Completed ",
            " 2023-01-01",
            "2023-01-10 ",
        ]]);
        let Normalized { catalog, .. } = normalize(&df, &Corrections::default()).unwrap();

        let entry = &catalog.entries()[0];
        assert_eq!(entry.isbn13.as_deref(), Some("9780375706868"));
        assert_eq!(entry.length, 320);
        assert_eq!(entry.status, Some(ReadingStatus::Completed));
        assert_eq!(entry.began, NaiveDate::from_ymd_opt(2023, 1, 1));
        assert_eq!(entry.completed, NaiveDate::from_ymd_opt(2023, 1, 10));
        assert_eq!(entry.source_collection, "kindle");
        assert_eq!(catalog.to_dataframe().unwrap().width(), catalog::ALL.len());
    }

    #[test]
    fn title_whitespace_is_trimmed() {
        let df = raw_frame(&[["  Snow ", "", "300", "In progress", "", ""]]);
        let Normalized { catalog, .. } = normalize(&df, &Corrections::default()).unwrap();
        assert_eq!(catalog.entries()[0].title, "Snow");
    }

    #[test]
    fn bad_began_date_is_fatal() {
        let df = raw_frame(&[["Snow", "", "", "Completed", "01/02/2023", ""]]);
        let err = normalize(&df, &Corrections::default()).unwrap_err();
        match err {
            LedgerError::InvalidDate { column, row, value, .. } => {
                assert_eq!(column, catalog::BEGAN);
                assert_eq!(row, 0);
                assert_eq!(value, "01/02/2023");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn bad_publish_date_degrades_to_null() {
        assert_eq!(lenient_date(Some("1999")), None);
        assert_eq!(lenient_date(Some("1999-02-03")), NaiveDate::from_ymd_opt(1999, 2, 3));
    }

    #[test]
    fn correction_fills_length_and_clears_warning() {
        let df = raw_frame(&[
            ["X", "", "0", "Completed", "", ""],
            ["Y", "", "", "Completed", "", ""],
        ]);
        let corrections = Corrections::from_json_str(r#"{"missing_lengths": {"X": 400}}"#).unwrap();
        let Normalized { catalog, report } = normalize(&df, &corrections).unwrap();

        assert_eq!(catalog.entries()[0].length, 400);
        let missing: Vec<&str> = report
            .missing(MissingField::Length)
            .map(|i| i.title.as_str())
            .collect();
        assert_eq!(missing, vec!["Y"]);
    }

    #[test]
    fn report_flags_every_missing_field() {
        let catalog = Catalog::new(vec![CatalogEntry::new("Bare", "borrowed")]);
        let report = QualityReport::inspect(&catalog);
        let fields: Vec<MissingField> = report.issues().iter().map(|i| i.field).collect();
        assert_eq!(fields, MissingField::ALL.to_vec());
    }

    #[test]
    fn missing_title_column_is_an_error() {
        let df = DataFrame::new(vec![Column::new("name".into(), &["a"])]).unwrap();
        assert!(matches!(
            normalize(&df, &Corrections::default()),
            Err(LedgerError::MissingColumn(_))
        ));
    }
}
