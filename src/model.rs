use chrono::NaiveDate;
use polars::prelude::*;

use crate::error::LedgerError;
use crate::schema::{catalog, daily, status, yearly};

// ── Status ──────────────────────────────────────────────────────────────────

/// Reading status as exported by the catalog app.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReadingStatus {
    Completed,
    InProgress,
    Other(String),
}

impl ReadingStatus {
    /// Parse a free-text status. Surrounding whitespace is ignored; blank is `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "" => None,
            status::COMPLETED => Some(Self::Completed),
            status::IN_PROGRESS => Some(Self::InProgress),
            other => Some(Self::Other(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Completed => status::COMPLETED,
            Self::InProgress => status::IN_PROGRESS,
            Self::Other(s) => s,
        }
    }

    /// `Completed` or `In progress`: the statuses that carry session data.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Completed | Self::InProgress)
    }
}

// ── Catalog ─────────────────────────────────────────────────────────────────

/// One physical or digital copy of a book, from one source collection.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub title: String,
    pub creators: Option<String>,
    pub publisher: Option<String>,
    pub publish_date: Option<NaiveDate>,
    pub isbn13: Option<String>,
    /// Page count; 0 means unknown.
    pub length: u32,
    pub status: Option<ReadingStatus>,
    pub began: Option<NaiveDate>,
    pub completed: Option<NaiveDate>,
    pub added: Option<NaiveDate>,
    pub source_collection: String,
    /// Days from `began` to `completed`, inclusive. 0 when either is missing.
    pub duration: i64,
    pub year_completed: Option<i32>,
}

impl CatalogEntry {
    pub fn new(title: impl Into<String>, source_collection: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            creators: None,
            publisher: None,
            publish_date: None,
            isbn13: None,
            length: 0,
            status: None,
            began: None,
            completed: None,
            added: None,
            source_collection: source_collection.into(),
            duration: 0,
            year_completed: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == Some(ReadingStatus::Completed)
    }

    pub fn is_active(&self) -> bool {
        self.status.as_ref().is_some_and(ReadingStatus::is_active)
    }
}

/// The canonical catalog: every source collection, in load order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn entries_mut(&mut self) -> &mut [CatalogEntry] {
        &mut self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CatalogEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_dataframe(&self) -> Result<DataFrame, LedgerError> {
        catalog_frame(self.entries.iter())
    }
}

/// Build a catalog-shaped frame from any subset of entries.
pub fn catalog_frame<'a, I>(entries: I) -> Result<DataFrame, LedgerError>
where
    I: IntoIterator<Item = &'a CatalogEntry>,
{
    let mut titles = Vec::new();
    let mut creators = Vec::new();
    let mut publishers = Vec::new();
    let mut publish_dates = Vec::new();
    let mut isbns = Vec::new();
    let mut lengths = Vec::new();
    let mut statuses = Vec::new();
    let mut began = Vec::new();
    let mut completed = Vec::new();
    let mut added = Vec::new();
    let mut sources = Vec::new();
    let mut durations = Vec::new();
    let mut years = Vec::new();

    for e in entries {
        titles.push(e.title.clone());
        creators.push(e.creators.clone());
        publishers.push(e.publisher.clone());
        publish_dates.push(e.publish_date);
        isbns.push(e.isbn13.clone());
        lengths.push(i64::from(e.length));
        statuses.push(e.status.as_ref().map(|s| s.as_str().to_string()));
        began.push(e.began);
        completed.push(e.completed);
        added.push(e.added);
        sources.push(e.source_collection.clone());
        durations.push(e.duration);
        years.push(e.year_completed);
    }

    let df = DataFrame::new(vec![
        Column::new(catalog::TITLE.into(), &titles),
        Column::new(catalog::CREATORS.into(), &creators),
        Column::new(catalog::PUBLISHER.into(), &publishers),
        Column::new(catalog::PUBLISH_DATE.into(), &publish_dates),
        Column::new(catalog::ISBN13.into(), &isbns),
        Column::new(catalog::LENGTH.into(), &lengths),
        Column::new(catalog::STATUS.into(), &statuses),
        Column::new(catalog::BEGAN.into(), &began),
        Column::new(catalog::COMPLETED.into(), &completed),
        Column::new(catalog::ADDED.into(), &added),
        Column::new(catalog::SOURCE_COLLECTION.into(), &sources),
        Column::new(catalog::DURATION.into(), &durations),
        Column::new(catalog::YEAR_COMPLETED.into(), &years),
    ])?;

    Ok(df)
}

// ── Sessions ────────────────────────────────────────────────────────────────

/// One line of the reading-session log.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionEvent {
    pub date: NaiveDate,
    pub isbn13: Option<String>,
    pub title: Option<String>,
    pub start_page: i64,
    pub end_page: i64,
}

// ── Daily progress ──────────────────────────────────────────────────────────

/// Pages read on one day for one book, or a zero-filled gap row.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyProgress {
    pub date: NaiveDate,
    pub title: String,
    pub isbn13: Option<String>,
    pub daily_pages: i64,
    pub percent_complete: f64,
    pub length: u32,
    /// Synthesized for a day without activity; title is empty.
    pub gap: bool,
}

impl DailyProgress {
    /// Zero-filled placeholder for a day without activity.
    pub fn gap(date: NaiveDate) -> Self {
        Self {
            date,
            title: String::new(),
            isbn13: None,
            daily_pages: 0,
            percent_complete: 0.0,
            length: 0,
            gap: true,
        }
    }

    pub fn is_gap(&self) -> bool {
        self.gap
    }
}

pub fn daily_frame(rows: &[DailyProgress]) -> Result<DataFrame, LedgerError> {
    let dates: Vec<NaiveDate> = rows.iter().map(|r| r.date).collect();
    let titles: Vec<&str> = rows.iter().map(|r| r.title.as_str()).collect();
    let isbns: Vec<Option<&str>> = rows.iter().map(|r| r.isbn13.as_deref()).collect();
    let pages: Vec<i64> = rows.iter().map(|r| r.daily_pages).collect();
    let percents: Vec<f64> = rows.iter().map(|r| r.percent_complete).collect();
    let lengths: Vec<i64> = rows.iter().map(|r| i64::from(r.length)).collect();

    let df = DataFrame::new(vec![
        Column::new(daily::DATE.into(), &dates),
        Column::new(daily::TITLE.into(), &titles),
        Column::new(daily::ISBN13.into(), &isbns),
        Column::new(daily::DAILY_PAGES.into(), &pages),
        Column::new(daily::PERCENT_COMPLETE.into(), &percents),
        Column::new(daily::LENGTH.into(), &lengths),
    ])?;

    Ok(df)
}

// ── Yearly summary ──────────────────────────────────────────────────────────

/// Completed-book totals for one calendar year. Floats are rounded to 2 decimals.
#[derive(Debug, Clone, PartialEq)]
pub struct YearlySummary {
    pub year: i32,
    pub count: u32,
    pub sum_length: u64,
    pub avg_length: f64,
    pub avg_duration: f64,
    pub length_per_month: f64,
    pub length_per_week: f64,
    pub length_per_day: f64,
}

pub fn yearly_frame(rows: &[YearlySummary]) -> Result<DataFrame, LedgerError> {
    let years: Vec<i32> = rows.iter().map(|r| r.year).collect();
    let counts: Vec<u32> = rows.iter().map(|r| r.count).collect();
    let sums: Vec<u64> = rows.iter().map(|r| r.sum_length).collect();
    let float_col = |name: &str, f: fn(&YearlySummary) -> f64| {
        let values: Vec<f64> = rows.iter().map(f).collect();
        Column::new(name.into(), &values)
    };

    let df = DataFrame::new(vec![
        Column::new(yearly::YEAR.into(), &years),
        Column::new(yearly::COUNT.into(), &counts),
        Column::new(yearly::SUM_LENGTH.into(), &sums),
        float_col(yearly::AVG_LENGTH, |r| r.avg_length),
        float_col(yearly::AVG_DURATION, |r| r.avg_duration),
        float_col(yearly::LENGTH_PER_MONTH, |r| r.length_per_month),
        float_col(yearly::LENGTH_PER_WEEK, |r| r.length_per_week),
        float_col(yearly::LENGTH_PER_DAY, |r| r.length_per_day),
    ])?;

    Ok(df)
}

/// Round half away from zero to 2 decimals.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
