//! Per-year tables the charts are drawn from: completed-book lists, the
//! reading calendar (heatmap grid) and the books-in-progress table.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use polars::prelude::*;

use crate::error::LedgerError;
use crate::model::{Catalog, CatalogEntry, DailyProgress};
use crate::schema::{books, calendar};

/// Distinct years on the daily-progress date axis, ascending.
pub fn active_years(daily: &[DailyProgress]) -> Vec<i32> {
    daily
        .iter()
        .map(|r| r.date.year())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// `Completed` books finished in `year`, most recent first.
pub fn completed_in_year(catalog: &Catalog, year: i32) -> Vec<&CatalogEntry> {
    let mut done: Vec<&CatalogEntry> = catalog
        .iter()
        .filter(|e| e.is_completed() && e.year_completed == Some(year))
        .collect();
    done.sort_by(|a, b| b.completed.cmp(&a.completed));
    done
}

// ── Reading calendar ────────────────────────────────────────────────────────

/// One day of the heatmap grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarCell {
    pub date: NaiveDate,
    /// Column in the grid, 1 = the week holding Jan 1.
    pub week: u32,
    /// Row in the grid, 0 = Monday.
    pub weekday: u32,
    pub daily_pages: i64,
}

/// Every day of `year` with the pages read that day (0 without activity).
pub fn reading_calendar(daily: &[DailyProgress], year: i32) -> Vec<CalendarCell> {
    let (Some(start), Some(end)) = (
        NaiveDate::from_ymd_opt(year, 1, 1),
        NaiveDate::from_ymd_opt(year, 12, 31),
    ) else {
        return Vec::new();
    };

    let mut pages: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    for row in daily.iter().filter(|r| r.date.year() == year) {
        *pages.entry(row.date).or_default() += row.daily_pages;
    }

    let first_monday = grid_origin(start);
    start
        .iter_days()
        .take_while(|d| *d <= end)
        .map(|date| CalendarCell {
            date,
            week: ((date - first_monday).num_days() / 7 + 1) as u32,
            weekday: date.weekday().num_days_from_monday(),
            daily_pages: pages.get(&date).copied().unwrap_or(0),
        })
        .collect()
}

/// The Monday on or before Jan 1.
fn grid_origin(jan_first: NaiveDate) -> NaiveDate {
    let back = i64::from(jan_first.weekday().num_days_from_monday());
    let monday = jan_first - Duration::days(back);
    debug_assert_eq!(monday.weekday(), Weekday::Mon);
    monday
}

pub fn calendar_frame(cells: &[CalendarCell]) -> Result<DataFrame, LedgerError> {
    let dates: Vec<NaiveDate> = cells.iter().map(|c| c.date).collect();
    let weeks: Vec<u32> = cells.iter().map(|c| c.week).collect();
    let weekdays: Vec<u32> = cells.iter().map(|c| c.weekday).collect();
    let pages: Vec<i64> = cells.iter().map(|c| c.daily_pages).collect();

    let df = DataFrame::new(vec![
        Column::new(calendar::DATE.into(), &dates),
        Column::new(calendar::WEEK.into(), &weeks),
        Column::new(calendar::WEEKDAY.into(), &weekdays),
        Column::new(calendar::DAILY_PAGES.into(), &pages),
    ])?;
    Ok(df)
}

// ── Books read in year ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct BookProgressRow {
    pub title: String,
    pub creators: Option<String>,
    pub length: u32,
    pub began: Option<NaiveDate>,
    pub completed: Option<NaiveDate>,
    /// Latest recorded percent for the book's ISBN, truncated.
    pub percent_complete: u32,
    pub duration: i64,
}

/// Active books read on at least one day of `year`, latest start first.
pub fn books_read_in_year(
    catalog: &Catalog,
    daily: &[DailyProgress],
    year: i32,
) -> Vec<BookProgressRow> {
    let read_in_year: HashSet<&str> = daily
        .iter()
        .filter(|r| !r.is_gap() && r.date.year() == year)
        .map(|r| r.title.as_str())
        .collect();

    let mut latest: HashMap<&str, (NaiveDate, f64)> = HashMap::new();
    for row in daily.iter().filter(|r| !r.is_gap()) {
        let Some(isbn) = row.isbn13.as_deref() else { continue };
        let slot = latest.entry(isbn).or_insert((row.date, row.percent_complete));
        if row.date >= slot.0 {
            *slot = (row.date, row.percent_complete);
        }
    }

    let mut entries: Vec<&CatalogEntry> = catalog
        .iter()
        .filter(|e| e.is_active() && read_in_year.contains(e.title.as_str()))
        .collect();
    entries.sort_by(|a, b| b.began.cmp(&a.began));

    entries
        .into_iter()
        .map(|e| BookProgressRow {
            title: e.title.clone(),
            creators: e.creators.clone(),
            length: e.length,
            began: e.began,
            completed: e.completed,
            percent_complete: e
                .isbn13
                .as_deref()
                .and_then(|isbn| latest.get(isbn))
                .map_or(0, |(_, pct)| pct.trunc() as u32),
            duration: e.duration,
        })
        .collect()
}

pub fn books_frame(rows: &[BookProgressRow]) -> Result<DataFrame, LedgerError> {
    let titles: Vec<&str> = rows.iter().map(|r| r.title.as_str()).collect();
    let creators: Vec<Option<&str>> = rows.iter().map(|r| r.creators.as_deref()).collect();
    let lengths: Vec<i64> = rows.iter().map(|r| i64::from(r.length)).collect();
    let began: Vec<Option<NaiveDate>> = rows.iter().map(|r| r.began).collect();
    let completed: Vec<Option<NaiveDate>> = rows.iter().map(|r| r.completed).collect();
    let percents: Vec<u32> = rows.iter().map(|r| r.percent_complete).collect();
    let durations: Vec<i64> = rows.iter().map(|r| r.duration).collect();

    let df = DataFrame::new(vec![
        Column::new(books::TITLE.into(), &titles),
        Column::new(books::CREATORS.into(), &creators),
        Column::new(books::LENGTH.into(), &lengths),
        Column::new(books::BEGAN.into(), &began),
        Column::new(books::COMPLETED.into(), &completed),
        Column::new(books::PERCENT_COMPLETE.into(), &percents),
        Column::new(books::DURATION.into(), &durations),
    ])?;
    Ok(df)
}
