use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, NaiveDate};
use polars::prelude::*;
use tracing::{info, warn};

use crate::error::LedgerError;
use crate::model::{round2, Catalog, CatalogEntry, DailyProgress, SessionEvent};
use crate::normalize::{lenient_date, normalize_isbn13, parse_count, require_columns, text_values};
use crate::schema::session;

// ── Catalog derivations ─────────────────────────────────────────────────────

/// Fill `duration` and `year_completed` on every entry.
pub fn derive(catalog: &mut Catalog) {
    for entry in catalog.entries_mut() {
        entry.duration = duration_days(entry.began, entry.completed);
        entry.year_completed = entry.completed.map(|d| d.year());
        if entry.duration < 0 {
            warn!(
                title = %entry.title,
                source = %entry.source_collection,
                duration = entry.duration,
                "completed date precedes began date"
            );
        }
    }
}

/// Inclusive day count from `began` to `completed`; 0 unless both are set.
pub fn duration_days(began: Option<NaiveDate>, completed: Option<NaiveDate>) -> i64 {
    match (began, completed) {
        (Some(b), Some(c)) => (c - b).num_days() + 1,
        _ => 0,
    }
}

// ── Session log ─────────────────────────────────────────────────────────────

/// Type the raw session log. Rows without a usable date are dropped with a warning.
pub fn parse_sessions(sessions_raw: &DataFrame) -> Result<Vec<SessionEvent>, LedgerError> {
    if sessions_raw.width() == 0 {
        return Ok(Vec::new());
    }
    require_columns(sessions_raw, &[session::DATE])?;

    let dates = text_values(sessions_raw, session::DATE)?;
    let isbns = text_values(sessions_raw, session::ISBN13)?;
    let titles = text_values(sessions_raw, session::TITLE)?;
    let starts = text_values(sessions_raw, session::START_PAGE)?;
    let ends = text_values(sessions_raw, session::END_PAGE)?;

    let mut events = Vec::with_capacity(sessions_raw.height());
    for row in 0..sessions_raw.height() {
        let Some(date) = lenient_date(dates[row].as_deref()) else {
            warn!(row, value = ?dates[row], "session row without a valid date dropped");
            continue;
        };
        events.push(SessionEvent {
            date,
            isbn13: isbns[row].as_deref().and_then(normalize_isbn13),
            title: titles[row]
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string),
            start_page: parse_count(starts[row].as_deref()).unwrap_or(0),
            end_page: parse_count(ends[row].as_deref()).unwrap_or(0),
        });
    }
    Ok(events)
}

// ── Join ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKey {
    Isbn13,
    Title,
}

/// A session event with the catalog entry it resolved to, if any.
#[derive(Debug, Clone, Copy)]
pub struct JoinedSession<'a> {
    pub event: &'a SessionEvent,
    pub entry: Option<&'a CatalogEntry>,
    pub matched_by: Option<JoinKey>,
}

/// Left-join sessions onto the catalog in two explicit stages.
///
/// Stage one matches on `isbn13` where both sides carry one. Stage two
/// matches the still unmatched rows on `title`, but only where the session
/// or the candidate entry has no `isbn13`; two differing ISBNs never join.
/// Sessions that match nothing are kept with no entry.
pub fn join_sessions<'a>(catalog: &'a Catalog, sessions: &'a [SessionEvent]) -> Vec<JoinedSession<'a>> {
    let by_isbn = index_by(catalog, |e| e.isbn13.as_deref());
    let by_title = index_by(catalog, |e| Some(e.title.as_str()).filter(|t| !t.is_empty()));

    let mut joined: Vec<JoinedSession<'a>> = sessions
        .iter()
        .map(|event| {
            let entry = event
                .isbn13
                .as_deref()
                .and_then(|isbn| by_isbn.get(isbn).copied());
            JoinedSession {
                event,
                entry,
                matched_by: entry.map(|_| JoinKey::Isbn13),
            }
        })
        .collect();

    for row in joined.iter_mut().filter(|j| j.entry.is_none()) {
        let event = row.event;
        let entry = event
            .title
            .as_deref()
            .and_then(|t| by_title.get(t).copied())
            .filter(|e| event.isbn13.is_none() || e.isbn13.is_none());
        if let Some(entry) = entry {
            row.entry = Some(entry);
            row.matched_by = Some(JoinKey::Title);
        }
    }

    joined
}

/// Key → entry. On duplicate keys the first active entry wins, else the first seen.
fn index_by<'a, F>(catalog: &'a Catalog, key: F) -> HashMap<&'a str, &'a CatalogEntry>
where
    F: Fn(&'a CatalogEntry) -> Option<&'a str>,
{
    let mut index: HashMap<&'a str, &'a CatalogEntry> = HashMap::new();
    for entry in catalog.iter() {
        let Some(k) = key(entry) else { continue };
        match index.entry(k) {
            Entry::Vacant(slot) => {
                slot.insert(entry);
            }
            Entry::Occupied(mut slot) => {
                if !slot.get().is_active() && entry.is_active() {
                    slot.insert(entry);
                }
            }
        }
    }
    index
}

// ── Daily progress ──────────────────────────────────────────────────────────

/// Join, keep `Completed`/`In progress` books, compute per-day metrics and
/// densify the date axis.
pub fn build_daily_progress(catalog: &Catalog, sessions: &[SessionEvent]) -> Vec<DailyProgress> {
    let joined = join_sessions(catalog, sessions);

    let unmatched = joined.iter().filter(|j| j.entry.is_none()).count();
    if unmatched > 0 {
        warn!(unmatched, "session rows matched no catalog entry");
    }

    let rows: Vec<DailyProgress> = joined
        .iter()
        .filter_map(|j| {
            let entry = j.entry.filter(|e| e.is_active())?;
            Some(progress_row(j.event, entry))
        })
        .collect();

    let dense = fill_calendar_gaps(rows);
    info!(
        sessions = sessions.len(),
        rows = dense.len(),
        gaps = dense.iter().filter(|r| r.is_gap()).count(),
        "built daily progress"
    );
    dense
}

fn progress_row(event: &SessionEvent, entry: &CatalogEntry) -> DailyProgress {
    if entry.length > 0 && event.end_page > i64::from(entry.length) {
        warn!(
            title = %entry.title,
            end_page = event.end_page,
            length = entry.length,
            date = %event.date,
            "session ends past the last page"
        );
    }
    DailyProgress {
        date: event.date,
        title: entry.title.clone(),
        isbn13: entry.isbn13.clone().or_else(|| event.isbn13.clone()),
        daily_pages: event.end_page - event.start_page,
        percent_complete: percent_complete(event.end_page, entry.length),
        length: entry.length,
        gap: false,
    }
}

/// `end_page / length * 100`, clamped to `[0, 100]` and rounded. 0 when length is unknown.
pub fn percent_complete(end_page: i64, length: u32) -> f64 {
    if length == 0 {
        return 0.0;
    }
    let pct = end_page as f64 / f64::from(length) * 100.0;
    round2(pct.clamp(0.0, 100.0))
}

/// Every calendar day from the first to the last row's date, inclusive.
/// Days without rows get one zero-filled gap row; days with rows keep them in order.
pub fn fill_calendar_gaps(rows: Vec<DailyProgress>) -> Vec<DailyProgress> {
    let (Some(first), Some(last)) = (
        rows.iter().map(|r| r.date).min(),
        rows.iter().map(|r| r.date).max(),
    ) else {
        return Vec::new();
    };

    let mut by_date: BTreeMap<NaiveDate, Vec<DailyProgress>> = BTreeMap::new();
    for row in rows {
        by_date.entry(row.date).or_default().push(row);
    }

    let mut dense = Vec::new();
    for date in first.iter_days().take_while(|d| *d <= last) {
        match by_date.remove(&date) {
            Some(day) => dense.extend(day),
            None => dense.push(DailyProgress::gap(date)),
        }
    }
    dense
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ReadingStatus;
    use pretty_assertions::assert_eq;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn book(title: &str, isbn: Option<&str>, status: ReadingStatus, length: u32) -> CatalogEntry {
        let mut e = CatalogEntry::new(title, "shelf");
        e.isbn13 = isbn.map(str::to_string);
        e.status = Some(status);
        e.length = length;
        e
    }

    fn event(date: NaiveDate, isbn: Option<&str>, title: Option<&str>, start: i64, end: i64) -> SessionEvent {
        SessionEvent {
            date,
            isbn13: isbn.map(str::to_string),
            title: title.map(str::to_string),
            start_page: start,
            end_page: end,
        }
    }

    #[test]
    fn duration_is_inclusive() {
        assert_eq!(duration_days(Some(day(2023, 1, 1)), Some(day(2023, 1, 10))), 10);
        assert_eq!(duration_days(Some(day(2023, 1, 1)), Some(day(2023, 1, 1))), 1);
        assert_eq!(duration_days(None, Some(day(2023, 1, 1))), 0);
        assert_eq!(duration_days(Some(day(2023, 1, 1)), None), 0);
    }

    #[test]
    fn derive_sets_year_only_when_completed() {
        let mut done = book("A", None, ReadingStatus::Completed, 100);
        done.began = Some(day(2022, 12, 30));
        done.completed = Some(day(2023, 1, 2));
        let reading = book("B", None, ReadingStatus::InProgress, 100);
        let mut catalog = Catalog::new(vec![done, reading]);

        derive(&mut catalog);

        assert_eq!(catalog.entries()[0].duration, 4);
        assert_eq!(catalog.entries()[0].year_completed, Some(2023));
        assert_eq!(catalog.entries()[1].duration, 0);
        assert_eq!(catalog.entries()[1].year_completed, None);
    }

    #[test]
    fn join_prefers_isbn_then_falls_back_to_title() {
        let catalog = Catalog::new(vec![
            book("Snow", Some("111"), ReadingStatus::Completed, 300),
            book("August", None, ReadingStatus::InProgress, 200),
        ]);
        let sessions = vec![
            event(day(2023, 1, 1), Some("111"), Some("Wrong title"), 0, 10),
            event(day(2023, 1, 1), None, Some("August"), 0, 20),
            event(day(2023, 1, 1), Some("555"), Some("August"), 20, 30),
            event(day(2023, 1, 1), Some("888"), Some("Nothing"), 0, 5),
        ];

        let joined = join_sessions(&catalog, &sessions);
        let keys: Vec<Option<JoinKey>> = joined.iter().map(|j| j.matched_by).collect();
        assert_eq!(
            keys,
            vec![Some(JoinKey::Isbn13), Some(JoinKey::Title), Some(JoinKey::Title), None]
        );
        assert_eq!(joined[0].entry.map(|e| e.title.as_str()), Some("Snow"));
        assert_eq!(joined[2].entry.map(|e| e.title.as_str()), Some("August"));
        assert!(joined[3].entry.is_none());
    }

    #[test]
    fn differing_isbns_never_join_by_title() {
        let catalog = Catalog::new(vec![book("Snow", Some("111"), ReadingStatus::Completed, 300)]);
        let sessions = vec![event(day(2023, 1, 1), Some("999"), Some("Snow"), 10, 20)];

        let joined = join_sessions(&catalog, &sessions);
        assert!(joined[0].entry.is_none());
        assert_eq!(joined[0].matched_by, None);
    }

    #[test]
    fn padded_catalog_title_joins_after_normalization() {
        use crate::corrections::Corrections;
        use crate::normalize::{normalize, Normalized};
        use crate::schema::catalog;

        let raw = DataFrame::new(vec![
            Column::new(catalog::TITLE.into(), &["Snow "]),
            Column::new(catalog::LENGTH.into(), &["300"]),
            Column::new(catalog::STATUS.into(), &["In progress"]),
            Column::new(catalog::SOURCE_COLLECTION.into(), &["shelf"]),
        ])
        .unwrap();
        let Normalized { catalog, .. } = normalize(&raw, &Corrections::default()).unwrap();
        let sessions = vec![event(day(2023, 1, 1), None, Some("Snow"), 0, 30)];

        let rows = build_daily_progress(&catalog, &sessions);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].title, "Snow");
        assert_eq!(rows[0].daily_pages, 30);
    }

    #[test]
    fn duplicate_keys_prefer_active_entry() {
        let catalog = Catalog::new(vec![
            book("Snow", Some("111"), ReadingStatus::Other("Not begun".into()), 300),
            book("Snow", Some("111"), ReadingStatus::InProgress, 320),
        ]);
        let sessions = vec![event(day(2023, 1, 1), Some("111"), None, 0, 32)];

        let rows = build_daily_progress(&catalog, &sessions);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].length, 320);
        assert_eq!(rows[0].percent_complete, 10.0);
    }

    #[test]
    fn unmatched_and_inactive_sessions_are_filtered() {
        let catalog = Catalog::new(vec![
            book("Snow", Some("111"), ReadingStatus::Completed, 300),
            book("Shelved", Some("222"), ReadingStatus::Other("Not begun".into()), 100),
        ]);
        let sessions = vec![
            event(day(2023, 1, 1), Some("111"), None, 0, 30),
            event(day(2023, 1, 1), Some("222"), None, 0, 10),
            event(day(2023, 1, 1), Some("333"), Some("Ghost"), 0, 10),
        ];

        let rows = build_daily_progress(&catalog, &sessions);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].title, "Snow");
        assert_eq!(rows[0].daily_pages, 30);
        assert_eq!(rows[0].percent_complete, 10.0);
    }

    #[test]
    fn percent_complete_is_guarded() {
        assert_eq!(percent_complete(150, 0), 0.0);
        assert_eq!(percent_complete(100, 300), 33.33);
        assert_eq!(percent_complete(400, 300), 100.0);
        assert_eq!(percent_complete(-3, 300), 0.0);
    }

    #[test]
    fn gap_fill_produces_a_dense_axis() {
        let catalog = Catalog::new(vec![
            book("Snow", Some("111"), ReadingStatus::InProgress, 100),
            book("August", Some("222"), ReadingStatus::InProgress, 0),
        ]);
        let sessions = vec![
            event(day(2023, 1, 5), Some("111"), None, 20, 40),
            event(day(2023, 1, 1), Some("111"), None, 0, 20),
            event(day(2023, 1, 5), Some("222"), None, 0, 15),
        ];

        let rows = build_daily_progress(&catalog, &sessions);
        let dates: Vec<NaiveDate> = rows.iter().map(|r| r.date).collect();
        assert_eq!(
            dates,
            vec![
                day(2023, 1, 1),
                day(2023, 1, 2),
                day(2023, 1, 3),
                day(2023, 1, 4),
                day(2023, 1, 5),
                day(2023, 1, 5),
            ]
        );
        assert_eq!(rows[1], DailyProgress::gap(day(2023, 1, 2)));
        assert_eq!(rows[4].title, "Snow");
        assert_eq!(rows[5].title, "August");
        assert_eq!(rows[5].percent_complete, 0.0);
        assert!(rows.iter().all(|r| r.percent_complete.is_finite()));
    }

    #[test]
    fn untitled_entry_activity_is_not_a_gap() {
        let catalog = Catalog::new(vec![book("", Some("111"), ReadingStatus::InProgress, 300)]);
        let sessions = vec![event(day(2023, 1, 1), Some("111"), None, 0, 30)];

        let rows = build_daily_progress(&catalog, &sessions);
        assert_eq!(rows.len(), 1);
        assert!(!rows[0].is_gap());
        assert_eq!(rows[0].daily_pages, 30);
    }

    #[test]
    fn gap_fill_of_nothing_is_empty() {
        assert!(fill_calendar_gaps(Vec::new()).is_empty());
    }

    #[test]
    fn parse_sessions_drops_undated_rows() {
        let df = DataFrame::new(vec![
            Column::new(session::DATE.into(), &[Some("2023-01-01"), None, Some("soon")]),
            Column::new(session::ISBN13.into(), &[Some("111.0"), Some("222"), None]),
            Column::new(session::START_PAGE.into(), &[Some("0"), Some("1"), Some("2")]),
            Column::new(session::END_PAGE.into(), &[Some("12.0"), Some("3"), Some("4")]),
        ])
        .unwrap();

        let events = parse_sessions(&df).unwrap();
        assert_eq!(events, vec![event(day(2023, 1, 1), Some("111"), None, 0, 12)]);
    }
}
