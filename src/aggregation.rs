use std::collections::BTreeMap;

use tracing::info;

use crate::model::{round2, Catalog, YearlySummary};

/// Calendar norms for the per-period page rates (not year-actual lengths).
const MONTHS_PER_YEAR: f64 = 12.0;
const WEEKS_PER_YEAR: f64 = 52.0;
const DAYS_PER_YEAR: f64 = 365.0;

#[derive(Debug, Default)]
struct YearTotals {
    count: u32,
    sum_length: u64,
    sum_duration: i64,
}

/// One summary row per completion year of `Completed` books, ascending.
///
/// Books without a completion year are skipped; a year with no completions
/// has no row.
pub fn aggregate(catalog: &Catalog) -> Vec<YearlySummary> {
    let mut years: BTreeMap<i32, YearTotals> = BTreeMap::new();

    for entry in catalog.iter().filter(|e| e.is_completed()) {
        let Some(year) = entry.year_completed else {
            continue;
        };
        let totals = years.entry(year).or_default();
        totals.count += 1;
        totals.sum_length += u64::from(entry.length);
        totals.sum_duration += entry.duration;
    }

    let summary: Vec<YearlySummary> = years
        .into_iter()
        .map(|(year, t)| {
            let count = f64::from(t.count);
            let sum = t.sum_length as f64;
            YearlySummary {
                year,
                count: t.count,
                sum_length: t.sum_length,
                avg_length: round2(sum / count),
                avg_duration: round2(t.sum_duration as f64 / count),
                length_per_month: round2(sum / MONTHS_PER_YEAR),
                length_per_week: round2(sum / WEEKS_PER_YEAR),
                length_per_day: round2(sum / DAYS_PER_YEAR),
            }
        })
        .collect();

    info!(years = summary.len(), "aggregated yearly summary");
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CatalogEntry, ReadingStatus};
    use pretty_assertions::assert_eq;

    fn completed(title: &str, year: Option<i32>, length: u32, duration: i64) -> CatalogEntry {
        let mut e = CatalogEntry::new(title, "shelf");
        e.status = Some(ReadingStatus::Completed);
        e.year_completed = year;
        e.length = length;
        e.duration = duration;
        e
    }

    #[test]
    fn two_collections_same_year() {
        let mut a = completed("A", Some(2023), 300, 10);
        a.source_collection = "zsreglau".into();
        let mut b = completed("B", Some(2023), 300, 10);
        b.source_collection = "kindle".into();

        let summary = aggregate(&Catalog::new(vec![a, b]));

        assert_eq!(
            summary,
            vec![YearlySummary {
                year: 2023,
                count: 2,
                sum_length: 600,
                avg_length: 300.0,
                avg_duration: 10.0,
                length_per_month: 50.0,
                length_per_week: 11.54,
                length_per_day: 1.64,
            }]
        );
    }

    #[test]
    fn skips_unfinished_and_undated_books() {
        let mut reading = completed("Reading", Some(2022), 500, 3);
        reading.status = Some(ReadingStatus::InProgress);
        let catalog = Catalog::new(vec![
            completed("Late", Some(2024), 100, 2),
            completed("Undated", None, 900, 0),
            reading,
            completed("Early", Some(2021), 200, 5),
            completed("Early too", Some(2021), 101, 6),
        ]);

        let summary = aggregate(&catalog);

        let years: Vec<i32> = summary.iter().map(|s| s.year).collect();
        assert_eq!(years, vec![2021, 2024]);
        assert_eq!(summary[0].count, 2);
        assert_eq!(summary[0].avg_length, 150.5);
        assert_eq!(summary[0].avg_duration, 5.5);
    }

    #[test]
    fn empty_catalog_has_no_rows() {
        assert!(aggregate(&Catalog::default()).is_empty());
    }
}
