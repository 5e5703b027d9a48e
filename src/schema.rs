/// Column-name constants for the reading-ledger tables.
/// Single source of truth for output column order - also exported to Python.

// ── Catalog columns ─────────────────────────────────────────────────────────
pub mod catalog {
    pub const TITLE: &str = "title";
    pub const CREATORS: &str = "creators";
    pub const PUBLISHER: &str = "publisher";
    pub const PUBLISH_DATE: &str = "publish_date";
    pub const ISBN13: &str = "isbn13";
    pub const LENGTH: &str = "length";
    pub const STATUS: &str = "status";
    pub const BEGAN: &str = "began";
    pub const COMPLETED: &str = "completed";
    pub const ADDED: &str = "added";
    pub const SOURCE_COLLECTION: &str = "source_collection";
    pub const DURATION: &str = "duration";
    pub const YEAR_COMPLETED: &str = "year_completed";

    pub const ALL: [&str; 13] = [
        TITLE,
        CREATORS,
        PUBLISHER,
        PUBLISH_DATE,
        ISBN13,
        LENGTH,
        STATUS,
        BEGAN,
        COMPLETED,
        ADDED,
        SOURCE_COLLECTION,
        DURATION,
        YEAR_COMPLETED,
    ];
}

// ── Session log columns ─────────────────────────────────────────────────────
pub mod session {
    pub const DATE: &str = "date";
    pub const ISBN13: &str = "isbn13";
    pub const TITLE: &str = "title";
    pub const START_PAGE: &str = "start_page";
    pub const END_PAGE: &str = "end_page";
}

// ── Daily progress columns ──────────────────────────────────────────────────
pub mod daily {
    pub const DATE: &str = "date";
    pub const TITLE: &str = "title";
    pub const ISBN13: &str = "isbn13";
    pub const DAILY_PAGES: &str = "daily_pages";
    pub const PERCENT_COMPLETE: &str = "percent_complete";
    pub const LENGTH: &str = "length";

    pub const ALL: [&str; 6] = [DATE, TITLE, ISBN13, DAILY_PAGES, PERCENT_COMPLETE, LENGTH];
}

// ── Yearly summary columns ──────────────────────────────────────────────────
pub mod yearly {
    pub const YEAR: &str = "year";
    pub const COUNT: &str = "count";
    pub const SUM_LENGTH: &str = "sum_length";
    pub const AVG_LENGTH: &str = "avg_length";
    pub const AVG_DURATION: &str = "avg_duration";
    pub const LENGTH_PER_MONTH: &str = "length_per_month";
    pub const LENGTH_PER_WEEK: &str = "length_per_week";
    pub const LENGTH_PER_DAY: &str = "length_per_day";

    pub const ALL: [&str; 8] = [
        YEAR,
        COUNT,
        SUM_LENGTH,
        AVG_LENGTH,
        AVG_DURATION,
        LENGTH_PER_MONTH,
        LENGTH_PER_WEEK,
        LENGTH_PER_DAY,
    ];
}

// ── Reading calendar (heatmap) columns ──────────────────────────────────────
pub mod calendar {
    pub const DATE: &str = "date";
    pub const WEEK: &str = "week";
    pub const WEEKDAY: &str = "weekday";
    pub const DAILY_PAGES: &str = "daily_pages";
}

// ── Books-read-in-year columns ──────────────────────────────────────────────
pub mod books {
    pub const TITLE: &str = "title";
    pub const CREATORS: &str = "creators";
    pub const LENGTH: &str = "length";
    pub const BEGAN: &str = "began";
    pub const COMPLETED: &str = "completed";
    pub const PERCENT_COMPLETE: &str = "percent_complete";
    pub const DURATION: &str = "duration";
}

// ── Status values ───────────────────────────────────────────────────────────
pub mod status {
    pub const COMPLETED: &str = "Completed";
    pub const IN_PROGRESS: &str = "In progress";
}

// ── Source aliases ──────────────────────────────────────────────────────────
pub mod aliases {
    /// Export column name → canonical column name.
    pub const COLUMN_ALIASES: [(&str, &str); 1] = [("ean_isbn13", super::catalog::ISBN13)];

    /// Reserved `input_paths` key naming the session log.
    pub const DAILY_SOURCE: &str = "daily";
}
