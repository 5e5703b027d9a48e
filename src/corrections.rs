//! Hand-curated fixes for catalog fields the exports leave blank.
//!
//! The corrections document is JSON with four optional sections, each mapping
//! an exact title to a replacement value:
//!
//! ```json
//! {
//!   "missing_lengths": { "The Hobbit": 317 },
//!   "missing_isbn13": { "Snow": "9780375706868" },
//!   "missing_publishers": { "Snow": "Vintage" },
//!   "missing_publish_dates": { "Snow": "2005-08-09" }
//! }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};

use crate::error::LedgerError;
use crate::model::CatalogEntry;
use crate::normalize::normalize_isbn13;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Corrections {
    #[serde(default)]
    pub missing_lengths: BTreeMap<String, u32>,
    #[serde(default, deserialize_with = "isbn_map")]
    pub missing_isbn13: BTreeMap<String, String>,
    #[serde(default)]
    pub missing_publishers: BTreeMap<String, String>,
    #[serde(default)]
    pub missing_publish_dates: BTreeMap<String, NaiveDate>,
}

/// Every override that applies to one title.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Correction {
    pub length: Option<u32>,
    pub isbn13: Option<String>,
    pub publisher: Option<String>,
    pub publish_date: Option<NaiveDate>,
}

impl Corrections {
    pub fn load(path: &Path) -> Result<Self, LedgerError> {
        if !path.is_file() {
            return Err(LedgerError::SourceNotFound {
                collection: "corrections".into(),
                path: path.to_path_buf(),
            });
        }
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self, LedgerError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn is_empty(&self) -> bool {
        self.missing_lengths.is_empty()
            && self.missing_isbn13.is_empty()
            && self.missing_publishers.is_empty()
            && self.missing_publish_dates.is_empty()
    }

    /// Fold the four sections into a single title-keyed lookup.
    pub fn by_title(&self) -> HashMap<&str, Correction> {
        let mut index: HashMap<&str, Correction> = HashMap::new();

        for (title, length) in &self.missing_lengths {
            index.entry(title.trim()).or_default().length = Some(*length);
        }
        for (title, isbn) in &self.missing_isbn13 {
            index.entry(title.trim()).or_default().isbn13 = normalize_isbn13(isbn);
        }
        for (title, publisher) in &self.missing_publishers {
            index.entry(title.trim()).or_default().publisher = Some(publisher.clone());
        }
        for (title, date) in &self.missing_publish_dates {
            index.entry(title.trim()).or_default().publish_date = Some(*date);
        }

        index
    }
}

impl Correction {
    /// Override fields in order: length, isbn13, publisher, publish_date.
    pub fn apply(&self, entry: &mut CatalogEntry) {
        if let Some(length) = self.length {
            entry.length = length;
        }
        if let Some(isbn) = &self.isbn13 {
            entry.isbn13 = Some(isbn.clone());
        }
        if let Some(publisher) = &self.publisher {
            entry.publisher = Some(publisher.clone());
        }
        if let Some(date) = self.publish_date {
            entry.publish_date = Some(date);
        }
    }
}

/// ISBNs may be written as JSON strings or numbers.
fn isbn_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IsbnValue {
        Text(String),
        Number(serde_json::Number),
    }

    let raw = BTreeMap::<String, IsbnValue>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|(title, value)| {
            let isbn = match value {
                IsbnValue::Text(s) => s,
                IsbnValue::Number(n) => n.to_string(),
            };
            (title, isbn)
        })
        .collect())
}
