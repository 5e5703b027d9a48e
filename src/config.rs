//! Pipeline configuration.
//!
//! A JSON document naming every input and output:
//!
//! ```json
//! {
//!   "input_paths": {
//!     "zsreglau": "library_zsreglau.csv",
//!     "kindle": "library_kindle.csv",
//!     "daily": "dailies.csv"
//!   },
//!   "corrections": "corrections.json",
//!   "output_paths": {
//!     "catalog": "out/library.csv",
//!     "yearly": "out/aggregates.csv",
//!     "daily": "out/dailies.csv",
//!     "views": "out/views"
//!   }
//! }
//! ```
//!
//! `input_paths` order is the catalog concatenation order. The reserved
//! `daily` key names the session log. Relative paths resolve against the
//! directory holding the config file.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::LedgerError;
use crate::schema::aliases;

/// One named catalog export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePath {
    pub name: String,
    pub path: PathBuf,
}

impl SourcePath {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OutputPaths {
    pub catalog: PathBuf,
    pub yearly: PathBuf,
    pub daily: PathBuf,
    /// Directory for the per-year view tables. Not written when absent.
    #[serde(default)]
    pub views: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub collections: Vec<SourcePath>,
    pub daily: PathBuf,
    pub corrections: Option<PathBuf>,
    pub outputs: OutputPaths,
}

#[derive(Deserialize)]
struct RawConfig {
    input_paths: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    corrections: Option<PathBuf>,
    output_paths: OutputPaths,
}

impl PipelineConfig {
    pub fn load(path: &Path) -> Result<Self, LedgerError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            LedgerError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Self::from_json_str(&text, base)
    }

    pub fn from_json_str(text: &str, base_dir: &Path) -> Result<Self, LedgerError> {
        let raw: RawConfig = serde_json::from_str(text)?;
        let resolve = |p: &Path| -> PathBuf {
            if p.is_absolute() {
                p.to_path_buf()
            } else {
                base_dir.join(p)
            }
        };

        let mut collections = Vec::new();
        let mut daily = None;
        for (name, value) in &raw.input_paths {
            let path = value.as_str().ok_or_else(|| {
                LedgerError::Config(format!("input_paths.{name} must be a string path"))
            })?;
            let path = resolve(Path::new(path));
            if name == aliases::DAILY_SOURCE {
                daily = Some(path);
            } else {
                collections.push(SourcePath::new(name.as_str(), path));
            }
        }

        let daily = daily.ok_or_else(|| {
            LedgerError::Config(format!(
                "input_paths.{} (session log) is required",
                aliases::DAILY_SOURCE
            ))
        })?;
        if collections.is_empty() {
            return Err(LedgerError::Config(
                "input_paths must name at least one catalog collection".into(),
            ));
        }

        let outputs = OutputPaths {
            catalog: resolve(&raw.output_paths.catalog),
            yearly: resolve(&raw.output_paths.yearly),
            daily: resolve(&raw.output_paths.daily),
            views: raw.output_paths.views.as_deref().map(resolve),
        };

        Ok(Self {
            collections,
            daily,
            corrections: raw.corrections.as_deref().map(resolve),
            outputs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const CONFIG: &str = r#"{
        "input_paths": {
            "zsreglau": "library_zsreglau.csv",
            "kindle": "/abs/library_kindle.csv",
            "daily": "dailies.csv",
            "borrowed": "library_borrowed.csv"
        },
        "output_paths": {
            "catalog": "out/library.csv",
            "yearly": "out/aggregates.csv",
            "daily": "out/dailies.csv"
        }
    }"#;

    #[test]
    fn keeps_source_order_and_resolves_paths() {
        let config = PipelineConfig::from_json_str(CONFIG, Path::new("/data")).unwrap();

        let names: Vec<&str> = config.collections.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["zsreglau", "kindle", "borrowed"]);
        assert_eq!(config.collections[0].path, PathBuf::from("/data/library_zsreglau.csv"));
        assert_eq!(config.collections[1].path, PathBuf::from("/abs/library_kindle.csv"));
        assert_eq!(config.daily, PathBuf::from("/data/dailies.csv"));
        assert_eq!(config.corrections, None);
        assert_eq!(config.outputs.views, None);
        assert_eq!(config.outputs.yearly, PathBuf::from("/data/out/aggregates.csv"));
    }

    #[test]
    fn daily_source_is_required() {
        let text = r#"{
            "input_paths": {"kindle": "k.csv"},
            "output_paths": {"catalog": "c.csv", "yearly": "y.csv", "daily": "d.csv"}
        }"#;
        let err = PipelineConfig::from_json_str(text, Path::new(".")).unwrap_err();
        assert!(matches!(err, LedgerError::Config(_)));
    }

    #[test]
    fn non_string_path_is_rejected() {
        let text = r#"{
            "input_paths": {"kindle": 3, "daily": "d.csv"},
            "output_paths": {"catalog": "c.csv", "yearly": "y.csv", "daily": "d.csv"}
        }"#;
        assert!(PipelineConfig::from_json_str(text, Path::new(".")).is_err());
    }
}
