use std::path::Path;

use pyo3::prelude::*;
use pyo3::types::PyModule;
use pyo3_polars::PyDataFrame;

use crate::config::PipelineConfig;
use crate::error::LedgerError;
use crate::pipeline::{self, PipelineOutput};
use crate::schema;
use crate::sink;
use crate::views;

#[pyclass]
pub struct ReadingLedger {
    config: PipelineConfig,
    output: Option<PipelineOutput>,
}

#[pymethods]
impl ReadingLedger {
    #[new]
    fn new(config_path: String) -> PyResult<Self> {
        let config = PipelineConfig::load(Path::new(&config_path))?;
        Ok(Self {
            config,
            output: None,
        })
    }

    /// Load every source and recompute all tables. Nothing is written.
    fn run(&mut self) -> PyResult<()> {
        self.output = Some(pipeline::run(&self.config)?);
        Ok(())
    }

    /// Write the output tables. Returns the paths that could not be written.
    #[pyo3(signature = (with_views=true))]
    fn write_outputs(&self, with_views: bool) -> PyResult<Vec<String>> {
        let output = self.output()?;
        let report = sink::persist(output, &self.config.outputs, with_views);
        Ok(report
            .failed
            .iter()
            .map(|(path, _)| path.display().to_string())
            .collect())
    }

    // ── Tables ──────────────────────────────────────────────────────────────

    #[getter]
    fn catalog(&self) -> PyResult<PyDataFrame> {
        Ok(PyDataFrame(self.output()?.catalog_frame()?))
    }

    #[getter]
    fn yearly(&self) -> PyResult<PyDataFrame> {
        Ok(PyDataFrame(self.output()?.yearly_frame()?))
    }

    #[getter]
    fn daily(&self) -> PyResult<PyDataFrame> {
        Ok(PyDataFrame(self.output()?.daily_frame()?))
    }

    // ── Per-year views ──────────────────────────────────────────────────────

    fn active_years(&self) -> PyResult<Vec<i32>> {
        Ok(views::active_years(&self.output()?.daily))
    }

    fn completed_in_year(&self, year: i32) -> PyResult<PyDataFrame> {
        Ok(PyDataFrame(self.output()?.completed_frame(year)?))
    }

    fn calendar(&self, year: i32) -> PyResult<PyDataFrame> {
        Ok(PyDataFrame(self.output()?.calendar_frame(year)?))
    }

    fn books_read_in_year(&self, year: i32) -> PyResult<PyDataFrame> {
        Ok(PyDataFrame(self.output()?.books_frame(year)?))
    }

    /// Titles still missing each field after corrections, keyed by column name.
    fn missing_fields(&self) -> PyResult<Vec<(String, String)>> {
        Ok(self
            .output()?
            .report
            .issues()
            .iter()
            .map(|issue| (issue.field.column().to_string(), issue.title.clone()))
            .collect())
    }
}

impl ReadingLedger {
    fn output(&self) -> Result<&PipelineOutput, LedgerError> {
        self.output
            .as_ref()
            .ok_or_else(|| LedgerError::NotLoaded("call run() first".into()))
    }
}

/// Export schema constants as Python submodules
fn add_schema_exports(m: &Bound<'_, PyModule>) -> PyResult<()> {
    let catalog = PyModule::new(m.py(), "catalog")?;
    for name in schema::catalog::ALL {
        catalog.add(name.to_uppercase(), name)?;
    }
    m.add_submodule(&catalog)?;

    let daily = PyModule::new(m.py(), "daily")?;
    for name in schema::daily::ALL {
        daily.add(name.to_uppercase(), name)?;
    }
    m.add_submodule(&daily)?;

    let yearly = PyModule::new(m.py(), "yearly")?;
    for name in schema::yearly::ALL {
        yearly.add(name.to_uppercase(), name)?;
    }
    m.add_submodule(&yearly)?;

    let books = PyModule::new(m.py(), "books")?;
    books.add("TITLE", schema::books::TITLE)?;
    books.add("CREATORS", schema::books::CREATORS)?;
    books.add("LENGTH", schema::books::LENGTH)?;
    books.add("BEGAN", schema::books::BEGAN)?;
    books.add("COMPLETED", schema::books::COMPLETED)?;
    books.add("PERCENT_COMPLETE", schema::books::PERCENT_COMPLETE)?;
    books.add("DURATION", schema::books::DURATION)?;
    m.add_submodule(&books)?;

    let calendar = PyModule::new(m.py(), "calendar")?;
    calendar.add("DATE", schema::calendar::DATE)?;
    calendar.add("WEEK", schema::calendar::WEEK)?;
    calendar.add("WEEKDAY", schema::calendar::WEEKDAY)?;
    calendar.add("DAILY_PAGES", schema::calendar::DAILY_PAGES)?;
    m.add_submodule(&calendar)?;

    let status = PyModule::new(m.py(), "status")?;
    status.add("COMPLETED", schema::status::COMPLETED)?;
    status.add("IN_PROGRESS", schema::status::IN_PROGRESS)?;
    m.add_submodule(&status)?;

    Ok(())
}

#[pymodule]
fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<ReadingLedger>()?;
    add_schema_exports(m)?;
    Ok(())
}
