use std::fmt;

use log::info;
use rusqlite::Connection;

use crate::error::IngestError;
use crate::fetch::MatchSource;
use crate::project::project;
use crate::schema;
use crate::store::replace_matches;
use crate::transform::{IngestMode, transform_reporting};

/// Lifecycle of one ingest run. Any stage failure ends in `Failed`; a run
/// is only started again after [`IngestRun::reset`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Fetching,
    Projecting,
    Transforming,
    Loading,
    Done,
    Failed(String),
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Idle => f.write_str("idle"),
            RunState::Fetching => f.write_str("fetching"),
            RunState::Projecting => f.write_str("projecting"),
            RunState::Transforming => f.write_str("transforming"),
            RunState::Loading => f.write_str("loading"),
            RunState::Done => f.write_str("done"),
            RunState::Failed(err) => write!(f, "failed: {err}"),
        }
    }
}

/// Operator-facing progress, reported before each step starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Downloading,
    ExtractingColumns,
    FilteringFinished,
    DroppingMissing,
    SettingTypes,
    GeneratingRecords,
    Inserting,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let line = match self {
            Step::Downloading => "Downloading match data...",
            Step::ExtractingColumns => "Extracting match columns...",
            Step::FilteringFinished => "Filtering finished matches...",
            Step::DroppingMissing => "Dropping NaN values...",
            Step::SettingTypes => "Setting match column types...",
            Step::GeneratingRecords => "Generating match instances...",
            Step::Inserting => "Inserting matches in database...",
        };
        f.write_str(line)
    }
}

#[derive(Debug, Clone)]
pub struct IngestSummary {
    pub mode: IngestMode,
    pub source: String,
    pub rows_fetched: usize,
    pub rows_after_filter: usize,
    pub rows_after_drop: usize,
    pub inserted: usize,
}

pub struct IngestRun<'a> {
    source: &'a dyn MatchSource,
    mode: IngestMode,
    state: RunState,
}

impl<'a> IngestRun<'a> {
    pub fn new(source: &'a dyn MatchSource, mode: IngestMode) -> Self {
        Self {
            source,
            mode,
            state: RunState::Idle,
        }
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn reset(&mut self) {
        self.state = RunState::Idle;
    }

    /// Fetch, project, transform and load. Only the load touches `conn`, and
    /// it does so in a single transaction.
    pub fn execute(
        &mut self,
        conn: &mut Connection,
        mut progress: impl FnMut(Step),
    ) -> Result<IngestSummary, IngestError> {
        if self.state != RunState::Idle {
            return Err(IngestError::RunNotIdle(self.state.clone()));
        }

        let result = self.run_stages(conn, &mut progress);
        self.state = match &result {
            Ok(_) => RunState::Done,
            Err(err) => RunState::Failed(err.to_string()),
        };
        result
    }

    fn run_stages(
        &mut self,
        conn: &mut Connection,
        progress: &mut dyn FnMut(Step),
    ) -> Result<IngestSummary, IngestError> {
        schema::validate()?;

        self.state = RunState::Fetching;
        progress(Step::Downloading);
        let raw = self.source.fetch_table()?;
        let rows_fetched = raw.row_count();
        info!("fetched {rows_fetched} rows from {}", self.source.describe());

        self.state = RunState::Projecting;
        progress(Step::ExtractingColumns);
        let table = project(&raw)?;
        drop(raw);

        self.state = RunState::Transforming;
        let transformed = transform_reporting(table, self.mode, progress)?;
        let records = transformed.records;
        info!(
            "transformed {rows_fetched} rows into {} match records ({} mode)",
            records.len(),
            self.mode
        );

        self.state = RunState::Loading;
        progress(Step::Inserting);
        let inserted = replace_matches(conn, &records)?;

        Ok(IngestSummary {
            mode: self.mode,
            source: self.source.describe(),
            rows_fetched,
            rows_after_filter: transformed.rows_after_filter,
            rows_after_drop: transformed.rows_after_drop,
            inserted,
        })
    }
}
