use thiserror::Error;

use crate::pipeline::RunState;
use crate::schema::{FieldType, SchemaError};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Error downloading match data")]
    Download {
        #[source]
        source: reqwest::Error,
    },

    #[error("Fields [{}] not found in match data", .0.join(", "))]
    FieldsNotFound(Vec<String>),

    #[error("cannot coerce {value:?} to {expected} in field {field} (row {row})")]
    TypeCoercion {
        field: String,
        row: usize,
        value: String,
        expected: FieldType,
    },

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("malformed match csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("match store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("read match data: {0}")]
    Io(#[from] std::io::Error),

    #[error("ingest run must start from idle, current state is {0}")]
    RunNotIdle(RunState),
}

impl IngestError {
    pub(crate) fn download(source: reqwest::Error) -> Self {
        Self::Download { source }
    }
}
