pub mod config;
pub mod error;
pub mod fetch;
pub mod http_client;
pub mod pipeline;
pub mod project;
pub mod record;
pub mod schema;
pub mod store;
pub mod table;
pub mod transform;

pub use error::IngestError;
pub use pipeline::{IngestRun, IngestSummary, RunState, Step};
pub use record::MatchRecord;
pub use transform::IngestMode;
