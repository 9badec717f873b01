use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use log::{debug, info};

use crate::error::IngestError;
use crate::http_client::http_client;
use crate::table::{Column, RawValue, Table};

pub const MATCH_DATA_URL: &str =
    "https://projects.fivethirtyeight.com/soccer-api/club/spi_matches.csv";

/// Where the ingest pipeline reads its match table from.
pub trait MatchSource {
    fn fetch_table(&self) -> Result<Table, IngestError>;

    /// Short label for progress output.
    fn describe(&self) -> String;
}

#[derive(Debug, Clone)]
pub struct HttpSource {
    pub url: String,
    pub timeout: Duration,
}

impl HttpSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            timeout,
        }
    }
}

impl MatchSource for HttpSource {
    fn fetch_table(&self) -> Result<Table, IngestError> {
        let body = download_csv(&self.url, self.timeout)?;
        parse_csv(&body)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// Reads match CSV from a local file instead of the network.
#[derive(Debug, Clone)]
pub struct FileSource {
    pub path: PathBuf,
}

impl MatchSource for FileSource {
    fn fetch_table(&self) -> Result<Table, IngestError> {
        let body = fs::read_to_string(&self.path)?;
        parse_csv(&body)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[derive(Debug, Clone)]
pub struct StaticSource {
    pub csv: String,
}

impl StaticSource {
    pub fn new(csv: impl Into<String>) -> Self {
        Self { csv: csv.into() }
    }
}

impl MatchSource for StaticSource {
    fn fetch_table(&self) -> Result<Table, IngestError> {
        parse_csv(&self.csv)
    }

    fn describe(&self) -> String {
        "inline csv".to_string()
    }
}

fn download_csv(url: &str, timeout: Duration) -> Result<String, IngestError> {
    let client = http_client(timeout)?;
    debug!("GET {url}");
    let resp = client
        .get(url)
        .send()
        .and_then(|resp| resp.error_for_status())
        .map_err(IngestError::download)?;
    let body = resp.text().map_err(IngestError::download)?;
    info!("downloaded {} bytes of match data", body.len());
    Ok(body)
}

pub fn parse_csv(raw: &str) -> Result<Table, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(raw.as_bytes());

    let headers = reader.headers()?.clone();
    let mut columns = headers
        .iter()
        .map(|name| Column::new(name.trim(), Vec::new()))
        .collect::<Vec<_>>();

    for record in reader.records() {
        let record = record?;
        for (column, cell) in columns.iter_mut().zip(record.iter()) {
            column.values.push(RawValue::from_cell(cell));
        }
    }

    let table = Table::new(columns);
    debug!(
        "parsed match csv: {} columns, {} rows",
        table.columns().len(),
        table.row_count()
    );
    Ok(table)
}
