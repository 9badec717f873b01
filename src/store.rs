use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use log::{debug, info};
use once_cell::sync::Lazy;
use rusqlite::{Connection, Row, params};
use serde::Serialize;

use crate::error::IngestError;
use crate::record::MatchRecord;
use crate::schema::MATCH_FIELDS;

pub const MATCHES_TABLE: &str = "matches";
pub const RESULTS_PAGE_SIZE: usize = 20;
/// League filter value meaning "do not filter by league".
pub const ALL_LEAGUES: &str = "All leagues";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Stored columns in registry order; `decode_stored_match` reads them back
/// positionally after `id`.
static MATCH_COLUMNS: Lazy<String> = Lazy::new(|| MATCH_FIELDS.join(", "));

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredMatch {
    pub id: i64,
    #[serde(flatten)]
    pub record: MatchRecord,
}

pub fn open_db(path: &Path) -> Result<Connection, IngestError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let conn = Connection::open(path)?;
    init_schema(&conn)?;
    debug!("opened match store {}", path.display());
    Ok(conn)
}

pub fn open_in_memory() -> Result<Connection, IngestError> {
    let conn = Connection::open_in_memory()?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<(), IngestError> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        CREATE TABLE IF NOT EXISTS matches (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date TEXT NOT NULL,
            league TEXT NOT NULL,
            season INTEGER NOT NULL,
            team1 TEXT NOT NULL,
            team2 TEXT NOT NULL,
            spi1 REAL NOT NULL,
            spi2 REAL NOT NULL,
            prob1 REAL NOT NULL,
            prob2 REAL NOT NULL,
            probtie REAL NOT NULL,
            proj_score1 REAL NOT NULL,
            proj_score2 REAL NOT NULL,
            score1 INTEGER NULL,
            score2 INTEGER NULL
        );
        CREATE INDEX IF NOT EXISTS idx_matches_date ON matches(date);
        CREATE INDEX IF NOT EXISTS idx_matches_league ON matches(league);
        "#,
    )?;
    Ok(())
}

/// Replaces every stored match with `records` in one transaction: clear the
/// table, reset its id sequence, insert the batch. Returns the inserted count.
/// On error nothing is committed and the previous rows stay in place.
pub fn replace_matches(
    conn: &mut Connection,
    records: &[MatchRecord],
) -> Result<usize, IngestError> {
    let tx = conn.transaction()?;

    let existing: i64 = tx.query_row("SELECT COUNT(*) FROM matches", [], |row| row.get(0))?;
    if existing > 0 {
        tx.execute("DELETE FROM matches", [])?;
        debug!("cleared {existing} stored matches");
    }
    reset_sequence(&tx)?;

    {
        let mut stmt = tx.prepare(&format!(
            "INSERT INTO matches ({}) VALUES ({})",
            MATCH_COLUMNS.as_str(),
            placeholders(MATCH_FIELDS.len())
        ))?;
        for m in records {
            stmt.execute(params![
                m.date.format(DATE_FORMAT).to_string(),
                m.league,
                m.season,
                m.team1,
                m.team2,
                m.spi1,
                m.spi2,
                m.prob1,
                m.prob2,
                m.probtie,
                m.proj_score1,
                m.proj_score2,
                m.score1,
                m.score2,
            ])?;
        }
    }

    tx.commit()?;
    info!("stored {} matches", records.len());
    Ok(records.len())
}

fn placeholders(count: usize) -> String {
    (1..=count)
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Forgets the AUTOINCREMENT high-water mark so the next insert gets id 1.
fn reset_sequence(conn: &Connection) -> Result<(), IngestError> {
    conn.execute(
        "DELETE FROM sqlite_sequence WHERE name = ?1",
        params![MATCHES_TABLE],
    )?;
    Ok(())
}

pub fn count_matches(conn: &Connection) -> Result<usize, IngestError> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM matches", [], |row| row.get(0))?;
    Ok(usize::try_from(count).unwrap_or_default())
}

pub fn load_all(conn: &Connection) -> Result<Vec<StoredMatch>, IngestError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT id, {} FROM matches ORDER BY id ASC",
        MATCH_COLUMNS.as_str()
    ))?;
    let rows = stmt.query_map([], decode_stored_match)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

pub fn latest_match_date(conn: &Connection) -> Result<Option<NaiveDate>, IngestError> {
    let raw = conn.query_row("SELECT MAX(date) FROM matches", [], |row| {
        row.get::<_, Option<String>>(0)
    })?;
    Ok(raw.and_then(|s| NaiveDate::parse_from_str(&s, DATE_FORMAT).ok()))
}

fn decode_stored_match(row: &Row<'_>) -> rusqlite::Result<StoredMatch> {
    let raw_date: String = row.get(1)?;
    let date = NaiveDate::parse_from_str(&raw_date, DATE_FORMAT).map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(err))
    })?;
    Ok(StoredMatch {
        id: row.get(0)?,
        record: MatchRecord {
            date,
            league: row.get(2)?,
            season: row.get(3)?,
            team1: row.get(4)?,
            team2: row.get(5)?,
            spi1: row.get(6)?,
            spi2: row.get(7)?,
            prob1: row.get(8)?,
            prob2: row.get(9)?,
            probtie: row.get(10)?,
            proj_score1: row.get(11)?,
            proj_score2: row.get(12)?,
            score1: row.get(13)?,
            score2: row.get(14)?,
        },
    })
}

/// Filters for the results listing. `league` equal to [`ALL_LEAGUES`] or
/// `None` means every league.
#[derive(Debug, Clone, Default)]
pub struct ResultsFilter {
    pub date: Option<NaiveDate>,
    pub league: Option<String>,
}

impl ResultsFilter {
    fn league(&self) -> Option<&str> {
        self.league
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty() && *l != ALL_LEAGUES)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResultsPage {
    pub page: usize,
    pub num_pages: usize,
    pub total: usize,
    pub matches: Vec<StoredMatch>,
}

/// One page of finished matches. Out-of-range pages clamp to the first or
/// last page; an empty result set still reports page 1 of 1.
pub fn load_results(
    conn: &Connection,
    filter: &ResultsFilter,
    page: usize,
) -> Result<ResultsPage, IngestError> {
    let date = filter.date.map(|d| d.format(DATE_FORMAT).to_string());
    let league = filter.league();
    let where_clause = "score1 IS NOT NULL AND score2 IS NOT NULL \
         AND (?1 IS NULL OR date = ?1) \
         AND (?2 IS NULL OR league = ?2)";

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM matches WHERE {where_clause}"),
        params![date, league],
        |row| row.get(0),
    )?;
    let total = usize::try_from(total).unwrap_or_default();
    let num_pages = total.div_ceil(RESULTS_PAGE_SIZE).max(1);
    let page = page.clamp(1, num_pages);
    let offset = (page - 1) * RESULTS_PAGE_SIZE;

    let mut stmt = conn.prepare(&format!(
        "SELECT id, {} FROM matches WHERE {where_clause}
         ORDER BY id ASC LIMIT ?3 OFFSET ?4",
        MATCH_COLUMNS.as_str()
    ))?;
    let rows = stmt.query_map(
        params![date, league, RESULTS_PAGE_SIZE as i64, offset as i64],
        decode_stored_match,
    )?;
    let mut matches = Vec::new();
    for row in rows {
        matches.push(row?);
    }

    Ok(ResultsPage {
        page,
        num_pages,
        total,
        matches,
    })
}

pub fn default_db_path() -> Option<PathBuf> {
    crate::config::app_cache_dir().map(|dir| dir.join("matches.sqlite"))
}
