use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};

use crate::fetch::{FileSource, HttpSource, MATCH_DATA_URL, MatchSource};
use crate::transform::IngestMode;

const CACHE_DIR: &str = "sokkai";
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct Config {
    pub data_url: String,
    pub data_file: Option<PathBuf>,
    pub db_path: PathBuf,
    pub fetch_timeout: Duration,
    pub mode: IngestMode,
}

impl Config {
    /// Reads `.env.local` then `.env`, then the process environment.
    pub fn load() -> Result<Self> {
        let _ = dotenvy::from_filename(".env.local");
        let _ = dotenvy::from_filename(".env");
        Self::from_env()
    }

    pub fn from_env() -> Result<Self> {
        let data_url =
            env_nonempty("MATCH_DATA_URL").unwrap_or_else(|| MATCH_DATA_URL.to_string());
        let db_path = env_nonempty("MATCHES_DB")
            .map(PathBuf::from)
            .or_else(crate::store::default_db_path)
            .context("unable to resolve sqlite path (set MATCHES_DB)")?;
        let fetch_timeout = env_nonempty("MATCH_FETCH_TIMEOUT_SECS")
            .and_then(|raw| raw.parse::<u64>().ok())
            .unwrap_or(DEFAULT_FETCH_TIMEOUT_SECS)
            .max(1);
        let mode = match env_nonempty("MATCH_INGEST_MODE") {
            Some(raw) => IngestMode::parse(&raw).ok_or_else(|| {
                anyhow!("invalid MATCH_INGEST_MODE {raw:?} (expected finished|all)")
            })?,
            None => IngestMode::default(),
        };

        Ok(Self {
            data_url,
            data_file: None,
            db_path,
            fetch_timeout: Duration::from_secs(fetch_timeout),
            mode,
        })
    }

    /// Applies `--db`, `--url`, `--file`, `--timeout` (each as `--flag value`
    /// or `--flag=value`) and `--all` on top of the environment.
    pub fn apply_args(&mut self, args: &[String]) -> Result<()> {
        if let Some(db) = flag_value(args, "--db") {
            self.db_path = PathBuf::from(db);
        }
        if let Some(url) = flag_value(args, "--url") {
            self.data_url = url;
        }
        if let Some(file) = flag_value(args, "--file") {
            self.data_file = Some(PathBuf::from(file));
        }
        if let Some(raw) = flag_value(args, "--timeout") {
            let secs = raw
                .parse::<u64>()
                .with_context(|| format!("invalid --timeout {raw:?}"))?;
            self.fetch_timeout = Duration::from_secs(secs.max(1));
        }
        if args.iter().any(|arg| arg == "--all") {
            self.mode = IngestMode::All;
        }
        Ok(())
    }

    pub fn source(&self) -> Box<dyn MatchSource> {
        match &self.data_file {
            Some(path) => Box::new(FileSource { path: path.clone() }),
            None => Box::new(HttpSource::new(self.data_url.clone(), self.fetch_timeout)),
        }
    }
}

/// Value of `--name value` or `--name=value`, ignoring blanks.
pub fn flag_value(args: &[String], name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == name {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(next.trim().to_string());
            }
        }
    }
    None
}

pub fn app_cache_dir() -> Option<PathBuf> {
    // Prefer XDG cache.
    if let Ok(base) = std::env::var("XDG_CACHE_HOME") {
        if !base.trim().is_empty() {
            return Some(PathBuf::from(base).join(CACHE_DIR));
        }
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(CACHE_DIR))
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
