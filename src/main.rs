use anyhow::{Context, Result};
use log::info;

use sokkai::config::Config;
use sokkai::{IngestRun, store};

fn setup_logging() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Warn)
        .parse_default_env()
        .init();
}

fn main() -> Result<()> {
    setup_logging();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let mut config = Config::load()?;
    config.apply_args(&args)?;
    info!("populating matches into {}", config.db_path.display());

    let mut conn = store::open_db(&config.db_path)
        .with_context(|| format!("open sqlite db {}", config.db_path.display()))?;

    let source = config.source();
    let mut run = IngestRun::new(source.as_ref(), config.mode);
    let outcome = run.execute(&mut conn, |step| println!("{step}"));

    let summary = match outcome {
        Ok(summary) => summary,
        Err(err) => {
            println!("Populating matches failed ({})", run.state());
            return Err(err).context("match ingest failed");
        }
    };

    println!("Finished populating matches in database!");
    println!("DB: {}", config.db_path.display());
    println!("Source: {}", summary.source);
    println!("Mode: {}", summary.mode);
    println!(
        "Rows: fetched={} kept={} complete={}",
        summary.rows_fetched, summary.rows_after_filter, summary.rows_after_drop
    );
    println!("Matches inserted: {}", summary.inserted);
    if let Some(latest) = store::latest_match_date(&conn)? {
        println!("Latest match date: {latest}");
    }

    Ok(())
}
