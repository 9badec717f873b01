use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;

use sokkai::config::{Config, flag_value};
use sokkai::store::{self, ALL_LEAGUES, ResultsFilter};

fn main() -> Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Warn)
        .parse_default_env()
        .init();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let mut config = Config::load()?;
    config.apply_args(&args)?;

    let date = match flag_value(&args, "--date") {
        Some(raw) => Some(
            NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
                .map_err(|_| anyhow!("invalid --date {raw:?} (expected YYYY-MM-DD)"))?,
        ),
        None => None,
    };
    let filter = ResultsFilter {
        date,
        league: flag_value(&args, "--league"),
    };
    let page = flag_value(&args, "--page")
        .and_then(|raw| raw.parse::<usize>().ok())
        .unwrap_or(1);

    let conn = store::open_db(&config.db_path)
        .with_context(|| format!("open sqlite db {}", config.db_path.display()))?;
    let results = store::load_results(&conn, &filter, page).context("load match results")?;

    if args.iter().any(|arg| arg == "--json") {
        println!(
            "{}",
            serde_json::to_string_pretty(&results).context("serialize match results")?
        );
        return Ok(());
    }

    println!("League: {}", filter.league.as_deref().unwrap_or(ALL_LEAGUES));
    if let Some(date) = filter.date {
        println!("Date: {date}");
    }
    println!(
        "Page {}/{} ({} results)",
        results.page, results.num_pages, results.total
    );
    for m in &results.matches {
        let r = &m.record;
        println!(
            "{} {:<28} {:>24} {}-{} {:<24} [{}] p={:.0}%/{:.0}%/{:.0}%",
            r.date,
            r.league,
            r.team1,
            r.score1.unwrap_or_default(),
            r.score2.unwrap_or_default(),
            r.team2,
            r.outcome().unwrap_or('-'),
            r.prob1 * 100.0,
            r.probtie * 100.0,
            r.prob2 * 100.0,
        );
    }

    Ok(())
}
