use anyhow::{Context, Result};
use clap::Parser;
use covidroll::{
    fetch,
    process::{self, combine, region},
    report,
    table::{self, Table},
};
use reqwest::Client;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};
use url::Url;

const COMBINED_PATH: &str = "combined.csv";

#[derive(Parser)]
#[command(
    name = "covidroll",
    about = "Rolling 7-day county averages for Michigan COVID-19 data"
)]
struct Cli {
    /// Fetch fresh data from the source page instead of reusing cached tables.
    #[arg(short, long)]
    refresh: bool,

    /// County or region to roll up and report on.
    #[arg(default_value = "Oakland")]
    label: String,
}

#[tokio::main]
async fn main() {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    let cli = Cli::parse();
    if let Err(err) = run(&cli).await {
        // The previous cycle's outputs stay untouched on failure.
        error!("run failed: {:#}", err);
        std::process::exit(1);
    }
}

async fn run(cli: &Cli) -> Result<()> {
    let (cases_norm, tests_norm) = if cli.refresh {
        refresh().await?
    } else {
        load_cached()?
    };

    let mut known = process::counties(&cases_norm)?;
    known.extend(process::counties(&tests_norm)?);
    let key = region::resolve_group_key(&cli.label, &known)?;
    info!(label = key.label(), "rolling up");

    let cases_key = process::rolled_for_key(cases_norm.clone(), &process::CASES, &key)?;
    let tests_key = process::rolled_for_key(tests_norm.clone(), &process::TESTS, &key)?;
    let combined = combine::combine(&cases_key, &tests_key)?;
    let snapshot = report::latest(&tests_key)?;

    // Every table of the cycle is computed; only now overwrite outputs.
    if cli.refresh {
        let cases_rolled = process::rolled(cases_norm.clone(), &process::CASES)?;
        let tests_rolled = process::rolled(tests_norm.clone(), &process::TESTS)?;
        table::csv::write_table(&cases_norm, process::CASES.cache_path)?;
        table::csv::write_table(&tests_norm, process::TESTS.cache_path)?;
        table::csv::write_table(&cases_rolled, process::CASES.roll_path)?;
        table::csv::write_table(&tests_rolled, process::TESTS.roll_path)?;
        info!("persisted normalized and rolled tables");
    }
    table::csv::write_table(&combined, COMBINED_PATH)?;
    info!(rows = combined.rows.len(), path = COMBINED_PATH, "wrote combined report");

    print!("{}", report::render(&snapshot));
    Ok(())
}

/// Fetch the page, download both datasets, and normalize them.
async fn refresh() -> Result<(Table, Table)> {
    let client = Client::new();

    fetch::page::fetch_main_page(&client, fetch::page::PAGE_CACHE).await?;
    let html = tokio::fs::read_to_string(fetch::page::PAGE_CACHE)
        .await
        .context("reading cached source page")?;
    let base = Url::parse(fetch::page::DATA_PAGE_URL)?;
    let links = fetch::links::dataset_links(&html, &base)?;
    info!(links = links.len(), "collected dataset links");

    for spec in [&process::CASES, &process::TESTS] {
        let url = fetch::links::lookup_dataset_url(&links, spec.title)?;
        fetch::files::download_dataset(&client, url, spec.raw_path).await?;
    }

    let cases_raw = table::csv::read_table(process::CASES.raw_path)?;
    let tests_raw = table::csv::read_table(process::TESTS.raw_path)?;
    Ok((
        process::normalized(&cases_raw, &process::CASES)?,
        process::normalized(&tests_raw, &process::TESTS)?,
    ))
}

/// Re-normalize the previous cycle's persisted tables (idempotent).
fn load_cached() -> Result<(Table, Table)> {
    let cases_raw = table::csv::read_table(process::CASES.cache_path)
        .context("no cached cases table; run with --refresh first")?;
    let tests_raw = table::csv::read_table(process::TESTS.cache_path)
        .context("no cached tests table; run with --refresh first")?;
    Ok((
        process::normalized(&cases_raw, &process::CASES)?,
        process::normalized(&tests_raw, &process::TESTS)?,
    ))
}
