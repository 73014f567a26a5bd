use anyhow::{Context, Result, anyhow, bail};
use catalog_search::{CatalogClient, LatestResults, Session, config::CONFIG};
use std::{env, process::ExitCode};
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

/// Launch the application entry point.
#[tokio::main]
async fn main() -> ExitCode {
    #[cfg(debug_assertions)]
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(["warn", "catalog_search=info"].join(","))),
        )
        .with_writer(std::io::stderr)
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

/// Resolve the storefront, run one search and print the results as JSON.
async fn run() -> Result<()> {
    let term = env::args().skip(1).collect::<Vec<_>>().join(" ");
    if term.trim().is_empty() {
        bail!("usage: catalog-search <term>...");
    }

    let developer_token = CONFIG.developer_token.clone().context(
        "Developer token not set, set it in the config file under key `developer_token` \
         or in CATALOG_DEVELOPER_TOKEN.",
    )?;
    let session = Session::new(developer_token, &CONFIG.region);
    session.set_user_token(CONFIG.user_token.clone());
    let client = CatalogClient::new(CONFIG.endpoint());

    if let Err(err) = session.resolve_storefront(&client).await {
        warn!(
            "Searching region {} instead: {}",
            session.country_code(),
            err.notice()
        );
    }

    let latest = LatestResults::new();
    let ticket = latest.begin();
    let snapshot = session.snapshot();
    let results = client
        .search(&term, snapshot.country_code(), &snapshot.developer_token)
        .await
        .map_err(|err| anyhow!(err.notice()))?;
    for failure in &results.failures {
        eprintln!(
            "Skipped {} result {}: {}",
            failure.bucket.key(),
            failure.index,
            failure.error
        );
    }
    latest.apply(ticket, results);

    let results = latest.current().unwrap_or_default();
    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}
