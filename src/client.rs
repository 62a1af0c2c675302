use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use county_search::search::redact_key;
use county_search::{
    HtmlPageTarget, HttpFetcher, SearchConfig, SearchSubmitHandler, Settings, StaticForm,
    SubmitEvent,
};

/// Look up a county's monthly unemployment rate and chart it.
#[derive(Debug, Parser)]
#[command(name = "countysearch")]
struct Args {
    /// County name, e.g. "Travis County"
    #[arg(long, default_value = "")]
    county: String,

    /// Two-letter state abbreviation
    #[arg(long, default_value = "")]
    state: String,

    /// County data API; overrides the configured endpoint
    #[arg(long)]
    endpoint: Option<String>,

    /// API key sent as the `key` query parameter
    #[arg(long)]
    key: Option<String>,

    /// HTML page the chart is written to
    #[arg(long)]
    out: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    simple_logger::init_with_level(log::Level::Info)?;
    let args = Args::parse();
    let cfg = Settings::new()?;

    let endpoint = args.endpoint.as_deref().unwrap_or(&cfg.endpoint);
    let config = SearchConfig::new(endpoint, args.key.or_else(|| cfg.api_key.clone()))?;
    let selectors = cfg.selectors();
    let target = HtmlPageTarget::new(args.out.unwrap_or_else(|| cfg.output_path.clone()));
    let fetcher = HttpFetcher::new(Duration::from_secs(cfg.request_timeout_secs))?;

    let form = StaticForm::new()
        .with(&selectors.county, &args.county)
        .with(&selectors.state, &args.state);
    let handler = SearchSubmitHandler::configure(
        config,
        selectors,
        Arc::new(fetcher),
        Arc::new(target.clone()),
    );

    let mut event = SubmitEvent::new();
    let outcome = handler.handle_submit(&mut event, &form).await?;
    log::info!(
        "Charted {} months from {} into {}",
        outcome.spec.data.values.len(),
        redact_key(&outcome.url),
        target.path().display()
    );
    Ok(())
}
