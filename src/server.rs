use county_search::{api, store::CountyStore, Settings};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    simple_logger::init_with_level(log::Level::Info)?;
    let cfg = Settings::new()?;
    log::info!("Config: {:?}", cfg);
    let store = CountyStore::open(&cfg.database_name, cfg.db_compression_enabled)?;
    if store.is_empty() {
        log::warn!(
            "Store {} is empty, load it with clean_bls first",
            &cfg.database_name
        );
    }
    let listener = TcpListener::bind(&cfg.listen_addr).await?;
    log::info!("Serving county data on http://{}", listener.local_addr()?);
    axum::serve(listener, api::router(store))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    log::info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Could not listen for ctrl-c: {}", e);
        futures::future::pending::<()>().await;
    }
}
