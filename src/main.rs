use anyhow::{Context, Result};
use cinefront::api::{ApiClient, MovieApi};
use cinefront::app::App;
use cinefront::config::Config;
use cinefront::dom::Dom;
use cinefront::notify::LogNotifier;
use dotenvy::dotenv;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let loaded = dotenv();
    init_tracing();
    match loaded {
        Ok(path) => info!("Loaded environment from {:?}", path),
        Err(e) => warn!("No .env file loaded ({}) - relying on environment", e),
    }

    let config = Config::from_env().context("Invalid configuration")?;
    let api: Arc<dyn MovieApi> = Arc::new(
        ApiClient::builder()
            .base_url(config.api_base.clone())
            .timeout(config.request_timeout)
            .build()
            .context("Failed to build API client")?,
    );

    let dom = Dom::new();
    let app = App::new(dom.clone(), api, Arc::new(LogNotifier), config);
    let (page, render) = app.start().context("Failed to mount start page")?;
    render.await.context("Render task failed")?;
    info!("Page finished in state {:?}", page.state());

    let html = dom.with(|doc| doc.to_html(doc.root()));
    println!("<!DOCTYPE html>\n{html}");
    Ok(())
}
