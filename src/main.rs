use dcasim::config::{Config, QuoteSourceMode};
use dcasim::{api, CsvQuoteSource, QuoteSource, YahooQuoteSource};
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let port = config.port;

    let quote_source: Arc<dyn QuoteSource> = match (config.quote_source, &config.quote_csv_dir) {
        (QuoteSourceMode::Csv, Some(dir)) => Arc::new(CsvQuoteSource::new(dir.clone())),
        _ => Arc::new(YahooQuoteSource::new(config.quote_api_url.clone())),
    };
    tracing::info!("Using {:?} quote source", config.quote_source);

    let app = api::create_router(api::AppState::new(config, quote_source));

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!("Server listening on {}", addr);

    if let Err(e) = axum::serve(listener, app).await {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
}
