use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use playlists_api::config::load_config;
use playlists_api::http::HttpServer;
use playlists_api::lifecycle::{signals, startup, Shutdown};
use playlists_api::observability::{logging, metrics, tracing as otel, Tracing};

#[derive(Parser)]
#[command(name = "playlists-api")]
#[command(about = "Playlists with video details, aggregated from the video service", long_about = None)]
struct Cli {
    /// Optional TOML config file; environment variables override it.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    logging::init_logging(&config.logging)?;
    tracing::info!("playlists-api v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.server.bind_address,
        store = %config.store.url(),
        videos = %config.videos.base_url,
        debug = config.is_debug(),
        "Configuration loaded"
    );

    let provider = otel::init_tracer_provider(&config.tracing, &config.environment)?;
    let tracer = Tracing::from_provider(&provider, &config.tracing.service_name);

    if config.metrics.enabled {
        match config.metrics.address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics endpoint");
                }
            }
            Err(e) => tracing::error!(
                metrics_address = %config.metrics.address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let state = startup::build_state(&config, tracer)?;

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    signals::spawn_signal_listener(shutdown);

    HttpServer::new(&config, state)
        .run(listener, server_shutdown)
        .await?;

    otel::shutdown_tracer_provider(&provider);
    tracing::info!("Shutdown complete");
    Ok(())
}
