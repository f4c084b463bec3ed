use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use datafed_client::DirectoryClient;
use tower_http::cors::CorsLayer;
use tower_http::trace::{MakeSpan, TraceLayer};
use tracing::info;
use tracing_subscriber::prelude::*;
use uuid::Uuid;

use datafed_catalog::config::FileConfig;
use datafed_catalog::db::Database;
use datafed_catalog::{AppState, router};

#[derive(Clone)]
struct RequestIdMakeSpan;

impl<B> MakeSpan<B> for RequestIdMakeSpan {
    fn make_span(&mut self, request: &axum::http::Request<B>) -> tracing::Span {
        tracing::info_span!(
            "request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %Uuid::new_v4(),
        )
    }
}

#[derive(Parser)]
#[command(name = "datafed-catalog")]
#[command(about = "Federated catalog of signed data-resource descriptors")]
struct Cli {
    /// Path to a TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the bind host
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port
    #[arg(short, long)]
    port: Option<u16>,

    /// Override the key directory URL
    #[arg(long)]
    directory_url: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_directive = if cli.debug {
        "datafed_catalog=debug,tower_http=debug,info"
    } else {
        "datafed_catalog=info,tower_http=info,warn"
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(env_filter)
        .init();

    let mut config = FileConfig::load(cli.config.as_deref())?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(url) = cli.directory_url {
        config.directory.url = url;
    }

    let db = Database::connect(&config.db_url()).await?;
    let state = AppState {
        db,
        directory: DirectoryClient::new(config.directory.url.clone()),
    };
    let app = router(state)
        .layer(TraceLayer::new_for_http().make_span_with(RequestIdMakeSpan))
        .layer(CorsLayer::permissive());

    let addr = config.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Catalog listening on http://{addr} (directory: {})", config.directory.url);
    axum::serve(listener, app).await?;
    Ok(())
}
