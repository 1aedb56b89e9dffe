//! ransomwatch
//!
//! Check IPs against CISA #StopRansomware advisories, from the command line
//! or over HTTP.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ransomwatch::api::{create_router, AppState};
use ransomwatch::loaders::{load_dataset, source_for};
use ransomwatch::storage::ThreatIntelRepo;

mod commands;

/// ransomwatch
#[derive(Parser, Debug)]
#[command(name = "ransomwatch", version)]
#[command(about = "Check IPs against CISA #StopRansomware advisories")]
struct Args {
    /// Dataset location (path or http(s) URL to data.json)
    #[arg(long, global = true, env = "RANSOMWATCH_DATA", default_value = "data.json")]
    data: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Look up an IP address (supports defanged format like 192[.]168[.]1[.]1)
    Check {
        ip: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Extract every IP from a text file ("-" for stdin) and look each one up
    Scan {
        input: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show dataset statistics
    Stats,

    /// List ransomware groups from advisory titles
    ListGroups,

    /// Serve the lookup API
    Serve {
        /// Server host
        #[arg(long, env = "HOST", default_value = "0.0.0.0")]
        host: String,

        /// Server port
        #[arg(long, env = "PORT", default_value = "8080")]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Logs go to stderr so command output stays pipeable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ransomwatch=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let source = source_for(&args.data).context("Invalid dataset location")?;
    let dataset = load_dataset(source.as_ref())
        .await
        .with_context(|| format!("Failed to load dataset from {}", args.data))?;
    let repo = ThreatIntelRepo::new(dataset);

    match args.command {
        Command::Check { ip, json } => commands::check(&repo, &ip, json),
        Command::Scan { input, json } => {
            let text = commands::read_input(&input).await?;
            commands::scan(&repo, &text, json)
        }
        Command::Stats => {
            commands::stats(&repo);
            Ok(())
        }
        Command::ListGroups => {
            commands::list_groups(&repo);
            Ok(())
        }
        Command::Serve { host, port } => serve(repo, &host, port).await,
    }
}

async fn serve(repo: ThreatIntelRepo, host: &str, port: u16) -> Result<()> {
    let state = Arc::new(AppState { repo });

    // Setup CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .context("Invalid listen address")?;
    tracing::info!("Listening on http://{}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
