//! Sentiscope CLI
//!
//! Headless dashboard: polls the sentiment backend and logs every view
//! update until interrupted.

use clap::{Parser, Subcommand};
use sentiscope::{ApiClient, Config, Dashboard, LoggingConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "sentiscope")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Near-real-time social sentiment dashboard")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: search standard locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the dashboard and log view updates
    Watch {
        /// Hashtag to select instead of the first trending one
        #[arg(long)]
        hashtag: Option<String>,

        /// Override the API base address
        #[arg(long)]
        api_base: Option<String>,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Config { output } => {
            let content = sentiscope::config::generate_default_config();
            match output {
                Some(path) => {
                    std::fs::write(&path, content)?;
                    println!("Wrote default config to {}", path.display());
                }
                None => print!("{}", content),
            }
            Ok(())
        }
        Commands::Watch { hashtag, api_base } => {
            let mut config = match &cli.config {
                Some(path) => Config::load_with_env(path)?,
                None => Config::load_default(),
            };
            if api_base.is_some() {
                config.api.base_url = api_base;
            }

            init_logging(&config.logging);
            watch(config, hashtag).await
        }
    }
}

fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("sentiscope={}", logging.level)));

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn watch(config: Config, hashtag: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("Sentiscope v{}", env!("CARGO_PKG_VERSION"));

    let client = ApiClient::new(&config.api)?;
    tracing::info!("API base: {:?}", client.base());

    match client.health().await {
        Ok(()) => tracing::info!("Backend reachable, showing live data"),
        Err(e) => tracing::warn!(error = %e, "Backend unreachable, views will show simulated data"),
    }

    let dashboard = Dashboard::start(Arc::new(client), &config);
    if let Some(tag) = hashtag {
        dashboard.select(&tag);
    } else {
        tracing::info!("Loading hashtags...");
    }

    let mut selected = dashboard.filter().subscribe_selected();
    let mut trending = dashboard.trending();
    let mut stats = dashboard.stats();
    let mut line = dashboard.line();
    let mut bar = dashboard.bar();
    let mut posts = dashboard.posts();

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            Ok(()) = selected.changed() => {
                let tag = selected.borrow_and_update().clone();
                tracing::info!(hashtag = ?tag, "Filter changed");
            }
            Ok(()) = trending.changed() => {
                let tags = trending.borrow_and_update().clone();
                tracing::info!("Trending: {}", format_tags(&tags));
            }
            Ok(()) = stats.changed() => {
                let view = stats.borrow_and_update().clone();
                let tiles: Vec<String> = view.tiles.iter().map(|t| format!("{}={}", t.label, t.value)).collect();
                tracing::info!(
                    simulated = view.simulated,
                    posts = view.posts.len(),
                    "Stats: {} net={:.2}",
                    tiles.join(" "),
                    view.totals.sentiment_score
                );
            }
            Ok(()) = line.changed() => {
                let view = line.borrow_and_update().clone();
                match view.rows.last() {
                    Some(last) => tracing::info!(
                        simulated = view.simulated,
                        "Rolling: {} points, latest {} {:+.2}",
                        view.rows.len(),
                        last.display_time,
                        last.sentiment
                    ),
                    None => tracing::info!("Rolling: no data"),
                }
            }
            Ok(()) = bar.changed() => {
                let view = bar.borrow_and_update().clone();
                let tiles: Vec<String> = view.tiles.iter().map(|t| format!("{}={}", t.label, t.value)).collect();
                tracing::debug!(simulated = view.simulated, "Distribution: {}", tiles.join(" "));
            }
            Ok(()) = posts.changed() => {
                let view = posts.borrow_and_update().clone();
                match view.posts.first() {
                    Some(post) => tracing::info!(
                        simulated = view.simulated,
                        "Posts: {} rows, newest [{}] {}",
                        view.posts.len(),
                        post.label.map(|l| l.to_string()).unwrap_or_else(|| "-".to_string()),
                        post.text
                    ),
                    None => tracing::info!("Posts: waiting for data"),
                }
            }
        }
    }

    tracing::info!("Shutting down...");
    dashboard.shutdown();
    Ok(())
}

fn format_tags(tags: &[String]) -> String {
    if tags.is_empty() {
        return "-".to_string();
    }
    tags.iter()
        .map(|t| format!("#{}", t))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
