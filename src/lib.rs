//! # Sentiscope
//!
//! Polling client core for a near-real-time social sentiment dashboard.
//!
//! ## Features
//!
//! - **Resilient client**: counts, rolling sentiment and posts fall back to
//!   simulated data when the backend is down, so views never go blank
//! - **Independent pollers**: every view refreshes on its own interval and
//!   drops responses that arrive after a teardown or filter change
//! - **Shared hashtag filter**: observable selection with one-time
//!   auto-selection of the first trending hashtag
//! - **Pure reducers**: tiles, net sentiment and plot series
//!
//! ## Modules
//!
//! - [`client`]: REST client and synthetic fallback data
//! - [`poller`]: generic timer-driven refresh task
//! - [`filter`]: hashtag selection state
//! - [`aggregate`]: tiles, totals and series
//! - [`dashboard`]: all of the above wired into running views
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sentiscope::{ApiClient, Config, Dashboard};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_default();
//!     let client = Arc::new(ApiClient::new(&config.api)?);
//!
//!     let dashboard = Dashboard::start(client, &config);
//!     dashboard.select("ai");
//!
//!     let mut stats = dashboard.stats();
//!     stats.changed().await?;
//!     println!("net sentiment: {:.2}", stats.borrow().totals.sentiment_score);
//!
//!     dashboard.shutdown();
//!     Ok(())
//! }
//! ```

pub mod aggregate;
pub mod client;
pub mod config;
pub mod dashboard;
pub mod filter;
pub mod poller;

pub use aggregate::{bar_tiles, net_sentiment, stat_tiles, to_series, SeriesRow, Tile, Totals};

pub use client::{
    ApiBase, ApiClient, ClientError, ClientResult, CountItem, CountSnapshot, Fetched, Post,
    RollingPoint, SentimentApi, SentimentLabel,
};

pub use config::{
    ApiConfig, Config, ConfigError, LoggingConfig, PollingConfig, WindowConfig,
};

pub use dashboard::{BarView, Dashboard, LineView, PostsView, StatsView};

pub use filter::FilterState;

pub use poller::{BoxError, FailurePolicy, PollTask};
