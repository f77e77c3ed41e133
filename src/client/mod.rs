//! Sentiment Backend Client
//!
//! Typed access to the sentiment-analysis backend.
//!
//! ## Endpoints
//!
//! - `GET /api/hashtags` - trending hashtags
//! - `GET /api/hashtags-all` - every known hashtag
//! - `GET /api/stats/counts?minutes=&hashtag=` - label counts
//! - `GET /api/stats/rolling?minutes=&hashtag=` - rolling sentiment
//! - `GET /api/posts?limit=&hashtag=` - recent posts
//! - `GET /api/health` - reachability
//!
//! Counts, rolling points and posts fall back to simulated data when the
//! backend fails, so dashboards stay populated with no backend running.

mod api;
mod error;
pub mod fallback;
mod types;

pub use api::{ApiBase, ApiClient, SentimentApi, LOCAL_DEV_ORIGIN};
pub use error::{ClientError, ClientResult};
pub use types::{CountItem, CountSnapshot, Fetched, Post, RollingPoint, SentimentLabel};
