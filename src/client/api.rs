//! Sentiment Backend REST Client
//!
//! HTTP client for the sentiment-analysis backend. Data calls never fail:
//! when the backend is unreachable or returns garbage, the client logs a
//! warning and hands back simulated data tagged as [`Fetched::Degraded`].

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{CACHE_CONTROL, PRAGMA};
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;

use super::error::{ClientError, ClientResult};
use super::fallback;
use super::types::{CountSnapshot, Fetched, Post, RollingPoint, RollingResponse};
use crate::config::ApiConfig;

/// Origin used when the dashboard itself is served from a loopback host
pub const LOCAL_DEV_ORIGIN: &str = "http://127.0.0.1:8000";

/// Read-side contract every dashboard view depends on
#[async_trait]
pub trait SentimentApi: Send + Sync {
    /// Label counts for the last `minutes`, simulated on failure
    async fn counts(&self, minutes: u32, hashtag: Option<&str>) -> Fetched<CountSnapshot>;

    /// Rolling sentiment series for the last `minutes`, simulated on failure
    async fn rolling(&self, minutes: u32, hashtag: Option<&str>) -> Fetched<Vec<RollingPoint>>;

    /// Most recent posts, simulated on failure
    async fn posts(&self, limit: usize, minutes: u32, hashtag: Option<&str>) -> Fetched<Vec<Post>>;

    /// Currently trending hashtags. No fallback.
    async fn trending_hashtags(&self) -> ClientResult<Vec<String>>;

    /// Every hashtag the backend has seen. No fallback.
    async fn all_hashtags(&self) -> ClientResult<Vec<String>>;
}

/// Where request paths are resolved against
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiBase {
    /// Explicit or loopback-derived absolute base, no trailing slash
    Absolute(String),
    /// Relative to the page origin, when one is known
    Relative { origin: Option<String> },
}

impl ApiBase {
    /// Resolve the base address
    ///
    /// An explicit base wins. Otherwise a page served from `localhost` or
    /// `127.0.0.1` talks to `local_dev_origin`; anything else stays relative.
    pub fn resolve(explicit: Option<&str>, page_origin: Option<&str>, local_dev_origin: &str) -> Self {
        if let Some(base) = explicit.map(str::trim).filter(|b| !b.is_empty()) {
            return ApiBase::Absolute(base.trim_end_matches('/').to_string());
        }

        if let Some(origin) = page_origin {
            if is_loopback_origin(origin) {
                return ApiBase::Absolute(local_dev_origin.trim_end_matches('/').to_string());
            }
        }

        ApiBase::Relative {
            origin: page_origin.map(|o| o.trim_end_matches('/').to_string()),
        }
    }

    /// Build the full URL for `path` with percent-encoded query parameters
    pub fn url_for(&self, path: &str, query: &[(&str, String)]) -> ClientResult<String> {
        let prefix = match self {
            ApiBase::Absolute(base) => base.as_str(),
            ApiBase::Relative { origin: Some(origin) } => origin.as_str(),
            ApiBase::Relative { origin: None } => {
                return Err(ClientError::NoBaseUrl {
                    path: path.to_string(),
                })
            }
        };

        let mut url = format!("{}{}", prefix, path);
        if !query.is_empty() {
            let encoded: Vec<String> = query
                .iter()
                .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
                .collect();
            url.push('?');
            url.push_str(&encoded.join("&"));
        }
        Ok(url)
    }
}

fn is_loopback_origin(origin: &str) -> bool {
    Url::parse(origin)
        .ok()
        .and_then(|u| u.host_str().map(|h| h == "localhost" || h == "127.0.0.1"))
        .unwrap_or(false)
}

/// REST client for the sentiment backend
pub struct ApiClient {
    client: Client,
    base: ApiBase,
}

impl ApiClient {
    /// Create a client from the `[api]` configuration section
    pub fn new(config: &ApiConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_millis(config.request_timeout_ms))
            .build()?;

        let base = ApiBase::resolve(
            config.base_url.as_deref(),
            config.page_origin.as_deref(),
            &config.local_dev_origin,
        );

        tracing::debug!(base = ?base, "Sentiment API client configured");

        Ok(Self { client, base })
    }

    pub fn base(&self) -> &ApiBase {
        &self.base
    }

    /// Issue a non-cached GET and decode the JSON body
    ///
    /// Any non-2xx status is an error.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> ClientResult<T> {
        let response = self.send(path, query).await?;
        let bytes = response.bytes().await.map_err(ClientError::from_transport)?;
        serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(e.to_string()))
    }

    async fn send(&self, path: &str, query: &[(&str, String)]) -> ClientResult<reqwest::Response> {
        let url = self.base.url_for(path, query)?;

        let response = self
            .client
            .get(&url)
            .header(CACHE_CONTROL, "no-store")
            .header(PRAGMA, "no-cache")
            .send()
            .await
            .map_err(ClientError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
            });
        }

        Ok(response)
    }

    /// Check whether the backend answers `GET /api/health`
    ///
    /// Any 2xx counts as reachable; the body is ignored.
    pub async fn health(&self) -> ClientResult<()> {
        self.send("/api/health", &[]).await.map(|_| ())
    }
}

fn scoped_query(key: &'static str, value: String, hashtag: Option<&str>) -> Vec<(&'static str, String)> {
    let mut query = vec![(key, value)];
    if let Some(tag) = hashtag.filter(|t| !t.is_empty()) {
        query.push(("hashtag", tag.to_string()));
    }
    query
}

#[async_trait]
impl SentimentApi for ApiClient {
    async fn counts(&self, minutes: u32, hashtag: Option<&str>) -> Fetched<CountSnapshot> {
        let query = scoped_query("minutes", minutes.to_string(), hashtag);

        match self.get::<CountSnapshot>("/api/stats/counts", &query).await {
            Ok(counts) => Fetched::Live(counts),
            Err(e) => {
                tracing::warn!(error = %e, "fetch counts failed, returning simulated counts");
                let data = fallback::synthetic_counts(&mut rand::thread_rng());
                Fetched::Degraded {
                    data,
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn rolling(&self, minutes: u32, hashtag: Option<&str>) -> Fetched<Vec<RollingPoint>> {
        let query = scoped_query("minutes", minutes.to_string(), hashtag);

        match self.get::<RollingResponse>("/api/stats/rolling", &query).await {
            Ok(response) => Fetched::Live(response.points),
            Err(e) => {
                tracing::warn!(error = %e, "fetch rolling failed, returning simulated rolling points");
                let data = fallback::synthetic_rolling(&mut rand::thread_rng(), minutes, Utc::now());
                Fetched::Degraded {
                    data,
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn posts(&self, limit: usize, minutes: u32, hashtag: Option<&str>) -> Fetched<Vec<Post>> {
        let query = scoped_query("limit", limit.to_string(), hashtag);

        match self.get::<Vec<Post>>("/api/posts", &query).await {
            Ok(posts) => Fetched::Live(posts),
            Err(e) => {
                tracing::warn!(error = %e, "fetch posts failed, returning simulated posts");
                let data =
                    fallback::synthetic_posts(&mut rand::thread_rng(), limit, minutes, Utc::now());
                Fetched::Degraded {
                    data,
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn trending_hashtags(&self) -> ClientResult<Vec<String>> {
        self.get("/api/hashtags", &[]).await
    }

    async fn all_hashtags(&self) -> ClientResult<Vec<String>> {
        self.get("/api/hashtags-all", &[]).await
    }
}
