//! Dashboard
//!
//! Wires the hashtag filter, the hashtag pollers and the four data views
//! (stat tiles, line chart, bar chart, posts table) together.
//!
//! Every view polls on its own interval and follows the selected hashtag:
//! nothing is fetched for a view until a hashtag is selected, and a new
//! selection restarts all of them at once.

use serde::Serialize;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::aggregate::{self, SeriesRow, Tile, Totals};
use crate::client::{CountItem, Post, SentimentApi};
use crate::config::Config;
use crate::filter::FilterState;
use crate::poller::{BoxError, FailurePolicy, PollTask};

/// Stat tiles plus the posts fetched alongside them
#[derive(Debug, Clone, Serialize)]
pub struct StatsView {
    pub items: Vec<CountItem>,
    pub totals: Totals,
    /// total, positive, neutral, negative
    pub tiles: Vec<Tile>,
    pub posts: Vec<Post>,
    pub simulated: bool,
}

impl StatsView {
    pub fn new(items: Vec<CountItem>, posts: Vec<Post>, simulated: bool) -> Self {
        Self {
            totals: Totals::from_items(&items),
            tiles: aggregate::stat_tiles(&items),
            items,
            posts,
            simulated,
        }
    }
}

impl Default for StatsView {
    fn default() -> Self {
        Self::new(Vec::new(), Vec::new(), false)
    }
}

/// Rolling sentiment line chart
#[derive(Debug, Clone, Default, Serialize)]
pub struct LineView {
    pub rows: Vec<SeriesRow>,
    pub simulated: bool,
}

/// Label distribution bar chart
#[derive(Debug, Clone, Default, Serialize)]
pub struct BarView {
    /// positive, neutral, negative
    pub tiles: Vec<Tile>,
    pub simulated: bool,
}

/// Recent posts table
#[derive(Debug, Clone, Default, Serialize)]
pub struct PostsView {
    pub posts: Vec<Post>,
    pub simulated: bool,
}

/// Running dashboard
pub struct Dashboard {
    filter: Arc<FilterState>,
    trending: Arc<PollTask<Vec<String>>>,
    stats: Arc<PollTask<StatsView>>,
    line: Arc<PollTask<LineView>>,
    bar: Arc<PollTask<BarView>>,
    posts: Arc<PollTask<PostsView>>,
    background: Mutex<Vec<JoinHandle<()>>>,
}

impl Dashboard {
    /// Start every poller. Must be called inside a tokio runtime.
    pub fn start(api: Arc<dyn SentimentApi>, config: &Config) -> Self {
        let filter = Arc::new(FilterState::new());
        let polling = &config.polling;
        let minutes = config.window.minutes;
        let mut background = Vec::new();

        let trending = {
            let api = Arc::clone(&api);
            PollTask::new(
                "hashtags",
                polling.hashtags(),
                FailurePolicy::Keep,
                move |_filter: Option<String>| {
                    let api = Arc::clone(&api);
                    async move { api.trending_hashtags().await.map_err(BoxError::from) }
                },
            )
        };
        background.push(forward_trending(trending.subscribe(), Arc::clone(&filter)));
        trending.start(None);
        background.push(load_all_hashtags(Arc::clone(&api), Arc::clone(&filter)));

        let stats = {
            let api = Arc::clone(&api);
            let posts_limit = config.window.stats_posts_limit;
            PollTask::new(
                "stats",
                polling.stats(),
                FailurePolicy::Reset,
                move |filter: Option<String>| {
                    let api = Arc::clone(&api);
                    async move {
                        let tag = filter.as_deref();
                        let (counts, posts) = tokio::join!(
                            api.counts(minutes, tag),
                            api.posts(posts_limit, minutes, tag)
                        );
                        let simulated = counts.is_degraded() || posts.is_degraded();
                        Ok::<_, BoxError>(StatsView::new(
                            counts.into_inner().items(),
                            posts.into_inner(),
                            simulated,
                        ))
                    }
                },
            )
        };

        let line = {
            let api = Arc::clone(&api);
            PollTask::new(
                "line",
                polling.line(),
                FailurePolicy::Reset,
                move |filter: Option<String>| {
                    let api = Arc::clone(&api);
                    async move {
                        let fetched = api.rolling(minutes, filter.as_deref()).await;
                        let simulated = fetched.is_degraded();
                        Ok::<_, BoxError>(LineView {
                            rows: aggregate::to_series(fetched.data()),
                            simulated,
                        })
                    }
                },
            )
        };

        let bar = {
            let api = Arc::clone(&api);
            PollTask::new(
                "bar",
                polling.bar(),
                FailurePolicy::Reset,
                move |filter: Option<String>| {
                    let api = Arc::clone(&api);
                    async move {
                        let fetched = api.counts(minutes, filter.as_deref()).await;
                        Ok::<_, BoxError>(BarView {
                            simulated: fetched.is_degraded(),
                            tiles: aggregate::bar_tiles(&fetched.into_inner().items()),
                        })
                    }
                },
            )
        };

        let posts = {
            let api = Arc::clone(&api);
            let limit = config.window.posts_limit;
            PollTask::new(
                "posts",
                polling.posts(),
                FailurePolicy::Reset,
                move |filter: Option<String>| {
                    let api = Arc::clone(&api);
                    async move {
                        let fetched = api.posts(limit, minutes, filter.as_deref()).await;
                        Ok::<_, BoxError>(PostsView {
                            simulated: fetched.is_degraded(),
                            posts: fetched.into_inner(),
                        })
                    }
                },
            )
        };

        background.push(stats.follow(filter.subscribe_selected()));
        background.push(line.follow(filter.subscribe_selected()));
        background.push(bar.follow(filter.subscribe_selected()));
        background.push(posts.follow(filter.subscribe_selected()));

        tracing::info!(
            minutes,
            hashtags_ms = polling.hashtags_ms,
            stats_ms = polling.stats_ms,
            line_ms = polling.line_ms,
            bar_ms = polling.bar_ms,
            posts_ms = polling.posts_ms,
            "Dashboard started"
        );

        Self {
            filter,
            trending,
            stats,
            line,
            bar,
            posts,
            background: Mutex::new(background),
        }
    }

    pub fn filter(&self) -> &Arc<FilterState> {
        &self.filter
    }

    /// Select a hashtag; every filtered view restarts immediately
    pub fn select(&self, tag: &str) -> bool {
        self.filter.select(tag)
    }

    /// No hashtag selected yet, filtered views show a loading placeholder
    pub fn is_loading(&self) -> bool {
        self.filter.selected().is_none()
    }

    pub fn trending(&self) -> watch::Receiver<Vec<String>> {
        self.trending.subscribe()
    }

    pub fn stats(&self) -> watch::Receiver<StatsView> {
        self.stats.subscribe()
    }

    pub fn line(&self) -> watch::Receiver<LineView> {
        self.line.subscribe()
    }

    pub fn bar(&self) -> watch::Receiver<BarView> {
        self.bar.subscribe()
    }

    pub fn posts(&self) -> watch::Receiver<PostsView> {
        self.posts.subscribe()
    }

    /// Stop every poller and background task
    pub fn shutdown(&self) {
        let stopped = match self.background.lock() {
            Ok(mut background) => {
                let count = background.len();
                for handle in background.drain(..) {
                    handle.abort();
                }
                count
            }
            Err(_) => 0,
        };

        self.trending.stop();
        self.stats.stop();
        self.line.stop();
        self.bar.stop();
        self.posts.stop();

        if stopped > 0 {
            tracing::info!("Dashboard shut down");
        }
    }
}

impl Drop for Dashboard {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Push every trending list the poller stores into the filter state
fn forward_trending(
    mut trending: watch::Receiver<Vec<String>>,
    filter: Arc<FilterState>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while trending.changed().await.is_ok() {
            let tags = trending.borrow_and_update().clone();
            filter.set_trending(tags);
        }
    })
}

/// The all-known list is fetched once; a failure leaves it empty
fn load_all_hashtags(api: Arc<dyn SentimentApi>, filter: Arc<FilterState>) -> JoinHandle<()> {
    tokio::spawn(async move {
        match api.all_hashtags().await {
            Ok(tags) => {
                tracing::debug!(count = tags.len(), "Loaded all hashtags");
                filter.set_all(tags);
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to fetch all hashtags");
            }
        }
    })
}
