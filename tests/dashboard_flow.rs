//! Dashboard behaviour against an in-process backend double

use async_trait::async_trait;
use chrono::Utc;
use sentiscope::{
    ClientError, ClientResult, Config, CountSnapshot, Dashboard, Fetched, Post, RollingPoint,
    SentimentApi,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

#[derive(Default)]
struct FakeBackend {
    trending: Mutex<Vec<ClientResult<Vec<String>>>>,
    all: Vec<String>,
    counts: HashMap<String, CountSnapshot>,
    delays: HashMap<String, Duration>,
    count_calls: Mutex<Vec<Option<String>>>,
    trending_calls: AtomicUsize,
}

impl FakeBackend {
    fn with_trending(mut self, responses: Vec<ClientResult<Vec<String>>>) -> Self {
        self.trending = Mutex::new(responses);
        self
    }

    fn with_counts(mut self, tag: &str, counts: CountSnapshot) -> Self {
        self.counts.insert(tag.to_string(), counts);
        self
    }

    fn with_delay(mut self, tag: &str, delay: Duration) -> Self {
        self.delays.insert(tag.to_string(), delay);
        self
    }

    async fn delay_for(&self, hashtag: Option<&str>) {
        if let Some(delay) = hashtag.and_then(|t| self.delays.get(t)) {
            tokio::time::sleep(*delay).await;
        }
    }
}

fn tags(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[async_trait]
impl SentimentApi for FakeBackend {
    async fn counts(&self, _minutes: u32, hashtag: Option<&str>) -> Fetched<CountSnapshot> {
        self.count_calls
            .lock()
            .unwrap()
            .push(hashtag.map(str::to_string));
        self.delay_for(hashtag).await;
        let counts = hashtag
            .and_then(|t| self.counts.get(t).copied())
            .unwrap_or_default();
        Fetched::Live(counts)
    }

    async fn rolling(&self, _minutes: u32, hashtag: Option<&str>) -> Fetched<Vec<RollingPoint>> {
        self.delay_for(hashtag).await;
        Fetched::Live(vec![
            RollingPoint {
                timestamp: Utc::now(),
                value: 0.5,
            },
            RollingPoint {
                timestamp: Utc::now(),
                value: f64::NAN,
            },
        ])
    }

    async fn posts(&self, limit: usize, _minutes: u32, hashtag: Option<&str>) -> Fetched<Vec<Post>> {
        self.delay_for(hashtag).await;
        let post = Post {
            id: format!("{}-1", hashtag.unwrap_or("none")),
            timestamp: Utc::now(),
            source: "fake".to_string(),
            author: None,
            label: None,
            confidence: None,
            text: "hello".to_string(),
        };
        Fetched::Live(std::iter::repeat(post).take(limit.min(3)).collect())
    }

    async fn trending_hashtags(&self) -> ClientResult<Vec<String>> {
        self.trending_calls.fetch_add(1, Ordering::SeqCst);
        let mut responses = self.trending.lock().unwrap();
        if responses.len() > 1 {
            responses.remove(0)
        } else {
            match responses.first() {
                Some(Ok(list)) => Ok(list.clone()),
                Some(Err(_)) => Err(ClientError::Status { status: 503 }),
                None => Ok(Vec::new()),
            }
        }
    }

    async fn all_hashtags(&self) -> ClientResult<Vec<String>> {
        Ok(self.all.clone())
    }
}

async fn wait_for<T>(rx: &mut watch::Receiver<T>, predicate: impl Fn(&T) -> bool) -> T
where
    T: Clone,
{
    tokio::time::timeout(Duration::from_secs(30), async {
        loop {
            {
                let value = rx.borrow_and_update();
                if predicate(&value) {
                    return value.clone();
                }
            }
            rx.changed().await.expect("view closed");
        }
    })
    .await
    .expect("condition not reached in time")
}

#[tokio::test(start_paused = true)]
async fn auto_selects_first_trending_once() {
    let backend = Arc::new(FakeBackend::default().with_trending(vec![
        Ok(Vec::new()),
        Ok(tags(&["ai", "sports"])),
        Ok(tags(&["ai", "sports", "news"])),
    ]));

    let dashboard = Dashboard::start(backend.clone(), &Config::default());
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(dashboard.is_loading());
    assert!(backend.count_calls.lock().unwrap().is_empty());

    let mut selected = dashboard.filter().subscribe_selected();
    let tag = wait_for(&mut selected, |s| s.is_some()).await;
    assert_eq!(tag.as_deref(), Some("ai"));

    let mut trending = dashboard.trending();
    wait_for(&mut trending, |t| t.len() == 3).await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(dashboard.filter().selected().as_deref(), Some("ai"));

    dashboard.shutdown();
}

#[tokio::test(start_paused = true)]
async fn views_follow_selected_hashtag() {
    let backend = Arc::new(
        FakeBackend::default()
            .with_trending(vec![Ok(tags(&["ai"]))])
            .with_counts("ai", CountSnapshot::new(10, 5, 5))
            .with_counts("news", CountSnapshot::new(1, 1, 8)),
    );

    let dashboard = Dashboard::start(backend.clone(), &Config::default());

    let mut stats = dashboard.stats();
    let view = wait_for(&mut stats, |v| v.totals.total > 0).await;
    let values: Vec<u64> = view.tiles.iter().map(|t| t.value).collect();
    assert_eq!(values, vec![20, 10, 5, 5]);
    assert_eq!(view.totals.sentiment_score, 0.25);
    assert_eq!(view.posts.len(), 3);
    assert!(!view.simulated);

    let mut line = dashboard.line();
    let series = wait_for(&mut line, |v| !v.rows.is_empty()).await;
    assert_eq!(series.rows.len(), 2);
    assert_eq!(series.rows[1].sentiment, 0.0);

    assert!(dashboard.select("news"));
    let mut bar = dashboard.bar();
    let bars = wait_for(&mut bar, |v| v.tiles.last().map(|t| t.value) == Some(8)).await;
    let labels: Vec<&str> = bars.tiles.iter().map(|t| t.label.as_str()).collect();
    assert_eq!(labels, vec!["positive", "neutral", "negative"]);

    let mut posts = dashboard.posts();
    wait_for(&mut posts, |v| v.posts.first().map(|p| p.id.as_str()) == Some("news-1")).await;

    dashboard.shutdown();
}

#[tokio::test(start_paused = true)]
async fn late_response_for_previous_hashtag_is_dropped() {
    let backend = Arc::new(
        FakeBackend::default()
            .with_trending(vec![Ok(tags(&["ai", "news"]))])
            .with_counts("ai", CountSnapshot::new(30, 0, 0))
            .with_counts("news", CountSnapshot::new(0, 0, 4))
            .with_delay("ai", Duration::from_millis(3000)),
    );

    let dashboard = Dashboard::start(backend.clone(), &Config::default());

    // Wait until the slow "ai" request is in flight, then switch
    let mut selected = dashboard.filter().subscribe_selected();
    wait_for(&mut selected, |s| s.as_deref() == Some("ai")).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(backend
        .count_calls
        .lock()
        .unwrap()
        .contains(&Some("ai".to_string())));
    dashboard.select("news");

    let mut stats = dashboard.stats();
    wait_for(&mut stats, |v| v.totals.negative == 4).await;

    // Let the "ai" responses resolve
    tokio::time::sleep(Duration::from_millis(5000)).await;
    let view = dashboard.stats().borrow().clone();
    assert_eq!(view.totals.positive, 0);
    assert_eq!(view.totals.negative, 4);
    assert_eq!(dashboard.bar().borrow().tiles[0].value, 0);

    dashboard.shutdown();
}

#[tokio::test(start_paused = true)]
async fn trending_failure_keeps_previous_list() {
    let backend = Arc::new(FakeBackend::default().with_trending(vec![
        Ok(tags(&["ai", "sports"])),
        Err(ClientError::Status { status: 503 }),
    ]));

    let dashboard = Dashboard::start(backend.clone(), &Config::default());
    let mut trending = dashboard.trending();
    wait_for(&mut trending, |t| !t.is_empty()).await;

    tokio::time::sleep(Duration::from_millis(12_000)).await;
    assert!(backend.trending_calls.load(Ordering::SeqCst) >= 3);
    assert_eq!(dashboard.filter().trending(), tags(&["ai", "sports"]));
    assert_eq!(dashboard.filter().selected().as_deref(), Some("ai"));

    dashboard.shutdown();
}

#[tokio::test(start_paused = true)]
async fn shutdown_stops_polling() {
    let backend = Arc::new(
        FakeBackend::default()
            .with_trending(vec![Ok(tags(&["ai"]))])
            .with_counts("ai", CountSnapshot::new(1, 2, 3)),
    );

    let dashboard = Dashboard::start(backend.clone(), &Config::default());
    let mut stats = dashboard.stats();
    wait_for(&mut stats, |v| v.totals.total == 6).await;

    dashboard.shutdown();
    let calls = backend.count_calls.lock().unwrap().len();
    let trending_calls = backend.trending_calls.load(Ordering::SeqCst);

    tokio::time::sleep(Duration::from_secs(20)).await;
    assert_eq!(backend.count_calls.lock().unwrap().len(), calls);
    assert_eq!(backend.trending_calls.load(Ordering::SeqCst), trending_calls);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn first_trending_response_selects_without_waiting_a_tick() {
    let backend = Arc::new(FakeBackend::default().with_trending(vec![Ok(tags(&["ai"]))]));

    let mut config = Config::default();
    config.polling.hashtags_ms = 60_000;

    for _ in 0..20 {
        let dashboard = Dashboard::start(backend.clone(), &config);
        let mut selected = dashboard.filter().subscribe_selected();
        tokio::time::timeout(Duration::from_secs(2), async {
            while selected.borrow_and_update().is_none() {
                selected.changed().await.expect("filter closed");
            }
        })
        .await
        .expect("first trending list was not applied");
        dashboard.shutdown();
    }
}
