//! Poll Task
//!
//! Generic timer-driven refresh loop shared by every dashboard view.
//!
//! A task fetches immediately when started, then on every interval tick.
//! Ticks are not chained to responses: each fetch runs on its own tokio task,
//! so two fetches from one poller can resolve out of order. Every run owns a
//! liveness flag; a response is applied only while its run is alive and the
//! filter it was requested for is still current.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Error type producers may return
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

type PollFuture<T> = Pin<Box<dyn Future<Output = Result<T, BoxError>> + Send>>;
type Producer<T> = Arc<dyn Fn(Option<String>) -> PollFuture<T> + Send + Sync>;

/// Shortest period a poller ticks at; tokio rejects a zero interval
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// What a view shows after a failed fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Replace the data with an empty value
    Reset,
    /// Keep whatever was there before
    Keep,
}

/// Liveness flag of one run
///
/// Checking and applying happen under the same lock as `kill`, so a
/// response can never land after its run was torn down.
#[derive(Clone)]
struct Liveness(Arc<Mutex<bool>>);

impl Liveness {
    fn new() -> Self {
        Liveness(Arc::new(Mutex::new(true)))
    }

    fn is_alive(&self) -> bool {
        self.0.lock().map(|alive| *alive).unwrap_or(false)
    }

    fn kill(&self) {
        if let Ok(mut alive) = self.0.lock() {
            *alive = false;
        }
    }

    /// Run `f` only if still alive; returns whether it ran
    fn apply_if_alive(&self, f: impl FnOnce()) -> bool {
        match self.0.lock() {
            Ok(alive) if *alive => {
                f();
                true
            }
            _ => false,
        }
    }
}

struct Run {
    liveness: Liveness,
    timer: JoinHandle<()>,
    filter: Option<String>,
}

/// A reusable polling task writing into an observable view state
pub struct PollTask<T> {
    name: String,
    interval: Duration,
    policy: FailurePolicy,
    producer: Producer<T>,
    state: Arc<watch::Sender<T>>,
    run: Mutex<Option<Run>>,
}

impl<T> PollTask<T>
where
    T: Default + Clone + Send + Sync + 'static,
{
    /// Create a stopped poll task
    ///
    /// `producer` receives the filter value the fetch is scoped to.
    /// Intervals below [`MIN_INTERVAL`] are raised to it.
    pub fn new<F, Fut>(
        name: impl Into<String>,
        interval: Duration,
        policy: FailurePolicy,
        producer: F,
    ) -> Arc<Self>
    where
        F: Fn(Option<String>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, BoxError>> + Send + 'static,
    {
        let name = name.into();
        if interval < MIN_INTERVAL {
            tracing::warn!(
                poller = %name,
                ?interval,
                "Polling interval too short, using {:?}",
                MIN_INTERVAL
            );
        }
        let interval = interval.max(MIN_INTERVAL);

        let (state, _) = watch::channel(T::default());
        let producer: Producer<T> =
            Arc::new(move |filter: Option<String>| -> PollFuture<T> { Box::pin(producer(filter)) });

        Arc::new(Self {
            name,
            interval,
            policy,
            producer,
            state: Arc::new(state),
            run: Mutex::new(None),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Observe the view state
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.state.subscribe()
    }

    /// Snapshot of the current view state
    pub fn latest(&self) -> T {
        self.state.borrow().clone()
    }

    pub fn is_running(&self) -> bool {
        self.run.lock().map(|run| run.is_some()).unwrap_or(false)
    }

    /// Filter of the current run, `None` when stopped or unscoped
    pub fn current_filter(&self) -> Option<String> {
        self.run
            .lock()
            .ok()
            .and_then(|run| run.as_ref().and_then(|r| r.filter.clone()))
    }

    /// Start polling with a fixed filter, stopping any previous run first
    pub fn start(&self, filter: Option<String>) {
        self.start_run(filter, None);
    }

    /// Stop the timer and drop any in-flight results
    pub fn stop(&self) {
        let previous = self.run.lock().ok().and_then(|mut run| run.take());
        if let Some(run) = previous {
            run.liveness.kill();
            run.timer.abort();
            tracing::debug!(view = %self.name, "Poller stopped");
        }
    }

    /// Keep polling in step with a shared filter cell
    ///
    /// Polling starts once the cell holds a value, restarts immediately on
    /// every change and stops while the cell is empty. Returns the
    /// supervisor handle; it ends when the cell's sender is dropped.
    pub fn follow(self: &Arc<Self>, mut filter: watch::Receiver<Option<String>>) -> JoinHandle<()> {
        let task = Arc::clone(self);

        tokio::spawn(async move {
            loop {
                let value = filter.borrow_and_update().clone();
                match value {
                    Some(tag) => task.start_run(Some(tag), Some(filter.clone())),
                    None => task.stop(),
                }

                if filter.changed().await.is_err() {
                    break;
                }
            }
            task.stop();
        })
    }

    fn start_run(&self, filter: Option<String>, filter_rx: Option<watch::Receiver<Option<String>>>) {
        let Ok(mut slot) = self.run.lock() else {
            return;
        };

        if let Some(previous) = slot.take() {
            previous.liveness.kill();
            previous.timer.abort();
        }

        let liveness = Liveness::new();
        let timer = tokio::spawn(run_loop(
            self.name.clone(),
            self.interval,
            self.policy,
            Arc::clone(&self.producer),
            Arc::clone(&self.state),
            liveness.clone(),
            filter.clone(),
            filter_rx,
        ));

        tracing::debug!(view = %self.name, hashtag = ?filter, "Poller started");

        *slot = Some(Run {
            liveness,
            timer,
            filter,
        });
    }
}

impl<T> Drop for PollTask<T> {
    fn drop(&mut self) {
        if let Ok(mut slot) = self.run.lock() {
            if let Some(run) = slot.take() {
                run.liveness.kill();
                run.timer.abort();
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_loop<T>(
    name: String,
    interval: Duration,
    policy: FailurePolicy,
    producer: Producer<T>,
    state: Arc<watch::Sender<T>>,
    liveness: Liveness,
    filter: Option<String>,
    filter_rx: Option<watch::Receiver<Option<String>>>,
) where
    T: Default + Send + Sync + 'static,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        // First tick completes immediately
        ticker.tick().await;

        if !liveness.is_alive() {
            break;
        }

        // The shared filter moved on; the supervisor is about to restart us
        if !filter_is_current(&filter_rx, &filter) {
            continue;
        }

        let fetch = producer(filter.clone());
        let name = name.clone();
        let state = Arc::clone(&state);
        let liveness = liveness.clone();
        let filter = filter.clone();
        let filter_rx = filter_rx.clone();

        tokio::spawn(async move {
            let result = fetch.await;

            let applied = liveness.apply_if_alive(|| {
                if !filter_is_current(&filter_rx, &filter) {
                    return;
                }
                match result {
                    Ok(data) => {
                        state.send_replace(data);
                    }
                    Err(e) => match policy {
                        FailurePolicy::Reset => {
                            tracing::warn!(view = %name, error = %e, "Fetch failed, clearing view");
                            state.send_replace(T::default());
                        }
                        FailurePolicy::Keep => {
                            tracing::error!(view = %name, error = %e, "Fetch failed, keeping previous data");
                        }
                    },
                }
            });

            if !applied {
                tracing::trace!(view = %name, hashtag = ?filter, "Discarded stale response");
            }
        });
    }
}

fn filter_is_current(
    filter_rx: &Option<watch::Receiver<Option<String>>>,
    filter: &Option<String>,
) -> bool {
    match filter_rx {
        Some(rx) => rx.borrow().as_ref() == filter.as_ref(),
        None => true,
    }
}
