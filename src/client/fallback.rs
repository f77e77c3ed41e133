//! Synthetic data used when the backend cannot be reached
//!
//! Keeps every view populated during backend downtime. Callers pass the
//! random source and the current instant so the generators stay testable.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use super::types::{CountSnapshot, Post, RollingPoint, SentimentLabel};

/// Exclusive upper bound for each simulated count
pub const MAX_SIMULATED_COUNT: u64 = 40;

/// Hard cap on simulated post rows
pub const MAX_SIMULATED_POSTS: usize = 100;

/// Minimum number of simulated rolling points
pub const MIN_SIMULATED_POINTS: usize = 12;

const EXAMPLE_TEXTS: [&str; 6] = [
    "I love how this is coming together!",
    "Not sure, needs more work",
    "Absolutely fantastic result",
    "This is disappointing",
    "Meh. Could be better",
    "Wow, exceeded expectations",
];

/// Three independent counts in `[0, MAX_SIMULATED_COUNT)`
pub fn synthetic_counts<R: Rng + ?Sized>(rng: &mut R) -> CountSnapshot {
    CountSnapshot {
        positive: rng.gen_range(0..MAX_SIMULATED_COUNT),
        neutral: rng.gen_range(0..MAX_SIMULATED_COUNT),
        negative: rng.gen_range(0..MAX_SIMULATED_COUNT),
    }
}

/// Number of points the rolling fallback produces for a window
pub fn rolling_point_count(minutes: u32) -> usize {
    std::cmp::max(MIN_SIMULATED_POINTS, minutes as usize * 4)
}

/// Evenly spaced points ending at `now`, values uniform in [-1, 1] to 2 decimals
pub fn synthetic_rolling<R: Rng + ?Sized>(
    rng: &mut R,
    minutes: u32,
    now: DateTime<Utc>,
) -> Vec<RollingPoint> {
    let n = rolling_point_count(minutes);
    let window_ms = minutes as f64 * 60_000.0;
    let step_ms = window_ms / n as f64;

    (0..n)
        .map(|i| {
            let offset_ms = ((n - i) as f64 * step_ms).round() as i64;
            RollingPoint {
                timestamp: now - Duration::milliseconds(offset_ms),
                value: round2(rng.gen::<f64>() * 2.0 - 1.0),
            }
        })
        .collect()
}

/// Up to `min(limit, MAX_SIMULATED_POSTS)` randomized posts within the window
pub fn synthetic_posts<R: Rng + ?Sized>(
    rng: &mut R,
    limit: usize,
    minutes: u32,
    now: DateTime<Utc>,
) -> Vec<Post> {
    let n = std::cmp::min(limit, MAX_SIMULATED_POSTS);
    let window_ms = minutes as i64 * 60_000;
    let stamp = now.timestamp_millis();

    (0..n)
        .map(|i| {
            let age_ms = if window_ms > 0 {
                rng.gen_range(0..window_ms)
            } else {
                0
            };

            Post {
                id: format!("sim-{}-{}", stamp, i),
                timestamp: now - Duration::milliseconds(age_ms),
                source: "simulate".to_string(),
                author: Some(format!("user{}", rng.gen_range(0..10_000))),
                label: Some(random_label(rng)),
                confidence: Some(round2(0.4 + rng.gen::<f64>() * 0.6)),
                text: EXAMPLE_TEXTS[rng.gen_range(0..EXAMPLE_TEXTS.len())].to_string(),
            }
        })
        .collect()
}

fn random_label<R: Rng + ?Sized>(rng: &mut R) -> SentimentLabel {
    if rng.gen::<f64>() > 0.65 {
        SentimentLabel::Positive
    } else if rng.gen::<f64>() > 0.5 {
        SentimentLabel::Neutral
    } else {
        SentimentLabel::Negative
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn is_two_decimals(v: f64) -> bool {
        ((v * 100.0).round() - v * 100.0).abs() < 1e-9
    }

    #[test]
    fn test_counts_bounded() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let c = synthetic_counts(&mut rng);
            assert!(c.positive < MAX_SIMULATED_COUNT);
            assert!(c.neutral < MAX_SIMULATED_COUNT);
            assert!(c.negative < MAX_SIMULATED_COUNT);
        }
    }

    #[test]
    fn test_rolling_point_count() {
        assert_eq!(rolling_point_count(1), 12);
        assert_eq!(rolling_point_count(3), 12);
        assert_eq!(rolling_point_count(5), 20);
        assert_eq!(rolling_point_count(60), 240);
    }

    #[test]
    fn test_rolling_values_and_spacing() {
        let mut rng = StdRng::seed_from_u64(42);
        let now = Utc::now();
        for minutes in [0u32, 1, 5, 17, 120] {
            let points = synthetic_rolling(&mut rng, minutes, now);
            assert!(points.len() >= rolling_point_count(minutes));
            for p in &points {
                assert!((-1.0..=1.0).contains(&p.value), "value {} out of range", p.value);
                assert!(is_two_decimals(p.value));
                assert!(p.timestamp <= now);
            }
            // Ascending and within the window
            for pair in points.windows(2) {
                assert!(pair[0].timestamp <= pair[1].timestamp);
            }
            let earliest = now - Duration::minutes(minutes as i64);
            assert!(points[0].timestamp >= earliest);
        }
    }

    #[test]
    fn test_posts_capped_and_valid() {
        let mut rng = StdRng::seed_from_u64(3);
        let now = Utc::now();
        for limit in [0usize, 1, 50, 100, 200, 500] {
            let posts = synthetic_posts(&mut rng, limit, 5, now);
            assert_eq!(posts.len(), std::cmp::min(limit, MAX_SIMULATED_POSTS));
            for post in &posts {
                assert!(post.label.is_some());
                let conf = post.confidence.unwrap();
                assert!((0.4..=1.0).contains(&conf), "confidence {} out of range", conf);
                assert!(post.timestamp <= now);
                assert!(post.timestamp > now - Duration::minutes(5));
                assert_eq!(post.source, "simulate");
                assert!(EXAMPLE_TEXTS.contains(&post.text.as_str()));
            }
        }
    }

    #[test]
    fn test_post_ids_unique() {
        let mut rng = StdRng::seed_from_u64(11);
        let posts = synthetic_posts(&mut rng, 100, 5, Utc::now());
        let ids: std::collections::HashSet<_> = posts.iter().map(|p| p.id.clone()).collect();
        assert_eq!(ids.len(), posts.len());
    }

    #[test]
    fn test_label_mix_favours_non_positive() {
        let mut rng = StdRng::seed_from_u64(99);
        let posts = synthetic_posts(&mut rng, 100, 5, Utc::now());
        let positives = posts
            .iter()
            .filter(|p| p.label == Some(SentimentLabel::Positive))
            .count();
        // Expected ~35 of 100
        assert!(positives > 10 && positives < 60, "got {} positives", positives);
    }
}
