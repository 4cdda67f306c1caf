//! Retry and backoff policy shared by every fetcher variant

use super::FetchError;
use rand::Rng;
use std::future::Future;
use std::ops::RangeInclusive;
use std::time::Duration;

/// Attempt budget and pacing for one URL
///
/// The backoff starts at the base delay. A blocked attempt grows it by
/// `blocked_factor`, any other failure by `transient_factor`. Every wait is
/// the current backoff scaled by a random factor drawn from `jitter`.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub blocked_factor: f64,
    pub transient_factor: f64,
    pub jitter: RangeInclusive<f64>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(5, Duration::from_millis(1400))
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            blocked_factor: 1.8,
            transient_factor: 1.7,
            jitter: 1.2..=1.6,
        }
    }

    /// `delay` scaled by a random factor from the jitter range
    pub fn jittered(&self, delay: Duration) -> Duration {
        if delay.is_zero() {
            return Duration::ZERO;
        }
        let factor = rand::thread_rng().gen_range(self.jitter.clone());
        delay.mul_f64(factor)
    }

    /// Backoff to use after `error`
    pub fn next_backoff(&self, backoff: Duration, error: &FetchError) -> Duration {
        let factor = match error {
            FetchError::Blocked { .. } => self.blocked_factor,
            _ => self.transient_factor,
        };
        backoff.mul_f64(factor)
    }

    /// Waits the randomized courtesy delay that follows every success
    pub async fn polite_pause(&self) {
        let pause = self.jittered(self.base_delay);
        if !pause.is_zero() {
            tokio::time::sleep(pause).await;
        }
    }

    /// Drives `attempt` until it succeeds or the attempt budget runs out
    ///
    /// `on_blocked` is called after every blocked attempt so the caller can
    /// present a different identity on the next one. On success the polite
    /// pause is taken before the body is returned. When attempts run out the
    /// last failure is returned; no wait follows the final attempt.
    pub async fn run<A, Fut, B>(
        &self,
        url: &str,
        mut on_blocked: B,
        mut attempt: A,
    ) -> Result<String, FetchError>
    where
        A: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<String, FetchError>>,
        B: FnMut(),
    {
        let mut backoff = self.base_delay;
        let mut last_error = None;

        for number in 1..=self.max_attempts {
            match attempt(number).await {
                Ok(body) => {
                    tracing::debug!("Fetched {} on attempt {}", url, number);
                    self.polite_pause().await;
                    return Ok(body);
                }
                Err(error) => {
                    if matches!(error, FetchError::Blocked { .. }) {
                        on_blocked();
                    }

                    tracing::warn!(
                        "Attempt {}/{} for {} failed: {}",
                        number,
                        self.max_attempts,
                        url,
                        error
                    );

                    if number < self.max_attempts {
                        let wait = self.jittered(backoff);
                        if !wait.is_zero() {
                            tokio::time::sleep(wait).await;
                        }
                        backoff = self.next_backoff(backoff, &error);
                    }
                    last_error = Some(error);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| FetchError::transport(url, "no attempts were made")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn instant_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::ZERO)
    }

    fn blocked() -> FetchError {
        FetchError::Blocked {
            url: "u".to_string(),
            status: 403,
        }
    }

    fn unavailable() -> FetchError {
        FetchError::RateLimited {
            url: "u".to_string(),
            status: 503,
        }
    }

    #[test]
    fn test_jitter_bounds() {
        let policy = RetryPolicy::new(5, Duration::from_secs(10));
        for _ in 0..100 {
            let wait = policy.jittered(Duration::from_secs(10));
            assert!(wait >= Duration::from_secs(12));
            assert!(wait <= Duration::from_secs(16));
        }
        assert_eq!(policy.jittered(Duration::ZERO), Duration::ZERO);
    }

    #[test]
    fn test_backoff_growth() {
        let policy = RetryPolicy::default();
        let start = Duration::from_secs(10);

        assert_eq!(policy.next_backoff(start, &blocked()), Duration::from_secs(18));
        assert_eq!(policy.next_backoff(start, &unavailable()), Duration::from_secs(17));
        assert_eq!(
            policy.next_backoff(start, &FetchError::transport("u", "reset")),
            Duration::from_secs(17)
        );
    }

    #[test]
    fn test_zero_attempts_clamped() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts, 1);
    }

    #[tokio::test]
    async fn test_success_after_failures() {
        let policy = instant_policy(5);
        let rotations = Cell::new(0);

        let result = policy
            .run(
                "u",
                || rotations.set(rotations.get() + 1),
                |n| async move {
                    match n {
                        1 => Err(blocked()),
                        2 => Err(unavailable()),
                        _ => Ok("body".to_string()),
                    }
                },
            )
            .await;

        assert_eq!(result.unwrap(), "body");
        assert_eq!(rotations.get(), 1);
    }

    #[tokio::test]
    async fn test_exhaustion_returns_last_error() {
        let policy = instant_policy(5);
        let calls = Cell::new(0);

        let result = policy
            .run(
                "u",
                || {},
                |n| {
                    calls.set(calls.get() + 1);
                    async move {
                        if n == 5 {
                            Err(FetchError::transport("u", "final"))
                        } else {
                            Err(unavailable())
                        }
                    }
                },
            )
            .await;

        assert_eq!(calls.get(), 5);
        assert_eq!(result, Err(FetchError::transport("u", "final")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_is_followed_by_polite_pause() {
        let policy = RetryPolicy::new(3, Duration::from_secs(10));
        let start = tokio::time::Instant::now();

        let result = policy
            .run("u", || {}, |_| async { Ok("body".to_string()) })
            .await;
        assert_eq!(result.unwrap(), "body");

        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(12));
        assert!(elapsed <= Duration::from_secs(16) + Duration::from_millis(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_delay_means_no_pause() {
        let start = tokio::time::Instant::now();

        let result = instant_policy(3)
            .run("u", || {}, |_| async { Ok("body".to_string()) })
            .await;

        assert!(result.is_ok());
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_follow_backoff() {
        let policy = RetryPolicy::new(3, Duration::from_secs(10));
        let start = tokio::time::Instant::now();

        let result = policy
            .run("u", || {}, |_| async { Err::<String, _>(blocked()) })
            .await;
        assert!(result.is_err());

        // Two waits: 10s and 18s, each jittered by 1.2..=1.6, none after the last attempt
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs_f64(28.0 * 1.2));
        assert!(elapsed <= Duration::from_secs_f64(28.0 * 1.6) + Duration::from_millis(1));
    }
}
