//! Bounded retry with a pluggable backoff.

use std::future::Future;
use std::time::Duration;

/// Delay between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    None,
    Fixed { ms: u64 },
    /// `base_ms << (attempt - 1)`, capped at 30s.
    Exponential { base_ms: u64 },
}

impl Backoff {
    pub fn delay_after(&self, attempt: u32) -> Duration {
        match *self {
            Backoff::None => Duration::ZERO,
            Backoff::Fixed { ms } => Duration::from_millis(ms),
            Backoff::Exponential { base_ms } => {
                let shift = attempt.saturating_sub(1).min(16);
                Duration::from_millis(base_ms.saturating_mul(1u64 << shift).min(30_000))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Backoff) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// Runs `op` until it succeeds or `max_attempts` is reached.
    ///
    /// `op` receives the 1-based attempt number. On exhaustion the last
    /// error is returned together with the number of attempts made.
    pub async fn run<T, E, F, Fut>(&self, mut op: F) -> Result<Attempted<T>, Exhausted<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let max = self.max_attempts.max(1);
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match op(attempt).await {
                Ok(value) => {
                    return Ok(Attempted {
                        value,
                        attempts: attempt,
                    })
                }
                Err(e) if attempt < max => {
                    let delay = self.backoff.delay_after(attempt);
                    tracing::warn!(attempt, max, error = %e, delay_ms = delay.as_millis() as u64, "attempt failed, retrying");
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
                Err(e) => {
                    return Err(Exhausted {
                        last_error: e,
                        attempts: attempt,
                    })
                }
            }
        }
    }
}

#[derive(Debug)]
pub struct Attempted<T> {
    pub value: T,
    pub attempts: u32,
}

#[derive(Debug)]
pub struct Exhausted<E> {
    pub last_error: E,
    pub attempts: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn exponential_backoff_doubles_and_caps() {
        let b = Backoff::Exponential { base_ms: 500 };
        assert_eq!(b.delay_after(1), Duration::from_millis(500));
        assert_eq!(b.delay_after(2), Duration::from_millis(1000));
        assert_eq!(b.delay_after(3), Duration::from_millis(2000));
        assert_eq!(b.delay_after(40), Duration::from_millis(30_000));
    }

    #[test]
    fn zero_attempts_is_clamped_to_one() {
        assert_eq!(RetryPolicy::new(0, Backoff::None).max_attempts, 1);
    }

    #[tokio::test]
    async fn stops_after_first_success() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(5, Backoff::None);
        let out = policy
            .run(|attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt < 3 {
                        Err("nope")
                    } else {
                        Ok(attempt)
                    }
                }
            })
            .await
            .unwrap();
        assert_eq!(out.value, 3);
        assert_eq!(out.attempts, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(4, Backoff::Exponential { base_ms: 500 });
        let err = policy
            .run(|_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>("down") }
            })
            .await
            .unwrap_err();
        assert_eq!(err.attempts, 4);
        assert_eq!(err.last_error, "down");
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }
}
