use backoff::{backoff::Backoff, ExponentialBackoff};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Doublings after which the pause stops growing.
const MAX_GROWTH_STEPS: u32 = 16;

/// How often to try an operation and how long to wait in between.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Pause before the second attempt.
    pub base_delay: Duration,
    /// Factor applied to the pause after every further attempt.
    pub multiplier: f64,
}

impl RetryPolicy {
    /// Same pause between every attempt.
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay: delay,
            multiplier: 1.0,
        }
    }

    /// Pause doubles after every attempt.
    pub fn exponential(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            multiplier: 2.0,
        }
    }

    fn backoff(&self) -> ExponentialBackoff {
        let growth = self.multiplier.max(1.0).powi(self.max_attempts.min(MAX_GROWTH_STEPS) as i32);
        let cap = Duration::try_from_secs_f64(self.base_delay.as_secs_f64() * growth).unwrap_or(Duration::MAX);
        ExponentialBackoff {
            current_interval: self.base_delay,
            initial_interval: self.base_delay,
            randomization_factor: 0.0,
            multiplier: self.multiplier,
            max_interval: cap,
            max_elapsed_time: None,
            ..Default::default()
        }
    }
}

/// Outcome of a single attempt that did not succeed.
#[derive(Debug)]
pub enum Attempt<E> {
    /// Worth trying again, e.g. a timeout.
    Transient(E),
    /// Trying again will not help.
    Permanent(E),
}

#[derive(Debug, thiserror::Error)]
pub enum RetryError<E: Display> {
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: E },

    #[error("attempt {attempt} failed permanently: {error}")]
    Permanent { attempt: u32, error: E },
}

impl<E: Display> RetryError<E> {
    pub fn attempts(&self) -> u32 {
        match self {
            RetryError::Exhausted { attempts, .. } => *attempts,
            RetryError::Permanent { attempt, .. } => *attempt,
        }
    }

    pub fn into_inner(self) -> E {
        match self {
            RetryError::Exhausted { last, .. } => last,
            RetryError::Permanent { error, .. } => error,
        }
    }
}

/// Run `operation` until it succeeds, fails permanently, or the policy's
/// attempt budget is spent. The closure receives the 1-based attempt number.
pub async fn retry_with_backoff<T, E, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    mut operation: F,
) -> Result<T, RetryError<E>>
where
    E: Display,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, Attempt<E>>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut backoff = policy.backoff();
    let mut attempt = 1;

    loop {
        match operation(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    debug!("{} succeeded on attempt {}", label, attempt);
                }
                return Ok(value);
            }
            Err(Attempt::Permanent(error)) => {
                return Err(RetryError::Permanent { attempt, error });
            }
            Err(Attempt::Transient(error)) => {
                if attempt >= max_attempts {
                    return Err(RetryError::Exhausted {
                        attempts: attempt,
                        last: error,
                    });
                }

                let delay = backoff.next_backoff().unwrap_or(policy.base_delay);
                warn!(
                    "{}: attempt {}/{} failed ({}), retrying in {:?}",
                    label, attempt, max_attempts, error, delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
