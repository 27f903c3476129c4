//! Retrying async operations under a per-attempt time limit.

use std::convert::Infallible;
use std::future::Future;
use std::time::{Duration, Instant};

/// What to do after an attempt timed out or failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Next<T> {
    /// Run another attempt (subject to the attempt and deadline limits).
    Retry,
    /// Stop retrying and resolve with this value.
    Return(T),
    /// Stop retrying and fail with [`RetryError::Exhausted`].
    Stop,
}

/// Limits for a [`Retry`] run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryOptions {
    /// Maximum duration of a single attempt.
    pub time_limit: Duration,
    /// Pause between attempts.
    pub delay: Duration,
    /// Total number of attempts, including the first one.
    pub max_attempts: Option<u32>,
    /// Overall time budget across all attempts.
    pub deadline: Option<Duration>,
}

impl RetryOptions {
    /// Unlimited attempts of at most `time_limit` each, back to back.
    pub fn new(time_limit: Duration) -> Self {
        Self {
            time_limit,
            delay: Duration::ZERO,
            max_attempts: None,
            deadline: None,
        }
    }

    /// Wait `delay` before each retry.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Give up after `max_attempts` attempts in total.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Give up once `deadline` has passed since the first attempt started.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// Errors returned by [`Retry::run`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RetryError<E> {
    #[error("gave up after {attempts} attempt(s), each limited to {time_limit:?}")]
    Exhausted { attempts: u32, time_limit: Duration },

    #[error("{0}")]
    Operation(E),
}

type TimeoutHook<T> = Box<dyn FnMut(u32) -> Next<T> + Send>;
type ErrorHook<T, E> = Box<dyn FnMut(E, u32) -> Result<Next<T>, E> + Send>;

/// Retry driver for a fallible async operation.
///
/// By default a timed-out attempt is retried and an operation error is
/// returned as is. Hooks receive the 1-based number of the attempt that
/// just ended.
///
/// ```ignore
/// let value = Retry::new(RetryOptions::new(Duration::from_secs(5)).with_max_attempts(3))
///     .on_error(|err, _| if is_transient(&err) { Ok(Next::Retry) } else { Err(err) })
///     .run(|| fetch())
///     .await?;
/// ```
pub struct Retry<T, E> {
    options: RetryOptions,
    on_timeout_exceeded: Option<TimeoutHook<T>>,
    on_error: Option<ErrorHook<T, E>>,
}

impl<T, E> Retry<T, E> {
    pub fn new(options: RetryOptions) -> Self {
        Self {
            options,
            on_timeout_exceeded: None,
            on_error: None,
        }
    }

    /// Decide what happens when an attempt exceeds the time limit.
    pub fn on_timeout_exceeded(
        mut self,
        hook: impl FnMut(u32) -> Next<T> + Send + 'static,
    ) -> Self {
        self.on_timeout_exceeded = Some(Box::new(hook));
        self
    }

    /// Decide what happens when an attempt fails. Returning `Err` rethrows.
    pub fn on_error(
        mut self,
        hook: impl FnMut(E, u32) -> Result<Next<T>, E> + Send + 'static,
    ) -> Self {
        self.on_error = Some(Box::new(hook));
        self
    }

    /// Run `operation` until it succeeds, a hook ends the run, or a limit is hit.
    pub async fn run<F, Fut>(mut self, mut operation: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let started = Instant::now();
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;
            let limit = match self.options.deadline {
                Some(deadline) => self
                    .options
                    .time_limit
                    .min(deadline.saturating_sub(started.elapsed())),
                None => self.options.time_limit,
            };

            let next = match tokio::time::timeout(limit, operation()).await {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(err)) => match self.on_error.as_mut() {
                    Some(hook) => hook(err, attempts).map_err(RetryError::Operation)?,
                    None => return Err(RetryError::Operation(err)),
                },
                Err(_) => {
                    tracing::debug!(
                        attempt = attempts,
                        time_limit = ?limit,
                        "attempt exceeded time limit"
                    );
                    match self.on_timeout_exceeded.as_mut() {
                        Some(hook) => hook(attempts),
                        None => Next::Retry,
                    }
                }
            };

            match next {
                Next::Return(value) => return Ok(value),
                Next::Stop => return Err(self.exhausted(attempts)),
                Next::Retry => {}
            }

            if self
                .options
                .max_attempts
                .is_some_and(|max| attempts >= max)
            {
                return Err(self.exhausted(attempts));
            }
            if let Some(deadline) = self.options.deadline {
                if started.elapsed() + self.options.delay >= deadline {
                    return Err(self.exhausted(attempts));
                }
            }
            if !self.options.delay.is_zero() {
                tokio::time::sleep(self.options.delay).await;
            }
        }
    }

    fn exhausted(&self, attempts: u32) -> RetryError<E> {
        tracing::warn!(attempts, "giving up on retried operation");
        RetryError::Exhausted {
            attempts,
            time_limit: self.options.time_limit,
        }
    }
}

/// Placeholder callback type for calling [`timeout`] without a callback.
pub type NoCallback = fn() -> std::future::Ready<Result<(), Infallible>>;

/// Wait for `delay`, then run `callback` if one is given.
pub async fn timeout<T, E, F, Fut>(delay: Duration, callback: Option<F>) -> Result<Option<T>, E>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    tokio::time::sleep(delay).await;
    match callback {
        Some(callback) => callback().await.map(Some),
        None => Ok(None),
    }
}
