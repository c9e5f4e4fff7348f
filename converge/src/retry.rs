//! Bounded retry around a fetcher
//!
//! The waiter treats every fetch error as fatal. Callers that expect
//! transient failures (rate limits, connection resets) wrap their fetcher
//! here, so retrying a call and waiting for convergence stay separate.

use crate::fetch::{FetchResult, Fetcher};
use crate::interval::IntervalStrategy;
use async_trait::async_trait;
use std::time::Duration;

pub struct RetryFetcher<F, P> {
    inner: F,
    is_transient: P,
    max_retries: u32,
    backoff: IntervalStrategy,
}

impl<F, P> RetryFetcher<F, P>
where
    F: Fetcher,
    P: Fn(&F::Error) -> bool + Send + Sync,
{
    /// Retries errors for which `is_transient` returns true, at most
    /// `max_retries` times per fetch.
    pub fn new(inner: F, max_retries: u32, is_transient: P) -> Self {
        Self {
            inner,
            is_transient,
            max_retries,
            backoff: IntervalStrategy::exponential(
                Duration::from_millis(100),
                Duration::from_secs(10),
            )
            .with_jitter(0.2),
        }
    }

    pub fn with_backoff(mut self, backoff: IntervalStrategy) -> Self {
        self.backoff = backoff;
        self
    }

    fn delay_for(&self, retry: u32) -> Duration {
        self.backoff.next(retry, &mut rand::thread_rng())
    }
}

#[async_trait]
impl<F, P> Fetcher for RetryFetcher<F, P>
where
    F: Fetcher,
    P: Fn(&F::Error) -> bool + Send + Sync,
{
    type Status = F::Status;
    type Payload = F::Payload;
    type Error = F::Error;

    async fn fetch(&self) -> Result<FetchResult<Self::Status, Self::Payload>, Self::Error> {
        let mut retry = 0;

        loop {
            match self.inner.fetch().await {
                Ok(result) => return Ok(result),
                Err(err) if retry < self.max_retries && (self.is_transient)(&err) => {
                    retry += 1;
                    let delay = self.delay_for(retry);
                    tracing::debug!(
                        "Retrying status fetch after {:?} (retry {} of {}): {}",
                        delay,
                        retry,
                        self.max_retries,
                        err
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
