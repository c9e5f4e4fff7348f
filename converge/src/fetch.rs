//! Status sources
//!
//! A Fetcher is whatever can answer "what is the status right now" for one
//! remote resource. The engine only calls it; retries of failed calls are
//! the fetcher's business (see [`crate::retry::RetryFetcher`]).

use crate::classify::Status;
use async_trait::async_trait;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

/// One observation: the status the engine classifies, plus the opaque
/// payload handed back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult<S, T> {
    pub status: S,
    pub payload: T,
}

impl<S, T> FetchResult<S, T> {
    pub fn new(status: S, payload: T) -> Self {
        Self { status, payload }
    }
}

impl<S> FetchResult<S, ()> {
    pub fn status_only(status: S) -> Self {
        Self {
            status,
            payload: (),
        }
    }
}

#[async_trait]
pub trait Fetcher: Send + Sync {
    type Status: Status;
    type Payload: Send + 'static;
    type Error: std::error::Error + Send + Sync + 'static;

    async fn fetch(&self) -> Result<FetchResult<Self::Status, Self::Payload>, Self::Error>;
}

#[async_trait]
impl<F: Fetcher + ?Sized> Fetcher for &F {
    type Status = F::Status;
    type Payload = F::Payload;
    type Error = F::Error;

    async fn fetch(&self) -> Result<FetchResult<Self::Status, Self::Payload>, Self::Error> {
        (**self).fetch().await
    }
}

#[async_trait]
impl<F: Fetcher + ?Sized> Fetcher for Arc<F> {
    type Status = F::Status;
    type Payload = F::Payload;
    type Error = F::Error;

    async fn fetch(&self) -> Result<FetchResult<Self::Status, Self::Payload>, Self::Error> {
        (**self).fetch().await
    }
}

/// Fetcher backed by an async closure, see [`fetch_fn`]
pub struct FnFetcher<F, S, T, E> {
    f: F,
    _marker: PhantomData<fn() -> (S, T, E)>,
}

/// Wraps an async closure returning `Result<FetchResult<S, T>, E>`
pub fn fetch_fn<F, Fut, S, T, E>(f: F) -> FnFetcher<F, S, T, E>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<FetchResult<S, T>, E>> + Send,
{
    FnFetcher {
        f,
        _marker: PhantomData,
    }
}

#[async_trait]
impl<F, Fut, S, T, E> Fetcher for FnFetcher<F, S, T, E>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<FetchResult<S, T>, E>> + Send,
    S: Status,
    T: Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    type Status = S;
    type Payload = T;
    type Error = E;

    async fn fetch(&self) -> Result<FetchResult<S, T>, E> {
        (self.f)().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug, thiserror::Error)]
    #[error("unreachable")]
    struct Unreachable;

    #[tokio::test]
    async fn closure_fetcher_calls_through() {
        let calls = AtomicU32::new(0);
        let fetcher = fetch_fn(|| async {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok::<_, Unreachable>(FetchResult::new("SCALING", n))
        });

        let first = fetcher.fetch().await.unwrap();
        let second = fetcher.fetch().await.unwrap();

        assert_eq!(first, FetchResult::new("SCALING", 1));
        assert_eq!(second.payload, 2);
    }

    #[tokio::test]
    async fn references_and_arcs_are_fetchers() {
        let fetcher = fetch_fn(|| async {
            Ok::<_, Unreachable>(FetchResult::status_only("READY"))
        });

        assert_eq!((&fetcher).fetch().await.unwrap().status, "READY");

        let shared = Arc::new(fetcher);
        assert_eq!(shared.fetch().await.unwrap().status, "READY");
    }

    #[tokio::test]
    async fn closure_errors_propagate() {
        let fetcher = fetch_fn(|| async { Err::<FetchResult<&str, ()>, _>(Unreachable) });

        assert!(fetcher.fetch().await.is_err());
    }
}
