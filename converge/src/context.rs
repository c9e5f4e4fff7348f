//! Cancellation context for waits
//!
//! A Context is the external stop signal of a wait. Cloning shares the
//! signal; `cancel()` on any clone stops every wait that holds one.
//! A context may also carry a deadline, after which it cancels itself.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{self, Instant};

#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    deadline: Option<Instant>,
    done: watch::Receiver<bool>,
    done_tx: watch::Sender<bool>,
}

impl Context {
    pub fn new() -> Self {
        let (done_tx, done_rx) = watch::channel(false);

        Self {
            inner: Arc::new(ContextInner {
                deadline: None,
                done: done_rx,
                done_tx,
            }),
        }
    }

    /// Derives a context that is cancelled when this one is, or when
    /// `timeout` elapses, whichever comes first.
    ///
    /// Must be called from within a tokio runtime.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let mut deadline = deadline_after(Instant::now(), timeout);
        if let Some(parent) = self.inner.deadline {
            deadline = deadline.min(parent);
        }

        let (done_tx, done_rx) = watch::channel(self.is_cancelled());

        let parent = self.clone();
        let done_tx_clone = done_tx.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = time::sleep_until(deadline) => {}
                _ = parent.cancelled() => {}
                _ = done_tx_clone.closed() => return,
            }
            let _ = done_tx_clone.send(true);
        });

        Self {
            inner: Arc::new(ContextInner {
                deadline: Some(deadline),
                done: done_rx,
                done_tx,
            }),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.inner.done.borrow()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline
    }

    /// True once the context's own deadline has passed
    pub fn is_expired(&self) -> bool {
        self.inner
            .deadline
            .is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Resolves once the context is cancelled
    pub async fn cancelled(&self) {
        let mut done = self.inner.done.clone();
        let _ = done.wait_for(|cancelled| *cancelled).await;
    }

    pub fn cancel(&self) {
        let _ = self.inner.done_tx.send(true);
    }
}

/// `start + budget`, or a point roughly 30 years out when the sum does not
/// fit in an `Instant`
pub(crate) fn deadline_after(start: Instant, budget: Duration) -> Instant {
    start
        .checked_add(budget)
        .unwrap_or_else(|| start + FAR_FUTURE)
}

const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("deadline", &self.inner.deadline)
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
