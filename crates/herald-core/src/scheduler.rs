//! Scheduler abstraction.
//!
//! Async handlers run on whatever the host considers a worker, and progress
//! messages may need to be marshaled back onto a privileged "main" execution
//! context (a single main-loop thread in many game hosts). The [`Scheduler`]
//! trait is that policy seam; the engine never spawns a task directly.

use futures::future::BoxFuture;

/// Task scheduling policy injected by the host.
pub trait Scheduler: Send + Sync {
    /// Runs a future on a background worker, fire-and-forget.
    fn spawn(&self, fut: BoxFuture<'static, ()>);

    /// Returns `true` if the host registered a privileged main context.
    ///
    /// When this is `false`, progress messages are delivered inline from the
    /// worker instead of being marshaled.
    fn has_main_context(&self) -> bool {
        false
    }

    /// Runs a future on the privileged main context.
    ///
    /// The default implementation falls back to [`spawn`](Self::spawn); hosts
    /// with a real main loop override both this and
    /// [`has_main_context`](Self::has_main_context).
    fn run_on_main(&self, fut: BoxFuture<'static, ()>) {
        self.spawn(fut);
    }
}

/// The default scheduler: plain `tokio::spawn`, no main context.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioScheduler;

impl Scheduler for TokioScheduler {
    fn spawn(&self, fut: BoxFuture<'static, ()>) {
        tokio::spawn(fut);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn tokio_scheduler_spawns() {
        let counter = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&counter);
        let (tx, rx) = tokio::sync::oneshot::channel();

        TokioScheduler.spawn(Box::pin(async move {
            c.fetch_add(1, Ordering::SeqCst);
            let _ = tx.send(());
        }));

        rx.await.unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(!TokioScheduler.has_main_context());
    }
}
