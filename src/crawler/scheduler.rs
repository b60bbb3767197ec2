//! Completion-driven scheduler
//!
//! [`schedule`] keeps a fixed-size window of operations in flight over a
//! lazy source, emitting each result as its operation completes and
//! immediately starting a replacement. Implemented as a bounded pool on
//! [`tokio::task::JoinSet`] with a result channel: the dispatcher refills
//! the set on every completion, so the window stays full for as long as the
//! source lasts.

use std::future::Future;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

/// Runs `source` with at most `window` operations in flight
///
/// Results arrive on the returned channel in completion order, not
/// submission order; pair each operation with its own identifier (for
/// example via [`crate::crawler::Fetcher::fetch_tagged`]) if the caller
/// needs to correlate. The channel closes once the source is exhausted and
/// the last operation has completed.
///
/// `window` bounds logical operations only; network admission is the
/// fetcher's separate concern. A window of 0 is treated as 1.
///
/// Dropping the receiver abandons the in-flight operations (they are
/// aborted best-effort, with no promptness guarantee).
pub fn schedule<S, F, T>(source: S, window: usize) -> mpsc::Receiver<T>
where
    S: IntoIterator<Item = F> + Send + 'static,
    S::IntoIter: Send + 'static,
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    let (tx, rx) = mpsc::channel(1);
    let window = window.max(1);

    tokio::spawn(async move {
        let mut source = source.into_iter();
        let mut active = JoinSet::new();

        for op in source.by_ref().take(window) {
            active.spawn(op);
        }

        while let Some(completed) = active.join_next().await {
            // Refill before emitting so the window stays full while the
            // consumer is busy with the result.
            if let Some(op) = source.next() {
                active.spawn(op);
            }

            match completed {
                Ok(result) => {
                    if tx.send(result).await.is_err() {
                        active.abort_all();
                        break;
                    }
                }
                Err(e) if e.is_panic() => {
                    // One panicked operation must not wedge the window.
                    tracing::error!("Scheduled operation panicked: {}", e);
                }
                Err(_) => {}
            }
        }
    });

    rx
}
