// ── Health checkers ──
//
// Per-entity probing with status-transition detection. A batch check
// always collects every outcome before deciding anything: per-probe
// failures become degraded results, store failures abort the batch.

mod device;
mod link;

use std::future::Future;

use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

pub use device::{DeviceCheck, DeviceChecker, DeviceSummary, DeviceSweep};
pub use link::{LinkCheck, LinkChecker, LinkSummary, LinkSweep};

use crate::error::CoreError;

/// How a single entity check went.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckOutcome {
    /// The probe ran and produced a measurement.
    Probed,
    /// The probe itself failed; the entity is marked degraded.
    ProbeFailed,
    /// The check could not run (e.g. no address); status is unchanged.
    Skipped,
}

/// Run `make(item)` for every item with at most `limit` in flight,
/// returning every result in input order.
pub(crate) async fn fan_out<I, F, Fut, R>(items: I, limit: usize, make: F) -> Vec<R>
where
    I: IntoIterator,
    F: Fn(I::Item) -> Fut,
    Fut: Future<Output = R>,
{
    let permits = Semaphore::new(limit.max(1));
    let permits = &permits;
    let tasks: Vec<_> = items
        .into_iter()
        .map(|item| {
            let task = make(item);
            async move {
                let _permit = permits.acquire().await.ok();
                task.await
            }
        })
        .collect();
    join_all(tasks).await
}

/// Split batch results: hard failures abort, the rest are kept.
pub(crate) fn partition_results<T>(
    results: Vec<Result<T, CoreError>>,
    mut on_soft_error: impl FnMut(CoreError),
) -> Result<Vec<T>, CoreError> {
    let mut ok = Vec::with_capacity(results.len());
    let mut fatal = None;
    for result in results {
        match result {
            Ok(value) => ok.push(value),
            Err(e) if e.is_fatal() => {
                if fatal.is_none() {
                    fatal = Some(e);
                }
            }
            Err(e) => on_soft_error(e),
        }
    }
    match fatal {
        Some(e) => Err(e),
        None => Ok(ok),
    }
}
