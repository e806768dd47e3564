//! Bounded dispatch of remote operations
//!
//! One control task walks a list of work items. For each item it acquires a
//! worker slot, then spawns the operation holding that slot. Results are
//! returned in submission order, not completion order.
//!
//! Cancellation is checked before and after every slot acquisition; items
//! not yet dispatched when it fires are handed back unscheduled.

mod cancel;
mod slots;

pub use cancel::CancelFlag;
pub use slots::{SlotGuard, WorkerSlots, DEFAULT_CONCURRENCY};

use std::future::Future;

/// Outcome of one fan-out
#[derive(Debug)]
pub struct FanOut<T, R> {
    /// Dispatched items with their result, in submission order.
    /// `Err` carries the reason a task died without producing a result.
    pub completed: Vec<(T, Result<R, String>)>,
    /// Items never dispatched because the run was cancelled
    pub unscheduled: Vec<T>,
    pub cancelled: bool,
}

impl<T, R> FanOut<T, R> {
    pub fn dispatched(&self) -> usize {
        self.completed.len()
    }
}

/// Run `task` once per item with at most `slots.capacity()` in flight
pub async fn fan_out<T, R, F, Fut>(
    items: Vec<T>,
    slots: &WorkerSlots,
    cancel: &CancelFlag,
    task: F,
) -> FanOut<T, R>
where
    T: Clone + Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> Fut,
    Fut: Future<Output = R> + Send + 'static,
{
    let mut handles = Vec::with_capacity(items.len());
    let mut unscheduled = Vec::new();
    let mut cancelled = false;
    let mut pending = items.into_iter();

    while let Some(item) = pending.next() {
        if cancel.is_cancelled() {
            cancelled = true;
            unscheduled.push(item);
            unscheduled.extend(pending.by_ref());
            break;
        }

        let guard = match slots.acquire().await {
            Ok(guard) => guard,
            Err(_) => {
                cancelled = true;
                unscheduled.push(item);
                unscheduled.extend(pending.by_ref());
                break;
            }
        };

        if cancel.is_cancelled() {
            drop(guard);
            cancelled = true;
            unscheduled.push(item);
            unscheduled.extend(pending.by_ref());
            break;
        }

        let work = task(item.clone());
        let handle = tokio::spawn(async move {
            let _guard = guard;
            work.await
        });
        handles.push((item, handle));
    }

    let mut completed = Vec::with_capacity(handles.len());
    for (item, handle) in handles {
        let result = handle.await.map_err(|e| format!("task failed: {}", e));
        completed.push((item, result));
    }

    FanOut {
        completed,
        unscheduled,
        cancelled,
    }
}
