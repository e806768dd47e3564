//! History scan driver
//!
//! Drains every listing page in sequence (each page needs the previous
//! page's cursor) and folds the events into a `HistoryAccumulator`.
//! Nothing is returned unless the final page was reached.

use std::collections::HashSet;

use crate::dispatch::CancelFlag;
use crate::observability::{log_event, Event, MetricsRegistry, ObservationScope};
use crate::store::{Cursor, EventSource};

use super::accumulator::HistoryAccumulator;
use super::errors::{ResolveError, ResolveResult};
use super::point::{RecoveryPoint, ResolvedSet};

/// Resolve the live set under `prefix` at `point`
pub async fn resolve<S>(prefix: &str, point: RecoveryPoint, source: &S) -> ResolveResult<ResolvedSet>
where
    S: EventSource + ?Sized,
{
    resolve_observed(prefix, point, source, &MetricsRegistry::new(), &CancelFlag::new()).await
}

/// Resolve with run counters and cancellation between pages
pub async fn resolve_observed<S>(
    prefix: &str,
    point: RecoveryPoint,
    source: &S,
    metrics: &MetricsRegistry,
    cancel: &CancelFlag,
) -> ResolveResult<ResolvedSet>
where
    S: EventSource + ?Sized,
{
    let point_str = point.to_string();
    let scope = ObservationScope::with_fields("RESOLVE", &[("prefix", prefix), ("point", &point_str)]);

    match scan(prefix, point, source, metrics, cancel).await {
        Ok(resolved) => {
            metrics.set_objects_resolved(resolved.len() as u64);
            scope.complete_with_fields(&[("resolved", &resolved.len().to_string())]);
            Ok(resolved)
        }
        Err(err) => {
            scope.fail(&err.to_string());
            Err(err)
        }
    }
}

async fn scan<S>(
    prefix: &str,
    point: RecoveryPoint,
    source: &S,
    metrics: &MetricsRegistry,
    cancel: &CancelFlag,
) -> ResolveResult<ResolvedSet>
where
    S: EventSource + ?Sized,
{
    let mut acc = HistoryAccumulator::new(point);
    let mut seen_cursors: HashSet<Cursor> = HashSet::new();
    let mut cursor: Option<Cursor> = None;
    let mut pages_read: u64 = 0;

    loop {
        if cancel.is_cancelled() {
            return Err(ResolveError::cancelled(pages_read));
        }

        let page = source
            .list_version_events(prefix, cursor.as_ref())
            .await
            .map_err(|e| ResolveError::source_unavailable(pages_read, e))?;

        pages_read += 1;
        let events = page.events.len() as u64;
        metrics.record_page(events);
        log_event(
            Event::ResolvePage,
            &[
                ("page", &pages_read.to_string()),
                ("events", &events.to_string()),
            ],
        );

        acc.observe_all(page.events);

        match page.next_cursor {
            None => break,
            Some(next) => {
                if !seen_cursors.insert(next.clone()) {
                    return Err(ResolveError::stalled_cursor(pages_read, next.as_str()));
                }
                cursor = Some(next);
            }
        }
    }

    Ok(acc.finish())
}
