//! Event collection helpers

use chan_dl::{AppState, Event, EventReceiver};
use std::time::Duration;

/// Collect events until `stop_predicate` matches or `timeout` elapses
pub async fn collect_events_until<F>(
    receiver: &mut EventReceiver,
    timeout: Duration,
    stop_predicate: F,
) -> Vec<Event>
where
    F: Fn(&Event) -> bool,
{
    let mut collected = Vec::new();

    let _ = tokio::time::timeout(timeout, async {
        while let Some(event) = receiver.recv().await {
            let should_stop = stop_predicate(&event);
            collected.push(event);
            if should_stop {
                break;
            }
        }
    })
    .await;

    collected
}

/// Collect events until `stop_predicate` matches, folding each into `state`.
///
/// Panics if no matching event arrives within `timeout`.
pub async fn drive_until<F>(
    receiver: &mut EventReceiver,
    state: &mut AppState,
    timeout: Duration,
    stop_predicate: F,
) -> Vec<Event>
where
    F: Fn(&Event) -> bool,
{
    let events = collect_events_until(receiver, timeout, &stop_predicate).await;
    assert!(
        events.last().is_some_and(|e| stop_predicate(e)),
        "timed out; received {} events: {:?}",
        events.len(),
        events
    );
    state.apply_all(events.iter().cloned());
    events
}
