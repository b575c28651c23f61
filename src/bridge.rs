//! Execution bridge between the interactive context and the network context.
//!
//! A single background thread drives a current-thread tokio runtime. Every
//! network-bound job is submitted here and spawned on that runtime; results
//! travel back as immutable [`Event`] values over an unbounded channel that the
//! interactive context drains on its own schedule. Nothing on the background
//! side ever touches interactive state directly.
//!
//! There is no per-job cancellation. [`ExecutionBridge::shutdown`] stops the
//! loop and drops the runtime, abandoning in-flight jobs; their events are
//! discarded.

use crate::error::{Error, Result};
use crate::types::{Event, JobId};
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

/// Name of the background network thread
pub const BRIDGE_THREAD_NAME: &str = "chan-dl-net";

type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Handle to a submitted job
#[derive(Debug)]
pub struct JobHandle {
    id: JobId,
    done: oneshot::Receiver<()>,
}

impl JobHandle {
    /// Identifier assigned at submission
    pub fn id(&self) -> JobId {
        self.id
    }

    /// Wait for the job to end.
    ///
    /// Returns `true` if it ran to completion, `false` if it was abandoned by
    /// shutdown.
    pub async fn join(self) -> bool {
        self.done.await.is_ok()
    }
}

/// Sending half of the result channel, held by background jobs
#[derive(Clone, Debug)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<Event>,
    closed: CancellationToken,
}

impl EventSender {
    /// Queue an event for the interactive context.
    ///
    /// Dropped silently once shutdown has begun or the receiver is gone.
    pub fn send(&self, event: Event) {
        if self.closed.is_cancelled() {
            tracing::debug!(?event, "Dropping event after shutdown");
            return;
        }
        if self.tx.send(event).is_err() {
            tracing::debug!("Event receiver dropped, discarding event");
        }
    }
}

/// Receiving half of the result channel, owned by the interactive context
#[derive(Debug)]
pub struct EventReceiver {
    rx: mpsc::UnboundedReceiver<Event>,
}

impl EventReceiver {
    /// Wait for the next event. `None` once every sender is gone.
    pub async fn recv(&mut self) -> Option<Event> {
        self.rx.recv().await
    }

    /// Take the next event if one is queued, without waiting
    pub fn try_next(&mut self) -> Option<Event> {
        self.rx.try_recv().ok()
    }

    /// Take every queued event, in delivery order
    pub fn drain(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }
}

/// Perpetual single background execution context
pub struct ExecutionBridge {
    jobs_tx: mpsc::UnboundedSender<(JobId, Job)>,
    next_job_id: AtomicU64,
    shutdown: CancellationToken,
    thread: Mutex<Option<std::thread::JoinHandle<()>>>,
}

impl ExecutionBridge {
    /// Start the background thread and its event loop.
    ///
    /// Returns the bridge together with the event channel: the sender is for
    /// jobs, the receiver for the interactive context.
    pub fn start() -> Result<(Self, EventSender, EventReceiver)> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let (jobs_tx, jobs_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();

        let loop_shutdown = shutdown.clone();
        let thread = std::thread::Builder::new()
            .name(BRIDGE_THREAD_NAME.to_string())
            .spawn(move || run_forever(runtime, jobs_rx, loop_shutdown))?;

        tracing::info!(thread = BRIDGE_THREAD_NAME, "Execution bridge started");

        let bridge = Self {
            jobs_tx,
            next_job_id: AtomicU64::new(1),
            shutdown: shutdown.clone(),
            thread: Mutex::new(Some(thread)),
        };
        let sender = EventSender {
            tx: event_tx,
            closed: shutdown,
        };

        Ok((bridge, sender, EventReceiver { rx: event_rx }))
    }

    /// Schedule a job on the background context. Never blocks.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShuttingDown`] once shutdown has begun.
    pub fn submit<F>(&self, job: F) -> Result<JobHandle>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.shutdown.is_cancelled() {
            return Err(Error::ShuttingDown);
        }

        let id = JobId(self.next_job_id.fetch_add(1, Ordering::Relaxed));
        let (done_tx, done_rx) = oneshot::channel();
        let wrapped: Job = Box::pin(async move {
            job.await;
            let _ = done_tx.send(());
        });

        self.jobs_tx
            .send((id, wrapped))
            .map_err(|_| Error::ShuttingDown)?;

        tracing::debug!(job_id = %id, "Job submitted");
        Ok(JobHandle { id, done: done_rx })
    }

    /// Whether the background loop still accepts jobs
    pub fn is_running(&self) -> bool {
        !self.shutdown.is_cancelled() && !self.jobs_tx.is_closed()
    }

    /// Stop the background context, abandoning in-flight jobs.
    ///
    /// Waits for the background thread to exit unless called from it.
    pub fn shutdown(&self) {
        if self.shutdown.is_cancelled() {
            return;
        }
        self.shutdown.cancel();

        let handle = match self.thread.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };

        if let Some(handle) = handle {
            if handle.thread().id() == std::thread::current().id() {
                return;
            }
            if handle.join().is_err() {
                tracing::error!("Execution bridge thread panicked");
            }
        }
        tracing::info!("Execution bridge stopped");
    }
}

impl Drop for ExecutionBridge {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Drive the runtime until shutdown, spawning each submitted job
fn run_forever(
    runtime: tokio::runtime::Runtime,
    mut jobs_rx: mpsc::UnboundedReceiver<(JobId, Job)>,
    shutdown: CancellationToken,
) {
    runtime.block_on(async move {
        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                next = jobs_rx.recv() => match next {
                    Some((id, job)) => {
                        tracing::trace!(job_id = %id, "Job started");
                        tokio::spawn(job);
                    }
                    None => break,
                },
            }
        }
    });

    // Outstanding tasks are dropped without being polled again
    runtime.shutdown_background();
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ThreadRef;
    use std::time::Duration;

    #[tokio::test]
    async fn jobs_run_on_the_background_thread() {
        let (bridge, _events_tx, _events) = ExecutionBridge::start().unwrap();
        let (tx, rx) = oneshot::channel();

        let handle = bridge
            .submit(async move {
                let name = std::thread::current().name().map(str::to_string);
                tx.send(name).unwrap();
            })
            .unwrap();

        assert!(handle.join().await);
        assert_eq!(rx.await.unwrap().as_deref(), Some(BRIDGE_THREAD_NAME));
        bridge.shutdown();
    }

    #[tokio::test]
    async fn events_reach_the_receiver_in_order() {
        let (bridge, events_tx, mut events) = ExecutionBridge::start().unwrap();

        let handle = bridge
            .submit(async move {
                for id in ["1", "2", "3"] {
                    events_tx.send(Event::ThreadLoadFailed {
                        thread: ThreadRef::new("g", id),
                        error: "x".to_string(),
                    });
                }
            })
            .unwrap();
        assert!(handle.join().await);

        let ids: Vec<String> = events
            .drain()
            .into_iter()
            .map(|event| match event {
                Event::ThreadLoadFailed { thread, .. } => thread.thread_id,
                other => panic!("unexpected event {other:?}"),
            })
            .collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert!(events.try_next().is_none());
        bridge.shutdown();
    }

    #[tokio::test]
    async fn job_ids_are_distinct() {
        let (bridge, _events_tx, _events) = ExecutionBridge::start().unwrap();

        let first = bridge.submit(async {}).unwrap();
        let second = bridge.submit(async {}).unwrap();

        assert_ne!(first.id(), second.id());
        bridge.shutdown();
    }

    #[tokio::test]
    async fn shutdown_abandons_in_flight_jobs_and_their_events() {
        let (bridge, events_tx, mut events) = ExecutionBridge::start().unwrap();
        let (started_tx, started_rx) = oneshot::channel();

        let handle = bridge
            .submit(async move {
                started_tx.send(()).unwrap();
                tokio::time::sleep(Duration::from_secs(3600)).await;
                events_tx.send(Event::Shutdown);
            })
            .unwrap();

        started_rx.await.unwrap();
        bridge.shutdown();

        assert!(!handle.join().await, "job must be reported as abandoned");
        assert!(events.drain().is_empty());
        assert!(!bridge.is_running());
    }

    #[tokio::test]
    async fn submit_after_shutdown_is_rejected() {
        let (bridge, events_tx, mut events) = ExecutionBridge::start().unwrap();
        bridge.shutdown();
        bridge.shutdown();

        assert!(matches!(bridge.submit(async {}), Err(Error::ShuttingDown)));

        events_tx.send(Event::Shutdown);
        assert!(events.try_next().is_none());
    }
}
