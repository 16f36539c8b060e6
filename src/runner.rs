//! Participant runner: drives a [`ParticipantAdapter`] from a delivery stream.
//!
//! Two execution contexts, as a bus consumer would have them:
//! - **delivery task** -- a spawned task that drains workitems one at a time
//!   into [`ParticipantAdapter::consume`];
//! - **control loop** -- the runner's own loop, which reads the delivery
//!   channel, queues workitems for the delivery task and dispatches
//!   `cancel`, `stop` and raw lifecycle tokens straight away.
//!
//! Workitems the delivery task has no room for wait in a local backlog, so
//! the control loop never blocks on a slow handler and a cancel is always
//! served.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::control::ControlSignal;
use crate::participant::{Handler, ParticipantAdapter};
use crate::transport::Delivery;
use crate::workitem::WorkItem;

/// Default grace period for in-flight workitems on shutdown.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Default number of workitems handed to the delivery task ahead of time.
pub const DEFAULT_CONSUMER_CAPACITY: usize = 16;

/// Why the runner stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// A `stop` delivery arrived.
    Stopped,
    /// A `die` control token arrived.
    Died,
    /// The delivery channel closed.
    ChannelClosed,
    /// The shutdown signal fired.
    Shutdown,
}

/// Counters collected over one [`ParticipantRunner::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    /// Why the runner stopped.
    pub exit: ExitReason,
    /// Workitems the handler accepted.
    pub consumed: u64,
    /// Workitems the handler failed on.
    pub failed: u64,
    /// Cancel deliveries dispatched.
    pub cancelled: u64,
}

#[derive(Debug, Default)]
struct Counters {
    consumed: AtomicU64,
    failed: AtomicU64,
}

/// Runs one participant until it is stopped.
pub struct ParticipantRunner<H: Handler> {
    adapter: Arc<ParticipantAdapter<H>>,
    shutdown_timeout: Duration,
    consumer_capacity: usize,
}

impl<H: Handler> std::fmt::Debug for ParticipantRunner<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParticipantRunner")
            .field("participant", &self.adapter.name())
            .field("shutdown_timeout", &self.shutdown_timeout)
            .finish_non_exhaustive()
    }
}

impl<H: Handler> ParticipantRunner<H> {
    /// Create a runner with default timeouts.
    pub fn new(adapter: Arc<ParticipantAdapter<H>>) -> Self {
        Self {
            adapter,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            consumer_capacity: DEFAULT_CONSUMER_CAPACITY,
        }
    }

    /// Grace period for queued workitems once the runner stops.
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Workitems buffered ahead of the delivery task (at least one).
    pub fn with_consumer_capacity(mut self, capacity: usize) -> Self {
        self.consumer_capacity = capacity.max(1);
        self
    }

    /// Process deliveries until stopped, then shut the participant down.
    ///
    /// On `stop`, channel close or shutdown, queued workitems get
    /// `shutdown_timeout` to finish before the handler receives its `stop`
    /// signal. On `die` the delivery task is aborted immediately.
    pub async fn run(
        self,
        mut deliveries: mpsc::Receiver<Delivery>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) -> RunReport {
        let participant = self.adapter.name().to_owned();
        info!(participant = %participant, "participant started");

        let counters = Arc::new(Counters::default());
        let (work_tx, work_rx) = mpsc::channel::<WorkItem>(self.consumer_capacity);
        let consumer = tokio::spawn(consume_loop(
            Arc::clone(&self.adapter),
            work_rx,
            Arc::clone(&counters),
        ));

        let mut cancelled: u64 = 0;
        let mut stop_item: Option<WorkItem> = None;
        let mut backlog: VecDeque<WorkItem> = VecDeque::new();

        let exit = loop {
            tokio::select! {
                permit = work_tx.reserve(), if !backlog.is_empty() => {
                    let Ok(permit) = permit else {
                        warn!(participant = %participant, "delivery task gone, stopping");
                        break ExitReason::ChannelClosed;
                    };
                    if let Some(workitem) = backlog.pop_front() {
                        permit.send(workitem);
                    }
                }
                delivery = deliveries.recv() => {
                    let Some(delivery) = delivery else {
                        info!(participant = %participant, "delivery channel closed");
                        break ExitReason::ChannelClosed;
                    };
                    match delivery {
                        Delivery::Consume { workitem } => backlog.push_back(workitem),
                        Delivery::Cancel { workitem } => {
                            cancelled = cancelled.saturating_add(1);
                            if let Err(e) = self.adapter.cancel(&workitem).await {
                                error!(participant = %participant, error = %e, "cancel handling failed");
                            }
                        }
                        Delivery::Stop { workitem } => {
                            stop_item = Some(workitem);
                            break ExitReason::Stopped;
                        }
                        Delivery::Control { token } => {
                            let signal = ControlSignal::new(token);
                            if signal.is_stop() {
                                break ExitReason::Stopped;
                            }
                            let die = signal.is_die();
                            if let Err(e) = self.adapter.lifecycle(signal).await {
                                error!(participant = %participant, error = %e, "lifecycle handling failed");
                            }
                            if die {
                                break ExitReason::Died;
                            }
                        }
                    }
                }
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        info!(participant = %participant, "shutdown requested");
                        break ExitReason::Shutdown;
                    }
                }
            }
        };

        if exit == ExitReason::Died {
            consumer.abort();
            warn!(
                participant = %participant,
                abandoned = backlog.len(),
                "participant died, in-flight work abandoned"
            );
        } else {
            self.drain(work_tx, backlog, consumer).await;
            let result = match &stop_item {
                Some(workitem) => self.adapter.stop(workitem).await,
                None => self.adapter.lifecycle(ControlSignal::stop()).await,
            };
            if let Err(e) = result {
                error!(participant = %participant, error = %e, "stop handling failed");
            }
        }

        let report = RunReport {
            exit,
            consumed: counters.consumed.load(Ordering::Relaxed),
            failed: counters.failed.load(Ordering::Relaxed),
            cancelled,
        };
        info!(
            participant = %participant,
            exit = ?report.exit,
            consumed = report.consumed,
            failed = report.failed,
            cancelled = report.cancelled,
            "participant stopped"
        );
        report
    }

    /// Hand over the backlog and wait for the delivery task to finish it,
    /// aborting on timeout.
    async fn drain(
        &self,
        work_tx: mpsc::Sender<WorkItem>,
        backlog: VecDeque<WorkItem>,
        mut consumer: JoinHandle<()>,
    ) {
        let finish = async {
            for workitem in backlog {
                if work_tx.send(workitem).await.is_err() {
                    break;
                }
            }
            drop(work_tx);
            (&mut consumer).await
        };
        let outcome = tokio::time::timeout(self.shutdown_timeout, finish).await;
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!(error = %e, "delivery task panicked"),
            Err(_) => {
                warn!(
                    timeout_secs = self.shutdown_timeout.as_secs(),
                    "delivery task did not drain in time, aborting"
                );
                consumer.abort();
            }
        }
    }
}

/// Delivery task body: one workitem at a time, errors logged and skipped.
async fn consume_loop<H: Handler>(
    adapter: Arc<ParticipantAdapter<H>>,
    mut work_rx: mpsc::Receiver<WorkItem>,
    counters: Arc<Counters>,
) {
    while let Some(workitem) = work_rx.recv().await {
        let fei = workitem
            .fei
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default();
        match adapter.consume(workitem).await {
            Ok(()) => {
                counters.consumed.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                counters.failed.fetch_add(1, Ordering::Relaxed);
                error!(
                    participant = %adapter.name(),
                    fei = %fei,
                    error = %e,
                    "workitem handling failed"
                );
            }
        }
    }
}
