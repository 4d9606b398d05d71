// ── Printer monitor ──
//
// One polling task per printer. Each cycle fetches status, classifies
// it, hands off to the reconnect supervisor when needed, fetches job
// telemetry while online, and publishes one immutable snapshot. The
// working snapshot is owned by the task; readers only ever see `Arc`s
// that went through the watch channel.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;
use ymir_api::{DeviceApi, HttpOutcome, RawFileListing, RawJobInformation, models};

use crate::classify::classify;
use crate::config::{MonitorConfig, PrinterEndpoint};
use crate::error::CoreError;
use crate::job_snapshot::JobSnapshotBuilder;
use crate::model::{ConnectivityState, JobSnapshot, PrinterFile, PrinterStatusSnapshot};
use crate::reconnect::{ReconnectAttemptState, ReconnectOutcome, ReconnectSupervisor};

// ── MonitorSnapshot ──────────────────────────────────────────────────

/// Everything the monitor knows about one printer after a cycle.
///
/// `status` and `job` are the last values successfully decoded and are
/// kept across failed polls. Use [`view`](Self::view) for the
/// reader-facing tuple, which hides them unless the printer is online.
#[derive(Debug, Clone, Serialize)]
pub struct MonitorSnapshot {
    pub printer_id: String,
    pub state: ConnectivityState,
    pub status: Option<Arc<PrinterStatusSnapshot>>,
    pub job: Option<Arc<JobSnapshot>>,
    #[serde(serialize_with = "serialize_error")]
    pub last_error: Option<CoreError>,
    /// Present only while `state` is `Reconnecting`.
    pub reconnect: Option<ReconnectAttemptState>,
    /// Completed poll cycles.
    pub cycle: u64,
    pub updated_at: DateTime<Utc>,
}

impl MonitorSnapshot {
    pub fn initial(printer_id: impl Into<String>) -> Self {
        Self {
            printer_id: printer_id.into(),
            state: ConnectivityState::Unknown,
            status: None,
            job: None,
            last_error: None,
            reconnect: None,
            cycle: 0,
            updated_at: Utc::now(),
        }
    }

    /// `(state, status?, job?)` with status and job present only when online.
    pub fn view(&self) -> (ConnectivityState, Option<&PrinterStatusSnapshot>, Option<&JobSnapshot>) {
        if self.state.is_online() {
            (self.state, self.status.as_deref(), self.job.as_deref())
        } else {
            (self.state, None, None)
        }
    }
}

#[allow(clippy::ref_option)]
fn serialize_error<S: Serializer>(error: &Option<CoreError>, s: S) -> Result<S::Ok, S::Error> {
    match error {
        Some(e) => s.serialize_some(&e.to_string()),
        None => s.serialize_none(),
    }
}

// ── PrinterMonitor ───────────────────────────────────────────────────

/// How a cycle ended, from the run loop's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CycleEnd {
    Completed,
    /// A connect command was accepted; poll again without waiting.
    Reconnected,
    Cancelled,
}

/// Polls one printer and publishes [`MonitorSnapshot`]s.
///
/// Use [`poll_once`](Self::poll_once) for a single cycle, or
/// [`spawn`](Self::spawn) to run the polling loop as a background task.
pub struct PrinterMonitor<C> {
    endpoint: PrinterEndpoint,
    config: MonitorConfig,
    client: Arc<C>,
    current: MonitorSnapshot,
    tx: watch::Sender<Arc<MonitorSnapshot>>,
}

impl<C: DeviceApi + 'static> PrinterMonitor<C> {
    pub fn new(endpoint: PrinterEndpoint, config: MonitorConfig, client: Arc<C>) -> Self {
        let current = MonitorSnapshot::initial(endpoint.id.clone());
        let (tx, _) = watch::channel(Arc::new(current.clone()));
        Self {
            endpoint,
            config,
            client,
            current,
            tx,
        }
    }

    pub fn endpoint(&self) -> &PrinterEndpoint {
        &self.endpoint
    }

    /// The most recently published snapshot.
    pub fn latest(&self) -> Arc<MonitorSnapshot> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<MonitorSnapshot>> {
        self.tx.subscribe()
    }

    /// Run exactly one poll cycle and return the published snapshot.
    pub async fn poll_once(&mut self) -> Arc<MonitorSnapshot> {
        let cancel = CancellationToken::new();
        self.run_cycle(&cancel).await;
        self.latest()
    }

    /// List the files stored on the printer host.
    pub async fn list_files(&self) -> Result<Vec<PrinterFile>, CoreError> {
        let outcome = self.client.fetch_files(self.config.request_timeout).await;
        let body = success_body(&outcome)?;
        let listing: RawFileListing = models::decode(body)?;
        Ok(listing.files.into_iter().map(PrinterFile::from).collect())
    }

    /// Start the polling loop on the tokio runtime.
    ///
    /// The first cycle runs immediately. Cancelling `cancel` (or calling
    /// [`MonitorHandle::stop`]) ends the task within one timer tick.
    pub fn spawn(self, cancel: CancellationToken) -> MonitorHandle {
        let printer_id = self.endpoint.id.clone();
        let rx = self.subscribe();
        let task_cancel = cancel.clone();
        let task = tokio::spawn(self.run(task_cancel));
        MonitorHandle {
            printer_id,
            session_id: Uuid::new_v4(),
            rx,
            cancel,
            task,
        }
    }

    async fn run(mut self, cancel: CancellationToken) {
        info!(printer = %self.endpoint.id, "monitor started");
        let mut repolled = false;

        loop {
            let end = self.run_cycle(&cancel).await;
            if end == CycleEnd::Cancelled {
                break;
            }

            // One immediate repoll per accepted reconnect.
            if end == CycleEnd::Reconnected && !repolled {
                repolled = true;
                continue;
            }
            repolled = false;

            let stopped = tokio::select! {
                biased;
                () = cancel.cancelled() => true,
                () = tokio::time::sleep(self.config.poll_interval) => false,
            };
            if stopped {
                break;
            }
        }

        debug!(printer = %self.endpoint.id, "monitor stopped");
    }

    // ── Cycle ────────────────────────────────────────────────────────

    async fn run_cycle(&mut self, cancel: &CancellationToken) -> CycleEnd {
        let timeout = self.config.request_timeout;
        let polled = tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            outcome = self.client.fetch_status(timeout) => Some(outcome),
        };
        let Some(outcome) = polled else {
            return CycleEnd::Cancelled;
        };
        debug!(printer = %self.endpoint.id, outcome = %outcome, "status polled");

        let classification = classify(&outcome, self.endpoint.auto_connect);
        let needs_reconnect = classification.needs_reconnect();
        let mut next = self.current.clone();
        next.cycle += 1;
        next.updated_at = Utc::now();
        next.state = classification.state;
        next.last_error = classification.error;
        next.reconnect = None;

        let mut end = CycleEnd::Completed;
        if needs_reconnect {
            match self.reconnect(&mut next, cancel).await {
                ReconnectOutcome::Succeeded { attempts } => {
                    info!(printer = %self.endpoint.id, attempts, "printer reconnected");
                    next.last_error = None;
                    end = CycleEnd::Reconnected;
                }
                ReconnectOutcome::Exhausted { attempts, last_error } => {
                    warn!(
                        printer = %self.endpoint.id,
                        attempts,
                        error = %last_error,
                        "reconnect exhausted, printer offline"
                    );
                    next.state = ConnectivityState::Offline;
                    next.last_error = Some(CoreError::ReconnectExhausted { attempts });
                }
                ReconnectOutcome::Forbidden { attempts } => {
                    warn!(
                        printer = %self.endpoint.id,
                        attempts,
                        "connect command forbidden, check the API key"
                    );
                    next.state = ConnectivityState::Forbidden;
                    next.last_error = Some(CoreError::Forbidden);
                }
                ReconnectOutcome::Cancelled { .. } => return CycleEnd::Cancelled,
            }
            next.reconnect = None;
            next.updated_at = Utc::now();
        } else if classification.state == ConnectivityState::Online {
            next.status = classification.status.map(Arc::new);
            let fetched = tokio::select! {
                biased;
                () = cancel.cancelled() => None,
                outcome = self.client.fetch_job(timeout) => Some(outcome),
            };
            let Some(outcome) = fetched else {
                return CycleEnd::Cancelled;
            };
            match job_from_outcome(&outcome) {
                Ok(job) => next.job = job.map(Arc::new),
                Err(e) => {
                    warn!(printer = %self.endpoint.id, error = %e, "job telemetry unusable");
                    next.last_error = Some(e);
                }
            }
        } else if let Some(e) = &next.last_error {
            // Transient failures repeat every cycle while the host is down.
            if e.is_transient() {
                debug!(printer = %self.endpoint.id, error = %e, "status poll failed");
            } else {
                warn!(printer = %self.endpoint.id, state = %next.state, error = %e, "status poll failed");
            }
        }

        self.publish(next);
        end
    }

    /// Run the supervisor, publishing each attempt state as it happens.
    async fn reconnect(
        &self,
        next: &mut MonitorSnapshot,
        cancel: &CancellationToken,
    ) -> ReconnectOutcome {
        self.log_transition(next.state);

        let tx = &self.tx;
        let mut supervisor = ReconnectSupervisor::new(
            self.client.as_ref(),
            self.config.reconnect.clone(),
            self.config.request_timeout,
            cancel.clone(),
        );
        supervisor
            .run(|attempt| {
                next.reconnect = Some(attempt.clone());
                next.updated_at = Utc::now();
                tx.send_replace(Arc::new(next.clone()));
            })
            .await
    }

    fn publish(&mut self, next: MonitorSnapshot) {
        self.log_transition(next.state);
        self.current = next;
        self.tx.send_replace(Arc::new(self.current.clone()));
    }

    fn log_transition(&self, to: ConnectivityState) {
        let from = self.tx.borrow().state;
        if from != to {
            info!(printer = %self.endpoint.id, %from, %to, "connectivity changed");
        }
    }
}

/// Decode job telemetry. Any failure leaves the previous job in place.
fn job_from_outcome(outcome: &HttpOutcome) -> Result<Option<JobSnapshot>, CoreError> {
    let body = success_body(outcome)?;
    let raw: RawJobInformation = models::decode(body)?;
    JobSnapshotBuilder::build(&raw)
}

fn success_body(outcome: &HttpOutcome) -> Result<&str, CoreError> {
    match CoreError::from_outcome(outcome) {
        Some(e) => Err(e),
        None => Ok(outcome.body().unwrap_or_default()),
    }
}

// ── MonitorHandle ────────────────────────────────────────────────────

/// Handle to a running monitor task.
pub struct MonitorHandle {
    printer_id: String,
    session_id: Uuid,
    rx: watch::Receiver<Arc<MonitorSnapshot>>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl MonitorHandle {
    pub fn printer_id(&self) -> &str {
        &self.printer_id
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn latest(&self) -> Arc<MonitorSnapshot> {
        self.rx.borrow().clone()
    }

    pub fn subscribe(&self) -> MonitorSubscription {
        MonitorSubscription::new(self.rx.clone())
    }

    /// Signal the task to stop without waiting for it.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Cancel the task and wait for it to exit.
    pub async fn stop(self) -> Result<(), CoreError> {
        self.cancel.cancel();
        self.task.await.map_err(|e| {
            CoreError::Internal(format!("monitor task for '{}' failed: {e}", self.printer_id))
        })
    }
}

// ── MonitorSubscription ──────────────────────────────────────────────

/// A subscription to one printer's snapshots.
///
/// Provides both point-in-time access and change notification.
pub struct MonitorSubscription {
    current: Arc<MonitorSnapshot>,
    receiver: watch::Receiver<Arc<MonitorSnapshot>>,
}

impl MonitorSubscription {
    pub(crate) fn new(mut receiver: watch::Receiver<Arc<MonitorSnapshot>>) -> Self {
        let current = receiver.borrow_and_update().clone();
        Self { current, receiver }
    }

    /// The snapshot captured at creation time or by the last `changed()`.
    pub fn current(&self) -> &Arc<MonitorSnapshot> {
        &self.current
    }

    /// The latest published snapshot.
    pub fn latest(&self) -> Arc<MonitorSnapshot> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next publication.
    /// Returns `None` once the monitor task has exited.
    pub async fn changed(&mut self) -> Option<Arc<MonitorSnapshot>> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = Arc::clone(&snap);
        Some(snap)
    }
}

// ── Tests ────────────────────────────────────────────────────────────
