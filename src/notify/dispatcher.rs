//! Notification Dispatcher
//!
//! One background worker owns the output backend and delivers tasks one at a
//! time, in submission order. Producers only enqueue and never wait on
//! delivery. Shutdown closes the intake; the worker drains what is already
//! queued and then stops.
//!
//! A delivery call that never returns stalls the worker; there is no
//! per-task timeout.

use chrono::Utc;
use futures::FutureExt;
use serde::Serialize;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::backend::NotificationBackend;
use super::types::{Emotion, NotificationTask};
use crate::error::{Result, RoadIqError};

/// Worker state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatcherState {
    /// Queue empty, worker waiting
    Idle,
    /// Worker processing a task
    Delivering,
    /// Intake closed and queue drained
    Stopped,
}

impl std::fmt::Display for DispatcherState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DispatcherState::Idle => write!(f, "idle"),
            DispatcherState::Delivering => write!(f, "delivering"),
            DispatcherState::Stopped => write!(f, "stopped"),
        }
    }
}

#[derive(Debug, Default)]
struct Counters {
    submitted: AtomicU64,
    delivered: AtomicU64,
    failed: AtomicU64,
}

/// Dispatcher statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DispatcherStats {
    pub submitted: u64,
    pub delivered: u64,
    pub failed: u64,
    /// Submitted but not yet consumed
    pub pending: u64,
}

struct Inner {
    tx: Mutex<Option<mpsc::UnboundedSender<NotificationTask>>>,
    worker: tokio::sync::Mutex<Option<JoinHandle<()>>>,
    state_rx: watch::Receiver<DispatcherState>,
    counters: Arc<Counters>,
    backend_name: String,
}

/// Cloneable handle to the single notification worker
#[derive(Clone)]
pub struct NotificationDispatcher {
    inner: Arc<Inner>,
}

impl NotificationDispatcher {
    /// Start the worker. Must be called inside a tokio runtime.
    pub fn spawn(backend: Arc<dyn NotificationBackend>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(DispatcherState::Idle);
        let counters = Arc::new(Counters::default());
        let backend_name = backend.name().to_string();

        let worker = tokio::spawn(run_worker(rx, backend, state_tx, counters.clone()));

        Self {
            inner: Arc::new(Inner {
                tx: Mutex::new(Some(tx)),
                worker: tokio::sync::Mutex::new(Some(worker)),
                state_rx,
                counters,
                backend_name,
            }),
        }
    }

    /// Enqueue a notification and return immediately.
    pub fn submit(&self, text: &str, emotion: Emotion) -> Result<Uuid> {
        let task = NotificationTask::new(text, emotion);
        let id = task.id;

        let guard = self.inner.tx.lock().unwrap_or_else(PoisonError::into_inner);
        let tx = guard.as_ref().ok_or(RoadIqError::DispatcherClosed)?;

        // Counted before sending so `pending` never underflows
        self.inner.counters.submitted.fetch_add(1, Ordering::SeqCst);
        if tx.send(task).is_err() {
            self.inner.counters.submitted.fetch_sub(1, Ordering::SeqCst);
            return Err(RoadIqError::DispatcherClosed);
        }

        debug!(%id, %emotion, "notification enqueued");
        Ok(id)
    }

    /// Close the intake, drain queued tasks, wait for the worker to stop.
    pub async fn shutdown(&self) {
        let sender = self
            .inner
            .tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if sender.is_some() {
            info!(
                backend = %self.inner.backend_name,
                pending = self.stats().pending,
                "notification dispatcher shutting down"
            );
        }
        drop(sender);

        let handle = self.inner.worker.lock().await.take();
        match handle {
            Some(handle) => {
                if let Err(e) = handle.await {
                    error!("notification worker terminated abnormally: {}", e);
                }
            }
            None => {
                let mut state = self.inner.state_rx.clone();
                while *state.borrow() != DispatcherState::Stopped {
                    if state.changed().await.is_err() {
                        break;
                    }
                }
            }
        }
    }

    pub fn state(&self) -> DispatcherState {
        *self.inner.state_rx.borrow()
    }

    /// Receiver for state transitions
    pub fn subscribe(&self) -> watch::Receiver<DispatcherState> {
        self.inner.state_rx.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.inner
            .tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    pub fn stats(&self) -> DispatcherStats {
        let c = &self.inner.counters;
        let submitted = c.submitted.load(Ordering::SeqCst);
        let delivered = c.delivered.load(Ordering::SeqCst);
        let failed = c.failed.load(Ordering::SeqCst);
        DispatcherStats {
            submitted,
            delivered,
            failed,
            pending: submitted.saturating_sub(delivered + failed),
        }
    }
}

async fn run_worker(
    mut rx: mpsc::UnboundedReceiver<NotificationTask>,
    backend: Arc<dyn NotificationBackend>,
    state: watch::Sender<DispatcherState>,
    counters: Arc<Counters>,
) {
    info!(backend = backend.name(), "notification worker started");

    while let Some(first) = rx.recv().await {
        let _ = state.send(DispatcherState::Delivering);

        let mut next = Some(first);
        while let Some(task) = next.take() {
            deliver_one(backend.as_ref(), task, &counters).await;
            next = rx.try_recv().ok();
        }

        let _ = state.send(DispatcherState::Idle);
    }

    let _ = state.send(DispatcherState::Stopped);
    info!(backend = backend.name(), "notification worker stopped");
}

/// Failures and panics consume the task; nothing is requeued.
async fn deliver_one(backend: &dyn NotificationBackend, task: NotificationTask, counters: &Counters) {
    let waited_ms = (Utc::now() - task.enqueued_at).num_milliseconds();

    match AssertUnwindSafe(backend.deliver(&task)).catch_unwind().await {
        Ok(Ok(())) => {
            counters.delivered.fetch_add(1, Ordering::SeqCst);
            debug!(id = %task.id, emotion = %task.emotion, waited_ms, "notification delivered");
        }
        Ok(Err(e)) => {
            counters.failed.fetch_add(1, Ordering::SeqCst);
            warn!(id = %task.id, waited_ms, "notification delivery failed: {}", e);
        }
        Err(_) => {
            counters.failed.fetch_add(1, Ordering::SeqCst);
            error!(id = %task.id, "notification backend panicked; task discarded");
        }
    }
}
