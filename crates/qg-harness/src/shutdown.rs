use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// ShutdownSignal
// ---------------------------------------------------------------------------

/// Broadcast-based shutdown coordinator with in-flight work tracking.
///
/// Loops `select!` on [`cancelled`](Self::cancelled) (or a raw receiver from
/// [`subscribe`](Self::subscribe)); long-running work polls
/// [`is_shutting_down`](Self::is_shutting_down) at safe points and holds an
/// [`InFlightGuard`] while it runs so shutdown can wait for it to drain.
///
/// ```ignore
/// let shutdown = ShutdownSignal::new();
///
/// tokio::select! {
///     _ = shutdown.cancelled() => { /* stop scheduling */ }
///     _ = ticker.tick() => {
///         let _busy = shutdown.enter();
///         run_cycle().await;
///     }
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    trigger: broadcast::Sender<()>,
    /// Atomic flag for cheap polling.
    shutting_down: Arc<AtomicBool>,
    /// Number of live [`InFlightGuard`]s.
    in_flight: Arc<watch::Sender<usize>>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (trigger, _) = broadcast::channel(1);
        let (in_flight, _) = watch::channel(0);
        Self {
            trigger,
            shutting_down: Arc::new(AtomicBool::new(false)),
            in_flight: Arc::new(in_flight),
        }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.trigger.subscribe()
    }

    /// Check if shutdown has been triggered (non-blocking).
    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::Relaxed)
    }

    /// Trigger shutdown for all subscribers.
    pub fn trigger(&self) {
        if self
            .shutting_down
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::Relaxed)
            .is_ok()
        {
            info!("shutdown signal triggered");
            let _ = self.trigger.send(());
        } else {
            warn!("shutdown already triggered");
        }
    }

    /// Resolves once shutdown has been triggered, including before this call.
    pub async fn cancelled(&self) {
        let mut rx = self.subscribe();
        if self.is_shutting_down() {
            return;
        }
        let _ = rx.recv().await;
    }

    /// Mark a unit of work as in flight until the guard is dropped.
    pub fn enter(&self) -> InFlightGuard {
        self.in_flight.send_modify(|count| *count += 1);
        InFlightGuard {
            in_flight: Arc::clone(&self.in_flight),
        }
    }

    pub fn in_flight(&self) -> usize {
        *self.in_flight.borrow()
    }

    /// Wait until no work is in flight, giving up after `timeout`.
    pub async fn wait_for_drain(&self, timeout: Duration) -> DrainResult {
        let deadline = tokio::time::Instant::now() + timeout;
        let mut rx = self.in_flight.subscribe();

        loop {
            let current = *rx.borrow_and_update();
            if current == 0 {
                info!("in-flight work drained");
                return DrainResult::Drained;
            }

            match tokio::time::timeout_at(deadline, rx.changed()).await {
                Ok(Ok(())) => continue,
                Ok(Err(_)) => return DrainResult::Drained,
                Err(_) => {
                    warn!(in_flight = current, "drain timeout, abandoning in-flight work");
                    return DrainResult::Timeout { in_flight: current };
                }
            }
        }
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// DrainResult
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrainResult {
    /// Nothing was left in flight.
    Drained,
    /// Timeout expired with work still running.
    Timeout { in_flight: usize },
}

impl DrainResult {
    pub fn is_complete(&self) -> bool {
        matches!(self, DrainResult::Drained)
    }
}

// ---------------------------------------------------------------------------
// InFlightGuard
// ---------------------------------------------------------------------------

/// RAII marker for in-flight work; decrements the count when dropped.
pub struct InFlightGuard {
    in_flight: Arc<watch::Sender<usize>>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.in_flight
            .send_modify(|count| *count = count.saturating_sub(1));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
