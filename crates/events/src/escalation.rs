//! Delayed escalation timers keyed by alert slot.
//!
//! [`EscalationScheduler`] keeps at most one pending timer per
//! [`AlertKey`]. Scheduling a key that already has a timer cancels the old
//! one first, so re-raising an alert never stacks escalations.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use recon_core::alert::AlertKey;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

struct PendingEscalation {
    token: CancellationToken,
    /// Distinguishes a timer from the one that replaced it.
    generation: u64,
}

type PendingMap = Arc<Mutex<HashMap<AlertKey, PendingEscalation>>>;

#[derive(Default)]
pub struct EscalationScheduler {
    pending: PendingMap,
    next_generation: AtomicU64,
}

impl EscalationScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `task` after `delay` unless `key` is cancelled or rescheduled first.
    pub async fn schedule<F>(&self, key: AlertKey, delay: Duration, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let token = CancellationToken::new();
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);

        let previous = self.pending.lock().await.insert(
            key,
            PendingEscalation {
                token: token.clone(),
                generation,
            },
        );
        if let Some(previous) = previous {
            previous.token.cancel();
            tracing::debug!(vehicle_id = key.vehicle_id, step = %key.step, "Replaced pending escalation");
        }

        tracing::info!(
            vehicle_id = key.vehicle_id,
            step = %key.step,
            delay_secs = delay.as_secs(),
            "Escalation scheduled"
        );

        let pending = Arc::clone(&self.pending);
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::debug!(vehicle_id = key.vehicle_id, step = %key.step, "Escalation cancelled");
                }
                _ = tokio::time::sleep(delay) => {
                    {
                        let mut pending = pending.lock().await;
                        if pending.get(&key).is_some_and(|p| p.generation == generation) {
                            pending.remove(&key);
                        }
                    }
                    task.await;
                }
            }
        });
    }

    /// Cancel the pending escalation for `key`. Returns whether one existed.
    pub async fn cancel(&self, key: AlertKey) -> bool {
        match self.pending.lock().await.remove(&key) {
            Some(pending) => {
                pending.token.cancel();
                true
            }
            None => false,
        }
    }

    /// Cancel every pending escalation, returning how many were dropped.
    pub async fn cancel_all(&self) -> usize {
        let mut pending = self.pending.lock().await;
        let count = pending.len();
        for (_, p) in pending.drain() {
            p.token.cancel();
        }
        count
    }

    pub async fn is_pending(&self, key: AlertKey) -> bool {
        self.pending.lock().await.contains_key(&key)
    }

    pub async fn pending_count(&self) -> usize {
        self.pending.lock().await.len()
    }
}
