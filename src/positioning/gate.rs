//! Suppression gate
//!
//! Every programmatic camera change produces its own movement and status
//! telemetry. While the gate is active that telemetry is treated as an echo
//! of our own command rather than as the operator taking over.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

#[derive(Debug, Default)]
struct GateState {
    active: bool,
    /// Bumped on every open/close so a stale timer cannot close a newer window
    generation: u64,
    close_timer: Option<JoinHandle<()>>,
}

/// Shared suppression flag with a single replaceable close timer.
///
/// Cloning shares the same gate.
#[derive(Debug, Clone, Default)]
pub struct SuppressionGate {
    state: Arc<Mutex<GateState>>,
}

impl SuppressionGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark telemetry as self-inflicted until the next scheduled close fires
    pub fn open(&self) {
        let mut state = self.state.lock();
        if let Some(timer) = state.close_timer.take() {
            timer.abort();
        }
        state.generation += 1;
        state.active = true;
        debug!("Suppression gate opened (generation {})", state.generation);
    }

    /// Close the gate after `after`, replacing any pending close timer
    pub fn schedule_close(&self, after: Duration) {
        let mut state = self.state.lock();
        if let Some(timer) = state.close_timer.take() {
            timer.abort();
        }
        let generation = state.generation;
        let shared = Arc::clone(&self.state);

        state.close_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(after).await;
            let mut state = shared.lock();
            if state.generation == generation {
                state.active = false;
                state.close_timer = None;
                debug!("Suppression gate closed (generation {})", generation);
            }
        }));
    }

    pub fn is_active(&self) -> bool {
        self.state.lock().active
    }

    /// Whether a close timer is armed
    pub fn close_pending(&self) -> bool {
        self.state
            .lock()
            .close_timer
            .as_ref()
            .is_some_and(|timer| !timer.is_finished())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_open_then_close_after_delay() {
        let gate = SuppressionGate::new();
        assert!(!gate.is_active());

        gate.open();
        assert!(gate.is_active());

        gate.schedule_close(Duration::from_millis(500));
        tokio::time::sleep(Duration::from_millis(499)).await;
        assert!(gate.is_active());

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert!(!gate.is_active());
        assert!(!gate.close_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reschedule_replaces_timer() {
        let gate = SuppressionGate::new();
        gate.open();
        gate.schedule_close(Duration::from_millis(100));
        gate.schedule_close(Duration::from_millis(1000));

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(gate.is_active(), "first timer should have been replaced");

        tokio::time::sleep(Duration::from_millis(900)).await;
        assert!(!gate.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_cancels_pending_close() {
        let gate = SuppressionGate::new();
        gate.open();
        gate.schedule_close(Duration::from_millis(100));

        tokio::time::sleep(Duration::from_millis(50)).await;
        gate.open();
        assert!(!gate.close_pending());

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(gate.is_active(), "reopened gate must stay active until a new close is scheduled");

        gate.schedule_close(Duration::from_millis(100));
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(!gate.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_clones_share_gate() {
        let gate = SuppressionGate::new();
        let other = gate.clone();
        other.open();
        assert!(gate.is_active());
    }
}
