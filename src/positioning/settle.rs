//! Settle monitor
//!
//! Decides when a camera has stopped moving after a preset recall. A
//! failsafe timer bounds the whole wait; a shorter idle timer is re-armed by
//! every tick that shows movement and resolves the wait once the camera has
//! been quiet for its full duration.

use crate::core::selection::CameraId;
use crate::device::Telemetry;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

/// How a settle wait ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleOutcome {
    /// Movement stopped and stayed quiet for the idle window
    Stopped,
    /// The failsafe fired first
    TimedOut,
}

/// Settle monitor timings
#[derive(Debug, Clone, Copy)]
pub struct SettleTiming {
    pub failsafe: Duration,
    pub idle: Duration,
}

impl Default for SettleTiming {
    fn default() -> Self {
        Self {
            failsafe: Duration::from_millis(2500),
            idle: Duration::from_millis(250),
        }
    }
}

pub struct SettleMonitor {
    telemetry: Arc<dyn Telemetry>,
    timing: SettleTiming,
}

impl SettleMonitor {
    pub fn new(telemetry: Arc<dyn Telemetry>, timing: SettleTiming) -> Self {
        Self { telemetry, timing }
    }

    /// Wait until `camera_id` stops moving or the failsafe elapses. Never fails.
    pub async fn await_settle(&self, camera_id: CameraId) -> SettleOutcome {
        let failsafe = sleep(self.timing.failsafe);
        tokio::pin!(failsafe);

        let mut subscription = match self.telemetry.movement(Some(camera_id)).await {
            Ok(sub) => sub,
            Err(e) => {
                warn!("Cannot watch camera {} movement ({}), waiting out the failsafe", camera_id, e);
                failsafe.await;
                return SettleOutcome::TimedOut;
            }
        };

        let idle = sleep(self.timing.idle);
        tokio::pin!(idle);
        let mut idle_armed = false;
        let mut stream_open = true;

        let outcome = loop {
            tokio::select! {
                _ = &mut failsafe => break SettleOutcome::TimedOut,
                _ = &mut idle, if idle_armed => break SettleOutcome::Stopped,
                tick = subscription.recv(), if stream_open => match tick {
                    Some(tick) if tick.is_moving() => {
                        idle.as_mut().reset(Instant::now() + self.timing.idle);
                        idle_armed = true;
                    }
                    Some(_) => {}
                    None => {
                        debug!("Movement stream for camera {} ended during settle wait", camera_id);
                        stream_open = false;
                    }
                },
            }
        };

        subscription.unsubscribe();
        debug!("Camera {} settle wait finished: {:?}", camera_id, outcome);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{MovementTick, SimulatedRoom};

    fn assert_within(elapsed: Duration, expected_ms: u64) {
        let expected = Duration::from_millis(expected_ms);
        assert!(
            elapsed >= expected && elapsed < expected + Duration::from_millis(10),
            "elapsed {:?}, expected about {:?}",
            elapsed,
            expected
        );
    }

    fn monitor(room: &Arc<SimulatedRoom>) -> SettleMonitor {
        SettleMonitor::new(room.clone(), SettleTiming::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_without_movement() {
        let room = Arc::new(SimulatedRoom::new(Vec::new()));
        let monitor = monitor(&room);

        let start = Instant::now();
        let outcome = monitor.await_settle(1).await;

        assert_eq!(outcome, SettleOutcome::TimedOut);
        assert_within(start.elapsed(), 2500);
        assert_eq!(room.movement_subscribers(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_ticks_do_not_count_as_stop() {
        let room = Arc::new(SimulatedRoom::new(Vec::new()));
        let monitor = monitor(&room);

        let feeder = {
            let room = room.clone();
            tokio::spawn(async move {
                loop {
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    room.move_camera(MovementTick::new(1, 0.0, 0.0, 0.0));
                }
            })
        };

        let start = Instant::now();
        let outcome = monitor.await_settle(1).await;
        feeder.abort();

        assert_eq!(outcome, SettleOutcome::TimedOut);
        assert!(start.elapsed() >= Duration::from_millis(2500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_after_idle_window() {
        let room = Arc::new(SimulatedRoom::new(Vec::new()));
        let monitor = monitor(&room);

        let feeder = {
            let room = room.clone();
            tokio::spawn(async move {
                for _ in 0..5 {
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    room.move_camera(MovementTick::new(1, 0.2, 0.0, 0.0));
                }
            })
        };

        let start = Instant::now();
        let outcome = monitor.await_settle(1).await;

        assert_eq!(outcome, SettleOutcome::Stopped);
        // Last tick at 500ms, quiet for 250ms afterwards
        assert_within(start.elapsed(), 750);
        assert!(start.elapsed() < Duration::from_millis(2500));
        assert_eq!(room.movement_subscribers(), 0);
        feeder.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_camera_movement_is_ignored() {
        let room = Arc::new(SimulatedRoom::new(Vec::new()));
        let monitor = monitor(&room);

        let feeder = {
            let room = room.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(100)).await;
                room.move_camera(MovementTick::new(2, 1.0, 1.0, 1.0));
            })
        };

        let outcome = monitor.await_settle(1).await;
        assert_eq!(outcome, SettleOutcome::TimedOut);
        feeder.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_continuous_movement_hits_failsafe() {
        let room = Arc::new(SimulatedRoom::new(Vec::new()));
        let monitor = monitor(&room);

        let feeder = {
            let room = room.clone();
            tokio::spawn(async move {
                loop {
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    room.move_camera(MovementTick::new(1, 0.1, 0.0, 0.0));
                }
            })
        };

        let start = Instant::now();
        let outcome = monitor.await_settle(1).await;
        feeder.abort();

        assert_eq!(outcome, SettleOutcome::TimedOut);
        assert_within(start.elapsed(), 2500);
    }
}
