//! In-memory room used by the operator console and the test suite
//!
//! `SimulatedRoom` plays every collaborator role: it keeps a preset catalog,
//! records each command it receives, publishes telemetry to subscribers and
//! can be told to reject specific commands.

use super::protocol::{
    CallState, CameraControl, MovementTick, PanelBuilder, PresenterTrackMode, PresetActivation, PresetCatalog,
    PresetRecord, Telemetry, TrackingCommand, TrackingStatus, UiAction, UiControl,
};
use super::subscription::Subscription;
use crate::core::config::SimulatorConfig;
use crate::core::error::DeviceError;
use crate::core::selection::{CameraId, PresetId, TrackingFeature};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Command received by the simulated room
#[derive(Debug, Clone, PartialEq)]
pub enum RoomCommand {
    ActivatePreset(PresetId),
    SetMainVideoSource(CameraId),
    SetTracking(TrackingCommand),
    SetValue { control_id: String, value: String },
    UnsetValue { control_id: String },
    Prompt { title: String },
    RebuildPanel,
}

impl RoomCommand {
    /// Commands that change camera or video state
    pub fn is_hardware_mutation(&self) -> bool {
        matches!(
            self,
            RoomCommand::ActivatePreset(_) | RoomCommand::SetMainVideoSource(_) | RoomCommand::SetTracking(_)
        )
    }
}

/// Commands the room should reject
#[derive(Debug, Clone, Copy, Default)]
pub struct FailurePlan {
    pub activate_preset: bool,
    pub main_video_source: bool,
    /// Reject commands that switch a tracking feature off
    pub tracking_deactivation: bool,
    /// Reject commands that switch a tracking feature on
    pub tracking_activation: bool,
    pub set_value: bool,
    pub show_preset: bool,
}

/// Movement the simulated cameras perform after a preset recall
#[derive(Debug, Clone, Copy)]
pub struct MotionProfile {
    pub ticks: u32,
    pub interval: Duration,
}

type Filter<T> = Box<dyn Fn(&T) -> bool + Send>;

struct Subscriber<T> {
    id: u64,
    filter: Filter<T>,
    tx: mpsc::UnboundedSender<T>,
}

struct HubInner<T> {
    next_id: u64,
    subscribers: Vec<Subscriber<T>>,
}

/// Fan-out point for one telemetry stream
struct Hub<T> {
    inner: Arc<Mutex<HubInner<T>>>,
    opened: Arc<AtomicUsize>,
}

impl<T: Clone + Send + 'static> Hub<T> {
    fn new(opened: Arc<AtomicUsize>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HubInner {
                next_id: 0,
                subscribers: Vec::new(),
            })),
            opened,
        }
    }

    fn subscribe(&self) -> Subscription<T> {
        self.subscribe_filtered(|_| true)
    }

    fn subscribe_filtered(&self, filter: impl Fn(&T) -> bool + Send + 'static) -> Subscription<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = {
            let mut inner = self.inner.lock();
            let id = inner.next_id;
            inner.next_id += 1;
            inner.subscribers.push(Subscriber {
                id,
                filter: Box::new(filter),
                tx,
            });
            id
        };
        self.opened.fetch_add(1, Ordering::SeqCst);

        let inner = Arc::clone(&self.inner);
        Subscription::new(rx, move || {
            inner.lock().subscribers.retain(|s| s.id != id);
        })
    }

    fn publish(&self, event: T) {
        let mut inner = self.inner.lock();
        inner
            .subscribers
            .retain(|s| !(s.filter)(&event) || s.tx.send(event.clone()).is_ok());
    }

    fn subscriber_count(&self) -> usize {
        self.inner.lock().subscribers.len()
    }
}

/// A room with cameras, a preset catalog and one touch panel, all in memory
pub struct SimulatedRoom {
    presets: Mutex<Vec<PresetRecord>>,
    commands: Mutex<Vec<RoomCommand>>,
    control_values: Mutex<HashMap<String, String>>,
    failures: Mutex<FailurePlan>,
    motion: Option<MotionProfile>,
    echo_tracking: bool,
    opened: Arc<AtomicUsize>,
    movement: Hub<MovementTick>,
    tracking: HashMap<TrackingFeature, Hub<TrackingStatus>>,
    call: Hub<CallState>,
    configuration: Hub<String>,
    preset_activated: Hub<PresetActivation>,
    catalog: Hub<()>,
    ui_actions: Hub<UiAction>,
}

impl SimulatedRoom {
    /// Create a room with the given catalog, no simulated motion and no echoes
    pub fn new(presets: Vec<PresetRecord>) -> Self {
        let opened = Arc::new(AtomicUsize::new(0));
        let tracking = [TrackingFeature::Presenter, TrackingFeature::Speaker, TrackingFeature::Frames]
            .into_iter()
            .map(|feature| (feature, Hub::new(Arc::clone(&opened))))
            .collect();

        Self {
            presets: Mutex::new(presets),
            commands: Mutex::new(Vec::new()),
            control_values: Mutex::new(HashMap::new()),
            failures: Mutex::new(FailurePlan::default()),
            motion: None,
            echo_tracking: false,
            movement: Hub::new(Arc::clone(&opened)),
            tracking,
            call: Hub::new(Arc::clone(&opened)),
            configuration: Hub::new(Arc::clone(&opened)),
            preset_activated: Hub::new(Arc::clone(&opened)),
            catalog: Hub::new(Arc::clone(&opened)),
            ui_actions: Hub::new(Arc::clone(&opened)),
            opened,
        }
    }

    /// Build the room described by the `[simulator]` config section
    pub fn from_config(config: &SimulatorConfig) -> Self {
        let presets = config
            .presets
            .iter()
            .map(|p| PresetRecord {
                camera_id: p.camera_id,
                preset_id: p.preset_id,
                name: p.name.clone(),
                is_default: p.default,
            })
            .collect();

        Self::new(presets)
            .with_motion(MotionProfile {
                ticks: config.motion_ticks,
                interval: Duration::from_millis(config.motion_interval_ms),
            })
            .with_tracking_echo()
    }

    /// Emit movement ticks after every accepted preset recall
    pub fn with_motion(mut self, motion: MotionProfile) -> Self {
        self.motion = Some(motion);
        self
    }

    /// Report tracking status changes for every accepted tracking command
    pub fn with_tracking_echo(mut self) -> Self {
        self.echo_tracking = true;
        self
    }

    pub fn set_failures(&self, plan: FailurePlan) {
        *self.failures.lock() = plan;
    }

    /// Commands received so far
    pub fn commands(&self) -> Vec<RoomCommand> {
        self.commands.lock().clone()
    }

    pub fn clear_commands(&self) {
        self.commands.lock().clear();
    }

    /// Current value of a panel widget, `None` if unset
    pub fn control_value(&self, control_id: &str) -> Option<String> {
        self.control_values.lock().get(control_id).cloned()
    }

    /// Total number of telemetry subscriptions ever opened
    pub fn subscriptions_opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// Subscribers currently attached to the movement stream
    pub fn movement_subscribers(&self) -> usize {
        self.movement.subscriber_count()
    }

    pub fn set_presets(&self, presets: Vec<PresetRecord>) {
        *self.presets.lock() = presets;
        self.catalog.publish(());
    }

    // ── telemetry injection ────────────────────────────────────────

    /// Operator pressed a selector entry on the panel
    pub fn press(&self, control_id: &str, value: &str) {
        self.ui_actions.publish(UiAction {
            control_id: control_id.to_string(),
            value: value.to_string(),
        });
    }

    pub fn move_camera(&self, tick: MovementTick) {
        self.movement.publish(tick);
    }

    /// A preset was recalled from outside the selector (remote, API, another macro)
    pub fn recall_externally(&self, preset_id: PresetId, camera_id: CameraId) {
        self.preset_activated.publish(PresetActivation { preset_id, camera_id });
    }

    pub fn report_tracking(&self, feature: TrackingFeature, status: TrackingStatus) {
        if let Some(hub) = self.tracking.get(&feature) {
            hub.publish(status);
        }
    }

    pub fn report_call_state(&self, state: CallState) {
        self.call.publish(state);
    }

    pub fn report_configuration_change(&self, path: &str) {
        self.configuration.publish(path.to_string());
    }

    pub fn report_catalog_change(&self) {
        self.catalog.publish(());
    }

    fn record(&self, command: RoomCommand) {
        debug!("Simulated room received {:?}", command);
        self.commands.lock().push(command);
    }

    fn spawn_motion(&self, camera_id: CameraId) {
        let Some(motion) = self.motion else {
            return;
        };
        let hub = Hub {
            inner: Arc::clone(&self.movement.inner),
            opened: Arc::clone(&self.opened),
        };

        tokio::spawn(async move {
            for step in 0..motion.ticks {
                tokio::time::sleep(motion.interval).await;
                let delta = 1.0 / (step as f32 + 1.0);
                hub.publish(MovementTick::new(camera_id, delta, delta / 2.0, 0.0));
            }
            tokio::time::sleep(motion.interval).await;
            hub.publish(MovementTick::new(camera_id, 0.0, 0.0, 0.0));
        });
    }

    fn echo(&self, command: TrackingCommand) {
        if !self.echo_tracking {
            return;
        }
        let (feature, status) = match command {
            TrackingCommand::PresenterTrack(PresenterTrackMode::Follow) => {
                (TrackingFeature::Presenter, TrackingStatus::Follow)
            }
            TrackingCommand::PresenterTrack(PresenterTrackMode::Off) => (TrackingFeature::Presenter, TrackingStatus::Off),
            TrackingCommand::SpeakerTrack(on) => (
                TrackingFeature::Speaker,
                if on { TrackingStatus::Active } else { TrackingStatus::Inactive },
            ),
            TrackingCommand::Frames(on) => (
                TrackingFeature::Frames,
                if on { TrackingStatus::Active } else { TrackingStatus::Inactive },
            ),
        };
        self.report_tracking(feature, status);
    }
}

#[async_trait]
impl PresetCatalog for SimulatedRoom {
    async fn list_presets(&self) -> Result<Vec<PresetRecord>, DeviceError> {
        Ok(self.presets.lock().clone())
    }

    async fn show_preset(&self, preset_id: PresetId) -> Result<PresetRecord, DeviceError> {
        if self.failures.lock().show_preset {
            return Err(DeviceError::rejected("preset lookup unavailable"));
        }
        self.presets
            .lock()
            .iter()
            .find(|p| p.preset_id == preset_id)
            .cloned()
            .ok_or_else(|| DeviceError::NotFound(format!("preset {}", preset_id)))
    }
}

#[async_trait]
impl CameraControl for SimulatedRoom {
    async fn activate_preset(&self, preset_id: PresetId) -> Result<(), DeviceError> {
        if self.failures.lock().activate_preset {
            return Err(DeviceError::rejected(format!("preset {} activation refused", preset_id)));
        }
        self.record(RoomCommand::ActivatePreset(preset_id));

        let camera_id = self
            .presets
            .lock()
            .iter()
            .find(|p| p.preset_id == preset_id)
            .map(|p| p.camera_id);
        if let Some(camera_id) = camera_id {
            self.spawn_motion(camera_id);
        }
        Ok(())
    }

    async fn set_main_video_source(&self, camera_id: CameraId) -> Result<(), DeviceError> {
        if self.failures.lock().main_video_source {
            return Err(DeviceError::rejected(format!("camera {} unavailable", camera_id)));
        }
        self.record(RoomCommand::SetMainVideoSource(camera_id));
        info!("Main video source -> camera {}", camera_id);
        Ok(())
    }

    async fn set_tracking_mode(&self, command: TrackingCommand) -> Result<(), DeviceError> {
        let plan = *self.failures.lock();
        let refused = if command.is_deactivation() {
            plan.tracking_deactivation
        } else {
            plan.tracking_activation
        };
        if refused {
            return Err(DeviceError::Unsupported(command.to_string()));
        }
        self.record(RoomCommand::SetTracking(command));
        self.echo(command);
        Ok(())
    }
}

#[async_trait]
impl Telemetry for SimulatedRoom {
    async fn movement(&self, camera_id: Option<CameraId>) -> Result<Subscription<MovementTick>, DeviceError> {
        Ok(match camera_id {
            Some(id) => self.movement.subscribe_filtered(move |tick| tick.camera_id == id),
            None => self.movement.subscribe(),
        })
    }

    async fn tracking_status(&self, feature: TrackingFeature) -> Result<Subscription<TrackingStatus>, DeviceError> {
        self.tracking
            .get(&feature)
            .map(Hub::subscribe)
            .ok_or_else(|| DeviceError::Unsupported(format!("{} tracking", feature)))
    }

    async fn call_state(&self) -> Result<Subscription<CallState>, DeviceError> {
        Ok(self.call.subscribe())
    }

    async fn configuration_changed(&self) -> Result<Subscription<String>, DeviceError> {
        Ok(self.configuration.subscribe())
    }

    async fn preset_activated(&self) -> Result<Subscription<PresetActivation>, DeviceError> {
        Ok(self.preset_activated.subscribe())
    }

    async fn catalog_changed(&self) -> Result<Subscription<()>, DeviceError> {
        Ok(self.catalog.subscribe())
    }

    async fn ui_actions(&self) -> Result<Subscription<UiAction>, DeviceError> {
        Ok(self.ui_actions.subscribe())
    }
}

#[async_trait]
impl UiControl for SimulatedRoom {
    async fn set_value(&self, control_id: &str, value: &str) -> Result<(), DeviceError> {
        if self.failures.lock().set_value {
            return Err(DeviceError::rejected(format!("widget '{}' refused value", control_id)));
        }
        self.record(RoomCommand::SetValue {
            control_id: control_id.to_string(),
            value: value.to_string(),
        });
        self.control_values
            .lock()
            .insert(control_id.to_string(), value.to_string());
        Ok(())
    }

    async fn unset_value(&self, control_id: &str) -> Result<(), DeviceError> {
        self.record(RoomCommand::UnsetValue {
            control_id: control_id.to_string(),
        });
        self.control_values.lock().remove(control_id);
        Ok(())
    }

    async fn prompt(&self, title: &str, text: &str, duration_secs: u64) -> Result<(), DeviceError> {
        info!("Panel prompt '{}' ({}s): {}", title, duration_secs, text);
        self.record(RoomCommand::Prompt {
            title: title.to_string(),
        });
        Ok(())
    }
}

#[async_trait]
impl PanelBuilder for SimulatedRoom {
    async fn rebuild(&self) -> Result<(), DeviceError> {
        self.record(RoomCommand::RebuildPanel);
        Ok(())
    }
}
