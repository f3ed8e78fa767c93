//! Collaborator interfaces and the telemetry types they carry
//!
//! The engine never talks to a codec directly. Everything it needs from the
//! room (preset catalog, camera commands, telemetry, the panel control) goes
//! through these traits so the sequencing logic can run against real
//! hardware bindings or the simulated room alike.

use crate::core::error::DeviceError;
use crate::core::selection::{CameraId, PresetId, TrackingFeature};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use super::subscription::Subscription;

/// Preset as stored in the codec's catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetRecord {
    pub camera_id: CameraId,
    pub preset_id: PresetId,
    pub name: String,
    pub is_default: bool,
}

/// One movement telemetry sample for a camera
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MovementTick {
    pub camera_id: CameraId,
    pub pan: f32,
    pub tilt: f32,
    pub zoom: f32,
}

impl MovementTick {
    pub fn new(camera_id: CameraId, pan: f32, tilt: f32, zoom: f32) -> Self {
        Self { camera_id, pan, tilt, zoom }
    }

    /// A tick with every component at zero carries no movement
    pub fn is_moving(&self) -> bool {
        self.pan != 0.0 || self.tilt != 0.0 || self.zoom != 0.0
    }
}

/// Status reported by a tracking feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackingStatus {
    Active,
    Inactive,
    Follow,
    Off,
}

impl TrackingStatus {
    /// Whether the feature is currently driving the camera
    pub fn is_engaged(&self) -> bool {
        matches!(self, TrackingStatus::Active | TrackingStatus::Follow)
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "active" => Some(TrackingStatus::Active),
            "inactive" => Some(TrackingStatus::Inactive),
            "follow" => Some(TrackingStatus::Follow),
            "off" => Some(TrackingStatus::Off),
            _ => None,
        }
    }
}

impl fmt::Display for TrackingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackingStatus::Active => write!(f, "active"),
            TrackingStatus::Inactive => write!(f, "inactive"),
            TrackingStatus::Follow => write!(f, "follow"),
            TrackingStatus::Off => write!(f, "off"),
        }
    }
}

/// Call state as reported by the codec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallState {
    Idle,
    Connecting,
    Connected,
    Disconnecting,
}

/// A preset was recalled through a path outside the selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetActivation {
    pub preset_id: PresetId,
    pub camera_id: CameraId,
}

/// Value change reported by a panel widget
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiAction {
    pub control_id: String,
    pub value: String,
}

/// PresenterTrack modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenterTrackMode {
    Follow,
    Off,
}

/// A single tracking-mode command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingCommand {
    PresenterTrack(PresenterTrackMode),
    SpeakerTrack(bool),
    Frames(bool),
}

impl TrackingCommand {
    /// Whether the command switches its feature off
    pub fn is_deactivation(&self) -> bool {
        matches!(
            self,
            TrackingCommand::PresenterTrack(PresenterTrackMode::Off)
                | TrackingCommand::SpeakerTrack(false)
                | TrackingCommand::Frames(false)
        )
    }

    /// Feature the command drives
    pub fn feature(&self) -> TrackingFeature {
        match self {
            TrackingCommand::PresenterTrack(_) => TrackingFeature::Presenter,
            TrackingCommand::SpeakerTrack(_) => TrackingFeature::Speaker,
            TrackingCommand::Frames(_) => TrackingFeature::Frames,
        }
    }
}

impl fmt::Display for TrackingCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let on_off = |on: bool| if on { "on" } else { "off" };
        match self {
            TrackingCommand::PresenterTrack(PresenterTrackMode::Follow) => write!(f, "PresenterTrack=Follow"),
            TrackingCommand::PresenterTrack(PresenterTrackMode::Off) => write!(f, "PresenterTrack=Off"),
            TrackingCommand::SpeakerTrack(on) => write!(f, "SpeakerTrack={}", on_off(*on)),
            TrackingCommand::Frames(on) => write!(f, "Frames={}", on_off(*on)),
        }
    }
}

/// Tracking features the codec reports as available
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingCapabilities {
    pub presenter: bool,
    pub speaker: bool,
    pub frames: bool,
}

impl TrackingCapabilities {
    pub fn all() -> Self {
        Self {
            presenter: true,
            speaker: true,
            frames: true,
        }
    }

    pub fn from_features(features: &[TrackingFeature]) -> Self {
        Self {
            presenter: features.contains(&TrackingFeature::Presenter),
            speaker: features.contains(&TrackingFeature::Speaker),
            frames: features.contains(&TrackingFeature::Frames),
        }
    }

    pub fn supports(&self, feature: TrackingFeature) -> bool {
        match feature {
            TrackingFeature::Presenter => self.presenter,
            TrackingFeature::Speaker => self.speaker,
            TrackingFeature::Frames => self.frames,
            TrackingFeature::Manual => true,
        }
    }
}

/// Read access to the codec's preset catalog
#[async_trait]
pub trait PresetCatalog: Send + Sync {
    async fn list_presets(&self) -> Result<Vec<PresetRecord>, DeviceError>;

    async fn show_preset(&self, preset_id: PresetId) -> Result<PresetRecord, DeviceError>;
}

/// Camera and video-source commands
#[async_trait]
pub trait CameraControl: Send + Sync {
    /// Submit a preset recall. Returns once the codec accepted the command,
    /// not once the camera finished moving.
    async fn activate_preset(&self, preset_id: PresetId) -> Result<(), DeviceError>;

    async fn set_main_video_source(&self, camera_id: CameraId) -> Result<(), DeviceError>;

    async fn set_tracking_mode(&self, command: TrackingCommand) -> Result<(), DeviceError>;
}

/// Event streams published by the codec
#[async_trait]
pub trait Telemetry: Send + Sync {
    /// Movement ticks for one camera, or for every camera when `camera_id` is `None`
    async fn movement(&self, camera_id: Option<CameraId>) -> Result<Subscription<MovementTick>, DeviceError>;

    async fn tracking_status(&self, feature: TrackingFeature) -> Result<Subscription<TrackingStatus>, DeviceError>;

    async fn call_state(&self) -> Result<Subscription<CallState>, DeviceError>;

    /// Paths of configuration entries that changed
    async fn configuration_changed(&self) -> Result<Subscription<String>, DeviceError>;

    async fn preset_activated(&self) -> Result<Subscription<PresetActivation>, DeviceError>;

    async fn catalog_changed(&self) -> Result<Subscription<()>, DeviceError>;

    async fn ui_actions(&self) -> Result<Subscription<UiAction>, DeviceError>;
}

/// The selector widget on the room panel
#[async_trait]
pub trait UiControl: Send + Sync {
    async fn set_value(&self, control_id: &str, value: &str) -> Result<(), DeviceError>;

    async fn unset_value(&self, control_id: &str) -> Result<(), DeviceError>;

    /// Show an informational prompt to the operator
    async fn prompt(&self, title: &str, text: &str, duration_secs: u64) -> Result<(), DeviceError>;
}

/// Regenerates the panel markup from the current catalog and configuration
#[async_trait]
pub trait PanelBuilder: Send + Sync {
    async fn rebuild(&self) -> Result<(), DeviceError>;
}

/// Bundle of collaborators the engine runs against
#[derive(Clone)]
pub struct Collaborators {
    pub catalog: Arc<dyn PresetCatalog>,
    pub camera: Arc<dyn CameraControl>,
    pub telemetry: Arc<dyn Telemetry>,
    pub ui: Arc<dyn UiControl>,
    pub panel: Arc<dyn PanelBuilder>,
}

impl Collaborators {
    /// Use one object for every role
    pub fn from_room<R>(room: Arc<R>) -> Self
    where
        R: PresetCatalog + CameraControl + Telemetry + UiControl + PanelBuilder + 'static,
    {
        Self {
            catalog: room.clone(),
            camera: room.clone(),
            telemetry: room.clone(),
            ui: room.clone(),
            panel: room,
        }
    }
}
