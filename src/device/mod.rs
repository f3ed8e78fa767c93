//! Device module - collaborator interfaces for the codec, its cameras and the room panel

pub mod commands;
pub mod protocol;
pub mod sim;
mod subscription;

pub use protocol::{
    CallState, CameraControl, Collaborators, MovementTick, PanelBuilder, PresetActivation, PresetCatalog,
    PresetRecord, Telemetry, TrackingCapabilities, TrackingCommand, TrackingStatus, UiAction, UiControl,
};
pub use sim::SimulatedRoom;
pub use subscription::Subscription;
