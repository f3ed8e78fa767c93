//! Camera Selector
//!
//! Keeps a room panel's camera selector in step with what the cameras are
//! actually doing.
//!
//! # Features
//! - Recalls presets and switches the main video source once the camera settles
//! - Switches between Presenter, Speaker and Frames tracking
//! - Mirrors external preset recalls and tracking changes on the selector
//! - Detects hand-driven camera movement and shows Manual
//! - Recalls the default preset when a call connects
//! - Simulated room and stdin console for running without a codec

pub mod console;
pub mod core;
pub mod device;
pub mod positioning;

pub use crate::core::config::Config;
pub use crate::core::events::AppEvent;
pub use crate::core::selection::{PresetRef, Selection, TrackingFeature};
pub use crate::core::state::{SelectionMemory, SelectionSnapshot};
pub use device::{Collaborators, SimulatedRoom, TrackingCapabilities};
pub use positioning::PositioningEngine;
