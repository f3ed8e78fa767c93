//! Application event definitions

use crate::core::selection::TrackingFeature;
use crate::device::{CallState, MovementTick, PresetActivation, TrackingStatus, UiAction};
use tokio::sync::mpsc;

/// Cloneable handle listeners use to feed the engine's event loop
#[derive(Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<AppEvent>,
}

impl EventSender {
    pub fn new(tx: mpsc::UnboundedSender<AppEvent>) -> Self {
        Self { tx }
    }

    pub fn send(&self, event: AppEvent) -> Result<(), mpsc::error::SendError<AppEvent>> {
        self.tx.send(event)
    }
}

/// Create the engine's event channel
pub fn channel() -> (EventSender, mpsc::UnboundedReceiver<AppEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSender::new(tx), rx)
}

/// Events the positioning engine reacts to
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// A panel widget changed value
    UiAction(UiAction),

    /// A preset was recalled outside the selector
    PresetActivated(PresetActivation),

    /// A tracking feature changed status
    TrackingStatusChanged {
        feature: TrackingFeature,
        status: TrackingStatus,
    },

    /// A camera reported movement
    CameraMoved(MovementTick),

    /// The call state changed
    CallStateChanged(CallState),

    /// A configuration entry changed on the codec
    ConfigurationChanged { path: String },

    /// The preset catalog changed
    CatalogChanged,

    /// Stop the event loop
    Shutdown,
}
