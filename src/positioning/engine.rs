//! Positioning engine
//!
//! Wires the collaborators to the sequencer and reconciler, arms the
//! telemetry listeners and runs the event loop.

use super::gate::SuppressionGate;
use super::reconciler::SelectionReconciler;
use super::registry::{StartFn, SubscriptionRegistry};
use super::sequencer::CommandSequencer;
use super::settle::{SettleMonitor, SettleTiming};
use crate::core::config::Config;
use crate::core::events::{AppEvent, EventSender};
use crate::core::selection::TrackingFeature;
use crate::core::state::{SelectionMemory, SelectionSnapshot};
use crate::device::{Collaborators, Subscription, Telemetry, TrackingCapabilities};
use anyhow::Result;
use futures_util::FutureExt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Telemetry stream a listener forwards into the event loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Listener {
    UiActions,
    Movement,
    PresetActivated,
    CallState,
    Configuration,
    Catalog,
    Tracking(TrackingFeature),
}

/// Listeners armed regardless of capabilities
const FIXED_LISTENERS: [Listener; 6] = [
    Listener::UiActions,
    Listener::Movement,
    Listener::PresetActivated,
    Listener::CallState,
    Listener::Configuration,
    Listener::Catalog,
];

/// Tracking listeners, armed only when the codec has the feature
const TRACKING_LISTENERS: [(TrackingFeature, Listener); 3] = [
    (TrackingFeature::Presenter, Listener::Tracking(TrackingFeature::Presenter)),
    (TrackingFeature::Speaker, Listener::Tracking(TrackingFeature::Speaker)),
    (TrackingFeature::Frames, Listener::Tracking(TrackingFeature::Frames)),
];

impl Listener {
    fn name(&self) -> String {
        match self {
            Listener::UiActions => "ui.actions".to_string(),
            Listener::Movement => "camera.movement".to_string(),
            Listener::PresetActivated => "preset.activated".to_string(),
            Listener::CallState => "call.state".to_string(),
            Listener::Configuration => "config.changed".to_string(),
            Listener::Catalog => "preset.catalog".to_string(),
            Listener::Tracking(feature) => format!("tracking.{}", feature.as_str().to_lowercase()),
        }
    }

    async fn arm(self, telemetry: Arc<dyn Telemetry>, sender: EventSender) -> Result<()> {
        let name = self.name();
        match self {
            Listener::UiActions => forward(name, telemetry.ui_actions().await?, sender, AppEvent::UiAction),
            Listener::Movement => forward(name, telemetry.movement(None).await?, sender, AppEvent::CameraMoved),
            Listener::PresetActivated => forward(
                name,
                telemetry.preset_activated().await?,
                sender,
                AppEvent::PresetActivated,
            ),
            Listener::CallState => forward(name, telemetry.call_state().await?, sender, AppEvent::CallStateChanged),
            Listener::Configuration => forward(name, telemetry.configuration_changed().await?, sender, |path| {
                AppEvent::ConfigurationChanged { path }
            }),
            Listener::Catalog => forward(name, telemetry.catalog_changed().await?, sender, |_| AppEvent::CatalogChanged),
            Listener::Tracking(feature) => forward(
                name,
                telemetry.tracking_status(feature).await?,
                sender,
                move |status| AppEvent::TrackingStatusChanged { feature, status },
            ),
        }
        Ok(())
    }

    fn start_fn(self, telemetry: Arc<dyn Telemetry>, sender: EventSender) -> StartFn {
        Box::new(move || self.arm(telemetry, sender).boxed())
    }
}

/// Pump a subscription into the event channel until either side goes away
fn forward<T, F>(name: String, mut subscription: Subscription<T>, sender: EventSender, to_event: F)
where
    T: Send + 'static,
    F: Fn(T) -> AppEvent + Send + 'static,
{
    tokio::spawn(async move {
        while let Some(item) = subscription.recv().await {
            if sender.send(to_event(item)).is_err() {
                break;
            }
        }
        debug!("Listener '{}' stopped", name);
    });
}

pub struct PositioningEngine {
    config: Config,
    collaborators: Collaborators,
    reconciler: Arc<SelectionReconciler>,
    registry: SubscriptionRegistry,
    started: bool,
}

impl PositioningEngine {
    pub fn new(config: Config, collaborators: Collaborators) -> Self {
        let settle = SettleMonitor::new(
            Arc::clone(&collaborators.telemetry),
            SettleTiming {
                failsafe: config.timing.grace(),
                idle: config.timing.settle_idle(),
            },
        );
        let sequencer = Arc::new(CommandSequencer::new(
            Arc::clone(&collaborators.camera),
            Arc::clone(&collaborators.catalog),
            settle,
            SuppressionGate::new(),
            config.timing.clone(),
        ));
        let reconciler = Arc::new(SelectionReconciler::new(
            sequencer,
            Arc::clone(&collaborators.catalog),
            Arc::clone(&collaborators.ui),
            Arc::clone(&collaborators.panel),
            SelectionMemory::new(),
            config.control.clone(),
            config.call.clone(),
            config.timing.clone(),
        ));

        Self {
            config,
            collaborators,
            reconciler,
            registry: SubscriptionRegistry::new(),
            started: false,
        }
    }

    /// Arm the telemetry listeners and blank the selector. Returns the number
    /// of listeners armed by this call; starting again arms nothing and
    /// leaves the selector as it is.
    pub async fn start(&mut self, capabilities: TrackingCapabilities, sender: EventSender) -> Result<usize> {
        if self.registry.is_empty() {
            self.register_listeners(capabilities, &sender);
        }
        let summary = self.registry.start_all().await?;
        if self.started {
            warn!(
                "Positioning engine already started, {} listeners left running",
                summary.already_started
            );
            return Ok(summary.armed);
        }
        self.reconciler.reset().await;
        self.started = true;
        info!(
            "Positioning engine started (selector '{}')",
            self.config.control.widget_id
        );
        Ok(summary.armed)
    }

    fn register_listeners(&mut self, capabilities: TrackingCapabilities, sender: &EventSender) {
        let tracking = TRACKING_LISTENERS
            .iter()
            .filter(|(feature, _)| capabilities.supports(*feature))
            .map(|(_, listener)| *listener);

        for listener in FIXED_LISTENERS.into_iter().chain(tracking) {
            let start = listener.start_fn(Arc::clone(&self.collaborators.telemetry), sender.clone());
            self.registry.register(listener.name(), start);
        }
    }

    /// Dispatch events until `Shutdown` arrives or every sender is gone
    pub async fn run(&self, mut events: mpsc::UnboundedReceiver<AppEvent>) {
        while let Some(event) = events.recv().await {
            match event {
                AppEvent::UiAction(action) => {
                    // Sequences wait on the settle monitor, which needs the loop to keep flowing
                    let reconciler = Arc::clone(&self.reconciler);
                    tokio::spawn(async move { reconciler.handle_ui_action(&action).await });
                }
                AppEvent::CallStateChanged(state) => {
                    let reconciler = Arc::clone(&self.reconciler);
                    tokio::spawn(async move { reconciler.handle_call_state(state).await });
                }
                AppEvent::PresetActivated(activation) => self.reconciler.handle_preset_activated(activation).await,
                AppEvent::TrackingStatusChanged { feature, status } => {
                    self.reconciler.handle_tracking_status(feature, status).await
                }
                AppEvent::CameraMoved(tick) => self.reconciler.handle_camera_moved(tick).await,
                AppEvent::ConfigurationChanged { path } => {
                    self.reconciler
                        .handle_panel_change(&format!("configuration '{}' changed", path))
                        .await
                }
                AppEvent::CatalogChanged => self.reconciler.handle_panel_change("preset catalog changed").await,
                AppEvent::Shutdown => {
                    info!("Shutting down positioning engine");
                    return;
                }
            }
        }
        warn!("Event channel closed, positioning engine stopping");
    }

    pub fn snapshot(&self) -> SelectionSnapshot {
        self.reconciler.memory().snapshot()
    }

    pub fn gate(&self) -> &SuppressionGate {
        self.reconciler.gate()
    }
}
