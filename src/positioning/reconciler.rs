//! Selection reconciler
//!
//! Turns every inbound event into "the selector should show X" and keeps the
//! control in line with it. If a value cannot be pushed the control is
//! unset, so the operator sees a blank selector rather than a stale one.

use super::gate::SuppressionGate;
use super::sequencer::CommandSequencer;
use crate::core::config::{CallConfig, ControlConfig, TimingConfig};
use crate::core::error::{ActivationError, ControlSyncError};
use crate::core::selection::{PresetRef, Selection, TrackingFeature};
use crate::core::state::SelectionMemory;
use crate::device::{
    commands, CallState, MovementTick, PanelBuilder, PresetActivation, PresetCatalog, TrackingStatus, UiAction, UiControl,
};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub struct SelectionReconciler {
    sequencer: Arc<CommandSequencer>,
    catalog: Arc<dyn PresetCatalog>,
    ui: Arc<dyn UiControl>,
    panel: Arc<dyn PanelBuilder>,
    gate: SuppressionGate,
    memory: SelectionMemory,
    control: ControlConfig,
    call: CallConfig,
    timing: TimingConfig,
    /// Tracking mode a selector press is switching to
    pending_mode: Mutex<Option<TrackingFeature>>,
}

impl SelectionReconciler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        sequencer: Arc<CommandSequencer>,
        catalog: Arc<dyn PresetCatalog>,
        ui: Arc<dyn UiControl>,
        panel: Arc<dyn PanelBuilder>,
        memory: SelectionMemory,
        control: ControlConfig,
        call: CallConfig,
        timing: TimingConfig,
    ) -> Self {
        let gate = sequencer.gate().clone();
        Self {
            sequencer,
            catalog,
            ui,
            panel,
            gate,
            memory,
            control,
            call,
            timing,
            pending_mode: Mutex::new(None),
        }
    }

    pub fn memory(&self) -> &SelectionMemory {
        &self.memory
    }

    pub fn gate(&self) -> &SuppressionGate {
        &self.gate
    }

    /// Forget whatever the control showed and blank it
    pub async fn reset(&self) {
        self.memory.set_current(Selection::Unknown);
        self.clear_control().await;
    }

    /// Operator pressed an entry on the selector
    pub async fn handle_ui_action(&self, action: &UiAction) {
        if action.control_id != self.control.widget_id {
            return;
        }

        let selection = match Selection::decode(&action.value) {
            Ok(selection) => selection,
            Err(e) => {
                warn!("Dropping selector value: {}", e);
                return;
            }
        };
        info!("Selector pressed: {}", selection);

        match selection {
            Selection::Preset(preset) => self.select_preset(preset).await,
            Selection::Tracking(TrackingFeature::Manual) => self.select_manual().await,
            Selection::Tracking(feature) => self.select_tracking(feature).await,
            Selection::Unknown => debug!("Ignoring press on an unknown selector entry"),
        }
    }

    /// A preset was recalled by something other than the selector
    pub async fn handle_preset_activated(&self, activation: PresetActivation) {
        self.gate.open();
        match self.catalog.show_preset(activation.preset_id).await {
            Ok(record) => {
                info!("Preset '{}' recalled externally", record.name);
                let selection = Selection::Preset(PresetRef::new(activation.camera_id, record.preset_id, record.name));
                self.display(selection).await;
            }
            Err(e) => {
                warn!("Cannot look up externally recalled preset {}: {}", activation.preset_id, e);
                self.memory.set_current(Selection::Unknown);
                self.clear_control().await;
            }
        }
        self.gate.schedule_close(self.timing.gate_close_delay());
    }

    /// A tracking feature reported a new status
    pub async fn handle_tracking_status(&self, feature: TrackingFeature, status: TrackingStatus) {
        if !status.is_engaged() {
            debug!("{} tracking now {}, display unchanged", feature, status);
            return;
        }
        if let Some(mode) = self.active_mode() {
            if mode != feature && commands::engages(mode, feature) {
                debug!("{} engaged as part of {}, display unchanged", feature, mode);
                return;
            }
        }
        self.gate.open();
        info!("{} tracking engaged", feature);
        self.display(Selection::Tracking(feature)).await;
        self.gate.schedule_close(self.timing.gate_close_delay());
    }

    /// A camera moved. Outside a suppression window that is the operator driving it.
    pub async fn handle_camera_moved(&self, tick: MovementTick) {
        if !tick.is_moving() {
            return;
        }
        if self.gate.is_active() {
            debug!("Camera {} movement suppressed", tick.camera_id);
            return;
        }
        if self.memory.current().is_manual() {
            return;
        }
        info!("Camera {} moved by hand, selector -> Manual", tick.camera_id);
        self.display(Selection::Tracking(TrackingFeature::Manual)).await;
    }

    pub async fn handle_call_state(&self, state: CallState) {
        if state != CallState::Connected || !self.call.default_preset_on_connect {
            return;
        }
        match self.sequencer.activate_default_preset("call connected").await {
            Ok(record) => {
                let selection = Selection::Preset(PresetRef::new(record.camera_id, record.preset_id, record.name));
                self.display(selection).await;
            }
            Err(ActivationError::NoDefaultPreset) => {}
            Err(e) => {
                error!("Default preset on call connect failed: {}", e);
                self.memory.set_current(Selection::Unknown);
                self.clear_control().await;
            }
        }
    }

    /// Catalog or configuration changed: the panel is rebuilt and the selection re-applied
    pub async fn handle_panel_change(&self, reason: &str) {
        info!("Rebuilding panel ({})", reason);
        if let Err(e) = self.panel.rebuild().await {
            error!("Panel rebuild failed: {}", e);
            return;
        }
        let current = self.memory.current();
        if current == Selection::Unknown {
            self.clear_control().await;
        } else {
            self.display(current).await;
        }
    }

    async fn select_preset(&self, preset: PresetRef) {
        match self.sequencer.activate_preset(&preset, "selector").await {
            Ok(()) => self.display(Selection::Preset(preset)).await,
            Err(e) => {
                error!("Preset selection failed: {}", e);
                self.memory.set_current(Selection::Unknown);
                self.clear_control().await;
            }
        }
    }

    async fn select_tracking(&self, feature: TrackingFeature) {
        *self.pending_mode.lock() = Some(feature);
        let result = self.sequencer.activate_tracking_mode(feature, "selector").await;
        match result {
            Ok(()) => self.display(Selection::Tracking(feature)).await,
            Err(e) => {
                error!("{} tracking selection failed: {}", feature, e);
                self.memory.set_current(Selection::Unknown);
                self.clear_control().await;
            }
        }
        *self.pending_mode.lock() = None;
    }

    /// Tracking mode being switched to, or else the one on display
    fn active_mode(&self) -> Option<TrackingFeature> {
        if let Some(mode) = *self.pending_mode.lock() {
            return Some(mode);
        }
        match self.memory.current() {
            Selection::Tracking(mode) => Some(mode),
            _ => None,
        }
    }

    /// Manual only informs the operator; the selector goes back to what it showed before
    async fn select_manual(&self) {
        self.gate.open();
        if let Err(e) = self
            .ui
            .prompt(
                &self.control.manual_prompt_title,
                &self.control.manual_prompt_text,
                self.control.manual_prompt_duration_secs,
            )
            .await
        {
            warn!("Manual prompt failed: {}", e);
        }

        match self.memory.last_selection() {
            Some(previous) => self.display(previous).await,
            None => {
                self.memory.set_current(Selection::Unknown);
                self.clear_control().await;
            }
        }
        self.gate.schedule_close(self.timing.gate_close_delay());
    }

    /// Record `selection` and push it to the control, unsetting the control on failure
    async fn display(&self, selection: Selection) {
        let value = selection.encode();
        self.memory.set_current(selection);

        if let Err(e) = self.push(&value).await {
            warn!("{}; unsetting selector", e);
            self.memory.set_current(Selection::Unknown);
            self.clear_control().await;
        }
    }

    async fn push(&self, value: &str) -> Result<(), ControlSyncError> {
        debug!("Selector <- {}", value);
        self.ui
            .set_value(&self.control.widget_id, value)
            .await
            .map_err(|source| ControlSyncError {
                control: self.control.widget_id.clone(),
                source,
            })
    }

    async fn clear_control(&self) {
        if let Err(e) = self.ui.unset_value(&self.control.widget_id).await {
            error!("Unsetting selector '{}' failed: {}", self.control.widget_id, e);
        }
    }
}
