//! Command sequencer
//!
//! Issues the ordered command sequences that move the room between presets
//! and tracking modes. Every sequence opens the suppression gate before the
//! first command and schedules its close on every exit path.

use super::gate::SuppressionGate;
use super::settle::{SettleMonitor, SettleOutcome};
use crate::core::config::TimingConfig;
use crate::core::error::{ActivationError, DeviceError};
use crate::core::selection::{PresetRef, TrackingFeature};
use crate::device::{commands, CameraControl, PresetCatalog, PresetRecord, TrackingCommand};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct CommandSequencer {
    camera: Arc<dyn CameraControl>,
    catalog: Arc<dyn PresetCatalog>,
    settle: SettleMonitor,
    gate: SuppressionGate,
    timing: TimingConfig,
}

impl CommandSequencer {
    pub fn new(
        camera: Arc<dyn CameraControl>,
        catalog: Arc<dyn PresetCatalog>,
        settle: SettleMonitor,
        gate: SuppressionGate,
        timing: TimingConfig,
    ) -> Self {
        Self {
            camera,
            catalog,
            settle,
            gate,
            timing,
        }
    }

    pub fn gate(&self) -> &SuppressionGate {
        &self.gate
    }

    /// Recall `preset` and make its camera the main video source
    pub async fn activate_preset(&self, preset: &PresetRef, cause: &str) -> Result<(), ActivationError> {
        self.gate.open();
        let result = self.run_preset_sequence(preset, cause).await;
        self.gate.schedule_close(self.timing.gate_close_delay());
        result
    }

    /// Switch to an automatic framing mode. Manual has no hardware mode and is rejected.
    pub async fn activate_tracking_mode(&self, feature: TrackingFeature, cause: &str) -> Result<(), ActivationError> {
        let Some(triple) = commands::activate(feature) else {
            return Err(ActivationError::failed(
                cause,
                DeviceError::Unsupported(format!("{} is not a tracking mode", feature)),
            ));
        };

        self.gate.open();
        info!("Activating {} tracking ({})", feature, cause);
        let result = self.send_tracking_triple(&triple, cause).await;
        self.gate.schedule_close(self.timing.gate_close_delay());
        result
    }

    /// Recall the first catalog preset flagged as default
    pub async fn activate_default_preset(&self, cause: &str) -> Result<PresetRecord, ActivationError> {
        let presets = self
            .catalog
            .list_presets()
            .await
            .map_err(|e| ActivationError::failed(cause, e))?;

        let Some(record) = presets.into_iter().find(|p| p.is_default) else {
            warn!("No default preset in catalog ({})", cause);
            return Err(ActivationError::NoDefaultPreset);
        };

        info!("Recalling default preset '{}' ({})", record.name, cause);
        let preset = PresetRef::new(record.camera_id, record.preset_id, record.name.clone());
        self.activate_preset(&preset, cause).await?;
        Ok(record)
    }

    async fn run_preset_sequence(&self, preset: &PresetRef, cause: &str) -> Result<(), ActivationError> {
        for command in commands::deactivate_all() {
            self.send_best_effort(command).await;
        }

        let (Some(camera_id), Some(preset_id)) = (preset.camera_id, preset.preset_id) else {
            warn!("Rejecting preset request with missing ids ({}): {:?}", cause, preset);
            return Err(ActivationError::InvalidPresetReference(format!(
                "camera_id={:?} preset_id={:?}",
                preset.camera_id, preset.preset_id
            )));
        };

        info!(
            "Recalling preset {} '{}' on camera {} ({})",
            preset_id,
            preset.name.as_deref().unwrap_or(""),
            camera_id,
            cause
        );
        self.camera
            .activate_preset(preset_id)
            .await
            .map_err(|e| ActivationError::failed(cause, e))?;

        if self.timing.wait_for_settle {
            match self.settle.await_settle(camera_id).await {
                SettleOutcome::Stopped => debug!("Camera {} settled", camera_id),
                SettleOutcome::TimedOut => debug!("Camera {} still moving at failsafe, switching anyway", camera_id),
            }
        }

        self.camera
            .set_main_video_source(camera_id)
            .await
            .map_err(|e| ActivationError::failed(cause, e))
    }

    async fn send_tracking_triple(&self, triple: &[TrackingCommand; 3], cause: &str) -> Result<(), ActivationError> {
        for command in triple {
            if command.is_deactivation() {
                self.send_best_effort(*command).await;
            } else {
                self.camera
                    .set_tracking_mode(*command)
                    .await
                    .map_err(|e| ActivationError::failed(cause, e))?;
            }
        }
        Ok(())
    }

    /// Switching a feature off is allowed to fail: the codec may lack it or it may already be off
    async fn send_best_effort(&self, command: TrackingCommand) {
        if let Err(e) = self.camera.set_tracking_mode(command).await {
            debug!("Ignoring failed {}: {}", command, e);
        }
    }
}
