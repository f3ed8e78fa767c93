//! Configuration management

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::selection::{CameraId, PresetId, TrackingFeature};

/// Selector control configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlConfig {
    /// Widget id of the selector on the room panel
    #[serde(default = "default_widget_id")]
    pub widget_id: String,
    /// Title of the prompt shown when Manual is chosen
    #[serde(default = "default_manual_prompt_title")]
    pub manual_prompt_title: String,
    /// Body of the prompt shown when Manual is chosen
    #[serde(default = "default_manual_prompt_text")]
    pub manual_prompt_text: String,
    /// How long the Manual prompt stays on screen
    #[serde(default = "default_manual_prompt_duration")]
    pub manual_prompt_duration_secs: u64,
}

fn default_widget_id() -> String {
    "camera_selector".to_string()
}
fn default_manual_prompt_title() -> String {
    "Manual Camera Control".to_string()
}
fn default_manual_prompt_text() -> String {
    "Use the camera controls on the touch panel to frame the shot. The selector shows Manual once the camera moves.".to_string()
}
fn default_manual_prompt_duration() -> u64 {
    10
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            widget_id: default_widget_id(),
            manual_prompt_title: default_manual_prompt_title(),
            manual_prompt_text: default_manual_prompt_text(),
            manual_prompt_duration_secs: default_manual_prompt_duration(),
        }
    }
}

/// Settle and suppression timing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Grace window in milliseconds; also the settle failsafe
    #[serde(default = "default_grace")]
    pub grace_ms: u64,
    /// Movement silence that counts as settled, in milliseconds
    #[serde(default = "default_settle_idle")]
    pub settle_idle_ms: u64,
    /// Extra time the suppression gate stays open after the grace window
    #[serde(default = "default_gate_margin")]
    pub gate_margin_ms: u64,
    /// Wait for the camera to stop before switching the main source
    #[serde(default = "default_wait_for_settle")]
    pub wait_for_settle: bool,
}

fn default_grace() -> u64 {
    2500
}
fn default_settle_idle() -> u64 {
    250
}
fn default_gate_margin() -> u64 {
    500
}
fn default_wait_for_settle() -> bool {
    true
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            grace_ms: default_grace(),
            settle_idle_ms: default_settle_idle(),
            gate_margin_ms: default_gate_margin(),
            wait_for_settle: default_wait_for_settle(),
        }
    }
}

impl TimingConfig {
    pub fn grace(&self) -> Duration {
        Duration::from_millis(self.grace_ms)
    }

    pub fn settle_idle(&self) -> Duration {
        Duration::from_millis(self.settle_idle_ms)
    }

    /// Delay after which the suppression gate closes once a sequence ends
    pub fn gate_close_delay(&self) -> Duration {
        Duration::from_millis(self.grace_ms + self.gate_margin_ms)
    }
}

/// Call handling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallConfig {
    /// Recall the catalog's default preset when a call connects
    #[serde(default = "default_preset_on_connect")]
    pub default_preset_on_connect: bool,
}

fn default_preset_on_connect() -> bool {
    true
}

impl Default for CallConfig {
    fn default() -> Self {
        Self {
            default_preset_on_connect: default_preset_on_connect(),
        }
    }
}

/// Preset stored in the simulated room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulatedPreset {
    pub camera_id: CameraId,
    pub preset_id: PresetId,
    pub name: String,
    #[serde(default)]
    pub default: bool,
}

/// Simulated room used by the operator console
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Tracking features the simulated codec reports as available
    #[serde(default = "default_tracking")]
    pub tracking: Vec<TrackingFeature>,
    /// Movement ticks emitted after each preset recall
    #[serde(default = "default_motion_ticks")]
    pub motion_ticks: u32,
    /// Interval between movement ticks in milliseconds
    #[serde(default = "default_motion_interval")]
    pub motion_interval_ms: u64,
    /// Presets available in the catalog
    #[serde(default = "default_presets")]
    pub presets: Vec<SimulatedPreset>,
}

fn default_presets() -> Vec<SimulatedPreset> {
    vec![
        SimulatedPreset {
            camera_id: 1,
            preset_id: 1,
            name: "Room Overview".to_string(),
            default: true,
        },
        SimulatedPreset {
            camera_id: 1,
            preset_id: 2,
            name: "Lectern".to_string(),
            default: false,
        },
        SimulatedPreset {
            camera_id: 2,
            preset_id: 3,
            name: "Whiteboard".to_string(),
            default: false,
        },
    ]
}
fn default_tracking() -> Vec<TrackingFeature> {
    vec![TrackingFeature::Presenter, TrackingFeature::Speaker, TrackingFeature::Frames]
}
fn default_motion_ticks() -> u32 {
    6
}
fn default_motion_interval() -> u64 {
    80
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            tracking: default_tracking(),
            motion_ticks: default_motion_ticks(),
            motion_interval_ms: default_motion_interval(),
            presets: default_presets(),
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub control: ControlConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub call: CallConfig,
    #[serde(default)]
    pub simulator: SimulatorConfig,
}

impl Config {
    /// Load configuration from the platform config directory
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path, falling back to defaults if absent
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)
                .with_context(|| format!("Failed to read config file: {:?}", config_path))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save configuration to an explicit path
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "camera-selector", "CameraSelector")
            .context("Failed to determine config directory")?;
        Ok(proj_dirs.config_dir().join("config.toml"))
    }

    /// Get the default configuration embedded in the binary
    pub fn default_config_str() -> &'static str {
        include_str!("../../config/default.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.control.widget_id, "camera_selector");
        assert_eq!(config.timing.grace_ms, 2500);
        assert_eq!(config.timing.settle_idle_ms, 250);
        assert!(config.timing.wait_for_settle);
        assert!(config.call.default_preset_on_connect);
        assert_eq!(config.timing.gate_close_delay(), Duration::from_millis(3000));
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.control.widget_id, config.control.widget_id);
        assert_eq!(parsed.simulator.presets, config.simulator.presets);
    }

    #[test]
    fn test_embedded_default_config_parses() {
        let parsed: Config = toml::from_str(Config::default_config_str()).unwrap();
        assert_eq!(parsed.timing.grace_ms, 2500);
        assert_eq!(parsed.simulator.presets.len(), 3);
        assert!(parsed.simulator.presets[0].default);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let parsed: Config = toml::from_str("[timing]\nsettle_idle_ms = 400\n").unwrap();
        assert_eq!(parsed.timing.settle_idle_ms, 400);
        assert_eq!(parsed.timing.grace_ms, 2500);
        assert_eq!(parsed.control.widget_id, "camera_selector");
    }

    #[test]
    fn test_save_and_load_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.control.widget_id = "cam_picker".to_string();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.control.widget_id, "cam_picker");
    }

    #[test]
    fn test_missing_file_yields_default() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(loaded.timing.gate_margin_ms, 500);
    }
}
