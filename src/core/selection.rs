//! Selection model and the selector control's value encoding
//!
//! The selector widget carries its value as an ordered `key:value` list
//! joined by `~`, for example:
//! - `Type:Preset~CameraId:2~PresetId:3~PresetName:Room`
//! - `Type:Automatic~Feature:Speaker`
//! - `Type:Unknown`

use super::error::SelectionError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Camera identifier as reported by the codec
pub type CameraId = u32;

/// Preset identifier as stored in the preset catalog
pub type PresetId = u32;

/// Separator between `key:value` pairs
pub const PAIR_DELIMITER: char = '~';

/// Separator between a key and its value
pub const KEY_DELIMITER: char = ':';

/// Automatic framing behaviours selectable from the control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TrackingFeature {
    Presenter,
    Speaker,
    Frames,
    /// Operator is driving the camera by hand
    Manual,
}

impl TrackingFeature {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackingFeature::Presenter => "Presenter",
            TrackingFeature::Speaker => "Speaker",
            TrackingFeature::Frames => "Frames",
            TrackingFeature::Manual => "Manual",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s {
            "Presenter" => Some(TrackingFeature::Presenter),
            "Speaker" => Some(TrackingFeature::Speaker),
            "Frames" => Some(TrackingFeature::Frames),
            "Manual" => Some(TrackingFeature::Manual),
            _ => None,
        }
    }

    /// Whether this feature maps to a hardware tracking mode
    pub fn is_automatic(&self) -> bool {
        !matches!(self, TrackingFeature::Manual)
    }
}

impl fmt::Display for TrackingFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to a preset as carried by the control.
///
/// Identifiers are optional here because the panel may send incomplete
/// payloads; the sequencer rejects references missing either id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetRef {
    pub camera_id: Option<CameraId>,
    pub preset_id: Option<PresetId>,
    pub name: Option<String>,
}

impl PresetRef {
    pub fn new(camera_id: CameraId, preset_id: PresetId, name: impl Into<String>) -> Self {
        Self {
            camera_id: Some(camera_id),
            preset_id: Some(preset_id),
            name: Some(name.into()),
        }
    }
}

/// What the selector control should currently display
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Selection {
    Preset(PresetRef),
    Tracking(TrackingFeature),
    #[default]
    Unknown,
}

impl Selection {
    pub fn is_manual(&self) -> bool {
        matches!(self, Selection::Tracking(TrackingFeature::Manual))
    }

    /// Encode into the control's `key:value~key:value` form
    pub fn encode(&self) -> String {
        let mut pairs: Vec<(&str, String)> = Vec::with_capacity(4);
        match self {
            Selection::Preset(preset) => {
                pairs.push(("Type", "Preset".to_string()));
                if let Some(camera_id) = preset.camera_id {
                    pairs.push(("CameraId", camera_id.to_string()));
                }
                if let Some(preset_id) = preset.preset_id {
                    pairs.push(("PresetId", preset_id.to_string()));
                }
                if let Some(name) = &preset.name {
                    pairs.push(("PresetName", name.clone()));
                }
            }
            Selection::Tracking(feature) => {
                pairs.push(("Type", "Automatic".to_string()));
                pairs.push(("Feature", feature.as_str().to_string()));
            }
            Selection::Unknown => pairs.push(("Type", "Unknown".to_string())),
        }

        pairs
            .iter()
            .map(|(k, v)| format!("{}{}{}", k, KEY_DELIMITER, v))
            .collect::<Vec<_>>()
            .join(&PAIR_DELIMITER.to_string())
    }

    /// Decode a control value. Anything outside the canonical forms is rejected,
    /// so every accepted value re-encodes to the exact same string.
    pub fn decode(s: &str) -> Result<Self, SelectionError> {
        let selection = Self::decode_pairs(s)?;
        if selection.encode() != s {
            return Err(SelectionError::malformed("keys or values not in canonical form", s));
        }
        Ok(selection)
    }

    fn decode_pairs(s: &str) -> Result<Self, SelectionError> {
        let pairs = split_pairs(s)?;

        let kind = lookup(&pairs, "Type").ok_or_else(|| SelectionError::missing("Type", s))?;
        match kind {
            "Preset" => {
                ensure_known_keys(&pairs, &["Type", "CameraId", "PresetId", "PresetName"], s)?;
                Ok(Selection::Preset(PresetRef {
                    camera_id: parse_id(&pairs, "CameraId", s)?,
                    preset_id: parse_id(&pairs, "PresetId", s)?,
                    name: lookup(&pairs, "PresetName").map(str::to_string),
                }))
            }
            "Automatic" => {
                ensure_known_keys(&pairs, &["Type", "Feature"], s)?;
                let feature = lookup(&pairs, "Feature")
                    .ok_or_else(|| SelectionError::missing("Feature", s))?;
                TrackingFeature::from_name(feature)
                    .map(Selection::Tracking)
                    .ok_or_else(|| SelectionError::malformed(format!("unknown feature '{}'", feature), s))
            }
            "Unknown" => {
                ensure_known_keys(&pairs, &["Type"], s)?;
                Ok(Selection::Unknown)
            }
            other => Err(SelectionError::malformed(format!("unknown type '{}'", other), s)),
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

fn split_pairs(s: &str) -> Result<Vec<(&str, &str)>, SelectionError> {
    if s.is_empty() {
        return Err(SelectionError::malformed("empty value", s));
    }

    let mut pairs: Vec<(&str, &str)> = Vec::new();
    for chunk in s.split(PAIR_DELIMITER) {
        let (key, value) = chunk
            .split_once(KEY_DELIMITER)
            .ok_or_else(|| SelectionError::malformed(format!("'{}' is not a key:value pair", chunk), s))?;
        if pairs.iter().any(|(k, _)| *k == key) {
            return Err(SelectionError::malformed(format!("duplicate key '{}'", key), s));
        }
        pairs.push((key, value));
    }
    Ok(pairs)
}

fn lookup<'a>(pairs: &[(&str, &'a str)], key: &str) -> Option<&'a str> {
    pairs.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

fn ensure_known_keys(pairs: &[(&str, &str)], known: &[&str], s: &str) -> Result<(), SelectionError> {
    match pairs.iter().find(|(k, _)| !known.contains(k)) {
        Some((key, _)) => Err(SelectionError::malformed(format!("unexpected key '{}'", key), s)),
        None => Ok(()),
    }
}

fn parse_id(pairs: &[(&str, &str)], key: &str, s: &str) -> Result<Option<u32>, SelectionError> {
    match lookup(pairs, key) {
        Some(raw) => raw
            .parse::<u32>()
            .map(Some)
            .map_err(|_| SelectionError::malformed(format!("{} '{}' is not an integer", key, raw), s)),
        None => Ok(None),
    }
}
