//! Selection state shared by the reconciler and the sequencer

use super::selection::Selection;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;

/// Snapshot of what the selector shows and what it fell back from
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SelectionSnapshot {
    /// Selection currently displayed by the control
    pub current: Selection,
    /// Last selection that was not Manual
    pub last_non_manual: Option<Selection>,
}

impl SelectionSnapshot {
    /// Convert to JSON for the operator console
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Owned selection memory.
///
/// Cloning shares the same underlying state.
#[derive(Debug, Clone, Default)]
pub struct SelectionMemory {
    inner: Arc<Mutex<SelectionSnapshot>>,
}

impl SelectionMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record what the control now shows. Every displayed selection is
    /// remembered, so the fallback for a later Manual press is the last
    /// non-manual selection the control showed.
    pub fn set_current(&self, selection: Selection) {
        self.remember_selection(selection.clone());
        self.inner.lock().current = selection;
    }

    pub fn current(&self) -> Selection {
        self.inner.lock().current.clone()
    }

    /// Remember a selection to restore when the operator picks Manual.
    /// Manual and `Unknown` are never remembered.
    pub fn remember_selection(&self, selection: Selection) {
        if selection.is_manual() || selection == Selection::Unknown {
            return;
        }
        self.inner.lock().last_non_manual = Some(selection);
    }

    pub fn last_selection(&self) -> Option<Selection> {
        self.inner.lock().last_non_manual.clone()
    }

    pub fn snapshot(&self) -> SelectionSnapshot {
        self.inner.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::selection::{PresetRef, TrackingFeature};

    #[test]
    fn test_initial_state_is_unknown() {
        let memory = SelectionMemory::new();
        assert_eq!(memory.current(), Selection::Unknown);
        assert_eq!(memory.last_selection(), None);
    }

    #[test]
    fn test_manual_keeps_previous_fallback() {
        let memory = SelectionMemory::new();
        let preset = Selection::Preset(PresetRef::new(1, 2, "Lectern"));

        memory.set_current(preset.clone());
        memory.set_current(Selection::Tracking(TrackingFeature::Manual));

        assert!(memory.current().is_manual());
        assert_eq!(memory.last_selection(), Some(preset));
    }

    #[test]
    fn test_remember_ignores_manual_and_unknown() {
        let memory = SelectionMemory::new();
        memory.remember_selection(Selection::Tracking(TrackingFeature::Speaker));
        memory.remember_selection(Selection::Tracking(TrackingFeature::Manual));
        memory.remember_selection(Selection::Unknown);
        assert_eq!(memory.last_selection(), Some(Selection::Tracking(TrackingFeature::Speaker)));
    }

    #[test]
    fn test_clones_share_state() {
        let memory = SelectionMemory::new();
        let other = memory.clone();
        other.set_current(Selection::Tracking(TrackingFeature::Frames));
        assert_eq!(memory.current(), Selection::Tracking(TrackingFeature::Frames));
    }

    #[test]
    fn test_snapshot_json() {
        let memory = SelectionMemory::new();
        memory.set_current(Selection::Tracking(TrackingFeature::Speaker));
        let json = memory.snapshot().to_json();
        assert!(json.contains("\"current\":{\"Tracking\":\"Speaker\"}"));
    }
}
