//! Tracking command helpers
//!
//! Fixed command triples for each automatic framing mode. The three
//! features compete for the same camera, so every triple sets all of them.

use super::protocol::{PresenterTrackMode, TrackingCommand};
use crate::core::selection::TrackingFeature;

/// Commands that switch every tracking feature off, in the order they are sent
pub fn deactivate_all() -> [TrackingCommand; 3] {
    [
        TrackingCommand::SpeakerTrack(false),
        TrackingCommand::Frames(false),
        TrackingCommand::PresenterTrack(PresenterTrackMode::Off),
    ]
}

/// Commands that engage `feature`. `None` for Manual, which has no hardware mode.
pub fn activate(feature: TrackingFeature) -> Option<[TrackingCommand; 3]> {
    match feature {
        TrackingFeature::Presenter => Some([
            TrackingCommand::PresenterTrack(PresenterTrackMode::Follow),
            TrackingCommand::SpeakerTrack(false),
            TrackingCommand::Frames(false),
        ]),
        TrackingFeature::Speaker => Some([
            TrackingCommand::PresenterTrack(PresenterTrackMode::Off),
            TrackingCommand::SpeakerTrack(true),
            TrackingCommand::Frames(false),
        ]),
        TrackingFeature::Frames => Some([
            TrackingCommand::PresenterTrack(PresenterTrackMode::Off),
            TrackingCommand::SpeakerTrack(true),
            TrackingCommand::Frames(true),
        ]),
        TrackingFeature::Manual => None,
    }
}

/// Whether engaging `mode` also switches `feature` on. Frames needs
/// SpeakerTrack, so a Speaker status report during Frames is part of Frames.
pub fn engages(mode: TrackingFeature, feature: TrackingFeature) -> bool {
    activate(mode).is_some_and(|triple| {
        triple
            .iter()
            .any(|command| !command.is_deactivation() && command.feature() == feature)
    })
}
