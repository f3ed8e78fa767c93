//! Operator console commands
//!
//! One command per stdin line. Telemetry commands are injected into the
//! simulated room, which publishes them to the engine's listeners exactly as
//! a codec would.

use crate::core::selection::{CameraId, PresetId, TrackingFeature};
use crate::device::{CallState, MovementTick, SimulatedRoom, TrackingStatus};
use thiserror::Error;

pub const HELP: &str = "\
commands:
  press <payload>                    press the selector (e.g. Type:Automatic~Feature:Speaker)
  move <camera> <pan> <tilt> <zoom>  report camera movement
  recall <preset> <camera>           recall a preset outside the selector
  track <feature> <status>           report tracking status (presenter|speaker|frames, active|inactive|follow|off)
  call <connected|idle>              report call state
  catalog                            report a preset catalog change
  config                             report a configuration change
  status                             print the selection state as JSON
  quit                               stop";

#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    Press(String),
    Move(MovementTick),
    Recall { preset_id: PresetId, camera_id: CameraId },
    Track { feature: TrackingFeature, status: TrackingStatus },
    Call(CallState),
    Catalog,
    Config,
    Status,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConsoleError {
    #[error("unknown command '{0}', try 'help'")]
    UnknownCommand(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("invalid {what} '{value}'")]
    InvalidArgument { what: &'static str, value: String },
}

impl ConsoleError {
    fn invalid(what: &'static str, value: &str) -> Self {
        Self::InvalidArgument {
            what,
            value: value.to_string(),
        }
    }
}

impl ConsoleCommand {
    /// Parse one console line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Result<Option<Self>, ConsoleError> {
        let line = line.trim();
        let Some((word, rest)) = split_word(line) else {
            return Ok(None);
        };
        let args: Vec<&str> = rest.split_whitespace().collect();

        let command = match word.to_ascii_lowercase().as_str() {
            "press" => {
                if rest.is_empty() {
                    return Err(ConsoleError::Usage("press <payload>"));
                }
                ConsoleCommand::Press(rest.to_string())
            }
            "move" => {
                let [camera, pan, tilt, zoom] = args.as_slice() else {
                    return Err(ConsoleError::Usage("move <camera> <pan> <tilt> <zoom>"));
                };
                ConsoleCommand::Move(MovementTick::new(
                    parse_number(camera, "camera id")?,
                    parse_number(pan, "pan")?,
                    parse_number(tilt, "tilt")?,
                    parse_number(zoom, "zoom")?,
                ))
            }
            "recall" => {
                let [preset, camera] = args.as_slice() else {
                    return Err(ConsoleError::Usage("recall <preset> <camera>"));
                };
                ConsoleCommand::Recall {
                    preset_id: parse_number(preset, "preset id")?,
                    camera_id: parse_number(camera, "camera id")?,
                }
            }
            "track" => {
                let [feature, status] = args.as_slice() else {
                    return Err(ConsoleError::Usage("track <feature> <status>"));
                };
                ConsoleCommand::Track {
                    feature: parse_feature(feature)?,
                    status: TrackingStatus::from_name(status).ok_or_else(|| ConsoleError::invalid("status", status))?,
                }
            }
            "call" => {
                let [state] = args.as_slice() else {
                    return Err(ConsoleError::Usage("call <connected|idle>"));
                };
                match state.to_ascii_lowercase().as_str() {
                    "connected" => ConsoleCommand::Call(CallState::Connected),
                    "idle" => ConsoleCommand::Call(CallState::Idle),
                    _ => return Err(ConsoleError::invalid("call state", state)),
                }
            }
            "catalog" => ConsoleCommand::Catalog,
            "config" => ConsoleCommand::Config,
            "status" => ConsoleCommand::Status,
            "help" | "?" => ConsoleCommand::Help,
            "quit" | "exit" => ConsoleCommand::Quit,
            _ => return Err(ConsoleError::UnknownCommand(word.to_string())),
        };
        Ok(Some(command))
    }

    /// Publish a telemetry command through the room. Returns false for
    /// commands the caller handles itself.
    pub fn inject(&self, room: &SimulatedRoom, control_id: &str) -> bool {
        match self {
            ConsoleCommand::Press(payload) => room.press(control_id, payload),
            ConsoleCommand::Move(tick) => room.move_camera(*tick),
            ConsoleCommand::Recall { preset_id, camera_id } => room.recall_externally(*preset_id, *camera_id),
            ConsoleCommand::Track { feature, status } => room.report_tracking(*feature, *status),
            ConsoleCommand::Call(state) => room.report_call_state(*state),
            ConsoleCommand::Catalog => room.report_catalog_change(),
            ConsoleCommand::Config => room.report_configuration_change("console"),
            ConsoleCommand::Status | ConsoleCommand::Help | ConsoleCommand::Quit => return false,
        }
        true
    }
}

fn split_word(line: &str) -> Option<(&str, &str)> {
    if line.is_empty() {
        return None;
    }
    Some(match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    })
}

fn parse_number<T: std::str::FromStr>(value: &str, what: &'static str) -> Result<T, ConsoleError> {
    value.parse().map_err(|_| ConsoleError::invalid(what, value))
}

fn parse_feature(value: &str) -> Result<TrackingFeature, ConsoleError> {
    [TrackingFeature::Presenter, TrackingFeature::Speaker, TrackingFeature::Frames]
        .into_iter()
        .find(|f| f.as_str().eq_ignore_ascii_case(value))
        .ok_or_else(|| ConsoleError::invalid("tracking feature", value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_press_keeps_payload_verbatim() {
        let cmd = ConsoleCommand::parse("press Type:Preset~CameraId:2~PresetId:3~PresetName:Main Room")
            .unwrap()
            .unwrap();
        assert_eq!(
            cmd,
            ConsoleCommand::Press("Type:Preset~CameraId:2~PresetId:3~PresetName:Main Room".to_string())
        );
    }

    #[test]
    fn test_parse_move_and_recall() {
        assert_eq!(
            ConsoleCommand::parse("move 2 0.5 0 -1").unwrap(),
            Some(ConsoleCommand::Move(MovementTick::new(2, 0.5, 0.0, -1.0)))
        );
        assert_eq!(
            ConsoleCommand::parse("  recall 3 1 ").unwrap(),
            Some(ConsoleCommand::Recall {
                preset_id: 3,
                camera_id: 1
            })
        );
    }

    #[test]
    fn test_parse_track_is_case_insensitive() {
        assert_eq!(
            ConsoleCommand::parse("track Speaker ACTIVE").unwrap(),
            Some(ConsoleCommand::Track {
                feature: TrackingFeature::Speaker,
                status: TrackingStatus::Active
            })
        );
        assert_eq!(
            ConsoleCommand::parse("track manual active"),
            Err(ConsoleError::invalid("tracking feature", "manual"))
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(ConsoleCommand::parse("").unwrap(), None);
        assert_eq!(
            ConsoleCommand::parse("jump"),
            Err(ConsoleError::UnknownCommand("jump".to_string()))
        );
        assert!(matches!(ConsoleCommand::parse("move 1 2"), Err(ConsoleError::Usage(_))));
        assert!(matches!(ConsoleCommand::parse("press"), Err(ConsoleError::Usage(_))));
        assert_eq!(
            ConsoleCommand::parse("recall x 1"),
            Err(ConsoleError::invalid("preset id", "x"))
        );
        assert_eq!(
            ConsoleCommand::parse("call ringing"),
            Err(ConsoleError::invalid("call state", "ringing"))
        );
    }

    #[tokio::test]
    async fn test_inject_publishes_to_room() {
        use crate::device::Telemetry;

        let room = SimulatedRoom::new(Vec::new());
        let mut actions = room.ui_actions().await.unwrap();
        let mut calls = room.call_state().await.unwrap();

        assert!(ConsoleCommand::Press("Type:Automatic~Feature:Frames".to_string()).inject(&room, "sel"));
        assert!(ConsoleCommand::Call(CallState::Connected).inject(&room, "sel"));
        assert!(!ConsoleCommand::Status.inject(&room, "sel"));

        let action = actions.recv().await.unwrap();
        assert_eq!(action.control_id, "sel");
        assert_eq!(action.value, "Type:Automatic~Feature:Frames");
        assert_eq!(calls.recv().await, Some(CallState::Connected));
    }
}
