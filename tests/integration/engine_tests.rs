//! End-to-end tests of the positioning engine against the simulated room

use camera_selector::core::events::{self, AppEvent, EventSender};
use camera_selector::device::sim::{FailurePlan, RoomCommand};
use camera_selector::device::{CallState, MovementTick, PresetRecord, TrackingStatus};
use camera_selector::{
    Collaborators, Config, PositioningEngine, PresetRef, Selection, SimulatedRoom, TrackingCapabilities,
    TrackingFeature,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

const WIDGET: &str = "camera_selector";

struct Harness {
    room: Arc<SimulatedRoom>,
    engine: Arc<PositioningEngine>,
    sender: EventSender,
    task: JoinHandle<()>,
}

async fn start(room: SimulatedRoom) -> Harness {
    let room = Arc::new(room);
    let (sender, rx) = events::channel();
    let mut engine = PositioningEngine::new(Config::default(), Collaborators::from_room(Arc::clone(&room)));
    engine
        .start(TrackingCapabilities::all(), sender.clone())
        .await
        .unwrap();

    let engine = Arc::new(engine);
    let task = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move { engine.run(rx).await })
    };
    room.clear_commands();

    Harness {
        room,
        engine,
        sender,
        task,
    }
}

fn simulated_room() -> SimulatedRoom {
    SimulatedRoom::from_config(&Config::default().simulator)
}

async fn settle_for(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

fn count(commands: &[RoomCommand], wanted: &RoomCommand) -> usize {
    commands.iter().filter(|c| *c == wanted).count()
}

#[tokio::test(start_paused = true)]
async fn test_preset_press_recalls_and_switches_source_once() {
    let h = start(simulated_room()).await;
    let payload = "Type:Preset~CameraId:2~PresetId:3~PresetName:Whiteboard";

    h.room.press(WIDGET, payload);
    settle_for(1500).await;

    let commands = h.room.commands();
    assert_eq!(count(&commands, &RoomCommand::ActivatePreset(3)), 1);
    assert_eq!(count(&commands, &RoomCommand::SetMainVideoSource(2)), 1);
    assert_eq!(h.room.control_value(WIDGET).as_deref(), Some(payload));

    // Simulated motion after the recall is our own echo, not the operator
    assert_eq!(
        h.engine.snapshot().current,
        Selection::Preset(PresetRef::new(2, 3, "Whiteboard"))
    );
}

#[tokio::test(start_paused = true)]
async fn test_movement_during_gate_is_not_manual() {
    let h = start(simulated_room()).await;

    h.room.press(WIDGET, "Type:Automatic~Feature:Speaker");
    settle_for(50).await;
    assert!(h.engine.gate().is_active());

    h.room.move_camera(MovementTick::new(1, 0.4, 0.0, 0.0));
    settle_for(50).await;
    assert_eq!(
        h.engine.snapshot().current,
        Selection::Tracking(TrackingFeature::Speaker)
    );
    assert_eq!(
        h.room.control_value(WIDGET).as_deref(),
        Some("Type:Automatic~Feature:Speaker")
    );
}

#[tokio::test(start_paused = true)]
async fn test_hand_movement_after_gate_closes_shows_manual() {
    let h = start(simulated_room()).await;

    h.room.press(WIDGET, "Type:Automatic~Feature:Presenter");
    settle_for(3100).await;
    assert!(!h.engine.gate().is_active());

    h.room.move_camera(MovementTick::new(1, 0.0, 0.3, 0.0));
    settle_for(10).await;

    assert!(h.engine.snapshot().current.is_manual());
    assert_eq!(
        h.room.control_value(WIDGET).as_deref(),
        Some("Type:Automatic~Feature:Manual")
    );
    assert_eq!(
        h.engine.snapshot().last_non_manual,
        Some(Selection::Tracking(TrackingFeature::Presenter))
    );
}

#[tokio::test(start_paused = true)]
async fn test_push_failure_unsets_control() {
    let h = start(simulated_room()).await;
    h.room.set_failures(FailurePlan {
        set_value: true,
        ..FailurePlan::default()
    });

    h.room.move_camera(MovementTick::new(2, 1.0, 0.0, 0.0));
    settle_for(10).await;

    assert_eq!(h.room.control_value(WIDGET), None);
    assert_eq!(
        h.room.commands(),
        vec![RoomCommand::UnsetValue {
            control_id: WIDGET.to_string()
        }]
    );
}

#[tokio::test(start_paused = true)]
async fn test_missing_camera_id_issues_no_recall() {
    let h = start(simulated_room()).await;

    h.room.press(WIDGET, "Type:Preset~PresetId:3~PresetName:Whiteboard");
    settle_for(3100).await;

    let commands = h.room.commands();
    assert!(!commands
        .iter()
        .any(|c| matches!(c, RoomCommand::ActivatePreset(_) | RoomCommand::SetMainVideoSource(_))));
    assert_eq!(h.room.control_value(WIDGET), None);
    assert!(!h.engine.gate().is_active());
}

#[tokio::test(start_paused = true)]
async fn test_malformed_press_has_no_side_effects() {
    let h = start(simulated_room()).await;

    h.room.press(WIDGET, "Type:Error");
    h.room.press(WIDGET, "Type:Automatic~Feature:Zoom");
    settle_for(10).await;

    assert!(h.room.commands().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_call_connect_recalls_default_preset() {
    let h = start(simulated_room()).await;

    h.room.report_call_state(CallState::Connected);
    settle_for(1500).await;

    assert_eq!(count(&h.room.commands(), &RoomCommand::ActivatePreset(1)), 1);
    assert_eq!(
        h.room.control_value(WIDGET).as_deref(),
        Some("Type:Preset~CameraId:1~PresetId:1~PresetName:Room Overview")
    );
}

#[tokio::test(start_paused = true)]
async fn test_call_connect_without_default_issues_nothing() {
    let room = SimulatedRoom::new(vec![PresetRecord {
        camera_id: 1,
        preset_id: 4,
        name: "Desk".to_string(),
        is_default: false,
    }]);
    let h = start(room).await;

    h.room.report_call_state(CallState::Connected);
    settle_for(100).await;

    assert!(!h.room.commands().iter().any(RoomCommand::is_hardware_mutation));
    assert!(!h.engine.gate().is_active());
}

#[tokio::test(start_paused = true)]
async fn test_external_recall_and_tracking_status_update_selector() {
    let h = start(simulated_room()).await;

    h.room.recall_externally(2, 1);
    settle_for(10).await;
    assert_eq!(
        h.room.control_value(WIDGET).as_deref(),
        Some("Type:Preset~CameraId:1~PresetId:2~PresetName:Lectern")
    );

    h.room.report_tracking(TrackingFeature::Presenter, TrackingStatus::Off);
    settle_for(10).await;
    assert_eq!(
        h.room.control_value(WIDGET).as_deref(),
        Some("Type:Preset~CameraId:1~PresetId:2~PresetName:Lectern")
    );

    h.room.report_tracking(TrackingFeature::Presenter, TrackingStatus::Follow);
    settle_for(10).await;
    assert_eq!(
        h.room.control_value(WIDGET).as_deref(),
        Some("Type:Automatic~Feature:Presenter")
    );
}

#[tokio::test(start_paused = true)]
async fn test_catalog_change_rebuilds_panel() {
    let h = start(simulated_room()).await;

    h.room.report_catalog_change();
    settle_for(10).await;

    assert_eq!(count(&h.room.commands(), &RoomCommand::RebuildPanel), 1);
}

#[tokio::test(start_paused = true)]
async fn test_second_start_opens_no_subscriptions() {
    let room = Arc::new(simulated_room());
    let (sender, rx) = events::channel();
    let mut engine = PositioningEngine::new(Config::default(), Collaborators::from_room(Arc::clone(&room)));

    let armed = engine.start(TrackingCapabilities::all(), sender.clone()).await.unwrap();
    let opened = room.subscriptions_opened();
    assert_eq!(opened, armed);

    // Drive the selector to a live value before starting again
    room.report_tracking(TrackingFeature::Speaker, TrackingStatus::Active);
    let _ = tokio::time::timeout(Duration::from_millis(10), engine.run(rx)).await;
    assert_eq!(
        room.control_value(WIDGET).as_deref(),
        Some("Type:Automatic~Feature:Speaker")
    );
    room.clear_commands();

    assert_eq!(engine.start(TrackingCapabilities::all(), sender).await.unwrap(), 0);
    assert_eq!(room.subscriptions_opened(), opened);
    assert!(room.commands().is_empty());
    assert_eq!(
        room.control_value(WIDGET).as_deref(),
        Some("Type:Automatic~Feature:Speaker")
    );
    assert_eq!(engine.snapshot().current, Selection::Tracking(TrackingFeature::Speaker));
}

#[tokio::test(start_paused = true)]
async fn test_frames_press_does_not_flap_through_speaker() {
    let h = start(simulated_room()).await;

    h.room.press(WIDGET, "Type:Automatic~Feature:Frames");
    settle_for(50).await;

    let shown: Vec<String> = h
        .room
        .commands()
        .into_iter()
        .filter_map(|c| match c {
            RoomCommand::SetValue { value, .. } => Some(value),
            _ => None,
        })
        .collect();
    assert!(!shown.is_empty());
    assert!(shown.iter().all(|v| v == "Type:Automatic~Feature:Frames"), "{:?}", shown);
    assert_eq!(
        h.room.control_value(WIDGET).as_deref(),
        Some("Type:Automatic~Feature:Frames")
    );
    assert_eq!(h.engine.snapshot().current, Selection::Tracking(TrackingFeature::Frames));
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_stops_event_loop() {
    let h = start(simulated_room()).await;

    h.sender.send(AppEvent::Shutdown).unwrap();
    tokio::time::timeout(Duration::from_secs(1), h.task)
        .await
        .expect("event loop should stop")
        .unwrap();
}
