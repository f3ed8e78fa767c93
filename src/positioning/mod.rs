//! Positioning module - command sequencing, settle detection and selector reconciliation

pub mod engine;
pub mod gate;
pub mod reconciler;
pub mod registry;
pub mod sequencer;
pub mod settle;

pub use engine::PositioningEngine;
pub use gate::SuppressionGate;
pub use reconciler::SelectionReconciler;
pub use registry::SubscriptionRegistry;
pub use sequencer::CommandSequencer;
pub use settle::{SettleMonitor, SettleOutcome, SettleTiming};
