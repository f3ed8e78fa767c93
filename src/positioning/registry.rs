//! Subscription registry
//!
//! Holds the named telemetry listeners and arms each of them exactly once.

use anyhow::{Context, Result};
use futures_util::future::BoxFuture;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Side-effecting start of one listener
pub type StartFn = Box<dyn FnOnce() -> BoxFuture<'static, Result<()>> + Send + Sync>;

enum Slot {
    Pending(StartFn),
    Started,
}

/// Outcome of one `start_all` pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StartSummary {
    /// Listeners started by this pass
    pub armed: usize,
    /// Listeners skipped because an earlier pass started them
    pub already_started: usize,
}

#[derive(Default)]
pub struct SubscriptionRegistry {
    slots: BTreeMap<String, Slot>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a listener. Registering a name twice keeps the later start function.
    pub fn register(&mut self, name: impl Into<String>, start: StartFn) {
        let name = name.into();
        if self.slots.insert(name.clone(), Slot::Pending(start)).is_some() {
            debug!("Replacing registration '{}'", name);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Start every pending listener in name order.
    ///
    /// Listeners already started are skipped with a warning. The first start
    /// that fails aborts startup.
    pub async fn start_all(&mut self) -> Result<StartSummary> {
        let mut summary = StartSummary::default();
        for (name, slot) in self.slots.iter_mut() {
            match std::mem::replace(slot, Slot::Started) {
                Slot::Pending(start) => {
                    start().await.with_context(|| format!("Failed to start listener '{}'", name))?;
                    debug!("Listener '{}' armed", name);
                    summary.armed += 1;
                }
                Slot::Started => {
                    warn!("Listener '{}' already started, ignoring", name);
                    summary.already_started += 1;
                }
            }
        }
        info!("Armed {} of {} telemetry subscriptions", summary.armed, self.slots.len());
        Ok(summary)
    }
}
