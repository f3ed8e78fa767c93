//! Telemetry subscription handle

use tokio::sync::mpsc;

type Unsubscribe = Box<dyn FnOnce() + Send>;

/// Stream of telemetry events with an explicit, idempotent unsubscribe.
///
/// Dropping the handle unsubscribes as well.
pub struct Subscription<T> {
    rx: mpsc::UnboundedReceiver<T>,
    unsubscribe: Option<Unsubscribe>,
}

impl<T> Subscription<T> {
    /// Wrap a receiver together with the closure that detaches it from its source
    pub fn new(rx: mpsc::UnboundedReceiver<T>, unsubscribe: impl FnOnce() + Send + 'static) -> Self {
        Self {
            rx,
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }

    /// Receive the next event, or `None` once the source is gone or unsubscribed
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Detach from the source. Calling this more than once is a no-op.
    pub fn unsubscribe(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
            self.rx.close();
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.unsubscribe.is_some()
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
