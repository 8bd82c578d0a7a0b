//! Shutdown coordination.

use tokio::sync::broadcast;

/// Broadcasts a single "stop now" notice to every long-running task
/// (the HTTP server, the signal listener).
#[derive(Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Notify every subscriber.
    ///
    /// A second trigger before a subscriber reads shows up to it as
    /// `RecvError::Lagged`, which still resolves its `recv`.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
