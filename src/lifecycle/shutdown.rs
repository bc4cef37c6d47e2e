//! Shutdown coordination for the dev server.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;

/// Graceful shutdown handle shared by the signal task, the server and tests.
///
/// The first `trigger` broadcasts to every subscriber. Later calls only
/// report that a shutdown is already draining.
#[derive(Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
    draining: Arc<AtomicBool>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self {
            tx,
            draining: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Receiver that fires once when shutdown starts.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Start draining. Returns false if a shutdown was already in progress.
    pub fn trigger(&self) -> bool {
        if self.draining.swap(true, Ordering::SeqCst) {
            return false;
        }
        let _ = self.tx.send(());
        true
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
