use std::fmt;
use std::sync::Arc;

use tokio::sync::Notify;

/// Wake-up handle between order creation and the side-effect worker.
///
/// The outbox table is the queue; this only shortens the wait until the
/// next scan. A notification sent while the worker is busy is kept and
/// consumed on its next wait.
#[derive(Clone, Default)]
pub struct SideEffectQueue {
    notify: Arc<Notify>,
}

impl fmt::Debug for SideEffectQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SideEffectQueue").finish_non_exhaustive()
    }
}

impl SideEffectQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// New jobs were committed
    pub fn notify(&self) {
        self.notify.notify_one();
    }

    pub async fn notified(&self) {
        self.notify.notified().await;
    }
}
