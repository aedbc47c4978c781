//! Background task registry
//!
//! Every long-running job the server owns is spawned through
//! [`BackgroundTasks`], so startup can log what is running and shutdown can
//! cancel and join everything in one place.
//!
//! - [`TaskKind::Warmup`]: runs once at startup (outbox recovery)
//! - [`TaskKind::Worker`]: long-lived consumer (side-effect worker)
//! - [`TaskKind::Periodic`]: interval job (real-time connection sweep)

use futures::FutureExt;
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    Warmup,
    Worker,
    Periodic,
}

impl TaskKind {
    /// Whether the task is expected to keep running until shutdown
    fn is_long_lived(self) -> bool {
        self != TaskKind::Warmup
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TaskKind::Warmup => "warmup",
            TaskKind::Worker => "worker",
            TaskKind::Periodic => "periodic",
        })
    }
}

/// Per-kind task counts
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TaskCounts {
    pub warmup: usize,
    pub worker: usize,
    pub periodic: usize,
}

struct Entry {
    name: &'static str,
    kind: TaskKind,
    handle: JoinHandle<()>,
}

/// Owns the join handles of every background job plus the shared
/// cancellation token they watch.
pub struct BackgroundTasks {
    entries: Vec<Entry>,
    shutdown: CancellationToken,
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Spawn `future` under `name`.
    ///
    /// A panic is caught and logged instead of tearing down the runtime. A
    /// worker or periodic job that returns before shutdown is logged too.
    pub fn spawn<F>(&mut self, name: &'static str, kind: TaskKind, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let token = self.shutdown.clone();
        let handle = tokio::spawn(async move {
            match AssertUnwindSafe(future).catch_unwind().await {
                Ok(()) if kind.is_long_lived() && !token.is_cancelled() => {
                    tracing::warn!(task = name, %kind, "background task exited before shutdown");
                }
                Ok(()) => {}
                Err(payload) => {
                    let panic = panic_message(payload.as_ref());
                    tracing::error!(task = name, %kind, %panic, "background task panicked");
                }
            }
        });

        tracing::debug!(task = name, %kind, "background task spawned");
        self.entries.push(Entry { name, kind, handle });
    }

    pub fn counts(&self) -> TaskCounts {
        self.entries
            .iter()
            .fold(TaskCounts::default(), |mut counts, entry| {
                match entry.kind {
                    TaskKind::Warmup => counts.warmup += 1,
                    TaskKind::Worker => counts.worker += 1,
                    TaskKind::Periodic => counts.periodic += 1,
                }
                counts
            })
    }

    pub fn log_summary(&self) {
        let counts = self.counts();
        tracing::info!(
            total = self.entries.len(),
            workers = counts.worker,
            periodic = counts.periodic,
            warmup = counts.warmup,
            "background tasks running"
        );
    }

    /// Number of long-lived tasks that already stopped
    pub fn check_health(&self) -> usize {
        let dead: Vec<&Entry> = self
            .entries
            .iter()
            .filter(|entry| entry.kind.is_long_lived() && entry.handle.is_finished())
            .collect();
        for entry in &dead {
            tracing::error!(task = entry.name, kind = %entry.kind, "background task is no longer running");
        }
        dead.len()
    }

    /// Cancel the shared token and join every task
    pub async fn shutdown(self) {
        tracing::info!(count = self.entries.len(), "stopping background tasks");
        self.shutdown.cancel();

        for entry in self.entries {
            if let Err(e) = entry.handle.await
                && !e.is_cancelled()
            {
                tracing::error!(task = entry.name, error = ?e, "background task failed to join");
            }
        }

        tracing::info!("background tasks stopped");
    }
}

impl Default for BackgroundTasks {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn shutdown_stops_token_watchers() {
        let mut tasks = BackgroundTasks::new();
        let token = tasks.shutdown_token();
        tasks.spawn("waiter", TaskKind::Worker, async move {
            token.cancelled().await;
        });
        tasks.spawn("once", TaskKind::Warmup, async {});

        assert_eq!(
            tasks.counts(),
            TaskCounts {
                warmup: 1,
                worker: 1,
                periodic: 0
            }
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(tasks.check_health(), 0);
        tasks.shutdown().await;
    }

    #[tokio::test]
    async fn panicking_sweep_is_reported_dead() {
        let mut tasks = BackgroundTasks::new();
        tasks.spawn("sweep", TaskKind::Periodic, async {
            panic!("sweep failed");
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(tasks.check_health(), 1);
        tasks.shutdown().await;
    }

    #[test]
    fn panic_payloads_render() {
        let boxed: Box<dyn Any + Send> = Box::new("static");
        assert_eq!(panic_message(boxed.as_ref()), "static");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(boxed.as_ref()), "owned");
        let boxed: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(boxed.as_ref()), "non-string panic payload");
    }
}
