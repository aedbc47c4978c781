//! Side-effect worker - drains the outbox
//!
//! Woken by [`SideEffectQueue`] after each order commit and by a periodic
//! scan that picks up retries whose backoff has elapsed.

use std::time::Duration;

use shared::util::now_millis;
use sqlx::SqlitePool;
use tokio_util::sync::CancellationToken;

use super::SideEffectQueue;
use super::{inventory, loyalty};
use crate::db::repository::side_effect::{self, SideEffectJob, SideEffectKind};

const RETRY_BASE_DELAY_SECS: u64 = 5;
const RETRY_MAX_DELAY_SECS: u64 = 60;
/// Jobs fetched per query
const BATCH_SIZE: i64 = 50;

/// Backoff before the next attempt: `base * 2^(failures - 1)`, capped
pub fn retry_delay_secs(failed_attempts: u32) -> u64 {
    let exponent = failed_attempts.saturating_sub(1).min(16);
    (RETRY_BASE_DELAY_SECS * 2u64.pow(exponent)).min(RETRY_MAX_DELAY_SECS)
}

#[derive(Debug, Clone)]
pub struct SideEffectWorker {
    pool: SqlitePool,
    queue: SideEffectQueue,
    max_retries: u32,
    scan_interval: Duration,
}

impl SideEffectWorker {
    pub fn new(pool: SqlitePool, queue: SideEffectQueue, max_retries: u32, scan_interval_secs: u64) -> Self {
        Self {
            pool,
            queue,
            max_retries: max_retries.max(1),
            scan_interval: Duration::from_secs(scan_interval_secs.max(1)),
        }
    }

    /// Make jobs left pending by a previous run due immediately
    pub async fn recover_stale(&self) {
        match side_effect::recover_pending(&self.pool, now_millis()).await {
            Ok(0) => {}
            Ok(n) => {
                tracing::info!(count = n, "Resuming pending side-effect jobs");
                self.queue.notify();
            }
            Err(e) => tracing::error!(error = %e, "Failed to recover pending side-effect jobs"),
        }
    }

    pub async fn run(self, shutdown: CancellationToken) {
        tracing::info!(
            max_retries = self.max_retries,
            scan_interval_secs = self.scan_interval.as_secs(),
            "SideEffectWorker started"
        );

        self.drain().await;

        let mut scan = tokio::time::interval(self.scan_interval);
        // first tick completes immediately
        scan.tick().await;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("SideEffectWorker shutting down");
                    break;
                }
                _ = self.queue.notified() => {
                    self.drain().await;
                }
                _ = scan.tick() => {
                    self.drain().await;
                }
            }
        }
    }

    /// Process every due job; returns how many were attempted
    pub async fn drain(&self) -> usize {
        let mut attempted = 0;
        loop {
            let jobs = match side_effect::find_due(&self.pool, now_millis(), BATCH_SIZE).await {
                Ok(jobs) => jobs,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to load due side-effect jobs");
                    return attempted;
                }
            };
            let fetched = jobs.len();
            for job in jobs {
                self.process(job).await;
                attempted += 1;
            }
            if (fetched as i64) < BATCH_SIZE {
                break;
            }
        }
        attempted
    }

    async fn process(&self, job: SideEffectJob) {
        let result = match job.kind {
            SideEffectKind::LoyaltyAccrual => loyalty::accrue(&self.pool, job.order_id).await.map(|_| ()),
            SideEffectKind::InventoryDeduction => {
                inventory::deduct(&self.pool, job.order_id).await.map(|_| ())
            }
        };

        let now = now_millis();
        let update = match result {
            Ok(()) => {
                tracing::debug!(job_id = job.id, order_id = job.order_id, kind = job.kind.as_str(), "Side effect applied");
                side_effect::mark_done(&self.pool, job.id, now).await
            }
            Err(e) => {
                let failures = u32::try_from(job.attempts).unwrap_or(u32::MAX).saturating_add(1);
                let error = e.to_string();
                if failures >= self.max_retries {
                    tracing::error!(
                        job_id = job.id,
                        order_id = job.order_id,
                        kind = job.kind.as_str(),
                        attempts = failures,
                        error = %error,
                        "Side effect failed permanently, moving to dead letter"
                    );
                    side_effect::mark_dead(&self.pool, job.id, &error, now).await
                } else {
                    let delay_secs = retry_delay_secs(failures);
                    tracing::warn!(
                        job_id = job.id,
                        order_id = job.order_id,
                        kind = job.kind.as_str(),
                        attempts = failures,
                        retry_in_secs = delay_secs,
                        error = %error,
                        "Side effect failed, will retry"
                    );
                    side_effect::mark_retry(&self.pool, job.id, &error, now + delay_secs as i64 * 1000, now)
                        .await
                }
            }
        };

        if let Err(e) = update {
            tracing::error!(job_id = job.id, error = %e, "Failed to update side-effect job");
        }
    }
}
