use std::sync::Arc;
use std::time::Instant;

use sqlx::SqlitePool;

use crate::auth::JwtService;
use crate::core::{BackgroundTasks, Config, TaskKind};
use crate::db::DbService;
use crate::dispatch::RiderDispatcher;
use crate::kitchen::KitchenTicketTracker;
use crate::orders::OrderLifecycle;
use crate::pos::PosSessionManager;
use crate::pricing::{Geocoder, HttpGeocoder, PricingEngine};
use crate::realtime::RealtimeBus;
use crate::side_effects::{SideEffectQueue, SideEffectWorker};
use crate::utils::{AppError, AppResult};

/// Interval for dropping closed real-time connections
const REALTIME_SWEEP_INTERVAL_SECS: u64 = 60;

/// Server state - shared handles to the pool and every component
///
/// All fields are cheap clones (pool handles, `Arc`s), so axum can clone
/// the state per request.
///
/// | Field | Type | Role |
/// |-------|------|------|
/// | config | Config | immutable configuration |
/// | pool | SqlitePool | the single source of truth |
/// | jwt_service | Arc<JwtService> | token validation |
/// | bus | RealtimeBus | scoped event fan-out |
/// | pricing | PricingEngine | delivery charge quotes |
/// | orders | OrderLifecycle | order state machine |
/// | pos | PosSessionManager | cash-drawer sessions |
/// | kitchen | KitchenTicketTracker | kitchen tickets |
/// | dispatcher | RiderDispatcher | riders and deliveries |
/// | side_effects | SideEffectQueue | outbox wake-up handle |
/// | started_at | Instant | reported as uptime by `/health` |
#[derive(Clone, Debug)]
pub struct ServerState {
    pub config: Config,
    pub pool: SqlitePool,
    pub jwt_service: Arc<JwtService>,
    pub bus: RealtimeBus,
    pub pricing: PricingEngine,
    pub orders: OrderLifecycle,
    pub pos: PosSessionManager,
    pub kitchen: KitchenTicketTracker,
    pub dispatcher: RiderDispatcher,
    pub side_effects: SideEffectQueue,
    pub started_at: Instant,
}

impl ServerState {
    /// Wire every component on top of an existing pool
    pub fn with_pool(config: Config, pool: SqlitePool, geocoder: Arc<dyn Geocoder>) -> Self {
        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));
        let bus = RealtimeBus::new(config.realtime_connection_buffer);
        let side_effects = SideEffectQueue::new();
        let pricing = PricingEngine::new(pool.clone(), geocoder, config.pricing.clone());
        let kitchen = KitchenTicketTracker::new(pool.clone(), bus.clone());
        let orders = OrderLifecycle::new(
            pool.clone(),
            bus.clone(),
            pricing.clone(),
            kitchen.clone(),
            side_effects.clone(),
        );
        let pos = PosSessionManager::new(pool.clone(), bus.clone());
        let dispatcher = RiderDispatcher::new(pool.clone(), bus.clone());

        Self {
            config,
            pool,
            jwt_service,
            bus,
            pricing,
            orders,
            pos,
            kitchen,
            dispatcher,
            side_effects,
            started_at: Instant::now(),
        }
    }

    /// Open the database, apply migrations and build the state
    pub async fn initialize(config: &Config) -> AppResult<Self> {
        let db = DbService::new(&config.database_path).await?;
        let geocoder = HttpGeocoder::new(
            &config.geocoder_url,
            &config.geocoder_user_agent,
            config.geocoder_timeout_ms,
        )
        .map_err(|e| AppError::internal(format!("Failed to build geocoder client: {}", e)))?;

        tracing::info!(
            database = %config.database_path,
            environment = %config.environment,
            "Server state initialized"
        );
        Ok(Self::with_pool(config.clone(), db.pool, Arc::new(geocoder)))
    }

    /// Start the side-effect worker and housekeeping tasks
    pub fn start_background_tasks(&self) -> BackgroundTasks {
        let mut tasks = BackgroundTasks::new();

        let worker = SideEffectWorker::new(
            self.pool.clone(),
            self.side_effects.clone(),
            self.config.side_effect_max_retries,
            self.config.side_effect_scan_interval_secs,
        );

        let recovery = worker.clone();
        tasks.spawn("side_effect_recovery", TaskKind::Warmup, async move {
            recovery.recover_stale().await;
        });

        let token = tasks.shutdown_token();
        tasks.spawn("side_effect_worker", TaskKind::Worker, async move {
            worker.run(token).await;
        });

        let bus = self.bus.clone();
        let token = tasks.shutdown_token();
        tasks.spawn("realtime_sweep", TaskKind::Periodic, async move {
            let mut interval = tokio::time::interval(std::time::Duration::from_secs(
                REALTIME_SWEEP_INTERVAL_SECS,
            ));
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = interval.tick() => {
                        let removed = bus.sweep_closed();
                        if removed > 0 {
                            tracing::debug!(removed, "Dropped closed real-time connections");
                        }
                    }
                }
            }
        });

        tasks
    }

    pub fn get_jwt_service(&self) -> &JwtService {
        &self.jwt_service
    }
}
