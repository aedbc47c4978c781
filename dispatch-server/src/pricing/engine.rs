//! Delivery charge computation
//!
//! ```text
//! request ─► branch config (or defaults)
//!              │
//!              ├─ supplied distance > max ──► DeliveryOutOfRange
//!              ├─ amount ≥ free threshold ──► 0, ETA from known/default distance
//!              ├─ static ───────────────────► static charge
//!              └─ distance_based
//!                    ├─ distance given / address geocoded ─► range check ─► base + d × per_km
//!                    └─ geocode or coordinate failure ─────► static (or default) charge + fallback reason
//! ```

use std::fmt;
use std::sync::Arc;

use shared::models::{ChargeType, DeliveryChargeQuote, DeliveryChargeRequest, DeliveryChargesConfig};
use sqlx::SqlitePool;

use super::geo::haversine_km;
use super::geocoder::Geocoder;
use crate::core::config::env_or;
use crate::db::repository::{branch, delivery_charges};
use crate::utils::money::{require_amount, round_money, to_decimal, to_f64};
use crate::utils::{AppError, AppResult, ErrorCode};

/// System-wide pricing used when a branch has no active config
#[derive(Debug, Clone, PartialEq)]
pub struct PricingDefaults {
    pub charge_type: ChargeType,
    pub static_charge: f64,
    pub base_charge: f64,
    pub per_km_charge: f64,
    pub free_delivery_threshold: Option<f64>,
    pub max_delivery_distance: f64,
    /// Kitchen preparation time added to every ETA
    pub prep_minutes: f64,
    /// Travel minutes per km
    pub minutes_per_km: f64,
    /// Distance assumed for ETAs when none is known
    pub default_distance_km: f64,
}

impl Default for PricingDefaults {
    fn default() -> Self {
        Self {
            charge_type: ChargeType::DistanceBased,
            static_charge: 150.0,
            base_charge: 100.0,
            per_km_charge: 20.0,
            free_delivery_threshold: Some(2000.0),
            max_delivery_distance: 15.0,
            prep_minutes: 20.0,
            minutes_per_km: 3.0,
            default_distance_km: 5.0,
        }
    }
}

impl PricingDefaults {
    /// `DELIVERY_DEFAULT_*` overrides on top of [`Default`]
    pub fn from_env() -> Self {
        let d = Self::default();
        let charge_type = std::env::var("DELIVERY_DEFAULT_CHARGE_TYPE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(d.charge_type);
        // 0 disables free delivery
        let threshold: f64 = env_or(
            "DELIVERY_DEFAULT_FREE_THRESHOLD",
            d.free_delivery_threshold.unwrap_or(0.0),
        );
        Self {
            charge_type,
            static_charge: env_or("DELIVERY_DEFAULT_STATIC_CHARGE", d.static_charge),
            base_charge: env_or("DELIVERY_DEFAULT_BASE_CHARGE", d.base_charge),
            per_km_charge: env_or("DELIVERY_DEFAULT_PER_KM_CHARGE", d.per_km_charge),
            free_delivery_threshold: (threshold > 0.0).then_some(threshold),
            max_delivery_distance: env_or("DELIVERY_DEFAULT_MAX_DISTANCE_KM", d.max_delivery_distance),
            prep_minutes: env_or("DELIVERY_DEFAULT_PREP_MINUTES", d.prep_minutes),
            minutes_per_km: env_or("DELIVERY_DEFAULT_MINUTES_PER_KM", d.minutes_per_km),
            default_distance_km: env_or("DELIVERY_DEFAULT_DISTANCE_KM", d.default_distance_km),
        }
    }
}

/// Branch config or defaults, flattened
struct EffectiveConfig {
    charge_type: ChargeType,
    static_charge: f64,
    base_charge: f64,
    per_km_charge: f64,
    free_delivery_threshold: Option<f64>,
    max_delivery_distance: f64,
    custom: bool,
}

impl EffectiveConfig {
    fn resolve(config: Option<DeliveryChargesConfig>, defaults: &PricingDefaults) -> Self {
        match config.filter(|c| c.is_active) {
            Some(c) => Self {
                charge_type: c.charge_type,
                static_charge: c.static_charge,
                base_charge: c.base_charge,
                per_km_charge: c.per_km_charge,
                free_delivery_threshold: c.free_delivery_threshold,
                max_delivery_distance: c.max_delivery_distance,
                custom: true,
            },
            None => Self {
                charge_type: defaults.charge_type,
                static_charge: defaults.static_charge,
                base_charge: defaults.base_charge,
                per_km_charge: defaults.per_km_charge,
                free_delivery_threshold: defaults.free_delivery_threshold,
                max_delivery_distance: defaults.max_delivery_distance,
                custom: false,
            },
        }
    }

    fn check_range(&self, distance: f64) -> AppResult<()> {
        if distance > self.max_delivery_distance {
            return Err(AppError::with_message(
                ErrorCode::DeliveryOutOfRange,
                format!(
                    "Delivery distance {:.2} km exceeds the maximum of {} km",
                    distance, self.max_delivery_distance
                ),
            )
            .with_detail("distance", round_money(distance))
            .with_detail("max_delivery_distance", self.max_delivery_distance));
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct PricingEngine {
    pool: SqlitePool,
    geocoder: Arc<dyn Geocoder>,
    defaults: PricingDefaults,
}

impl fmt::Debug for PricingEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PricingEngine")
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}

impl PricingEngine {
    pub fn new(pool: SqlitePool, geocoder: Arc<dyn Geocoder>, defaults: PricingDefaults) -> Self {
        Self {
            pool,
            geocoder,
            defaults,
        }
    }

    /// Quote the delivery charge and ETA for an order.
    ///
    /// Only an out-of-range distance fails; geocoding and coordinate
    /// problems degrade to the static charge with a `fallback_reason`.
    pub async fn compute_delivery_charge(
        &self,
        request: &DeliveryChargeRequest,
    ) -> AppResult<DeliveryChargeQuote> {
        require_amount(request.order_amount, "order_amount", ErrorCode::ValidationFailed)?;
        if let Some(d) = request.distance
            && (!d.is_finite() || d < 0.0)
        {
            return Err(AppError::validation(format!(
                "distance must be a non-negative number of km, got {d}"
            ))
            .with_detail("field", "distance"));
        }

        let branch = branch::find_by_id(&self.pool, request.branch_id)
            .await?
            .ok_or_else(|| AppError::entity_not_found(ErrorCode::BranchNotFound, request.branch_id))?;
        let config = EffectiveConfig::resolve(
            delivery_charges::find_by_branch(&self.pool, branch.id).await?,
            &self.defaults,
        );

        if let Some(d) = request.distance {
            config.check_range(d)?;
        }

        let free = config
            .free_delivery_threshold
            .is_some_and(|threshold| request.order_amount >= threshold);
        if free {
            return Ok(self.quote(&config, 0.0, true, request.distance, None));
        }

        match config.charge_type {
            ChargeType::Static => {
                Ok(self.quote(&config, config.static_charge, false, request.distance, None))
            }
            ChargeType::DistanceBased => {
                let coords = branch.coordinates();
                match self.resolve_distance(coords, request).await {
                    Ok(distance) => {
                        config.check_range(distance)?;
                        let charge = to_f64(
                            to_decimal(config.base_charge)
                                + to_decimal(distance) * to_decimal(config.per_km_charge),
                        );
                        Ok(self.quote(&config, charge, false, Some(distance), None))
                    }
                    Err(reason) => {
                        tracing::warn!(
                            branch_id = branch.id,
                            reason = %reason,
                            "Distance pricing unavailable, using static charge"
                        );
                        let charge = self.fallback_charge(&config);
                        Ok(self.quote(&config, charge, false, None, Some(reason)))
                    }
                }
            }
        }
    }

    /// Static charge for a distance-based quote that could not be priced.
    ///
    /// Distance-based branch configs usually leave `static_charge` at 0, so
    /// anything but a positive value falls through to the system default.
    fn fallback_charge(&self, config: &EffectiveConfig) -> f64 {
        if config.static_charge > 0.0 {
            config.static_charge
        } else {
            self.defaults.static_charge
        }
    }

    /// Supplied distance, else geocoded address → great-circle distance
    async fn resolve_distance(
        &self,
        branch_coords: Option<(f64, f64)>,
        request: &DeliveryChargeRequest,
    ) -> Result<f64, String> {
        if let Some(distance) = request.distance {
            return Ok(distance);
        }
        let address = request
            .delivery_address
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .ok_or_else(|| "delivery address is missing".to_string())?;
        let origin = branch_coords.ok_or_else(|| "branch coordinates are not set".to_string())?;
        let destination = self
            .geocoder
            .geocode(address)
            .await
            .map_err(|e| e.to_string())?;
        Ok(haversine_km(origin, destination.as_pair()))
    }

    fn quote(
        &self,
        config: &EffectiveConfig,
        charge: f64,
        free_delivery: bool,
        distance: Option<f64>,
        fallback_reason: Option<String>,
    ) -> DeliveryChargeQuote {
        let eta_distance = distance.unwrap_or(self.defaults.default_distance_km);
        let estimated = self.defaults.prep_minutes + eta_distance * self.defaults.minutes_per_km;
        DeliveryChargeQuote {
            delivery_charges: round_money(charge),
            charge_type: config.charge_type,
            free_delivery,
            distance: distance.map(round_money),
            using_custom_config: config.custom,
            estimated_delivery_time: estimated.ceil() as i64,
            fallback_reason,
        }
    }
}
