//! Branch & Menu Models
//!
//! Read-only here: branches and the menu catalogue are maintained by the
//! catalogue service and only consulted for pricing.

use serde::{Deserialize, Serialize};

/// Branch entity (physical restaurant location)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Branch {
    pub id: i64,
    pub name: String,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub is_active: bool,
}

impl Branch {
    /// Stored coordinates, if both are present
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }
}

/// Menu item entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct MenuItem {
    pub id: i64,
    pub name: String,
    #[serde(with = "crate::money::amount")]
    pub price: f64,
    pub is_available: bool,
}

/// Menu item variant (size, add-on, ...) with its price delta
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct MenuItemVariant {
    pub id: i64,
    pub menu_item_id: i64,
    pub name: String,
    #[serde(with = "crate::money::amount")]
    pub price_delta: f64,
}
