//! Loyalty Models

use serde::{Deserialize, Serialize};

/// Loyalty tier, derived from lifetime earned points
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum LoyaltyTier {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl_str_enum!(LoyaltyTier, "loyalty tier", {
    Bronze => "bronze",
    Silver => "silver",
    Gold => "gold",
    Platinum => "platinum",
});

impl LoyaltyTier {
    /// Tier for a lifetime-earned total
    pub fn for_lifetime_points(points: i64) -> Self {
        match points {
            p if p >= 5000 => Self::Platinum,
            p if p >= 2000 => Self::Gold,
            p if p >= 500 => Self::Silver,
            _ => Self::Bronze,
        }
    }
}

/// Per-customer running balance
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct LoyaltyPoints {
    pub customer_id: i64,
    pub points_balance: i64,
    pub lifetime_earned: i64,
    pub lifetime_redeemed: i64,
    pub tier: LoyaltyTier,
    pub updated_at: i64,
}

/// Ledger entry type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum LoyaltyTransactionType {
    Earned,
    Redeemed,
    Adjusted,
}

impl_str_enum!(LoyaltyTransactionType, "loyalty transaction type", {
    Earned => "earned",
    Redeemed => "redeemed",
    Adjusted => "adjusted",
});

/// Append-only loyalty ledger entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct LoyaltyTransaction {
    pub id: i64,
    pub customer_id: i64,
    pub order_id: Option<i64>,
    pub points: i64,
    pub transaction_type: LoyaltyTransactionType,
    pub description: Option<String>,
    pub created_at: i64,
}

/// Balance with recent ledger entries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoyaltySummary {
    pub points: LoyaltyPoints,
    pub recent_transactions: Vec<LoyaltyTransaction>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_thresholds() {
        assert_eq!(LoyaltyTier::for_lifetime_points(0), LoyaltyTier::Bronze);
        assert_eq!(LoyaltyTier::for_lifetime_points(499), LoyaltyTier::Bronze);
        assert_eq!(LoyaltyTier::for_lifetime_points(500), LoyaltyTier::Silver);
        assert_eq!(LoyaltyTier::for_lifetime_points(2000), LoyaltyTier::Gold);
        assert_eq!(LoyaltyTier::for_lifetime_points(12_000), LoyaltyTier::Platinum);
    }
}
