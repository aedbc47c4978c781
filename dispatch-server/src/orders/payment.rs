//! Payment status machine
//!
//! ```text
//! pending ──► awaiting_verification ──► paid ──► refunded
//!    │                 │                  ▲
//!    └────────► failed ◄┘                  │
//!                 └───────(retry)──────────┘
//! ```
//!
//! Re-recording the current status is allowed and only merges metadata.

use serde_json::{Map, Value};
use shared::models::{PaymentMethod, PaymentRecord, PaymentStatus};

use crate::utils::{AppError, AppResult, ErrorCode};

pub fn can_transition(from: PaymentStatus, to: PaymentStatus) -> bool {
    use PaymentStatus::*;
    if from == to {
        return from != Refunded;
    }
    matches!(
        (from, to),
        (Pending, AwaitingVerification | Paid | Failed)
            | (AwaitingVerification, Paid | Failed)
            | (Failed, Pending | AwaitingVerification | Paid)
            | (Paid, Refunded)
    )
}

/// Transition check plus the fields each method needs
pub fn validate_record(current: PaymentStatus, existing: &Value, record: &PaymentRecord) -> AppResult<()> {
    if !can_transition(current, record.status) {
        return Err(AppError::with_message(
            ErrorCode::InvalidPaymentTransition,
            format!("Payment cannot move from {} to {}", current, record.status),
        )
        .with_detail("from", current.as_str())
        .with_detail("to", record.status.as_str()));
    }

    let needs_wallet_ref = record.method == PaymentMethod::Wallet
        && record.status == PaymentStatus::AwaitingVerification;
    let has_wallet_ref = non_empty(record.transaction_id.as_deref())
        || existing
            .get("transaction_id")
            .and_then(Value::as_str)
            .is_some_and(|s| !s.is_empty());
    if needs_wallet_ref && !has_wallet_ref {
        return Err(AppError::with_message(
            ErrorCode::InvalidPaymentTransition,
            "Wallet payments awaiting verification require a transaction_id",
        )
        .with_detail("field", "transaction_id"));
    }
    Ok(())
}

/// Merge gateway references into the stored metadata, keeping unrelated keys
pub fn merge_metadata(existing: &Value, record: &PaymentRecord) -> Value {
    let mut merged: Map<String, Value> = existing.as_object().cloned().unwrap_or_default();
    if let Some(extra) = &record.metadata {
        for (key, value) in extra {
            merged.insert(key.clone(), value.clone());
        }
    }
    if let Some(id) = record.transaction_id.as_deref().filter(|s| !s.is_empty()) {
        merged.insert("transaction_id".into(), Value::String(id.to_string()));
    }
    if let Some(id) = record.gateway_transaction_id.as_deref().filter(|s| !s.is_empty()) {
        merged.insert("gateway_transaction_id".into(), Value::String(id.to_string()));
    }
    Value::Object(merged)
}

fn non_empty(value: Option<&str>) -> bool {
    value.is_some_and(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(method: PaymentMethod, status: PaymentStatus) -> PaymentRecord {
        PaymentRecord {
            method,
            status,
            transaction_id: None,
            gateway_transaction_id: None,
            metadata: None,
        }
    }

    #[test]
    fn transitions() {
        use PaymentStatus::*;
        assert!(can_transition(Pending, AwaitingVerification));
        assert!(can_transition(AwaitingVerification, Paid));
        assert!(can_transition(Failed, Paid));
        assert!(can_transition(Paid, Refunded));
        assert!(can_transition(Paid, Paid));
        assert!(!can_transition(Paid, Pending));
        assert!(!can_transition(Refunded, Paid));
        assert!(!can_transition(Refunded, Refunded));
        assert!(!can_transition(Pending, Refunded));
    }

    #[test]
    fn wallet_verification_needs_transaction_id() {
        let r = record(PaymentMethod::Wallet, PaymentStatus::AwaitingVerification);
        let err = validate_record(PaymentStatus::Pending, &json!({}), &r).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidPaymentTransition);

        // an id recorded earlier satisfies it
        assert!(validate_record(PaymentStatus::Pending, &json!({"transaction_id": "W-1"}), &r).is_ok());

        let mut r = r;
        r.transaction_id = Some("W-2".into());
        assert!(validate_record(PaymentStatus::Pending, &json!({}), &r).is_ok());
    }

    #[test]
    fn metadata_merge_keeps_unrelated_keys() {
        let existing = json!({"terminal": "T1", "transaction_id": "old"});
        let mut r = record(PaymentMethod::Card, PaymentStatus::Paid);
        r.gateway_transaction_id = Some("ch_9".into());
        r.metadata = Some(json!({"card_last4": "4242"}).as_object().cloned().unwrap());

        let merged = merge_metadata(&existing, &r);
        assert_eq!(merged["terminal"], "T1");
        assert_eq!(merged["transaction_id"], "old");
        assert_eq!(merged["gateway_transaction_id"], "ch_9");
        assert_eq!(merged["card_last4"], "4242");
    }
}
