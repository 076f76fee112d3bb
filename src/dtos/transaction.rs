// src/dtos/transaction.rs
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::transaction::{Transaction, TransactionStatus};

#[derive(Debug, Deserialize)]
pub struct UpdateTransactionStatusRequest {
    pub status: TransactionStatus,
    pub serial_number: Option<String>,
    pub provider_order_id: Option<String>,
    /// Appended to the transaction log.
    pub note: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    pub id: i64,
    pub user_id: Option<i64>,
    pub game_user_id: String,
    pub game_zone_id: Option<String>,
    pub nickname: Option<String>,
    pub product_id: Option<i64>,
    pub product_name: String,
    pub provider_sku: String,
    pub quantity: i32,
    pub base_price: Decimal,
    pub provider_name: Option<String>,
    pub provider_order_id: Option<String>,
    pub status: TransactionStatus,
    pub serial_number: Option<String>,
    pub log: Option<Value>,
    pub transaction_type: String,
    pub ref_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Transaction> for TransactionResponse {
    fn from(t: Transaction) -> Self {
        Self {
            id: t.id,
            user_id: t.user_id,
            game_user_id: t.game_user_id,
            game_zone_id: t.game_zone_id,
            nickname: t.nickname,
            product_id: t.product_id,
            product_name: t.product_name,
            provider_sku: t.provider_sku,
            quantity: t.quantity,
            base_price: t.base_price,
            provider_name: t.provider_name,
            provider_order_id: t.provider_order_id,
            status: t.status,
            serial_number: t.serial_number,
            log: t.log,
            transaction_type: t.transaction_type,
            ref_id: t.ref_id,
            created_at: t.created_at,
            updated_at: t.updated_at,
        }
    }
}

/// Log entry appended on every admin status change.
#[derive(Debug, Serialize)]
pub struct StatusLogEntry {
    pub from: TransactionStatus,
    pub to: TransactionStatus,
    pub by: String,
    pub at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_request_rejects_unknown_status() {
        let bad = serde_json::from_value::<UpdateTransactionStatusRequest>(json!({ "status": "refunded" }));
        assert!(bad.is_err());
        let ok: UpdateTransactionStatusRequest =
            serde_json::from_value(json!({ "status": "success", "serial_number": "SN-1" })).unwrap();
        assert_eq!(ok.status, TransactionStatus::Success);
    }
}
