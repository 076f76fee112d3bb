use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Processing,
    Success,
    Failed,
    Canceled,
}

impl TransactionStatus {
    pub const ALL: [TransactionStatus; 5] = [
        TransactionStatus::Pending,
        TransactionStatus::Processing,
        TransactionStatus::Success,
        TransactionStatus::Failed,
        TransactionStatus::Canceled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Processing => "processing",
            TransactionStatus::Success => "success",
            TransactionStatus::Failed => "failed",
            TransactionStatus::Canceled => "canceled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value)
    }

    /// Success, failed and canceled never change again.
    pub fn is_final(self) -> bool {
        matches!(
            self,
            TransactionStatus::Success | TransactionStatus::Failed | TransactionStatus::Canceled
        )
    }
}

impl TryFrom<String> for TransactionStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("unknown transaction status '{value}'"))
    }
}

pub const TRANSACTION_COLUMNS: &str = "t.id, t.user_id, t.game_user_id, t.game_zone_id, t.nickname,
    t.product_id, t.product_name, t.provider_sku, t.quantity, t.base_price, t.provider_name,
    t.provider_order_id, t.status, t.serial_number, t.log, t.transaction_type, t.ref_id,
    t.created_at, t.updated_at";

#[derive(Debug, Clone, FromRow)]
pub struct Transaction {
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
    #[sqlx(try_from = "String")]
    pub status: TransactionStatus,
    pub serial_number: Option<String>,
    pub log: Option<Value>,
    pub transaction_type: String,
    pub ref_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
