use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    Percentage,
    Flat,
}

impl DiscountType {
    pub fn as_str(self) -> &'static str {
        match self {
            DiscountType::Percentage => "percentage",
            DiscountType::Flat => "flat",
        }
    }
}

impl TryFrom<String> for DiscountType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "percentage" => Ok(DiscountType::Percentage),
            "flat" => Ok(DiscountType::Flat),
            other => Err(format!("unknown discount type '{other}'")),
        }
    }
}

pub const VOUCHER_COLUMNS: &str = "v.id, v.code, v.description, v.discount_type, v.discount_value,
    v.start_date, v.end_date, v.min_purchase, v.total_usage_limit, v.user_usage_limit,
    v.is_active, v.created_at, v.updated_at";

#[derive(Debug, Clone, FromRow)]
pub struct Voucher {
    pub id: i64,
    pub code: String,
    pub description: String,
    #[sqlx(try_from = "String")]
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub min_purchase: Decimal,
    pub total_usage_limit: i32,
    pub user_usage_limit: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
