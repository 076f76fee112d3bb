use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

pub const PAYMENT_METHOD_COLUMNS: &str = r#"id, image_path, name, provider, code, "group", type,
    fee_flat, fee_percent, min_amount, max_amount, is_active, created_at, updated_at"#;

#[derive(Debug, Clone, FromRow)]
pub struct PaymentMethod {
    pub id: i64,
    pub image_path: Option<String>,
    pub name: String,
    /// Gateway slug, e.g. "tokopay".
    pub provider: String,
    pub code: String,
    pub group: String,
    #[sqlx(rename = "type")]
    pub method_type: String,
    pub fee_flat: Decimal,
    pub fee_percent: Decimal,
    pub min_amount: i64,
    pub max_amount: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
