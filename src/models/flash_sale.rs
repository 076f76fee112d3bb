use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct FlashSale {
    pub id: i64,
    pub name: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One product attached to a flash sale, with pivot columns and the
/// game / product category it belongs to.
#[derive(Debug, Clone, FromRow)]
pub struct FlashSaleItem {
    pub flash_sale_id: i64,
    pub product_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub icon_path: Option<String>,
    pub base_price: Decimal,
    pub provider: String,
    pub provider_sku: String,
    pub discounted_price: Decimal,
    pub stock: Option<i32>,
    pub game_id: i64,
    pub game_name: String,
    pub game_slug: String,
    pub product_category_id: i64,
    pub product_category_name: String,
    pub product_category_slug: String,
}
