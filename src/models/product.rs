use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

pub const PRODUCT_COLUMNS: &str = "p.id, p.name, p.icon_path, p.description, p.base_price,
    p.provider, p.provider_sku, p.product_category_id, p.game_id, p.display_order,
    p.is_active, p.created_at, p.updated_at";

pub const MANUAL_PROVIDER: &str = "MANUAL";
pub const DIGIFLAZZ_PROVIDER: &str = "digiflazz";

#[derive(Debug, Clone, FromRow)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub icon_path: Option<String>,
    pub description: Option<String>,
    /// Cost basis; shown unmodified only to admins.
    pub base_price: Decimal,
    pub provider: String,
    pub provider_sku: String,
    pub product_category_id: i64,
    pub game_id: i64,
    pub display_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
