use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::FromRow;

pub const GAME_COLUMNS: &str = "g.id, g.name, g.slug, g.developer, g.brand, g.allowed_region,
    g.image_thumbnail_path, g.image_banner_path, g.description, g.long_description, g.faq,
    g.is_popular, g.is_active, g.display_order, g.category_id, g.game_configuration_id,
    g.created_at, g.updated_at";

#[derive(Debug, Clone, FromRow)]
pub struct Game {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub developer: Option<String>,
    /// Brand code at the product provider, e.g. "MOBILE LEGENDS".
    pub brand: Option<String>,
    pub allowed_region: Option<String>,
    pub image_thumbnail_path: Option<String>,
    pub image_banner_path: Option<String>,
    pub description: String,
    pub long_description: String,
    pub faq: Option<Value>,
    pub is_popular: bool,
    pub is_active: bool,
    pub display_order: i32,
    pub category_id: i64,
    pub game_configuration_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
