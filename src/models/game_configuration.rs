use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct GameConfiguration {
    pub id: i64,
    pub name: String,
    pub guide_text: Option<String>,
    pub guide_image_path: Option<String>,
    pub validation_provider: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One input on the top-up form, e.g. "user_id" or "zone_id".
#[derive(Debug, Clone, FromRow)]
pub struct GameConfigurationField {
    pub id: i64,
    pub game_configuration_id: i64,
    pub input_name: String,
    pub label: String,
    pub placeholder: Option<String>,
    pub options: Option<Value>,
    #[sqlx(rename = "type")]
    pub field_type: String,
    pub validation_rules: Option<String>,
    pub is_required: bool,
    pub display_order: i32,
}
