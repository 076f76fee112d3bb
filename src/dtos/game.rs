// src/dtos/game.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AppError;
use crate::media::resolve_display_url;
use crate::models::game::Game;
use crate::validation::Validator;

#[derive(Debug, Deserialize)]
pub struct CreateGameRequest {
    pub name: String,
    pub slug: String,
    pub developer: Option<String>,
    /// Provider brand used to match Digiflazz price-list rows.
    pub brand: Option<String>,
    pub allowed_region: Option<String>,
    pub image_thumbnail_path: Option<String>,
    pub image_banner_path: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub long_description: String,
    pub faq: Option<Value>,
    pub is_popular: Option<bool>,
    pub is_active: Option<bool>,
    pub display_order: Option<i32>,
    pub category_id: i64,
    pub game_configuration_id: Option<i64>,
}

impl CreateGameRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut v = Validator::new();
        v.required_text("name", &self.name, 255);
        v.slug("slug", &self.slug);
        if let Some(faq) = &self.faq {
            v.check(faq.is_array(), "faq", "must be a list");
        }
        v.finish()
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateGameRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub developer: Option<String>,
    pub brand: Option<String>,
    pub allowed_region: Option<String>,
    pub image_thumbnail_path: Option<String>,
    pub image_banner_path: Option<String>,
    pub description: Option<String>,
    pub long_description: Option<String>,
    pub faq: Option<Value>,
    pub is_popular: Option<bool>,
    pub is_active: Option<bool>,
    pub display_order: Option<i32>,
    pub category_id: Option<i64>,
    pub game_configuration_id: Option<i64>,
}

impl UpdateGameRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut v = Validator::new();
        if let Some(name) = &self.name {
            v.required_text("name", name, 255);
        }
        if let Some(slug) = &self.slug {
            v.slug("slug", slug);
        }
        if let Some(faq) = &self.faq {
            v.check(faq.is_array(), "faq", "must be a list");
        }
        v.finish()
    }
}

#[derive(Debug, Serialize)]
pub struct GameResponse {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub developer: Option<String>,
    pub brand: Option<String>,
    pub allowed_region: Option<String>,
    pub image_thumbnail_path: Option<String>,
    pub image_thumbnail_url: Option<String>,
    pub image_banner_path: Option<String>,
    pub image_banner_url: Option<String>,
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

impl GameResponse {
    pub fn new(g: Game, storage_base: &str) -> Self {
        Self {
            image_thumbnail_url: resolve_display_url(g.image_thumbnail_path.as_deref(), storage_base),
            image_banner_url: resolve_display_url(g.image_banner_path.as_deref(), storage_base),
            id: g.id,
            name: g.name,
            slug: g.slug,
            developer: g.developer,
            brand: g.brand,
            allowed_region: g.allowed_region,
            image_thumbnail_path: g.image_thumbnail_path,
            image_banner_path: g.image_banner_path,
            description: g.description,
            long_description: g.long_description,
            faq: g.faq,
            is_popular: g.is_popular,
            is_active: g.is_active,
            display_order: g.display_order,
            category_id: g.category_id,
            game_configuration_id: g.game_configuration_id,
            created_at: g.created_at,
            updated_at: g.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn faq_must_be_a_list() {
        let req: CreateGameRequest = serde_json::from_value(json!({
            "name": "Mobile Legends",
            "slug": "mobile-legends",
            "category_id": 1,
            "faq": { "q": "a" }
        }))
        .unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn defaults_fill_optional_text() {
        let req: CreateGameRequest = serde_json::from_value(json!({
            "name": "Free Fire",
            "slug": "free-fire",
            "category_id": 1
        }))
        .unwrap();
        assert_eq!(req.description, "");
        assert!(req.validate().is_ok());
    }
}
