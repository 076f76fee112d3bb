// src/dtos/product_category.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::media::resolve_display_url;
use crate::models::product_category::ProductCategory;
use crate::validation::Validator;

#[derive(Debug, Deserialize)]
pub struct CreateProductCategoryRequest {
    pub game_id: i64,
    pub name: String,
    pub slug: String,
    pub icon_path: Option<String>,
    pub display_order: Option<i32>,
    pub is_active: Option<bool>,
}

impl CreateProductCategoryRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut v = Validator::new();
        v.required_text("name", &self.name, 255);
        v.slug("slug", &self.slug);
        v.finish()
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateProductCategoryRequest {
    pub game_id: Option<i64>,
    pub name: Option<String>,
    pub slug: Option<String>,
    pub icon_path: Option<String>,
    pub display_order: Option<i32>,
    pub is_active: Option<bool>,
}

impl UpdateProductCategoryRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut v = Validator::new();
        if let Some(name) = &self.name {
            v.required_text("name", name, 255);
        }
        if let Some(slug) = &self.slug {
            v.slug("slug", slug);
        }
        v.finish()
    }
}

#[derive(Debug, Serialize)]
pub struct ProductCategoryResponse {
    pub id: i64,
    pub game_id: i64,
    pub name: String,
    pub slug: String,
    pub icon_path: Option<String>,
    pub icon_url: Option<String>,
    pub display_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductCategoryResponse {
    pub fn new(pc: ProductCategory, storage_base: &str) -> Self {
        Self {
            icon_url: resolve_display_url(pc.icon_path.as_deref(), storage_base),
            id: pc.id,
            game_id: pc.game_id,
            name: pc.name,
            slug: pc.slug,
            icon_path: pc.icon_path,
            display_order: pc.display_order,
            is_active: pc.is_active,
            created_at: pc.created_at,
            updated_at: pc.updated_at,
        }
    }
}
