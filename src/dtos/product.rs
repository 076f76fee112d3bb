// src/dtos/product.rs
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::media::resolve_display_url;
use crate::models::product::Product;
use crate::validation::Validator;

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub icon_path: Option<String>,
    pub description: Option<String>,
    pub base_price: Decimal,
    /// Defaults to the manual provider.
    pub provider: Option<String>,
    pub provider_sku: String,
    pub product_category_id: i64,
    pub display_order: Option<i32>,
    pub is_active: Option<bool>,
}

impl CreateProductRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut v = Validator::new();
        v.required_text("name", &self.name, 255);
        v.required_text("provider_sku", &self.provider_sku, 255);
        v.non_negative("base_price", self.base_price);
        if let Some(provider) = &self.provider {
            v.required_text("provider", provider, 64);
        }
        v.finish()
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub icon_path: Option<String>,
    pub description: Option<String>,
    pub base_price: Option<Decimal>,
    pub provider: Option<String>,
    pub provider_sku: Option<String>,
    pub product_category_id: Option<i64>,
    pub display_order: Option<i32>,
    pub is_active: Option<bool>,
}

impl UpdateProductRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut v = Validator::new();
        if let Some(name) = &self.name {
            v.required_text("name", name, 255);
        }
        if let Some(sku) = &self.provider_sku {
            v.required_text("provider_sku", sku, 255);
        }
        if let Some(price) = self.base_price {
            v.non_negative("base_price", price);
        }
        v.finish()
    }
}

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub id: i64,
    pub name: String,
    pub icon_path: Option<String>,
    pub icon_url: Option<String>,
    pub description: Option<String>,
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

impl ProductResponse {
    pub fn new(p: Product, storage_base: &str) -> Self {
        Self {
            icon_url: resolve_display_url(p.icon_path.as_deref(), storage_base),
            id: p.id,
            name: p.name,
            icon_path: p.icon_path,
            description: p.description,
            base_price: p.base_price,
            provider: p.provider,
            provider_sku: p.provider_sku,
            product_category_id: p.product_category_id,
            game_id: p.game_id,
            display_order: p.display_order,
            is_active: p.is_active,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct ProviderSummary {
    pub provider: String,
    pub total_products: i64,
}
