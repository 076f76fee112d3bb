// src/dtos/flash_sale.rs
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::dtos::catalog::GameBrief;
use crate::error::AppError;
use crate::models::flash_sale::{FlashSale, FlashSaleItem};
use crate::pricing::{round_currency, FlashSaleQuote};
use crate::validation::Validator;

#[derive(Debug, Deserialize)]
pub struct CreateFlashSaleRequest {
    pub name: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub is_active: Option<bool>,
}

impl CreateFlashSaleRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut v = Validator::new();
        v.required_text("name", &self.name, 255);
        v.check(self.end_date >= self.start_date, "end_date", "must be after or equal to start_date");
        v.finish()
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateFlashSaleRequest {
    pub name: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub is_active: Option<bool>,
}

impl UpdateFlashSaleRequest {
    /// The window check needs the stored dates for whichever side is not being changed.
    pub fn validate(&self, current: &FlashSale) -> Result<(), AppError> {
        let mut v = Validator::new();
        if let Some(name) = &self.name {
            v.required_text("name", name, 255);
        }
        let start = self.start_date.unwrap_or(current.start_date);
        let end = self.end_date.unwrap_or(current.end_date);
        v.check(end >= start, "end_date", "must be after or equal to start_date");
        v.finish()
    }
}

#[derive(Debug, Deserialize)]
pub struct AttachProductRequest {
    pub product_id: i64,
    pub discounted_price: Decimal,
    /// Omitted or null means unlimited.
    pub stock: Option<i32>,
}

impl AttachProductRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut v = Validator::new();
        v.non_negative("discounted_price", self.discounted_price);
        if let Some(stock) = self.stock {
            v.check(stock >= 0, "stock", "must be at least 0");
        }
        v.finish()
    }
}

#[derive(Debug, Serialize)]
pub struct FlashSaleResponse {
    pub id: i64,
    pub name: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<FlashSale> for FlashSaleResponse {
    fn from(fs: FlashSale) -> Self {
        Self {
            id: fs.id,
            name: fs.name,
            start_date: fs.start_date,
            end_date: fs.end_date,
            is_active: fs.is_active,
            created_at: fs.created_at,
            updated_at: fs.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AttachedProductResponse {
    pub flash_sale_id: i64,
    pub product_id: i64,
    pub discounted_price: Decimal,
    pub stock: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct ProductCategoryBrief {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

/// A product inside a flash sale, priced for the viewer.
#[derive(Debug, Serialize)]
pub struct FlashSaleProduct {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub base_price: Decimal,
    /// Role-adjusted price the sale is measured against.
    pub original_price: Decimal,
    pub discounted_price: Decimal,
    pub discount_percentage: Decimal,
    pub stock: Option<i32>,
    pub icon_url: Option<String>,
    pub provider: String,
    pub provider_sku: String,
    pub game: GameBrief,
    pub product_category: ProductCategoryBrief,
}

impl FlashSaleProduct {
    pub fn new(item: FlashSaleItem, quote: FlashSaleQuote, icon_url: Option<String>) -> Self {
        Self {
            id: item.product_id,
            name: item.name,
            description: item.description,
            base_price: round_currency(item.base_price),
            original_price: quote.original_price,
            discounted_price: quote.discounted_price,
            discount_percentage: quote.discount_percentage,
            stock: item.stock,
            icon_url,
            provider: item.provider,
            provider_sku: item.provider_sku,
            game: GameBrief { id: item.game_id, name: item.game_name, slug: item.game_slug },
            product_category: ProductCategoryBrief {
                id: item.product_category_id,
                name: item.product_category_name,
                slug: item.product_category_slug,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ActiveFlashSale {
    pub id: i64,
    pub name: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub remaining_seconds: i64,
    pub is_active: bool,
    pub total_products: usize,
    pub products: Vec<FlashSaleProduct>,
}

#[derive(Debug, Serialize)]
pub struct UpcomingFlashSale {
    pub id: i64,
    pub name: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub time_until_start: i64,
    pub is_active: bool,
    pub total_products: usize,
    pub products: Vec<FlashSaleProduct>,
}

#[derive(Debug, Serialize)]
pub struct ActiveFlashSalesMeta {
    pub current_time: DateTime<Utc>,
    pub total_active_flashsales: usize,
}

#[derive(Debug, Serialize)]
pub struct UpcomingFlashSalesMeta {
    pub current_time: DateTime<Utc>,
    pub total_upcoming_flashsales: usize,
}

#[derive(Debug, Serialize)]
pub struct CurrentTimeMeta {
    pub current_time: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn create_rejects_inverted_window() {
        let now = Utc::now();
        let req = CreateFlashSaleRequest {
            name: "Payday".into(),
            start_date: now,
            end_date: now - Duration::hours(1),
            is_active: None,
        };
        match req.validate() {
            Err(AppError::ValidationError { errors, .. }) => assert!(errors.contains_key("end_date")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn update_checks_against_stored_dates() {
        let now = Utc::now();
        let current = FlashSale {
            id: 1,
            name: "Payday".into(),
            start_date: now,
            end_date: now + Duration::hours(2),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let moves_start_past_end = UpdateFlashSaleRequest {
            name: None,
            start_date: Some(now + Duration::hours(3)),
            end_date: None,
            is_active: None,
        };
        assert!(moves_start_past_end.validate(&current).is_err());

        let rename = UpdateFlashSaleRequest { name: Some("Flash".into()), start_date: None, end_date: None, is_active: None };
        assert!(rename.validate(&current).is_ok());
    }

    #[test]
    fn attach_rejects_negative_stock() {
        let req = AttachProductRequest { product_id: 1, discounted_price: Decimal::from(100), stock: Some(-1) };
        assert!(req.validate().is_err());
        let unlimited = AttachProductRequest { product_id: 1, discounted_price: Decimal::from(100), stock: None };
        assert!(unlimited.validate().is_ok());
    }
}
