// src/dtos/catalog.rs
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

use crate::models::category::Category;
use crate::models::game::Game;
use crate::models::product::Product;
use crate::models::product_category::ProductCategory;
use crate::pricing::{FlashSaleQuote, PriceQuote};

#[derive(Debug, Clone, Serialize)]
pub struct CategoryBrief {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

impl From<&Category> for CategoryBrief {
    fn from(c: &Category) -> Self {
        Self { id: c.id, name: c.name.clone(), slug: c.slug.clone() }
    }
}

#[derive(Debug, Serialize)]
pub struct GameCard {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub developer: Option<String>,
    pub image_thumbnail_url: Option<String>,
    pub image_banner_url: Option<String>,
    pub description: String,
    pub is_popular: bool,
    pub display_order: i32,
}

#[derive(Debug, Serialize)]
pub struct CategoryWithGames {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub display_order: i32,
    pub is_active: bool,
    pub games: Vec<GameCard>,
    pub total_games: usize,
}

#[derive(Debug, Serialize)]
pub struct CategoriesMeta {
    pub total_categories: usize,
    pub total_games: usize,
}

#[derive(Debug, Serialize)]
pub struct TotalGamesMeta {
    pub total_games: usize,
}

/// Product as listed without viewer pricing.
#[derive(Debug, Serialize)]
pub struct CatalogProduct {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub base_price: Decimal,
    pub icon_url: Option<String>,
    pub provider: String,
    pub provider_sku: String,
    pub display_order: i32,
}

#[derive(Debug, Serialize)]
pub struct CatalogProductCategory {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub icon_url: Option<String>,
    pub display_order: i32,
    pub products: Vec<CatalogProduct>,
}

#[derive(Debug, Serialize)]
pub struct GameListItem {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub developer: Option<String>,
    pub description: String,
    pub image_thumbnail_url: Option<String>,
    pub image_banner_url: Option<String>,
    pub is_popular: bool,
    pub display_order: i32,
    pub category: Option<CategoryBrief>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_categories: Option<Vec<CatalogProductCategory>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_categories_count: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct PageMeta {
    pub current_page: i64,
    pub last_page: i64,
    pub per_page: i64,
    pub total: i64,
    pub from: Option<i64>,
    pub to: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub with_products: Option<bool>,
}

impl PageMeta {
    pub fn new(page: i64, per_page: i64, total: i64, items_on_page: usize, with_products: Option<bool>) -> Self {
        let last_page = ((total + per_page - 1) / per_page).max(1);
        let (from, to) = if items_on_page == 0 {
            (None, None)
        } else {
            let from = (page - 1) * per_page + 1;
            (Some(from), Some(from + items_on_page as i64 - 1))
        };
        Self { current_page: page, last_page, per_page, total, from, to, with_products }
    }
}

#[derive(Debug, Serialize)]
pub struct ConfigurationBrief {
    pub id: i64,
    pub name: String,
    pub guide_text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GameDetail {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub developer: Option<String>,
    pub brand: Option<String>,
    pub allowed_region: Option<String>,
    pub image_thumbnail_url: Option<String>,
    pub image_banner_url: Option<String>,
    pub description: String,
    pub long_description: String,
    pub faq: Option<Value>,
    pub is_popular: bool,
    pub display_order: i32,
    pub category: Option<CategoryBrief>,
    pub game_configuration: Option<ConfigurationBrief>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Suggestion {
    Game { id: i64, name: String, slug: String, developer: Option<String> },
    Developer { name: String },
    Category { id: i64, name: String, slug: String },
}

#[derive(Debug, Serialize)]
pub struct SuggestionMeta {
    pub search_term: String,
    pub total_suggestions: usize,
}

#[derive(Debug, Serialize)]
pub struct GameBrief {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

impl From<&Game> for GameBrief {
    fn from(g: &Game) -> Self {
        Self { id: g.id, name: g.name.clone(), slug: g.slug.clone() }
    }
}

// ---- viewer-priced products ----

#[derive(Debug, Clone, Serialize)]
pub struct RoleInfo {
    pub id: i64,
    pub name: String,
    pub profit_percentage: Decimal,
}

#[derive(Debug, Serialize)]
pub struct PricedProduct {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub base_price: Decimal,
    /// Role-adjusted price, rounded.
    pub product_price: Decimal,
    pub user_role: Option<RoleInfo>,
    pub flash_sale: Option<FlashSaleQuote>,
    pub final_price: Decimal,
    pub icon_url: Option<String>,
    pub provider: String,
    pub provider_sku: String,
    pub display_order: i32,
}

impl PricedProduct {
    pub fn new(product: &Product, quote: PriceQuote, user_role: Option<RoleInfo>, icon_url: Option<String>) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            description: product.description.clone(),
            base_price: quote.base_price,
            product_price: quote.product_price(),
            user_role,
            final_price: quote.final_price,
            flash_sale: quote.flash_sale,
            icon_url,
            provider: product.provider.clone(),
            provider_sku: product.provider_sku.clone(),
            display_order: product.display_order,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PricedProductCategory {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub icon_path: Option<String>,
    pub icon_url: Option<String>,
    pub display_order: i32,
    pub products: Vec<PricedProduct>,
}

impl PricedProductCategory {
    pub fn new(category: &ProductCategory, icon_url: Option<String>, products: Vec<PricedProduct>) -> Self {
        Self {
            id: category.id,
            name: category.name.clone(),
            slug: category.slug.clone(),
            icon_path: category.icon_path.clone(),
            icon_url,
            display_order: category.display_order,
            products,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PricingInfo {
    pub user_authenticated: bool,
    pub user_role: String,
    pub profit_percentage: Decimal,
    pub price_calculation: String,
    pub is_guest_default: bool,
}

#[derive(Debug, Serialize)]
pub struct GameHeader {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub developer: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GameProductsResponse {
    pub game: GameHeader,
    pub product_categories: Vec<PricedProductCategory>,
    pub total_products: usize,
    pub pricing_info: PricingInfo,
}

// ---- game configuration ----

#[derive(Debug, Serialize)]
pub struct ConfigurationSummary {
    pub id: i64,
    pub name: String,
    pub guide_text: Option<String>,
    pub guide_image_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ConfigurationInfoResponse {
    pub game: GameBrief,
    pub has_configuration: bool,
    pub configuration: Option<ConfigurationSummary>,
}

#[derive(Debug, Serialize)]
pub struct ConfigurationFieldResponse {
    pub id: i64,
    pub input_name: String,
    pub label: String,
    pub placeholder: Option<String>,
    pub options: Option<Value>,
    #[serde(rename = "type")]
    pub field_type: String,
    pub validation_rules: Option<String>,
    pub is_required: bool,
    pub display_order: i32,
}

#[derive(Debug, Serialize)]
pub struct ConfigurationFieldsResponse {
    pub game: GameBrief,
    pub configuration: Option<ConfigurationSummary>,
    pub fields: Vec<ConfigurationFieldResponse>,
    pub total_fields: usize,
}

#[derive(Debug, Serialize)]
pub struct ConfigurationWithFields {
    pub id: i64,
    pub name: String,
    pub guide_text: Option<String>,
    pub guide_image_url: Option<String>,
    pub validation_provider: Option<String>,
    pub is_active: bool,
    pub fields: Vec<ConfigurationFieldResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_meta_bounds() {
        let meta = PageMeta::new(2, 20, 45, 20, None);
        assert_eq!(meta.last_page, 3);
        assert_eq!(meta.from, Some(21));
        assert_eq!(meta.to, Some(40));

        let last = PageMeta::new(3, 20, 45, 5, None);
        assert_eq!(last.from, Some(41));
        assert_eq!(last.to, Some(45));
    }

    #[test]
    fn page_meta_empty_result() {
        let meta = PageMeta::new(1, 20, 0, 0, Some(true));
        assert_eq!(meta.last_page, 1);
        assert_eq!(meta.from, None);
        assert_eq!(meta.to, None);
    }

    #[test]
    fn suggestions_are_tagged_by_type() {
        let s = Suggestion::Developer { name: "Moonton".into() };
        let value = serde_json::to_value(&s).unwrap();
        assert_eq!(value["type"], "developer");
        assert_eq!(value["name"], "Moonton");
    }
}
